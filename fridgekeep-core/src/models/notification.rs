use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    FridgeInvite,
    FridgeRemoved,
    ExpiryWarning,
    System,
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationType::FridgeInvite => write!(f, "invite"),
            NotificationType::FridgeRemoved => write!(f, "removed"),
            NotificationType::ExpiryWarning => write!(f, "expiry"),
            NotificationType::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub notification_id: String,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn new(
        notification_type: NotificationType,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            notification_id: Uuid::new_v4().to_string(),
            notification_type,
            message: message.into(),
            is_read: false,
            created_at,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.is_read { " " } else { "*" };
        write!(
            f,
            "{} {} [{}] {}",
            marker,
            self.created_at.format("%Y-%m-%d %H:%M"),
            self.notification_type,
            self.message
        )
    }
}
