use serde::{Deserialize, Serialize};

/// Per-device application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    /// User signed in on this device, if any.
    pub active_user_id: Option<String>,
}
