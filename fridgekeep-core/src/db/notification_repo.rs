use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::RepoError;
use crate::models::{Notification, NotificationType};
use crate::session::Session;
use crate::store::{DocumentStore, StoreKey};

/// Notifications per recipient user id, oldest first.
type Inboxes = HashMap<String, Vec<Notification>>;

/// Per-user notification inboxes.
///
/// Notifications are never deleted automatically; only the read flag changes.
#[derive(Clone)]
pub struct NotificationRepository {
    store: DocumentStore,
    clock: Arc<dyn Clock>,
}

impl NotificationRepository {
    pub fn new(store: DocumentStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn load(&self) -> Inboxes {
        self.store.get_or_default(StoreKey::Notifications)
    }

    fn save(&self, inboxes: &Inboxes) -> Result<(), RepoError> {
        Ok(self.store.set(StoreKey::Notifications, inboxes)?)
    }

    /// Delivers a notification to `user_id`.
    pub fn push(
        &self,
        user_id: &str,
        notification_type: NotificationType,
        message: impl Into<String>,
    ) -> Result<Notification, RepoError> {
        let notification = Notification::new(notification_type, message, self.clock.now());

        let mut inboxes = self.load();
        inboxes
            .entry(user_id.to_string())
            .or_default()
            .push(notification.clone());
        self.save(&inboxes)?;

        tracing::debug!(user_id, kind = %notification_type, "Pushed notification");
        Ok(notification)
    }

    /// The signed-in user's notifications, newest first.
    pub fn list(&self, session: &Session) -> Result<Vec<Notification>, RepoError> {
        let user_id = session.require_user()?;
        let mut list = self.load().remove(user_id).unwrap_or_default();
        list.reverse();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(list)
    }

    pub fn unread_count(&self, session: &Session) -> Result<usize, RepoError> {
        let user_id = session.require_user()?;
        Ok(self
            .load()
            .get(user_id)
            .map(|list| list.iter().filter(|n| !n.is_read).count())
            .unwrap_or(0))
    }

    pub fn mark_read(&self, session: &Session, notification_id: &str) -> Result<(), RepoError> {
        let user_id = session.require_user()?;
        let mut inboxes = self.load();

        let notification = inboxes
            .get_mut(user_id)
            .and_then(|list| {
                list.iter_mut()
                    .find(|n| n.notification_id == notification_id)
            })
            .ok_or_else(|| RepoError::not_found(format!("Notification {}", notification_id)))?;

        if !notification.is_read {
            notification.is_read = true;
            self.save(&inboxes)?;
        }
        Ok(())
    }

    /// Marks everything read. Returns how many were unread.
    pub fn mark_all_read(&self, session: &Session) -> Result<usize, RepoError> {
        let user_id = session.require_user()?;
        let mut inboxes = self.load();

        let mut changed = 0;
        if let Some(list) = inboxes.get_mut(user_id) {
            for n in list.iter_mut().filter(|n| !n.is_read) {
                n.is_read = true;
                changed += 1;
            }
        }

        if changed > 0 {
            self.save(&inboxes)?;
        }
        Ok(changed)
    }

    pub(crate) fn remove_user(&self, user_id: &str) -> Result<(), RepoError> {
        let mut inboxes = self.load();
        if inboxes.remove(user_id).is_some() {
            self.save(&inboxes)?;
        }
        Ok(())
    }
}
