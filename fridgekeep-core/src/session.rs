//! Session identity.
//!
//! A [`Session`] says who is acting. It is passed explicitly into every
//! repository call instead of living in global state, so several sessions can
//! coexist (and be tested) against one store.
//!
//! [`SessionStore`] persists the signed-in user between process runs in the
//! settings collection. It only records who is signed in; it does not check
//! credentials.

use crate::error::RepoError;
use crate::models::{AppSettings, UserAccount};
use crate::store::{DocumentStore, StoreError, StoreKey};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    user_id: Option<String>,
}

impl Session {
    /// A session with nobody signed in.
    pub fn anonymous() -> Self {
        Self { user_id: None }
    }

    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.user_id.is_some()
    }

    /// The acting user's id, or `PermissionDenied` for an anonymous session.
    pub fn require_user(&self) -> Result<&str, RepoError> {
        self.user_id()
            .ok_or_else(|| RepoError::permission_denied("not signed in"))
    }
}

/// Persists the active session in [`StoreKey::Settings`].
#[derive(Debug, Clone)]
pub struct SessionStore {
    store: DocumentStore,
}

impl SessionStore {
    pub fn new(store: DocumentStore) -> Self {
        Self { store }
    }

    /// The session saved on this device, or an anonymous one.
    pub fn restore(&self) -> Session {
        let settings: AppSettings = self.store.get_or_default(StoreKey::Settings);
        match settings.active_user_id {
            Some(id) => Session::for_user(id),
            None => Session::anonymous(),
        }
    }

    /// Records `account` as the signed-in user.
    pub fn login(&self, account: &UserAccount) -> Result<Session, StoreError> {
        let mut settings: AppSettings = self.store.get_or_default(StoreKey::Settings);
        settings.active_user_id = Some(account.user_id.clone());
        self.store.set(StoreKey::Settings, &settings)?;
        tracing::info!(user_id = %account.user_id, "Signed in");
        Ok(Session::for_user(account.user_id.clone()))
    }

    pub fn logout(&self) -> Result<(), StoreError> {
        let mut settings: AppSettings = self.store.get_or_default(StoreKey::Settings);
        settings.active_user_id = None;
        self.store.set(StoreKey::Settings, &settings)
    }

    /// Signs out and removes every collection from the store.
    pub fn logout_and_wipe(&self) -> Result<usize, StoreError> {
        self.store.clear_all()
    }
}
