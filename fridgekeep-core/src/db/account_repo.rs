//! User accounts.
//!
//! Emails are unique after normalisation (trimmed, lowercased). Passwords
//! are stored as Argon2 hashes; see [`crate::password`].

use std::sync::Arc;
use uuid::Uuid;

use crate::clock::Clock;
use crate::db::{FridgeRepository, NotificationRepository, StatisticsRepository};
use crate::error::RepoError;
use crate::models::{AppSettings, NewAccount, ProfileUpdate, UserAccount};
use crate::ordering;
use crate::password::{hash_password, verify_password};
use crate::session::Session;
use crate::store::{DocumentStore, StoreKey};

#[derive(Clone)]
pub struct AccountRepository {
    store: DocumentStore,
    clock: Arc<dyn Clock>,
}

impl AccountRepository {
    pub fn new(store: DocumentStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn load(&self) -> Vec<UserAccount> {
        self.store.get_or_default(StoreKey::Accounts)
    }

    fn save(&self, accounts: &[UserAccount]) -> Result<(), RepoError> {
        Ok(self.store.set(StoreKey::Accounts, accounts)?)
    }

    /// Creates an account. Fails with `DuplicateEmail` if the normalised
    /// email is taken, leaving the collection unchanged.
    pub fn register(&self, input: NewAccount) -> Result<UserAccount, RepoError> {
        let email = normalize_email(&input.email);
        let mut accounts = self.load();
        if accounts.iter().any(|a| a.email == email) {
            return Err(RepoError::DuplicateEmail(email));
        }

        let account = UserAccount {
            user_id: Uuid::new_v4().to_string(),
            email,
            password: hash_password(&input.password)?,
            nickname: input.nickname,
            profile_image: input.profile_image,
            credential_type: input.credential_type,
            created_at: self.clock.now(),
        };

        accounts.push(account.clone());
        self.save(&accounts)?;

        tracing::info!(user_id = %account.user_id, "Registered account");
        Ok(account)
    }

    /// Returns the account when the email exists and the password verifies.
    pub fn authenticate(&self, email: &str, password: &str) -> Option<UserAccount> {
        let account = self.find_by_email(email)?;
        if verify_password(password, &account.password) {
            Some(account)
        } else {
            tracing::debug!(user_id = %account.user_id, "Password did not verify");
            None
        }
    }

    /// Applies a profile edit. Only the account itself may edit it.
    ///
    /// Returns `Ok(false)` if `user_id` is unknown. A nickname change is
    /// carried into every fridge member entry.
    pub fn update_profile(
        &self,
        session: &Session,
        user_id: &str,
        update: ProfileUpdate,
    ) -> Result<bool, RepoError> {
        if session.require_user()? != user_id {
            return Err(RepoError::permission_denied("edit another user's profile"));
        }

        let mut accounts = self.load();
        let Some(account) = accounts.iter_mut().find(|a| a.user_id == user_id) else {
            return Ok(false);
        };

        if let Some(password) = &update.password {
            account.password = hash_password(password)?;
        }
        if let Some(image) = update.profile_image {
            account.profile_image = Some(image);
        }
        if let Some(nickname) = &update.nickname {
            account.nickname = nickname.clone();
        }
        self.save(&accounts)?;

        if let Some(nickname) = &update.nickname {
            FridgeRepository::new(self.store.clone(), self.clock.clone())
                .rename_member(user_id, nickname)?;
        }

        tracing::info!(user_id, "Updated profile");
        Ok(true)
    }

    /// The signed-in user's account, if both exist.
    pub fn current_account(&self, session: &Session) -> Option<UserAccount> {
        self.get(session.user_id()?)
    }

    pub fn get(&self, user_id: &str) -> Option<UserAccount> {
        self.load().into_iter().find(|a| a.user_id == user_id)
    }

    pub fn find_by_email(&self, email: &str) -> Option<UserAccount> {
        let email = normalize_email(email);
        self.load().into_iter().find(|a| a.email == email)
    }

    pub fn count(&self) -> usize {
        self.load().len()
    }

    /// Deletes an account and everything that belongs to it.
    ///
    /// Owned fridges go with their ingredients; membership in other fridges
    /// is dropped; notifications, statistics and saved order are removed.
    /// Signs the device out if this was the active user.
    pub fn delete_account(&self, session: &Session, user_id: &str) -> Result<(), RepoError> {
        if session.require_user()? != user_id {
            return Err(RepoError::permission_denied("delete another user's account"));
        }

        let mut accounts = self.load();
        let before = accounts.len();
        accounts.retain(|a| a.user_id != user_id);
        if accounts.len() == before {
            return Err(RepoError::not_found(format!("Account {}", user_id)));
        }

        let fridges = FridgeRepository::new(self.store.clone(), self.clock.clone())
            .purge_user(user_id)?;
        NotificationRepository::new(self.store.clone(), self.clock.clone()).remove_user(user_id)?;
        StatisticsRepository::new(self.store.clone(), self.clock.clone()).remove_user(user_id)?;
        ordering::forget_user(&self.store, user_id)?;
        self.save(&accounts)?;

        let mut settings: AppSettings = self.store.get_or_default(StoreKey::Settings);
        if settings.active_user_id.as_deref() == Some(user_id) {
            settings.active_user_id = None;
            self.store.set(StoreKey::Settings, &settings)?;
        }

        tracing::info!(user_id, fridges = fridges.len(), "Deleted account");
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
