use std::collections::HashMap;
use std::sync::Arc;

use crate::clock::Clock;
use crate::error::RepoError;
use crate::models::{StatEvent, UserStatistics};
use crate::session::Session;
use crate::store::{DocumentStore, StoreKey};

type StatsByUser = HashMap<String, UserStatistics>;

/// Usage statistics per user, updated incrementally from ingredient events.
#[derive(Clone)]
pub struct StatisticsRepository {
    store: DocumentStore,
    clock: Arc<dyn Clock>,
}

impl StatisticsRepository {
    pub fn new(store: DocumentStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    fn load(&self) -> StatsByUser {
        self.store.get_or_default(StoreKey::Statistics)
    }

    fn save(&self, stats: &StatsByUser) -> Result<(), RepoError> {
        Ok(self.store.set(StoreKey::Statistics, stats)?)
    }

    pub fn record(
        &self,
        user_id: &str,
        event: StatEvent,
        fridge_id: &str,
        fridge_name: &str,
    ) -> Result<(), RepoError> {
        let mut stats = self.load();
        stats.entry(user_id.to_string()).or_default().record(
            event,
            fridge_id,
            fridge_name,
            self.clock.now(),
        );
        self.save(&stats)
    }

    /// The signed-in user's statistics with stale periods zeroed.
    pub fn statistics(&self, session: &Session) -> Result<UserStatistics, RepoError> {
        let user_id = session.require_user()?;
        let stats = self.load().remove(user_id).unwrap_or_default();
        Ok(stats.as_of(self.clock.now()))
    }

    pub(crate) fn forget_fridge(&self, fridge_id: &str) -> Result<(), RepoError> {
        let mut stats = self.load();
        for user_stats in stats.values_mut() {
            user_stats.forget_fridge(fridge_id);
        }
        self.save(&stats)
    }

    pub(crate) fn remove_user(&self, user_id: &str) -> Result<(), RepoError> {
        let mut stats = self.load();
        if stats.remove(user_id).is_some() {
            self.save(&stats)?;
        }
        Ok(())
    }
}
