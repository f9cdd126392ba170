//! Fridgekeep Core Library
//!
//! Local household inventory: accounts, shared fridges, ingredients with
//! derived freshness, notifications, usage statistics, and a debounced
//! ordering channel to a remote endpoint.

pub mod clock;
pub mod db;
pub mod error;
pub mod freshness;
pub mod household;
pub mod models;
pub mod ordering;
pub mod password;
pub mod session;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::{
    AccountRepository, FridgeRepository, FridgeUpdate, IngredientRepository, MembershipChange,
    NotificationRepository, StatisticsRepository,
};
pub use error::RepoError;
pub use household::Household;
pub use models::{
    AppSettings, Compartment, CompartmentType, CredentialType, Fridge, FridgeMember, FridgeOrder,
    Ingredient, IngredientState, IngredientUpdate, NewAccount, NewIngredient, Notification,
    NotificationType, ProfileUpdate, Role, UserAccount, UserStatistics,
};
pub use ordering::{
    spawn_debounce_driver, FlushState, HttpOrderSink, NoopSink, OrderCoordinator, OrderSink,
    SyncError, DEFAULT_DEBOUNCE,
};
pub use session::{Session, SessionStore};
pub use store::{DocumentStore, StoreError, StoreKey};

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
