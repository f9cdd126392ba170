//! Repositories over the document store.
//!
//! Each repository owns the invariants of one record type and reads the whole
//! collection, mutates it, and writes it back in one `set`.

mod account_repo;
mod fridge_repo;
mod ingredient_repo;
mod notification_repo;
mod stats_repo;

pub use account_repo::AccountRepository;
pub use fridge_repo::{FridgeRepository, FridgeUpdate, MembershipChange};
pub use ingredient_repo::IngredientRepository;
pub use notification_repo::NotificationRepository;
pub use stats_repo::StatisticsRepository;
