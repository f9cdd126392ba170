mod account;
mod fridge;
mod ingredient;
mod notification;
mod order;
mod settings;
mod statistics;

pub use account::{CredentialType, NewAccount, ProfileUpdate, UserAccount};
pub use fridge::{Compartment, CompartmentType, Fridge, FridgeMember, Role};
pub use ingredient::{Ingredient, IngredientState, IngredientUpdate, NewIngredient};
pub use notification::{Notification, NotificationType};
pub use order::FridgeOrder;
pub use settings::AppSettings;
pub use statistics::{FridgeUsage, MostUsedFridge, Period, StatBucket, StatEvent, UserStatistics};
