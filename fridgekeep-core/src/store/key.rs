//! Collection keys for the document store.

/// Every collection the application keeps in the document store.
///
/// Each key holds one JSON blob. `clear_all` only ever touches these keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Accounts,
    Fridges,
    Ingredients,
    Notifications,
    Settings,
    Statistics,
    FridgeOrder,
    DefaultFridges,
}

impl StoreKey {
    /// All keys owned by the application.
    pub const ALL: [StoreKey; 8] = [
        StoreKey::Accounts,
        StoreKey::Fridges,
        StoreKey::Ingredients,
        StoreKey::Notifications,
        StoreKey::Settings,
        StoreKey::Statistics,
        StoreKey::FridgeOrder,
        StoreKey::DefaultFridges,
    ];

    /// Returns the namespaced key string for this collection.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Accounts => "fridgekeep.accounts",
            StoreKey::Fridges => "fridgekeep.fridges",
            StoreKey::Ingredients => "fridgekeep.ingredients",
            StoreKey::Notifications => "fridgekeep.notifications",
            StoreKey::Settings => "fridgekeep.settings",
            StoreKey::Statistics => "fridgekeep.statistics",
            StoreKey::FridgeOrder => "fridgekeep.fridge_order",
            StoreKey::DefaultFridges => "fridgekeep.default_fridges",
        }
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
