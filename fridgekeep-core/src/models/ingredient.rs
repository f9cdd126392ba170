use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::freshness;

/// Lifecycle state of an ingredient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IngredientState {
    Fresh,
    NearExpiry,
    Expired,
    Consumed,
    Disposed,
}

impl IngredientState {
    /// CONSUMED and DISPOSED are user actions that freeze the state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngredientState::Consumed | IngredientState::Disposed)
    }
}

impl fmt::Display for IngredientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngredientState::Fresh => write!(f, "FRESH"),
            IngredientState::NearExpiry => write!(f, "NEAR_EXPIRY"),
            IngredientState::Expired => write!(f, "EXPIRED"),
            IngredientState::Consumed => write!(f, "CONSUMED"),
            IngredientState::Disposed => write!(f, "DISPOSED"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Ingredient {
    pub ingredient_id: String,
    pub fridge_id: String,
    pub compartment_id: String,
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub expiration_date: NaiveDate,
    pub state: IngredientState,
    pub memo: String,
    pub created_at: DateTime<Utc>,
}

impl Ingredient {
    pub fn is_active(&self) -> bool {
        !self.state.is_terminal()
    }

    /// Re-derives `state` for `now`. Terminal states are left alone.
    pub fn refresh_state(&mut self, now: DateTime<Utc>) -> bool {
        let state = freshness::effective_state(self.state, self.expiration_date, now);
        let changed = state != self.state;
        self.state = state;
        changed
    }

    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        freshness::days_until(self.expiration_date, now)
    }
}

impl fmt::Display for Ingredient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.unit.is_empty() {
            write!(f, "{} {}", self.quantity, self.name)?;
        } else {
            write!(f, "{} {} {}", self.quantity, self.unit, self.name)?;
        }
        write!(f, " [{}] expires {}", self.state, self.expiration_date)
    }
}

/// Input for adding an ingredient.
#[derive(Debug, Clone)]
pub struct NewIngredient {
    pub name: String,
    pub category: String,
    pub quantity: f64,
    pub unit: String,
    pub expiration_date: NaiveDate,
    pub memo: String,
}

impl NewIngredient {
    pub fn new(name: impl Into<String>, expiration_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            category: String::new(),
            quantity: 1.0,
            unit: String::new(),
            expiration_date,
            memo: String::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_quantity(mut self, quantity: f64, unit: impl Into<String>) -> Self {
        self.quantity = quantity;
        self.unit = unit.into();
        self
    }

    pub fn with_memo(mut self, memo: impl Into<String>) -> Self {
        self.memo = memo.into();
        self
    }
}

/// Partial edit of an active ingredient.
#[derive(Debug, Clone, Default)]
pub struct IngredientUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub memo: Option<String>,
}

impl IngredientUpdate {
    pub fn apply(self, ingredient: &mut Ingredient) {
        if let Some(name) = self.name {
            ingredient.name = name;
        }
        if let Some(category) = self.category {
            ingredient.category = category;
        }
        if let Some(quantity) = self.quantity {
            ingredient.quantity = quantity;
        }
        if let Some(unit) = self.unit {
            ingredient.unit = unit;
        }
        if let Some(date) = self.expiration_date {
            ingredient.expiration_date = date;
        }
        if let Some(memo) = self.memo {
            ingredient.memo = memo;
        }
    }
}
