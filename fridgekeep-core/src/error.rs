//! Repository error type.

use thiserror::Error;

use crate::models::IngredientState;
use crate::store::StoreError;

/// Errors returned by repository operations.
///
/// Every variant is recoverable: callers render a message and carry on.
#[derive(Error, Debug)]
pub enum RepoError {
    #[error("{0} not found")]
    NotFound(String),

    #[error("An account with email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("The owner cannot be removed from a fridge")]
    OwnerRemovalForbidden,

    #[error("Cannot {action} an ingredient that is {from}")]
    InvalidTransition {
        from: IngredientState,
        action: &'static str,
    },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to hash password")]
    Password,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl RepoError {
    pub fn not_found(what: impl std::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput(reason.into())
    }

    pub fn permission_denied(action: impl Into<String>) -> Self {
        Self::PermissionDenied(action.into())
    }
}
