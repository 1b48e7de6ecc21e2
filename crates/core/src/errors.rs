//! Error types shared by the sync and derivation core.

use thiserror::Error;

use crate::store::EntityKind;

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by repositories, the sync core, and the derivation engine.
#[derive(Debug, Error)]
pub enum Error {
    /// No resolved user identity was supplied for the call.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The id has no backing record in the remote store.
    #[error("{kind} '{id}' not found")]
    NotFound { kind: EntityKind, id: String },

    /// User input or a generation payload failed schema/shape checks.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The backing store or gateway call itself failed.
    #[error("remote failure: {0}")]
    Remote(String),

    /// The operation does not apply to the entity's current state.
    #[error("conflicting state: {0}")]
    Conflict(String),
}

impl Error {
    /// Create a not-found error for a given collection and id.
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a remote failure error.
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    /// Create a conflicting-state error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

// Decode failures at the store boundary are shape problems, not transport
// problems.
impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_kind_and_id() {
        let err = Error::not_found(EntityKind::Recipe, "r-1");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "recipe 'r-1' not found");
    }

    #[test]
    fn json_decode_errors_map_to_validation() {
        let err: Error = serde_json::from_str::<i32>("not-a-number").unwrap_err().into();
        assert!(err.is_validation());
    }
}
