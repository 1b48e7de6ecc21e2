//! Explicit user identity passed to every core operation.
//!
//! There is deliberately no ambient "current user" global: callers resolve a
//! [`UserContext`] once (from their auth layer) and pass it down, which keeps
//! the core testable without a process-wide singleton.

use crate::errors::{Error, Result};

/// Resolved identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserContext {
    user_id: String,
}

impl UserContext {
    /// Build a context from an already-resolved user id.
    ///
    /// Fails fast with [`Error::NotAuthenticated`] when the id is absent or
    /// blank, so repository calls never reach the wire unauthenticated.
    pub fn resolve(user_id: Option<&str>) -> Result<Self> {
        match user_id.map(str::trim) {
            Some(id) if !id.is_empty() => Ok(Self {
                user_id: id.to_string(),
            }),
            _ => Err(Error::NotAuthenticated),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_requires_a_non_blank_id() {
        assert!(UserContext::resolve(Some("user-1")).is_ok());
        assert!(matches!(
            UserContext::resolve(None),
            Err(Error::NotAuthenticated)
        ));
        assert!(matches!(
            UserContext::resolve(Some("   ")),
            Err(Error::NotAuthenticated)
        ));
    }
}
