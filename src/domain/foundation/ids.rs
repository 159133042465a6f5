//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// User identifier (issued by the external auth provider).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Creates a new UserId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::empty_field("user_id"));
        }
        Ok(Self(id))
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a plan in the subscription catalog (e.g. "free", "pro").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlanId(String);

impl PlanId {
    /// The catalog id of the tier every subscription reverts to on deletion.
    pub const FREE: &'static str = "free";

    /// Creates a new PlanId, returning error if empty.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::empty_field("plan_id"));
        }
        Ok(Self(id))
    }

    /// The free-tier plan id.
    pub fn free() -> Self {
        Self(Self::FREE.to_string())
    }

    /// Returns true if this is the free tier.
    pub fn is_free(&self) -> bool {
        self.0 == Self::FREE
    }

    /// Returns the inner string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_id_rejects_empty_string() {
        assert!(UserId::new("").is_err());
    }

    #[test]
    fn user_id_preserves_value() {
        let id = UserId::new("usr_123").unwrap();
        assert_eq!(id.as_str(), "usr_123");
        assert_eq!(id.to_string(), "usr_123");
    }

    #[test]
    fn plan_id_rejects_empty_string() {
        assert!(PlanId::new("").is_err());
    }

    #[test]
    fn plan_id_free_is_free() {
        assert!(PlanId::free().is_free());
        assert!(!PlanId::new("pro").unwrap().is_free());
    }

    #[test]
    fn user_id_serializes_transparently() {
        let id = UserId::new("usr_abc").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"usr_abc\"");
    }

    #[test]
    fn plan_id_deserializes_from_json_string() {
        let id: PlanId = serde_json::from_str("\"pro\"").unwrap();
        assert_eq!(id.as_str(), "pro");
    }
}
