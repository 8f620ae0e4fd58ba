//! Validation errors for domain primitives.

use thiserror::Error;

/// Errors raised when constructing a domain primitive from untrusted input.
///
/// Validation happens at construction (and at deserialization, which routes
/// through the same constructors), so a value of a newtype is always valid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A platform identifier was empty or contained non-digit characters.
    #[error("invalid platform id {0:?}: expected a non-empty numeric snowflake")]
    InvalidPlatformId(String),

    /// An entity name was empty (or whitespace-only) after trimming.
    #[error("entity name must not be empty")]
    EmptyEntityName,

    /// An entity name exceeded the maximum length.
    #[error("entity name too long: {len} characters (max {max})")]
    EntityNameTooLong { len: usize, max: usize },

    /// An unrecognized tier identifier.
    #[error("unknown tier {0:?}")]
    UnknownTier(String),
}
