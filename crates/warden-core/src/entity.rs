//! # Entity Names
//!
//! The name of the protected group. Uniqueness checks across the system
//! compare the *normalized* form (lowercased, whitespace collapsed), while
//! the original casing is preserved for display and announcements.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Maximum accepted entity-name length, in characters.
pub const MAX_ENTITY_NAME_LEN: usize = 64;

/// The free-text name of a protected group.
///
/// Construction trims surrounding whitespace and rejects empty or oversized
/// names. Two names are considered the same entity when their
/// [`normalized`](EntityName::normalized) forms match — `"The Reapers"`,
/// `"the reapers"`, and `"THE  REAPERS"` all collide.
#[derive(Debug, Clone, Serialize)]
pub struct EntityName(String);

impl EntityName {
    /// Create an entity name from user input, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyEntityName`] for empty or
    /// whitespace-only input, [`ValidationError::EntityNameTooLong`] when
    /// the trimmed name exceeds [`MAX_ENTITY_NAME_LEN`].
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let trimmed = value.into().trim().to_string();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyEntityName);
        }
        let len = trimmed.chars().count();
        if len > MAX_ENTITY_NAME_LEN {
            return Err(ValidationError::EntityNameTooLong {
                len,
                max: MAX_ENTITY_NAME_LEN,
            });
        }
        Ok(Self(trimmed))
    }

    /// The name as entered (trimmed), for display.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The normalized form used for uniqueness comparisons: lowercased,
    /// with internal whitespace runs collapsed to a single space.
    pub fn normalized(&self) -> String {
        self.0
            .split_whitespace()
            .map(|word| word.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Whether two names identify the same entity.
    pub fn matches(&self, other: &EntityName) -> bool {
        self.normalized() == other.normalized()
    }
}

impl<'de> Deserialize<'de> for EntityName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::new(raw).map_err(serde::de::Error::custom)
    }
}

impl std::fmt::Display for EntityName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq for EntityName {
    /// Equality is normalized equality — the uniqueness semantics.
    fn eq(&self, other: &Self) -> bool {
        self.matches(other)
    }
}

impl Eq for EntityName {}
