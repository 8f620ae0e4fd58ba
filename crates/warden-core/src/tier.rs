//! # Protection Tiers
//!
//! The fixed set of request categories. A tier selects which review
//! audience and which configured role a request is routed to; it never
//! changes after submission.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// The category of a protection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// A single player or small group.
    Solo,
    /// A full in-game group (the common case).
    Group,
    /// An alliance of groups; reviewed by senior staff in most deployments.
    Alliance,
}

impl Tier {
    /// All tiers as a slice.
    pub fn all() -> &'static [Tier] {
        &[Self::Solo, Self::Group, Self::Alliance]
    }

    /// The canonical string identifier for serialization and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Solo => "solo",
            Self::Group => "group",
            Self::Alliance => "alliance",
        }
    }

    /// Parse a tier from its canonical identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownTier`] for anything else.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s {
            "solo" => Ok(Self::Solo),
            "group" => Ok(Self::Group),
            "alliance" => Ok(Self::Alliance),
            other => Err(ValidationError::UnknownTier(other.to_string())),
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
