//! # Identity Newtypes
//!
//! Domain-primitive newtypes for identifiers throughout the engine. Each
//! identifier is a distinct type — you cannot pass a [`UserId`] where a
//! [`ChannelId`] is expected.
//!
//! ## Validation
//!
//! Platform-supplied identifiers ([`GuildId`], [`UserId`], [`ChannelId`],
//! [`RoleId`]) are numeric snowflake strings and validate their format at
//! construction time. [`RequestId`] is UUID-based and always valid by
//! construction.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Helper macro to implement `Deserialize` for string newtypes that must
/// validate their contents. Deserializes as a plain `String`, then routes
/// through the type's `new()` constructor so that invalid values are
/// rejected at deserialization time — not silently accepted.
macro_rules! impl_validating_deserialize {
    ($ty:ident) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let raw = String::deserialize(deserializer)?;
                Self::new(raw).map_err(serde::de::Error::custom)
            }
        }
    };
}

/// Helper macro for the shared shape of snowflake-string identifiers.
macro_rules! snowflake_id {
    ($(#[$doc:meta])* $ty:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
        pub struct $ty(String);

        impl_validating_deserialize!($ty);

        impl $ty {
            /// Create the identifier from a string, validating format.
            ///
            /// # Errors
            ///
            /// Returns [`ValidationError::InvalidPlatformId`] if the string
            /// is empty or contains non-digit characters.
            pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
                let s = value.into();
                if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                    return Err(ValidationError::InvalidPlatformId(s));
                }
                Ok(Self(s))
            }

            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Platform-supplied identifiers (validated snowflake strings)
// ---------------------------------------------------------------------------

snowflake_id! {
    /// A community (guild) identifier assigned by the chat platform.
    GuildId
}

snowflake_id! {
    /// An actor identifier assigned by the chat platform — requesters,
    /// reviewers, and the actors recorded on terminal transitions.
    UserId
}

snowflake_id! {
    /// A channel identifier assigned by the chat platform. Stored in guild
    /// configuration and carried opaquely in outbound intents.
    ChannelId
}

snowflake_id! {
    /// A role identifier assigned by the chat platform, used for
    /// gating/pinging. Stored, never interpreted.
    RoleId
}

// ---------------------------------------------------------------------------
// Request identifier (always valid by construction)
// ---------------------------------------------------------------------------

/// A unique identifier for a protection request, assigned at submission
/// and immutable for the life of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Create a new random request identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a request identifier from an existing UUID.
    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for RequestId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for RequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}
