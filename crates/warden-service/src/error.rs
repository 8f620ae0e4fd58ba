//! The service-level error taxonomy.

use thiserror::Error;

use warden_core::ValidationError;
use warden_lifecycle::LifecycleError;
use warden_store::StoreError;

/// Errors surfaced to the initiating actor as a rejection.
///
/// None of these leave persisted state corrupted: every gate runs before
/// the first write, and a rejected transition never mutates its record.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The referenced request id does not exist.
    #[error("no request found with id {0}")]
    NotFound(String),

    /// The transition is not permitted from the record's current status.
    #[error(transparent)]
    InvalidState(#[from] LifecycleError),

    /// The requester already has a pending request.
    #[error("requester already has a pending request for {entity:?}")]
    DuplicateRequester {
        /// Entity name on the existing pending request.
        entity: String,
    },

    /// The entity already has a live grant (or a colliding pending grant
    /// was approved first).
    #[error("{entity:?} already has live protection")]
    DuplicateEntity {
        /// The colliding entity name, as displayed.
        entity: String,
    },

    /// The guild's configuration is missing a channel this operation
    /// would emit to. Surfaced before any mutation is attempted.
    #[error("guild is not configured: missing {missing}")]
    ConfigurationIncomplete {
        /// Which setting is absent (e.g. "review channel").
        missing: &'static str,
    },

    /// Malformed input, rejected before any write.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The durable store could not be written.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// The message shown to the initiating actor.
    ///
    /// Every rejection names its specific reason; storage failures are the
    /// one truly internal case and get a generic response (the detail is
    /// logged, not surfaced).
    pub fn user_message(&self) -> String {
        match self {
            Self::Store(_) => "something went wrong — please try again".to_string(),
            other => other.to_string(),
        }
    }
}
