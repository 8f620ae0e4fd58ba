//! # Staff-Action Tokens
//!
//! The chat platform carries one opaque string per decision control (a
//! button's custom id). That string is decoded exactly once, here, into a
//! tagged [`StaffAction`]; everything past this boundary routes on the
//! variant, never on string parsing.
//!
//! Wire form: `<kind>:<request-uuid>`, e.g.
//! `approve:67e55044-10b1-426f-9247-bb680e5fe0c8`.

use thiserror::Error;

use warden_core::RequestId;

/// Decoding errors for staff-action tokens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionDecodeError {
    /// The token has no `kind:id` separator.
    #[error("malformed action token {0:?}")]
    Malformed(String),

    /// The kind segment is not a known action.
    #[error("unknown action kind {0:?}")]
    UnknownKind(String),

    /// The id segment is not a valid request id.
    #[error("invalid request id in action token: {0}")]
    InvalidId(#[from] uuid::Error),
}

/// What a decision control does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaffActionKind {
    Approve,
    Deny,
    EndEarly,
}

impl StaffActionKind {
    /// The wire prefix for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::Deny => "deny",
            Self::EndEarly => "end_early",
        }
    }
}

/// A decoded staff decision: which action, on which request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffAction {
    pub kind: StaffActionKind,
    pub id: RequestId,
}

impl StaffAction {
    pub fn new(kind: StaffActionKind, id: RequestId) -> Self {
        Self { kind, id }
    }

    /// Encode for a decision control's opaque id.
    pub fn encode(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.id)
    }

    /// Decode a token received from the platform.
    ///
    /// # Errors
    ///
    /// Returns [`ActionDecodeError`] for malformed tokens, unknown kinds,
    /// or invalid request ids.
    pub fn decode(token: &str) -> Result<Self, ActionDecodeError> {
        let (kind, id) = token
            .split_once(':')
            .ok_or_else(|| ActionDecodeError::Malformed(token.to_string()))?;
        let kind = match kind {
            "approve" => StaffActionKind::Approve,
            "deny" => StaffActionKind::Deny,
            "end_early" => StaffActionKind::EndEarly,
            other => return Err(ActionDecodeError::UnknownKind(other.to_string())),
        };
        Ok(Self {
            kind,
            id: id.parse::<RequestId>()?,
        })
    }
}

impl std::fmt::Display for StaffAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.encode())
    }
}
