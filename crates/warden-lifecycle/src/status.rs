//! The request status enum and its transition graph.

use serde::{Deserialize, Serialize};

/// The lifecycle status of a protection request.
///
/// `pending` is the sole initial state. `denied`, `expired`, and
/// `ended_early` are terminal and absorbing: once reached, every further
/// transition is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// Submitted, awaiting a staff decision.
    Pending,
    /// Approved — the grant is live until `expiresAt`.
    Active,
    /// Rejected by staff. Terminal state.
    Denied,
    /// The protection window elapsed. Terminal state.
    Expired,
    /// Protection was terminated manually before expiry. Terminal state.
    EndedEarly,
}

impl RequestStatus {
    /// The canonical string name of this status, as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Denied => "denied",
            Self::Expired => "expired",
            Self::EndedEarly => "ended_early",
        }
    }

    /// Whether this status is terminal (no further transitions allowed).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Denied | Self::Expired | Self::EndedEarly)
    }

    /// Valid target statuses from this status.
    pub fn valid_transitions(&self) -> &'static [RequestStatus] {
        match self {
            Self::Pending => &[Self::Active, Self::Denied],
            Self::Active => &[Self::Expired, Self::EndedEarly],
            Self::Denied | Self::Expired | Self::EndedEarly => &[],
        }
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
