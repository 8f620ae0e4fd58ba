//! # Protection Request Record
//!
//! The durable record of one protection attempt, created via
//! [`ProtectionRequest::submit`] and advanced through its lifecycle by
//! transition methods that validate the current status before mutating
//! anything.
//!
//! Field names match the persisted wire layout (`entityName`,
//! `requesterId`, …); the record serializes directly into the request
//! collection with no mapping layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use warden_core::{protection_window, EntityName, GuildId, RequestId, Tier, UserId};

use crate::error::LifecycleError;
use crate::status::RequestStatus;

// ── Metadata ───────────────────────────────────────────────────────────

/// Free-text fields carried through the lifecycle unchanged. The state
/// machine never interprets them; they exist for review and announcement
/// rendering by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMetadata {
    /// Display name shown in review/announcement surfaces, if different
    /// from the entity name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// In-game coordinates of the protected base, if supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<String>,
    /// Free-form notes to the reviewing staff.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ── Transition Record ──────────────────────────────────────────────────

/// A record of a single status transition.
///
/// Every applied transition is appended here with the acting user (where
/// one exists — expiry has none), giving each record a complete audit
/// trail. The log is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    /// Status before the transition.
    pub from: RequestStatus,
    /// Status after the transition.
    pub to: RequestStatus,
    /// When the transition was applied (UTC).
    pub at: DateTime<Utc>,
    /// The actor that triggered the transition, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actor: Option<UserId>,
}

// ── The Request ────────────────────────────────────────────────────────

/// One protection grant attempt.
///
/// Created in `pending` by [`submit`](ProtectionRequest::submit) — the only
/// constructor — then mutated in place through exactly one of the paths in
/// the transition graph. The record keeps its id for life; terminal records
/// are retained (with their transition log) rather than deleted, and every
/// pending/active query filters them out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtectionRequest {
    /// Unique request identifier, assigned at submission.
    pub id: RequestId,
    /// The community this request belongs to.
    pub guild_id: GuildId,
    /// Name of the protected group. Original casing preserved; uniqueness
    /// checks use the normalized form.
    pub entity_name: EntityName,
    /// Category selecting the review audience. Immutable after creation.
    pub tier: Tier,
    /// The submitting actor. Immutable after creation.
    pub requester_id: UserId,
    /// Current lifecycle status — the only field driving transitions.
    pub status: RequestStatus,
    /// When the request was submitted (UTC).
    pub requested_at: DateTime<Utc>,
    /// Set on the transition to `active`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,
    /// The approving staff member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<UserId>,
    /// `approvedAt` plus the fixed protection window. Present iff the
    /// record is or was `active`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Set on the transition to `denied`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denied_at: Option<DateTime<Utc>>,
    /// The denying staff member.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denied_by: Option<UserId>,
    /// Set on the transition to `ended_early`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_early_at: Option<DateTime<Utc>>,
    /// The staff member that ended protection early.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_early_by: Option<UserId>,
    /// Reason given for ending protection early — carried into the public
    /// "open season" announcement.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_early_reason: Option<String>,
    /// Free-text fields carried through unchanged.
    #[serde(default)]
    pub metadata: RequestMetadata,
    /// Complete transition history for audit purposes.
    #[serde(default)]
    pub transition_log: Vec<TransitionRecord>,
}

impl ProtectionRequest {
    /// Submit a new protection request, creating it in `pending`.
    ///
    /// Duplicate gates (one pending request per requester, one live grant
    /// per entity) are the caller's responsibility — they require the full
    /// persisted collection, which this crate does not see.
    pub fn submit(
        guild_id: GuildId,
        entity_name: EntityName,
        tier: Tier,
        requester_id: UserId,
        metadata: RequestMetadata,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RequestId::new(),
            guild_id,
            entity_name,
            tier,
            requester_id,
            status: RequestStatus::Pending,
            requested_at: now,
            approved_at: None,
            approved_by: None,
            expires_at: None,
            denied_at: None,
            denied_by: None,
            ended_early_at: None,
            ended_early_by: None,
            ended_early_reason: None,
            metadata,
            transition_log: vec![TransitionRecord {
                from: RequestStatus::Pending,
                to: RequestStatus::Pending,
                at: now,
                actor: None,
            }],
        }
    }

    /// Transition pending → active.
    ///
    /// Sets `approvedAt` to now and `expiresAt` to now plus the fixed
    /// protection window. The caller must re-check entity uniqueness
    /// against a fresh reload before calling, and must arm the expiry
    /// scheduler after persisting.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] if not `pending`.
    pub fn approve(&mut self, approver: UserId) -> Result<(), LifecycleError> {
        self.require_status(RequestStatus::Pending, RequestStatus::Active)?;
        let now = Utc::now();
        self.approved_at = Some(now);
        self.approved_by = Some(approver.clone());
        self.expires_at = Some(now + protection_window());
        self.record_transition(RequestStatus::Active, now, Some(approver));
        self.status = RequestStatus::Active;
        Ok(())
    }

    /// Transition pending → denied. Terminal.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] if not `pending`.
    pub fn deny(&mut self, denier: UserId) -> Result<(), LifecycleError> {
        self.require_status(RequestStatus::Pending, RequestStatus::Denied)?;
        let now = Utc::now();
        self.denied_at = Some(now);
        self.denied_by = Some(denier.clone());
        self.record_transition(RequestStatus::Denied, now, Some(denier));
        self.status = RequestStatus::Denied;
        Ok(())
    }

    /// Transition active → ended_early. Terminal.
    ///
    /// Records the acting staff member and the reason, which the caller
    /// carries into the public announcement. The caller must disarm the
    /// expiry timer before (or atomically with) persisting this.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] if not `active`.
    pub fn end_early(
        &mut self,
        actor: UserId,
        reason: impl Into<String>,
    ) -> Result<(), LifecycleError> {
        self.require_status(RequestStatus::Active, RequestStatus::EndedEarly)?;
        let now = Utc::now();
        self.ended_early_at = Some(now);
        self.ended_early_by = Some(actor.clone());
        self.ended_early_reason = Some(reason.into());
        self.record_transition(RequestStatus::EndedEarly, now, Some(actor));
        self.status = RequestStatus::EndedEarly;
        Ok(())
    }

    /// Transition active → expired. Terminal.
    ///
    /// Only the scheduler and the prune sweep call this, and both re-fetch
    /// the record first and skip it silently when it is no longer `active`
    /// — a stale timer must never revert a grant that was already ended
    /// manually. The strictness here is the backstop for that discipline.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] if not `active`.
    pub fn expire(&mut self) -> Result<(), LifecycleError> {
        self.require_status(RequestStatus::Active, RequestStatus::Expired)?;
        self.record_transition(RequestStatus::Expired, Utc::now(), None);
        self.status = RequestStatus::Expired;
        Ok(())
    }

    /// Whether the grant is live: `active` and its window has not elapsed
    /// at `now`.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status == RequestStatus::Active
            && self.expires_at.is_some_and(|expires| expires > now)
    }

    /// Check that the record is in the expected status for a transition.
    fn require_status(
        &self,
        expected: RequestStatus,
        target: RequestStatus,
    ) -> Result<(), LifecycleError> {
        if self.status.is_terminal() {
            return Err(LifecycleError::TerminalState {
                request_id: self.id.to_string(),
                state: self.status.as_str().to_string(),
            });
        }
        if self.status != expected {
            return Err(LifecycleError::InvalidTransition {
                from: self.status.as_str().to_string(),
                to: target.as_str().to_string(),
                reason: format!("expected status {expected}, got {}", self.status),
            });
        }
        Ok(())
    }

    /// Append to the audit log.
    fn record_transition(&mut self, to: RequestStatus, at: DateTime<Utc>, actor: Option<UserId>) {
        self.transition_log.push(TransitionRecord {
            from: self.status,
            to,
            at,
            actor,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn staff(n: &str) -> UserId {
        UserId::new(n).unwrap()
    }

    fn submit_request(entity: &str) -> ProtectionRequest {
        ProtectionRequest::submit(
            GuildId::new("100200300").unwrap(),
            EntityName::new(entity).unwrap(),
            Tier::Group,
            staff("111111111"),
            RequestMetadata {
                display_name: None,
                coordinates: Some("J14".to_string()),
                notes: None,
            },
        )
    }

    #[test]
    fn submit_creates_pending_record() {
        let request = submit_request("The Reapers");
        assert_eq!(request.status, RequestStatus::Pending);
        assert!(request.expires_at.is_none());
        assert!(!request.transition_log.is_empty());
    }

    #[test]
    fn approve_sets_expiry_one_window_out() {
        let mut request = submit_request("The Reapers");
        request.approve(staff("222222222")).unwrap();
        assert_eq!(request.status, RequestStatus::Active);
        let approved_at = request.approved_at.unwrap();
        assert_eq!(
            request.expires_at.unwrap(),
            approved_at + Duration::hours(168)
        );
        assert_eq!(request.approved_by, Some(staff("222222222")));
    }

    #[test]
    fn approve_twice_fails_and_leaves_record_unchanged() {
        let mut request = submit_request("The Reapers");
        request.approve(staff("222222222")).unwrap();
        let snapshot = request.clone();

        let err = request.approve(staff("333333333")).unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidTransition { .. }));
        assert_eq!(request, snapshot);
    }

    #[test]
    fn deny_is_terminal() {
        let mut request = submit_request("The Reapers");
        request.deny(staff("222222222")).unwrap();
        assert_eq!(request.status, RequestStatus::Denied);
        assert!(request.approve(staff("222222222")).is_err());
    }

    #[test]
    fn end_early_records_actor_and_reason() {
        let mut request = submit_request("The Reapers");
        request.approve(staff("222222222")).unwrap();
        request.end_early(staff("333333333"), "raided").unwrap();
        assert_eq!(request.status, RequestStatus::EndedEarly);
        assert_eq!(request.ended_early_reason.as_deref(), Some("raided"));
        // expiresAt is retained for the audit trail.
        assert!(request.expires_at.is_some());
    }

    #[test]
    fn expire_rejected_after_manual_end() {
        let mut request = submit_request("The Reapers");
        request.approve(staff("222222222")).unwrap();
        request.end_early(staff("333333333"), "raided").unwrap();

        let err = request.expire().unwrap_err();
        assert!(matches!(err, LifecycleError::TerminalState { .. }));
        assert_eq!(request.status, RequestStatus::EndedEarly);
    }

    #[test]
    fn expire_rejected_from_pending() {
        let mut request = submit_request("The Reapers");
        assert!(request.expire().is_err());
        assert_eq!(request.status, RequestStatus::Pending);
    }

    #[test]
    fn is_live_respects_window() {
        let mut request = submit_request("The Reapers");
        request.approve(staff("222222222")).unwrap();
        let expires = request.expires_at.unwrap();
        assert!(request.is_live(expires - Duration::hours(1)));
        assert!(!request.is_live(expires + Duration::seconds(1)));
    }

    #[test]
    fn wire_layout_uses_camel_case_fields() {
        let request = submit_request("The Reapers");
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("entityName").is_some());
        assert!(value.get("requesterId").is_some());
        assert!(value.get("requestedAt").is_some());
        assert_eq!(value["status"], "pending");
    }

    #[test]
    fn round_trips_through_json() {
        let mut request = submit_request("The Reapers");
        request.approve(staff("222222222")).unwrap();
        let json = serde_json::to_string(&request).unwrap();
        let back: ProtectionRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
