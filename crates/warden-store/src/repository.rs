//! # Request Repository
//!
//! Query and mutation operations over the persisted request collection.
//!
//! Every operation reloads the full collection from disk before acting.
//! That discipline is what keeps the duplicate gates honest: the scheduler
//! fires in its own context, and a cached collection in either place would
//! let a submit or approval race against an expiry it cannot see.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use warden_core::{EntityName, GuildId, RequestId, UserId};
use warden_lifecycle::{ProtectionRequest, RequestStatus};

use crate::error::StoreError;
use crate::file;

/// Reload-per-call CRUD and queries over the request collection.
#[derive(Debug, Clone)]
pub struct RequestRepository {
    path: PathBuf,
}

impl RequestRepository {
    /// Create a repository backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the full collection. Missing or corrupt data is an empty
    /// collection.
    pub fn load(&self) -> Vec<ProtectionRequest> {
        file::load_or_default(&self.path)
    }

    /// Persist the full collection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be persisted.
    pub fn save(&self, collection: &[ProtectionRequest]) -> Result<(), StoreError> {
        file::save(&self.path, &collection)
    }

    /// Append a freshly-submitted record and persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be persisted.
    pub fn insert(&self, request: ProtectionRequest) -> Result<(), StoreError> {
        let mut collection = self.load();
        collection.push(request);
        self.save(&collection)
    }

    /// Replace the record with the same id and persist. Records are
    /// mutated in place through their lifecycle — the id never changes.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::RecordMissing`] if no record has the id.
    pub fn replace(&self, request: &ProtectionRequest) -> Result<(), StoreError> {
        let mut collection = self.load();
        let slot = collection
            .iter_mut()
            .find(|existing| existing.id == request.id)
            .ok_or_else(|| StoreError::RecordMissing(request.id.to_string()))?;
        *slot = request.clone();
        self.save(&collection)
    }

    /// Fetch a record by id.
    pub fn find(&self, id: &RequestId) -> Option<ProtectionRequest> {
        self.load().into_iter().find(|request| request.id == *id)
    }

    /// The requester's pending record in this guild, if any. The
    /// duplicate-requester gate.
    pub fn find_pending_for_requester(
        &self,
        guild_id: &GuildId,
        requester_id: &UserId,
    ) -> Option<ProtectionRequest> {
        self.load().into_iter().find(|request| {
            request.guild_id == *guild_id
                && request.requester_id == *requester_id
                && request.status == RequestStatus::Pending
        })
    }

    /// The live grant for this entity name in this guild, if any — status
    /// `active` with an unexpired window at `now`. The uniqueness gate;
    /// callers invoke it against a fresh reload immediately before both
    /// submission and approval.
    ///
    /// `exclude` skips one id, so a record being approved does not collide
    /// with itself.
    pub fn find_active_for_entity(
        &self,
        guild_id: &GuildId,
        entity_name: &EntityName,
        exclude: Option<&RequestId>,
        now: DateTime<Utc>,
    ) -> Option<ProtectionRequest> {
        self.load().into_iter().find(|request| {
            request.guild_id == *guild_id
                && exclude != Some(&request.id)
                && request.entity_name.matches(entity_name)
                && request.is_live(now)
        })
    }

    /// The record keeping this entity name taken in this guild, if any —
    /// either a pending request or a live grant. The submission-time
    /// entity gate: at most one pending-or-active record may exist per
    /// normalized entity name.
    pub fn find_open_for_entity(
        &self,
        guild_id: &GuildId,
        entity_name: &EntityName,
        now: DateTime<Utc>,
    ) -> Option<ProtectionRequest> {
        self.load().into_iter().find(|request| {
            request.guild_id == *guild_id
                && request.entity_name.matches(entity_name)
                && (request.status == RequestStatus::Pending || request.is_live(now))
        })
    }

    /// All records in a guild with the given status, sorted ascending by
    /// the status's relevant timestamp: soonest-expiring first for active
    /// grants, earliest-requested first otherwise.
    pub fn list_by_status(
        &self,
        guild_id: &GuildId,
        status: RequestStatus,
    ) -> Vec<ProtectionRequest> {
        let mut records: Vec<_> = self
            .load()
            .into_iter()
            .filter(|request| request.guild_id == *guild_id && request.status == status)
            .collect();
        match status {
            RequestStatus::Active => {
                records.sort_by_key(|request| request.expires_at);
            }
            _ => records.sort_by_key(|request| request.requested_at),
        }
        records
    }

    /// Move every active record whose window has elapsed at `now` to
    /// `expired`, persist, and return the newly-expired records so the
    /// caller can notify on them.
    ///
    /// This is the sole authority for passive expiry and it is idempotent:
    /// a second sweep finds nothing left to expire and returns an empty
    /// set.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be persisted. The
    /// collection on disk is untouched in that case.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> Result<Vec<ProtectionRequest>, StoreError> {
        let mut collection = self.load();
        let mut expired = Vec::new();
        for request in collection.iter_mut() {
            let elapsed = request.status == RequestStatus::Active
                && request.expires_at.is_some_and(|expires| expires <= now);
            if !elapsed {
                continue;
            }
            // Cannot fail: the record was just observed active.
            if request.expire().is_ok() {
                expired.push(request.clone());
            }
        }
        if !expired.is_empty() {
            self.save(&collection)?;
        }
        Ok(expired)
    }
}
