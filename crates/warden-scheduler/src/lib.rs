//! # warden-scheduler — Expiry Scheduling
//!
//! One single-fire tokio task per active grant, keyed by request id. A
//! fired timer delivers the id on a channel; the id is a *hint*, not a
//! command — the consumer re-fetches the record and re-validates its
//! status before expiring anything, so a stale timer can never revert a
//! grant that was ended manually in the meantime.
//!
//! Timers live in process memory and do not survive a restart.
//! [`ExpiryScheduler::reconcile_on_startup`] is therefore mandatory on
//! every process start: it resolves any expirations missed while offline
//! and rebuilds the schedule for the rest from persisted state.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use warden_core::RequestId;
use warden_lifecycle::ProtectionRequest;
use warden_store::{RequestRepository, StoreError};

/// Scheduled-task handles, indexed by request id.
type TimerArena = Arc<Mutex<HashMap<RequestId, JoinHandle<()>>>>;

/// Schedules a wake-up per active grant at its expiry instant.
pub struct ExpiryScheduler {
    timers: TimerArena,
    fired: mpsc::UnboundedSender<RequestId>,
}

impl ExpiryScheduler {
    /// Create a scheduler and the receiver its fired timers deliver on.
    ///
    /// The consumer drains the receiver and routes each id through the
    /// expire path (re-fetch, re-validate, transition).
    pub fn new() -> (Self, mpsc::UnboundedReceiver<RequestId>) {
        let (fired, receiver) = mpsc::unbounded_channel();
        (
            Self {
                timers: Arc::new(Mutex::new(HashMap::new())),
                fired,
            },
            receiver,
        )
    }

    /// Schedule a single-fire wake-up for `id` at `expires_at`, replacing
    /// any existing wake-up for the same id. An instant already in the
    /// past fires immediately.
    ///
    /// Must be called from within a tokio runtime; the wake-up is a
    /// spawned task.
    pub fn arm(&self, id: RequestId, expires_at: DateTime<Utc>) {
        let delay = (expires_at - Utc::now())
            .to_std()
            .unwrap_or(std::time::Duration::ZERO);
        let fired = self.fired.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the service is shutting down.
            let _ = fired.send(id);
        });

        let mut timers = self.timers.lock();
        if let Some(previous) = timers.insert(id, handle) {
            previous.abort();
            debug!(request_id = %id, "replaced existing expiry timer");
        } else {
            debug!(request_id = %id, expires_at = %expires_at, "armed expiry timer");
        }
    }

    /// Cancel the scheduled wake-up for `id`, if present. No-op otherwise.
    ///
    /// Called before the `ended_early` transition persists, and as cleanup
    /// once a fired timer has been processed.
    pub fn disarm(&self, id: &RequestId) {
        if let Some(handle) = self.timers.lock().remove(id) {
            handle.abort();
            debug!(request_id = %id, "disarmed expiry timer");
        }
    }

    /// Number of armed timers. Diagnostic only.
    pub fn armed_count(&self) -> usize {
        self.timers.lock().len()
    }

    /// Rebuild the schedule from persisted state on process start.
    ///
    /// Active records whose window already elapsed are moved to `expired`
    /// through the repository's prune sweep and returned so the caller can
    /// emit their notifications exactly once — they are *not* armed, so no
    /// timer duplicates the notification later. Every remaining active
    /// record is armed at its recorded expiry instant. Like [`arm`](Self::arm),
    /// this must run within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the pruned collection cannot be persisted;
    /// no timers are armed in that case.
    pub fn reconcile_on_startup(
        &self,
        repository: &RequestRepository,
    ) -> Result<Vec<ProtectionRequest>, StoreError> {
        let now = Utc::now();
        let missed = repository.prune_expired(now)?;

        let mut armed = 0usize;
        for request in repository.load() {
            if let Some(expires_at) = request.expires_at {
                if request.is_live(now) {
                    self.arm(request.id, expires_at);
                    armed += 1;
                }
            }
        }

        info!(
            missed = missed.len(),
            armed, "reconciled expiry schedule from persisted state",
        );
        Ok(missed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use warden_core::{EntityName, GuildId, Tier, UserId};
    use warden_lifecycle::{RequestMetadata, RequestStatus};

    fn approved_request(entity: &str) -> ProtectionRequest {
        let mut request = ProtectionRequest::submit(
            GuildId::new("500").unwrap(),
            EntityName::new(entity).unwrap(),
            Tier::Group,
            UserId::new("1001").unwrap(),
            RequestMetadata::default(),
        );
        request.approve(UserId::new("9000").unwrap()).unwrap();
        request
    }

    async fn nothing_fires(receiver: &mut mpsc::UnboundedReceiver<RequestId>) -> bool {
        tokio::time::timeout(std::time::Duration::from_secs(60 * 60 * 24 * 30), receiver.recv())
            .await
            .is_err()
    }

    #[tokio::test(start_paused = true)]
    async fn armed_timer_fires_with_its_id() {
        let (scheduler, mut receiver) = ExpiryScheduler::new();
        let id = RequestId::new();
        scheduler.arm(id, Utc::now() + Duration::hours(1));
        assert_eq!(receiver.recv().await, Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_instant_fires_immediately() {
        let (scheduler, mut receiver) = ExpiryScheduler::new();
        let id = RequestId::new();
        scheduler.arm(id, Utc::now() - Duration::hours(3));
        assert_eq!(receiver.recv().await, Some(id));
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_cancels_the_wakeup() {
        let (scheduler, mut receiver) = ExpiryScheduler::new();
        let id = RequestId::new();
        scheduler.arm(id, Utc::now() + Duration::hours(1));
        scheduler.disarm(&id);
        assert_eq!(scheduler.armed_count(), 0);
        assert!(nothing_fires(&mut receiver).await);
    }

    #[tokio::test(start_paused = true)]
    async fn disarm_unknown_id_is_a_noop() {
        let (scheduler, _receiver) = ExpiryScheduler::new();
        scheduler.disarm(&RequestId::new());
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_and_fires_once() {
        let (scheduler, mut receiver) = ExpiryScheduler::new();
        let id = RequestId::new();
        scheduler.arm(id, Utc::now() + Duration::hours(10));
        scheduler.arm(id, Utc::now() + Duration::hours(1));
        assert_eq!(scheduler.armed_count(), 1);

        assert_eq!(receiver.recv().await, Some(id));
        assert!(nothing_fires(&mut receiver).await);
    }

    #[tokio::test(start_paused = true)]
    async fn reconcile_expires_missed_and_arms_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let repository = RequestRepository::new(dir.path().join("requests.json"));

        let mut missed = approved_request("Alpha");
        missed.expires_at = Some(Utc::now() - Duration::hours(2));
        let live = approved_request("Beta");
        repository.insert(missed.clone()).unwrap();
        repository.insert(live.clone()).unwrap();

        let (scheduler, mut receiver) = ExpiryScheduler::new();
        let resolved = scheduler.reconcile_on_startup(&repository).unwrap();

        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id, missed.id);
        assert_eq!(
            repository.find(&missed.id).unwrap().status,
            RequestStatus::Expired
        );

        // Only the live grant was armed; it fires when its window elapses.
        assert_eq!(scheduler.armed_count(), 1);
        assert_eq!(receiver.recv().await, Some(live.id));
        // The missed grant never gets a duplicate timer.
        assert!(nothing_fires(&mut receiver).await);
    }
}
