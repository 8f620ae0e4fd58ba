//! # Protection Window
//!
//! Every grant runs for the same fixed window: 7 days from approval.
//! The duration is deliberately not user-suppliable; the constant below is
//! the only place it is defined.

use chrono::Duration;

/// The protection window, in hours (7 days).
pub const PROTECTION_WINDOW_HOURS: i64 = 168;

/// The protection window as a [`chrono::Duration`].
pub fn protection_window() -> Duration {
    Duration::hours(PROTECTION_WINDOW_HOURS)
}
