//! # warden-service — Event Front Door
//!
//! The single-writer coordinator the chat-platform glue talks to. Every
//! inbound event — a player submitting a request, staff deciding one, a
//! timer firing, the periodic sweep — enters through one
//! [`ProtectionService`] method, runs to completion, and returns the
//! side-effect [`Intent`]s the caller executes.
//!
//! - **Error** ([`error`]): The service-level error taxonomy. Every
//!   rejection names its specific reason; only internal failures map to a
//!   generic message.
//!
//! - **Intent** ([`intent`]): Outbound side effects as data. The core
//!   never performs network I/O; transitions commit to disk first and
//!   intents are returned after, so a failed notification can never roll
//!   back a status change.
//!
//! - **Action** ([`action`]): The staff-action token codec — the tagged
//!   `{kind, id}` variant decoded once at the boundary, so nothing past
//!   the boundary routes on string prefixes.
//!
//! - **Service** ([`service`]): The operations themselves.

pub mod action;
pub mod error;
pub mod intent;
pub mod service;

pub use action::{StaffAction, StaffActionKind};
pub use error::ServiceError;
pub use intent::Intent;
pub use service::{Outcome, ProtectionService};
