//! # warden-lifecycle — Request Lifecycle State Machine
//!
//! Manages a protection request from submission through its single
//! terminal transition:
//!
//! ```text
//! pending ──approve()──▶ active ──expire()──────▶ expired
//!    │                      │
//!    │                      └──end_early()──────▶ ended_early
//!    └──deny()──▶ denied
//! ```
//!
//! - **Error** ([`error`]): Structured errors for rejected transitions.
//!
//! - **Status** ([`status`]): The validated status enum with the
//!   transition graph and terminal-state checks.
//!
//! - **Request** ([`request`]): The [`ProtectionRequest`] record, its
//!   transition methods, and the append-only transition log.
//!
//! ## Design Choice: Validated Enum over Typestate
//!
//! Requests are persisted to disk and reloaded on every operation, so
//! their state is not known at compile time. A validated enum serializes
//! directly via serde, and invalid transitions are rejected at runtime
//! with [`LifecycleError::InvalidTransition`] rather than prevented by the
//! type system. Each transition is still a dedicated method with typed
//! parameters, so call sites cannot, say, end a grant early without
//! supplying an actor and a reason.

pub mod error;
pub mod request;
pub mod status;

pub use error::LifecycleError;
pub use request::{ProtectionRequest, RequestMetadata, TransitionRecord};
pub use status::RequestStatus;
