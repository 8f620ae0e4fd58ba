//! # warden-store — Durable Persistence
//!
//! Flat-file persistence for the two collections the engine owns:
//!
//! - **File** ([`file`]): The durable JSON store. Loads degrade to a
//!   default on missing or corrupt data (availability over strict
//!   durability); saves are temp-write-then-atomic-rename, so a crash
//!   mid-write never leaves a truncated file behind.
//!
//! - **Registry** ([`registry`]): Per-guild configuration — review, log,
//!   and announcement channels plus gating roles. Updates are
//!   merge-patches; a guild's config is never replaced wholesale and
//!   never deleted.
//!
//! - **Repository** ([`repository`]): Queries over the request
//!   collection. Every call reloads the collection from disk — there is
//!   no long-lived cache, so the scheduler's callback context and the
//!   main event path always see the same persisted truth.

pub mod error;
pub mod file;
pub mod registry;
pub mod repository;

pub use error::StoreError;
pub use registry::{ConfigRegistry, GuildConfig, GuildConfigPatch};
pub use repository::RequestRepository;
