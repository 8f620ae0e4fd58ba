//! # warden-core — Domain Primitives
//!
//! Shared primitives for the Warden protection engine:
//!
//! - **Identity** ([`identity`]): Newtypes for every identifier in the
//!   system. Platform-supplied ids (guilds, users, channels, roles) are
//!   validated strings; request ids are UUIDs, valid by construction.
//!
//! - **Entity** ([`entity`]): The protected group's name, with the
//!   case- and whitespace-insensitive normalization used for all
//!   uniqueness checks. Original casing is preserved for display.
//!
//! - **Tier** ([`tier`]): The fixed set of request categories selecting
//!   which audience a protection request is reviewed under.
//!
//! - **Window** ([`window`]): The fixed protection duration. One constant,
//!   one place.

pub mod entity;
pub mod error;
pub mod identity;
pub mod tier;
pub mod window;

pub use entity::EntityName;
pub use error::ValidationError;
pub use identity::{ChannelId, GuildId, RequestId, RoleId, UserId};
pub use tier::Tier;
pub use window::{protection_window, PROTECTION_WINDOW_HOURS};
