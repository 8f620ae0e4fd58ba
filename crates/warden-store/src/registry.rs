//! # Configuration Registry
//!
//! Per-guild settings: which channels receive review cards, log entries,
//! and public announcements, and which roles are used for gating/pinging.
//! The registry stores identifiers only — whether a channel or role still
//! exists on the platform is checked by the caller at the point of use.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use warden_core::{ChannelId, GuildId, RoleId};

use crate::error::StoreError;
use crate::file;

/// A guild's persisted configuration.
///
/// Created empty on the first setup action and merge-patched on every
/// subsequent one; never deleted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildConfig {
    /// Channel receiving new requests and their decision controls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_channel_ref: Option<ChannelId>,
    /// Channel receiving staff-audit log entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_channel_ref: Option<ChannelId>,
    /// Channel receiving public "open season" announcements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub announce_channel_ref: Option<ChannelId>,
    /// Roles used for gating/pinging. Stored, never interpreted.
    #[serde(default)]
    pub role_refs: Vec<RoleId>,
}

impl GuildConfig {
    /// Whether the configuration is complete enough for the engine to
    /// route every intent it can emit.
    pub fn is_ready(&self) -> bool {
        self.review_channel_ref.is_some()
            && self.log_channel_ref.is_some()
            && self.announce_channel_ref.is_some()
    }

    /// Merge a patch into this config. `Some` fields overwrite, `None`
    /// fields are left untouched.
    pub fn apply(&mut self, patch: GuildConfigPatch) {
        if let Some(channel) = patch.review_channel_ref {
            self.review_channel_ref = Some(channel);
        }
        if let Some(channel) = patch.log_channel_ref {
            self.log_channel_ref = Some(channel);
        }
        if let Some(channel) = patch.announce_channel_ref {
            self.announce_channel_ref = Some(channel);
        }
        if let Some(roles) = patch.role_refs {
            self.role_refs = roles;
        }
    }
}

/// A partial configuration update from a setup action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GuildConfigPatch {
    pub review_channel_ref: Option<ChannelId>,
    pub log_channel_ref: Option<ChannelId>,
    pub announce_channel_ref: Option<ChannelId>,
    pub role_refs: Option<Vec<RoleId>>,
}

/// The persisted guild-id → config mapping.
type ConfigCollection = BTreeMap<GuildId, GuildConfig>;

/// Lookup/update over the durable configuration collection.
///
/// Reloads from disk on every call: the registry is read from both the
/// main event path and the scheduler context, and a reload-before-use
/// discipline keeps both honest.
#[derive(Debug, Clone)]
pub struct ConfigRegistry {
    path: PathBuf,
}

impl ConfigRegistry {
    /// Create a registry backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Fetch a guild's config, or `None` if it was never set up.
    pub fn get(&self, guild_id: &GuildId) -> Option<GuildConfig> {
        let collection: ConfigCollection = file::load_or_default(&self.path);
        collection.get(guild_id).cloned()
    }

    /// Merge a patch into a guild's config (creating it if absent) and
    /// persist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the collection cannot be persisted.
    pub fn set(
        &self,
        guild_id: GuildId,
        patch: GuildConfigPatch,
    ) -> Result<GuildConfig, StoreError> {
        let mut collection: ConfigCollection = file::load_or_default(&self.path);
        let config = collection.entry(guild_id).or_default();
        config.apply(patch);
        let updated = config.clone();
        file::save(&self.path, &collection)?;
        Ok(updated)
    }
}
