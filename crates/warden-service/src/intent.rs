//! # Side-Effect Intents
//!
//! Outbound effects as data. The service returns these after a transition
//! has committed; the chat-platform glue executes them best-effort and
//! logs failures — a dead notification channel never unwinds a persisted
//! status change.

use serde::{Deserialize, Serialize};

use warden_core::{ChannelId, GuildId, UserId};

/// One outbound side effect the caller should execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Intent {
    /// Direct-message the given user.
    NotifyRequester { user_id: UserId, message: String },
    /// Post publicly to the given channel.
    PostToChannel {
        channel_ref: ChannelId,
        message: String,
    },
    /// Append to the guild's staff-audit log surface.
    LogEvent { guild_id: GuildId, message: String },
}

impl Intent {
    pub fn notify(user_id: UserId, message: impl Into<String>) -> Self {
        Self::NotifyRequester {
            user_id,
            message: message.into(),
        }
    }

    pub fn post(channel_ref: ChannelId, message: impl Into<String>) -> Self {
        Self::PostToChannel {
            channel_ref,
            message: message.into(),
        }
    }

    pub fn log(guild_id: GuildId, message: impl Into<String>) -> Self {
        Self::LogEvent {
            guild_id,
            message: message.into(),
        }
    }
}
