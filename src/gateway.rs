//! Platform gateway seam.
//!
//! The chat-platform client lives outside this crate. The core consumes it
//! through this narrow trait: presence notifications flow in as
//! [`crate::models::PresenceUpdate`] values handed to the tracker, and the
//! operations below cover everything the tracker and reconciler ask of the
//! platform. Production code implements it over the real client; tests use
//! in-memory doubles.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{ChannelId, GuildId, LiveConnection, UserId, VoiceOccupancy};

/// Narrow interface onto the chat platform.
///
/// All lookups reflect the platform's current view; `None` from the name
/// lookups means the guild or channel is no longer visible, which the
/// reconciler treats as a signal to drop stale directives.
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Name of a guild visible to the process, or `None` once it is gone.
    async fn guild_name(&self, guild: GuildId) -> Option<String>;

    /// Name of a voice channel, or `None` once it no longer exists.
    async fn channel_name(&self, guild: GuildId, channel: ChannelId) -> Option<String>;

    /// The live voice connection held in `guild`, if any.
    async fn current_connection(&self, guild: GuildId) -> Option<LiveConnection>;

    /// Establishes a voice connection in `guild` on `channel`.
    async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<()>;

    /// Moves the existing connection in `guild` onto `channel`.
    async fn move_to(&self, guild: GuildId, channel: ChannelId) -> Result<()>;

    /// Drops the voice connection held in `guild`.
    async fn disconnect(&self, guild: GuildId) -> Result<()>;

    /// Non-bot members currently connected, per visible voice channel.
    /// Used once at startup to reopen sessions across a restart.
    async fn voice_occupants(&self) -> Vec<VoiceOccupancy>;

    /// Resolves a user id to a display name. Implementations fall back to
    /// the raw id rendered as decimal when resolution fails, so this never
    /// errors.
    async fn resolve_display_name(&self, user: UserId) -> String;

    /// Sends a text notice to a channel. Callers treat this as best-effort
    /// and ignore failures.
    async fn send_notice(&self, channel: ChannelId, text: &str) -> Result<()>;
}
