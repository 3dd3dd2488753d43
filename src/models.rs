//! Data models for Voicekeeper.
//!
//! This module defines the core data structures exchanged between the
//! platform gateway, the presence ledger, and the query layer.

/// Platform user identifier (snowflake-style).
pub type UserId = u64;

/// Platform guild identifier (snowflake-style).
pub type GuildId = u64;

/// Platform voice-channel identifier (snowflake-style).
pub type ChannelId = u64;

/// A voice channel paired with its resolved display name.
///
/// History lines record channel names, not ids, so the tracker resolves
/// names through the gateway before handing a transition to the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelRef {
    /// Channel identifier
    pub id: ChannelId,
    /// Human-readable channel name used in history lines
    pub name: String,
}

impl ChannelRef {
    pub fn new(id: ChannelId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A presence-change notification delivered by the platform gateway.
///
/// `previous`/`next` are the voice channels the user occupied before and
/// after the change; `None` means "not in a voice channel".
#[derive(Debug, Clone, PartialEq)]
pub struct PresenceUpdate {
    /// Guild in which the change occurred
    pub guild: GuildId,
    /// The user whose presence changed
    pub user: UserId,
    /// Channel before the change, if any
    pub previous: Option<ChannelId>,
    /// Channel after the change, if any
    pub next: Option<ChannelId>,
    /// Whether the user is a bot (bot events are ignored)
    pub is_bot: bool,
}

impl PresenceUpdate {
    /// True when the update does not change which channel the user is in
    /// (voice-state noise such as mute/deafen toggles).
    pub fn is_noop(&self) -> bool {
        self.previous == self.next
    }
}

/// The live voice connection the process holds in a guild, if any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LiveConnection {
    /// Guild the connection belongs to
    pub guild: GuildId,
    /// Channel the connection is on
    pub channel: ChannelId,
    /// Whether the connection is currently established
    pub connected: bool,
}

/// Current occupants of one voice channel, reported by the gateway for
/// startup reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceOccupancy {
    /// Guild the channel belongs to
    pub guild: GuildId,
    /// The occupied channel
    pub channel: ChannelId,
    /// Non-bot users currently connected
    pub users: Vec<UserId>,
}

/// One row of the voice-time leaderboard.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// The ranked user
    pub user: UserId,
    /// Live-adjusted accumulated seconds
    pub seconds: u64,
    /// Whether the user has a session open right now
    pub live: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_detection() {
        let update = PresenceUpdate {
            guild: 1,
            user: 42,
            previous: Some(100),
            next: Some(100),
            is_bot: false,
        };
        assert!(update.is_noop());

        let join = PresenceUpdate {
            previous: None,
            next: Some(100),
            ..update.clone()
        };
        assert!(!join.is_noop());

        let both_none = PresenceUpdate {
            previous: None,
            next: None,
            ..update
        };
        assert!(both_none.is_noop());
    }

    #[test]
    fn test_channel_ref_new() {
        let ch = ChannelRef::new(7, "General");
        assert_eq!(ch.id, 7);
        assert_eq!(ch.name, "General");
    }
}
