//! Stay reconciler.
//!
//! A long-lived background loop that compares desired guild-to-channel
//! placement (the stay roster) against the live connections the gateway
//! reports, issuing corrective connect/move actions. Directives whose guild
//! or channel has disappeared are dropped and the shrunken roster persisted.
//! Every gateway failure is non-fatal here: a directive that cannot be
//! converged this pass is simply retried on the next one, and a failure
//! escaping the per-directive guard costs one pass plus a short backoff,
//! never the loop itself.

use std::collections::HashMap;
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::config::ReconcilerConfig;
use crate::error::Result;
use crate::models::{ChannelId, GuildId};
use crate::tracker::VoiceTracker;

/// Persisted administrator intent: the channel the process should hold a
/// live connection in, per guild.
#[derive(Debug, Clone, Default)]
pub struct StayRoster {
    directives: HashMap<GuildId, ChannelId>,
}

impl StayRoster {
    /// Wraps a loaded `stays` document.
    pub fn from_document(directives: HashMap<GuildId, ChannelId>) -> Self {
        Self { directives }
    }

    pub fn set(&mut self, guild: GuildId, channel: ChannelId) {
        self.directives.insert(guild, channel);
    }

    /// Removes the directive, returning the channel it pointed at.
    pub fn clear(&mut self, guild: GuildId) -> Option<ChannelId> {
        self.directives.remove(&guild)
    }

    pub fn get(&self, guild: GuildId) -> Option<ChannelId> {
        self.directives.get(&guild).copied()
    }

    /// The persistable document form.
    pub fn document(&self) -> &HashMap<GuildId, ChannelId> {
        &self.directives
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Spawns the reconciliation loop.
///
/// Returns the shutdown sender (send `true` for a clean stop) and the task
/// handle. One pass runs per interval tick; a pass-level failure is logged
/// and followed by the configured backoff sleep. Only the shutdown signal
/// ends the loop.
pub fn spawn(
    tracker: VoiceTracker,
    config: ReconcilerConfig,
) -> (watch::Sender<bool>, JoinHandle<()>) {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_seconds));
        let retry_delay = Duration::from_secs(config.retry_delay_seconds);
        info!(
            "Stay reconciler started ({}s interval)",
            config.interval_seconds
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = run_pass(&tracker).await {
                        error!(
                            "Reconciler pass failed: {} - backing off {}s",
                            e, config.retry_delay_seconds
                        );
                        tokio::time::sleep(retry_delay).await;
                    }
                }
                _ = shutdown_rx.changed() => {
                    if *shutdown_rx.borrow() {
                        info!("Stay reconciler shutting down");
                        break;
                    }
                }
            }
        }
    });

    (shutdown_tx, handle)
}

/// Runs one reconciliation pass over a snapshot of the roster.
///
/// Per-directive failures are logged and skipped so one guild cannot starve
/// the others in the same pass.
pub async fn run_pass(tracker: &VoiceTracker) -> Result<()> {
    let directives = tracker.stays().await;
    for (guild, desired) in directives {
        if let Err(e) = reconcile_directive(tracker, guild, desired).await {
            warn!("Stay for guild {} not converged: {}", guild, e);
        }
    }
    Ok(())
}

/// Converges one directive: drops it when the guild or channel is gone,
/// otherwise moves or connects the live connection onto the desired channel.
/// A present-but-dead connection on the right channel is reconnected.
async fn reconcile_directive(
    tracker: &VoiceTracker,
    guild: GuildId,
    desired: ChannelId,
) -> Result<()> {
    let gateway = tracker.gateway();

    if gateway.guild_name(guild).await.is_none() {
        tracker.drop_stale_stay(guild).await;
        return Ok(());
    }
    if gateway.channel_name(guild, desired).await.is_none() {
        tracker.drop_stale_stay(guild).await;
        return Ok(());
    }

    match gateway.current_connection(guild).await {
        Some(conn) if conn.connected && conn.channel == desired => Ok(()),
        Some(conn) if conn.connected => {
            debug!(
                "Moving guild {} connection: {} -> {}",
                guild, conn.channel, desired
            );
            gateway.move_to(guild, desired).await
        }
        _ => {
            debug!("Connecting guild {} to channel {}", guild, desired);
            gateway.connect(guild, desired).await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roster_set_get_clear() {
        let mut roster = StayRoster::default();
        assert!(roster.is_empty());

        roster.set(1, 100);
        roster.set(2, 200);
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.get(1), Some(100));

        assert_eq!(roster.clear(1), Some(100));
        assert_eq!(roster.clear(1), None);
        assert_eq!(roster.get(1), None);
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_set_overwrites() {
        let mut roster = StayRoster::default();
        roster.set(1, 100);
        roster.set(1, 101);
        assert_eq!(roster.get(1), Some(101));
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_roster_document_round_trip() {
        let mut map = HashMap::new();
        map.insert(5u64, 50u64);
        let roster = StayRoster::from_document(map.clone());
        assert_eq!(roster.document(), &map);
    }
}
