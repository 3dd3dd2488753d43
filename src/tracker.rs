//! The tracker service.
//!
//! `VoiceTracker` is the single owner of presence state: it wires the
//! ledger, the durable store, the stay roster, and the platform gateway
//! together and forms the one mutation entry point for presence events.
//! It replaces loose module-level state with an explicit lifecycle -
//! built from persisted documents at startup, dropped at shutdown - and
//! is handed to the components that need it rather than reached for
//! ambiently.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, info, warn};
use tokio::sync::Mutex;

use crate::config::Config;
use crate::error::Result;
use crate::gateway::VoiceGateway;
use crate::ledger::VoiceLedger;
use crate::models::{ChannelId, ChannelRef, GuildId, LeaderboardEntry, PresenceUpdate, UserId};
use crate::reconciler::StayRoster;
use crate::stats;
use crate::store::{DocumentStore, HISTORY_KEY, STAYS_KEY, TOTALS_KEY};

/// Owner of all presence state. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct VoiceTracker {
    ledger: Arc<Mutex<VoiceLedger>>,
    roster: Arc<Mutex<StayRoster>>,
    store: DocumentStore,
    gateway: Arc<dyn VoiceGateway>,
    log_channel: Option<ChannelId>,
}

impl VoiceTracker {
    /// Builds a tracker from the persisted documents in `store`.
    ///
    /// Sessions start empty; call `resume_open_sessions` once the gateway
    /// is ready so users already connected are tracked again.
    pub fn new(config: &Config, store: DocumentStore, gateway: Arc<dyn VoiceGateway>) -> Self {
        let history: Vec<String> = store.load(HISTORY_KEY, Vec::new());
        let totals: HashMap<UserId, u64> = store.load(TOTALS_KEY, HashMap::new());
        let stays: HashMap<GuildId, ChannelId> = store.load(STAYS_KEY, HashMap::new());

        info!(
            "Loaded {} history lines, {} user totals, {} stay directives",
            history.len(),
            totals.len(),
            stays.len()
        );

        let log_channel = match config.tracker.log_channel {
            0 => None,
            id => Some(id),
        };

        Self {
            ledger: Arc::new(Mutex::new(VoiceLedger::from_documents(
                history,
                totals,
                config.tracker.max_history,
            ))),
            roster: Arc::new(Mutex::new(StayRoster::from_document(stays))),
            store,
            gateway,
            log_channel,
        }
    }

    /// Processes one presence-change notification.
    ///
    /// Bot users and non-transitions are filtered here, before the ledger.
    /// After a real transition the mutated history and totals are persisted;
    /// a persistence failure is logged and non-fatal because the in-memory
    /// state stays authoritative and the next event's save covers the gap.
    pub async fn handle_presence(&self, update: PresenceUpdate) {
        if update.is_bot || update.is_noop() {
            return;
        }

        let now = Utc::now();
        let display_name = self.gateway.resolve_display_name(update.user).await;
        let previous = match update.previous {
            Some(id) => Some(ChannelRef::new(id, self.channel_label(update.guild, id).await)),
            None => None,
        };
        let next = match update.next {
            Some(id) => Some(ChannelRef::new(id, self.channel_label(update.guild, id).await)),
            None => None,
        };

        let line = {
            let mut ledger = self.ledger.lock().await;
            ledger.apply(
                update.user,
                &display_name,
                previous.as_ref(),
                next.as_ref(),
                now,
            )
        };

        if let Some(line) = line {
            info!("{}", line);
            self.persist_ledger().await;
            self.send_log_notice(&line).await;
        }
    }

    /// Startup reconciliation: reopen a session for every non-bot member
    /// the gateway reports as currently connected. Time spanning the
    /// restart gap is neither credited nor double-counted; totals up to the
    /// last persisted save are already on disk.
    pub async fn resume_open_sessions(&self) -> usize {
        let occupancies = self.gateway.voice_occupants().await;
        let now = Utc::now();

        let resumed = {
            let mut ledger = self.ledger.lock().await;
            for occupancy in &occupancies {
                for &user in &occupancy.users {
                    ledger.open_session(user, now);
                }
            }
            ledger.sessions().len()
        };

        info!("Resumed {} open voice sessions", resumed);
        self.send_log_notice("Voicekeeper restarted and resumed tracking.")
            .await;
        resumed
    }

    /// Live-adjusted total seconds for `user` right now.
    pub async fn user_total(&self, user: UserId) -> u64 {
        let ledger = self.ledger.lock().await;
        stats::user_total(&ledger, user, Utc::now())
    }

    /// Top `limit` users by live-adjusted total (clamped to 1..=25).
    pub async fn leaderboard(&self, limit: usize) -> Vec<LeaderboardEntry> {
        let ledger = self.ledger.lock().await;
        stats::leaderboard(&ledger, limit, Utc::now())
    }

    /// The most recent `limit` history lines (clamped to 1..=50).
    pub async fn recent_history(&self, limit: usize) -> Vec<String> {
        let ledger = self.ledger.lock().await;
        stats::recent_history(&ledger, limit)
    }

    /// Sets the stay directive for `guild` and persists it, then attempts
    /// an immediate connect or move so the administrator sees the effect
    /// before the next reconciler pass. The immediate action is best-effort;
    /// only the persistence of the directive can fail this call.
    pub async fn set_stay(&self, guild: GuildId, channel: ChannelId) -> Result<()> {
        {
            let mut roster = self.roster.lock().await;
            roster.set(guild, channel);
            self.store.save(STAYS_KEY, roster.document()).await?;
        }
        info!("Stay directive set: guild {} -> channel {}", guild, channel);

        let action = match self.gateway.current_connection(guild).await {
            Some(conn) if conn.connected && conn.channel == channel => Ok(()),
            Some(conn) if conn.connected => self.gateway.move_to(guild, channel).await,
            _ => self.gateway.connect(guild, channel).await,
        };
        if let Err(e) = action {
            warn!(
                "Immediate stay placement for guild {} failed (reconciler will retry): {}",
                guild, e
            );
        }
        Ok(())
    }

    /// Clears the stay directive for `guild` and persists the removal,
    /// then best-effort disconnects any live connection there.
    pub async fn clear_stay(&self, guild: GuildId) -> Result<()> {
        {
            let mut roster = self.roster.lock().await;
            roster.clear(guild);
            self.store.save(STAYS_KEY, roster.document()).await?;
        }
        info!("Stay directive cleared for guild {}", guild);

        if self.gateway.current_connection(guild).await.is_some() {
            if let Err(e) = self.gateway.disconnect(guild).await {
                warn!("Immediate disconnect for guild {} failed: {}", guild, e);
            }
        }
        Ok(())
    }

    /// The desired stay channel for `guild`, if a directive exists.
    pub async fn stay_status(&self, guild: GuildId) -> Option<ChannelId> {
        self.roster.lock().await.get(guild)
    }

    /// Snapshot of all stay directives.
    pub async fn stays(&self) -> HashMap<GuildId, ChannelId> {
        self.roster.lock().await.document().clone()
    }

    /// Drops a directive whose guild or channel no longer exists and
    /// persists the shrunken roster. Reconciler cleanup path: no disconnect
    /// is attempted because the target is gone.
    pub(crate) async fn drop_stale_stay(&self, guild: GuildId) {
        let mut roster = self.roster.lock().await;
        if roster.clear(guild).is_none() {
            return;
        }
        warn!("Dropping stale stay directive for guild {}", guild);
        if let Err(e) = self.store.save(STAYS_KEY, roster.document()).await {
            error!("Failed to persist stays after dropping guild {}: {}", guild, e);
        }
    }

    pub(crate) fn gateway(&self) -> &Arc<dyn VoiceGateway> {
        &self.gateway
    }

    /// Channel name for history lines, falling back to the raw id when the
    /// channel is no longer resolvable.
    async fn channel_label(&self, guild: GuildId, channel: ChannelId) -> String {
        self.gateway
            .channel_name(guild, channel)
            .await
            .unwrap_or_else(|| channel.to_string())
    }

    /// Persists history then totals. Failures are logged, never propagated.
    async fn persist_ledger(&self) {
        let (history, totals) = {
            let ledger = self.ledger.lock().await;
            (ledger.history().to_vec(), ledger.totals().clone())
        };

        if let Err(e) = self.store.save(HISTORY_KEY, &history).await {
            error!("Failed to persist history: {}", e);
        }
        if let Err(e) = self.store.save(TOTALS_KEY, &totals).await {
            error!("Failed to persist totals: {}", e);
        }
    }

    /// Best-effort notice to the configured log channel, if any.
    async fn send_log_notice(&self, text: &str) {
        if let Some(channel) = self.log_channel {
            if let Err(e) = self.gateway.send_notice(channel, text).await {
                debug!("Log notice dropped: {}", e);
            }
        }
    }
}
