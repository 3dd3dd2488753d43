//! Presence ledger.
//!
//! The in-memory core of voice-time accounting: an open-session table, the
//! accumulated per-user totals, and a bounded human-readable event history.
//! The ledger is purely synchronous state plus the transition algorithm;
//! persistence and name resolution are orchestrated by the tracker, which
//! keeps this module directly testable with fixed clocks.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::display::{format_duration, format_timestamp};
use crate::models::{ChannelRef, UserId};

/// Ledger state: sessions never persist; history and totals round-trip
/// through the document store under the keys in [`crate::store`].
pub struct VoiceLedger {
    totals: HashMap<UserId, u64>,
    history: Vec<String>,
    sessions: HashMap<UserId, DateTime<Utc>>,
    max_history: usize,
}

impl VoiceLedger {
    /// Creates an empty ledger.
    pub fn new(max_history: usize) -> Self {
        Self {
            totals: HashMap::new(),
            history: Vec::new(),
            sessions: HashMap::new(),
            max_history,
        }
    }

    /// Reconstructs a ledger from persisted documents.
    ///
    /// Sessions start empty; the tracker reopens them from current channel
    /// occupancy. History longer than `max_history` (a shrunk configuration)
    /// is trimmed oldest-first right away.
    pub fn from_documents(
        history: Vec<String>,
        totals: HashMap<UserId, u64>,
        max_history: usize,
    ) -> Self {
        let mut ledger = Self {
            totals,
            history,
            sessions: HashMap::new(),
            max_history,
        };
        ledger.trim_history();
        ledger
    }

    /// Applies one presence transition and records its history line.
    ///
    /// Returns the recorded line, or `None` when the pair is not a real
    /// transition (same channel on both sides, or none at all). Callers are
    /// expected to have filtered bot users already.
    pub fn apply(
        &mut self,
        user: UserId,
        display_name: &str,
        previous: Option<&ChannelRef>,
        next: Option<&ChannelRef>,
        now: DateTime<Utc>,
    ) -> Option<String> {
        let line = match (previous, next) {
            (None, Some(channel)) => {
                // A stale open session is replaced; its unclosed time is
                // dropped rather than guessed at.
                self.sessions.insert(user, now);
                format!(
                    "[{}] JOIN {} → {}",
                    format_timestamp(now),
                    display_name,
                    channel.name
                )
            }
            (Some(channel), None) => {
                let duration = self.close_session(user, now);
                format!(
                    "[{}] LEAVE {} ← {} ({})",
                    format_timestamp(now),
                    display_name,
                    channel.name,
                    format_duration(duration)
                )
            }
            (Some(from), Some(to)) if from.id != to.id => {
                let duration = self.close_session(user, now);
                self.sessions.insert(user, now);
                format!(
                    "[{}] MOVE {}: {} → {} ({})",
                    format_timestamp(now),
                    display_name,
                    from.name,
                    to.name,
                    format_duration(duration)
                )
            }
            _ => return None,
        };

        self.push_history(line.clone());
        Some(line)
    }

    /// Opens a session without recording history (startup reconciliation
    /// for users found already connected).
    pub fn open_session(&mut self, user: UserId, now: DateTime<Utc>) {
        self.sessions.insert(user, now);
    }

    /// Start timestamp of the user's open session, if any.
    pub fn session_start(&self, user: UserId) -> Option<DateTime<Utc>> {
        self.sessions.get(&user).copied()
    }

    /// All open sessions.
    pub fn sessions(&self) -> &HashMap<UserId, DateTime<Utc>> {
        &self.sessions
    }

    /// Accumulated totals in seconds, excluding open sessions.
    pub fn totals(&self) -> &HashMap<UserId, u64> {
        &self.totals
    }

    /// The bounded event history, oldest first.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Folds the user's open session into totals and returns its duration;
    /// 0 when no session was open (totals untouched in that case).
    fn close_session(&mut self, user: UserId, now: DateTime<Utc>) -> u64 {
        match self.sessions.remove(&user) {
            Some(start) => {
                let duration = (now - start).num_seconds().max(0) as u64;
                *self.totals.entry(user).or_insert(0) += duration;
                duration
            }
            None => 0,
        }
    }

    fn push_history(&mut self, line: String) {
        self.history.push(line);
        self.trim_history();
    }

    fn trim_history(&mut self) {
        if self.history.len() > self.max_history {
            let excess = self.history.len() - self.max_history;
            self.history.drain(..excess);
        }
    }
}
