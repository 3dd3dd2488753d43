//! Point-in-time projections over the presence ledger.
//!
//! Read-only queries: live-adjusted user totals, the leaderboard, and
//! history slices. "Live-adjusted" means an open session contributes its
//! elapsed time on top of the stored total, so readers never consult the
//! totals map alone while a session may be open.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use crate::ledger::VoiceLedger;
use crate::models::{LeaderboardEntry, UserId};

/// Hard cap on leaderboard query size.
pub const MAX_LEADERBOARD: usize = 25;

/// Hard cap on history query size.
pub const MAX_HISTORY_QUERY: usize = 50;

/// Live-adjusted total seconds for one user at `now`.
pub fn user_total(ledger: &VoiceLedger, user: UserId, now: DateTime<Utc>) -> u64 {
    let stored = ledger.totals().get(&user).copied().unwrap_or(0);
    let open = ledger
        .session_start(user)
        .map(|start| (now - start).num_seconds().max(0) as u64)
        .unwrap_or(0);
    stored + open
}

/// Top `limit` users by live-adjusted total.
///
/// Ranks the union of users with stored totals and users with an open
/// session, so someone on their very first visit already appears. Ordering
/// is descending by total with ties broken by ascending user id, which
/// keeps the result deterministic. `limit` is clamped to 1..=25.
pub fn leaderboard(
    ledger: &VoiceLedger,
    limit: usize,
    now: DateTime<Utc>,
) -> Vec<LeaderboardEntry> {
    let limit = limit.clamp(1, MAX_LEADERBOARD);

    let users: BTreeSet<UserId> = ledger
        .totals()
        .keys()
        .chain(ledger.sessions().keys())
        .copied()
        .collect();

    let mut entries: Vec<LeaderboardEntry> = users
        .into_iter()
        .map(|user| LeaderboardEntry {
            user,
            seconds: user_total(ledger, user, now),
            live: ledger.session_start(user).is_some(),
        })
        .collect();

    entries.sort_by(|a, b| b.seconds.cmp(&a.seconds).then(a.user.cmp(&b.user)));
    entries.truncate(limit);
    entries
}

/// The most recent `limit` history lines in chronological order.
/// `limit` is clamped to 1..=50.
pub fn recent_history(ledger: &VoiceLedger, limit: usize) -> Vec<String> {
    let limit = limit.clamp(1, MAX_HISTORY_QUERY);
    let history = ledger.history();
    let start = history.len().saturating_sub(limit);
    history[start..].to_vec()
}
