//! End-to-end tracker tests over an in-memory gateway and a real store.


use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;

use test_support::FakeGateway;
use voicekeeper::config::Config;
use voicekeeper::models::{ChannelId, PresenceUpdate, UserId, VoiceOccupancy};
use voicekeeper::store::{DocumentStore, HISTORY_KEY, STAYS_KEY, TOTALS_KEY};
use voicekeeper::VoiceTracker;

fn join(user: UserId, channel: ChannelId) -> PresenceUpdate {
    PresenceUpdate {
        guild: 1,
        user,
        previous: None,
        next: Some(channel),
        is_bot: false,
    }
}

fn leave(user: UserId, channel: ChannelId) -> PresenceUpdate {
    PresenceUpdate {
        guild: 1,
        user,
        previous: Some(channel),
        next: None,
        is_bot: false,
    }
}

fn move_to(user: UserId, from: ChannelId, to: ChannelId) -> PresenceUpdate {
    PresenceUpdate {
        guild: 1,
        user,
        previous: Some(from),
        next: Some(to),
        is_bot: false,
    }
}

/// Tracker over a fresh temp store with one guild, two channels, one user.
fn setup() -> (TempDir, Arc<FakeGateway>, VoiceTracker) {
    setup_with_config(Config::default())
}

fn setup_with_config(config: Config) -> (TempDir, Arc<FakeGateway>, VoiceTracker) {
    let temp = TempDir::new().unwrap();
    let gateway = Arc::new(FakeGateway::new());
    gateway.add_guild(1, "Test Guild");
    gateway.add_channel(1, 100, "General");
    gateway.add_channel(1, 101, "AFK");
    gateway.add_user(42, "alice");

    let store = DocumentStore::new(temp.path()).unwrap();
    let tracker = VoiceTracker::new(&config, store, gateway.clone());
    (temp, gateway, tracker)
}

#[tokio::test]
async fn test_join_then_leave_records_and_persists() {
    let (temp, _gateway, tracker) = setup();

    tracker.handle_presence(join(42, 100)).await;
    tracker.handle_presence(leave(42, 100)).await;

    let history = tracker.recent_history(10).await;
    assert_eq!(history.len(), 2);
    assert!(history[0].contains("JOIN alice → General"));
    assert!(history[1].contains("LEAVE alice ← General"));

    // Both documents landed on disk; totals keys serialize as strings
    let raw = std::fs::read_to_string(temp.path().join("totals.json")).unwrap();
    let totals: HashMap<String, u64> = serde_json::from_str(&raw).unwrap();
    assert!(totals.contains_key("42"));

    let raw = std::fs::read_to_string(temp.path().join("history.json")).unwrap();
    let lines: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(lines.len(), 2);
}

#[tokio::test]
async fn test_bot_and_noop_updates_ignored() {
    let (_temp, _gateway, tracker) = setup();

    let mut bot_join = join(42, 100);
    bot_join.is_bot = true;
    tracker.handle_presence(bot_join).await;

    // Same channel on both sides: mute/deafen noise
    tracker.handle_presence(move_to(42, 100, 100)).await;

    assert!(tracker.recent_history(10).await.is_empty());
    assert_eq!(tracker.user_total(42).await, 0);
}

#[tokio::test]
async fn test_move_keeps_session_open() {
    let (_temp, _gateway, tracker) = setup();

    tracker.handle_presence(join(42, 100)).await;
    tracker.handle_presence(move_to(42, 100, 101)).await;

    let history = tracker.recent_history(10).await;
    assert_eq!(history.len(), 2);
    assert!(history[1].contains("MOVE alice: General → AFK"));

    let top = tracker.leaderboard(5).await;
    assert_eq!(top.len(), 1);
    assert!(top[0].live);
}

#[tokio::test]
async fn test_unknown_channel_and_user_fall_back_to_ids() {
    let (_temp, _gateway, tracker) = setup();

    // Neither user 555 nor channel 999 is known to the gateway
    tracker.handle_presence(join(555, 999)).await;

    let history = tracker.recent_history(10).await;
    assert_eq!(history.len(), 1);
    assert!(history[0].contains("JOIN 555 → 999"));
}

#[tokio::test]
async fn test_resume_open_sessions_counts_occupants() {
    let (_temp, gateway, tracker) = setup();
    gateway.set_occupants(vec![
        VoiceOccupancy {
            guild: 1,
            channel: 100,
            users: vec![1, 2],
        },
        VoiceOccupancy {
            guild: 1,
            channel: 101,
            users: vec![3],
        },
    ]);

    assert_eq!(tracker.resume_open_sessions().await, 3);

    let top = tracker.leaderboard(10).await;
    assert_eq!(top.len(), 3);
    assert!(top.iter().all(|entry| entry.live));
    // Resumed sessions fabricate no history lines
    assert!(tracker.recent_history(10).await.is_empty());
}

#[tokio::test]
async fn test_restart_notice_sent_to_log_channel() {
    let mut config = Config::default();
    config.tracker.log_channel = 900;
    let (_temp, gateway, tracker) = setup_with_config(config);

    tracker.resume_open_sessions().await;

    let notices = gateway.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].0, 900);
    assert!(notices[0].1.contains("restarted"));
}

#[tokio::test]
async fn test_event_notice_sent_and_failure_nonfatal() {
    let mut config = Config::default();
    config.tracker.log_channel = 900;
    let (_temp, gateway, tracker) = setup_with_config(config);

    tracker.handle_presence(join(42, 100)).await;
    let notices = gateway.notices();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].1.contains("JOIN alice"));

    // A rejected notice must not lose the event itself
    gateway.fail_notices(true);
    tracker.handle_presence(leave(42, 100)).await;
    assert_eq!(tracker.recent_history(10).await.len(), 2);
    assert_eq!(gateway.notices().len(), 1);
}

#[tokio::test]
async fn test_set_stay_connects_and_persists() {
    let (temp, gateway, tracker) = setup();

    tracker.set_stay(1, 100).await.unwrap();

    assert_eq!(tracker.stay_status(1).await, Some(100));
    assert_eq!(gateway.connect_calls(), vec![(1, 100)]);

    let raw = std::fs::read_to_string(temp.path().join("stays.json")).unwrap();
    let stays: HashMap<String, u64> = serde_json::from_str(&raw).unwrap();
    assert_eq!(stays.get("1"), Some(&100));
}

#[tokio::test]
async fn test_set_stay_moves_when_connected_elsewhere() {
    let (_temp, gateway, tracker) = setup();
    gateway.set_connection(1, 50, true);

    tracker.set_stay(1, 100).await.unwrap();

    assert_eq!(gateway.move_calls(), vec![(1, 100)]);
    assert!(gateway.connect_calls().is_empty());
}

#[tokio::test]
async fn test_set_stay_already_in_place_takes_no_action() {
    let (_temp, gateway, tracker) = setup();
    gateway.set_connection(1, 100, true);

    tracker.set_stay(1, 100).await.unwrap();

    assert!(gateway.connect_calls().is_empty());
    assert!(gateway.move_calls().is_empty());
}

#[tokio::test]
async fn test_set_stay_succeeds_even_if_connect_fails() {
    let (_temp, gateway, tracker) = setup();
    gateway.fail_connect(true);

    // The directive persists; the reconciler retries the placement later
    tracker.set_stay(1, 100).await.unwrap();
    assert_eq!(tracker.stay_status(1).await, Some(100));
    assert_eq!(gateway.connect_calls(), vec![(1, 100)]);
}

#[tokio::test]
async fn test_clear_stay_disconnects_live_connection() {
    let (temp, gateway, tracker) = setup();
    tracker.set_stay(1, 100).await.unwrap();

    tracker.clear_stay(1).await.unwrap();

    assert_eq!(tracker.stay_status(1).await, None);
    assert_eq!(gateway.disconnect_calls(), vec![1]);

    let raw = std::fs::read_to_string(temp.path().join("stays.json")).unwrap();
    let stays: HashMap<String, u64> = serde_json::from_str(&raw).unwrap();
    assert!(stays.is_empty());
}

#[tokio::test]
async fn test_tracker_loads_persisted_documents() {
    let temp = TempDir::new().unwrap();
    let store = DocumentStore::new(temp.path()).unwrap();
    store
        .save(TOTALS_KEY, &HashMap::from([(7u64, 120u64)]))
        .await
        .unwrap();
    store
        .save(HISTORY_KEY, &vec!["old line".to_string()])
        .await
        .unwrap();
    store
        .save(STAYS_KEY, &HashMap::from([(1u64, 100u64)]))
        .await
        .unwrap();

    let gateway = Arc::new(FakeGateway::new());
    let tracker = VoiceTracker::new(&Config::default(), store, gateway);

    assert_eq!(tracker.user_total(7).await, 120);
    assert_eq!(tracker.recent_history(5).await, vec!["old line".to_string()]);
    assert_eq!(tracker.stay_status(1).await, Some(100));
}
