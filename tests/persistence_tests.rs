//! Persistence behavior across restarts, corruption, and concurrent saves.


use std::collections::HashMap;
use std::sync::Arc;

use tempfile::TempDir;

use test_support::FakeGateway;
use voicekeeper::config::Config;
use voicekeeper::models::PresenceUpdate;
use voicekeeper::store::{DocumentStore, HISTORY_KEY, STAYS_KEY, TOTALS_KEY};
use voicekeeper::VoiceTracker;

fn tracker_over(temp: &TempDir, gateway: Arc<FakeGateway>) -> VoiceTracker {
    let store = DocumentStore::new(temp.path()).unwrap();
    VoiceTracker::new(&Config::default(), store, gateway)
}

#[tokio::test]
async fn test_state_survives_restart() {
    let temp = TempDir::new().unwrap();
    let gateway = Arc::new(FakeGateway::new());
    gateway.add_guild(1, "Guild");
    gateway.add_channel(1, 100, "General");
    gateway.add_user(42, "alice");

    {
        let tracker = tracker_over(&temp, gateway.clone());
        tracker
            .handle_presence(PresenceUpdate {
                guild: 1,
                user: 42,
                previous: None,
                next: Some(100),
                is_bot: false,
            })
            .await;
        tracker
            .handle_presence(PresenceUpdate {
                guild: 1,
                user: 42,
                previous: Some(100),
                next: None,
                is_bot: false,
            })
            .await;
        // Left open on purpose: open sessions are not persisted
        tracker
            .handle_presence(PresenceUpdate {
                guild: 1,
                user: 42,
                previous: None,
                next: Some(100),
                is_bot: false,
            })
            .await;
    }

    // "Restart": a fresh tracker over the same directory
    let tracker = tracker_over(&temp, gateway);
    let history = tracker.recent_history(10).await;
    assert_eq!(history.len(), 3);

    let top = tracker.leaderboard(5).await;
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].user, 42);
    assert!(!top[0].live);
}

#[tokio::test]
async fn test_corrupt_totals_document_recovers_with_default() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("totals.json"), "not json at all {{{").unwrap();
    std::fs::write(temp.path().join("history.json"), r#"["surviving line"]"#).unwrap();

    let gateway = Arc::new(FakeGateway::new());
    let tracker = tracker_over(&temp, gateway);

    // Corrupt totals reset to empty; the intact history still loads
    assert_eq!(tracker.user_total(7).await, 0);
    assert_eq!(
        tracker.recent_history(5).await,
        vec!["surviving line".to_string()]
    );

    // The unreadable original is kept for inspection
    assert!(temp.path().join("totals.json.corrupt").exists());
}

#[tokio::test]
async fn test_concurrent_saves_leave_valid_documents() {
    let temp = TempDir::new().unwrap();
    let store = DocumentStore::new(temp.path()).unwrap();

    let totals: HashMap<u64, u64> = (0..50).map(|i| (i, i * 10)).collect();
    let history: Vec<String> = (0..50).map(|i| format!("line {}", i)).collect();
    let stays: HashMap<u64, u64> = HashMap::from([(1, 100)]);

    let (a, b, c) = tokio::join!(
        store.save(TOTALS_KEY, &totals),
        store.save(HISTORY_KEY, &history),
        store.save(STAYS_KEY, &stays),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    // No temp files left behind and every document parses
    for entry in std::fs::read_dir(temp.path()).unwrap() {
        let name = entry.unwrap().file_name().into_string().unwrap();
        assert!(!name.ends_with(".tmp"), "leftover temp file: {}", name);
    }
    let raw = std::fs::read_to_string(temp.path().join("totals.json")).unwrap();
    let loaded: HashMap<String, u64> = serde_json::from_str(&raw).unwrap();
    assert_eq!(loaded.len(), 50);
    let raw = std::fs::read_to_string(temp.path().join("history.json")).unwrap();
    let loaded: Vec<String> = serde_json::from_str(&raw).unwrap();
    assert_eq!(loaded.len(), 50);
}

#[tokio::test]
async fn test_history_trimmed_to_configured_bound_on_load() {
    let temp = TempDir::new().unwrap();
    let store = DocumentStore::new(temp.path()).unwrap();
    let long: Vec<String> = (0..60).map(|i| format!("line {}", i)).collect();
    store.save(HISTORY_KEY, &long).await.unwrap();

    let mut config = Config::default();
    config.tracker.max_history = 50;
    let gateway = Arc::new(FakeGateway::new());
    let tracker = VoiceTracker::new(&config, store, gateway);

    let recent = tracker.recent_history(50).await;
    assert_eq!(recent.len(), 50);
    // Oldest lines dropped first
    assert_eq!(recent[0], "line 10");
    assert_eq!(recent[49], "line 59");
}
