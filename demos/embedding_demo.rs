//! Example of embedding the voicekeeper library in a platform client
//!
//! Demonstrates wiring the tracker, store, and reconciler to a gateway
//! implementation and driving it with simulated presence events.
//!
//! Run with: cargo run --example embedding_demo

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use voicekeeper::config::Config;
use voicekeeper::error::Result;
use voicekeeper::models::{
    ChannelId, GuildId, LiveConnection, PresenceUpdate, UserId, VoiceOccupancy,
};
use voicekeeper::{reconciler, DocumentStore, VoiceGateway, VoiceTracker};

/// Minimal in-memory gateway standing in for a real platform client.
struct DemoGateway {
    connections: Mutex<HashMap<GuildId, LiveConnection>>,
}

#[async_trait]
impl VoiceGateway for DemoGateway {
    async fn guild_name(&self, _guild: GuildId) -> Option<String> {
        Some("Demo Guild".to_string())
    }

    async fn channel_name(&self, _guild: GuildId, channel: ChannelId) -> Option<String> {
        Some(format!("channel-{}", channel))
    }

    async fn current_connection(&self, guild: GuildId) -> Option<LiveConnection> {
        self.connections.lock().unwrap().get(&guild).copied()
    }

    async fn connect(&self, guild: GuildId, channel: ChannelId) -> Result<()> {
        println!("[gateway] connect guild {} -> channel {}", guild, channel);
        self.connections.lock().unwrap().insert(
            guild,
            LiveConnection {
                guild,
                channel,
                connected: true,
            },
        );
        Ok(())
    }

    async fn move_to(&self, guild: GuildId, channel: ChannelId) -> Result<()> {
        println!("[gateway] move guild {} -> channel {}", guild, channel);
        self.connections.lock().unwrap().insert(
            guild,
            LiveConnection {
                guild,
                channel,
                connected: true,
            },
        );
        Ok(())
    }

    async fn disconnect(&self, guild: GuildId) -> Result<()> {
        println!("[gateway] disconnect guild {}", guild);
        self.connections.lock().unwrap().remove(&guild);
        Ok(())
    }

    async fn voice_occupants(&self) -> Vec<VoiceOccupancy> {
        Vec::new()
    }

    async fn resolve_display_name(&self, user: UserId) -> String {
        match user {
            1 => "alice".to_string(),
            2 => "bob".to_string(),
            _ => user.to_string(),
        }
    }

    async fn send_notice(&self, channel: ChannelId, text: &str) -> Result<()> {
        println!("[notice -> {}] {}", channel, text);
        Ok(())
    }
}

fn presence(
    user: UserId,
    previous: Option<ChannelId>,
    next: Option<ChannelId>,
) -> PresenceUpdate {
    PresenceUpdate {
        guild: 1,
        user,
        previous,
        next,
        is_bot: false,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Isolated data directory so the demo never touches real data
    let data_dir = std::env::temp_dir().join("voicekeeper-demo");
    let store = DocumentStore::new(&data_dir)?;

    let mut config = Config::default();
    config.tracker.log_channel = 500;

    let gateway = Arc::new(DemoGateway {
        connections: Mutex::new(HashMap::new()),
    });
    let tracker = VoiceTracker::new(&config, store, gateway);

    tracker.resume_open_sessions().await;
    let (shutdown_tx, handle) = reconciler::spawn(tracker.clone(), config.reconciler.clone());

    println!("\n=== Simulated presence events ===");
    tracker.handle_presence(presence(1, None, Some(10))).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracker.handle_presence(presence(1, Some(10), Some(11))).await;
    tracker.handle_presence(presence(2, None, Some(10))).await;
    tokio::time::sleep(Duration::from_secs(1)).await;
    tracker.handle_presence(presence(1, Some(11), None)).await;

    println!("\n=== Queries ===");
    println!("alice total: {}s", tracker.user_total(1).await);
    for (rank, entry) in tracker.leaderboard(10).await.iter().enumerate() {
        let marker = if entry.live { " (live)" } else { "" };
        println!("{}. user {}: {}s{}", rank + 1, entry.user, entry.seconds, marker);
    }
    for line in tracker.recent_history(10).await {
        println!("{}", line);
    }

    println!("\n=== Stay directive ===");
    tracker.set_stay(1, 10).await?;
    println!("stay for guild 1: {:?}", tracker.stay_status(1).await);
    tracker.clear_stay(1).await?;

    let _ = shutdown_tx.send(true);
    let _ = handle.await;

    println!("\nData persisted under {}", data_dir.display());
    Ok(())
}
