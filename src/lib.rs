//! # Voicekeeper Library
//!
//! Voice-channel presence tracking with durable time totals and 24/7 stay
//! reconciliation.
//!
//! ## Features
//!
//! - **Presence Ledger**: Converts a stream of join/leave/move events into
//!   accumulated per-user voice time and a bounded event history
//! - **Durable Store**: Crash-safe atomic JSON persistence of history,
//!   totals, and stay directives
//! - **Stay Reconciler**: Background loop keeping a live connection in each
//!   designated channel, with self-healing reconnection
//! - **Queries**: Live-adjusted totals, leaderboard, and history slices
//! - **Configuration**: TOML-based configuration with environment overrides
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use voicekeeper::config::Config;
//! use voicekeeper::store::DocumentStore;
//! use voicekeeper::tracker::VoiceTracker;
//! # use voicekeeper::gateway::VoiceGateway;
//! # async fn bootstrap(gateway: Arc<dyn VoiceGateway>) -> voicekeeper::Result<()> {
//! let config = Config::load()?;
//! let token = config.resolve_token()?; // fatal when unresolvable
//! let store = DocumentStore::new(config.store.data_dir_path())?;
//! let tracker = VoiceTracker::new(&config, store, gateway);
//! tracker.resume_open_sessions().await;
//! let (shutdown, handle) =
//!     voicekeeper::reconciler::spawn(tracker.clone(), config.reconciler.clone());
//! // ... platform event loop feeds tracker.handle_presence(update) ...
//! let _ = shutdown.send(true);
//! # let _ = (token, handle);
//! # Ok(())
//! # }
//! ```

pub mod common;
/// Configuration management module for loading and saving settings
pub mod config;
pub mod display;
pub mod error;
/// Platform gateway trait consumed by the tracker and reconciler
pub mod gateway;
pub mod ledger;
pub mod models;
/// Background stay reconciliation loop
pub mod reconciler;
pub mod stats;
pub mod store;
pub mod tracker;
pub mod version;

pub use config::Config;
pub use error::{Result, VoicekeeperError};
pub use gateway::VoiceGateway;
pub use ledger::VoiceLedger;
pub use models::{ChannelId, GuildId, LeaderboardEntry, LiveConnection, PresenceUpdate, UserId};
pub use store::DocumentStore;
pub use tracker::VoiceTracker;
pub use version::{short_version, version_string};
