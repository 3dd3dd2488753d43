//! Durable document store.
//!
//! Generic atomic load/save of keyed JSON documents in a data directory.
//! Each key maps to `<key>.json`; saves write `<key>.json.tmp`, fsync, then
//! rename over the target, so a crash at any point leaves either the previous
//! complete document or the new complete document on disk. All saves from all
//! callers serialize through one write gate; loads take no gate because the
//! rename guarantees readers only ever see a complete document.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use fs2::FileExt;
use log::warn;
use serde::{de::DeserializeOwned, Serialize};
use tokio::sync::Mutex;

use crate::error::{Result, VoicekeeperError};

/// Store-wide lock file guarding against a second process writing the same
/// directory (overlapping instances during a restart).
const LOCK_FILE: &str = ".lock";

/// Document key for the bounded event history (`Vec<String>`).
pub const HISTORY_KEY: &str = "history";
/// Document key for accumulated per-user seconds (`HashMap<UserId, u64>`).
pub const TOTALS_KEY: &str = "totals";
/// Document key for stay directives (`HashMap<GuildId, ChannelId>`).
pub const STAYS_KEY: &str = "stays";

/// Atomic JSON document store rooted at one data directory.
#[derive(Clone)]
pub struct DocumentStore {
    dir: PathBuf,
    write_gate: Arc<Mutex<()>>,
}

impl DocumentStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            write_gate: Arc::new(Mutex::new(())),
        })
    }

    /// The directory this store reads and writes.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn document_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn temp_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", key))
    }

    /// Saves `document` under `key` atomically.
    ///
    /// Serialization happens up front; the file work runs on the blocking
    /// pool while the write gate is held, so concurrent saves of different
    /// documents never interleave their temp files.
    pub async fn save<T>(&self, key: &str, document: &T) -> Result<()>
    where
        T: Serialize,
    {
        let json = serde_json::to_vec_pretty(document)?;
        let path = self.document_path(key);
        let tmp = self.temp_path(key);
        let lock_path = self.dir.join(LOCK_FILE);

        let _gate = self.write_gate.lock().await;
        tokio::task::spawn_blocking(move || write_atomic(&path, &tmp, &lock_path, &json))
            .await
            .map_err(|e| VoicekeeperError::store(format!("save task failed: {}", e)))?
    }

    /// Loads the document stored under `key`, or `default` when the file is
    /// absent or unparseable.
    ///
    /// A corrupt file is never fatal: it is copied aside to
    /// `<key>.json.corrupt` for post-mortem and the default is returned.
    pub fn load<T>(&self, key: &str, default: T) -> T
    where
        T: DeserializeOwned,
    {
        let path = self.document_path(key);
        if !path.exists() {
            return default;
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                warn!("Failed to read document '{}': {} - using default", key, e);
                return default;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(document) => document,
            Err(e) => {
                warn!("Document '{}' is corrupt: {} - using default", key, e);
                let aside = path.with_extension("json.corrupt");
                match fs::copy(&path, &aside) {
                    Ok(_) => warn!("Corrupt document preserved at {:?}", aside),
                    Err(copy_err) => {
                        warn!("Failed to preserve corrupt document: {}", copy_err)
                    }
                }
                default
            }
        }
    }
}

/// Blocking write path: exclusive cross-process lock, temp file, fsync,
/// atomic rename. The lock is released when the handle drops.
fn write_atomic(path: &Path, tmp: &Path, lock_path: &Path, json: &[u8]) -> Result<()> {
    let lock_file = OpenOptions::new()
        .write(true)
        .create(true)
        .open(lock_path)?;
    lock_file
        .lock_exclusive()
        .map_err(|e| VoicekeeperError::lock(format!("store lock at {:?}: {}", lock_path, e)))?;

    let mut file = File::create(tmp)?;
    file.write_all(json)?;
    file.sync_all()?;
    drop(file);

    fs::rename(tmp, path)?;
    Ok(())
}
