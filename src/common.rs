//! Common utilities shared across modules.
//!
//! This module provides shared functionality to reduce code duplication
//! and ensure consistent behavior across the library.

use std::path::PathBuf;

/// Gets the application data directory using XDG Base Directory specification.
///
/// Returns `~/.local/share/voicekeeper/` on Unix-like systems.
///
/// # Example
///
/// ```rust,no_run
/// use voicekeeper::common::get_data_dir;
///
/// let data_dir = get_data_dir();
/// let totals_file = data_dir.join("totals.json");
/// ```
pub fn get_data_dir() -> PathBuf {
    // Use dirs crate for proper XDG handling
    let base_dir = dirs::data_dir().unwrap_or_else(|| {
        // Fallback if dirs crate fails
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".local").join("share")
    });

    base_dir.join("voicekeeper")
}
