// Version information module
// This module provides version and build information for voicekeeper

use std::fmt;

/// Version information structure
pub struct VersionInfo {
    pub version: &'static str,
    pub git_hash: &'static str,
    pub git_branch: &'static str,
    pub git_dirty: bool,
    pub build_date: &'static str,
    pub build_profile: &'static str,
    pub rustc_version: &'static str,
}

impl VersionInfo {
    /// Get the current version information
    pub fn current() -> Self {
        Self {
            version: env!("VOICEKEEPER_VERSION"),
            git_hash: env!("VOICEKEEPER_GIT_HASH"),
            git_branch: env!("VOICEKEEPER_GIT_BRANCH"),
            git_dirty: env!("VOICEKEEPER_GIT_DIRTY") == "true",
            build_date: env!("VOICEKEEPER_BUILD_DATE"),
            build_profile: env!("VOICEKEEPER_BUILD_PROFILE"),
            rustc_version: env!("VOICEKEEPER_RUSTC_VERSION"),
        }
    }

    /// Get a short version string (just version and git hash)
    pub fn short(&self) -> String {
        if self.git_dirty {
            format!("v{} ({}+dirty)", self.version, self.git_hash)
        } else {
            format!("v{} ({})", self.version, self.git_hash)
        }
    }

    /// Check if this is a release build
    #[allow(dead_code)]
    pub fn is_release(&self) -> bool {
        self.build_profile == "release"
    }
}

impl fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Voicekeeper v{}", self.version)?;
        writeln!(
            f,
            "Git: {} ({}){}",
            self.git_hash,
            self.git_branch,
            if self.git_dirty { " +uncommitted changes" } else { "" }
        )?;
        writeln!(f, "Built: {} ({})", self.build_date, self.build_profile)?;
        writeln!(f, "Rustc: {}", self.rustc_version)?;
        Ok(())
    }
}

/// Get the version string for --version output
pub fn version_string() -> String {
    let info = VersionInfo::current();
    format!("{}", info)
}

/// Get a short version string for logs or debug output
pub fn short_version() -> String {
    let info = VersionInfo::current();
    info.short()
}
