//! User settings, stored as JSON in the platform config directory.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mailnook_store::DiscoveryOptions;
use serde::{Deserialize, Serialize};

/// Environment variable overriding [`Settings::maildir_root`].
pub const MAILDIR_ENV: &str = "MAILNOOK_MAILDIR";

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory searched by `mailboxes` when no root is given.
    pub maildir_root: PathBuf,
    /// Discovery depth limit.
    pub max_depth: usize,
    /// Whether discovery follows symlinked directories.
    pub follow_symlinks: bool,
    /// Whether discovery scans dot-directories.
    pub include_hidden: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let defaults = DiscoveryOptions::default();
        Self {
            maildir_root: dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("Maildir"),
            max_depth: defaults.max_depth,
            follow_symlinks: defaults.follow_symlinks,
            include_hidden: defaults.include_hidden,
        }
    }
}

impl Settings {
    /// Default settings file location.
    #[must_use]
    pub fn path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("mailnook")
            .join("settings.json")
    }

    /// Loads settings from the default location, then applies the
    /// environment override.
    pub fn load() -> Result<Self> {
        let settings = Self::load_from(&Self::path())?;
        Ok(settings.with_maildir_override(std::env::var_os(MAILDIR_ENV)))
    }

    /// Loads settings from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No settings file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading settings from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("parsing settings from {}", path.display()))
    }

    /// Replaces the maildir root when an override is set and non-empty.
    #[must_use]
    pub fn with_maildir_override(mut self, value: Option<OsString>) -> Self {
        if let Some(root) = value.filter(|v| !v.is_empty()) {
            self.maildir_root = PathBuf::from(root);
        }
        self
    }

    /// Discovery options derived from these settings.
    #[must_use]
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions::builder()
            .max_depth(self.max_depth)
            .follow_symlinks(self.follow_symlinks)
            .include_hidden(self.include_hidden)
            .build()
    }
}
