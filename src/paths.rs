//! Application directory structure for mothership-dock.
//!
//! Follows macOS conventions:
//!
//! - Config:    `~/.config/mothership-dock/`  (human-editable, XDG-style)
//! - Data:      `~/Library/Application Support/com.mothership.dock/`
//! - Layout:    `<data>/layout/`  (one JSON record per panel)
//! - Logs:      `~/Library/Logs/mothership-dock/`
//!
//! On non-macOS, falls back to XDG paths.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
const BUNDLE_ID: &str = "com.mothership.dock";
const APP_NAME: &str = "mothership-dock";
const THEME_FILE: &str = "panels.toml";

/// All resolved application directory paths.
#[derive(Debug, Clone)]
pub struct DockPaths {
    /// Human-editable config: `~/.config/mothership-dock/`
    pub config: PathBuf,
    /// Machine-managed application data root
    pub data: PathBuf,
    /// Persisted panel layout records
    pub layout: PathBuf,
    /// Application logs
    pub logs: PathBuf,
}

impl DockPaths {
    /// Resolve all paths from the user's home directory.
    /// Does not create any directories; call `ensure()` for that.
    pub fn resolve() -> Option<Self> {
        let home = std::env::var("HOME").ok().map(PathBuf::from)?;
        let data = resolve_data_dir(&home);
        Some(Self {
            config: resolve_config_dir(&home),
            layout: data.join("layout"),
            data,
            logs: resolve_log_dir(&home),
        })
    }

    /// Point layout storage somewhere else (`--data-dir`).
    pub fn with_data_dir(mut self, data: impl Into<PathBuf>) -> Self {
        self.data = data.into();
        self.layout = self.data.join("layout");
        self
    }

    /// The theme file watched for hot reload.
    pub fn theme_file(&self) -> PathBuf {
        self.config.join(THEME_FILE)
    }

    /// Create all directories that don't already exist.
    pub fn ensure(&self) -> Result<()> {
        for dir in [&self.config, &self.data, &self.layout, &self.logs] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            info!("ensured directory: {}", dir.display());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Platform-specific path resolution
// ---------------------------------------------------------------------------

fn resolve_config_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        PathBuf::from(xdg).join(APP_NAME)
    } else {
        home.join(".config").join(APP_NAME)
    }
}

#[cfg(target_os = "macos")]
fn resolve_data_dir(home: &Path) -> PathBuf {
    home.join("Library")
        .join("Application Support")
        .join(BUNDLE_ID)
}

#[cfg(not(target_os = "macos"))]
fn resolve_data_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join(APP_NAME)
    } else {
        home.join(".local").join("share").join(APP_NAME)
    }
}

#[cfg(target_os = "macos")]
fn resolve_log_dir(home: &Path) -> PathBuf {
    home.join("Library").join("Logs").join(APP_NAME)
}

#[cfg(not(target_os = "macos"))]
fn resolve_log_dir(home: &Path) -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg).join(APP_NAME).join("logs")
    } else {
        home.join(".local").join("share").join(APP_NAME).join("logs")
    }
}
