//! Hot reload for the panel theme file.
//!
//! Watches `~/.config/mothership-dock/panels.toml`. The notify callback runs
//! on notify's own thread; it only reads the file and sends the text over a
//! channel. Parsing and applying happen on the UI thread in [`ThemeWatcher::poll`].

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver};

use anyhow::{Context, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{info, warn};

use crate::theme::{PanelTheme, default_toml_content};

// ---------------------------------------------------------------------------
// File I/O helpers
// ---------------------------------------------------------------------------

/// Write the commented default theme to `path` if no file exists yet.
/// Returns whether a file was written.
pub fn ensure_default_theme(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config dir {}", parent.display()))?;
    }
    std::fs::write(path, default_toml_content())
        .with_context(|| format!("writing default theme {}", path.display()))?;
    info!(target: "config", path = %path.display(), "wrote default theme");
    Ok(true)
}

/// Read and parse the theme at `path`.
pub fn load_theme(path: &Path) -> Result<PanelTheme> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    PanelTheme::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
}

// ---------------------------------------------------------------------------
// Low-level watcher
// ---------------------------------------------------------------------------

/// Spawn a file watcher on the *parent directory* of `path`.
///
/// Editors that save via write-to-temp-then-rename never modify the original
/// inode, so the directory is watched and events are filtered by filename.
///
/// `on_change` is called whenever the target file is created or modified.
pub fn spawn_watcher<F>(path: &Path, on_change: F) -> Result<RecommendedWatcher>
where
    F: Fn() + Send + 'static,
{
    let target_filename = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?
        .to_os_string();
    let parent = path
        .parent()
        .with_context(|| format!("{} has no parent directory", path.display()))?
        .to_path_buf();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
                return;
            }
            let affects_target = event
                .paths
                .iter()
                .any(|p| p.file_name().is_some_and(|f| f == target_filename));
            if affects_target {
                on_change();
            }
        }
        Err(e) => warn!(target: "config", "watch error: {e}"),
    })?;

    watcher
        .watch(&parent, RecursiveMode::NonRecursive)
        .with_context(|| format!("watching {}", parent.display()))?;
    Ok(watcher)
}

// ---------------------------------------------------------------------------
// ThemeWatcher
// ---------------------------------------------------------------------------

/// Owns the watcher and the receiving end of the reload channel.
pub struct ThemeWatcher {
    _watcher: RecommendedWatcher,
    path: PathBuf,
    rx: Receiver<String>,
}

impl ThemeWatcher {
    /// Start watching `path`, writing the default theme first if needed.
    /// `wake` runs on the watcher thread after each change so the UI loop
    /// can come round and call [`poll`](Self::poll).
    pub fn start<W>(path: PathBuf, wake: W) -> Result<Self>
    where
        W: Fn() + Send + 'static,
    {
        ensure_default_theme(&path)?;

        let (tx, rx) = mpsc::channel();
        let watched = path.clone();
        let watcher = spawn_watcher(&path, move || match std::fs::read_to_string(&watched) {
            Ok(text) => {
                if tx.send(text).is_ok() {
                    wake();
                }
            }
            Err(e) => warn!(target: "config", path = %watched.display(), "failed to read theme: {e}"),
        })?;

        info!(target: "config", path = %path.display(), "watching theme");
        Ok(Self {
            _watcher: watcher,
            path,
            rx,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Newest valid theme received since the last call. Invalid files are
    /// logged and skipped so the previous theme stays in effect.
    pub fn poll(&self) -> Option<PanelTheme> {
        let latest = self.rx.try_iter().last()?;
        match PanelTheme::from_toml(&latest) {
            Ok(theme) => Some(theme),
            Err(e) => {
                warn!(target: "config", path = %self.path.display(), "ignoring invalid theme: {e}");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_default_creates_file_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("panels.toml");

        assert!(ensure_default_theme(&path).expect("first write"));
        assert!(!ensure_default_theme(&path).expect("second call"));
        assert_eq!(load_theme(&path).expect("default parses"), PanelTheme::default());
    }

    #[test]
    fn ensure_default_does_not_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("panels.toml");
        std::fs::write(&path, "[viewport]\nmargin = 4\n").expect("seed");

        ensure_default_theme(&path).expect("ensure");
        assert_eq!(load_theme(&path).expect("parse").margin(), 4);
    }

    #[test]
    fn load_reports_missing_and_invalid_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(load_theme(&dir.path().join("absent.toml")).is_err());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[viewport\n").expect("seed");
        let err = load_theme(&bad).expect_err("invalid toml");
        assert!(format!("{err:#}").contains("parsing"));
    }
}
