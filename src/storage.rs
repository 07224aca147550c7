//! Durable key/value storage for panel layouts.
//!
//! Each panel identity owns one key (`panel-state-<slug>`). Values are small
//! JSON records:
//!
//! ```text
//! { "version": 1, "position": { "x": 100, "y": 100 }, "isMinimized": false,
//!   "savedAt": "2026-10-19T12:00:00Z" }
//! ```
//!
//! `version` and `savedAt` are optional on read so that records written
//! without them still load. Parsing goes through [`LayoutRecord::parse`],
//! which makes the fallback-to-defaults branch explicit instead of burying it
//! in a catch-all.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{Context, Result, bail};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::Point;

/// Schema version written with every record.
pub const LAYOUT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Store trait
// ---------------------------------------------------------------------------

/// Backing store for persisted layouts. Partitioned by key; keys never
/// contend with each other.
pub trait LayoutStore {
    /// Read the raw value for `key`. `Ok(None)` means nothing is stored.
    fn read(&self, key: &str) -> Result<Option<String>>;

    /// Durably write `value` under `key`, replacing any previous value.
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// File-backed store
// ---------------------------------------------------------------------------

/// One JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileLayoutStore {
    dir: PathBuf,
}

impl FileLayoutStore {
    /// Use `dir` as the store root. The directory is created lazily on the
    /// first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LayoutStore for FileLayoutStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("failed to read {}", path.display())),
        }
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("failed to create layout dir {}", self.dir.display()))?;

        // Write-then-rename so a crash mid-write never leaves a torn record.
        let path = self.path_for(key);
        let tmp = self.dir.join(format!(".{key}.json.tmp"));
        std::fs::write(&tmp, value)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Process-local store. Clones share the same map, which lets a test
/// rebuild a registry over the "same disk".
#[derive(Debug, Clone, Default)]
pub struct MemoryLayoutStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<Cell<bool>>,
}

impl MemoryLayoutStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail, as a full or unavailable disk would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.set(fail);
    }

    /// Seed a raw value directly, bypassing the record encoder.
    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
    }

    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl LayoutStore for MemoryLayoutStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.get() {
            bail!("storage quota exceeded writing {key}");
        }
        self.entries.borrow_mut().insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Layout records
// ---------------------------------------------------------------------------

/// The persisted part of a panel's state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedLayout {
    pub version: u32,
    pub position: Point,
    pub is_minimized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_at: Option<DateTime<Utc>>,
}

impl PersistedLayout {
    pub fn new(position: Point, is_minimized: bool) -> Self {
        Self {
            version: LAYOUT_SCHEMA_VERSION,
            position,
            is_minimized,
            saved_at: Some(Utc::now()),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context("failed to encode layout record")
    }
}

/// Wire shape accepted on read. Coordinates are read as floats because
/// browser-era records may hold fractional pixels.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLayout {
    #[serde(default)]
    version: Option<u32>,
    position: RawPoint,
    is_minimized: bool,
    #[serde(default)]
    saved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RawPoint {
    x: f64,
    y: f64,
}

/// Why a stored record was not used.
#[derive(Debug, Clone, PartialEq)]
pub enum FallbackReason {
    /// Nothing stored under the key.
    Missing,
    /// The store itself failed to read.
    Unreadable(String),
    /// Not JSON, or JSON without the required fields.
    Malformed(String),
    /// Written by a schema this build does not understand.
    UnsupportedVersion(u32),
    /// Coordinates outside the representable pixel range.
    OutOfRange,
}

/// Outcome of reading one panel's record: use it, or fall back to defaults.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutRecord {
    Valid(PersistedLayout),
    Fallback(FallbackReason),
}

impl LayoutRecord {
    /// Validate a raw stored value.
    pub fn parse(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return LayoutRecord::Fallback(FallbackReason::Missing);
        };

        let parsed: RawLayout = match serde_json::from_str(raw) {
            Ok(parsed) => parsed,
            Err(e) => return LayoutRecord::Fallback(FallbackReason::Malformed(e.to_string())),
        };

        let version = parsed.version.unwrap_or(LAYOUT_SCHEMA_VERSION);
        if version != LAYOUT_SCHEMA_VERSION {
            return LayoutRecord::Fallback(FallbackReason::UnsupportedVersion(version));
        }

        let in_range = |v: f64| v.is_finite() && v >= i32::MIN as f64 && v <= i32::MAX as f64;
        if !in_range(parsed.position.x) || !in_range(parsed.position.y) {
            return LayoutRecord::Fallback(FallbackReason::OutOfRange);
        }

        LayoutRecord::Valid(PersistedLayout {
            version,
            position: Point::from_f64(parsed.position.x, parsed.position.y),
            is_minimized: parsed.is_minimized,
            saved_at: parsed.saved_at,
        })
    }

    /// Read and validate `key` from `store`.
    pub fn load(store: &dyn LayoutStore, key: &str) -> Self {
        match store.read(key) {
            Ok(raw) => Self::parse(raw.as_deref()),
            Err(e) => LayoutRecord::Fallback(FallbackReason::Unreadable(format!("{e:#}"))),
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
    fn parse_missing_is_fallback() {
        assert_eq!(LayoutRecord::parse(None), LayoutRecord::Fallback(FallbackReason::Missing));
    }

    #[test]
    fn parse_legacy_record_without_version() {
        let raw = r#"{"position":{"x":100,"y":42},"isMinimized":true}"#;
        match LayoutRecord::parse(Some(raw)) {
            LayoutRecord::Valid(layout) => {
                assert_eq!(layout.position, Point::new(100, 42));
                assert!(layout.is_minimized);
                assert_eq!(layout.version, LAYOUT_SCHEMA_VERSION);
                assert!(layout.saved_at.is_none());
            }
            other => panic!("expected valid record, got {other:?}"),
        }
    }

    #[test]
    fn parse_rounds_fractional_pixels() {
        let raw = r#"{"position":{"x":415.5,"y":100.2},"isMinimized":false}"#;
        let LayoutRecord::Valid(layout) = LayoutRecord::parse(Some(raw)) else {
            panic!("fractional coordinates should load");
        };
        assert_eq!(layout.position, Point::new(416, 100));
    }

    #[test]
    fn parse_rejects_garbage_and_missing_fields() {
        assert!(matches!(
            LayoutRecord::parse(Some("not json")),
            LayoutRecord::Fallback(FallbackReason::Malformed(_))
        ));
        assert!(matches!(
            LayoutRecord::parse(Some(r#"{"position":{"x":1,"y":2}}"#)),
            LayoutRecord::Fallback(FallbackReason::Malformed(_))
        ));
        assert!(matches!(
            LayoutRecord::parse(Some(r#"{"position":"here","isMinimized":false}"#)),
            LayoutRecord::Fallback(FallbackReason::Malformed(_))
        ));
    }

    #[test]
    fn parse_rejects_future_version() {
        let raw = r#"{"version":2,"position":{"x":1,"y":2},"isMinimized":false}"#;
        assert_eq!(
            LayoutRecord::parse(Some(raw)),
            LayoutRecord::Fallback(FallbackReason::UnsupportedVersion(2))
        );
    }

    #[test]
    fn parse_rejects_out_of_range() {
        let raw = r#"{"position":{"x":1e12,"y":2},"isMinimized":false}"#;
        assert_eq!(LayoutRecord::parse(Some(raw)), LayoutRecord::Fallback(FallbackReason::OutOfRange));
    }

    #[test]
    fn encoded_record_parses_back() {
        let layout = PersistedLayout::new(Point::new(-3, 77), true);
        let json = layout.to_json().unwrap();
        assert!(json.contains("\"isMinimized\":true"));
        assert!(json.contains("\"version\":1"));
        assert_eq!(LayoutRecord::parse(Some(&json)), LayoutRecord::Valid(layout));
    }

    #[test]
    fn memory_store_clones_share_entries() {
        let store = MemoryLayoutStore::new();
        let mut writer = store.clone();
        writer.write("k", "v").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn memory_store_can_fail_writes() {
        let mut store = MemoryLayoutStore::new();
        store.set_fail_writes(true);
        assert!(store.write("k", "v").is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn file_store_roundtrip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileLayoutStore::new(dir.path().join("layout"));

        assert_eq!(store.read("panel-state-gm-chat").unwrap(), None);
        store.write("panel-state-gm-chat", "{}").unwrap();
        assert_eq!(store.read("panel-state-gm-chat").unwrap().as_deref(), Some("{}"));
        assert!(dir.path().join("layout/panel-state-gm-chat.json").is_file());
    }

    #[test]
    fn load_reports_unreadable_store() {
        struct Broken;
        impl LayoutStore for Broken {
            fn read(&self, _key: &str) -> Result<Option<String>> {
                bail!("disk on fire")
            }
            fn write(&mut self, _key: &str, _value: &str) -> Result<()> {
                Ok(())
            }
        }
        assert!(matches!(
            LayoutRecord::load(&Broken, "k"),
            LayoutRecord::Fallback(FallbackReason::Unreadable(msg)) if msg.contains("disk on fire")
        ));
    }
}
