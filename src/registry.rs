//! The panel registry: single source of truth for every panel's state.
//!
//! Persisted per panel: position and minimized flag. Derived on read: the
//! open flag and the z-index, both computed from the open set and the focus
//! stack so the two can never disagree.
//!
//! ```text
//! open(id)          → open set ∪ {id}, then bring_to_front(id)
//! close(id)         → open set ∖ {id}, stack ∖ {id}
//! bring_to_front(id)→ stack = [id, ...stack without id]
//! z_index(id)       → (stack.len() - index) + BASE_Z_OFFSET, or -1 if closed
//! ```
//!
//! Storage failures never escape: they are logged and the in-memory state
//! stays authoritative for the session.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::geometry::{Point, Size};
use crate::panel_id::PanelId;
use crate::storage::{FallbackReason, LayoutRecord, LayoutStore, PersistedLayout};

/// Added to every open panel's stack rank so panels render above the rest
/// of the UI.
pub const BASE_Z_OFFSET: i32 = 40;

/// Z-index reported for closed panels.
pub const CLOSED_Z_INDEX: i32 = -1;

/// Snapshot of one panel's state, as seen by views and collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelState {
    pub is_open: bool,
    pub is_minimized: bool,
    pub position: Point,
    pub z_index: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PanelLayout {
    position: Point,
    is_minimized: bool,
}

/// Callback invoked with the open panel ids after the open set changes.
pub type OpenPanelsListener = Box<dyn FnMut(&[PanelId])>;

pub struct PanelRegistry {
    layouts: HashMap<PanelId, PanelLayout>,
    /// Open panels in the order they were opened.
    open: Vec<PanelId>,
    /// Focus stack, front at index 0.
    stack: Vec<PanelId>,
    store: Box<dyn LayoutStore>,
    /// Viewport used to compute default positions.
    viewport: Size,
    listeners: Vec<OpenPanelsListener>,
}

impl PanelRegistry {
    /// Build the registry, seeding each panel from `store` or, when nothing
    /// valid is stored, from its default position for `viewport`.
    ///
    /// Every session starts with all panels closed and an empty stack.
    pub fn new(store: Box<dyn LayoutStore>, viewport: Size) -> Self {
        let mut layouts = HashMap::with_capacity(PanelId::ALL.len());

        for id in PanelId::ALL {
            let layout = match LayoutRecord::load(store.as_ref(), &id.storage_key()) {
                LayoutRecord::Valid(persisted) => {
                    debug!(target: "panels", panel = %id, x = persisted.position.x, y = persisted.position.y, "restored layout");
                    PanelLayout {
                        position: persisted.position,
                        is_minimized: persisted.is_minimized,
                    }
                }
                LayoutRecord::Fallback(reason) => {
                    match &reason {
                        FallbackReason::Missing => {
                            debug!(target: "panels", panel = %id, "no stored layout, using default");
                        }
                        other => {
                            warn!(target: "panels", panel = %id, reason = ?other, "ignoring stored layout");
                        }
                    }
                    Self::default_layout(id, viewport)
                }
            };
            layouts.insert(id, layout);
        }

        Self {
            layouts,
            open: Vec::new(),
            stack: Vec::new(),
            store,
            viewport,
            listeners: Vec::new(),
        }
    }

    fn default_layout(id: PanelId, viewport: Size) -> PanelLayout {
        PanelLayout {
            position: id.default_position(viewport),
            is_minimized: false,
        }
    }

    fn layout(&self, id: PanelId) -> PanelLayout {
        self.layouts
            .get(&id)
            .copied()
            .unwrap_or_else(|| Self::default_layout(id, self.viewport))
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Current state of `id`, with derived fields computed on the fly.
    pub fn get_state(&self, id: PanelId) -> PanelState {
        let layout = self.layout(id);
        let is_open = self.is_open(id);
        PanelState {
            is_open,
            is_minimized: layout.is_minimized,
            position: layout.position,
            z_index: if is_open { self.z_index(id) } else { CLOSED_Z_INDEX },
        }
    }

    pub fn is_open(&self, id: PanelId) -> bool {
        self.open.contains(&id)
    }

    fn z_index(&self, id: PanelId) -> i32 {
        match self.stack.iter().position(|&p| p == id) {
            Some(index) => (self.stack.len() - index) as i32 + BASE_Z_OFFSET,
            None => CLOSED_Z_INDEX,
        }
    }

    /// Open panels, in the order they were opened.
    pub fn open_panel_ids(&self) -> &[PanelId] {
        &self.open
    }

    /// Focus order, front first.
    pub fn stack(&self) -> &[PanelId] {
        &self.stack
    }

    /// Whether any tool panel (everything but the GM chat) is open.
    pub fn any_tool_open(&self) -> bool {
        self.open.iter().any(|id| id.is_tool())
    }

    /// The open panel with the highest z-index.
    pub fn front(&self) -> Option<PanelId> {
        self.stack.first().copied()
    }

    // ------------------------------------------------------------------
    // Open set and focus stack
    // ------------------------------------------------------------------

    /// Open `id` (idempotent) and raise it.
    pub fn open(&mut self, id: PanelId) {
        let added = if self.open.contains(&id) {
            false
        } else {
            self.open.push(id);
            true
        };
        self.bring_to_front(id);
        if added {
            info!(target: "panels", panel = %id, "opened");
            self.notify_open_panels();
        }
    }

    /// Close `id`. Closing an already-closed panel does nothing.
    pub fn close(&mut self, id: PanelId) {
        let before = self.open.len();
        self.open.retain(|&p| p != id);
        self.stack.retain(|&p| p != id);
        if self.open.len() != before {
            info!(target: "panels", panel = %id, "closed");
            self.notify_open_panels();
        }
    }

    /// Close if open, open otherwise.
    pub fn toggle_open(&mut self, id: PanelId) {
        if self.is_open(id) {
            self.close(id);
        } else {
            self.open(id);
        }
    }

    /// Move `id` to the front, keeping everyone else's relative order.
    ///
    /// Only open panels are stacked; raising a closed panel is a no-op so the
    /// stack never holds a closed id.
    pub fn bring_to_front(&mut self, id: PanelId) {
        if !self.open.contains(&id) {
            debug!(target: "panels", panel = %id, "ignoring raise of closed panel");
            return;
        }
        if self.stack.first() == Some(&id) {
            return;
        }
        self.stack.retain(|&p| p != id);
        self.stack.insert(0, id);
        debug!(target: "panels", panel = %id, stack = ?self.stack, "raised");
    }

    /// Register a listener for open-set changes. The listener only ever sees
    /// a snapshot slice and has no path back into the registry.
    pub fn subscribe_open_panels(&mut self, listener: OpenPanelsListener) {
        self.listeners.push(listener);
    }

    fn notify_open_panels(&mut self) {
        let snapshot = self.open.as_slice();
        for listener in &mut self.listeners {
            listener(snapshot);
        }
    }

    // ------------------------------------------------------------------
    // Persisted layout
    // ------------------------------------------------------------------

    pub fn minimize(&mut self, id: PanelId) {
        self.update_layout(id, |l| l.is_minimized = true);
    }

    pub fn restore(&mut self, id: PanelId) {
        self.update_layout(id, |l| l.is_minimized = false);
    }

    pub fn toggle_minimize(&mut self, id: PanelId) {
        self.update_layout(id, |l| l.is_minimized = !l.is_minimized);
    }

    pub fn set_position(&mut self, id: PanelId, position: Point) {
        self.update_layout(id, |l| l.position = position);
    }

    /// Put `id` back at its default position, expanded.
    pub fn reset_layout(&mut self, id: PanelId) {
        let default = Self::default_layout(id, self.viewport);
        self.update_layout(id, |l| *l = default);
        info!(target: "panels", panel = %id, "layout reset");
    }

    /// Viewport used for default positions from now on.
    pub fn set_viewport(&mut self, viewport: Size) {
        self.viewport = viewport;
    }

    fn update_layout(&mut self, id: PanelId, f: impl FnOnce(&mut PanelLayout)) {
        let mut layout = self.layout(id);
        f(&mut layout);
        self.layouts.insert(id, layout);
        self.persist(id, layout);
    }

    /// Best-effort durable write. Failures are logged, never returned.
    fn persist(&mut self, id: PanelId, layout: PanelLayout) {
        let record = PersistedLayout::new(layout.position, layout.is_minimized);
        let result = record
            .to_json()
            .and_then(|json| self.store.write(&id.storage_key(), &json));
        if let Err(e) = result {
            warn!(target: "panels", panel = %id, "failed to persist layout: {e:#}");
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
