//! The desk: every panel over the main view.
//!
//! Owns the registry and one view per panel, and plays the part of the
//! event dispatcher. Presses go to the topmost open panel under the pointer;
//! moves and releases go only to a view that is mid-drag, wherever the
//! pointer is.

use tracing::{debug, info};
use vello::Scene;

use crate::content::{self, PanelContent, PanelRequest};
use crate::geometry::{Point, Size};
use crate::panel_id::PanelId;
use crate::registry::PanelRegistry;
use crate::theme::PanelTheme;
use crate::view::{DialogSemantics, PanelView};

pub struct Desk {
    registry: PanelRegistry,
    views: Vec<PanelView>,
    viewport: Size,
    theme: PanelTheme,
}

impl Desk {
    /// Desk with the placeholder body mounted in every panel.
    pub fn new(registry: PanelRegistry, theme: PanelTheme, viewport: Size) -> Self {
        Self::with_content(registry, theme, viewport, content::placeholder_for)
    }

    /// Desk with `mount` supplying each panel's body.
    pub fn with_content(
        mut registry: PanelRegistry,
        theme: PanelTheme,
        viewport: Size,
        mut mount: impl FnMut(PanelId) -> Box<dyn PanelContent>,
    ) -> Self {
        registry.set_viewport(viewport);
        let views = PanelId::ALL
            .into_iter()
            .map(|id| PanelView::new(id, mount(id), theme.drag.interactive.clone()))
            .collect();
        Self {
            registry,
            views,
            viewport,
            theme,
        }
    }

    pub fn registry(&self) -> &PanelRegistry {
        &self.registry
    }

    /// Direct registry access for navigation and other collaborators.
    pub fn registry_mut(&mut self) -> &mut PanelRegistry {
        &mut self.registry
    }

    pub fn theme(&self) -> &PanelTheme {
        &self.theme
    }

    pub fn viewport(&self) -> Size {
        self.viewport
    }

    pub fn view(&self, id: PanelId) -> Option<&PanelView> {
        self.views.iter().find(|v| v.id() == id)
    }

    pub fn dialog_semantics(&self, id: PanelId) -> Option<DialogSemantics> {
        self.view(id)?.dialog_semantics(&self.registry)
    }

    pub fn is_dragging(&self) -> bool {
        self.views.iter().any(PanelView::is_dragging)
    }

    /// Open panels back to front.
    pub fn paint_order(&self) -> Vec<PanelId> {
        let mut open: Vec<(i32, PanelId)> = self
            .registry
            .open_panel_ids()
            .iter()
            .map(|&id| (self.registry.get_state(id).z_index, id))
            .collect();
        open.sort_by_key(|&(z, _)| z);
        open.into_iter().map(|(_, id)| id).collect()
    }

    /// Topmost open panel under `point`.
    pub fn panel_at(&self, point: Point) -> Option<PanelId> {
        self.paint_order()
            .into_iter()
            .rev()
            .find(|&id| {
                self.view(id)
                    .and_then(|v| v.hit_test(&self.registry, &self.theme, point))
                    .is_some()
            })
    }

    // ------------------------------------------------------------------
    // Pointer routing
    // ------------------------------------------------------------------

    /// Press at `point`. Returns the panel that took it, if any.
    ///
    /// A press implies the previous release, so a drag whose release never
    /// arrived ends here before the press is routed.
    pub fn pointer_down(&mut self, point: Point) -> Option<PanelId> {
        if self.is_dragging() {
            debug!(target: "desk", "press while dragging, ending stale drag");
            self.pointer_up();
        }
        let id = self.panel_at(point)?;
        let view = self.views.iter_mut().find(|v| v.id() == id)?;
        let outcome = view.pointer_down(&mut self.registry, &self.theme, point);
        if outcome.drag_started {
            debug!(target: "desk", panel = %id, "drag started");
        }
        if let Some(request) = outcome.request {
            self.apply_request(id, request);
        }
        Some(id)
    }

    /// Move anywhere in the window.
    pub fn pointer_move(&mut self, point: Point) {
        for view in self.views.iter_mut().filter(|v| v.wants_global_pointer()) {
            view.pointer_move(&mut self.registry, self.viewport, &self.theme, point);
        }
    }

    /// Release anywhere in the window.
    pub fn pointer_up(&mut self) {
        for view in self.views.iter_mut().filter(|v| v.wants_global_pointer()) {
            view.pointer_up();
        }
    }

    /// Apply a body's request on behalf of panel `source`.
    pub fn apply_request(&mut self, source: PanelId, request: PanelRequest) {
        debug!(target: "desk", panel = %source, ?request, "panel request");
        match request {
            PanelRequest::Close => self.registry.close(source),
            PanelRequest::Focus => self.registry.bring_to_front(source),
            PanelRequest::Open(other) => self.registry.open(other),
        }
    }

    // ------------------------------------------------------------------
    // Layout and rendering
    // ------------------------------------------------------------------

    /// Measure every view and run pending viewport-safety passes. Call
    /// before drawing a frame.
    pub fn layout(&mut self) {
        for view in &mut self.views {
            view.layout(&mut self.registry, self.viewport, &self.theme);
        }
    }

    pub fn resize(&mut self, viewport: Size) {
        if viewport == self.viewport {
            return;
        }
        debug!(target: "desk", width = viewport.width, height = viewport.height, "viewport resized");
        self.viewport = viewport;
        self.registry.set_viewport(viewport);
        for view in &mut self.views {
            view.on_resize(&mut self.registry, viewport, &self.theme);
        }
    }

    /// Swap in a reloaded theme. Takes effect for chrome, margin and the
    /// drag allow-list immediately.
    pub fn apply_theme(&mut self, theme: PanelTheme) {
        if theme == self.theme {
            return;
        }
        info!(target: "desk", margin = theme.margin(), "theme applied");
        for view in &mut self.views {
            view.set_interactive_roles(theme.drag.interactive.clone());
        }
        self.theme = theme;
        self.layout();
    }

    /// Draw open panels in ascending z order.
    pub fn render(&self, scene: &mut Scene) {
        for id in self.paint_order() {
            if let Some(view) = self.view(id) {
                view.render(scene, &self.registry, &self.theme);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryLayoutStore;

    const VIEWPORT: Size = Size::new(1280, 800);

    fn desk() -> Desk {
        let registry = PanelRegistry::new(Box::new(MemoryLayoutStore::new()), VIEWPORT);
        Desk::new(registry, PanelTheme::default(), VIEWPORT)
    }

    #[test]
    fn press_goes_to_topmost_overlapping_panel() {
        let mut desk = desk();
        // CharacterSheet at (100, 100) and ShipManifest at (50, 50) overlap.
        desk.registry_mut().open(PanelId::CharacterSheet);
        desk.registry_mut().open(PanelId::ShipManifest);
        desk.layout();

        let overlap = Point::new(300, 300);
        assert_eq!(desk.panel_at(overlap), Some(PanelId::ShipManifest));

        desk.registry_mut().bring_to_front(PanelId::CharacterSheet);
        assert_eq!(desk.pointer_down(overlap), Some(PanelId::CharacterSheet));
        assert_eq!(desk.paint_order(), vec![PanelId::ShipManifest, PanelId::CharacterSheet]);
    }

    #[test]
    fn press_on_empty_space_hits_nothing() {
        let mut desk = desk();
        desk.registry_mut().open(PanelId::DiceRoller);
        desk.layout();
        assert_eq!(desk.pointer_down(Point::new(5, 790)), None);
    }

    #[test]
    fn moves_reach_only_the_dragging_panel() {
        let mut desk = desk();
        desk.registry_mut().open(PanelId::GmChat);
        desk.registry_mut().open(PanelId::CharacterSheet);
        desk.layout();
        let gm_before = desk.registry().get_state(PanelId::GmChat).position;

        // Header of CharacterSheet, away from its title and buttons.
        desk.pointer_down(Point::new(400, 110));
        assert!(desk.is_dragging());
        desk.pointer_move(Point::new(420, 130));
        desk.pointer_up();
        desk.pointer_move(Point::new(900, 700));

        assert_eq!(desk.registry().get_state(PanelId::CharacterSheet).position, Point::new(120, 120));
        assert_eq!(desk.registry().get_state(PanelId::GmChat).position, gm_before);
        assert!(!desk.is_dragging());
    }

    #[test]
    fn press_after_lost_release_drags_only_the_new_panel() {
        let mut desk = desk();
        desk.registry_mut().open(PanelId::GmChat);
        desk.registry_mut().open(PanelId::CharacterSheet);
        desk.layout();

        // CharacterSheet header, then the release never arrives.
        desk.pointer_down(Point::new(400, 110));
        assert!(desk.view(PanelId::CharacterSheet).is_some_and(PanelView::is_dragging));

        // GmChat is pulled back to (680, 120); press its header clear of the
        // title and buttons.
        desk.pointer_down(Point::new(1000, 130));
        let dragging: Vec<PanelId> = PanelId::ALL
            .into_iter()
            .filter(|&id| desk.view(id).is_some_and(PanelView::is_dragging))
            .collect();
        assert_eq!(dragging, vec![PanelId::GmChat]);

        desk.pointer_move(Point::new(980, 150));
        desk.pointer_up();
        assert_eq!(desk.registry().get_state(PanelId::CharacterSheet).position, Point::new(100, 100));
        assert_eq!(desk.registry().get_state(PanelId::GmChat).position, Point::new(660, 140));
        assert!(!desk.is_dragging());
    }

    #[test]
    fn body_request_opens_another_panel() {
        let mut desk = desk();
        desk.registry_mut().open(PanelId::GmChat);
        desk.layout();
        // ROLL CHECK is the second control in the GM chat body.
        let origin = desk.registry().get_state(PanelId::GmChat).position;
        let press = Point::new(origin.x + 16 + 248 + 10, origin.y + 40 + 16 + 22 + 8 + 5);
        desk.pointer_down(press);
        assert!(desk.registry().is_open(PanelId::DiceRoller));
        assert_eq!(desk.registry().front(), Some(PanelId::DiceRoller));
    }

    #[test]
    fn theme_reload_reclamps_with_new_margin() {
        let mut desk = desk();
        desk.registry_mut().open(PanelId::ShipManifest);
        desk.layout();
        assert_eq!(desk.registry().get_state(PanelId::ShipManifest).position, Point::new(50, 50));

        let mut theme = PanelTheme::default();
        theme.viewport.margin = 80;
        theme.chrome.header_height = 48;
        desk.apply_theme(theme);
        assert_eq!(desk.registry().get_state(PanelId::ShipManifest).position, Point::new(80, 80));
    }
}
