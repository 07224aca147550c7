//! One dockable panel: chrome, hit-testing, focus-on-press and the
//! viewport-safety pass.
//!
//! A view owns its body and its drag controller but no panel state; every
//! read goes through the registry and every change is a registry call.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ Title                          [_]  [X] │  header (drag handle)
//! ├──────────────────────────────────────────┤
//! │                                          │
//! │ body (content)                           │  absent while minimized
//! │                                          │
//! └──────────────────────────────────────────┘
//! ```

use tracing::debug;
use vello::Scene;
use vello::kurbo::{Affine, Line, RoundedRect, Stroke};
use vello::peniko::Fill;

use crate::content::{PanelContent, PanelRequest};
use crate::geometry::{self, Point, Rect, Size};
use crate::glyphs;
use crate::hit::{ElementRole, HitPath, InteractiveRoles};
use crate::panel_id::PanelId;
use crate::registry::{PanelRegistry, PanelState};
use crate::state_machine::DragController;
use crate::theme::{PanelTheme, color};

// ---------------------------------------------------------------------------
// Chrome geometry
// ---------------------------------------------------------------------------

/// Region of a panel under a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromePart {
    CloseButton,
    MinimizeButton,
    Title,
    Header,
    Body(Rect),
}

/// Viewport-space rects of every chrome element for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chrome {
    pub frame: Rect,
    pub header: Rect,
    /// Bottom edge is the title baseline.
    pub title: Rect,
    pub minimize: Rect,
    pub close: Rect,
    pub body: Option<Rect>,
}

impl Chrome {
    pub fn compute(id: PanelId, origin: Point, size: Size, minimized: bool, theme: &PanelTheme) -> Self {
        let c = &theme.chrome;
        let frame = Rect::new(origin, size);
        let header = Rect::new(origin, Size::new(size.width, c.header_height));

        let pad = (c.header_height - c.button_size) / 2;
        let button = Size::new(c.button_size, c.button_size);
        let close = Rect::new(
            Point::new(frame.right() - pad - c.button_size, origin.y + pad),
            button,
        );
        let minimize = Rect::new(
            Point::new(close.origin.x - c.button_gap - c.button_size, origin.y + pad),
            button,
        );

        let title_w = glyphs::text_width(id.title(), c.title_size).ceil() as i32;
        let title_h = glyphs::line_height(c.title_size).ceil() as i32;
        let title = Rect::from_xywh(
            origin.x + c.title_inset,
            origin.y + (c.header_height - title_h) / 2,
            title_w,
            title_h,
        );

        let body = (!minimized).then(|| {
            Rect::from_xywh(
                origin.x,
                header.bottom(),
                size.width,
                (size.height - c.header_height).max(0),
            )
        });

        Self {
            frame,
            header,
            title,
            minimize,
            close,
            body,
        }
    }

    pub fn part_at(&self, p: Point) -> Option<ChromePart> {
        if !self.frame.contains(p) {
            return None;
        }
        if self.header.contains(p) {
            return Some(if self.close.contains(p) {
                ChromePart::CloseButton
            } else if self.minimize.contains(p) {
                ChromePart::MinimizeButton
            } else if self.title.contains(p) {
                ChromePart::Title
            } else {
                ChromePart::Header
            });
        }
        self.body.filter(|b| b.contains(p)).map(ChromePart::Body)
    }
}

// ---------------------------------------------------------------------------
// Accessibility
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogRole {
    Dialog,
}

/// Advisory semantics for assistive tech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogSemantics {
    pub role: DialogRole,
    /// Expanded panels are modal; minimized ones are not.
    pub modal: bool,
    /// Element id of the title.
    pub labelled_by: String,
}

// ---------------------------------------------------------------------------
// View
// ---------------------------------------------------------------------------

/// What a press on the panel did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PressOutcome {
    /// A drag began; default press handling is suppressed.
    pub drag_started: bool,
    /// Request raised by the body, for the desk to apply.
    pub request: Option<PanelRequest>,
}

pub struct PanelView {
    id: PanelId,
    content: Box<dyn PanelContent>,
    drag: DragController,
    /// Expanded size from the last layout. `None` while closed.
    measured: Option<Size>,
    /// Minimized flag seen by the last layout. `None` while closed, so the
    /// next layout after opening counts as a transition.
    laid_out_minimized: Option<bool>,
}

impl PanelView {
    pub fn new(id: PanelId, content: Box<dyn PanelContent>, interactive: InteractiveRoles) -> Self {
        Self {
            id,
            content,
            drag: DragController::new(id, interactive),
            measured: None,
            laid_out_minimized: None,
        }
    }

    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn set_interactive_roles(&mut self, interactive: InteractiveRoles) {
        self.drag.set_interactive_roles(interactive);
    }

    /// Expanded size from the last layout, if the panel is open.
    pub fn measured_size(&self) -> Option<Size> {
        self.measured
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_dragging()
    }

    pub fn wants_global_pointer(&self) -> bool {
        self.drag.wants_global_pointer()
    }

    /// Frontmost among open panels. Purely visual.
    pub fn is_active(&self, registry: &PanelRegistry) -> bool {
        let state = registry.get_state(self.id);
        if !state.is_open {
            return false;
        }
        let max = registry
            .open_panel_ids()
            .iter()
            .map(|&id| registry.get_state(id).z_index)
            .max();
        max == Some(state.z_index)
    }

    pub fn dialog_semantics(&self, registry: &PanelRegistry) -> Option<DialogSemantics> {
        let state = registry.get_state(self.id);
        state.is_open.then(|| DialogSemantics {
            role: DialogRole::Dialog,
            modal: !state.is_minimized,
            labelled_by: self.id.title_element_id(),
        })
    }

    /// Content size plus header, capped so the panel fits between the
    /// vertical margins. The body shrinks; the header never does.
    fn measure(&self, viewport: Size, theme: &PanelTheme) -> Size {
        let body = self.content.preferred_size(viewport);
        let header = theme.header_height();
        let max_height = viewport
            .height
            .saturating_sub(theme.margin().saturating_mul(2))
            .max(header);
        Size::new(body.width, body.height.saturating_add(header).min(max_height))
    }

    /// Size on screen: a minimized panel is only as tall as its header.
    fn effective_size(&self, state: &PanelState, theme: &PanelTheme) -> Option<Size> {
        let size = self.measured?;
        Some(if state.is_minimized {
            Size::new(size.width, theme.header_height())
        } else {
            size
        })
    }

    fn chrome(&self, state: &PanelState, theme: &PanelTheme) -> Option<Chrome> {
        if !state.is_open {
            return None;
        }
        let size = self.effective_size(state, theme)?;
        Some(Chrome::compute(self.id, state.position, size, state.is_minimized, theme))
    }

    /// On-screen rect, or `None` when closed or not yet laid out.
    pub fn frame(&self, registry: &PanelRegistry, theme: &PanelTheme) -> Option<Rect> {
        self.chrome(&registry.get_state(self.id), theme).map(|c| c.frame)
    }

    // ------------------------------------------------------------------
    // Layout and the viewport-safety pass
    // ------------------------------------------------------------------

    /// Measure and, when the panel just opened, changed minimized state or
    /// re-measured while expanded, pull it back inside the viewport.
    pub fn layout(&mut self, registry: &mut PanelRegistry, viewport: Size, theme: &PanelTheme) {
        let state = registry.get_state(self.id);
        if !state.is_open {
            self.drag.teardown();
            self.measured = None;
            self.laid_out_minimized = None;
            return;
        }

        let size = self.measure(viewport, theme);
        let remeasured = self.measured != Some(size);
        self.measured = Some(size);

        let transitioned = self.laid_out_minimized != Some(state.is_minimized);
        self.laid_out_minimized = Some(state.is_minimized);

        if transitioned || (remeasured && !state.is_minimized) {
            self.keep_in_viewport(registry, viewport, theme);
        }
    }

    /// Viewport changed. Only open, expanded panels react.
    pub fn on_resize(&mut self, registry: &mut PanelRegistry, viewport: Size, theme: &PanelTheme) {
        let state = registry.get_state(self.id);
        if !state.is_open || state.is_minimized {
            return;
        }
        self.measured = Some(self.measure(viewport, theme));
        self.keep_in_viewport(registry, viewport, theme);
    }

    fn keep_in_viewport(&self, registry: &mut PanelRegistry, viewport: Size, theme: &PanelTheme) {
        let state = registry.get_state(self.id);
        let Some(size) = self.effective_size(&state, theme) else {
            return;
        };
        let clamped = geometry::clamp_to_viewport(state.position, size, viewport, theme.margin());
        if clamped != state.position {
            debug!(target: "panels", panel = %self.id, from = ?state.position, to = ?clamped, "pulled into viewport");
            registry.set_position(self.id, clamped);
        }
    }

    // ------------------------------------------------------------------
    // Pointer
    // ------------------------------------------------------------------

    fn path_for(&self, part: ChromePart, point: Point) -> HitPath {
        match part {
            ChromePart::CloseButton | ChromePart::MinimizeButton => {
                HitPath::new([ElementRole::Button]).within([ElementRole::Header, ElementRole::Panel])
            }
            ChromePart::Title => {
                HitPath::new([ElementRole::Title, ElementRole::Header, ElementRole::Panel])
            }
            ChromePart::Header => HitPath::new([ElementRole::Header, ElementRole::Panel]),
            ChromePart::Body(body) => self
                .content
                .hit_path(point - body.origin)
                .within([ElementRole::Body, ElementRole::Panel]),
        }
    }

    /// Roles under `point`, or `None` when the panel is closed or missed.
    pub fn hit_test(&self, registry: &PanelRegistry, theme: &PanelTheme, point: Point) -> Option<HitPath> {
        let chrome = self.chrome(&registry.get_state(self.id), theme)?;
        let part = chrome.part_at(point)?;
        Some(self.path_for(part, point))
    }

    /// Press on this panel. Any press raises it; a press on the header then
    /// tries to start a drag, and chrome buttons act when it doesn't.
    pub fn pointer_down(
        &mut self,
        registry: &mut PanelRegistry,
        theme: &PanelTheme,
        point: Point,
    ) -> PressOutcome {
        let state = registry.get_state(self.id);
        let Some(chrome) = self.chrome(&state, theme) else {
            return PressOutcome::default();
        };
        let Some(part) = chrome.part_at(point) else {
            return PressOutcome::default();
        };

        registry.bring_to_front(self.id);

        if let ChromePart::Body(body) = part {
            return PressOutcome {
                drag_started: false,
                request: self.content.on_pointer_down(point - body.origin),
            };
        }

        let path = self.path_for(part, point);
        let drag_started = self.drag.on_pointer_down(point, &path, Some(chrome.frame));
        if !drag_started {
            match part {
                ChromePart::CloseButton => {
                    self.drag.teardown();
                    registry.close(self.id);
                }
                ChromePart::MinimizeButton if state.is_minimized => registry.restore(self.id),
                ChromePart::MinimizeButton => registry.minimize(self.id),
                _ => {}
            }
        }
        PressOutcome {
            drag_started,
            request: None,
        }
    }

    /// Window-level pointer move. Only acts while dragging.
    pub fn pointer_move(
        &mut self,
        registry: &mut PanelRegistry,
        viewport: Size,
        theme: &PanelTheme,
        point: Point,
    ) {
        if !self.drag.wants_global_pointer() {
            return;
        }
        let state = registry.get_state(self.id);
        let size = if state.is_open {
            self.effective_size(&state, theme)
        } else {
            None
        };
        let Some(size) = size else {
            self.drag.teardown();
            return;
        };
        if let Some(position) = self.drag.on_pointer_move(point, size, viewport, theme.margin()) {
            if position != state.position {
                registry.set_position(self.id, position);
            }
        }
    }

    /// Window-level pointer release.
    pub fn pointer_up(&mut self) {
        self.drag.on_pointer_up();
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Draw the panel. Closed panels draw nothing.
    pub fn render(&self, scene: &mut Scene, registry: &PanelRegistry, theme: &PanelTheme) {
        let state = registry.get_state(self.id);
        let Some(chrome) = self.chrome(&state, theme) else {
            return;
        };
        let active = self.is_active(registry);
        let radius = theme.chrome.corner_radius;
        let frame = RoundedRect::from_rect(chrome.frame.to_kurbo(), radius);

        let (offset, shadow) = if active {
            (theme.shadow.active_offset, theme.shadow.active)
        } else {
            (theme.shadow.inactive_offset, theme.shadow.inactive)
        };
        scene.fill(
            Fill::NonZero,
            Affine::translate((0.0, offset)),
            color(shadow),
            None,
            &frame,
        );
        scene.fill(Fill::NonZero, Affine::IDENTITY, color(theme.colors.panel), None, &frame);

        let header_radii = if chrome.body.is_some() {
            (radius, radius, 0.0, 0.0)
        } else {
            (radius, radius, radius, radius)
        };
        let header = RoundedRect::from_rect(chrome.header.to_kurbo(), header_radii);
        scene.fill(Fill::NonZero, Affine::IDENTITY, color(theme.colors.header), None, &header);

        glyphs::draw_text(
            scene,
            chrome.title.origin.x as f64,
            chrome.title.bottom() as f64,
            self.id.title(),
            color(theme.colors.title),
            theme.chrome.title_size,
        );

        self.draw_buttons(scene, &chrome, state.is_minimized, theme);

        if let Some(body) = chrome.body {
            self.content.render(scene, body, theme);
        }

        let border = if active {
            theme.colors.border_active
        } else {
            theme.colors.border
        };
        scene.stroke(
            &Stroke::new(theme.chrome.border_width),
            Affine::IDENTITY,
            color(border),
            None,
            &frame,
        );
    }

    fn draw_buttons(&self, scene: &mut Scene, chrome: &Chrome, minimized: bool, theme: &PanelTheme) {
        let icon = color(theme.colors.icon);
        let stroke = Stroke::new(1.5);
        let inset = theme.chrome.button_size as f64 / 4.0;

        // Minimize draws a bar; restore draws a box.
        let m = chrome.minimize.to_kurbo().inset(-inset);
        if minimized {
            scene.stroke(&stroke, Affine::IDENTITY, icon, None, &m);
        } else {
            let y = m.y1;
            scene.stroke(&stroke, Affine::IDENTITY, icon, None, &Line::new((m.x0, y), (m.x1, y)));
        }

        let c = chrome.close.to_kurbo().inset(-inset);
        scene.stroke(&stroke, Affine::IDENTITY, icon, None, &Line::new((c.x0, c.y0), (c.x1, c.y1)));
        scene.stroke(&stroke, Affine::IDENTITY, icon, None, &Line::new((c.x0, c.y1), (c.x1, c.y0)));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::placeholder_for;
    use crate::storage::MemoryLayoutStore;

    const VIEWPORT: Size = Size::new(1000, 800);

    // CharacterSheet with the default theme: 672 x 520 at (100, 100).
    // Header y 100..140; minimize 712..736, close 740..764 (y 108..132).
    const HEADER_SPOT: Point = Point::new(400, 110);
    const CLOSE_SPOT: Point = Point::new(750, 120);
    const MINIMIZE_SPOT: Point = Point::new(720, 120);
    const BODY_SPOT: Point = Point::new(600, 500);

    fn setup() -> (PanelRegistry, PanelView, PanelTheme) {
        let registry = PanelRegistry::new(Box::new(MemoryLayoutStore::new()), VIEWPORT);
        let theme = PanelTheme::default();
        let view = PanelView::new(
            PanelId::CharacterSheet,
            placeholder_for(PanelId::CharacterSheet),
            theme.drag.interactive.clone(),
        );
        (registry, view, theme)
    }

    fn open(registry: &mut PanelRegistry, view: &mut PanelView, theme: &PanelTheme) {
        registry.open(view.id());
        view.layout(registry, VIEWPORT, theme);
    }

    #[test]
    fn closed_view_has_no_frame_and_no_hits() {
        let (mut reg, mut view, theme) = setup();
        view.layout(&mut reg, VIEWPORT, &theme);
        assert_eq!(view.frame(&reg, &theme), None);
        assert_eq!(view.hit_test(&reg, &theme, HEADER_SPOT), None);
        assert_eq!(view.dialog_semantics(&reg), None);
        assert!(!view.is_active(&reg));
    }

    #[test]
    fn frame_follows_measurement() {
        let (mut reg, mut view, theme) = setup();
        open(&mut reg, &mut view, &theme);
        assert_eq!(view.frame(&reg, &theme), Some(Rect::from_xywh(100, 100, 672, 520)));
    }

    #[test]
    fn chrome_hit_paths() {
        let (mut reg, mut view, theme) = setup();
        open(&mut reg, &mut view, &theme);
        let roles = |p| view.hit_test(&reg, &theme, p).map(|h| h.roles().to_vec());

        assert_eq!(
            roles(CLOSE_SPOT),
            Some(vec![ElementRole::Button, ElementRole::Header, ElementRole::Panel])
        );
        assert_eq!(roles(HEADER_SPOT), Some(vec![ElementRole::Header, ElementRole::Panel]));
        assert_eq!(
            roles(Point::new(120, 120)),
            Some(vec![ElementRole::Title, ElementRole::Header, ElementRole::Panel])
        );
        assert_eq!(roles(BODY_SPOT), Some(vec![ElementRole::Body, ElementRole::Panel]));
        assert_eq!(roles(Point::new(99, 120)), None);
    }

    #[test]
    fn header_press_raises_then_drags() {
        let (mut reg, mut view, theme) = setup();
        open(&mut reg, &mut view, &theme);
        reg.open(PanelId::GmChat);
        assert!(!view.is_active(&reg));

        let outcome = view.pointer_down(&mut reg, &theme, HEADER_SPOT);
        assert!(outcome.drag_started);
        assert!(view.is_active(&reg));
        assert_eq!(reg.front(), Some(PanelId::CharacterSheet));

        view.pointer_move(&mut reg, VIEWPORT, &theme, Point::new(450, 160));
        assert_eq!(reg.get_state(PanelId::CharacterSheet).position, Point::new(150, 150));

        view.pointer_up();
        assert!(!view.wants_global_pointer());
    }

    #[test]
    fn close_button_raises_then_closes_without_dragging() {
        let (mut reg, mut view, theme) = setup();
        open(&mut reg, &mut view, &theme);
        reg.open(PanelId::DiceRoller);

        let outcome = view.pointer_down(&mut reg, &theme, CLOSE_SPOT);
        assert!(!outcome.drag_started);
        assert!(!view.is_dragging());
        assert!(!reg.is_open(PanelId::CharacterSheet));
        assert_eq!(reg.stack(), &[PanelId::DiceRoller]);
    }

    #[test]
    fn minimize_button_toggles() {
        let (mut reg, mut view, theme) = setup();
        open(&mut reg, &mut view, &theme);

        view.pointer_down(&mut reg, &theme, MINIMIZE_SPOT);
        assert!(reg.get_state(PanelId::CharacterSheet).is_minimized);
        view.layout(&mut reg, VIEWPORT, &theme);
        assert_eq!(view.frame(&reg, &theme).map(|r| r.size.height), Some(40));
        assert_eq!(view.hit_test(&reg, &theme, BODY_SPOT), None);

        view.pointer_down(&mut reg, &theme, MINIMIZE_SPOT);
        assert!(!reg.get_state(PanelId::CharacterSheet).is_minimized);
    }

    #[test]
    fn body_press_raises_without_drag() {
        let (mut reg, mut view, theme) = setup();
        open(&mut reg, &mut view, &theme);
        reg.open(PanelId::ShipManifest);

        let outcome = view.pointer_down(&mut reg, &theme, BODY_SPOT);
        assert_eq!(outcome, PressOutcome::default());
        assert_eq!(reg.front(), Some(PanelId::CharacterSheet));
        assert!(!view.is_dragging());
    }

    #[test]
    fn opening_offscreen_pulls_back_in() {
        let (mut reg, mut view, theme) = setup();
        reg.set_position(PanelId::CharacterSheet, Point::new(900, 700));
        open(&mut reg, &mut view, &theme);
        assert_eq!(
            reg.get_state(PanelId::CharacterSheet).position,
            Point::new(1000 - 672 - 24, 800 - 520 - 24)
        );
    }

    #[test]
    fn resize_pulls_back_only_expanded_panels() {
        let (mut reg, mut view, theme) = setup();
        reg.set_position(PanelId::CharacterSheet, Point::new(300, 250));
        open(&mut reg, &mut view, &theme);
        assert_eq!(reg.get_state(PanelId::CharacterSheet).position, Point::new(300, 250));

        let small = Size::new(900, 700);
        view.on_resize(&mut reg, small, &theme);
        assert_eq!(
            reg.get_state(PanelId::CharacterSheet).position,
            Point::new(900 - 672 - 24, 700 - 520 - 24)
        );

        reg.minimize(PanelId::CharacterSheet);
        view.layout(&mut reg, small, &theme);
        let before = reg.get_state(PanelId::CharacterSheet).position;
        view.on_resize(&mut reg, Size::new(300, 200), &theme);
        assert_eq!(reg.get_state(PanelId::CharacterSheet).position, before);
    }

    #[test]
    fn tall_panel_fits_a_short_viewport() {
        let (mut reg, mut view, theme) = setup();
        let short = Size::new(1280, 400);
        reg.open(PanelId::CharacterSheet);
        view.layout(&mut reg, short, &theme);

        // 520 tall wants more than 400 - 2 * 24; the body gives way.
        let frame = view.frame(&reg, &theme).expect("open panel has a frame");
        assert_eq!(frame, Rect::from_xywh(100, 24, 672, 352));
        assert_eq!(frame.bottom(), 400 - 24);
        assert_eq!(view.hit_test(&reg, &theme, Point::new(300, 390)), None);

        // Never shorter than the header, even in a tiny window.
        view.on_resize(&mut reg, Size::new(1280, 60), &theme);
        assert_eq!(view.measured_size(), Some(Size::new(672, 40)));
    }

    #[test]
    fn closing_mid_drag_tears_down() {
        let (mut reg, mut view, theme) = setup();
        open(&mut reg, &mut view, &theme);
        view.pointer_down(&mut reg, &theme, HEADER_SPOT);
        assert!(view.wants_global_pointer());

        reg.close(PanelId::CharacterSheet);
        view.layout(&mut reg, VIEWPORT, &theme);
        assert!(!view.wants_global_pointer());
    }

    #[test]
    fn dialog_is_modal_only_when_expanded() {
        let (mut reg, mut view, theme) = setup();
        open(&mut reg, &mut view, &theme);
        let semantics = view.dialog_semantics(&reg).expect("open panel has semantics");
        assert_eq!(semantics.role, DialogRole::Dialog);
        assert!(semantics.modal);
        assert_eq!(semantics.labelled_by, "panel-title-character-sheet");

        reg.minimize(PanelId::CharacterSheet);
        assert!(!view.dialog_semantics(&reg).map(|s| s.modal).unwrap_or(true));
    }
}
