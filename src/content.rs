//! Panel bodies.
//!
//! The windowing core only needs three things from whatever lives inside a
//! panel: how big it wants to be, how to draw it, and which roles sit under
//! a given point. Bodies may ask the desk to open, close or focus panels
//! through [`PanelRequest`]; they never touch position or stacking.
//!
//! The bodies shipped here are placeholders standing in for the real
//! character sheet, manifest, dice and chat UIs.

use vello::Scene;
use vello::kurbo::{Affine, RoundedRect, Stroke};
use vello::peniko::Fill;

use crate::geometry::{Point, Rect, Size};
use crate::glyphs;
use crate::hit::{ElementRole, HitPath};
use crate::panel_id::PanelId;
use crate::theme::{PanelTheme, color};

/// Something a panel body asks the desk to do on its behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelRequest {
    /// Close the panel hosting this body.
    Close,
    /// Raise the panel hosting this body.
    Focus,
    /// Open (and raise) another panel.
    Open(PanelId),
}

/// Content mounted inside a panel body.
pub trait PanelContent {
    /// Body size for the given viewport. The header is added by the view.
    fn preferred_size(&self, viewport: Size) -> Size;

    /// Draw into `body`, given in viewport space. `body` may be shorter
    /// than the preferred height when the viewport is short; nothing may be
    /// drawn below its bottom edge.
    fn render(&self, scene: &mut Scene, body: Rect, theme: &PanelTheme);

    /// Roles under `local` (relative to the body's top-left), innermost
    /// first. Empty when nothing but the body itself is hit.
    fn hit_path(&self, local: Point) -> HitPath;

    /// Press at `local`. Runs after the panel has been raised.
    fn on_pointer_down(&mut self, local: Point) -> Option<PanelRequest>;
}

// ---------------------------------------------------------------------------
// Placeholder bodies
// ---------------------------------------------------------------------------

const BODY_PADDING: i32 = 16;
const LINE_SPACING: i32 = 22;
const TEXT_SIZE: f64 = 14.0;
const CONTROL_HEIGHT: i32 = 28;
/// Baseline of a text line relative to its row top.
const TEXT_BASELINE: i32 = 14;

/// A widget in a placeholder body.
#[derive(Debug, Clone)]
struct Control {
    /// Body-local bounds.
    bounds: Rect,
    role: ElementRole,
    label: &'static str,
    request: Option<PanelRequest>,
}

/// Static text plus a row of controls.
pub struct PlaceholderBody {
    max_width: i32,
    height: i32,
    lines: Vec<&'static str>,
    controls: Vec<Control>,
}

impl PlaceholderBody {
    fn new(max_width: i32, height: i32, lines: Vec<&'static str>) -> Self {
        Self {
            max_width,
            height,
            lines,
            controls: Vec::new(),
        }
    }

    /// Append a control on the row below the text.
    fn with_control(
        mut self,
        role: ElementRole,
        label: &'static str,
        width: i32,
        request: Option<PanelRequest>,
    ) -> Self {
        let x = self
            .controls
            .last()
            .map(|c| c.bounds.right() + 8)
            .unwrap_or(BODY_PADDING);
        let y = BODY_PADDING + self.lines.len() as i32 * LINE_SPACING + 8;
        self.controls.push(Control {
            bounds: Rect::from_xywh(x, y, width, CONTROL_HEIGHT),
            role,
            label,
            request,
        });
        self
    }

    fn text_line_at(&self, local: Point) -> Option<usize> {
        let row = (local.y - BODY_PADDING) / LINE_SPACING;
        if local.y < BODY_PADDING || row as usize >= self.lines.len() {
            return None;
        }
        let line = self.lines[row as usize];
        let width = glyphs::text_width(line, TEXT_SIZE) as i32;
        (local.x >= BODY_PADDING && local.x < BODY_PADDING + width).then_some(row as usize)
    }
}

impl PanelContent for PlaceholderBody {
    fn preferred_size(&self, viewport: Size) -> Size {
        Size::new(self.max_width.min(viewport.width), self.height)
    }

    fn render(&self, scene: &mut Scene, body: Rect, theme: &PanelTheme) {
        let ink = color(theme.colors.body_text);
        let x = (body.origin.x + BODY_PADDING) as f64;

        for (i, line) in self.lines.iter().enumerate() {
            let top = body.origin.y + BODY_PADDING + i as i32 * LINE_SPACING;
            if top + LINE_SPACING > body.bottom() {
                break;
            }
            glyphs::draw_text(scene, x, (top + TEXT_BASELINE) as f64, line, ink, TEXT_SIZE);
        }

        for control in self.controls.iter().filter(|c| c.bounds.bottom() <= body.size.height) {
            let r = Rect::new(body.origin + control.bounds.origin, control.bounds.size).to_kurbo();
            let shape = RoundedRect::from_rect(r, 4.0);
            if control.role == ElementRole::Button {
                scene.fill(Fill::NonZero, Affine::IDENTITY, color(theme.colors.header), None, &shape);
            }
            scene.stroke(
                &Stroke::new(theme.chrome.border_width),
                Affine::IDENTITY,
                color(theme.colors.border),
                None,
                &shape,
            );
            let text_w = glyphs::text_width(control.label, TEXT_SIZE);
            let tx = r.x0 + (r.width() - text_w) / 2.0;
            let ty = r.y0 + (r.height() + glyphs::line_height(TEXT_SIZE)) / 2.0;
            glyphs::draw_text(scene, tx, ty, control.label, ink, TEXT_SIZE);
        }
    }

    fn hit_path(&self, local: Point) -> HitPath {
        if let Some(control) = self.controls.iter().find(|c| c.bounds.contains(local)) {
            return HitPath::new([ElementRole::Text, control.role]);
        }
        if self.text_line_at(local).is_some() {
            return HitPath::new([ElementRole::Text]);
        }
        HitPath::default()
    }

    fn on_pointer_down(&mut self, local: Point) -> Option<PanelRequest> {
        let control = self.controls.iter().find(|c| c.bounds.contains(local))?;
        control.request
    }
}

/// The stand-in body for `id`.
pub fn placeholder_for(id: PanelId) -> Box<dyn PanelContent> {
    let body = match id {
        PanelId::DiceRoller => PlaceholderBody::new(448, 280, vec![
            "Formula: 2d6+1",
            "Last roll: -",
        ])
        .with_control(ElementRole::Input, "2d6+1", 120, None)
        .with_control(ElementRole::Button, "ROLL", 80, None),
        PanelId::CharacterSheet => PlaceholderBody::new(672, 480, vec![
            "Name",
            "Career",
            "Characteristics",
            "Skills",
        ])
        .with_control(ElementRole::Input, "Name", 200, Some(PanelRequest::Focus))
        .with_control(ElementRole::Select, "Career", 160, None),
        PanelId::ShipManifest => PlaceholderBody::new(1024, 520, vec![
            "Hull",
            "Drives",
            "Crew",
            "Cargo",
        ])
        .with_control(ElementRole::Button, "DONE", 80, Some(PanelRequest::Close)),
        PanelId::GmChat => PlaceholderBody::new(576, 420, vec![
            "GM: Make a pilot check.",
        ])
        .with_control(ElementRole::Textarea, "Message", 240, None)
        .with_control(
            ElementRole::Button,
            "ROLL CHECK",
            120,
            Some(PanelRequest::Open(PanelId::DiceRoller)),
        ),
    };
    Box::new(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_width_never_exceeds_viewport() {
        let ship = placeholder_for(PanelId::ShipManifest);
        assert_eq!(ship.preferred_size(Size::new(1280, 800)).width, 1024);
        assert_eq!(ship.preferred_size(Size::new(800, 600)).width, 800);
    }

    #[test]
    fn controls_hit_as_interactive_roles() {
        let chat = placeholder_for(PanelId::GmChat);
        // Second control starts after the 240px textarea and an 8px gap.
        let path = chat.hit_path(Point::new(16 + 240 + 8 + 10, 16 + 22 + 8 + 5));
        assert_eq!(path.roles(), &[ElementRole::Text, ElementRole::Button]);
    }

    #[test]
    fn text_and_empty_space_hit_differently() {
        let dice = placeholder_for(PanelId::DiceRoller);
        assert_eq!(dice.hit_path(Point::new(20, 20)).roles(), &[ElementRole::Text]);
        assert!(dice.hit_path(Point::new(400, 250)).roles().is_empty());
    }

    #[test]
    fn gm_chat_requests_dice_roller() {
        let mut chat = placeholder_for(PanelId::GmChat);
        let request = chat.on_pointer_down(Point::new(16 + 248 + 10, 16 + 22 + 8 + 5));
        assert_eq!(request, Some(PanelRequest::Open(PanelId::DiceRoller)));
        assert_eq!(chat.on_pointer_down(Point::new(400, 300)), None);
    }
}
