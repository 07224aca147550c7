//! Theme tokens for panel chrome and panel behaviour.
//!
//! Every visual constant (colors, chrome sizes, shadows) plus the two
//! behavioural knobs (viewport margin, drag-blocking roles) live in one
//! `PanelTheme` that round-trips through TOML. Sections are
//! `#[serde(default)]` so a partial file only overrides what it names.

use tracing::warn;
use vello::peniko::Color;

use crate::hit::InteractiveRoles;

/// Largest accepted viewport margin. Values from the theme file or the
/// command line are pulled into `0..=MAX_MARGIN`.
pub const MAX_MARGIN: i32 = 512;

/// Root theme container.
#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct PanelTheme {
    pub viewport: ViewportTokens,
    pub chrome: ChromeTokens,
    pub colors: ColorTokens,
    pub shadow: ShadowTokens,
    pub drag: DragTokens,
}

// --- Sub-structs ---

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ViewportTokens {
    /// Gap kept between a panel and every viewport edge.
    pub margin: i32,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ChromeTokens {
    pub header_height: i32,
    pub corner_radius: f64,
    pub border_width: f64,
    pub button_size: i32,
    pub button_gap: i32,
    pub title_size: f64,
    pub title_inset: i32,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ColorTokens {
    pub background: [f32; 4],
    pub panel: [f32; 4],
    pub header: [f32; 4],
    pub border: [f32; 4],
    pub border_active: [f32; 4],
    pub title: [f32; 4],
    pub icon: [f32; 4],
    pub body_text: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct ShadowTokens {
    pub active_offset: f64,
    pub inactive_offset: f64,
    pub active: [f32; 4],
    pub inactive: [f32; 4],
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize, serde::Serialize)]
#[serde(default)]
pub struct DragTokens {
    /// A press whose target is inside one of these roles never starts a drag.
    pub interactive: InteractiveRoles,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for PanelTheme {
    fn default() -> Self {
        Self {
            viewport: ViewportTokens::default(),
            chrome: ChromeTokens::default(),
            colors: ColorTokens::default(),
            shadow: ShadowTokens::default(),
            drag: DragTokens::default(),
        }
    }
}

impl Default for ViewportTokens {
    fn default() -> Self {
        Self { margin: 24 }
    }
}

impl Default for ChromeTokens {
    fn default() -> Self {
        Self {
            header_height: 40,
            corner_radius: 8.0,
            border_width: 1.0,
            button_size: 24,
            button_gap: 4,
            title_size: 14.0,
            title_inset: 16,
        }
    }
}

impl Default for ColorTokens {
    fn default() -> Self {
        Self {
            background: [0.04, 0.04, 0.05, 1.0],
            panel: [0.07, 0.07, 0.08, 1.0],
            header: [0.0, 0.0, 0.0, 0.30],
            border: [0.96, 0.77, 0.18, 0.80],
            border_active: [0.96, 0.77, 0.18, 1.0],
            title: [0.96, 0.77, 0.18, 1.0],
            icon: [0.90, 0.90, 0.88, 1.0],
            body_text: [0.90, 0.90, 0.88, 0.75],
        }
    }
}

impl Default for ShadowTokens {
    fn default() -> Self {
        Self {
            active_offset: 12.0,
            inactive_offset: 6.0,
            active: [0.96, 0.77, 0.18, 0.20],
            inactive: [0.0, 0.0, 0.0, 0.50],
        }
    }
}

impl Default for DragTokens {
    fn default() -> Self {
        Self {
            interactive: InteractiveRoles::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Convert a token color to a vello `Color`.
pub fn color(rgba: [f32; 4]) -> Color {
    Color::new(rgba)
}

impl PanelTheme {
    pub fn margin(&self) -> i32 {
        self.viewport.margin
    }

    pub fn header_height(&self) -> i32 {
        self.chrome.header_height
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        let mut theme: Self = toml::from_str(s)?;
        theme.set_margin(theme.viewport.margin);
        Ok(theme)
    }

    /// Set the viewport margin, pulled into `0..=MAX_MARGIN`.
    pub fn set_margin(&mut self, margin: i32) {
        let clamped = margin.clamp(0, MAX_MARGIN);
        if clamped != margin {
            warn!(target: "theme", requested = margin, clamped, "viewport margin out of range");
        }
        self.viewport.margin = clamped;
    }
}

// ---------------------------------------------------------------------------
// Default TOML template
// ---------------------------------------------------------------------------

/// Commented default theme file. Values match the compiled defaults, so
/// writing it on first launch changes nothing.
pub fn default_toml_content() -> String {
    r#"# mothership-dock panel theme. Edit and save: changes apply immediately.
# Missing values use compiled defaults. Delete a line to reset it.

[viewport]
margin = 24             # Gap between panels and the window edges (px)

[chrome]
header_height = 40      # Header strip height; a minimized panel is this tall
corner_radius = 8.0
border_width = 1.0
button_size = 24        # Minimize / close buttons
button_gap = 4
title_size = 14.0
title_inset = 16

[colors]
# RGBA, each channel 0.0-1.0
background = [0.04, 0.04, 0.05, 1.0]
panel = [0.07, 0.07, 0.08, 1.0]
header = [0.0, 0.0, 0.0, 0.30]
border = [0.96, 0.77, 0.18, 0.80]
border_active = [0.96, 0.77, 0.18, 1.0]
title = [0.96, 0.77, 0.18, 1.0]
icon = [0.90, 0.90, 0.88, 1.0]
body_text = [0.90, 0.90, 0.88, 0.75]

[shadow]
active_offset = 12.0    # Frontmost panel
inactive_offset = 6.0
active = [0.96, 0.77, 0.18, 0.20]
inactive = [0.0, 0.0, 0.0, 0.50]

[drag]
# Pressing inside any of these never starts a drag.
interactive = ["button", "link", "input", "select", "textarea"]
"#
    .to_string()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::ElementRole;

    #[test]
    fn default_template_matches_compiled_defaults() {
        let parsed = PanelTheme::from_toml(&default_toml_content()).expect("template parses");
        assert_eq!(parsed, PanelTheme::default());
    }

    #[test]
    fn theme_toml_roundtrip() {
        let original = PanelTheme::default();
        let parsed = PanelTheme::from_toml(&original.to_toml()).expect("roundtrip parse failed");
        assert_eq!(parsed, original);
    }

    #[test]
    fn partial_toml_overrides_only_named_values() {
        let partial = r#"
[viewport]
margin = 8

[drag]
interactive = ["button"]
"#;
        let theme = PanelTheme::from_toml(partial).expect("partial parse failed");
        assert_eq!(theme.margin(), 8);
        assert_eq!(theme.drag.interactive.0, vec![ElementRole::Button]);
        assert_eq!(theme.header_height(), 40);
        assert_eq!(theme.colors, ColorTokens::default());
    }

    #[test]
    fn out_of_range_margin_is_pulled_into_range() {
        let negative = PanelTheme::from_toml("[viewport]\nmargin = -10").expect("parses");
        assert_eq!(negative.margin(), 0);

        let huge = PanelTheme::from_toml(&format!("[viewport]\nmargin = {}", i32::MAX / 2 + 1))
            .expect("parses");
        assert_eq!(huge.margin(), MAX_MARGIN);

        let mut theme = PanelTheme::default();
        theme.set_margin(40);
        assert_eq!(theme.margin(), 40);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(PanelTheme::from_toml("this is not [[ valid toml").is_err());
        assert!(PanelTheme::from_toml("[drag]\ninteractive = [\"dial\"]").is_err());
    }
}
