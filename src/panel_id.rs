//! The closed set of dockable panels.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Point, Size};

/// Identity of a dockable panel. Fixed at compile time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum PanelId {
    DiceRoller,
    CharacterSheet,
    ShipManifest,
    GmChat,
}

impl PanelId {
    pub const ALL: [PanelId; 4] = [
        PanelId::DiceRoller,
        PanelId::CharacterSheet,
        PanelId::ShipManifest,
        PanelId::GmChat,
    ];

    /// Stable slug used in storage keys, element ids and on the command line.
    pub fn slug(self) -> &'static str {
        match self {
            PanelId::DiceRoller => "dice-roller",
            PanelId::CharacterSheet => "character-sheet",
            PanelId::ShipManifest => "ship-manifest",
            PanelId::GmChat => "gm-chat",
        }
    }

    /// Header title.
    pub fn title(self) -> &'static str {
        match self {
            PanelId::DiceRoller => "Dice Roller",
            PanelId::CharacterSheet => "Character Sheet",
            PanelId::ShipManifest => "Ship Manifest",
            PanelId::GmChat => "GM Chat",
        }
    }

    /// Storage key for this panel's persisted layout.
    pub fn storage_key(self) -> String {
        format!("panel-state-{}", self.slug())
    }

    /// Id of the title element, referenced by the dialog's `labelled_by`.
    pub fn title_element_id(self) -> String {
        format!("panel-title-{}", self.slug())
    }

    /// Tool panels light up the "Tools" navigation entry; the GM chat does not.
    pub fn is_tool(self) -> bool {
        !matches!(self, PanelId::GmChat)
    }

    /// Position used when nothing valid is persisted.
    pub fn default_position(self, viewport: Size) -> Point {
        match self {
            PanelId::DiceRoller => Point::new(viewport.width / 2 - 224, 100),
            PanelId::CharacterSheet => Point::new(100, 100),
            PanelId::ShipManifest => Point::new(50, 50),
            PanelId::GmChat => Point::new((viewport.width - 420).max(24), 120),
        }
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
