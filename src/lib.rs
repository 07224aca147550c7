//! mothership-dock: dockable floating panels for the Mothership companion.
//!
//! Tool panels (dice roller, character sheet, ship manifest, GM chat) float
//! over the main view. They can be opened, closed, raised, dragged within
//! the viewport and minimized, and their position and minimized state
//! survive restarts.
//!
//! Leaf first: [`geometry`] → [`state_machine`] (drag) and [`registry`]
//! (state + [`storage`]) → [`view`] → [`desk`].

pub mod config_watcher;
pub mod content;
pub mod desk;
pub mod geometry;
pub mod glyphs;
pub mod hit;
pub mod logging;
pub mod panel_id;
pub mod paths;
pub mod registry;
pub mod state_machine;
pub mod storage;
pub mod theme;
pub mod view;

pub use desk::Desk;
pub use geometry::{Point, Rect, Size};
pub use panel_id::PanelId;
pub use registry::{PanelRegistry, PanelState};
