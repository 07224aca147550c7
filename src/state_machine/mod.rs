//! State machines driving panel interaction.

pub mod drag_sm;

pub use drag_sm::{DragController, DragEvent};
