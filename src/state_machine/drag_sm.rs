//! Drag state machine for one panel.
//!
//! ```text
//! Idle ── Grab ──→ Dragging { offset }   [entry: capture global pointer]
//!  ↑                    │ Move → emit clamped position
//!  └──── Release ───────┘                [exit: release global pointer]
//! ```
//!
//! While `Dragging`, the owner routes every pointer-move and pointer-up in
//! the window here, not just those over the panel. That routing is the
//! native form of attaching window-level listeners for the duration of a
//! drag; [`DragController::wants_global_pointer`] tells the owner when to
//! do it.

use statig::prelude::*;
use tracing::debug;

use crate::geometry::{self, Point, Rect, Size};
use crate::hit::{HitPath, InteractiveRoles};
use crate::panel_id::PanelId;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Events dispatched to the drag state machine.
#[derive(Debug, Clone)]
pub enum DragEvent {
    /// Pointer pressed on a draggable part of the panel. `panel` is the
    /// panel's measured rect at that moment.
    Grab { pointer: Point, panel: Rect },
    /// Pointer moved anywhere in the window.
    Move {
        pointer: Point,
        panel_size: Size,
        viewport: Size,
        margin: i32,
    },
    /// Pointer released anywhere, or the panel went away mid-drag.
    Release,
}

/// Results written by the handlers for the caller to act on.
#[derive(Debug, Clone, Default)]
pub struct DragOutput {
    /// A drag started; the caller should suppress default press handling.
    pub grabbed: bool,
    /// New clamped top-left for the panel.
    pub position: Option<Point>,
}

// ---------------------------------------------------------------------------
// Shared storage
// ---------------------------------------------------------------------------

/// Shared storage for the drag state machine.
pub struct DragMachine {
    panel: PanelId,
}

impl DragMachine {
    pub fn new(panel: PanelId) -> Self {
        Self { panel }
    }
}

// ---------------------------------------------------------------------------
// State machine implementation
// ---------------------------------------------------------------------------

#[state_machine(
    initial = "State::idle()",
    state(derive(Debug, Clone, PartialEq))
)]
impl DragMachine {
    /// No gesture in progress. Moves and releases are ignored.
    #[state]
    fn idle(&mut self, event: &DragEvent, context: &mut DragOutput) -> Outcome<State> {
        match event {
            DragEvent::Grab { pointer, panel } => {
                context.grabbed = true;
                Transition(State::dragging(geometry::grab_offset(*pointer, panel.origin)))
            }
            DragEvent::Move { .. } | DragEvent::Release => Handled,
        }
    }

    /// Following the pointer. `offset` is where the panel was grabbed,
    /// relative to its top-left corner.
    #[state(entry_action = "enter_dragging", exit_action = "exit_dragging")]
    fn dragging(
        &mut self,
        offset: &Point,
        event: &DragEvent,
        context: &mut DragOutput,
    ) -> Outcome<State> {
        match event {
            DragEvent::Move {
                pointer,
                panel_size,
                viewport,
                margin,
            } => {
                let candidate = geometry::drag_target(*pointer, *offset);
                context.position = Some(geometry::clamp_to_viewport(
                    candidate,
                    *panel_size,
                    *viewport,
                    *margin,
                ));
                Handled
            }
            DragEvent::Release => Transition(State::idle()),
            // A second press cannot arrive without a release in between.
            DragEvent::Grab { .. } => Handled,
        }
    }

    #[action]
    fn enter_dragging(&mut self) {
        debug!(target: "drag", panel = %self.panel, "global pointer captured");
    }

    #[action]
    fn exit_dragging(&mut self) {
        debug!(target: "drag", panel = %self.panel, "global pointer released");
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

/// Converts pointer events on one panel into a stream of clamped positions.
///
/// Knows nothing about the registry; the owning view writes emitted
/// positions back.
pub struct DragController {
    machine: StateMachine<DragMachine>,
    interactive: InteractiveRoles,
}

impl DragController {
    pub fn new(panel: PanelId, interactive: InteractiveRoles) -> Self {
        Self {
            machine: DragMachine::new(panel).state_machine(),
            interactive,
        }
    }

    /// Replace the drag-blocking allow-list (theme reload).
    pub fn set_interactive_roles(&mut self, interactive: InteractiveRoles) {
        self.interactive = interactive;
    }

    /// Handle a press on the panel's drag handle.
    ///
    /// Ignored when `target` is inside an interactive element or the panel
    /// has not been measured yet. Returns `true` when a drag started, in
    /// which case the caller should suppress default press handling such
    /// as text selection.
    pub fn on_pointer_down(&mut self, pointer: Point, target: &HitPath, panel: Option<Rect>) -> bool {
        if self.interactive.blocks_drag(target) {
            return false;
        }
        let Some(panel) = panel.filter(|r| !r.size.is_empty()) else {
            return false;
        };
        let mut output = DragOutput::default();
        self.machine
            .handle_with_context(&DragEvent::Grab { pointer, panel }, &mut output);
        output.grabbed
    }

    /// Handle a pointer move anywhere in the window. Returns the new clamped
    /// position while dragging, `None` otherwise.
    pub fn on_pointer_move(
        &mut self,
        pointer: Point,
        panel_size: Size,
        viewport: Size,
        margin: i32,
    ) -> Option<Point> {
        let mut output = DragOutput::default();
        self.machine.handle_with_context(
            &DragEvent::Move {
                pointer,
                panel_size,
                viewport,
                margin,
            },
            &mut output,
        );
        output.position
    }

    /// Handle a pointer release anywhere in the window.
    pub fn on_pointer_up(&mut self) {
        self.machine
            .handle_with_context(&DragEvent::Release, &mut DragOutput::default());
    }

    /// The panel is going away: end any drag so no global routing outlives it.
    pub fn teardown(&mut self) {
        if self.is_dragging() {
            self.on_pointer_up();
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.machine.state(), State::Dragging { .. })
    }

    /// Whether window-level pointer moves and releases should be routed
    /// here. True exactly while a drag is active.
    pub fn wants_global_pointer(&self) -> bool {
        self.is_dragging()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
