//! Property tests for the registry's stacking rules and the viewport clamp.

use proptest::prelude::*;

use mothership_dock::geometry::clamp_to_viewport;
use mothership_dock::registry::{BASE_Z_OFFSET, CLOSED_Z_INDEX};
use mothership_dock::storage::MemoryLayoutStore;
use mothership_dock::{PanelId, PanelRegistry, Point, Size};

#[derive(Debug, Clone)]
enum Op {
    Open(PanelId),
    Close(PanelId),
    Toggle(PanelId),
    Raise(PanelId),
    Minimize(PanelId),
    Restore(PanelId),
    Move(PanelId, i32, i32),
}

fn panel() -> impl Strategy<Value = PanelId> {
    prop::sample::select(PanelId::ALL.to_vec())
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        panel().prop_map(Op::Open),
        panel().prop_map(Op::Close),
        panel().prop_map(Op::Toggle),
        panel().prop_map(Op::Raise),
        panel().prop_map(Op::Minimize),
        panel().prop_map(Op::Restore),
        (panel(), -2000..4000i32, -2000..4000i32).prop_map(|(id, x, y)| Op::Move(id, x, y)),
    ]
}

fn apply(reg: &mut PanelRegistry, op: &Op) {
    match *op {
        Op::Open(id) => reg.open(id),
        Op::Close(id) => reg.close(id),
        Op::Toggle(id) => reg.toggle_open(id),
        Op::Raise(id) => reg.bring_to_front(id),
        Op::Minimize(id) => reg.minimize(id),
        Op::Restore(id) => reg.restore(id),
        Op::Move(id, x, y) => reg.set_position(id, Point::new(x, y)),
    }
}

proptest! {
    #[test]
    fn stack_holds_each_open_panel_exactly_once(ops in prop::collection::vec(op(), 0..60)) {
        let mut reg = PanelRegistry::new(Box::new(MemoryLayoutStore::new()), Size::new(1280, 800));
        for op in &ops {
            apply(&mut reg, op);

            let stack = reg.stack();
            let mut sorted = stack.to_vec();
            sorted.sort();
            sorted.dedup();
            prop_assert_eq!(sorted.len(), stack.len(), "duplicate in stack {:?}", stack);

            let mut open = reg.open_panel_ids().to_vec();
            open.sort();
            prop_assert_eq!(sorted, open);

            for id in PanelId::ALL {
                let state = reg.get_state(id);
                if state.is_open {
                    prop_assert!(state.z_index > BASE_Z_OFFSET);
                } else {
                    prop_assert_eq!(state.z_index, CLOSED_Z_INDEX);
                }
            }
        }
    }

    #[test]
    fn raising_an_open_panel_makes_it_front(
        ops in prop::collection::vec(op(), 0..40),
        target in panel(),
    ) {
        let mut reg = PanelRegistry::new(Box::new(MemoryLayoutStore::new()), Size::new(1280, 800));
        for op in &ops {
            apply(&mut reg, op);
        }
        reg.open(target);
        reg.bring_to_front(target);

        let top = reg.get_state(target).z_index;
        for &id in reg.open_panel_ids() {
            if id != target {
                prop_assert!(reg.get_state(id).z_index < top);
            }
        }
    }

    #[test]
    fn clamp_keeps_fitting_panels_inside_the_margin(
        x in -5000..5000i32,
        y in -5000..5000i32,
        w in 1..1200i32,
        h in 1..900i32,
        vw in 200..2000i32,
        vh in 200..1400i32,
        margin in 0..64i32,
    ) {
        let size = Size::new(w, h);
        let viewport = Size::new(vw, vh);
        let p = clamp_to_viewport(Point::new(x, y), size, viewport, margin);

        if w + 2 * margin <= vw {
            prop_assert!(p.x >= margin && p.x + w <= vw - margin);
        } else {
            prop_assert_eq!(p.x, margin);
        }
        if h + 2 * margin <= vh {
            prop_assert!(p.y >= margin && p.y + h <= vh - margin);
        } else {
            prop_assert_eq!(p.y, margin);
        }
    }

    #[test]
    fn clamp_is_idempotent(
        x in -5000..5000i32,
        y in -5000..5000i32,
        w in 1..1200i32,
        h in 1..900i32,
    ) {
        let size = Size::new(w, h);
        let viewport = Size::new(1000, 800);
        let once = clamp_to_viewport(Point::new(x, y), size, viewport, 24);
        prop_assert_eq!(clamp_to_viewport(once, size, viewport, 24), once);
    }
}
