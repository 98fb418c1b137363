use std::collections::HashSet;

use eframe::egui::Vec2;

use super::geometry::{
    Extent, hull_centroid, rotate_points, scale_points, translate_points,
};
use super::sim::{SimNode, Simulation};

pub const SCALE_STEP: f32 = 1.05;
pub const ROTATE_STEP_DEGREES: f32 = 2.0;
pub const NUDGE_STEP: f32 = 1.0;

// Fired exactly once per focus transition; the embedding layer forwards
// them to its own callbacks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FocusChange {
    Node(String),
    Link(String),
    Cleared,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditOp {
    Nudge(Vec2),
    PinSelection,
    UnpinSelection,
    Scale(f32),
    Rotate(f32),
}

struct DragSession {
    last: Vec2,
}

// Selection, focus, and drag state machine. All coordinates are local
// (post-pan/zoom) graph space; converting from screen space is the
// embedding layer's job.
#[derive(Default)]
pub struct Controller {
    selection: HashSet<String>,
    multi_select: bool,
    focused_node: Option<String>,
    focused_link: Option<String>,
    drag: Option<DragSession>,
    // Set on the first real drag move, consumed at the click decision
    // point: the platform delivers the click after the release.
    drag_happened: bool,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> &HashSet<String> {
        &self.selection
    }

    pub fn is_selected(&self, key: &str) -> bool {
        self.selection.contains(key)
    }

    pub fn focused_node(&self) -> Option<&str> {
        self.focused_node.as_deref()
    }

    pub fn focused_link(&self) -> Option<&str> {
        self.focused_link.as_deref()
    }

    pub fn dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn set_multi_select(&mut self, held: bool) {
        self.multi_select = held;
    }

    // A press always starts a potential drag, whether or not the gesture
    // later resolves as a click.
    pub fn press_node<S: Simulation>(&mut self, key: &str, point: Vec2, sim: &mut S) {
        if !self.selection.contains(key) {
            if !self.multi_select {
                self.selection.clear();
            }
            self.selection.insert(key.to_owned());
        }

        self.drag_happened = false;
        self.hold_selection(sim);
        self.drag = Some(DragSession { last: point });
    }

    // A press that hits no node re-arms the click path: a leftover
    // drag-happened flag from a dragged-then-released-elsewhere session
    // must not eat this gesture's click.
    pub fn press_background(&mut self) {
        self.drag_happened = false;
    }

    pub fn drag_to<S: Simulation>(&mut self, point: Vec2, sim: &mut S) {
        let Some(session) = &mut self.drag else {
            return;
        };
        let delta = point - session.last;
        session.last = point;
        if delta == Vec2::ZERO {
            return;
        }

        self.drag_happened = true;
        for node in selected_nodes(&self.selection, sim) {
            node.shift(delta);
        }
        sim.resume();
    }

    // Unconditional teardown; pin-by-user survives, pin-by-system never
    // does. The drag-happened flag stays armed for the click that follows.
    pub fn end_drag<S: Simulation>(&mut self, sim: &mut S) {
        if self.drag.take().is_some() {
            self.release_selection(sim);
        }
    }

    pub fn click_node(&mut self, key: &str) -> Option<FocusChange> {
        if std::mem::take(&mut self.drag_happened) {
            return None;
        }
        self.focused_node = Some(key.to_owned());
        self.focused_link = None;
        Some(FocusChange::Node(key.to_owned()))
    }

    pub fn click_link(&mut self, key: &str) -> Option<FocusChange> {
        if std::mem::take(&mut self.drag_happened) {
            return None;
        }
        self.focused_link = Some(key.to_owned());
        self.focused_node = None;
        Some(FocusChange::Link(key.to_owned()))
    }

    pub fn click_background(&mut self) -> Option<FocusChange> {
        if std::mem::take(&mut self.drag_happened) {
            return None;
        }
        self.selection.clear();
        self.focused_node = None;
        self.focused_link = None;
        Some(FocusChange::Cleared)
    }

    pub fn brush_end<S: Simulation>(&mut self, extent: Extent, sim: &S) {
        let within = sim
            .nodes()
            .iter()
            .filter(|node| extent.contains(node.pos))
            .map(|node| node.key.clone())
            .collect::<HashSet<_>>();

        if self.multi_select {
            self.selection.extend(within);
        } else {
            self.selection = within;
        }
    }

    pub fn apply<S: Simulation>(&mut self, op: EditOp, sim: &mut S) {
        if self.selection.is_empty() {
            return;
        }

        match op {
            EditOp::PinSelection => {
                for node in selected_nodes(&self.selection, sim) {
                    node.pin.set_user(true);
                }
                sim.resume();
            }
            EditOp::UnpinSelection => {
                for node in selected_nodes(&self.selection, sim) {
                    node.pin.set_user(false);
                }
                sim.resume();
            }
            EditOp::Nudge(delta) => {
                self.transform_selection(sim, |points| translate_points(points, delta));
            }
            EditOp::Scale(factor) => {
                self.transform_selection(sim, |points| {
                    if let Some(pivot) = hull_centroid(points) {
                        scale_points(points, pivot, factor);
                    }
                });
            }
            EditOp::Rotate(degrees) => {
                self.transform_selection(sim, |points| {
                    if let Some(pivot) = hull_centroid(points) {
                        rotate_points(points, pivot, degrees);
                    }
                });
            }
        }
    }

    // Drop selection and focus keys that did not survive a topology update.
    pub fn retain_existing<S: Simulation>(&mut self, sim: &S) {
        let node_keys = sim
            .nodes()
            .iter()
            .map(|node| node.key.as_str())
            .collect::<HashSet<_>>();
        self.selection
            .retain(|key| node_keys.contains(key.as_str()));
        if let Some(key) = &self.focused_node
            && !node_keys.contains(key.as_str())
        {
            self.focused_node = None;
        }

        let link_keys = sim
            .links()
            .iter()
            .map(|link| link.key.as_str())
            .collect::<HashSet<_>>();
        if let Some(key) = &self.focused_link
            && !link_keys.contains(key.as_str())
        {
            self.focused_link = None;
        }
    }

    // Pin-by-system bracket shared by drags and keyboard transforms, so the
    // integrator never fights a manual placement.
    fn hold_selection<S: Simulation>(&self, sim: &mut S) {
        for node in selected_nodes(&self.selection, sim) {
            node.pin.hold();
        }
    }

    fn release_selection<S: Simulation>(&self, sim: &mut S) {
        for node in selected_nodes(&self.selection, sim) {
            node.pin.release();
        }
    }

    fn transform_selection<S: Simulation>(
        &mut self,
        sim: &mut S,
        transform: impl FnOnce(&mut [Vec2]),
    ) {
        self.hold_selection(sim);

        let moved: Vec<(usize, Vec2)> = sim
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| self.selection.contains(&node.key))
            .map(|(index, node)| (index, node.pos))
            .collect();
        let mut points = moved.iter().map(|(_, pos)| *pos).collect::<Vec<_>>();
        transform(&mut points);
        for ((index, _), point) in moved.iter().zip(points.iter()) {
            sim.nodes_mut()[*index].place(*point);
        }

        sim.resume();
        self.release_selection(sim);
    }
}

fn selected_nodes<'a, S: Simulation>(
    selection: &'a HashSet<String>,
    sim: &'a mut S,
) -> impl Iterator<Item = &'a mut SimNode> {
    sim.nodes_mut()
        .iter_mut()
        .filter(|node| selection.contains(&node.key))
}

#[cfg(test)]
mod tests {
    use eframe::egui::vec2;

    use super::*;
    use crate::force::sim::SimNode;
    use crate::force::testing::TestSim;

    fn sim_with(keys_and_positions: &[(&str, f32, f32)]) -> TestSim {
        let mut sim = TestSim::new();
        sim.set_nodes(
            keys_and_positions
                .iter()
                .map(|(key, x, y)| SimNode::seeded((*key).to_owned(), vec2(*x, *y), false))
                .collect(),
        );
        sim
    }

    fn node<'a>(sim: &'a TestSim, key: &str) -> &'a SimNode {
        sim.nodes().iter().find(|node| node.key == key).unwrap()
    }

    #[test]
    fn press_replaces_selection_without_modifier() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 10.0, 0.0)]);
        let mut controller = Controller::new();

        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);
        controller.press_node("b", vec2(10.0, 0.0), &mut sim);

        assert!(!controller.is_selected("a"));
        assert!(controller.is_selected("b"));
    }

    #[test]
    fn press_unions_selection_with_modifier() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 10.0, 0.0)]);
        let mut controller = Controller::new();

        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);
        controller.set_multi_select(true);
        controller.press_node("b", vec2(10.0, 0.0), &mut sim);

        assert!(controller.is_selected("a"));
        assert!(controller.is_selected("b"));
    }

    #[test]
    fn press_on_already_selected_node_keeps_selection() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 10.0, 0.0)]);
        let mut controller = Controller::new();
        controller.brush_end(
            Extent::from_corners(vec2(-1.0, -1.0), vec2(11.0, 1.0)),
            &sim,
        );
        assert_eq!(controller.selected().len(), 2);

        // Pressing a member of a multi-selection must not collapse it.
        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        assert_eq!(controller.selected().len(), 2);
    }

    #[test]
    fn drag_moves_every_selected_node_and_pins_them() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 10.0, 0.0), ("c", 50.0, 50.0)]);
        let mut controller = Controller::new();
        controller.set_multi_select(true);
        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);
        controller.press_node("b", vec2(10.0, 0.0), &mut sim);

        controller.drag_to(vec2(13.0, 4.0), &mut sim);
        assert!(node(&sim, "a").pin.pinned());
        assert!(node(&sim, "b").pin.pinned());
        assert_eq!(node(&sim, "a").pos, vec2(3.0, 4.0));
        assert_eq!(node(&sim, "b").pos, vec2(13.0, 4.0));
        assert_eq!(node(&sim, "c").pos, vec2(50.0, 50.0));
        assert!(sim.resume_calls > 0);

        controller.end_drag(&mut sim);
        assert!(!node(&sim, "a").pin.pinned());
        assert!(!node(&sim, "b").pin.pinned());
    }

    #[test]
    fn drag_without_session_is_a_no_op() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut controller = Controller::new();
        controller.drag_to(vec2(5.0, 5.0), &mut sim);
        assert_eq!(node(&sim, "a").pos, vec2(0.0, 0.0));
        assert_eq!(sim.resume_calls, 0);
    }

    #[test]
    fn click_after_real_drag_is_suppressed_once() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut controller = Controller::new();

        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.drag_to(vec2(5.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);
        assert_eq!(controller.click_node("a"), None);
        assert_eq!(controller.focused_node(), None);

        // The next plain click focuses normally.
        controller.press_node("a", vec2(5.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);
        assert_eq!(
            controller.click_node("a"),
            Some(FocusChange::Node("a".to_owned()))
        );
        assert_eq!(controller.focused_node(), Some("a"));
    }

    #[test]
    fn background_press_rearms_a_leftover_drag_flag() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut controller = Controller::new();

        // Drag that never produces a platform click (released off-window).
        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.drag_to(vec2(20.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);

        controller.press_background();
        assert_eq!(controller.click_background(), Some(FocusChange::Cleared));
    }

    #[test]
    fn link_click_after_real_drag_is_suppressed() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut controller = Controller::new();
        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.drag_to(vec2(8.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);

        assert_eq!(controller.click_link("a-b"), None);
        assert_eq!(controller.focused_link(), None);
    }

    #[test]
    fn node_and_link_focus_are_mutually_exclusive() {
        let mut controller = Controller::new();
        controller.click_node("a");
        assert_eq!(controller.focused_node(), Some("a"));

        let change = controller.click_link("a-b");
        assert_eq!(change, Some(FocusChange::Link("a-b".to_owned())));
        assert_eq!(controller.focused_node(), None);
        assert_eq!(controller.focused_link(), Some("a-b"));

        controller.click_node("a");
        assert_eq!(controller.focused_link(), None);
    }

    #[test]
    fn background_click_cleans_everything() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut controller = Controller::new();
        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);
        controller.click_node("a");

        assert_eq!(controller.click_background(), Some(FocusChange::Cleared));
        assert!(controller.selected().is_empty());
        assert_eq!(controller.focused_node(), None);
        assert_eq!(controller.focused_link(), None);
    }

    #[test]
    fn fast_drag_does_not_trigger_background_clean() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut controller = Controller::new();
        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.drag_to(vec2(30.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);

        assert_eq!(controller.click_background(), None);
        assert!(controller.is_selected("a"));
    }

    #[test]
    fn brush_replaces_or_unions_selection() {
        let mut sim = sim_with(&[("a", 1.0, 1.0), ("b", 5.0, 5.0), ("c", 50.0, 50.0)]);
        let mut controller = Controller::new();
        controller.press_node("c", vec2(50.0, 50.0), &mut sim);
        controller.end_drag(&mut sim);

        let extent = Extent::from_corners(vec2(0.0, 0.0), vec2(10.0, 10.0));
        controller.brush_end(extent, &sim);
        assert_eq!(controller.selected().len(), 2);
        assert!(controller.is_selected("a"));
        assert!(controller.is_selected("b"));
        assert!(!controller.is_selected("c"));

        controller.set_multi_select(true);
        let far = Extent::from_corners(vec2(40.0, 40.0), vec2(60.0, 60.0));
        controller.brush_end(far, &sim);
        assert_eq!(controller.selected().len(), 3);
    }

    #[test]
    fn brush_bounds_are_half_open() {
        let sim = sim_with(&[
            ("on-min", 0.0, 0.0),
            ("inside", 9.999, 9.999),
            ("on-max", 10.0, 5.0),
        ]);
        let mut controller = Controller::new();
        controller.brush_end(
            Extent::from_corners(vec2(0.0, 0.0), vec2(10.0, 10.0)),
            &sim,
        );
        assert!(controller.is_selected("on-min"));
        assert!(controller.is_selected("inside"));
        assert!(!controller.is_selected("on-max"));
    }

    #[test]
    fn nudge_moves_only_the_selection() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 10.0, 0.0), ("c", 50.0, 50.0)]);
        let mut controller = Controller::new();
        controller.brush_end(
            Extent::from_corners(vec2(-1.0, -1.0), vec2(11.0, 1.0)),
            &sim,
        );

        controller.apply(EditOp::Nudge(vec2(0.0, NUDGE_STEP)), &mut sim);
        assert_eq!(node(&sim, "a").pos, vec2(0.0, 1.0));
        assert_eq!(node(&sim, "b").pos, vec2(10.0, 1.0));
        assert_eq!(node(&sim, "c").pos, vec2(50.0, 50.0));
        // The bracket released the system pin afterwards.
        assert!(!node(&sim, "a").pin.pinned());
        assert!(sim.resume_calls > 0);
    }

    #[test]
    fn rotate_round_trip_restores_positions() {
        let mut sim = sim_with(&[
            ("a", 0.0, 0.0),
            ("b", 10.0, 0.0),
            ("c", 10.0, 10.0),
            ("d", 0.0, 10.0),
        ]);
        let mut controller = Controller::new();
        controller.brush_end(
            Extent::from_corners(vec2(-1.0, -1.0), vec2(11.0, 11.0)),
            &sim,
        );

        let before = sim.nodes().iter().map(|node| node.pos).collect::<Vec<_>>();
        controller.apply(EditOp::Rotate(ROTATE_STEP_DEGREES), &mut sim);
        controller.apply(EditOp::Rotate(-ROTATE_STEP_DEGREES), &mut sim);
        for (node, expected) in sim.nodes().iter().zip(before.iter()) {
            assert!((node.pos - *expected).length() < 1e-3);
        }
    }

    #[test]
    fn scale_expands_about_the_hull_centroid() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 10.0, 0.0)]);
        let mut controller = Controller::new();
        controller.brush_end(
            Extent::from_corners(vec2(-1.0, -1.0), vec2(11.0, 1.0)),
            &sim,
        );

        controller.apply(EditOp::Scale(2.0), &mut sim);
        assert_eq!(node(&sim, "a").pos, vec2(-5.0, 0.0));
        assert_eq!(node(&sim, "b").pos, vec2(15.0, 0.0));
    }

    #[test]
    fn pin_toggles_user_flag_without_touching_positions() {
        let mut sim = sim_with(&[("a", 3.0, 4.0)]);
        let mut controller = Controller::new();
        controller.press_node("a", vec2(3.0, 4.0), &mut sim);
        controller.end_drag(&mut sim);

        controller.apply(EditOp::PinSelection, &mut sim);
        assert!(node(&sim, "a").pin.pinned_by_user());
        assert_eq!(node(&sim, "a").pos, vec2(3.0, 4.0));

        controller.apply(EditOp::UnpinSelection, &mut sim);
        assert!(!node(&sim, "a").pin.pinned());
    }

    #[test]
    fn edit_ops_with_empty_selection_are_silent() {
        let mut sim = sim_with(&[("a", 0.0, 0.0)]);
        let mut controller = Controller::new();
        controller.apply(EditOp::Nudge(vec2(1.0, 0.0)), &mut sim);
        controller.apply(EditOp::Rotate(90.0), &mut sim);
        assert_eq!(node(&sim, "a").pos, vec2(0.0, 0.0));
        assert_eq!(sim.resume_calls, 0);
    }

    #[test]
    fn retain_existing_prunes_dead_keys() {
        let mut sim = sim_with(&[("a", 0.0, 0.0), ("b", 1.0, 0.0)]);
        let mut controller = Controller::new();
        controller.set_multi_select(true);
        controller.press_node("a", vec2(0.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);
        controller.press_node("b", vec2(1.0, 0.0), &mut sim);
        controller.end_drag(&mut sim);
        controller.click_node("b");

        sim.set_nodes(vec![SimNode::seeded("a".to_owned(), vec2(0.0, 0.0), false)]);
        controller.retain_existing(&sim);
        assert!(controller.is_selected("a"));
        assert!(!controller.is_selected("b"));
        assert_eq!(controller.focused_node(), None);
    }

    // The end-to-end scenario: brush two of three nodes, nudge them down,
    // then clean up with a background click.
    #[test]
    fn brush_nudge_clean_scenario() {
        let mut sim = sim_with(&[("a", 2.0, 2.0), ("b", 8.0, 2.0), ("c", 80.0, 80.0)]);
        let mut controller = Controller::new();

        controller.brush_end(
            Extent::from_corners(vec2(0.0, 0.0), vec2(10.0, 10.0)),
            &sim,
        );
        assert_eq!(controller.selected().len(), 2);

        controller.apply(EditOp::Nudge(vec2(0.0, 1.0)), &mut sim);
        assert_eq!(node(&sim, "a").pos, vec2(2.0, 3.0));
        assert_eq!(node(&sim, "b").pos, vec2(8.0, 3.0));
        assert_eq!(node(&sim, "c").pos, vec2(80.0, 80.0));

        assert_eq!(controller.click_background(), Some(FocusChange::Cleared));
        assert!(controller.selected().is_empty());
        assert_eq!(controller.focused_node(), None);
        assert_eq!(controller.focused_link(), None);
    }
}
