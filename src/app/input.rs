use eframe::egui::{self, Key, Pos2, Rect, Ui, vec2};
use tracing::debug;

use crate::force::controller::{
    EditOp, NUDGE_STEP, ROTATE_STEP_DEGREES, SCALE_STEP,
};
use crate::force::geometry::Extent;

use super::render_utils::{node_radius, screen_to_world, segment_distance_sq, world_to_screen};
use super::{BrushState, ViewModel};

const LINK_HIT_DISTANCE: f32 = 6.0;

impl ViewModel {
    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let pointer = ui
            .input(|input| input.pointer.hover_pos())
            .unwrap_or_else(|| rect.center());
        let world_before = screen_to_world(rect, self.pan, self.zoom, pointer);

        let zoom_factor = (1.0 + (scroll * 0.0018)).clamp(0.85, 1.15);
        self.zoom = (self.zoom * zoom_factor).clamp(0.05, 6.0);
        self.pan = pointer - rect.left_top() - (world_before * self.zoom);
    }

    pub(in crate::app) fn handle_graph_pan(&mut self, response: &egui::Response) {
        if response.dragged_by(egui::PointerButton::Secondary)
            || response.dragged_by(egui::PointerButton::Middle)
        {
            self.pan += response.drag_delta();
        }
    }

    // Translate raw pointer state into the semantic press/drag/brush/click
    // transitions. A press always opens a potential drag; egui's click
    // threshold plus the controller's own drag flag sort out the rest.
    pub(in crate::app) fn handle_pointer(
        &mut self,
        ui: &Ui,
        rect: Rect,
        response: &egui::Response,
    ) {
        let (pointer, primary_pressed, primary_down, primary_released, brushing_modifier) = ui
            .input(|input| {
                (
                    input.pointer.interact_pos(),
                    input.pointer.primary_pressed(),
                    input.pointer.primary_down(),
                    input.pointer.primary_released(),
                    input.modifiers.shift,
                )
            });

        let Some(pointer) = pointer else {
            // Losing the pointer mid-session (release outside the window,
            // focus loss) still tears the session down.
            if primary_released || !primary_down {
                self.finish_pointer_session();
            }
            return;
        };
        let world = screen_to_world(rect, self.pan, self.zoom, pointer);

        if primary_pressed && response.hovered() {
            if let Some(key) = self.node_at(pointer, rect) {
                self.controller
                    .press_node(&key, world, self.binder.sim_mut());
            } else {
                self.controller.press_background();
                if brushing_modifier {
                    self.brush = Some(BrushState {
                        anchor: world,
                        cursor: world,
                    });
                }
            }
        }

        if primary_down {
            if let Some(brush) = &mut self.brush {
                brush.cursor = world;
            } else if self.controller.dragging() {
                self.controller.drag_to(world, self.binder.sim_mut());
            }
        }

        if primary_released {
            self.finish_pointer_session();
        }

        if response.clicked_by(egui::PointerButton::Primary) {
            let change = if let Some(key) = self.node_at(pointer, rect) {
                self.controller.click_node(&key)
            } else if let Some(key) = self.link_at(pointer, rect) {
                self.controller.click_link(&key)
            } else {
                self.controller.click_background()
            };
            if let Some(change) = change {
                debug!(?change, "focus changed");
            }
        }
    }

    // Brush commit and drag teardown share one release path; the teardown
    // is unconditional, even for drags that never moved.
    fn finish_pointer_session(&mut self) {
        if let Some(brush) = self.brush.take() {
            let extent = Extent::from_corners(brush.anchor, brush.cursor);
            self.controller.brush_end(extent, self.binder.sim());
        }
        self.controller.end_drag(self.binder.sim_mut());
    }

    pub(in crate::app) fn handle_keys(&mut self, ui: &Ui, response: &egui::Response) {
        let modifiers = ui.input(|input| input.modifiers);
        // The modifier is transient state, tracked even while the pointer
        // is elsewhere; the edit keys only apply over the scene.
        self.controller.set_multi_select(modifiers.command);
        if !response.hovered() {
            return;
        }
        if modifiers.command && modifiers.shift {
            return;
        }

        let op = ui.input(|input| {
            if input.key_pressed(Key::ArrowUp) {
                Some(EditOp::Nudge(vec2(0.0, -NUDGE_STEP)))
            } else if input.key_pressed(Key::ArrowDown) {
                Some(EditOp::Nudge(vec2(0.0, NUDGE_STEP)))
            } else if input.key_pressed(Key::ArrowLeft) {
                Some(EditOp::Nudge(vec2(-NUDGE_STEP, 0.0)))
            } else if input.key_pressed(Key::ArrowRight) {
                Some(EditOp::Nudge(vec2(NUDGE_STEP, 0.0)))
            } else if input.key_pressed(Key::D) {
                Some(EditOp::UnpinSelection)
            } else if input.key_pressed(Key::F) {
                Some(EditOp::PinSelection)
            } else if input.key_pressed(Key::Plus) || input.key_pressed(Key::Equals) {
                Some(EditOp::Scale(SCALE_STEP))
            } else if input.key_pressed(Key::Minus) {
                Some(EditOp::Scale(1.0 / SCALE_STEP))
            } else if input.key_pressed(Key::Num0) {
                Some(EditOp::Rotate(ROTATE_STEP_DEGREES))
            } else if input.key_pressed(Key::Num9) {
                Some(EditOp::Rotate(-ROTATE_STEP_DEGREES))
            } else {
                None
            }
        });

        if let Some(op) = op {
            self.controller.apply(op, self.binder.sim_mut());
        }
    }

    // Hit-test against the broadcast scene, nearest node first.
    pub(in crate::app) fn node_at(&self, pointer: Pos2, rect: Rect) -> Option<String> {
        let scene = self.scene.borrow();
        scene
            .nodes
            .iter()
            .filter_map(|(key, world)| {
                let screen = world_to_screen(rect, self.pan, self.zoom, *world);
                let radius = node_radius(self.degree_of(key), self.zoom);
                let distance = screen.distance(pointer);
                if distance <= radius {
                    Some((key.clone(), distance))
                } else {
                    None
                }
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(key, _)| key)
    }

    pub(in crate::app) fn link_at(&self, pointer: Pos2, rect: Rect) -> Option<String> {
        let scene = self.scene.borrow();
        let hit_sq = LINK_HIT_DISTANCE * LINK_HIT_DISTANCE;
        scene
            .links
            .iter()
            .filter_map(|(key, ends)| {
                let start = world_to_screen(rect, self.pan, self.zoom, ends.source);
                let end = world_to_screen(rect, self.pan, self.zoom, ends.target);
                let distance_sq = segment_distance_sq(pointer, start, end);
                if distance_sq <= hit_sq {
                    Some((key.clone(), distance_sq))
                } else {
                    None
                }
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(key, _)| key)
    }
}
