use std::collections::HashSet;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::force::sim::Simulation;

use super::ViewModel;
use super::render_utils::{
    blend_color, circle_visible, dim_color, draw_background, group_color, node_radius,
    world_to_screen,
};

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_ascii_lowercase(), &query.to_ascii_lowercase()))
}

impl ViewModel {
    fn search_matches(&self) -> Option<HashSet<String>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        let matcher = SkimMatcherV2::default();
        let scene = self.scene.borrow();
        Some(
            scene
                .nodes
                .keys()
                .filter(|key| {
                    let label = self
                        .document_node(key)
                        .map(|node| node.display_label())
                        .unwrap_or(key.as_str());
                    fuzzy_match_score(&matcher, key, query).is_some()
                        || fuzzy_match_score(&matcher, label, query).is_some()
                })
                .cloned()
                .collect(),
        )
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);

        draw_background(&painter, rect, self.pan, self.zoom);

        // The panel rect is the layout viewport; a real size change runs
        // through the binder's size phase and restarts the integrator.
        let viewport = [rect.width().round().max(1.0), rect.height().round().max(1.0)];
        if viewport != self.options.size {
            self.options.size = viewport;
            self.binding_stale = true;
        }

        self.handle_graph_zoom(ui, rect, &response);
        self.handle_graph_pan(&response);
        self.handle_pointer(ui, rect, &response);
        self.handle_keys(ui, &response);

        let interaction_active = response.dragged();
        let frame_delta_seconds = ui
            .ctx()
            .input(|input| input.stable_dt)
            .clamp(1.0 / 240.0, 1.0 / 20.0);

        let mut physics_moving = false;
        if self.binder.sim().is_active() {
            physics_moving = self.binder.sim_mut().step(frame_delta_seconds);
            self.broadcaster.broadcast(self.binder.sim());
        }
        if physics_moving || interaction_active {
            ui.ctx().request_repaint();
        }

        let pointer = ui.input(|input| input.pointer.hover_pos());
        let hovered_key = pointer.and_then(|pointer| self.node_at(pointer, rect));
        if hovered_key.is_some() {
            ui.output_mut(|output| {
                output.cursor_icon = egui::CursorIcon::PointingHand;
            });
        }

        let pseudo_matches = self.search_matches();
        let pseudo_active = pseudo_matches
            .as_ref()
            .is_some_and(|matches| !matches.is_empty());

        let zoom_sqrt = self.zoom.sqrt();
        let selected_color = Color32::from_rgb(245, 206, 93);
        let focused_link_color = Color32::from_rgb(246, 206, 104);

        let mut drawn_nodes = 0usize;
        let mut drawn_links = 0usize;

        {
            let scene = self.scene.borrow();

            for (key, ends) in &scene.links {
                let start = world_to_screen(rect, self.pan, self.zoom, ends.source);
                let end = world_to_screen(rect, self.pan, self.zoom, ends.target);
                if !rect.intersects(Rect::from_two_pos(start, end)) {
                    continue;
                }

                let is_focused = self.controller.focused_link() == Some(key.as_str());
                let (line_width, line_color) = if is_focused {
                    (
                        (3.0 * zoom_sqrt).clamp(1.7, 5.4),
                        focused_link_color,
                    )
                } else {
                    (
                        (1.18 * zoom_sqrt).clamp(0.60, 3.4),
                        Color32::from_rgba_unmultiplied(110, 116, 126, 180),
                    )
                };
                painter.line_segment([start, end], Stroke::new(line_width, line_color));
                drawn_links += 1;
            }

            for (key, world) in &scene.nodes {
                let position = world_to_screen(rect, self.pan, self.zoom, *world);
                let radius = node_radius(self.degree_of(key), self.zoom);
                if !circle_visible(rect, position, radius) {
                    continue;
                }

                let is_selected = self.controller.is_selected(key);
                let is_focused = self.controller.focused_node() == Some(key.as_str());
                let is_hovered = hovered_key.as_deref() == Some(key.as_str());
                let is_pseudo_match = pseudo_matches
                    .as_ref()
                    .is_some_and(|matches| matches.contains(key));
                let pinned_by_user = self
                    .binder
                    .node_index(key)
                    .and_then(|index| self.binder.sim().nodes().get(index))
                    .is_some_and(|node| node.pin.pinned_by_user());

                let base_color =
                    group_color(self.document_node(key).and_then(|node| node.group));
                let color = if is_hovered {
                    Color32::from_rgb(255, 164, 101)
                } else if is_selected {
                    blend_color(base_color, selected_color, 0.78)
                } else if is_pseudo_match {
                    blend_color(base_color, Color32::from_rgb(103, 196, 255), 0.68)
                } else if pseudo_active {
                    dim_color(base_color, 0.38)
                } else {
                    base_color
                };

                painter.circle_filled(position, radius, color);
                painter.circle_stroke(
                    position,
                    radius,
                    Stroke::new(1.0, Color32::from_rgba_unmultiplied(15, 15, 15, 190)),
                );

                if is_selected {
                    painter.circle_stroke(
                        position,
                        radius + 3.0,
                        Stroke::new(1.6, Color32::from_rgba_unmultiplied(245, 206, 93, 200)),
                    );
                }
                if is_focused {
                    painter.circle_stroke(
                        position,
                        radius + 6.0,
                        Stroke::new(1.2, Color32::from_rgba_unmultiplied(255, 255, 255, 150)),
                    );
                }
                if pinned_by_user {
                    painter.circle_filled(
                        position + vec2(radius * 0.7, -radius * 0.7),
                        (radius * 0.28).clamp(2.0, 5.0),
                        Color32::from_rgb(238, 238, 238),
                    );
                }

                let should_draw_label = is_selected
                    || is_focused
                    || is_hovered
                    || (is_pseudo_match && self.zoom > 0.35)
                    || self.zoom > 1.35;
                if should_draw_label {
                    let label = self
                        .document_node(key)
                        .map(|node| node.display_label())
                        .unwrap_or(key.as_str());
                    painter.text(
                        position + vec2(radius + 5.0, 0.0),
                        Align2::LEFT_CENTER,
                        label,
                        FontId::proportional(12.0),
                        Color32::from_gray(238),
                    );
                }
                drawn_nodes += 1;
            }

            if let Some(brush) = &self.brush {
                let anchor = world_to_screen(rect, self.pan, self.zoom, brush.anchor);
                let cursor = world_to_screen(rect, self.pan, self.zoom, brush.cursor);
                let brush_rect = Rect::from_two_pos(anchor, cursor);
                painter.rect_filled(
                    brush_rect,
                    0.0,
                    Color32::from_rgba_unmultiplied(240, 220, 60, 26),
                );
                painter.rect_stroke(
                    brush_rect,
                    0.0,
                    Stroke::new(1.0, Color32::from_rgba_unmultiplied(255, 255, 255, 150)),
                    egui::StrokeKind::Middle,
                );
            }
        }

        self.visible_node_count = drawn_nodes;
        self.visible_link_count = drawn_links;

        if let Some(key) = &hovered_key {
            let pinned = self
                .binder
                .node_index(key)
                .and_then(|index| self.binder.sim().nodes().get(index))
                .is_some_and(|node| node.pin.pinned_by_user());
            let status = format!(
                "{}  |  degree {}  |  {}",
                key,
                self.degree_of(key),
                if pinned { "pinned" } else { "free" }
            );
            painter.text(
                rect.left_top() + vec2(10.0, 10.0),
                Align2::LEFT_TOP,
                status,
                FontId::proportional(13.0),
                Color32::from_gray(240),
            );
        }
    }
}
