use eframe::egui::{self, Color32, Ui};

use crate::force::sim::Simulation;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn controls_panel(
        &mut self,
        ui: &mut Ui,
        reload_requested: &mut bool,
        is_reloading: bool,
    ) {
        ui.add_space(4.0);
        ui.heading("forcelab");
        ui.add_space(4.0);

        ui.horizontal(|ui| {
            if ui
                .add_enabled(!is_reloading, egui::Button::new("Reload document"))
                .clicked()
            {
                *reload_requested = true;
            }
            if is_reloading {
                ui.spinner();
            }
        });

        if let Some(bind_error) = &self.bind_error {
            ui.add_space(6.0);
            ui.colored_label(Color32::from_rgb(240, 120, 110), bind_error);
        }

        ui.add_space(6.0);
        ui.label(format!(
            "{} nodes / {} links on screen",
            self.visible_node_count, self.visible_link_count
        ));
        ui.label(if self.binder.sim().is_active() {
            "layout running"
        } else {
            "layout at rest"
        });

        ui.separator();
        ui.strong("Layout");
        let mut changed = false;
        changed |= ui
            .add(egui::Slider::new(&mut self.options.gravity, 0.0..=1.0).text("gravity"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.options.friction, 0.0..=1.0).text("friction"))
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.options.charge, -200.0..=0.0).text("charge"))
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut self.options.link_distance, 1.0..=200.0)
                    .text("link distance"),
            )
            .changed();
        changed |= ui
            .add(
                egui::Slider::new(&mut self.options.link_strength, 0.0..=2.0)
                    .text("link strength"),
            )
            .changed();
        changed |= ui
            .add(egui::Slider::new(&mut self.options.theta, 0.1..=1.5).text("theta"))
            .changed();

        let node_total = self.document.nodes.len().max(1);
        changed |= ui
            .add(egui::Slider::new(&mut self.max_nodes, 1..=node_total).text("max nodes"))
            .changed();

        if changed {
            self.binding_stale = true;
        }

        ui.separator();
        ui.strong("Search");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();
        ui.strong("Selection");
        if self.controller.selected().is_empty() {
            ui.label("none - click a node, or shift-drag to brush");
        } else {
            let mut keys = self
                .controller
                .selected()
                .iter()
                .cloned()
                .collect::<Vec<_>>();
            keys.sort();
            let preview = keys
                .iter()
                .take(6)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            if keys.len() > 6 {
                ui.label(format!("{} selected: {preview}, ...", keys.len()));
            } else {
                ui.label(format!("{} selected: {preview}", keys.len()));
            }
        }

        egui::CollapsingHeader::new("Keyboard")
            .default_open(false)
            .show(ui, |ui| {
                ui.label("arrows: nudge selection");
                ui.label("f / d: pin / unpin selection");
                ui.label("+ / -: scale selection");
                ui.label("9 / 0: rotate selection");
                ui.label("cmd-click, cmd-brush: add to selection");
                ui.label("shift-drag background: brush select");
                ui.label("right-drag: pan, scroll: zoom");
            });
    }
}
