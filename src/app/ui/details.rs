use eframe::egui::Ui;

use crate::force::sim::Simulation;

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn details_panel(&mut self, ui: &mut Ui) {
        ui.strong("Focus");

        if let Some(key) = self.controller.focused_node().map(str::to_owned) {
            self.node_details(ui, &key);
        } else if let Some(key) = self.controller.focused_link().map(str::to_owned) {
            self.link_details(ui, &key);
        } else {
            ui.label("click a node or link for details");
        }
    }

    fn node_details(&self, ui: &mut Ui, key: &str) {
        ui.label(format!("node {key}"));

        if let Some(node) = self.document_node(key) {
            if node.label.is_some() {
                ui.label(format!("label: {}", node.display_label()));
            }
            if let Some(group) = node.group {
                ui.label(format!("group: {group}"));
            }
        }

        if let Some(pos) = self.binder.position(key) {
            ui.label(format!("position: ({:.1}, {:.1})", pos.x, pos.y));
        }

        let pinned = self
            .binder
            .node_index(key)
            .and_then(|index| self.binder.sim().nodes().get(index))
            .is_some_and(|node| node.pin.pinned_by_user());
        ui.label(if pinned { "pinned by user" } else { "free" });

        let mut neighbors = self
            .binder
            .sim()
            .links()
            .iter()
            .filter_map(|link| {
                if link.source_key == key {
                    Some(link.target_key.as_str())
                } else if link.target_key == key {
                    Some(link.source_key.as_str())
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();
        neighbors.sort_unstable();
        neighbors.dedup();

        ui.label(format!("{} neighbors", neighbors.len()));
        for neighbor in neighbors.iter().take(12) {
            ui.monospace(*neighbor);
        }
        if neighbors.len() > 12 {
            ui.label(format!("... and {} more", neighbors.len() - 12));
        }
    }

    fn link_details(&self, ui: &mut Ui, key: &str) {
        ui.label(format!("link {key}"));

        let Some(link) = self
            .binder
            .sim()
            .links()
            .iter()
            .find(|link| link.key == key)
        else {
            return;
        };

        ui.monospace(format!("{} -> {}", link.source_key, link.target_key));
        if let (Some(source), Some(target)) = (
            self.binder.position(&link.source_key),
            self.binder.position(&link.target_key),
        ) {
            ui.label(format!("length: {:.1}", (source - target).length()));
        }
    }
}
