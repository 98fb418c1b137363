use std::collections::{HashMap, HashSet};

use eframe::egui::Vec2;

use super::sim::Simulation;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkEnds {
    pub source: Vec2,
    pub target: Vec2,
}

// The render-technology-agnostic escape hatch: per-tick position pushes go
// straight into these handles, bypassing whatever declarative cycle the
// embedding layer runs.
pub trait NodeVisual {
    fn update_position(&mut self, pos: Vec2);
}

pub trait LinkVisual {
    fn update_position(&mut self, ends: LinkEnds);
}

pub struct Broadcaster<N, L> {
    node_handles: HashMap<String, N>,
    link_handles: HashMap<String, L>,
}

impl<N, L> Default for Broadcaster<N, L> {
    fn default() -> Self {
        Self {
            node_handles: HashMap::new(),
            link_handles: HashMap::new(),
        }
    }
}

impl<N: NodeVisual, L: LinkVisual> Broadcaster<N, L> {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn handle_counts(&self) -> (usize, usize) {
        (self.node_handles.len(), self.link_handles.len())
    }

    // Reconcile the handle registries with the current node/link sets.
    // Stale handles are dropped first, so a removed entity can never
    // receive another position write.
    pub fn sync<S: Simulation>(
        &mut self,
        sim: &S,
        mut make_node: impl FnMut(&str) -> N,
        mut make_link: impl FnMut(&str) -> L,
    ) {
        let node_keys = sim
            .nodes()
            .iter()
            .map(|node| node.key.as_str())
            .collect::<HashSet<_>>();
        self.node_handles
            .retain(|key, _| node_keys.contains(key.as_str()));
        for node in sim.nodes() {
            self.node_handles
                .entry(node.key.clone())
                .or_insert_with(|| make_node(&node.key));
        }

        let link_keys = sim
            .links()
            .iter()
            .map(|link| link.key.as_str())
            .collect::<HashSet<_>>();
        self.link_handles
            .retain(|key, _| link_keys.contains(key.as_str()));
        for link in sim.links() {
            self.link_handles
                .entry(link.key.clone())
                .or_insert_with(|| make_link(&link.key));
        }
    }

    pub fn broadcast<S: Simulation>(&mut self, sim: &S) {
        let nodes = sim.nodes();
        for node in nodes {
            if let Some(handle) = self.node_handles.get_mut(&node.key) {
                handle.update_position(node.pos);
            }
        }

        for link in sim.links() {
            let (Some(source), Some(target)) = (nodes.get(link.source), nodes.get(link.target))
            else {
                continue;
            };
            if let Some(handle) = self.link_handles.get_mut(&link.key) {
                handle.update_position(LinkEnds {
                    source: source.pos,
                    target: target.pos,
                });
            }
        }
    }
}
