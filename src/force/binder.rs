use std::collections::{HashMap, HashSet, hash_map::Entry};

use eframe::egui::{Vec2, vec2};
use thiserror::Error;
use tracing::{debug, warn};

use crate::data::{GraphLink, GraphNode, link_key, node_key};
use crate::util::stable_pair;

use super::diff::{diff, key_set};
use super::sim::{LayoutOptions, SimLink, SimNode, Simulation};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum BindError {
    #[error("link {link} references unknown node key \"{key}\"")]
    UnknownEndpoint { link: String, key: String },
    #[error("graph contains an entity with an empty key")]
    EmptyKey,
}

// Owns the live simulation plus the commit map (key -> node index), the
// single source of truth for which keys already carry physics state.
pub struct Binder<S: Simulation> {
    sim: S,
    committed: HashMap<String, usize>,
}

impl<S: Simulation> Binder<S> {
    pub fn new(sim: S) -> Self {
        Self {
            sim,
            committed: HashMap::new(),
        }
    }

    pub fn create(
        sim: S,
        options: &LayoutOptions,
        nodes: &[GraphNode],
        links: &[GraphLink],
    ) -> Result<Self, BindError> {
        let mut binder = Self::new(sim);
        binder.update(options, nodes, links)?;
        Ok(binder)
    }

    pub fn sim(&self) -> &S {
        &self.sim
    }

    pub fn sim_mut(&mut self) -> &mut S {
        &mut self.sim
    }

    pub fn node_index(&self, key: &str) -> Option<usize> {
        self.committed.get(key).copied()
    }

    pub fn position(&self, key: &str) -> Option<Vec2> {
        self.node_index(key)
            .and_then(|index| self.sim.nodes().get(index))
            .map(|node| node.pos)
    }

    // Reconcile the desired node/link description with the live simulation.
    // Returns whether the integrator was (re)started. Nothing is committed
    // until every phase has validated, so a failed update leaves the
    // previous consistent state fully intact.
    pub fn update(
        &mut self,
        options: &LayoutOptions,
        nodes: &[GraphNode],
        links: &[GraphLink],
    ) -> Result<bool, BindError> {
        let mut dirty = false;

        // Size phase.
        let current_options = self.sim.options();
        let mut next_options = current_options;
        if next_options.size != options.size {
            next_options.size = options.size;
            dirty = true;
        }

        // Parameter phase: per-field value comparison, so an options value
        // that merely arrived in a fresh struct never forces a restart.
        if next_options.gravity != options.gravity {
            next_options.gravity = options.gravity;
            dirty = true;
        }
        if next_options.friction != options.friction {
            next_options.friction = options.friction;
            dirty = true;
        }
        if next_options.charge != options.charge {
            next_options.charge = options.charge;
            dirty = true;
        }
        if next_options.link_distance != options.link_distance {
            next_options.link_distance = options.link_distance;
            dirty = true;
        }
        if next_options.link_strength != options.link_strength {
            next_options.link_strength = options.link_strength;
            dirty = true;
        }
        if next_options.theta != options.theta {
            next_options.theta = options.theta;
            dirty = true;
        }

        // Topology phase, nodes first.
        let previous_keys = self.committed.keys().cloned().collect::<HashSet<_>>();
        let mut next_keys = HashSet::with_capacity(nodes.len());
        for node in nodes {
            let key = node_key(node);
            if key.trim().is_empty() {
                return Err(BindError::EmptyKey);
            }
            next_keys.insert(key.to_owned());
        }
        let node_diff = diff(&previous_keys, &next_keys);

        let mut staged_nodes: Option<(Vec<SimNode>, HashMap<String, usize>)> = None;
        if !node_diff.unchanged {
            let mut next_nodes: Vec<SimNode> = Vec::with_capacity(nodes.len());
            let mut next_map: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
            for node in nodes {
                let key = node_key(node).to_owned();
                // The desired node seeds brand-new keys only; a retained key
                // keeps its committed physics state wholesale.
                let staged = match self.committed.get(&key) {
                    Some(&index) => self.sim.nodes()[index].clone(),
                    None => SimNode::seeded(key.clone(), seed_position(node, options), node.pinned),
                };
                match next_map.entry(key) {
                    Entry::Occupied(entry) => {
                        warn!(key = %entry.key(), "duplicate node key; last occurrence wins");
                        next_nodes[*entry.get()] = staged;
                    }
                    Entry::Vacant(entry) => {
                        entry.insert(next_nodes.len());
                        next_nodes.push(staged);
                    }
                }
            }
            debug!(
                added = node_diff.added.len(),
                removed = node_diff.removed.len(),
                "node set changed"
            );
            staged_nodes = Some((next_nodes, next_map));
            dirty = true;
        }

        // Topology phase, links. Forced whenever node identities changed:
        // endpoint indices are stale even if no link itself changed.
        let previous_link_keys = key_set(self.sim.links(), |link| link.key.clone());
        let mut next_link_keys = HashSet::with_capacity(links.len());
        for link in links {
            if link.source.trim().is_empty() || link.target.trim().is_empty() {
                return Err(BindError::EmptyKey);
            }
            next_link_keys.insert(link_key(&link.source, &link.target));
        }
        let link_diff = diff(&previous_link_keys, &next_link_keys);

        let mut staged_links: Option<Vec<SimLink>> = None;
        if !link_diff.unchanged || staged_nodes.is_some() {
            let commit_map = staged_nodes
                .as_ref()
                .map(|(_, map)| map)
                .unwrap_or(&self.committed);
            let mut next_links = Vec::with_capacity(links.len());
            for link in links {
                let key = link_key(&link.source, &link.target);
                let source = resolve_endpoint(commit_map, &key, &link.source)?;
                let target = resolve_endpoint(commit_map, &key, &link.target)?;
                next_links.push(SimLink {
                    key,
                    source_key: link.source.clone(),
                    target_key: link.target.clone(),
                    source,
                    target,
                });
            }
            staged_links = Some(next_links);
            dirty = true;
        }

        // Commit.
        if next_options != current_options {
            self.sim.set_options(next_options);
        }
        if let Some((next_nodes, next_map)) = staged_nodes {
            self.sim.set_nodes(next_nodes);
            self.committed = next_map;
        }
        if let Some(next_links) = staged_links {
            self.sim.set_links(next_links);
        }

        if dirty {
            debug!(
                nodes = self.sim.nodes().len(),
                links = self.sim.links().len(),
                "layout marked dirty; restarting integrator"
            );
            self.sim.start();
        }
        Ok(dirty)
    }
}

fn resolve_endpoint(
    commit_map: &HashMap<String, usize>,
    link: &str,
    endpoint: &str,
) -> Result<usize, BindError> {
    commit_map
        .get(endpoint)
        .copied()
        .ok_or_else(|| BindError::UnknownEndpoint {
            link: link.to_owned(),
            key: endpoint.to_owned(),
        })
}

fn seed_position(node: &GraphNode, options: &LayoutOptions) -> Vec2 {
    let center = options.center();
    let (jitter_x, jitter_y) = stable_pair(node_key(node));
    let radius = options.size[0].min(options.size[1]) * 0.25;
    vec2(
        node.x.unwrap_or(center.x + jitter_x * radius),
        node.y.unwrap_or(center.y + jitter_y * radius),
    )
}
