use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

use crate::force::sim::LayoutOptions;

#[derive(Clone, Debug, Deserialize)]
pub struct GraphNode {
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub group: Option<u32>,
    #[serde(default)]
    pub x: Option<f32>,
    #[serde(default)]
    pub y: Option<f32>,
    #[serde(default)]
    pub pinned: bool,
}

impl GraphNode {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            label: None,
            group: None,
            x: None,
            y: None,
            pinned: false,
        }
    }

    pub fn at(name: &str, x: f32, y: f32) -> Self {
        Self {
            x: Some(x),
            y: Some(y),
            ..Self::named(name)
        }
    }

    pub fn display_label(&self) -> &str {
        self.label.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
}

impl GraphLink {
    pub fn between(source: &str, target: &str) -> Self {
        Self {
            source: source.to_owned(),
            target: target.to_owned(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<GraphNode>,
    #[serde(default)]
    pub links: Vec<GraphLink>,
    // Layout overrides carried by the document itself; omitted fields keep
    // their defaults.
    #[serde(default)]
    pub options: Option<LayoutOptions>,
}

pub fn node_key(node: &GraphNode) -> &str {
    &node.name
}

// Link identity is ordered, not symmetric: "a-b" and "b-a" are different links.
pub fn link_key(source: &str, target: &str) -> String {
    format!("{source}-{target}")
}

pub fn load_graph(path: &Path) -> Result<GraphDocument> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    let document: GraphDocument = serde_json::from_str(&raw)
        .with_context(|| format!("invalid graph JSON in {}", path.display()))?;

    if document.nodes.is_empty() {
        return Err(anyhow!("graph file {} contains no nodes", path.display()));
    }

    for node in &document.nodes {
        if node.name.trim().is_empty() {
            return Err(anyhow!("graph file contains a node with an empty name"));
        }
    }

    for link in &document.links {
        if link.source.trim().is_empty() || link.target.trim().is_empty() {
            return Err(anyhow!(
                "graph file contains a link with an empty endpoint key"
            ));
        }
    }

    Ok(document)
}

// Small built-in graph so the binary does something without --graph.
pub fn demo_graph() -> GraphDocument {
    let mut nodes = Vec::new();
    let mut links = Vec::new();

    let hubs = [
        ("core", 480.0, 300.0),
        ("render", 330.0, 220.0),
        ("input", 630.0, 220.0),
    ];
    for (group, (hub, x, y)) in hubs.iter().enumerate() {
        let mut node = GraphNode::at(hub, *x, *y);
        node.group = Some(group as u32);
        nodes.push(node);
    }
    links.push(GraphLink::between("core", "render"));
    links.push(GraphLink::between("core", "input"));

    for (group, (hub, _, _)) in hubs.iter().enumerate() {
        for index in 0..4 {
            let name = format!("{hub}-{index}");
            let mut node = GraphNode::named(&name);
            node.group = Some(group as u32);
            nodes.push(node);
            links.push(GraphLink::between(hub, &name));
        }
    }
    links.push(GraphLink::between("render-0", "input-0"));
    links.push(GraphLink::between("render-2", "core-3"));

    GraphDocument {
        nodes,
        links,
        options: None,
    }
}
