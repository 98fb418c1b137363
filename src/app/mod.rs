use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use eframe::egui::{self, Context, Vec2};
use tracing::{error, info};

use crate::data::{self, GraphDocument, GraphLink, GraphNode};
use crate::force::binder::Binder;
use crate::force::broadcast::Broadcaster;
use crate::force::controller::Controller;
use crate::force::physics::ForceSim;
use crate::force::sim::{LayoutOptions, Simulation};

mod input;
mod render_utils;
mod scene;
mod ui;
mod view;

use scene::{SceneLinkHandle, SceneNodeHandle, SharedScene};

pub struct ForceLabApp {
    graph_path: Option<PathBuf>,
    state: AppState,
    reload_rx: Option<Receiver<Result<GraphDocument, String>>>,
}

enum AppState {
    Loading {
        rx: Receiver<Result<GraphDocument, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

struct ViewModel {
    document: GraphDocument,
    doc_index: HashMap<String, usize>,
    options: LayoutOptions,
    binder: Binder<ForceSim>,
    controller: Controller,
    broadcaster: Broadcaster<SceneNodeHandle, SceneLinkHandle>,
    scene: SharedScene,
    degrees: HashMap<String, usize>,
    pan: Vec2,
    zoom: f32,
    search: String,
    max_nodes: usize,
    binding_stale: bool,
    bind_error: Option<String>,
    brush: Option<BrushState>,
    visible_node_count: usize,
    visible_link_count: usize,
}

// In-progress brush rectangle, in local coordinates.
struct BrushState {
    anchor: Vec2,
    cursor: Vec2,
}

impl ViewModel {
    fn new(document: GraphDocument) -> Result<Self, String> {
        let options = document.options.unwrap_or_default();
        let binder = Binder::create(
            ForceSim::new(options),
            &options,
            &document.nodes,
            &document.links,
        )
        .map_err(|error| error.to_string())?;

        let max_nodes = document.nodes.len().max(1);
        let mut model = Self {
            doc_index: index_by_name(&document),
            document,
            options,
            binder,
            controller: Controller::new(),
            broadcaster: Broadcaster::new(),
            scene: SharedScene::default(),
            degrees: HashMap::new(),
            pan: Vec2::ZERO,
            zoom: 1.0,
            search: String::new(),
            max_nodes,
            binding_stale: false,
            bind_error: None,
            brush: None,
            visible_node_count: 0,
            visible_link_count: 0,
        };
        model.refresh_projection();
        Ok(model)
    }

    fn show(&mut self, ctx: &Context, reload_requested: &mut bool, is_reloading: bool) {
        if self.binding_stale {
            self.binding_stale = false;
            self.sync_binding();
        }

        egui::SidePanel::left("forcelab-controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.controls_panel(ui, reload_requested, is_reloading);
                    ui.separator();
                    self.details_panel(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_graph(ui);
        });
    }

    // The desired node/link description handed to the binder: the loaded
    // document, optionally cut down to the highest-degree nodes. Selected
    // and focused nodes always survive the cut so interaction state cannot
    // vanish underneath the user.
    fn desired_sets(&self) -> (Vec<GraphNode>, Vec<GraphLink>) {
        if self.document.nodes.len() <= self.max_nodes {
            return (self.document.nodes.clone(), self.document.links.clone());
        }

        let mut degree: HashMap<&str, usize> = HashMap::new();
        for link in &self.document.links {
            *degree.entry(link.source.as_str()).or_default() += 1;
            *degree.entry(link.target.as_str()).or_default() += 1;
        }

        let mut ranked = self.document.nodes.iter().collect::<Vec<_>>();
        ranked.sort_by(|a, b| {
            let degree_a = degree.get(a.name.as_str()).copied().unwrap_or(0);
            let degree_b = degree.get(b.name.as_str()).copied().unwrap_or(0);
            degree_b.cmp(&degree_a).then_with(|| a.name.cmp(&b.name))
        });

        let mut keep = Vec::with_capacity(self.max_nodes);
        let mut kept_keys = std::collections::HashSet::new();
        for node in self.document.nodes.iter().filter(|node| {
            self.controller.is_selected(&node.name)
                || self.controller.focused_node() == Some(node.name.as_str())
        }) {
            if kept_keys.insert(node.name.as_str()) {
                keep.push(node.clone());
            }
        }
        for node in ranked {
            if keep.len() >= self.max_nodes {
                break;
            }
            if kept_keys.insert(node.name.as_str()) {
                keep.push(node.clone());
            }
        }

        let links = self
            .document
            .links
            .iter()
            .filter(|link| {
                kept_keys.contains(link.source.as_str()) && kept_keys.contains(link.target.as_str())
            })
            .cloned()
            .collect::<Vec<_>>();

        (keep, links)
    }

    fn sync_binding(&mut self) {
        let (nodes, links) = self.desired_sets();
        match self.binder.update(&self.options, &nodes, &links) {
            Ok(_restarted) => {
                self.bind_error = None;
                self.refresh_projection();
            }
            Err(bind_error) => {
                error!(%bind_error, "graph update rejected");
                self.bind_error = Some(bind_error.to_string());
            }
        }
    }

    // Reconcile handles and push one snapshot so the scene is never stale
    // after a structural change, even before the next tick fires.
    fn refresh_projection(&mut self) {
        self.controller.retain_existing(self.binder.sim());

        let scene = &self.scene;
        self.broadcaster.sync(
            self.binder.sim(),
            |key| SceneNodeHandle::new(scene.clone(), key),
            |key| SceneLinkHandle::new(scene.clone(), key),
        );
        self.broadcaster.broadcast(self.binder.sim());

        self.degrees.clear();
        for link in self.binder.sim().links() {
            *self.degrees.entry(link.source_key.clone()).or_default() += 1;
            *self.degrees.entry(link.target_key.clone()).or_default() += 1;
        }
        self.visible_node_count = self.binder.sim().nodes().len();
        self.visible_link_count = self.binder.sim().links().len();
    }

    fn document_node(&self, key: &str) -> Option<&GraphNode> {
        self.doc_index
            .get(key)
            .and_then(|index| self.document.nodes.get(*index))
    }

    fn degree_of(&self, key: &str) -> usize {
        self.degrees.get(key).copied().unwrap_or(0)
    }
}

fn index_by_name(document: &GraphDocument) -> HashMap<String, usize> {
    document
        .nodes
        .iter()
        .enumerate()
        .map(|(index, node)| (node.name.clone(), index))
        .collect()
}

impl ForceLabApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, graph_path: Option<PathBuf>) -> Self {
        let state = Self::start_load(graph_path.clone());
        Self {
            graph_path,
            state,
            reload_rx: None,
        }
    }

    fn spawn_load(graph_path: Option<PathBuf>) -> Receiver<Result<GraphDocument, String>> {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = match &graph_path {
                Some(path) => data::load_graph(path).map_err(|error| error.to_string()),
                None => Ok(data::demo_graph()),
            };
            match &result {
                Ok(document) => info!(
                    nodes = document.nodes.len(),
                    links = document.links.len(),
                    "graph document loaded"
                ),
                Err(message) => error!(%message, "graph document load failed"),
            }
            let _ = tx.send(result);
        });

        rx
    }

    fn start_load(graph_path: Option<PathBuf>) -> AppState {
        AppState::Loading {
            rx: Self::spawn_load(graph_path),
        }
    }
}

fn ready_state(result: Result<GraphDocument, String>) -> AppState {
    match result.and_then(ViewModel::new) {
        Ok(model) => AppState::Ready(Box::new(model)),
        Err(message) => AppState::Error(message),
    }
}

impl eframe::App for ForceLabApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                if let Ok(result) = rx.try_recv() {
                    transition = Some(ready_state(result));
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading graph document...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(message) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load graph document");
                    ui.add_space(6.0);
                    ui.label(message.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.graph_path.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                let is_reloading = self.reload_rx.is_some();
                model.show(ctx, &mut reload_requested, is_reloading);

                if reload_requested && self.reload_rx.is_none() {
                    self.reload_rx = Some(Self::spawn_load(self.graph_path.clone()));
                }

                if let Some(rx) = self.reload_rx.take() {
                    match rx.try_recv() {
                        Ok(result) => {
                            transition = Some(ready_state(result));
                        }
                        Err(TryRecvError::Empty) => {
                            self.reload_rx = Some(rx);
                        }
                        Err(TryRecvError::Disconnected) => {
                            transition = Some(AppState::Error(
                                "Background load worker disconnected".to_owned(),
                            ));
                        }
                    }
                }
            }
        }

        if let Some(next_state) = transition {
            self.reload_rx = None;
            self.state = next_state;
        }
    }
}
