use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use anyhow::{Context as _, Result};
use eframe::egui::{self, Context};

use crate::papers::{GraphPayload, PaperCorpus, load_corpus, load_graph_payload};

mod bridge;
mod engine;
mod expansion;
mod export;
mod filter;
mod highlight;
mod interaction;
mod model;
mod physics;
mod render;
mod render_utils;
mod ui;
mod viewport;

use bridge::{BridgeEvents, HoverEdge, HoverNode};
use engine::GraphEngine;
use expansion::ExpansionWorker;

/// Startup choices taken from the command line.
#[derive(Clone, Debug)]
pub struct AppSettings {
    pub graph: Option<PathBuf>,
    pub corpus: Option<PathBuf>,
    pub dense: bool,
    pub show_labels: bool,
    pub focus: String,
    pub neighbor_limit: usize,
    pub pin_on_drag: bool,
    pub export_font: Option<PathBuf>,
    pub max_nodes: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            graph: None,
            corpus: None,
            dense: false,
            show_labels: true,
            focus: String::new(),
            neighbor_limit: 20,
            pin_on_drag: false,
            export_font: None,
            max_nodes: 100,
        }
    }
}

pub struct PaperGraphApp {
    settings: AppSettings,
    state: AppState,
}

enum AppState {
    Loading {
        rx: Receiver<Result<LoadedGraph, String>>,
    },
    Ready(Box<ViewModel>),
    Error(String),
}

/// Everything the loader thread hands to the UI thread.
struct LoadedGraph {
    payload: GraphPayload,
    corpus: Option<PaperCorpus>,
    source: String,
}

struct ViewModel {
    engine: GraphEngine,
    events: BridgeEvents,
    source: String,
    expansion: Option<ExpansionWorker>,
    locked: Option<String>,
    hover_node: Option<HoverNode>,
    hover_edge: Option<HoverEdge>,
    search: String,
    export_font: Option<fontdue::Font>,
    export_legend: bool,
    export_path: String,
    status_message: Option<String>,
    show_physics: bool,
    pointer_on_canvas: bool,
}

impl PaperGraphApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, settings: AppSettings) -> Self {
        let state = Self::start_load(settings.clone());
        Self { settings, state }
    }

    fn start_load(settings: AppSettings) -> AppState {
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let result = load_graph(&settings).map_err(|error| format!("{error:#}"));
            let _ = tx.send(result);
        });

        AppState::Loading { rx }
    }
}

/// Reads the initial graph and the expansion corpus. Without a graph file the
/// engine falls back to its sample graph.
fn load_graph(settings: &AppSettings) -> Result<LoadedGraph> {
    let Some(graph_path) = settings.graph.as_deref() else {
        let corpus = match settings.corpus.as_deref() {
            Some(path) => Some(load_corpus(path)?),
            None => None,
        };
        return Ok(LoadedGraph {
            payload: GraphPayload::default(),
            corpus,
            source: "sample graph".to_owned(),
        });
    };

    let full = load_graph_payload(graph_path).context("failed to load initial graph")?;
    let corpus = match settings.corpus.as_deref() {
        Some(path) => load_corpus(path)?,
        None => PaperCorpus::from_payload(full.clone()),
    };
    let payload = full.with_endpoint_nodes().truncated(settings.max_nodes);
    tracing::info!(
        path = %graph_path.display(),
        nodes = payload.nodes.len(),
        edges = payload.edges.len(),
        "initial graph loaded"
    );

    Ok(LoadedGraph {
        payload,
        corpus: Some(corpus),
        source: graph_path.display().to_string(),
    })
}

impl eframe::App for PaperGraphApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        let mut transition = None;

        match &mut self.state {
            AppState::Loading { rx } => {
                match rx.try_recv() {
                    Ok(result) => {
                        transition = Some(match result {
                            Ok(loaded) => AppState::Ready(Box::new(ViewModel::new(
                                loaded,
                                self.settings.clone(),
                            ))),
                            Err(error) => AppState::Error(error),
                        });
                    }
                    Err(TryRecvError::Empty) => ctx.request_repaint(),
                    Err(TryRecvError::Disconnected) => {
                        transition =
                            Some(AppState::Error("Background load worker disconnected".to_owned()));
                    }
                }

                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(120.0);
                        ui.heading("Loading paper graph...");
                        ui.add_space(8.0);
                        ui.spinner();
                    });
                });
            }
            AppState::Error(error) => {
                egui::CentralPanel::default().show(ctx, |ui| {
                    ui.heading("Failed to load paper graph");
                    ui.add_space(6.0);
                    ui.label(error.as_str());
                    ui.add_space(10.0);
                    if ui.button("Retry").clicked() {
                        transition = Some(Self::start_load(self.settings.clone()));
                    }
                });
            }
            AppState::Ready(model) => {
                let mut reload_requested = false;
                model.show(ctx, &mut reload_requested);
                if reload_requested {
                    transition = Some(Self::start_load(self.settings.clone()));
                }
            }
        }

        if let Some(next_state) = transition {
            self.state = next_state;
        }
    }
}

impl ViewModel {
    fn new(loaded: LoadedGraph, settings: AppSettings) -> Self {
        let mut options = engine::EngineOptions {
            show_labels: settings.show_labels,
            focus: settings.focus.clone(),
            ..Default::default()
        };
        if settings.dense {
            options.filter.density = filter::Density::Dense;
        }
        if settings.pin_on_drag {
            options.drag_mode = interaction::DragMode::Pin;
        }

        let mut engine = GraphEngine::new(
            egui::vec2(960.0, 640.0),
            engine::EngineConfig::default(),
            options,
        );
        if !loaded.payload.nodes.is_empty() {
            engine.load(&loaded.payload.nodes, &loaded.payload.edges);
        }

        let expansion = loaded
            .corpus
            .map(|corpus| ExpansionWorker::spawn(Arc::new(corpus), settings.neighbor_limit));

        let export_font = settings.export_font.as_deref().and_then(|path| {
            export::load_export_font(path)
                .inspect_err(|error| tracing::warn!(%error, "export labels disabled"))
                .ok()
        });

        Self {
            engine,
            events: BridgeEvents::default(),
            search: settings.focus,
            source: loaded.source,
            expansion,
            locked: None,
            hover_node: None,
            hover_edge: None,
            export_font,
            export_legend: true,
            export_path: "graph.png".to_owned(),
            status_message: None,
            show_physics: false,
            pointer_on_canvas: false,
        }
    }
}
