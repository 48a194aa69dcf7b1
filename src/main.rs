mod app;
mod papers;
mod util;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum DragArg {
    /// Released nodes rejoin the simulation.
    #[default]
    Transient,
    /// Released nodes stay pinned where they were dropped.
    Pin,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Initial graph JSON (nodes/edges or a bare edge list). Without it a
    /// sample graph is shown.
    #[arg(long)]
    graph: Option<PathBuf>,

    /// Paper corpus answering neighbor expansion; defaults to the graph file.
    #[arg(long)]
    corpus: Option<PathBuf>,

    /// Show every edge instead of every other one.
    #[arg(long)]
    dense: bool,

    #[arg(long)]
    no_labels: bool,

    /// Initial focus term; non-matching papers are dimmed.
    #[arg(long, default_value = "")]
    focus: String,

    /// Neighbors fetched per expansion.
    #[arg(long, default_value_t = 20)]
    neighbor_limit: usize,

    #[arg(long, value_enum, default_value_t = DragArg::Transient)]
    drag_mode: DragArg,

    /// TTF/OTF font used for labels in exported PNGs.
    #[arg(long)]
    export_font: Option<PathBuf>,

    /// Nodes kept from the initial graph.
    #[arg(long, default_value_t = 100)]
    max_nodes: usize,

    /// Emit logs as JSON lines.
    #[arg(long)]
    log_json: bool,
}

impl Args {
    fn settings(self) -> app::AppSettings {
        app::AppSettings {
            graph: self.graph,
            corpus: self.corpus,
            dense: self.dense,
            show_labels: !self.no_labels,
            focus: self.focus,
            neighbor_limit: self.neighbor_limit.max(1),
            pin_on_drag: self.drag_mode == DragArg::Pin,
            export_font: self.export_font,
            max_nodes: self.max_nodes.max(1),
        }
    }
}

fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("paper_graph=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> eframe::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_json);

    let settings = args.settings();
    tracing::info!(
        graph = ?settings.graph,
        corpus = ?settings.corpus,
        "starting paper-graph"
    );

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "paper-graph",
        options,
        Box::new(move |cc| Ok(Box::new(app::PaperGraphApp::new(cc, settings)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard() {
        let settings = Args::parse_from(["paper-graph"]).settings();
        assert!(settings.graph.is_none());
        assert!(settings.show_labels);
        assert!(!settings.dense);
        assert!(!settings.pin_on_drag);
        assert_eq!(settings.neighbor_limit, 20);
        assert_eq!(settings.max_nodes, 100);
    }

    #[test]
    fn flags_map_onto_settings() {
        let settings = Args::parse_from([
            "paper-graph",
            "--graph",
            "graph.json",
            "--dense",
            "--no-labels",
            "--drag-mode",
            "pin",
            "--focus",
            "diffusion",
            "--neighbor-limit",
            "0",
        ])
        .settings();
        assert_eq!(settings.graph, Some(PathBuf::from("graph.json")));
        assert!(settings.dense);
        assert!(!settings.show_labels);
        assert!(settings.pin_on_drag);
        assert_eq!(settings.focus, "diffusion");
        assert_eq!(settings.neighbor_limit, 1);
    }
}
