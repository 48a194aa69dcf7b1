use eframe::egui::{Vec2, vec2};

use crate::papers::{ExpansionBatch, RawEdge, RawNode};

use super::bridge::HostBridge;
use super::filter::{Density, DisplayFilter, DisplayGraph, EdgeMode, RelationToggles};
use super::highlight::{Highlight, display_adjacency, isolation_set, neighborhood};
use super::interaction::{DragMode, Interaction};
use super::model::{ClusterMode, GraphModel, GroupingConfig, MergeOutcome};
use super::physics::{SimState, Simulation, SimulationConfig, SpringLink};
use super::viewport::{Viewport, ViewportLimits, world_bounds};

/// Simulation space is centred on the origin; the default camera maps it to
/// the middle of the canvas.
pub const WORLD_CENTER: Vec2 = Vec2::ZERO;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EngineConfig {
    pub simulation: SimulationConfig,
    pub viewport: ViewportLimits,
    pub grouping: GroupingConfig,
}

/// Host-controlled display state. `Default` is what a reset token restores.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineOptions {
    pub show_labels: bool,
    pub filter: DisplayFilter,
    pub cluster_mode: ClusterMode,
    pub neighbor_depth: usize,
    pub drag_mode: DragMode,
    pub focus: String,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            show_labels: true,
            filter: DisplayFilter::default(),
            cluster_mode: ClusterMode::default(),
            neighbor_depth: 1,
            drag_mode: DragMode::default(),
            focus: String::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LayoutStatus {
    Active,
    Settled,
    Frozen,
    Stopped,
}

impl LayoutStatus {
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Active",
            Self::Settled => "Settled",
            Self::Frozen => "Frozen",
            Self::Stopped => "Stopped",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EngineStats {
    pub nodes: usize,
    pub edges: usize,
    pub displayed_edges: usize,
    pub visible_nodes: usize,
    pub pinned: usize,
    pub density: &'static str,
    pub status: LayoutStatus,
    pub energy: f32,
    pub seed_label: Option<String>,
    pub fallback: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub moved: bool,
    pub flying: bool,
}

impl TickOutcome {
    pub fn needs_repaint(self) -> bool {
        self.moved || self.flying
    }
}

/// The whole visualizer: model, layout, camera and pointer state, advanced
/// by one `tick` per frame. Holds no global state.
pub struct GraphEngine {
    pub(super) model: GraphModel,
    pub(super) simulation: Simulation,
    pub(super) viewport: Viewport,
    pub(super) interaction: Interaction,
    pub(super) options: EngineOptions,
    pub(super) config: EngineConfig,
    pub(super) display: DisplayGraph,
    pub(super) adjacency: Vec<Vec<(usize, usize)>>,
    pub(super) links: Vec<SpringLink>,
    pub(super) highlight: Option<Highlight>,
    running: bool,
    reset_token: u64,
}

impl GraphEngine {
    pub fn new(size: Vec2, config: EngineConfig, options: EngineOptions) -> Self {
        let model = GraphModel::fallback(config.grouping);
        let viewport = Viewport::new(size, config.viewport);
        let simulation = Simulation::seeded(&model, options.cluster_mode, WORLD_CENTER, size);
        let mut engine = Self {
            model,
            simulation,
            viewport,
            interaction: Interaction::default(),
            options,
            config,
            display: DisplayGraph::default(),
            adjacency: Vec::new(),
            links: Vec::new(),
            highlight: None,
            running: true,
            reset_token: 0,
        };
        engine.refresh_display();
        engine
    }

    /// Replaces the graph wholesale. Any fly-to, hover and selection state
    /// belongs to the old data and is dropped.
    pub fn load(&mut self, nodes: &[RawNode], edges: &[RawEdge]) {
        self.model = GraphModel::normalize(nodes, edges, self.config.grouping);
        tracing::info!(
            nodes = self.model.len(),
            edges = self.model.edges().len(),
            dropped_edges = self.model.dropped_edges(),
            fallback = self.model.is_fallback(),
            "graph normalized"
        );

        self.interaction = Interaction::default();
        self.reseed();
        self.refresh_display();
        self.running = true;
    }

    /// Additive expansion merge; known nodes keep their layout.
    pub fn merge_expansion(&mut self, batch: &ExpansionBatch) -> MergeOutcome {
        let previous = self.model.clone();
        let outcome = self
            .model
            .merge(&batch.nodes, &batch.edges, self.config.grouping);
        if outcome.is_empty() {
            tracing::debug!(node = %batch.node_id, "expansion returned nothing new");
            return outcome;
        }

        self.simulation = self.simulation.carried_over(
            &previous,
            &self.model,
            WORLD_CENTER,
            self.config.simulation.reheat_alpha,
        );
        self.interaction.remap(&previous, &self.model);
        self.refresh_display();
        outcome
    }

    fn reseed(&mut self) {
        let frozen = self.simulation.is_frozen();
        self.simulation = Simulation::seeded(
            &self.model,
            self.options.cluster_mode,
            WORLD_CENTER,
            self.viewport.size(),
        );
        self.simulation.set_frozen(frozen);
        self.viewport.cancel_flight();
    }

    pub(super) fn refresh_display(&mut self) {
        let isolation = self
            .interaction
            .isolated
            .as_deref()
            .and_then(|id| self.model.index_of(id))
            .map(|index| isolation_set(&self.model, index));
        self.display = DisplayGraph::build(&self.model, &self.options.filter, isolation.as_ref());
        self.adjacency = display_adjacency(&self.model, &self.display);
        self.links = SpringLink::for_display(
            &self.model,
            &self.display,
            &self.config.simulation,
            self.options.filter.density == Density::Dense,
        );

        if self
            .interaction
            .hovered_node
            .is_some_and(|index| !self.display.is_visible(index))
        {
            self.interaction.hovered_node = None;
        }
        self.interaction.hovered_edge = None;
        self.interaction.mark_dirty();
        self.refresh_highlight();
    }

    /// Neighborhood around the hovered node, or the selected one when nothing
    /// is hovered.
    pub(super) fn refresh_highlight(&mut self) {
        self.highlight = self
            .interaction
            .hovered_node
            .or_else(|| self.selected_index())
            .filter(|&index| self.display.is_visible(index))
            .map(|index| neighborhood(&self.adjacency, index, self.options.neighbor_depth));
    }

    fn display_changed(&mut self) {
        self.refresh_display();
        self.simulation.invalidate(self.config.simulation.reheat_alpha);
    }

    pub fn resize(&mut self, size: Vec2) {
        self.viewport.resize(size);
    }

    /// One frame: staged input, integration, camera easing, then hover
    /// hit-testing. Painting is a separate read-only pass.
    pub fn tick(&mut self, bridge: &mut dyn HostBridge) -> TickOutcome {
        if !self.running {
            return TickOutcome::default();
        }

        self.apply_staged_input();
        let moved = self.simulation.step(
            &self.links,
            &self.display.node_visible,
            WORLD_CENTER,
            &self.config.simulation,
        );
        let flying = self.viewport.advance();
        if self.interaction.take_dirty() {
            self.update_hover(bridge);
        }

        TickOutcome { moved, flying }
    }

    pub fn stop(&mut self) {
        self.running = false;
        self.viewport.cancel_flight();
        self.interaction.discard_pending();
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn model(&self) -> &GraphModel {
        &self.model
    }

    pub fn simulation(&self) -> &Simulation {
        &self.simulation
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn display(&self) -> &DisplayGraph {
        &self.display
    }

    pub fn highlight(&self) -> Option<&Highlight> {
        self.highlight.as_ref()
    }

    pub fn set_show_labels(&mut self, show: bool) {
        self.options.show_labels = show;
    }

    pub fn set_density(&mut self, density: Density) {
        if self.options.filter.density != density {
            self.options.filter.density = density;
            self.display_changed();
        }
    }

    pub fn set_edge_mode(&mut self, mode: EdgeMode) {
        if self.options.filter.edge_mode != mode {
            self.options.filter.edge_mode = mode;
            self.display_changed();
        }
    }

    pub fn set_relations(&mut self, relations: RelationToggles) {
        if self.options.filter.relations != relations {
            self.options.filter.relations = relations;
            self.display_changed();
        }
    }

    pub fn toggle_source(&mut self, source: &str) {
        let all = self.model.sources();
        self.options.filter.toggle_source(source, &all);
        self.display_changed();
    }

    pub fn set_focus(&mut self, term: &str) {
        self.options.focus = term.trim().to_owned();
    }

    /// Lowercased focus term, `None` when the filter is off.
    pub fn focus_term(&self) -> Option<String> {
        (!self.options.focus.is_empty()).then(|| self.options.focus.to_lowercase())
    }

    /// Reseeds the layout around the new cluster centres.
    pub fn set_cluster_mode(&mut self, mode: ClusterMode) {
        if self.options.cluster_mode != mode {
            self.options.cluster_mode = mode;
            self.relayout();
        }
    }

    /// Discards the current layout and seeds it again.
    pub fn relayout(&mut self) {
        self.reseed();
        self.refresh_display();
    }

    pub fn set_neighbor_depth(&mut self, depth: usize) {
        self.options.neighbor_depth = depth.clamp(1, 3);
        self.refresh_highlight();
    }

    pub fn set_drag_mode(&mut self, mode: DragMode) {
        self.options.drag_mode = mode;
    }

    pub fn set_frozen(&mut self, frozen: bool) {
        self.simulation.set_frozen(frozen);
    }

    pub fn set_simulation_config(&mut self, config: SimulationConfig) {
        self.config.simulation = config;
        self.display_changed();
    }

    /// Restores default options and camera when `token` is newer than the
    /// last one seen. Returns whether a reset happened.
    pub fn apply_reset(&mut self, token: u64) -> bool {
        if token <= self.reset_token {
            return false;
        }
        self.reset_token = token;

        let defaults = EngineOptions::default();
        self.options.show_labels = defaults.show_labels;
        self.options.filter = defaults.filter;
        self.options.focus = defaults.focus;
        self.interaction.isolated = None;
        self.viewport.reset();
        self.display_changed();
        tracing::debug!(token, "view reset");
        true
    }

    pub fn reset_token(&self) -> u64 {
        self.reset_token
    }

    pub fn clear_pins(&mut self) {
        self.simulation
            .clear_pins(self.config.simulation.reheat_alpha);
    }

    pub fn unpin(&mut self, id: &str) {
        if let Some(index) = self.model.index_of(id) {
            self.simulation
                .unpin(index, self.config.simulation.reheat_alpha);
        }
    }

    /// `(id, label)` of every pinned node.
    pub fn pinned_nodes(&self) -> Vec<(&str, &str)> {
        self.simulation
            .pinned_indices()
            .filter_map(|index| self.model.node(index))
            .map(|node| (node.id.as_str(), node.label.as_str()))
            .collect()
    }

    pub fn fit_to_view(&mut self) {
        let bounds = world_bounds(
            self.simulation
                .positions()
                .iter()
                .enumerate()
                .filter(|(index, _)| self.display.is_visible(*index))
                .map(|(_, position)| *position),
        );
        self.viewport.fit_to(bounds);
    }

    pub fn reset_view(&mut self) {
        self.viewport.reset();
    }

    pub fn zoom_in(&mut self) {
        self.viewport.zoom_in();
    }

    pub fn zoom_out(&mut self) {
        self.viewport.zoom_out();
    }

    pub fn status(&self) -> LayoutStatus {
        if !self.running {
            LayoutStatus::Stopped
        } else if self.simulation.is_frozen() {
            LayoutStatus::Frozen
        } else if self.simulation.state() == SimState::Settled {
            LayoutStatus::Settled
        } else {
            LayoutStatus::Active
        }
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            nodes: self.model.len(),
            edges: self.model.edges().len(),
            displayed_edges: self.display.edges.len(),
            visible_nodes: self.display.visible_count(),
            pinned: self.simulation.pinned_indices().count(),
            density: self.options.filter.density.label(),
            status: self.status(),
            energy: self.simulation.energy(),
            seed_label: self
                .model
                .core_index()
                .and_then(|index| self.model.node(index))
                .map(|node| node.label.clone()),
            fallback: self.model.is_fallback(),
        }
    }
}

impl Default for GraphEngine {
    fn default() -> Self {
        Self::new(
            vec2(960.0, 640.0),
            EngineConfig::default(),
            EngineOptions::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::bridge::{BridgeEvent, BridgeEvents};
    use crate::papers::{GraphPayload, PaperCorpus};

    fn engine() -> GraphEngine {
        GraphEngine::new(
            vec2(800.0, 600.0),
            EngineConfig::default(),
            EngineOptions::default(),
        )
    }

    #[test]
    fn starts_on_fallback_graph() {
        let engine = engine();
        let stats = engine.stats();
        assert!(stats.fallback);
        assert_eq!(stats.nodes, 6);
        assert_eq!(stats.edges, 5);
        assert_eq!(stats.displayed_edges, 3);
        assert_eq!(stats.seed_label.as_deref(), Some("Graph Neural Networks"));
    }

    #[test]
    fn expansion_twice_matches_expansion_once() {
        let mut engine = engine();
        let batch = ExpansionBatch {
            node_id: "n3".into(),
            nodes: vec![RawNode::new("n7", "Retrieval Eval")],
            edges: vec![RawEdge::new("n3", "n7"), RawEdge::new("n3", "abcdef123")],
        };

        let first = engine.merge_expansion(&batch);
        assert_eq!(first.added_edges, 2);
        let counts = (engine.model().len(), engine.model().edges().len());
        let second = engine.merge_expansion(&batch);
        assert!(second.is_empty());
        assert_eq!((engine.model().len(), engine.model().edges().len()), counts);
        assert_eq!(engine.simulation().len(), engine.model().len());
    }

    #[test]
    fn expansion_brings_back_truncated_neighbors() {
        let full = GraphPayload {
            nodes: vec![
                RawNode::new("a", "Alpha"),
                RawNode::new("b", "Beta"),
                RawNode::new("z", "Zeta"),
            ],
            edges: vec![RawEdge::new("a", "b"), RawEdge::new("a", "z")],
        };
        let corpus = PaperCorpus::from_payload(full.clone());
        let initial = full.with_endpoint_nodes().truncated(2);

        let mut engine = engine();
        engine.load(&initial.nodes, &initial.edges);
        assert!(engine.model().index_of("z").is_none());

        let outcome = engine.merge_expansion(&corpus.expansion_for("a", 20));
        assert_eq!(outcome, MergeOutcome { added_nodes: 1, added_edges: 1 });
        let z = engine.model().index_of("z").unwrap();
        assert_eq!(engine.model().node(z).unwrap().label, "Zeta");
        assert_eq!(engine.model().edges().len(), 2);
        assert_eq!(engine.simulation().len(), 3);
    }

    #[test]
    fn stopped_engine_ignores_ticks() {
        let mut engine = engine();
        let mut events = BridgeEvents::default();
        engine.fit_to_view();
        engine.stop();
        assert!(!engine.viewport().is_flying());

        let before = engine.simulation().positions().to_vec();
        let outcome = engine.tick(&mut events);
        assert_eq!(outcome, TickOutcome::default());
        assert_eq!(engine.simulation().positions(), before.as_slice());
        assert_eq!(engine.status(), LayoutStatus::Stopped);
    }

    #[test]
    fn load_discards_pending_flight() {
        let mut engine = engine();
        engine.fit_to_view();
        assert!(engine.viewport().is_flying());
        engine.load(
            &[RawNode::new("a", "A"), RawNode::new("b", "B")],
            &[RawEdge::new("a", "b"), RawEdge::new("a", "missing")],
        );
        assert!(!engine.viewport().is_flying());
        assert_eq!(engine.model().edges().len(), 1);
        assert!(!engine.stats().fallback);
    }

    #[test]
    fn reset_token_restores_defaults_once() {
        let mut engine = engine();
        engine.set_density(Density::Dense);
        engine.set_show_labels(false);
        engine.set_focus("rag");

        assert!(engine.apply_reset(1));
        assert_eq!(engine.options().filter.density, Density::Sparse);
        assert!(engine.options().show_labels);
        assert!(engine.focus_term().is_none());
        assert!(engine.viewport().is_flying());

        assert!(!engine.apply_reset(1));
        assert!(!engine.apply_reset(0));
    }

    #[test]
    fn layout_settles_and_reports_status() {
        let mut engine = engine();
        let mut events = BridgeEvents::default();
        for _ in 0..300 {
            engine.tick(&mut events);
        }
        assert_eq!(engine.status(), LayoutStatus::Settled);

        engine.set_frozen(true);
        assert_eq!(engine.status(), LayoutStatus::Frozen);
        assert!(
            !events
                .events()
                .iter()
                .any(|event| matches!(event, BridgeEvent::NodeClick { .. }))
        );
    }

    #[test]
    fn cluster_mode_change_reseeds() {
        let mut engine = engine();
        let before = engine.simulation().positions().to_vec();
        engine.set_cluster_mode(ClusterMode::None);
        assert_ne!(engine.simulation().positions(), before.as_slice());
        assert_eq!(engine.simulation().state(), SimState::Active);
    }
}
