use eframe::egui::{Pos2, Vec2};

use crate::util::contains_ignore_case;

use super::bridge::{HostBridge, HoverEdge, HoverNode};
use super::engine::GraphEngine;
use super::model::GraphModel;
use super::render_utils::node_radius;
use super::viewport::scroll_factor;

/// World-space slack added to a node's radius when hit-testing.
const NODE_HIT_TOLERANCE: f32 = 4.0;
/// Screen-space distance within which an edge counts as hovered.
const EDGE_HIT_PIXELS: f32 = 4.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DragMode {
    /// Releasing a dragged node hands it back to the simulation.
    #[default]
    Transient,
    /// Dragged nodes stay where they are dropped.
    Pin,
}

impl DragMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::Transient => "transient",
            Self::Pin => "pin",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
enum DragState {
    #[default]
    Idle,
    Node {
        index: usize,
        was_pinned: bool,
        moved: bool,
    },
    Pan,
}

/// Back/forward list of selected node ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionHistory {
    entries: Vec<String>,
    cursor: usize,
}

impl SelectionHistory {
    pub fn push(&mut self, id: &str) {
        if self.current() == Some(id) {
            return;
        }
        if !self.entries.is_empty() {
            self.entries.truncate(self.cursor + 1);
        }
        self.entries.push(id.to_owned());
        self.cursor = self.entries.len() - 1;
    }

    pub fn current(&self) -> Option<&str> {
        self.entries.get(self.cursor).map(String::as_str)
    }

    pub fn can_go_back(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn back(&mut self) -> Option<&str> {
        if !self.can_go_back() {
            return None;
        }
        self.cursor -= 1;
        self.current()
    }

    pub fn forward(&mut self) -> Option<&str> {
        if !self.can_go_forward() {
            return None;
        }
        self.cursor += 1;
        self.current()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Pointer state. Handlers only stage input here; the tick applies it.
#[derive(Clone, Debug, Default)]
pub(super) struct Interaction {
    pointer: Option<Pos2>,
    pointer_dirty: bool,
    pending_pan: Vec2,
    pending_drag: Option<Pos2>,
    drag: DragState,
    pub(super) hovered_node: Option<usize>,
    pub(super) hovered_edge: Option<usize>,
    pub(super) selected: Option<String>,
    pub(super) isolated: Option<String>,
    pub(super) history: SelectionHistory,
}

impl Interaction {
    pub(super) fn mark_dirty(&mut self) {
        self.pointer_dirty = true;
    }

    pub(super) fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.pointer_dirty)
    }

    pub(super) fn discard_pending(&mut self) {
        self.pointer_dirty = false;
        self.pending_pan = Vec2::ZERO;
        self.pending_drag = None;
        self.drag = DragState::Idle;
    }

    /// Index-based state points into the previous model; carry it over by id.
    pub(super) fn remap(&mut self, previous: &GraphModel, next: &GraphModel) {
        let remap = |index: usize| {
            previous
                .node(index)
                .and_then(|node| next.index_of(&node.id))
        };
        self.hovered_node = self.hovered_node.and_then(remap);
        self.hovered_edge = None;
        self.drag = match self.drag {
            DragState::Node {
                index,
                was_pinned,
                moved,
            } => remap(index).map_or(DragState::Idle, |index| DragState::Node {
                index,
                was_pinned,
                moved,
            }),
            other => other,
        };
        self.pointer_dirty = true;
    }

    pub(super) fn is_dragging_node(&self, index: usize) -> bool {
        matches!(self.drag, DragState::Node { index: dragged, moved: true, .. } if dragged == index)
    }
}

impl GraphEngine {
    pub fn pointer_moved(&mut self, position: Pos2) {
        let previous = self.interaction.pointer.replace(position);
        self.interaction.pointer_dirty = true;

        match self.interaction.drag {
            DragState::Node { .. } => self.interaction.pending_drag = Some(position),
            DragState::Pan => {
                if let Some(previous) = previous {
                    self.interaction.pending_pan += position - previous;
                }
            }
            DragState::Idle => {}
        }
    }

    /// Start of a drag: grabs the node under the pointer, or the background
    /// for panning.
    pub fn pointer_pressed(&mut self, position: Pos2) {
        self.interaction.pointer = Some(position);
        self.interaction.pointer_dirty = true;

        let world = self.viewport.screen_to_world(position);
        self.interaction.drag = match self.node_at(world) {
            Some(index) => DragState::Node {
                index,
                was_pinned: self.simulation.is_pinned(index),
                moved: false,
            },
            None => DragState::Pan,
        };
    }

    pub fn pointer_released(&mut self) {
        self.apply_staged_input();

        if let DragState::Node {
            index,
            was_pinned,
            moved: true,
        } = self.interaction.drag
            && self.options.drag_mode == DragMode::Transient
            && !was_pinned
        {
            self.simulation
                .unpin(index, self.config.simulation.drag_alpha);
        }
        self.interaction.drag = DragState::Idle;
    }

    pub fn pointer_left(&mut self) {
        self.interaction.pointer = None;
        self.interaction.pointer_dirty = true;
        if self.interaction.drag == DragState::Pan {
            self.interaction.drag = DragState::Idle;
        }
    }

    pub fn scroll(&mut self, position: Pos2, scroll_y: f32) {
        let factor = scroll_factor(scroll_y, self.viewport.limits());
        if factor != 1.0 {
            self.viewport.zoom_at(position, factor);
            self.interaction.pointer_dirty = true;
        }
    }

    /// Plain click pins and selects the node and notifies the host; clicking
    /// the pinned selection again releases it. Shift-click only unpins.
    pub fn click(&mut self, position: Pos2, shift: bool, bridge: &mut dyn HostBridge) {
        let world = self.viewport.screen_to_world(position);
        let Some(index) = self.node_at(world) else {
            if !shift {
                self.interaction.selected = None;
                self.refresh_highlight();
            }
            return;
        };

        let reheat = self.config.simulation.reheat_alpha;
        if shift {
            self.simulation.unpin(index, reheat);
            return;
        }

        let Some(node) = self.model.node(index) else {
            return;
        };
        let id = node.id.clone();
        let label = node.label.clone();

        if self.selected_index() == Some(index) && self.simulation.is_pinned(index) {
            self.simulation.unpin(index, reheat);
            self.interaction.selected = None;
            self.refresh_highlight();
        } else {
            self.simulation.pin_in_place(index);
            self.select(index, true);
        }
        bridge.on_node_click(&id, Some(&label));
    }

    /// Toggles one-hop isolation around the node under the pointer; a double
    /// click on the background clears it.
    pub fn double_click(&mut self, position: Pos2) {
        let world = self.viewport.screen_to_world(position);
        let target = self
            .node_at(world)
            .and_then(|index| self.model.node(index))
            .map(|node| node.id.clone());

        let next = match (&self.interaction.isolated, target) {
            (Some(current), Some(target)) if *current == target => None,
            (_, Some(target)) => Some(target),
            (_, None) => None,
        };
        if next != self.interaction.isolated {
            self.interaction.isolated = next;
            self.refresh_display();
            self.simulation
                .invalidate(self.config.simulation.reheat_alpha);
        }
    }

    pub fn isolated_id(&self) -> Option<&str> {
        self.interaction.isolated.as_deref()
    }

    pub fn clear_isolation(&mut self) {
        if self.interaction.isolated.take().is_some() {
            self.refresh_display();
            self.simulation
                .invalidate(self.config.simulation.reheat_alpha);
        }
    }

    /// Selects and pins the first visible node whose label contains `term`,
    /// then centres the camera on it.
    pub fn search_jump(&mut self, term: &str) -> Option<usize> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        let index = self
            .model
            .nodes()
            .iter()
            .enumerate()
            .find(|(index, node)| {
                self.display.is_visible(*index) && contains_ignore_case(&node.label, &needle)
            })
            .map(|(index, _)| index)?;

        self.simulation.pin_in_place(index);
        self.select(index, true);
        if let Some(position) = self.simulation.position(index) {
            let mut camera = self.viewport.camera();
            camera.offset = self.viewport.size() * 0.5 - position * camera.scale;
            self.viewport.fly_to(camera);
        }
        Some(index)
    }

    pub fn select_id(&mut self, id: &str) {
        if let Some(index) = self.model.index_of(id) {
            self.select(index, true);
        }
    }

    fn select(&mut self, index: usize, record: bool) {
        let Some(node) = self.model.node(index) else {
            return;
        };
        if record {
            self.interaction.history.push(&node.id);
        }
        self.interaction.selected = Some(node.id.clone());
        self.refresh_highlight();
    }

    /// History navigation moves the selection only; pins are untouched.
    pub fn history_back(&mut self) -> bool {
        let Some(id) = self.interaction.history.back().map(str::to_owned) else {
            return false;
        };
        self.select_from_history(&id);
        true
    }

    pub fn history_forward(&mut self) -> bool {
        let Some(id) = self.interaction.history.forward().map(str::to_owned) else {
            return false;
        };
        self.select_from_history(&id);
        true
    }

    fn select_from_history(&mut self, id: &str) {
        match self.model.index_of(id) {
            Some(index) => self.select(index, false),
            None => {
                self.interaction.selected = None;
                self.refresh_highlight();
            }
        }
    }

    pub fn history(&self) -> &SelectionHistory {
        &self.interaction.history
    }

    pub fn selected_id(&self) -> Option<&str> {
        self.interaction.selected.as_deref()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.interaction
            .selected
            .as_deref()
            .and_then(|id| self.model.index_of(id))
    }

    pub fn hovered_node(&self) -> Option<usize> {
        self.interaction.hovered_node
    }

    pub fn hovered_edge(&self) -> Option<usize> {
        self.interaction.hovered_edge
    }

    pub(super) fn apply_staged_input(&mut self) {
        let pan = std::mem::take(&mut self.interaction.pending_pan);
        if pan != Vec2::ZERO {
            self.viewport.pan(pan);
        }

        let Some(screen) = self.interaction.pending_drag.take() else {
            return;
        };
        if let DragState::Node { index, moved, .. } = &mut self.interaction.drag {
            let world = self.viewport.screen_to_world(screen);
            self.simulation.set_pin(*index, world);
            *moved = true;
            self.simulation
                .invalidate(self.config.simulation.drag_alpha);
        }
    }

    /// Throttled hover pass, run at most once per tick when the pointer moved.
    pub(super) fn update_hover(&mut self, bridge: &mut dyn HostBridge) {
        let (node, edge) = match self.interaction.pointer {
            Some(screen) => {
                let world = self.viewport.screen_to_world(screen);
                let node = self.node_at(world);
                let edge = if node.is_none() {
                    self.edge_at(world)
                } else {
                    None
                };
                (node, edge)
            }
            None => (None, None),
        };

        if node != self.interaction.hovered_node {
            self.interaction.hovered_node = node;
            self.refresh_highlight();
            let payload = node.and_then(|index| self.model.node(index)).map(|node| HoverNode {
                id: node.id.clone(),
                label: node.label.clone(),
                degree: node.degree,
                kind: node.kind.clone(),
            });
            bridge.on_hover_node(payload);
        }

        if edge != self.interaction.hovered_edge {
            self.interaction.hovered_edge = edge;
            let payload = edge.and_then(|index| self.model.edges().get(index)).map(|edge| {
                let (from, to) = self.model.edge_endpoints(edge);
                HoverEdge {
                    from: from.to_owned(),
                    to: to.to_owned(),
                    weight: edge.weight,
                    relation: edge.relation.clone(),
                }
            });
            bridge.on_hover_edge(payload);
        }
    }

    /// Closest visible node whose radius (plus slack) covers `world`.
    pub(super) fn node_at(&self, world: Vec2) -> Option<usize> {
        self.model
            .nodes()
            .iter()
            .enumerate()
            .filter(|(index, _)| self.display.is_visible(*index))
            .filter_map(|(index, node)| {
                let position = self.simulation.position(index)?;
                let distance = (position - world).length();
                (distance <= node_radius(node) + NODE_HIT_TOLERANCE).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }

    pub(super) fn edge_at(&self, world: Vec2) -> Option<usize> {
        let tolerance = EDGE_HIT_PIXELS / self.viewport.scale().max(f32::EPSILON);
        self.display
            .edges
            .iter()
            .filter_map(|&edge_index| {
                let edge = self.model.edges().get(edge_index)?;
                let start = self.simulation.position(edge.source)?;
                let end = self.simulation.position(edge.target)?;
                let distance = distance_to_segment(world, start, end);
                (distance <= tolerance).then_some((edge_index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

fn distance_to_segment(point: Vec2, start: Vec2, end: Vec2) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - start).length();
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (start + segment * t)).length()
}
