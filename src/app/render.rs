use eframe::egui::{Align2, Color32, Pos2, Rect, Vec2, pos2, vec2};

use crate::util::{contains_ignore_case, truncate_label};

use super::engine::GraphEngine;
use super::model::{ClusterMode, NodeGroup};
use super::render_utils::{
    BACKGROUND, MINIMAP_SELECTED, SELECTED_HALO, SELECTED_RING, circle_visible, edge_stroke_width,
    edge_visible, group_color, node_radius, source_color, weight_ratio, with_opacity,
};
use super::viewport::world_bounds;

const LABEL_ZOOM_THRESHOLD: f32 = 1.1;
const LABEL_MAX_CHARS: usize = 36;
const EDGE_COLOR: Color32 = Color32::from_rgb(148, 163, 184);
const MINIMAP_SIZE: Vec2 = vec2(140.0, 90.0);
const MINIMAP_MARGIN: f32 = 16.0;
const CORE_RINGS: [f32; 2] = [28.0, 36.0];
const GUIDE_RINGS: [f32; 4] = [72.0, 98.0, 130.0, 165.0];

/// Drawing surface in canvas-local pixels. Implemented by the live egui
/// painter and by the offscreen raster used for export.
pub trait Canvas {
    fn size(&self) -> Vec2;
    fn line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32);
    fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32);
    fn circle_stroke(&mut self, center: Pos2, radius: f32, width: f32, color: Color32);
    fn rect_filled(&mut self, rect: Rect, color: Color32);
    fn rect_stroke(&mut self, rect: Rect, width: f32, color: Color32);
    fn text(&mut self, position: Pos2, anchor: Align2, text: &str, size: f32, color: Color32);
}

impl GraphEngine {
    /// Paints the current state. Reads engine state only; runs after `tick`.
    pub fn paint(&self, canvas: &mut dyn Canvas) {
        let bounds = Rect::from_min_size(Pos2::ZERO, canvas.size());
        canvas.rect_filled(bounds, BACKGROUND);
        if self.model.is_empty() {
            return;
        }

        let screen = self
            .simulation
            .positions()
            .iter()
            .map(|position| self.viewport.world_to_screen(*position))
            .collect::<Vec<_>>();

        self.paint_halos(canvas, &screen);
        self.paint_edges(canvas, bounds, &screen);
        self.paint_nodes(canvas, bounds, &screen);
        self.paint_minimap(canvas, bounds);
    }

    fn paint_halos(&self, canvas: &mut dyn Canvas, screen: &[Pos2]) {
        let scale = self.viewport.scale();
        for group in [NodeGroup::Related, NodeGroup::Peripheral] {
            let members = self
                .model
                .nodes()
                .iter()
                .enumerate()
                .filter(|(index, node)| node.group == group && self.display.is_visible(*index))
                .map(|(index, _)| screen[index])
                .collect::<Vec<_>>();
            if members.len() < 2 {
                continue;
            }

            let centroid = members
                .iter()
                .fold(Vec2::ZERO, |sum, point| sum + point.to_vec2())
                / members.len() as f32;
            let centroid = centroid.to_pos2();
            let radius = members
                .iter()
                .map(|point| point.distance(centroid))
                .fold(0.0_f32, f32::max)
                + 24.0 * scale;
            let tint = with_opacity(group_color(group), 0.08);
            canvas.circle_filled(centroid, radius, tint);
            canvas.circle_stroke(centroid, radius, 1.0, with_opacity(group_color(group), 0.25));
            canvas.text(
                centroid - vec2(0.0, radius + 4.0),
                Align2::CENTER_BOTTOM,
                group.label(),
                11.0,
                Color32::from_rgb(148, 163, 184),
            );
        }

        let Some(core) = self.model.core_index() else {
            return;
        };
        if !self.display.is_visible(core) {
            return;
        }
        let center = screen[core];
        for radius in GUIDE_RINGS {
            canvas.circle_stroke(
                center,
                radius * scale,
                1.0,
                Color32::from_rgba_unmultiplied(148, 163, 184, 18),
            );
        }
        for radius in CORE_RINGS {
            canvas.circle_stroke(
                center,
                radius * scale,
                1.5,
                with_opacity(group_color(NodeGroup::Core), 0.35),
            );
        }
    }

    fn paint_edges(&self, canvas: &mut dyn Canvas, bounds: Rect, screen: &[Pos2]) {
        let edges = self.model.edges();
        let (min_weight, max_weight) = self
            .display
            .edges
            .iter()
            .filter_map(|&index| edges.get(index))
            .map(|edge| edge.weight_or_default())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), weight| {
                (min.min(weight), max.max(weight))
            });

        let base_opacity = if self.viewport.scale() > 1.2 { 0.5 } else { 0.2 };
        let focus = self.focus_term();
        let core = self.model.core_index();
        let hovered_edge = self.interaction.hovered_edge;

        for &edge_index in &self.display.edges {
            let Some(edge) = edges.get(edge_index) else {
                continue;
            };
            let (start, end) = (screen[edge.source], screen[edge.target]);
            if !edge_visible(bounds, start, end, 4.0) {
                continue;
            }

            let ratio = weight_ratio(edge.weight_or_default(), min_weight, max_weight);
            let mut width = edge_stroke_width(ratio);
            let mut opacity = base_opacity;
            if core.is_some_and(|core| edge.touches(core)) {
                opacity += 0.1;
            }
            if let Some(highlight) = &self.highlight {
                opacity = if highlight.contains_edge(edge_index) {
                    0.85
                } else {
                    opacity * 0.3
                };
            }
            if let Some(term) = &focus {
                let matches = [edge.source, edge.target].iter().any(|&index| {
                    self.model
                        .node(index)
                        .is_some_and(|node| contains_ignore_case(&node.label, term))
                });
                if !matches {
                    opacity *= 0.5;
                }
            }
            if hovered_edge == Some(edge_index) {
                opacity = 1.0;
                width += 1.0;
            }

            canvas.line(start, end, width, with_opacity(EDGE_COLOR, opacity));
        }
    }

    fn paint_nodes(&self, canvas: &mut dyn Canvas, bounds: Rect, screen: &[Pos2]) {
        let scale = self.viewport.scale();
        let focus = self.focus_term();
        let selected = self.selected_index();
        let hovered = self.interaction.hovered_node;
        let by_source = self.options.cluster_mode == ClusterMode::Source;

        for (index, node) in self.model.nodes().iter().enumerate() {
            if !self.display.is_visible(index) {
                continue;
            }
            let center = screen[index];
            let radius = node_radius(node) * scale;
            if !circle_visible(bounds, center, radius + 12.0) {
                continue;
            }

            let focused = focus
                .as_deref()
                .is_none_or(|term| contains_ignore_case(&node.label, term));
            let connected = self
                .highlight
                .as_ref()
                .is_none_or(|highlight| highlight.contains_node(index));
            let opacity = match (focused, connected) {
                (true, true) => 1.0,
                (true, false) => 0.45,
                (false, _) => 0.2,
            };

            if selected == Some(index) {
                canvas.circle_filled(center, radius + 10.0, SELECTED_HALO);
                canvas.circle_stroke(center, radius + 6.0, 2.0, SELECTED_RING);
            }

            let color = if by_source && node.group != NodeGroup::Core {
                source_color(node.meta.source_key())
            } else {
                group_color(node.group)
            };
            canvas.circle_filled(center, radius, with_opacity(color, opacity));

            if hovered == Some(index) || self.interaction.is_dragging_node(index) {
                canvas.circle_stroke(center, radius + 2.0, 2.0, Color32::WHITE);
            } else if self.simulation.is_pinned(index) {
                canvas.circle_stroke(
                    center,
                    radius + 2.0,
                    1.0,
                    Color32::from_rgba_unmultiplied(226, 232, 240, 160),
                );
            }

            let emphasised =
                hovered == Some(index) || selected == Some(index) || node.group == NodeGroup::Core;
            if self.options.show_labels && (scale > LABEL_ZOOM_THRESHOLD || emphasised) {
                canvas.text(
                    center - vec2(0.0, radius + 4.0),
                    Align2::CENTER_BOTTOM,
                    &truncate_label(&node.label, LABEL_MAX_CHARS),
                    12.0,
                    with_opacity(Color32::from_rgb(226, 232, 240), opacity.max(0.6)),
                );
            }
        }
    }

    fn paint_minimap(&self, canvas: &mut dyn Canvas, bounds: Rect) {
        if bounds.width() < MINIMAP_SIZE.x * 2.0 || bounds.height() < MINIMAP_SIZE.y * 2.0 {
            return;
        }
        let visible = || {
            self.simulation
                .positions()
                .iter()
                .enumerate()
                .filter(|(index, _)| self.display.is_visible(*index))
        };
        let Some(world) = world_bounds(visible().map(|(_, position)| *position)) else {
            return;
        };

        let frame = Rect::from_min_size(
            bounds.max - MINIMAP_SIZE - Vec2::splat(MINIMAP_MARGIN),
            MINIMAP_SIZE,
        );
        canvas.rect_filled(frame, Color32::from_rgba_unmultiplied(15, 23, 42, 217));
        canvas.rect_stroke(frame, 1.0, Color32::from_rgba_unmultiplied(148, 163, 184, 90));

        let inner = frame.shrink(6.0);
        let span = vec2(world.width().max(1.0), world.height().max(1.0));
        let fit = (inner.width() / span.x).min(inner.height() / span.y);
        let origin = inner.center() - world.center().to_vec2() * fit;
        let to_minimap = |position: Vec2| origin + position * fit;

        let selected = self.selected_index();
        for (index, position) in visible() {
            let color = if selected == Some(index) {
                MINIMAP_SELECTED
            } else {
                Color32::from_rgba_unmultiplied(148, 163, 184, 200)
            };
            canvas.circle_filled(to_minimap(*position), 2.2, color);
        }

        let view_min = self.viewport.screen_to_world(bounds.min);
        let view_max = self.viewport.screen_to_world(bounds.max);
        let view = Rect::from_min_max(to_minimap(view_min), to_minimap(view_max)).intersect(frame);
        if view.is_positive() {
            canvas.rect_stroke(view, 1.0, Color32::from_rgba_unmultiplied(250, 204, 21, 120));
        }
    }

    /// Categories currently on screen with their swatch colours, for the
    /// export legend.
    pub fn legend_entries(&self) -> Vec<(String, Color32)> {
        let visible_nodes = || {
            self.model
                .nodes()
                .iter()
                .enumerate()
                .filter(|(index, _)| self.display.is_visible(*index))
                .map(|(_, node)| node)
        };

        let mut entries: Vec<(String, Color32)> = NodeGroup::ALL
            .into_iter()
            .filter(|group| visible_nodes().any(|node| node.group == *group))
            .filter(|group| {
                self.options.cluster_mode != ClusterMode::Source || *group == NodeGroup::Core
            })
            .map(|group| (group.label().to_owned(), group_color(group)))
            .collect();

        if self.options.cluster_mode == ClusterMode::Source {
            let mut sources = visible_nodes()
                .filter(|node| node.group != NodeGroup::Core)
                .map(|node| node.meta.source_key().to_owned())
                .collect::<Vec<_>>();
            sources.sort();
            sources.dedup();
            entries.extend(
                sources
                    .into_iter()
                    .map(|source| {
                        let color = source_color(&source);
                        (source, color)
                    }),
            );
        }
        entries
    }
}

/// Minimum origin of `size` placed at `position` according to `anchor`.
pub(super) fn anchored_min(position: Pos2, anchor: Align2, size: Vec2) -> Pos2 {
    let x = match anchor.x() {
        eframe::egui::Align::Min => position.x,
        eframe::egui::Align::Center => position.x - size.x * 0.5,
        eframe::egui::Align::Max => position.x - size.x,
    };
    let y = match anchor.y() {
        eframe::egui::Align::Min => position.y,
        eframe::egui::Align::Center => position.y - size.y * 0.5,
        eframe::egui::Align::Max => position.y - size.y,
    };
    pos2(x, y)
}
