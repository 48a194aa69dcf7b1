use std::path::Path;

use eframe::egui::{self, Key, Response, Ui};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::util::truncate_label;

use super::super::ViewModel;
use super::super::export::write_png;
use super::super::filter::{Density, EdgeMode};
use super::super::interaction::DragMode;
use super::super::model::{ClusterMode, PaperNode};

const SUGGESTION_LIMIT: usize = 8;
const SLIDER_KEY_RATE: f32 = 10.0;

/// Best fuzzy label matches for `query`, highest score first.
fn fuzzy_suggestions(nodes: &[PaperNode], query: &str, limit: usize) -> Vec<usize> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let matcher = SkimMatcherV2::default().ignore_case();
    let mut scored = nodes
        .iter()
        .enumerate()
        .filter_map(|(index, node)| {
            matcher
                .fuzzy_match(&node.label, query)
                .map(|score| (index, score))
        })
        .collect::<Vec<_>>();
    scored.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    scored.truncate(limit);
    scored.into_iter().map(|(index, _)| index).collect()
}

/// Arrow keys nudge a focused slider, a little faster than egui's one step
/// per key repeat.
fn nudge_with_arrow_keys(ui: &Ui, response: &Response, value: &mut f32, min: f32, max: f32) -> bool {
    if !response.has_focus() {
        return false;
    }

    let (dt, up, down) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });
    let direction = (up as i8) - (down as i8);
    if direction == 0 {
        return false;
    }

    let step = ((max - min) / 200.0).max(0.0001);
    let previous = *value;
    *value = (*value + direction as f32 * step * SLIDER_KEY_RATE * dt).clamp(min, max);
    ui.ctx().request_repaint();
    (*value - previous).abs() > f32::EPSILON
}

fn tuned_slider(ui: &mut Ui, label: &str, value: &mut f32, min: f32, max: f32, hint: &str) -> bool {
    let response = ui
        .add(egui::Slider::new(value, min..=max).text(label))
        .on_hover_text(hint);
    let changed = response.changed();
    changed | nudge_with_arrow_keys(ui, &response, value, min, max)
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        self.draw_search(ui);
        ui.separator();
        self.draw_display_controls(ui);
        ui.separator();
        self.draw_layout_controls(ui);
        ui.separator();
        self.draw_view_controls(ui);
        ui.separator();
        self.draw_export_controls(ui);
        ui.separator();

        ui.checkbox(&mut self.show_physics, "Physics tuning");
        if self.show_physics {
            self.draw_physics_controls(ui);
        }
    }

    fn draw_search(&mut self, ui: &mut Ui) {
        ui.label("Search papers")
            .on_hover_text("Enter selects, pins and centres the first matching title.");
        let response = ui.text_edit_singleline(&mut self.search);
        if response.changed() {
            self.engine.set_focus(&self.search);
        }

        let submitted =
            response.lost_focus() && ui.input(|input| input.key_pressed(Key::Enter));
        if submitted {
            self.status_message = match self.engine.search_jump(&self.search) {
                Some(_) => None,
                None => Some(format!("No visible paper matches \"{}\"", self.search.trim())),
            };
        }

        let suggestions = fuzzy_suggestions(self.engine.model().nodes(), &self.search, SUGGESTION_LIMIT);
        let mut chosen = None;
        for index in suggestions {
            let Some(node) = self.engine.model().node(index) else {
                continue;
            };
            if ui
                .link(truncate_label(&node.label, 44))
                .on_hover_text(node.label.as_str())
                .clicked()
            {
                chosen = Some(node.id.clone());
            }
        }
        if let Some(id) = chosen {
            self.engine.select_id(&id);
        }

        ui.horizontal(|ui| {
            let history = self.engine.history();
            let (back, forward) = (history.can_go_back(), history.can_go_forward());
            if ui.add_enabled(back, egui::Button::new("◀ Back")).clicked() {
                self.engine.history_back();
            }
            if ui.add_enabled(forward, egui::Button::new("Forward ▶")).clicked() {
                self.engine.history_forward();
            }
        });
    }

    fn draw_display_controls(&mut self, ui: &mut Ui) {
        let options = self.engine.options().clone();

        ui.horizontal(|ui| {
            ui.label("Edges");
            for density in [Density::Sparse, Density::Dense] {
                if ui
                    .selectable_label(options.filter.density == density, density.label())
                    .on_hover_text("Sparse shows every other edge.")
                    .clicked()
                {
                    self.engine.set_density(density);
                }
            }
        });

        let mut show_labels = options.show_labels;
        if ui.checkbox(&mut show_labels, "Show labels").changed() {
            self.engine.set_show_labels(show_labels);
        }

        ui.horizontal(|ui| {
            for (mode, label) in [
                (EdgeMode::All, "All links"),
                (EdgeMode::SharedAuthorOnly, "Shared author only"),
            ] {
                if ui
                    .selectable_label(options.filter.edge_mode == mode, label)
                    .clicked()
                {
                    self.engine.set_edge_mode(mode);
                }
            }
        });

        let mut relations = options.filter.relations;
        ui.horizontal(|ui| {
            ui.label("Relations");
            ui.checkbox(&mut relations.author, "author");
            ui.checkbox(&mut relations.venue, "venue");
            ui.checkbox(&mut relations.year, "year");
        });
        if relations != options.filter.relations {
            self.engine.set_relations(relations);
        }

        let sources = self.engine.model().sources();
        if sources.len() > 1 {
            ui.label("Sources");
            ui.horizontal_wrapped(|ui| {
                for source in &sources {
                    let mut active = options.filter.source_active(source);
                    if ui.checkbox(&mut active, source.as_str()).changed() {
                        self.engine.toggle_source(source);
                    }
                }
            });
        }

        if let Some(isolated) = self.engine.isolated_id().map(str::to_owned) {
            ui.horizontal(|ui| {
                let label = self
                    .engine
                    .model()
                    .index_of(&isolated)
                    .and_then(|index| self.engine.model().node(index))
                    .map(|node| truncate_label(&node.label, 28))
                    .unwrap_or(isolated);
                ui.label(format!("Isolated: {label}"));
                if ui.button("Show all").clicked() {
                    self.engine.clear_isolation();
                }
            });
        }
    }

    fn draw_layout_controls(&mut self, ui: &mut Ui) {
        let options = self.engine.options().clone();

        ui.horizontal(|ui| {
            ui.label("Cluster");
            for mode in ClusterMode::ALL {
                if ui
                    .selectable_label(options.cluster_mode == mode, mode.label())
                    .clicked()
                {
                    self.engine.set_cluster_mode(mode);
                }
            }
        });

        let mut depth = options.neighbor_depth;
        if ui
            .add(egui::Slider::new(&mut depth, 1..=3).text("Hover depth"))
            .on_hover_text("Hops highlighted around the hovered or selected paper.")
            .changed()
        {
            self.engine.set_neighbor_depth(depth);
        }

        ui.horizontal(|ui| {
            ui.label("Drag");
            for mode in [DragMode::Transient, DragMode::Pin] {
                if ui
                    .selectable_label(options.drag_mode == mode, mode.label())
                    .clicked()
                {
                    self.engine.set_drag_mode(mode);
                }
            }
        });

        ui.horizontal(|ui| {
            let mut frozen = self.engine.simulation().is_frozen();
            if ui.checkbox(&mut frozen, "Freeze layout").changed() {
                self.engine.set_frozen(frozen);
            }
            if ui.button("Clear pins").clicked() {
                self.engine.clear_pins();
            }
            if ui.button("Re-layout").clicked() {
                self.engine.relayout();
            }
            let running = self.engine.is_running();
            if ui.button(if running { "Pause" } else { "Resume" }).clicked() {
                if running {
                    self.engine.stop();
                } else {
                    self.engine.start();
                }
            }
        });
    }

    fn draw_view_controls(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            if ui.button("Fit").clicked() {
                self.engine.fit_to_view();
            }
            if ui.button("Zoom +").clicked() {
                self.engine.zoom_in();
            }
            if ui.button("Zoom −").clicked() {
                self.engine.zoom_out();
            }
            if ui.button("Center").clicked() {
                self.engine.reset_view();
            }
            if ui
                .button("Reset")
                .on_hover_text("Restore default filters, labels and camera.")
                .clicked()
            {
                let token = self.engine.reset_token() + 1;
                if self.engine.apply_reset(token) {
                    self.search.clear();
                }
            }
        });
        ui.small(format!("zoom {:.2}×", self.engine.viewport().scale()));
    }

    fn draw_export_controls(&mut self, ui: &mut Ui) {
        ui.horizontal(|ui| {
            ui.label("PNG");
            ui.text_edit_singleline(&mut self.export_path);
        });
        ui.horizontal(|ui| {
            ui.checkbox(&mut self.export_legend, "Legend");
            if ui.button("Export PNG").clicked() {
                self.export_png();
            }
        });
        if self.export_font.is_none() {
            ui.small("No export font configured; labels are left out of the image.");
        }
    }

    fn export_png(&mut self) {
        let path = Path::new(self.export_path.trim());
        let result = self
            .engine
            .export_image(self.export_font.as_ref(), self.export_legend)
            .and_then(|image| write_png(path, &image));

        self.status_message = Some(match result {
            Ok(()) => format!("Saved {}", path.display()),
            Err(error) => {
                tracing::warn!(%error, "export failed");
                format!("Export failed: {error}")
            }
        });
    }

    fn draw_physics_controls(&mut self, ui: &mut Ui) {
        let mut config = self.engine.config().simulation;
        let mut changed = false;

        changed |= tuned_slider(
            ui,
            "Repulsion",
            &mut config.repulsion,
            20.0,
            400.0,
            "Inverse-square push between every pair of shown papers.",
        );
        changed |= tuned_slider(
            ui,
            "Link stiffness",
            &mut config.stiffness,
            0.002,
            0.06,
            "Pull of each link toward its rest length.",
        );
        changed |= tuned_slider(
            ui,
            "Centering",
            &mut config.centering,
            0.0,
            0.005,
            "Weak pull toward the middle of the canvas.",
        );
        changed |= tuned_slider(
            ui,
            "Damping",
            &mut config.damping,
            0.5,
            0.97,
            "Velocity kept per tick.",
        );
        changed |= tuned_slider(
            ui,
            "Settle threshold",
            &mut config.settle_threshold,
            0.001,
            0.1,
            "Mean speed below which the layout stops.",
        );

        if changed {
            self.engine.set_simulation_config(config);
        }
        if ui.button("Defaults").clicked() {
            self.engine.set_simulation_config(Default::default());
        }
    }
}
