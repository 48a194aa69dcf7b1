use eframe::egui::{RichText, Ui};

use crate::util::{short_id, truncate_label};

use super::super::ViewModel;
use super::super::model::{PaperMeta, UNKNOWN_KEY};

fn meta_lines(ui: &mut Ui, meta: &PaperMeta) {
    if let Some(year) = meta.year {
        ui.label(format!("Year: {year}"));
    }
    if meta.venue_key() != UNKNOWN_KEY {
        ui.label(format!("Venue: {}", meta.venue_key()));
    }
    if !meta.authors.is_empty() {
        ui.label(format!("Authors: {}", meta.authors.join(", ")));
    }
    ui.label(format!("Source: {}", meta.source_key()));
    if let Some(url) = &meta.url {
        ui.hyperlink(url);
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Details");
        ui.add_space(6.0);

        self.draw_hover(ui);
        ui.separator();
        self.draw_selection(ui);
        ui.separator();
        self.draw_pins(ui);
        ui.separator();
        self.draw_legend(ui);
    }

    fn draw_hover(&self, ui: &mut Ui) {
        ui.label(RichText::new("Hover").strong());
        match (&self.hover_node, &self.hover_edge) {
            (Some(node), _) => {
                ui.label(node.label.as_str());
                ui.small(format!(
                    "{} · degree {} · {}",
                    short_id(&node.id),
                    node.degree,
                    node.kind.as_deref().unwrap_or("paper")
                ));
            }
            (None, Some(edge)) => {
                let weight = edge
                    .weight
                    .map(|weight| format!("{weight:.2}"))
                    .unwrap_or_else(|| "n/a".to_owned());
                ui.label(format!("{} ↔ {}", short_id(&edge.from), short_id(&edge.to)));
                ui.small(format!(
                    "weight {weight} · {}",
                    edge.relation.as_deref().unwrap_or("unclassified")
                ));
            }
            (None, None) => {
                ui.small("Hover a paper or link on the canvas.");
            }
        }
    }

    fn draw_selection(&mut self, ui: &mut Ui) {
        ui.label(RichText::new("Selected paper").strong());
        let Some(index) = self.engine.selected_index() else {
            ui.small("Click a paper to select, pin and expand it.");
            return;
        };
        let Some(node) = self.engine.model().node(index) else {
            return;
        };

        ui.label(RichText::new(node.label.as_str()).strong());
        ui.small(node.id.as_str());
        ui.label(format!("Group: {}", node.group.label()));
        ui.label(format!("Degree: {}", node.degree));
        meta_lines(ui, &node.meta);
        if self.locked.is_some() && self.locked.as_deref() == self.engine.selected_id() {
            ui.small("Locked: neighbors are merged into the graph.");
        }

        let mut neighbors = self
            .engine
            .model()
            .neighbors(index)
            .iter()
            .filter_map(|&neighbor| self.engine.model().node(neighbor))
            .map(|neighbor| (neighbor.id.clone(), neighbor.label.clone()))
            .collect::<Vec<_>>();
        neighbors.sort_by(|a, b| a.1.cmp(&b.1));

        ui.add_space(4.0);
        ui.label(RichText::new(format!("Connected papers ({})", neighbors.len())).strong());
        let mut chosen = None;
        for (id, label) in &neighbors {
            if ui
                .link(truncate_label(label, 40))
                .on_hover_text(label.as_str())
                .clicked()
            {
                chosen = Some(id.clone());
            }
        }
        if let Some(id) = chosen {
            self.engine.select_id(&id);
        }
    }

    fn draw_pins(&mut self, ui: &mut Ui) {
        let pinned = self
            .engine
            .pinned_nodes()
            .into_iter()
            .map(|(id, label)| (id.to_owned(), label.to_owned()))
            .collect::<Vec<_>>();

        ui.label(RichText::new(format!("Pinned ({})", pinned.len())).strong());
        if pinned.is_empty() {
            ui.small("Drag or click a paper to pin it.");
            return;
        }

        let mut release = None;
        for (id, label) in &pinned {
            ui.horizontal(|ui| {
                if ui.small_button("Unpin").clicked() {
                    release = Some(id.clone());
                }
                ui.label(truncate_label(label, 36));
            });
        }
        if let Some(id) = release {
            self.engine.unpin(&id);
        }
    }

    fn draw_legend(&self, ui: &mut Ui) {
        ui.label(RichText::new("Legend").strong());
        for (label, color) in self.engine.legend_entries() {
            ui.horizontal(|ui| {
                ui.label(RichText::new("●").color(color));
                ui.label(label);
            });
        }
    }
}
