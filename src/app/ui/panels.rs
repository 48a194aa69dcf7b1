use eframe::egui::{self, Align, Context, Layout};

use crate::util::{short_id, truncate_label};

use super::super::ViewModel;
use super::super::bridge::BridgeEvent;
use super::super::expansion::ExpansionPoll;

impl ViewModel {
    pub(in crate::app) fn show(&mut self, ctx: &Context, reload_requested: &mut bool) {
        self.poll_expansion(ctx);

        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("paper-graph");
                    ui.separator();
                    ui.label(format!("source: {}", self.source));
                    if ui.button("Reload").clicked() {
                        *reload_requested = true;
                    }
                    if let Some(message) = &self.status_message {
                        ui.separator();
                        ui.label(message.as_str());
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        ui.label(self.stats_text());
                        if let Some(node_id) = self.expansion.as_ref().and_then(|w| w.in_flight()) {
                            ui.spinner();
                            ui.label(format!("expanding {}", short_id(node_id)));
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("controls_scroll")
                    .show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .id_salt("details_scroll")
                    .show(ui, |ui| self.draw_details(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.draw_graph(ui));

        self.handle_bridge_events();
    }

    fn stats_text(&self) -> String {
        let stats = self.engine.stats();
        let seed = stats
            .seed_label
            .as_deref()
            .map(|label| truncate_label(label, 28))
            .unwrap_or_else(|| "none".to_owned());
        let sample = if stats.fallback { " (sample)" } else { "" };
        format!(
            "nodes: {}{sample} | edges: {} shown / {} | {} | {} | energy {:.3} | seed: {seed}",
            stats.nodes,
            stats.displayed_edges,
            stats.edges,
            stats.density,
            stats.status.label(),
            stats.energy,
        )
    }

    fn handle_bridge_events(&mut self) {
        if self.events.is_empty() {
            return;
        }
        let events = self.events.drain().collect::<Vec<_>>();
        for event in events {
            match event {
                BridgeEvent::HoverNode(node) => self.hover_node = node,
                BridgeEvent::HoverEdge(edge) => self.hover_edge = edge,
                BridgeEvent::NodeClick { id, label } => self.toggle_locked(id, label),
            }
        }
    }

    /// A click locks a node and fetches its neighbors; clicking the locked
    /// node again releases it.
    fn toggle_locked(&mut self, id: String, label: Option<String>) {
        if self.locked.as_deref() == Some(id.as_str()) {
            self.locked = None;
            return;
        }

        if let Some(worker) = self.expansion.as_mut() {
            worker.request(&id);
            let name = label.unwrap_or_else(|| short_id(&id).to_owned());
            self.status_message = Some(format!("Fetching neighbors of {}", truncate_label(&name, 32)));
        }
        self.locked = Some(id);
    }

    fn poll_expansion(&mut self, ctx: &Context) {
        let Some(worker) = self.expansion.as_mut() else {
            return;
        };

        match worker.poll() {
            ExpansionPoll::Idle => {}
            ExpansionPoll::Pending => ctx.request_repaint(),
            ExpansionPoll::Ready(batch) => {
                let outcome = self.engine.merge_expansion(&batch);
                self.status_message = Some(if outcome.is_empty() {
                    format!("No new neighbors for {}", short_id(&batch.node_id))
                } else {
                    format!(
                        "Added {} papers and {} links around {}",
                        outcome.added_nodes,
                        outcome.added_edges,
                        short_id(&batch.node_id)
                    )
                });
                ctx.request_repaint();
            }
            ExpansionPoll::Disconnected => {
                tracing::warn!("expansion worker disconnected");
                self.expansion = None;
                self.status_message = Some("Neighbor expansion unavailable".to_owned());
            }
        }
    }
}
