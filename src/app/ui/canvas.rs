use eframe::egui::{Align2, Color32, FontId, Key, Painter, Pos2, Rect, Sense, Stroke, StrokeKind, Ui, Vec2};

use super::super::ViewModel;
use super::super::render::Canvas;
use super::super::viewport::canvas_size;

/// Live canvas: engine coordinates are canvas-local, the painter's are
/// window-global.
struct PainterCanvas<'a> {
    painter: &'a Painter,
    rect: Rect,
}

impl PainterCanvas<'_> {
    fn at(&self, position: Pos2) -> Pos2 {
        position + self.rect.min.to_vec2()
    }
}

impl Canvas for PainterCanvas<'_> {
    fn size(&self) -> Vec2 {
        self.rect.size()
    }

    fn line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32) {
        self.painter
            .line_segment([self.at(from), self.at(to)], Stroke::new(width, color));
    }

    fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32) {
        self.painter.circle_filled(self.at(center), radius, color);
    }

    fn circle_stroke(&mut self, center: Pos2, radius: f32, width: f32, color: Color32) {
        self.painter
            .circle_stroke(self.at(center), radius, Stroke::new(width, color));
    }

    fn rect_filled(&mut self, rect: Rect, color: Color32) {
        self.painter
            .rect_filled(rect.translate(self.rect.min.to_vec2()), 0.0, color);
    }

    fn rect_stroke(&mut self, rect: Rect, width: f32, color: Color32) {
        self.painter.rect_stroke(
            rect.translate(self.rect.min.to_vec2()),
            0.0,
            Stroke::new(width, color),
            StrokeKind::Inside,
        );
    }

    fn text(&mut self, position: Pos2, anchor: Align2, text: &str, size: f32, color: Color32) {
        self.painter.text(
            self.at(position),
            anchor,
            text,
            FontId::proportional(size),
            color,
        );
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
        let rect = response.rect;
        self.engine.resize(canvas_size(rect));
        let local = |position: Pos2| (position - rect.min).to_pos2();

        let (hover_pos, press_origin, scroll_y, shift, escape) = ui.input(|input| {
            (
                input.pointer.hover_pos(),
                input.pointer.press_origin(),
                input.raw_scroll_delta.y,
                input.modifiers.shift,
                input.key_pressed(Key::Escape),
            )
        });

        if response.drag_started()
            && let Some(origin) = press_origin
        {
            self.engine.pointer_pressed(local(origin));
        }

        let on_canvas = response.hovered() || response.dragged();
        match hover_pos {
            Some(position) if on_canvas => {
                self.engine.pointer_moved(local(position));
                self.pointer_on_canvas = true;
            }
            _ if self.pointer_on_canvas => {
                self.engine.pointer_left();
                self.pointer_on_canvas = false;
            }
            _ => {}
        }

        if response.drag_stopped() {
            self.engine.pointer_released();
        }

        if let Some(position) = response.interact_pointer_pos() {
            if response.double_clicked() {
                self.engine.double_click(local(position));
            } else if response.clicked() {
                self.engine.click(local(position), shift, &mut self.events);
            }
        }

        if response.hovered()
            && scroll_y.abs() > f32::EPSILON
            && let Some(position) = hover_pos
        {
            self.engine.scroll(local(position), scroll_y);
        }

        if escape && self.engine.isolated_id().is_some() {
            self.engine.clear_isolation();
        }

        let outcome = self.engine.tick(&mut self.events);
        self.engine.paint(&mut PainterCanvas {
            painter: &painter,
            rect,
        });

        if outcome.needs_repaint() || response.dragged() || self.engine.viewport().is_flying() {
            ui.ctx().request_repaint();
        }
    }
}
