use eframe::egui::{Color32, Pos2, Rect};

use super::model::{NodeGroup, PaperNode};

pub(super) const CORE_RADIUS: f32 = 18.0;
pub(super) const NODE_RADIUS: f32 = 9.0;
pub(super) const SELECTED_HALO: Color32 = Color32::from_rgba_premultiplied(45, 37, 4, 46);
pub(super) const SELECTED_RING: Color32 = Color32::from_rgba_premultiplied(113, 92, 9, 115);
pub(super) const MINIMAP_SELECTED: Color32 = Color32::from_rgb(250, 204, 21);
pub(super) const BACKGROUND: Color32 = Color32::from_rgb(11, 15, 25);

/// Core nodes draw twice as large; other nodes grow slightly with degree.
pub(super) fn node_radius(node: &PaperNode) -> f32 {
    match node.group {
        NodeGroup::Core => CORE_RADIUS,
        _ => NODE_RADIUS + (node.degree.min(6) as f32) * 0.5,
    }
}

pub(super) fn group_color(group: NodeGroup) -> Color32 {
    match group {
        NodeGroup::Core => Color32::from_rgb(16, 185, 129),
        NodeGroup::Related => with_opacity(Color32::from_rgb(74, 144, 255), 0.95),
        NodeGroup::Peripheral => with_opacity(Color32::from_rgb(74, 144, 255), 0.65),
    }
}

pub(super) fn source_color(source: &str) -> Color32 {
    match source {
        "Semantic Scholar" => Color32::from_rgb(52, 211, 153),
        "OpenAlex" => Color32::from_rgb(96, 165, 250),
        "Crossref" => Color32::from_rgb(251, 191, 36),
        "arXiv" => Color32::from_rgb(251, 113, 133),
        _ => Color32::from_rgb(148, 163, 184),
    }
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let [r, g, b, a] = color.to_srgba_unmultiplied();
    Color32::from_rgba_unmultiplied(r, g, b, (a as f32 * opacity.clamp(0.0, 1.0)) as u8)
}

/// Normalized weight position in `[min, max]`. A flat range maps everything
/// to 1 instead of dividing by zero.
pub(super) fn weight_ratio(weight: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if !range.is_finite() || range.abs() <= f32::EPSILON {
        return 1.0;
    }
    ((weight - min) / range).clamp(0.0, 1.0)
}

pub(super) fn edge_stroke_width(ratio: f32) -> f32 {
    (0.9 + ratio * 1.6).clamp(0.8, 2.6)
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    !(position.x + radius < rect.left()
        || position.x - radius > rect.right()
        || position.y + radius < rect.top()
        || position.y - radius > rect.bottom())
}

/// Cheap bounding-box rejection for edges entirely off screen.
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let min_x = start.x.min(end.x) - padding;
    let max_x = start.x.max(end.x) + padding;
    let min_y = start.y.min(end.y) - padding;
    let max_y = start.y.max(end.y) + padding;

    !(max_x < rect.left() || min_x > rect.right() || max_y < rect.top() || min_y > rect.bottom())
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    #[test]
    fn equal_weights_give_uniform_ratio() {
        for weight in [1.0, 1.0, 1.0] {
            let ratio = weight_ratio(weight, 1.0, 1.0);
            assert_eq!(ratio, 1.0);
            assert!((edge_stroke_width(ratio) - 2.5).abs() < 1e-5);
        }
        assert_eq!(weight_ratio(0.5, 0.0, 1.0), 0.5);
        assert_eq!(edge_stroke_width(0.0), 0.9);
    }

    #[test]
    fn opacity_scales_alpha_only() {
        let color = with_opacity(Color32::from_rgb(74, 144, 255), 0.5);
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        assert!(r.abs_diff(74) <= 2 && g.abs_diff(144) <= 2 && b.abs_diff(255) <= 2);
        assert!((125..=129).contains(&a));
    }

    #[test]
    fn culling_rejects_far_away_shapes() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));
        assert!(circle_visible(rect, pos2(-5.0, 50.0), 10.0));
        assert!(!circle_visible(rect, pos2(-50.0, 50.0), 10.0));
        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!edge_visible(rect, pos2(-50.0, -50.0), pos2(-10.0, -20.0), 2.0));
    }
}
