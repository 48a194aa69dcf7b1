use eframe::egui::{Pos2, Rect, Vec2, vec2};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewportLimits {
    pub min_scale: f32,
    pub max_scale: f32,
    pub fly_factor: f32,
    pub offset_epsilon: f32,
    pub scale_epsilon: f32,
    pub fit_padding: f32,
    pub zoom_in_step: f32,
    pub zoom_out_step: f32,
}

impl Default for ViewportLimits {
    fn default() -> Self {
        Self {
            min_scale: 0.5,
            max_scale: 2.6,
            fly_factor: 0.12,
            offset_epsilon: 0.2,
            scale_epsilon: 0.002,
            fit_padding: 40.0,
            zoom_in_step: 1.08,
            zoom_out_step: 0.92,
        }
    }
}

impl ViewportLimits {
    pub fn clamp_scale(&self, scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(self.min_scale, self.max_scale)
        } else {
            self.min_scale
        }
    }
}

/// Screen position of the world origin plus zoom. Screen coordinates are
/// local to the canvas, origin at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub offset: Vec2,
    pub scale: f32,
}

impl Camera {
    pub fn centered(size: Vec2) -> Self {
        Self {
            offset: size * 0.5,
            scale: 1.0,
        }
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        (screen.to_vec2() - self.offset) / self.scale
    }

    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        (world * self.scale + self.offset).to_pos2()
    }
}

#[derive(Clone, Debug)]
pub struct Viewport {
    camera: Camera,
    target: Option<Camera>,
    size: Vec2,
    limits: ViewportLimits,
}

impl Viewport {
    pub fn new(size: Vec2, limits: ViewportLimits) -> Self {
        Self {
            camera: Camera::centered(size),
            target: None,
            size,
            limits,
        }
    }

    pub fn camera(&self) -> Camera {
        self.camera
    }

    pub fn scale(&self) -> f32 {
        self.camera.scale
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn limits(&self) -> &ViewportLimits {
        &self.limits
    }

    pub fn is_flying(&self) -> bool {
        self.target.is_some()
    }

    /// Keeps the world point under the canvas centre fixed across resizes.
    pub fn resize(&mut self, size: Vec2) {
        if size == self.size || size.x <= 0.0 || size.y <= 0.0 {
            return;
        }
        let shift = (size - self.size) * 0.5;
        self.camera.offset += shift;
        if let Some(target) = &mut self.target {
            target.offset += shift;
        }
        self.size = size;
    }

    pub fn screen_to_world(&self, screen: Pos2) -> Vec2 {
        self.camera.screen_to_world(screen)
    }

    pub fn world_to_screen(&self, world: Vec2) -> Pos2 {
        self.camera.world_to_screen(world)
    }

    /// Zoom toward `cursor`: the world point under it stays put.
    pub fn zoom_at(&mut self, cursor: Pos2, factor: f32) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        self.target = None;

        let scale = self.limits.clamp_scale(self.camera.scale * factor);
        let cursor = cursor.to_vec2();
        self.camera.offset = (self.camera.offset - cursor) * (scale / self.camera.scale) + cursor;
        self.camera.scale = scale;
    }

    pub fn zoom_in(&mut self) {
        self.zoom_at((self.size * 0.5).to_pos2(), self.limits.zoom_in_step);
    }

    pub fn zoom_out(&mut self) {
        self.zoom_at((self.size * 0.5).to_pos2(), self.limits.zoom_out_step);
    }

    pub fn pan(&mut self, delta: Vec2) {
        self.target = None;
        self.camera.offset += delta;
    }

    pub fn fly_to(&mut self, target: Camera) {
        self.target = Some(Camera {
            offset: target.offset,
            scale: self.limits.clamp_scale(target.scale),
        });
    }

    pub fn cancel_flight(&mut self) {
        self.target = None;
    }

    /// One easing step toward the fly-to target. Returns whether the camera
    /// is still moving afterwards.
    pub fn advance(&mut self) -> bool {
        let Some(target) = self.target else {
            return false;
        };

        let factor = self.limits.fly_factor;
        self.camera.offset += (target.offset - self.camera.offset) * factor;
        self.camera.scale += (target.scale - self.camera.scale) * factor;

        let offset_error = target.offset - self.camera.offset;
        if offset_error.x.abs() < self.limits.offset_epsilon
            && offset_error.y.abs() < self.limits.offset_epsilon
            && (target.scale - self.camera.scale).abs() < self.limits.scale_epsilon
        {
            self.camera = target;
            self.target = None;
            return false;
        }
        true
    }

    /// Camera that frames `bounds` plus padding. Empty or degenerate bounds
    /// fall back to the limits instead of dividing by zero.
    pub fn fit_camera(&self, bounds: Option<Rect>) -> Camera {
        let Some(bounds) = bounds else {
            return Camera::centered(self.size);
        };

        let padded = bounds.expand(self.limits.fit_padding);
        let (width, height) = (padded.width(), padded.height());
        let scale = if width > 0.0 && height > 0.0 {
            self.limits
                .clamp_scale((self.size.x / width).min(self.size.y / height))
        } else {
            self.limits.min_scale
        };

        Camera {
            offset: self.size * 0.5 - padded.center().to_vec2() * scale,
            scale,
        }
    }

    pub fn fit_to(&mut self, bounds: Option<Rect>) {
        let camera = self.fit_camera(bounds);
        self.fly_to(camera);
    }

    pub fn reset(&mut self) {
        self.fly_to(Camera::centered(self.size));
    }
}

pub fn world_bounds(positions: impl IntoIterator<Item = Vec2>) -> Option<Rect> {
    let mut bounds: Option<Rect> = None;
    for position in positions {
        if !position.x.is_finite() || !position.y.is_finite() {
            continue;
        }
        let point = position.to_pos2();
        bounds = Some(match bounds {
            Some(rect) => rect.union(Rect::from_min_max(point, point)),
            None => Rect::from_min_max(point, point),
        });
    }
    bounds
}

/// Default zoom step for one scroll notch, matching the zoom buttons.
pub fn scroll_factor(scroll_y: f32, limits: &ViewportLimits) -> f32 {
    if scroll_y > 0.0 {
        limits.zoom_in_step
    } else if scroll_y < 0.0 {
        limits.zoom_out_step
    } else {
        1.0
    }
}

pub(super) fn canvas_size(rect: Rect) -> Vec2 {
    vec2(rect.width().max(1.0), rect.height().max(1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn assert_close(a: Pos2, b: Pos2) {
        assert!((a - b).length() < 1e-3, "{a:?} != {b:?}");
    }

    #[test]
    fn screen_world_transforms_are_inverse() {
        let mut viewport = Viewport::new(vec2(800.0, 600.0), ViewportLimits::default());
        let points = [pos2(0.0, 0.0), pos2(400.0, 300.0), pos2(799.0, 17.5), pos2(-50.0, 900.0)];

        for step in 0..6 {
            for point in points {
                let round_trip = viewport.world_to_screen(viewport.screen_to_world(point));
                assert_close(round_trip, point);
            }
            viewport.zoom_at(pos2(120.0 + step as f32 * 40.0, 80.0), 1.37);
            viewport.pan(vec2(-13.0, 29.5));
        }
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewport = Viewport::new(vec2(800.0, 600.0), ViewportLimits::default());
        for _ in 0..50 {
            viewport.zoom_at(pos2(100.0, 100.0), 10.0);
            assert!(viewport.scale() <= 2.6);
        }
        assert_eq!(viewport.scale(), 2.6);
        for _ in 0..50 {
            viewport.zoom_at(pos2(700.0, 20.0), 0.01);
            assert!(viewport.scale() >= 0.5);
        }
        assert_eq!(viewport.scale(), 0.5);
    }

    #[test]
    fn zoom_keeps_cursor_point_fixed() {
        let mut viewport = Viewport::new(vec2(800.0, 600.0), ViewportLimits::default());
        let cursor = pos2(610.0, 145.0);
        let before = viewport.screen_to_world(cursor);
        viewport.zoom_at(cursor, 1.08);
        let after = viewport.screen_to_world(cursor);
        assert!((before - after).length() < 1e-3);
    }

    #[test]
    fn fly_to_converges_and_clears_target() {
        let mut viewport = Viewport::new(vec2(800.0, 600.0), ViewportLimits::default());
        let target = Camera {
            offset: vec2(120.0, -40.0),
            scale: 2.0,
        };
        viewport.fly_to(target);

        let mut steps = 0;
        while viewport.advance() {
            steps += 1;
            assert!(steps < 200);
        }
        assert!(!viewport.is_flying());
        assert_eq!(viewport.camera(), target);
    }

    #[test]
    fn user_input_cancels_flight() {
        let mut viewport = Viewport::new(vec2(800.0, 600.0), ViewportLimits::default());
        viewport.reset();
        viewport.pan(vec2(5.0, 0.0));
        assert!(!viewport.is_flying());
    }

    #[test]
    fn fit_handles_degenerate_bounds() {
        let viewport = Viewport::new(vec2(800.0, 600.0), ViewportLimits::default());

        let single = world_bounds([vec2(10.0, 20.0)]);
        let camera = viewport.fit_camera(single);
        assert!(camera.scale.is_finite());
        assert_eq!(camera.scale, 2.6);
        assert_close(camera.world_to_screen(vec2(10.0, 20.0)), pos2(400.0, 300.0));

        let camera = viewport.fit_camera(None);
        assert_eq!(camera, Camera::centered(vec2(800.0, 600.0)));

        let wide = world_bounds([vec2(-1000.0, 0.0), vec2(1000.0, 0.0)]);
        assert_eq!(viewport.fit_camera(wide).scale, 0.5);
    }

    #[test]
    fn resize_keeps_centre_world_point() {
        let mut viewport = Viewport::new(vec2(800.0, 600.0), ViewportLimits::default());
        viewport.zoom_at(pos2(200.0, 200.0), 1.5);
        let centre = viewport.screen_to_world(pos2(400.0, 300.0));
        viewport.resize(vec2(1000.0, 500.0));
        let moved = viewport.screen_to_world(pos2(500.0, 250.0));
        assert!((centre - moved).length() < 1e-3);
    }
}
