use std::fs;
use std::path::{Path, PathBuf};

use eframe::egui::{Align2, Color32, ColorImage, Pos2, Rect, Vec2, pos2, vec2};
use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings, TextStyle};
use image::ImageEncoder;
use image::codecs::png::PngEncoder;
use thiserror::Error;

use super::engine::GraphEngine;
use super::render::{Canvas, anchored_min};
use super::render_utils::BACKGROUND;

const LEGEND_TITLE: &str = "Connected Graph";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("nothing to export: canvas is {width}x{height}")]
    EmptyCanvas { width: usize, height: usize },
    #[error("failed to encode PNG")]
    Encode(#[from] image::ImageError),
    #[error("failed to write {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to load export font {path}: {message}")]
    Font { path: PathBuf, message: String },
}

pub fn load_export_font(path: &Path) -> Result<fontdue::Font, ExportError> {
    let bytes = fs::read(path).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default()).map_err(|message| {
        ExportError::Font {
            path: path.to_path_buf(),
            message: message.to_owned(),
        }
    })
}

/// Offscreen canvas over an egui `ColorImage`. Text needs a font; without
/// one it is skipped and only shapes are drawn.
pub struct RasterCanvas<'a> {
    image: ColorImage,
    font: Option<&'a fontdue::Font>,
}

impl<'a> RasterCanvas<'a> {
    pub fn new(width: usize, height: usize, font: Option<&'a fontdue::Font>) -> Self {
        Self {
            image: ColorImage::filled([width, height], BACKGROUND),
            font,
        }
    }

    pub fn into_image(self) -> ColorImage {
        self.image
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<Color32> {
        let [width, height] = self.image.size;
        (x < width && y < height).then(|| self.image.pixels[y * width + x])
    }

    /// Source-over blend of `color` at `coverage` in `[0, 1]`.
    fn blend_pixel(&mut self, x: i32, y: i32, color: Color32, coverage: f32) {
        let [width, height] = self.image.size;
        if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 || coverage <= 0.0 {
            return;
        }
        let index = y as usize * width + x as usize;
        let Some(pixel) = self.image.pixels.get_mut(index) else {
            return;
        };

        let [sr, sg, sb, sa] = color.to_srgba_unmultiplied();
        let [dr, dg, db, da] = pixel.to_srgba_unmultiplied();
        let src_a = (sa as f32 / 255.0) * coverage.min(1.0);
        let inverse = 1.0 - src_a;
        let mix = |s: u8, d: u8| ((s as f32 * src_a) + (d as f32 * inverse)).round() as u8;
        let out_a = ((src_a * 255.0) + (da as f32 * inverse)).round().min(255.0) as u8;
        *pixel = Color32::from_rgba_unmultiplied(mix(sr, dr), mix(sg, dg), mix(sb, db), out_a);
    }

    fn cover_box(&mut self, min: Pos2, max: Pos2, mut coverage: impl FnMut(Pos2) -> f32, color: Color32) {
        let [width, height] = self.image.size;
        let x0 = min.x.floor().max(0.0) as i32;
        let y0 = min.y.floor().max(0.0) as i32;
        let x1 = max.x.ceil().min(width as f32) as i32;
        let y1 = max.y.ceil().min(height as f32) as i32;
        for y in y0..y1 {
            for x in x0..x1 {
                let sample = pos2(x as f32 + 0.5, y as f32 + 0.5);
                let amount = coverage(sample);
                self.blend_pixel(x, y, color, amount);
            }
        }
    }

    fn text_extent(&self, font: &fontdue::Font, text: &str, size: f32) -> Vec2 {
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &TextStyle::new(text, size, 0));
        let width = layout
            .glyphs()
            .iter()
            .map(|glyph| glyph.x + glyph.width as f32)
            .fold(0.0_f32, f32::max);
        vec2(width, layout.height())
    }
}

impl Canvas for RasterCanvas<'_> {
    fn size(&self) -> Vec2 {
        vec2(self.image.size[0] as f32, self.image.size[1] as f32)
    }

    fn line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32) {
        let half = (width * 0.5).max(0.5);
        let segment = to - from;
        let length_sq = segment.length_sq();
        let min = pos2(from.x.min(to.x), from.y.min(to.y)) - Vec2::splat(half + 1.0);
        let max = pos2(from.x.max(to.x), from.y.max(to.y)) + Vec2::splat(half + 1.0);
        self.cover_box(
            min,
            max,
            |sample| {
                let t = if length_sq > f32::EPSILON {
                    ((sample - from).dot(segment) / length_sq).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let distance = sample.distance(from + segment * t);
                (half + 0.5 - distance).clamp(0.0, 1.0)
            },
            color,
        );
    }

    fn circle_filled(&mut self, center: Pos2, radius: f32, color: Color32) {
        let reach = Vec2::splat(radius + 1.0);
        self.cover_box(
            center - reach,
            center + reach,
            |sample| (radius + 0.5 - sample.distance(center)).clamp(0.0, 1.0),
            color,
        );
    }

    fn circle_stroke(&mut self, center: Pos2, radius: f32, width: f32, color: Color32) {
        let half = (width * 0.5).max(0.5);
        let reach = Vec2::splat(radius + half + 1.0);
        self.cover_box(
            center - reach,
            center + reach,
            |sample| (half + 0.5 - (sample.distance(center) - radius).abs()).clamp(0.0, 1.0),
            color,
        );
    }

    fn rect_filled(&mut self, rect: Rect, color: Color32) {
        self.cover_box(rect.min, rect.max, |_| 1.0, color);
    }

    fn rect_stroke(&mut self, rect: Rect, width: f32, color: Color32) {
        let inner = rect.shrink(width.max(1.0));
        self.cover_box(
            rect.min,
            rect.max,
            |sample| if inner.contains(sample) { 0.0 } else { 1.0 },
            color,
        );
    }

    fn text(&mut self, position: Pos2, anchor: Align2, text: &str, size: f32, color: Color32) {
        let Some(font) = self.font else {
            return;
        };
        let extent = self.text_extent(font, text, size);
        let origin = anchored_min(position, anchor, extent);

        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings {
            x: origin.x,
            y: origin.y,
            ..LayoutSettings::default()
        });
        layout.append(&[font], &TextStyle::new(text, size, 0));

        for glyph in layout.glyphs() {
            if glyph.width == 0 || glyph.height == 0 {
                continue;
            }
            let (metrics, bitmap) = font.rasterize_indexed(glyph.key.glyph_index, glyph.key.px);
            let start_x = glyph.x.floor() as i32;
            let start_y = glyph.y.floor() as i32;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let alpha = bitmap[row * metrics.width + col];
                    if alpha > 0 {
                        self.blend_pixel(
                            start_x + col as i32,
                            start_y + row as i32,
                            color,
                            alpha as f32 / 255.0,
                        );
                    }
                }
            }
        }
    }
}

/// Legend panel drawn onto exported images only.
pub fn draw_legend(canvas: &mut dyn Canvas, entries: &[(String, Color32)]) {
    let height = 24.0 + entries.len() as f32 * 18.0;
    canvas.rect_filled(
        Rect::from_min_size(pos2(16.0, 16.0), vec2(260.0, height)),
        Color32::from_rgba_unmultiplied(15, 23, 42, 217),
    );
    canvas.text(
        pos2(26.0, 34.0),
        Align2::LEFT_BOTTOM,
        LEGEND_TITLE,
        12.0,
        Color32::from_rgba_unmultiplied(255, 255, 255, 230),
    );
    for (index, (label, color)) in entries.iter().enumerate() {
        let y = 52.0 + index as f32 * 18.0;
        canvas.circle_filled(pos2(26.0, y - 5.0), 5.0, *color);
        canvas.text(
            pos2(40.0, y),
            Align2::LEFT_BOTTOM,
            label,
            12.0,
            Color32::from_rgba_unmultiplied(255, 255, 255, 204),
        );
    }
}

pub fn encode_png(image: &ColorImage) -> Result<Vec<u8>, ExportError> {
    let [width, height] = image.size;
    if width == 0 || height == 0 {
        return Err(ExportError::EmptyCanvas { width, height });
    }

    let mut rgba = Vec::with_capacity(image.pixels.len() * 4);
    for pixel in &image.pixels {
        rgba.extend_from_slice(&pixel.to_srgba_unmultiplied());
    }

    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes).write_image(
        &rgba,
        width as u32,
        height as u32,
        image::ExtendedColorType::Rgba8,
    )?;
    Ok(bytes)
}

pub fn write_png(path: &Path, image: &ColorImage) -> Result<(), ExportError> {
    let bytes = encode_png(image)?;
    fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::info!(
        path = %path.display(),
        width = image.size[0],
        height = image.size[1],
        "graph exported"
    );
    Ok(())
}

impl GraphEngine {
    /// Renders the current view offscreen, optionally with the legend panel.
    pub fn export_image(
        &self,
        font: Option<&fontdue::Font>,
        with_legend: bool,
    ) -> Result<ColorImage, ExportError> {
        let size = self.viewport().size();
        let (width, height) = (size.x.round() as usize, size.y.round() as usize);
        if width == 0 || height == 0 {
            return Err(ExportError::EmptyCanvas { width, height });
        }

        let mut canvas = RasterCanvas::new(width, height, font);
        self.paint(&mut canvas);
        if with_legend {
            draw_legend(&mut canvas, &self.legend_entries());
        }
        Ok(canvas.into_image())
    }
}
