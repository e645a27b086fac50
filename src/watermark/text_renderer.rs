//! Glyph-run rasterization into coverage masks.
//!
//! Text is laid out on a single baseline per line (with kerning) and drawn
//! into an 8-bit coverage mask. The mask covers both the layout box
//! (advance width by line height) and the actual ink, so glyphs that
//! overhang their advance are never cut off. Colors are applied later, when
//! the mask is painted into a layer.

use ab_glyph::{point, Font, FontArc, GlyphId, OutlinedGlyph, PxScale, ScaleFont};
use image::{GrayImage, Luma};

/// Measured size of a laid-out text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextMetrics {
    /// Widest line advance in pixels.
    pub advance: f32,
    /// Ascent minus descent.
    pub line_height: f32,
    pub lines: usize,
}

impl TextMetrics {
    /// Layout box rounded up to whole pixels.
    pub fn size(&self) -> (u32, u32) {
        (
            self.advance.ceil() as u32,
            (self.line_height * self.lines as f32).ceil() as u32,
        )
    }
}

/// Coverage of a rendered glyph run.
#[derive(Clone, PartialEq, Eq)]
pub struct GlyphMask {
    pub coverage: GrayImage,
    /// Top-left corner of the layout box inside `coverage`.
    pub origin: (i32, i32),
}

impl GlyphMask {
    pub fn new(coverage: GrayImage, origin: (i32, i32)) -> Self {
        Self { coverage, origin }
    }

    pub fn width(&self) -> u32 {
        self.coverage.width()
    }

    pub fn height(&self) -> u32 {
        self.coverage.height()
    }

    /// No pixel has any coverage.
    pub fn is_blank(&self) -> bool {
        self.coverage.pixels().all(|p| p[0] == 0)
    }
}

impl std::fmt::Debug for GlyphMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GlyphMask")
            .field("dimensions", &(self.width(), self.height()))
            .field("origin", &self.origin)
            .finish()
    }
}

struct Layout {
    glyphs: Vec<OutlinedGlyph>,
    metrics: TextMetrics,
}

fn layout(font: &FontArc, text: &str, size: f32) -> Layout {
    let scale = PxScale::from(size);
    let scaled_font = font.as_scaled(scale);
    let ascent = scaled_font.ascent();
    let line_height = scaled_font.ascent() - scaled_font.descent();

    let mut glyphs = Vec::new();
    let mut advance = 0.0f32;
    let mut lines = 0;

    for (line_no, line) in text.split('\n').enumerate() {
        let baseline_y = line_no as f32 * line_height + ascent;
        let mut cursor_x = 0.0f32;
        let mut prev_glyph: Option<GlyphId> = None;

        for c in line.chars().filter(|c| !c.is_control()) {
            let glyph_id = scaled_font.glyph_id(c);

            if let Some(prev) = prev_glyph {
                cursor_x += scaled_font.kern(prev, glyph_id);
            }

            let glyph = glyph_id.with_scale_and_position(scale, point(cursor_x, baseline_y));
            if let Some(outlined) = font.outline_glyph(glyph) {
                glyphs.push(outlined);
            }

            cursor_x += scaled_font.h_advance(glyph_id);
            prev_glyph = Some(glyph_id);
        }

        advance = advance.max(cursor_x);
        lines = line_no + 1;
    }

    Layout {
        glyphs,
        metrics: TextMetrics {
            advance,
            line_height,
            lines,
        },
    }
}

/// Measure a text run without drawing it.
pub fn measure_text(font: &FontArc, text: &str, size: f32) -> TextMetrics {
    layout(font, text, size).metrics
}

/// Draw a text run into a coverage mask.
pub fn rasterize_run(font: &FontArc, text: &str, size: f32) -> GlyphMask {
    let Layout { glyphs, metrics } = layout(font, text, size);
    let (layout_w, layout_h) = metrics.size();

    let (mut min_x, mut min_y) = (0i32, 0i32);
    let (mut max_x, mut max_y) = (layout_w as i32, layout_h as i32);
    for glyph in &glyphs {
        let bounds = glyph.px_bounds();
        min_x = min_x.min(bounds.min.x.floor() as i32);
        min_y = min_y.min(bounds.min.y.floor() as i32);
        max_x = max_x.max(bounds.max.x.ceil() as i32);
        max_y = max_y.max(bounds.max.y.ceil() as i32);
    }

    let width = (max_x - min_x).max(1) as u32;
    let height = (max_y - min_y).max(1) as u32;
    let mut coverage = GrayImage::new(width, height);

    for glyph in &glyphs {
        let bounds = glyph.px_bounds();
        let left = bounds.min.x.floor() as i32 - min_x;
        let top = bounds.min.y.floor() as i32 - min_y;

        glyph.draw(|px, py, c| {
            let x = left + px as i32;
            let y = top + py as i32;
            if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
                return;
            }

            let value = (c.clamp(0.0, 1.0) * 255.0).round() as u8;
            let pixel = coverage.get_pixel_mut(x as u32, y as u32);
            // Overlapping glyphs keep the stronger coverage
            if value > pixel[0] {
                *pixel = Luma([value]);
            }
        });
    }

    GlyphMask::new(coverage, (-min_x, -min_y))
}
