//! Watermark layer building.
//!
//! A layer is a transparent RGBA raster holding the finished text: shadow,
//! then stroke, then fill, all painted from the same (possibly simulated)
//! glyph mask so the three stay pixel-aligned. The canvas is inflated by the
//! stroke width plus the shadow offset on every side, so nothing painted is
//! ever clipped by the layer edge.

use super::compositor::blend_pixels;
use super::simulator::{SimulationPlan, StyleSimulator};
use super::style::WatermarkStyleSpec;
use super::text_renderer::{rasterize_run, GlyphMask};
use super::WatermarkError;
use crate::font::{FontAsset, FontCatalog, FontResolver, ResolutionStep, ResolverPolicy};
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// A finished watermark raster, ready for placement.
#[derive(Clone)]
pub struct WatermarkLayer {
    pub pixels: RgbaImage,
    /// Top-left of the text layout box inside `pixels`.
    pub origin_offset: (i32, i32),
    /// Font asset the text was drawn with.
    pub font: FontAsset,
    pub resolution_step: ResolutionStep,
    pub simulation: SimulationPlan,
    /// Size of the glyph run before italic simulation and decorations.
    pub text_size: (u32, u32),
}

impl WatermarkLayer {
    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    /// At least one pixel is not fully transparent.
    pub fn has_content(&self) -> bool {
        self.pixels.pixels().any(|p| p[3] > 0)
    }
}

impl std::fmt::Debug for WatermarkLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkLayer")
            .field("dimensions", &(self.width(), self.height()))
            .field("origin_offset", &self.origin_offset)
            .field("font", &self.font.reference)
            .field("resolution_step", &self.resolution_step)
            .field("simulation", &self.simulation)
            .finish()
    }
}

/// Builds watermark layers from style specs.
#[derive(Debug, Clone)]
pub struct WatermarkLayerBuilder<'c> {
    resolver: FontResolver<'c>,
    simulator: StyleSimulator,
}

impl<'c> WatermarkLayerBuilder<'c> {
    pub fn new(resolver: FontResolver<'c>, simulator: StyleSimulator) -> Self {
        Self {
            resolver,
            simulator,
        }
    }

    /// Builder over `catalog` with default policy and simulation.
    pub fn with_catalog(catalog: &'c FontCatalog) -> Self {
        Self::new(
            FontResolver::new(catalog, ResolverPolicy::default()),
            StyleSimulator::default(),
        )
    }

    pub fn resolver(&self) -> &FontResolver<'c> {
        &self.resolver
    }

    pub fn simulator(&self) -> &StyleSimulator {
        &self.simulator
    }

    /// Render `spec` into a new layer.
    ///
    /// Fails only for invalid requests. A font that cannot be loaded is
    /// replaced by the bundled font.
    pub fn build(&self, spec: &WatermarkStyleSpec) -> Result<WatermarkLayer, WatermarkError> {
        spec.validate()?;

        let resolution = self.resolver.resolve_with_override(
            spec.font_path.as_deref(),
            &spec.family,
            spec.bold,
            spec.italic,
        );

        let (font, handle, step) = match resolution.asset.reference.resolve_to_handle() {
            Ok(handle) => (resolution.asset, handle, resolution.step),
            Err(e) => {
                tracing::warn!(
                    font = %resolution.asset.reference,
                    error = %e,
                    "Font failed to load, using bundled font"
                );
                let bundled = FontAsset::bundled();
                let handle = bundled.reference.resolve_to_handle()?;
                (bundled, handle, ResolutionStep::Bundled)
            }
        };

        let plan = self.simulator.needs_simulation(&font, spec.bold, spec.italic);
        if plan.is_active() {
            tracing::debug!(
                family = %font.display_family,
                bold = plan.bold,
                italic = plan.italic,
                "Simulating font style"
            );
        }

        let mask = rasterize_run(&handle, &spec.text, spec.size);
        if mask.is_blank() {
            return Err(WatermarkError::InvalidRequest(format!(
                "Text {:?} has no visible glyphs",
                spec.text
            )));
        }
        let mask = if plan.bold {
            self.simulator.embolden(&mask)
        } else {
            mask
        };
        let text_size = (mask.width(), mask.height());
        let mask = if plan.italic {
            self.simulator.italicize(&mask)
        } else {
            mask
        };

        self.paint(spec, mask, font, step, plan, text_size)
    }

    fn paint(
        &self,
        spec: &WatermarkStyleSpec,
        mask: GlyphMask,
        font: FontAsset,
        resolution_step: ResolutionStep,
        simulation: SimulationPlan,
        text_size: (u32, u32),
    ) -> Result<WatermarkLayer, WatermarkError> {
        let stroke = spec.stroke_width();
        let too_large = || {
            WatermarkError::InvalidRequest(format!(
                "Watermark layer for {:?} is too large",
                spec.text
            ))
        };
        let inflate = stroke
            .checked_add(spec.shadow_magnitude())
            .filter(|&i| i <= i32::MAX as u32 / 4)
            .ok_or_else(too_large)?;
        let width = mask.width().checked_add(2 * inflate).ok_or_else(too_large)?;
        let height = mask.height().checked_add(2 * inflate).ok_or_else(too_large)?;

        let mut pixels = RgbaImage::new(width, height);
        let text_at = (inflate as i32, inflate as i32);

        let outline = (stroke > 0).then(|| dilate(&mask.coverage, stroke));
        let outline_at = (text_at.0 - stroke as i32, text_at.1 - stroke as i32);

        if let Some(shadow) = spec.shadow {
            let (shape, at) = match &outline {
                Some(o) => (o, outline_at),
                None => (&mask.coverage, text_at),
            };
            paint_mask(
                &mut pixels,
                shape,
                (at.0 + shadow.offset_x, at.1 + shadow.offset_y),
                shadow.color.to_rgba(spec.opacity),
            );
        }

        if let (Some(outline), Some(stroke)) = (&outline, spec.stroke) {
            paint_mask(&mut pixels, outline, outline_at, stroke.color.to_rgba(spec.opacity));
        }

        paint_mask(&mut pixels, &mask.coverage, text_at, spec.color.to_rgba(spec.opacity));

        Ok(WatermarkLayer {
            pixels,
            origin_offset: (text_at.0 + mask.origin.0, text_at.1 + mask.origin.1),
            font,
            resolution_step,
            simulation,
            text_size,
        })
    }
}

/// Paint `mask` in `color` onto `canvas` with its top-left at `at`.
fn paint_mask(canvas: &mut RgbaImage, mask: &GrayImage, at: (i32, i32), color: Rgba<u8>) {
    if color[3] == 0 {
        return;
    }

    for (x, y, coverage) in mask.enumerate_pixels() {
        if coverage[0] == 0 {
            continue;
        }

        let tx = at.0 + x as i32;
        let ty = at.1 + y as i32;
        if tx < 0 || ty < 0 || tx >= canvas.width() as i32 || ty >= canvas.height() as i32 {
            continue;
        }

        let alpha = (color[3] as u32 * coverage[0] as u32 + 127) / 255;
        let pixel = Rgba([color[0], color[1], color[2], alpha as u8]);
        let existing = *canvas.get_pixel(tx as u32, ty as u32);
        canvas.put_pixel(tx as u32, ty as u32, blend_pixels(existing, pixel));
    }
}

/// Grow coverage by `radius` pixels in every direction (round pen).
///
/// The result is `2 * radius` larger in each dimension; source pixel
/// `(x, y)` lands at `(x + radius, y + radius)`.
fn dilate(mask: &GrayImage, radius: u32) -> GrayImage {
    let r = radius as i32;
    let reach = (radius as f32 + 0.5).powi(2);
    let offsets: Vec<(i32, i32)> = (-r..=r)
        .flat_map(|dy| (-r..=r).map(move |dx| (dx, dy)))
        .filter(|&(dx, dy)| ((dx * dx + dy * dy) as f32) <= reach)
        .collect();

    let mut out = GrayImage::new(mask.width() + 2 * radius, mask.height() + 2 * radius);
    for (x, y, p) in mask.enumerate_pixels() {
        if p[0] == 0 {
            continue;
        }
        for &(dx, dy) in &offsets {
            let tx = (x as i32 + r + dx) as u32;
            let ty = (y as i32 + r + dy) as u32;
            let target = out.get_pixel_mut(tx, ty);
            if p[0] > target[0] {
                *target = Luma([p[0]]);
            }
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{bundled_font_data, DiscoveredFont, FamilyPredicate};
    use crate::watermark::simulator::SimulationParams;
    use crate::watermark::style::{Color, ShadowSpec, StrokeSpec};
    use rstest::rstest;
    use tempfile::TempDir;

    /// Catalog with a complete "Arial" and an upright-only "Upright Sans",
    /// all backed by the bundled font bytes.
    fn fixture_catalog() -> (TempDir, FontCatalog) {
        let dir = tempfile::tempdir().unwrap();
        let names = [
            "Arial",
            "Arial Bold",
            "Arial Italic",
            "Arial Bold Italic",
            "Upright Sans",
        ];
        let fonts = names
            .iter()
            .map(|name| {
                let path = dir.path().join(format!("{}.ttf", name.replace(' ', "-")));
                std::fs::write(&path, bundled_font_data()).unwrap();
                DiscoveredFont::new(*name, path)
            })
            .collect();
        (dir, FontCatalog::from_fonts(fonts))
    }

    fn builder(catalog: &FontCatalog) -> WatermarkLayerBuilder<'_> {
        let policy = ResolverPolicy {
            default_chain: Vec::new(),
            ..ResolverPolicy::default()
        };
        WatermarkLayerBuilder::new(FontResolver::new(catalog, policy), StyleSimulator::default())
    }

    fn opaque(text: &str, family: &str) -> WatermarkStyleSpec {
        WatermarkStyleSpec {
            family: family.to_string(),
            opacity: 1.0,
            ..WatermarkStyleSpec::new(text)
        }
    }

    #[test]
    fn test_plain_layer_uses_base_asset() {
        let (_dir, catalog) = fixture_catalog();
        let layer = builder(&catalog).build(&opaque("2024-03-15", "Arial")).unwrap();

        assert_eq!(layer.resolution_step, ResolutionStep::Direct);
        assert_eq!(layer.font.variant.bold, false);
        assert!(!layer.simulation.is_active());
        assert_eq!((layer.width(), layer.height()), layer.text_size);
        assert!(layer.has_content());
    }

    #[rstest]
    #[case("Arial", false, false)]
    #[case("Arial", true, false)]
    #[case("Arial", false, true)]
    #[case("Arial", true, true)]
    #[case("Upright Sans", false, false)]
    #[case("Upright Sans", true, false)]
    #[case("Upright Sans", false, true)]
    #[case("Upright Sans", true, true)]
    fn test_every_style_combination_renders(
        #[case] family: &str,
        #[case] bold: bool,
        #[case] italic: bool,
    ) {
        let (_dir, catalog) = fixture_catalog();
        let spec = WatermarkStyleSpec {
            bold,
            italic,
            ..opaque("Watermark", family)
        };
        let layer = builder(&catalog).build(&spec).unwrap();
        assert!(layer.has_content());

        let has_true_variants = family == "Arial";
        assert_eq!(layer.simulation.bold, bold && !has_true_variants);
        assert_eq!(layer.simulation.italic, italic && !has_true_variants);
    }

    #[test]
    fn test_simulated_italic_widens_by_shear_margin() {
        let (_dir, catalog) = fixture_catalog();
        let builder = builder(&catalog);
        let spec = WatermarkStyleSpec {
            italic: true,
            ..opaque("Slanted", "Upright Sans")
        };
        let layer = builder.build(&spec).unwrap();

        assert!(layer.simulation.italic);
        let margin = builder.simulator().shear_margin(layer.text_size.1);
        assert!(layer.width() >= layer.text_size.0 + margin);
        assert!(layer.height() >= layer.text_size.1);
    }

    #[test]
    fn test_decorations_inflate_layer() {
        let (_dir, catalog) = fixture_catalog();
        let builder = builder(&catalog);
        let plain = builder.build(&opaque("Deco", "Arial")).unwrap();

        let spec = WatermarkStyleSpec {
            shadow: Some(ShadowSpec {
                offset_x: 3,
                offset_y: -4,
                color: Color::black(),
            }),
            stroke: Some(StrokeSpec {
                width: 2,
                color: Color::new(255, 0, 0),
            }),
            ..opaque("Deco", "Arial")
        };
        let decorated = builder.build(&spec).unwrap();

        let inflate = 2 * (2 + 4);
        assert_eq!(decorated.width(), plain.width() + inflate);
        assert_eq!(decorated.height(), plain.height() + inflate);
        assert_eq!(
            decorated.origin_offset,
            (plain.origin_offset.0 + 6, plain.origin_offset.1 + 6)
        );
    }

    #[test]
    fn test_shadow_painted_under_fill() {
        let (_dir, catalog) = fixture_catalog();
        let spec = WatermarkStyleSpec {
            shadow: Some(ShadowSpec {
                offset_x: -6,
                offset_y: 6,
                color: Color::black(),
            }),
            size: 48.0,
            ..opaque("Edges", "Upright Sans")
        };
        let layer = builder(&catalog).build(&spec).unwrap();

        let black = layer.pixels.pixels().any(|p| p.0 == [0, 0, 0, 255]);
        let white = layer.pixels.pixels().any(|p| p.0 == [255, 255, 255, 255]);
        assert!(black, "shadow visible");
        assert!(white, "fill visible on top of shadow");
    }

    #[test]
    fn test_fill_paints_over_stroke() {
        let (_dir, catalog) = fixture_catalog();
        let spec = WatermarkStyleSpec {
            color: Color::new(0, 255, 0),
            stroke: Some(StrokeSpec {
                width: 2,
                color: Color::new(255, 0, 0),
            }),
            size: 64.0,
            ..opaque("I", "Arial")
        };
        let layer = builder(&catalog).build(&spec).unwrap();

        let green = layer.pixels.pixels().any(|p| p[1] == 255 && p[0] == 0 && p[3] == 255);
        let red = layer.pixels.pixels().any(|p| p[0] == 255 && p[1] == 0 && p[3] == 255);
        assert!(green, "fill color visible");
        assert!(red, "stroke color visible around fill");
    }

    #[test]
    fn test_opacity_folded_into_alpha() {
        let (_dir, catalog) = fixture_catalog();
        let builder = builder(&catalog);
        let full = builder
            .build(&WatermarkStyleSpec {
                size: 48.0,
                ..opaque("Alpha", "Arial")
            })
            .unwrap();
        let half = builder
            .build(&WatermarkStyleSpec {
                opacity: 0.5,
                size: 48.0,
                ..opaque("Alpha", "Arial")
            })
            .unwrap();

        let max_alpha = |l: &WatermarkLayer| l.pixels.pixels().map(|p| p[3]).max().unwrap_or(0);
        assert_eq!(max_alpha(&full), 255);
        assert!(max_alpha(&half) <= 128);
        assert!(max_alpha(&half) > 0);
    }

    #[test]
    fn test_unloadable_font_falls_back_to_bundled() {
        let dir = tempfile::tempdir().unwrap();
        let broken = dir.path().join("Broken.ttf");
        std::fs::write(&broken, b"not a font").unwrap();
        let catalog = FontCatalog::from_fonts(vec![DiscoveredFont::new("Broken", &broken)]);

        let layer = builder(&catalog).build(&opaque("Still here", "Broken")).unwrap();
        assert_eq!(layer.resolution_step, ResolutionStep::Bundled);
        assert!(layer.font.reference.is_bundled());
        assert!(layer.has_content());
    }

    #[test]
    fn test_font_path_override() {
        let (dir, catalog) = fixture_catalog();
        let path = dir.path().join("Override-Bold.ttf");
        std::fs::write(&path, bundled_font_data()).unwrap();

        let spec = WatermarkStyleSpec {
            font_path: Some(path.clone()),
            bold: true,
            ..opaque("Override", "Arial")
        };
        let layer = builder(&catalog).build(&spec).unwrap();
        assert_eq!(layer.resolution_step, ResolutionStep::Override);
        assert_eq!(layer.font.reference.file_path(), Some(path.as_path()));
        assert!(!layer.simulation.bold);
    }

    #[rstest]
    #[case("")]
    #[case("  \n ")]
    #[case("\u{7}")]
    #[case("\u{200B}")]
    #[case("\u{200B}\r\n\u{2060}")]
    fn test_empty_text_rejected(#[case] text: &str) {
        let (_dir, catalog) = fixture_catalog();
        let result = builder(&catalog).build(&opaque(text, "Arial"));
        assert!(matches!(result, Err(WatermarkError::InvalidRequest(_))));
    }

    #[rstest]
    #[case(Some(ShadowSpec { offset_x: i32::MAX, ..ShadowSpec::default() }), None)]
    #[case(Some(ShadowSpec { offset_y: i32::MIN, ..ShadowSpec::default() }), None)]
    #[case(None, Some(StrokeSpec { width: u32::MAX, ..StrokeSpec::default() }))]
    fn test_oversized_decorations_rejected(
        #[case] shadow: Option<ShadowSpec>,
        #[case] stroke: Option<StrokeSpec>,
    ) {
        let (_dir, catalog) = fixture_catalog();
        let spec = WatermarkStyleSpec {
            shadow,
            stroke,
            ..opaque("Huge", "Arial")
        };
        let result = builder(&catalog).build(&spec);
        assert!(matches!(result, Err(WatermarkError::InvalidRequest(_))));
    }

    #[test]
    fn test_oversized_font_rejected() {
        let (_dir, catalog) = fixture_catalog();
        let spec = WatermarkStyleSpec {
            size: 1.0e9,
            ..opaque("Huge", "Arial")
        };
        let result = builder(&catalog).build(&spec);
        assert!(matches!(result, Err(WatermarkError::InvalidRequest(_))));
    }

    #[test]
    fn test_italic_predicate_can_disable_simulation() {
        let (_dir, catalog) = fixture_catalog();
        let policy = ResolverPolicy {
            default_chain: Vec::new(),
            ..ResolverPolicy::default()
        };
        let builder = WatermarkLayerBuilder::new(
            FontResolver::new(&catalog, policy),
            StyleSimulator::new(SimulationParams::default(), FamilyPredicate::Nothing),
        );
        let spec = WatermarkStyleSpec {
            italic: true,
            ..opaque("Upright", "Upright Sans")
        };
        let layer = builder.build(&spec).unwrap();
        assert!(!layer.simulation.italic);
    }

    #[test]
    fn test_build_is_deterministic() {
        let (_dir, catalog) = fixture_catalog();
        let builder = builder(&catalog);
        let spec = WatermarkStyleSpec {
            bold: true,
            italic: true,
            stroke: Some(StrokeSpec::default()),
            shadow: Some(ShadowSpec::default()),
            ..opaque("Same every time", "Upright Sans")
        };
        let a = builder.build(&spec).unwrap();
        let b = builder.build(&spec).unwrap();
        assert_eq!(a.pixels, b.pixels);
        assert_eq!(a.origin_offset, b.origin_offset);
    }

    #[test]
    fn test_dilate() {
        let mut mask = GrayImage::new(3, 3);
        mask.put_pixel(1, 1, Luma([255]));
        let out = dilate(&mask, 1);

        assert_eq!(out.dimensions(), (5, 5));
        assert_eq!(out.get_pixel(2, 2)[0], 255);
        assert_eq!(out.get_pixel(1, 1)[0], 255);
        assert_eq!(out.get_pixel(3, 2)[0], 255);
        assert_eq!(out.get_pixel(0, 0)[0], 0);
    }
}
