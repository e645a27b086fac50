//! Bold and italic simulation for fonts that lack a true variant.
//!
//! Simulation works on glyph coverage masks, never on font data:
//!
//! - **Bold**: the mask is composited over itself at small pixel offsets.
//! - **Italic**: the mask is copied into an isolated buffer with a shear
//!   margin on both sides and extra vertical padding, then sheared with a
//!   bilinear affine warp. The margin always covers the slant, so no
//!   coverage is lost. If the warp is rejected, a row-by-row pixel shift
//!   is used instead.
//!
//! Output is a pure function of the input mask and parameters.

use super::text_renderer::GlyphMask;
use super::transform::{warp_coverage, Affine};
use crate::font::{FamilyPredicate, FontAsset};
use image::{GrayImage, Luma};
use serde::{Deserialize, Serialize};

/// Shear used when the configured factor is unusable.
pub const DEFAULT_SHEAR_FACTOR: f32 = 0.2;

/// Largest bold offset count accepted by [`SimulationParams::validate`].
pub const MAX_BOLD_OFFSETS: u32 = 8;

/// Tunable simulation constants. The defaults were picked by eye.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationParams {
    /// Horizontal shift per pixel of height for simulated italics.
    pub shear_factor: f32,
    /// Extra pixels added to each side's shear margin.
    pub shear_constant: u32,
    /// Vertical padding of the italic buffer, split top/bottom.
    pub padding: u32,
    /// Fraction of the total slant the reported text origin follows.
    pub compensation_x: f32,
    /// Fraction of the vertical padding the reported text origin follows.
    pub compensation_y: f32,
    /// Number of 1px horizontal strikes added for simulated bold.
    pub bold_offsets: u32,
    /// Also strike 1px down for simulated bold.
    pub bold_vertical: bool,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            shear_factor: DEFAULT_SHEAR_FACTOR,
            shear_constant: 2,
            padding: 4,
            compensation_x: 0.5,
            compensation_y: 0.0,
            bold_offsets: 1,
            bold_vertical: false,
        }
    }
}

impl SimulationParams {
    pub fn validate(&self) -> Result<(), String> {
        if !self.shear_factor.is_finite() || self.shear_factor.abs() > 1.0 {
            return Err(format!(
                "shear_factor must be between -1.0 and 1.0, got {}",
                self.shear_factor
            ));
        }

        for (name, value) in [
            ("compensation_x", self.compensation_x),
            ("compensation_y", self.compensation_y),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(format!("{} must be between 0.0 and 1.0, got {}", name, value));
            }
        }

        if self.bold_offsets > MAX_BOLD_OFFSETS {
            return Err(format!(
                "bold_offsets must be at most {}, got {}",
                MAX_BOLD_OFFSETS, self.bold_offsets
            ));
        }

        Ok(())
    }
}

/// Which styles have to be simulated for a resolved asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimulationPlan {
    pub bold: bool,
    pub italic: bool,
}

impl SimulationPlan {
    pub fn is_active(&self) -> bool {
        self.bold || self.italic
    }
}

/// Decides on and performs style simulation.
#[derive(Debug, Clone, Default)]
pub struct StyleSimulator {
    params: SimulationParams,
    /// Families whose missing italics get simulated.
    italic_for: FamilyPredicate,
}

impl StyleSimulator {
    pub fn new(params: SimulationParams, italic_for: FamilyPredicate) -> Self {
        Self { params, italic_for }
    }

    pub fn params(&self) -> &SimulationParams {
        &self.params
    }

    /// Simulate whatever the asset's own variant does not provide.
    pub fn needs_simulation(&self, asset: &FontAsset, bold: bool, italic: bool) -> SimulationPlan {
        SimulationPlan {
            bold: bold && !asset.variant.bold,
            italic: italic && !asset.variant.italic && self.italic_for.matches(&asset.family),
        }
    }

    fn effective_shear(&self) -> f32 {
        let factor = self.params.shear_factor;
        if factor.is_nan() {
            DEFAULT_SHEAR_FACTOR
        } else {
            factor.clamp(-1.0, 1.0)
        }
    }

    /// Horizontal room reserved on each side of text `text_height` tall.
    pub fn shear_margin(&self, text_height: u32) -> u32 {
        (text_height as f32 * self.effective_shear().abs()).ceil() as u32
            + self.params.shear_constant
    }

    /// Apply the plan: bold first, then italic on the emboldened mask.
    pub fn apply(&self, mask: GlyphMask, plan: SimulationPlan) -> GlyphMask {
        let mask = if plan.bold { self.embolden(&mask) } else { mask };
        if plan.italic {
            self.italicize(&mask)
        } else {
            mask
        }
    }

    /// Thicken strokes by compositing the mask over itself at 1px offsets.
    pub fn embolden(&self, mask: &GlyphMask) -> GlyphMask {
        let n = self.params.bold_offsets;
        let v = u32::from(self.params.bold_vertical);
        let mut out = GrayImage::new(mask.width() + n, mask.height() + v);

        for dy in 0..=v {
            for dx in 0..=n {
                for (x, y, p) in mask.coverage.enumerate_pixels() {
                    if p[0] == 0 {
                        continue;
                    }
                    let target = out.get_pixel_mut(x + dx, y + dy);
                    *target = Luma([coverage_over(target[0], p[0])]);
                }
            }
        }

        GlyphMask::new(out, mask.origin)
    }

    /// Slant the mask inside an isolated buffer with room for the shear.
    pub fn italicize(&self, mask: &GlyphMask) -> GlyphMask {
        let text_height = mask.height();
        let margin = self.shear_margin(text_height);
        let pad_top = self.params.padding / 2;
        let width = mask.width() + 2 * margin;
        let height = text_height + self.params.padding;

        let mut buffer = GrayImage::new(width, height);
        image::imageops::replace(&mut buffer, &mask.coverage, margin as i64, pad_top as i64);

        // Rows slide right in proportion to their height above the text bottom
        let pivot_y = (pad_top + text_height) as f32;
        // NaN survives the clamp and is rejected by the warp
        let forward = Affine::shear_x(self.params.shear_factor.clamp(-1.0, 1.0), pivot_y);

        let sheared = match warp_coverage(&buffer, width, height, &forward) {
            Ok(sheared) => sheared,
            Err(e) => {
                tracing::warn!(error = %e, "Italic shear rejected, using stepped slant");
                self.stepped_shear(&buffer, pivot_y)
            }
        };

        let slant = self.effective_shear() * text_height as f32;
        let origin = (
            mask.origin.0 + margin as i32 + (slant * self.params.compensation_x).round() as i32,
            mask.origin.1
                + pad_top as i32
                + (self.params.padding as f32 * self.params.compensation_y).round() as i32,
        );

        GlyphMask::new(sheared, origin)
    }

    /// Whole-pixel row shifts approximating the shear.
    fn stepped_shear(&self, buffer: &GrayImage, pivot_y: f32) -> GrayImage {
        let factor = self.effective_shear();
        let (width, height) = buffer.dimensions();
        let mut out = GrayImage::new(width, height);

        for y in 0..height {
            let shift = (factor * (pivot_y - y as f32 - 0.5)).round() as i64;
            for x in 0..width {
                let target = x as i64 + shift;
                if target >= 0 && target < width as i64 {
                    out.put_pixel(target as u32, y, *buffer.get_pixel(x, y));
                }
            }
        }

        out
    }
}

/// "Over" for coverage values: 1 - (1 - a)(1 - b).
fn coverage_over(a: u8, b: u8) -> u8 {
    let (a, b) = (a as u32, b as u32);
    (a + b - (a * b + 127) / 255) as u8
}
