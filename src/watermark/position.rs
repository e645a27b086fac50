//! Position calculation for watermark placement.
//!
//! # Anchors
//!
//! - **9-grid anchors**: `top-left` ... `bottom-right`. Edge anchors keep
//!   the horizontal/vertical margin from the edge, center anchors use
//!   integer-floor centering, and the result is clamped so the layer stays
//!   on the canvas whenever it fits.
//! - **Custom**: explicit coordinates, used verbatim. The layer may extend
//!   past the canvas; the compositor clips it.
//!
//! Rotation happens before placement, so every formula sees the rotated
//! layer size.
//!
//! # Example
//!
//! ```ignore
//! use textmark::watermark::position::{compute_position, Anchor, ImageDimensions, PlacementSpec, WatermarkDimensions};
//!
//! let canvas = ImageDimensions { width: 800, height: 600 };
//! let layer = WatermarkDimensions { width: 120, height: 40 };
//! let spec = PlacementSpec::anchored(Anchor::BottomRight, 10, 10);
//!
//! let pos = compute_position(&canvas, &layer, &spec);
//! assert_eq!((pos.x, pos.y), (670, 550));
//! ```

use super::transform::rotate_image;
use super::WatermarkError;
use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Dimensions of the target image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

/// Dimensions of the watermark to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatermarkDimensions {
    pub width: u32,
    pub height: u32,
}

impl From<&RgbaImage> for WatermarkDimensions {
    fn from(image: &RgbaImage) -> Self {
        Self {
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Top-left corner where a watermark is placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Where on the canvas the watermark goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Anchor {
    TopLeft,
    TopCenter,
    TopRight,
    #[serde(alias = "left-center", alias = "center-left")]
    MiddleLeft,
    Center,
    #[serde(alias = "right-center", alias = "center-right")]
    MiddleRight,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
    Custom,
}

impl Anchor {
    /// The nine grid anchors, row by row.
    pub const GRID: [Anchor; 9] = [
        Anchor::TopLeft,
        Anchor::TopCenter,
        Anchor::TopRight,
        Anchor::MiddleLeft,
        Anchor::Center,
        Anchor::MiddleRight,
        Anchor::BottomLeft,
        Anchor::BottomCenter,
        Anchor::BottomRight,
    ];
}

/// Placement request for one render.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementSpec {
    pub anchor: Anchor,
    pub margin_h: u32,
    pub margin_v: u32,
    /// Used by [`Anchor::Custom`] only; missing coordinates count as 0.
    pub custom_x: Option<i32>,
    pub custom_y: Option<i32>,
    /// Counter-clockwise rotation applied to the layer before placing it.
    pub rotation_degrees: f32,
}

impl Default for PlacementSpec {
    fn default() -> Self {
        Self::anchored(Anchor::BottomRight, 10, 10)
    }
}

impl PlacementSpec {
    pub fn anchored(anchor: Anchor, margin_h: u32, margin_v: u32) -> Self {
        Self {
            anchor,
            margin_h,
            margin_v,
            custom_x: None,
            custom_y: None,
            rotation_degrees: 0.0,
        }
    }

    pub fn custom(x: i32, y: i32) -> Self {
        Self {
            anchor: Anchor::Custom,
            custom_x: Some(x),
            custom_y: Some(y),
            ..Self::anchored(Anchor::Custom, 0, 0)
        }
    }

    pub fn with_rotation(self, degrees: f32) -> Self {
        Self {
            rotation_degrees: degrees,
            ..self
        }
    }

    /// Rotation in (-360, 360), or `None` when it is a whole turn.
    fn effective_rotation(&self) -> Option<f32> {
        let degrees = self.rotation_degrees % 360.0;
        (degrees != 0.0).then_some(degrees)
    }
}

/// Compute where a layer of the given (already rotated) size goes.
pub fn compute_position(
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
    spec: &PlacementSpec,
) -> PlacementPosition {
    let img_w = i64::from(image.width);
    let img_h = i64::from(image.height);
    let wm_w = i64::from(watermark.width);
    let wm_h = i64::from(watermark.height);
    let mh = i64::from(spec.margin_h);
    let mv = i64::from(spec.margin_v);

    let left = mh;
    let center_x = (img_w - wm_w).div_euclid(2);
    let right = img_w - wm_w - mh;
    let top = mv;
    let center_y = (img_h - wm_h).div_euclid(2);
    let bottom = img_h - wm_h - mv;

    let (x, y) = match spec.anchor {
        // Top row
        Anchor::TopLeft => (left, top),
        Anchor::TopCenter => (center_x, top),
        Anchor::TopRight => (right, top),

        // Middle row
        Anchor::MiddleLeft => (left, center_y),
        Anchor::Center => (center_x, center_y),
        Anchor::MiddleRight => (right, center_y),

        // Bottom row
        Anchor::BottomLeft => (left, bottom),
        Anchor::BottomCenter => (center_x, bottom),
        Anchor::BottomRight => (right, bottom),

        Anchor::Custom => {
            return PlacementPosition::new(spec.custom_x.unwrap_or(0), spec.custom_y.unwrap_or(0))
        }
    };

    clamp_to_bounds(PlacementPosition::new(saturate(x), saturate(y)), image, watermark)
}

fn saturate(value: i64) -> i32 {
    value.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Clamp a position to ensure the watermark stays within image bounds.
///
/// A watermark larger than the image is pinned to the top-left corner.
pub fn clamp_to_bounds(
    pos: PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> PlacementPosition {
    let max_x = saturate((i64::from(image.width) - i64::from(watermark.width)).max(0));
    let max_y = saturate((i64::from(image.height) - i64::from(watermark.height)).max(0));

    PlacementPosition::new(pos.x.clamp(0, max_x), pos.y.clamp(0, max_y))
}

/// Check if a position is at least partially visible within the image.
pub fn is_visible(
    pos: &PlacementPosition,
    image: &ImageDimensions,
    watermark: &WatermarkDimensions,
) -> bool {
    let (x, y) = (i64::from(pos.x), i64::from(pos.y));
    let wm_right = x + i64::from(watermark.width);
    let wm_bottom = y + i64::from(watermark.height);

    x < i64::from(image.width) && y < i64::from(image.height) && wm_right > 0 && wm_bottom > 0
}

/// Rotates layers and computes their canvas position.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlacementEngine;

impl PlacementEngine {
    pub fn new() -> Self {
        Self
    }

    /// Rotate `layer` if requested, then position the (rotated) layer.
    pub fn place<'a>(
        &self,
        image: &ImageDimensions,
        layer: &'a RgbaImage,
        spec: &PlacementSpec,
    ) -> Result<(Cow<'a, RgbaImage>, PlacementPosition), WatermarkError> {
        if !spec.rotation_degrees.is_finite() {
            return Err(WatermarkError::InvalidRequest(format!(
                "Rotation must be a finite number of degrees, got {}",
                spec.rotation_degrees
            )));
        }

        let layer = match spec.effective_rotation() {
            Some(degrees) => Cow::Owned(rotate_image(layer, degrees)?),
            None => Cow::Borrowed(layer),
        };

        let dims = WatermarkDimensions::from(layer.as_ref());
        let position = compute_position(image, &dims, spec);
        tracing::trace!(
            anchor = ?spec.anchor,
            x = position.x,
            y = position.y,
            width = dims.width,
            height = dims.height,
            "Placed watermark layer"
        );

        Ok((layer, position))
    }
}
