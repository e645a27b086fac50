//! Watermark compositor for blending layers onto images.
//!
//! Compositing is copy-on-write: the input canvas is never touched, and the
//! result keeps the canvas size and color type. Only pixels under the
//! intersection of the layer and the canvas can change, so layers hanging
//! off any edge are clipped silently.
//!
//! # Example
//!
//! ```ignore
//! use textmark::watermark::compositor::Compositor;
//! use textmark::watermark::position::PlacementPosition;
//!
//! let result = Compositor::apply(&canvas, &layer, PlacementPosition::new(-20, 10));
//! assert_eq!(result.dimensions(), canvas.dimensions());
//! ```

use super::position::{is_visible, ImageDimensions, PlacementPosition, WatermarkDimensions};
use image::{DynamicImage, GenericImage, GenericImageView, Rgba, RgbaImage};

/// Alpha-blends watermark layers onto canvases.
#[derive(Debug, Clone, Copy, Default)]
pub struct Compositor;

impl Compositor {
    /// Blend `layer` onto a copy of `canvas` with its top-left at `position`.
    pub fn apply(canvas: &DynamicImage, layer: &RgbaImage, position: PlacementPosition) -> DynamicImage {
        let mut result = canvas.clone();
        blend_layer(&mut result, layer, position);
        result
    }

    /// Same as [`apply`](Self::apply) for an RGBA canvas.
    pub fn apply_rgba(canvas: &RgbaImage, layer: &RgbaImage, position: PlacementPosition) -> RgbaImage {
        let mut result = canvas.clone();
        blend_layer(&mut result, layer, position);
        result
    }
}

/// Blend a layer in place onto any writable image, clipped to its bounds.
fn blend_layer<I>(target: &mut I, layer: &RgbaImage, position: PlacementPosition)
where
    I: GenericImage<Pixel = Rgba<u8>>,
{
    let (target_width, target_height) = target.dimensions();
    let image_dims = ImageDimensions {
        width: target_width,
        height: target_height,
    };
    if !is_visible(&position, &image_dims, &WatermarkDimensions::from(layer)) {
        return;
    }

    // Calculate the visible region (clamp to target bounds)
    let (px, py) = (i64::from(position.x), i64::from(position.y));
    let x_start = px.max(0);
    let y_start = py.max(0);
    let x_end = (px + i64::from(layer.width())).min(i64::from(target_width));
    let y_end = (py + i64::from(layer.height())).min(i64::from(target_height));

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let wx = (tx - px) as u32;
            let wy = (ty - py) as u32;

            let wm_pixel = *layer.get_pixel(wx, wy);
            if wm_pixel[3] == 0 {
                continue;
            }

            let target_pixel = target.get_pixel(tx as u32, ty as u32);
            target.put_pixel(tx as u32, ty as u32, blend_pixels(target_pixel, wm_pixel));
        }
    }
}

/// Blend two pixels using the Porter-Duff "over" operator.
///
/// Layer opacity is already part of the foreground alpha.
pub(crate) fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
