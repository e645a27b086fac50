//! Affine resampling shared by italic shear and layer rotation.
//!
//! Transforms are described in the forward direction (source to destination)
//! and sampled by inverse mapping with bilinear interpolation. Pixels that
//! map outside the source are transparent.

use super::WatermarkError;
use image::{GrayImage, Luma, Rgba, RgbaImage};

/// Largest destination side the warp accepts.
pub const MAX_WARP_DIMENSION: u32 = 16_384;

/// 2D affine map: `x' = a*x + b*y + c`, `y' = d*x + e*y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub e: f32,
    pub f: f32,
}

impl Affine {
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 0.0,
        e: 1.0,
        f: 0.0,
    };

    /// Horizontal shear about row `pivot_y`: rows above the pivot move by
    /// `factor` pixels per row of distance (right for positive factors).
    pub fn shear_x(factor: f32, pivot_y: f32) -> Self {
        Self {
            b: -factor,
            c: factor * pivot_y,
            ..Self::IDENTITY
        }
    }

    /// Counter-clockwise rotation by `degrees`, taking `src_center` to
    /// `dst_center`.
    pub fn rotation(degrees: f32, src_center: (f32, f32), dst_center: (f32, f32)) -> Self {
        let (sin, cos) = degrees.to_radians().sin_cos();
        let (cx, cy) = src_center;
        let (dx, dy) = dst_center;

        // Image y grows downward, so a visual counter-clockwise turn is
        // x' = x cos + y sin, y' = -x sin + y cos
        Self {
            a: cos,
            b: sin,
            c: dx - cos * cx - sin * cy,
            d: -sin,
            e: cos,
            f: dy + sin * cx - cos * cy,
        }
    }

    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.e, self.f]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn apply(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.c,
            self.d * x + self.e * y + self.f,
        )
    }

    pub fn inverse(&self) -> Option<Self> {
        let det = self.a * self.e - self.b * self.d;
        if !det.is_finite() || det.abs() < f32::EPSILON {
            return None;
        }

        let a = self.e / det;
        let b = -self.b / det;
        let d = -self.d / det;
        let e = self.a / det;
        Some(Self {
            a,
            b,
            c: -(a * self.c + b * self.f),
            d,
            e,
            f: -(d * self.c + e * self.f),
        })
    }
}

/// Bounding box size of a `width` x `height` rectangle rotated by `degrees`.
pub fn rotated_size(width: u32, height: u32, degrees: f32) -> (u32, u32) {
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (sin, cos) = (sin.abs(), cos.abs());
    let w = width as f32;
    let h = height as f32;

    // Trim float noise so exact right angles do not grow by a pixel
    let side = |v: f32| ((v - 1e-3).ceil().max(1.0)) as u32;
    (side(w * cos + h * sin), side(w * sin + h * cos))
}

/// Source taps and weights for bilinear sampling at (sx, sy).
fn bilinear_taps(sx: f32, sy: f32, width: u32, height: u32) -> [(u32, u32, f32); 4] {
    // Pixel centers sit at +0.5
    let fx = sx - 0.5;
    let fy = sy - 0.5;
    let x0 = fx.floor();
    let y0 = fy.floor();
    let tx = fx - x0;
    let ty = fy - y0;

    let mut taps = [(0, 0, 0.0); 4];
    let corners = [
        (x0, y0, (1.0 - tx) * (1.0 - ty)),
        (x0 + 1.0, y0, tx * (1.0 - ty)),
        (x0, y0 + 1.0, (1.0 - tx) * ty),
        (x0 + 1.0, y0 + 1.0, tx * ty),
    ];

    for (tap, (x, y, w)) in taps.iter_mut().zip(corners) {
        if x >= 0.0 && y >= 0.0 && x < width as f32 && y < height as f32 {
            *tap = (x as u32, y as u32, w);
        }
    }

    taps
}

fn check_warp(dst_w: u32, dst_h: u32, forward: &Affine) -> Result<Affine, WatermarkError> {
    if dst_w == 0 || dst_h == 0 || dst_w > MAX_WARP_DIMENSION || dst_h > MAX_WARP_DIMENSION {
        return Err(WatermarkError::Simulation(format!(
            "warp target {}x{} out of range",
            dst_w, dst_h
        )));
    }

    if !forward.is_finite() {
        return Err(WatermarkError::Simulation(
            "transform has non-finite coefficients".to_string(),
        ));
    }

    forward
        .inverse()
        .ok_or_else(|| WatermarkError::Simulation("transform is not invertible".to_string()))
}

/// Warp a coverage mask into a `dst_w` x `dst_h` buffer.
pub fn warp_coverage(
    src: &GrayImage,
    dst_w: u32,
    dst_h: u32,
    forward: &Affine,
) -> Result<GrayImage, WatermarkError> {
    let inverse = check_warp(dst_w, dst_h, forward)?;
    let mut out = GrayImage::new(dst_w, dst_h);

    for (dx, dy, pixel) in out.enumerate_pixels_mut() {
        let (sx, sy) = inverse.apply(dx as f32 + 0.5, dy as f32 + 0.5);
        let value: f32 = bilinear_taps(sx, sy, src.width(), src.height())
            .iter()
            .filter(|(_, _, w)| *w > 0.0)
            .map(|&(x, y, w)| src.get_pixel(x, y)[0] as f32 * w)
            .sum();
        *pixel = Luma([value.round().clamp(0.0, 255.0) as u8]);
    }

    Ok(out)
}

/// Warp an RGBA image into a `dst_w` x `dst_h` buffer.
///
/// Interpolates premultiplied color so transparent neighbors do not darken
/// antialiased edges.
pub fn warp_rgba(
    src: &RgbaImage,
    dst_w: u32,
    dst_h: u32,
    forward: &Affine,
) -> Result<RgbaImage, WatermarkError> {
    let inverse = check_warp(dst_w, dst_h, forward)?;
    let mut out = RgbaImage::new(dst_w, dst_h);

    for (dx, dy, pixel) in out.enumerate_pixels_mut() {
        let (sx, sy) = inverse.apply(dx as f32 + 0.5, dy as f32 + 0.5);
        let mut acc = [0.0f32; 4];

        for (x, y, w) in bilinear_taps(sx, sy, src.width(), src.height()) {
            if w <= 0.0 {
                continue;
            }
            let p = src.get_pixel(x, y);
            let alpha = p[3] as f32 / 255.0;
            acc[0] += p[0] as f32 * alpha * w;
            acc[1] += p[1] as f32 * alpha * w;
            acc[2] += p[2] as f32 * alpha * w;
            acc[3] += p[3] as f32 * w;
        }

        if acc[3] < 0.5 {
            continue;
        }

        let alpha = acc[3] / 255.0;
        let channel = |v: f32| (v / alpha).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgba([
            channel(acc[0]),
            channel(acc[1]),
            channel(acc[2]),
            acc[3].round().clamp(0.0, 255.0) as u8,
        ]);
    }

    Ok(out)
}

/// Rotate counter-clockwise by `degrees`, growing the canvas to the rotated
/// bounding box. New corners are transparent.
pub fn rotate_image(image: &RgbaImage, degrees: f32) -> Result<RgbaImage, WatermarkError> {
    let (dst_w, dst_h) = rotated_size(image.width(), image.height(), degrees);
    let forward = Affine::rotation(
        degrees,
        (image.width() as f32 / 2.0, image.height() as f32 / 2.0),
        (dst_w as f32 / 2.0, dst_h as f32 / 2.0),
    );
    warp_rgba(image, dst_w, dst_h, &forward)
}
