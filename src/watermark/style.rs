//! Watermark style: text, font request, colors and decorations.
//!
//! # Example
//!
//! ```ignore
//! use textmark::watermark::{parse_hex_color, WatermarkStyleSpec};
//!
//! let style = WatermarkStyleSpec {
//!     text: "2024-03-15".to_string(),
//!     family: "Arial".to_string(),
//!     color: parse_hex_color("#FFFFFF80").unwrap(),
//!     ..WatermarkStyleSpec::default()
//! };
//! ```

use super::WatermarkError;
use image::Rgba;
use std::path::PathBuf;

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    pub const fn black() -> Self {
        Self::new(0, 0, 0)
    }

    /// Pixel value with `opacity` folded into the alpha channel.
    pub fn to_rgba(self, opacity: f32) -> Rgba<u8> {
        let alpha = (self.a as f32 * opacity.clamp(0.0, 1.0)).round() as u8;
        Rgba([self.r, self.g, self.b, alpha])
    }
}

fn hex_digits(hex: &str, from: usize, len: usize) -> Result<u8, WatermarkError> {
    let digits = hex
        .get(from..from + len)
        .ok_or_else(|| WatermarkError::InvalidRequest("Invalid hex digit".to_string()))?;
    let value = u8::from_str_radix(digits, 16)
        .map_err(|_| WatermarkError::InvalidRequest("Invalid hex digit".to_string()))?;
    // Short form doubles each digit: 0xF -> 0xFF
    Ok(if len == 1 { value * 17 } else { value })
}

/// Parse a color: `#RGB`, `#RRGGBB`, `#RRGGBBAA`, or `white`/`black`.
///
/// ```ignore
/// assert_eq!(parse_hex_color("#F00").unwrap(), Color::new(255, 0, 0));
/// assert_eq!(parse_hex_color("#00000080").unwrap().a, 128);
/// ```
pub fn parse_hex_color(hex: &str) -> Result<Color, WatermarkError> {
    let hex = hex.trim();
    if hex.eq_ignore_ascii_case("white") {
        return Ok(Color::white());
    }
    if hex.eq_ignore_ascii_case("black") {
        return Ok(Color::black());
    }

    let hex = hex.strip_prefix('#').ok_or_else(|| {
        WatermarkError::InvalidRequest("Color must start with '#'".to_string())
    })?;

    if !hex.is_ascii() {
        return Err(WatermarkError::InvalidRequest("Invalid hex digit".to_string()));
    }

    match hex.len() {
        3 => Ok(Color::new(
            hex_digits(hex, 0, 1)?,
            hex_digits(hex, 1, 1)?,
            hex_digits(hex, 2, 1)?,
        )),
        6 | 8 => {
            let color = Color::new(
                hex_digits(hex, 0, 2)?,
                hex_digits(hex, 2, 2)?,
                hex_digits(hex, 4, 2)?,
            );
            if hex.len() == 8 {
                Ok(color.with_alpha(hex_digits(hex, 6, 2)?))
            } else {
                Ok(color)
            }
        }
        _ => Err(WatermarkError::InvalidRequest(format!(
            "Color must be #RGB, #RRGGBB or #RRGGBBAA format, got {} characters",
            hex.len()
        ))),
    }
}

/// Drop shadow painted under the text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowSpec {
    pub offset_x: i32,
    pub offset_y: i32,
    pub color: Color,
}

impl ShadowSpec {
    /// Largest absolute offset component.
    pub fn magnitude(&self) -> u32 {
        self.offset_x.unsigned_abs().max(self.offset_y.unsigned_abs())
    }
}

impl Default for ShadowSpec {
    fn default() -> Self {
        Self {
            offset_x: 2,
            offset_y: 2,
            color: Color::black().with_alpha(128),
        }
    }
}

/// Outline painted around the glyphs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSpec {
    pub width: u32,
    pub color: Color,
}

impl Default for StrokeSpec {
    fn default() -> Self {
        Self {
            width: 1,
            color: Color::black(),
        }
    }
}

/// Largest stroke width accepted, in pixels.
pub const MAX_STROKE_WIDTH: u32 = 64;

/// Largest shadow offset accepted on either axis, in pixels.
pub const MAX_SHADOW_OFFSET: u32 = 256;

/// Largest font size accepted, in pixels.
pub const MAX_FONT_SIZE: f32 = 2048.0;

/// Everything needed to build one watermark layer.
#[derive(Debug, Clone, PartialEq)]
pub struct WatermarkStyleSpec {
    pub text: String,
    /// Requested family name (or a font file name).
    pub family: String,
    /// Explicit font file; wins over `family` when it exists.
    pub font_path: Option<PathBuf>,
    /// Font size in pixels.
    pub size: f32,
    pub color: Color,
    /// Multiplied into every painted alpha, 0.0 to 1.0.
    pub opacity: f32,
    pub bold: bool,
    pub italic: bool,
    pub shadow: Option<ShadowSpec>,
    pub stroke: Option<StrokeSpec>,
}

impl Default for WatermarkStyleSpec {
    fn default() -> Self {
        Self {
            text: String::new(),
            family: "Arial".to_string(),
            font_path: None,
            size: 24.0,
            color: Color::white(),
            opacity: 0.5,
            bold: false,
            italic: false,
            shadow: None,
            stroke: None,
        }
    }
}

impl WatermarkStyleSpec {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Reject requests that cannot produce a layer.
    pub fn validate(&self) -> Result<(), WatermarkError> {
        if !self.text.chars().any(is_printable) {
            return Err(WatermarkError::InvalidRequest(
                "Cannot render empty text".to_string(),
            ));
        }

        if !self.size.is_finite() || self.size <= 0.0 {
            return Err(WatermarkError::InvalidRequest(format!(
                "Font size must be a positive number, got {}",
                self.size
            )));
        }

        if self.size > MAX_FONT_SIZE {
            return Err(WatermarkError::InvalidRequest(format!(
                "Font size must be at most {}, got {}",
                MAX_FONT_SIZE, self.size
            )));
        }

        if self.stroke_width() > MAX_STROKE_WIDTH {
            return Err(WatermarkError::InvalidRequest(format!(
                "Stroke width must be at most {}, got {}",
                MAX_STROKE_WIDTH,
                self.stroke_width()
            )));
        }

        if self.shadow_magnitude() > MAX_SHADOW_OFFSET {
            return Err(WatermarkError::InvalidRequest(format!(
                "Shadow offset must be within {} pixels, got {}",
                MAX_SHADOW_OFFSET,
                self.shadow_magnitude()
            )));
        }

        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(WatermarkError::InvalidRequest(format!(
                "Opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            )));
        }

        Ok(())
    }

    /// Stroke width in pixels, 0 without a stroke.
    pub fn stroke_width(&self) -> u32 {
        self.stroke.map(|s| s.width).unwrap_or(0)
    }

    /// Shadow offset magnitude in pixels, 0 without a shadow.
    pub fn shadow_magnitude(&self) -> u32 {
        self.shadow.map(|s| s.magnitude()).unwrap_or(0)
    }
}

/// A character that leaves ink: not whitespace, control or a zero-width format mark.
fn is_printable(c: char) -> bool {
    !c.is_whitespace()
        && !c.is_control()
        && !matches!(c, '\u{200B}'..='\u{200F}' | '\u{2060}'..='\u{2064}' | '\u{FEFF}' | '\u{00AD}')
}
