//! Text watermark rendering.
//!
//! The pipeline for one render call:
//!
//! 1. [`layer::WatermarkLayerBuilder`] resolves the font, rasterizes the
//!    text, simulates missing bold/italic styles and paints shadow, stroke
//!    and fill into a transparent layer.
//! 2. [`position::PlacementEngine`] rotates the layer if requested and
//!    computes its top-left corner on the canvas.
//! 3. [`compositor::Compositor`] alpha-blends the layer onto a copy of the
//!    canvas.
//!
//! [`Watermarker`] runs all three in one call.
//!
//! # Example
//!
//! ```ignore
//! use textmark::watermark::{Anchor, PlacementSpec, Watermarker, WatermarkStyleSpec};
//!
//! let style = WatermarkStyleSpec {
//!     italic: true,
//!     ..WatermarkStyleSpec::new("Confidential")
//! };
//! let placement = PlacementSpec::anchored(Anchor::Center, 0, 0).with_rotation(30.0);
//! let output = Watermarker::with_defaults().render(&image, &style, &placement)?;
//! ```

pub mod compositor;
pub mod error;
pub mod layer;
pub mod position;
pub mod processor;
pub mod simulator;
pub mod style;
pub mod text_renderer;
pub mod transform;

pub use compositor::Compositor;
pub use error::WatermarkError;
pub use layer::{WatermarkLayer, WatermarkLayerBuilder};
pub use position::{
    clamp_to_bounds, compute_position, is_visible, Anchor, ImageDimensions, PlacementEngine,
    PlacementPosition, PlacementSpec, WatermarkDimensions,
};
pub use processor::{PlacedLayer, Watermarker};
pub use simulator::{SimulationParams, SimulationPlan, StyleSimulator};
pub use style::{
    parse_hex_color, Color, ShadowSpec, StrokeSpec, WatermarkStyleSpec, MAX_FONT_SIZE,
    MAX_SHADOW_OFFSET, MAX_STROKE_WIDTH,
};
pub use text_renderer::{measure_text, rasterize_run, GlyphMask, TextMetrics};
pub use transform::{rotate_image, rotated_size, Affine};
