//! High-level watermarking API.
//!
//! [`Watermarker`] ties the pipeline together: build the text layer, place
//! it on the canvas, composite. Every call is independent; the only shared
//! state is the immutable font catalog and the loaded-font cache.
//!
//! # Example
//!
//! ```ignore
//! use textmark::watermark::{Watermarker, WatermarkStyleSpec, PlacementSpec};
//!
//! let watermarker = Watermarker::with_defaults();
//! let style = WatermarkStyleSpec::new("2024-03-15");
//! let result = watermarker.render(&image, &style, &PlacementSpec::default())?;
//! ```

use super::compositor::Compositor;
use super::layer::{WatermarkLayer, WatermarkLayerBuilder};
use super::position::{ImageDimensions, PlacementEngine, PlacementPosition, PlacementSpec};
use super::simulator::StyleSimulator;
use super::style::WatermarkStyleSpec;
use super::WatermarkError;
use crate::font::{FontCatalog, FontResolver, ResolverPolicy};
use image::{DynamicImage, GenericImageView, RgbaImage};
use std::borrow::Cow;

/// Outcome of placing a layer: the layer as drawn and where it went.
#[derive(Debug, Clone)]
pub struct PlacedLayer<'a> {
    pub pixels: Cow<'a, RgbaImage>,
    pub position: PlacementPosition,
}

/// Renders text watermarks onto images.
#[derive(Debug, Clone)]
pub struct Watermarker<'c> {
    builder: WatermarkLayerBuilder<'c>,
    placement: PlacementEngine,
}

impl<'c> Watermarker<'c> {
    pub fn new(catalog: &'c FontCatalog, policy: ResolverPolicy, simulator: StyleSimulator) -> Self {
        Self {
            builder: WatermarkLayerBuilder::new(FontResolver::new(catalog, policy), simulator),
            placement: PlacementEngine::new(),
        }
    }

    pub fn catalog(&self) -> &'c FontCatalog {
        self.builder.resolver().catalog()
    }

    pub fn builder(&self) -> &WatermarkLayerBuilder<'c> {
        &self.builder
    }

    /// Build the text layer without placing it.
    pub fn build_layer(&self, style: &WatermarkStyleSpec) -> Result<WatermarkLayer, WatermarkError> {
        self.builder.build(style)
    }

    /// Rotate and position a finished layer for a canvas of `canvas` size.
    pub fn place<'a>(
        &self,
        canvas: ImageDimensions,
        layer: &'a WatermarkLayer,
        placement: &PlacementSpec,
    ) -> Result<PlacedLayer<'a>, WatermarkError> {
        let (pixels, position) = self.placement.place(&canvas, &layer.pixels, placement)?;
        Ok(PlacedLayer { pixels, position })
    }

    /// Watermark a copy of `canvas`. The input is never modified and the
    /// result has the same size and color type.
    pub fn render(
        &self,
        canvas: &DynamicImage,
        style: &WatermarkStyleSpec,
        placement: &PlacementSpec,
    ) -> Result<DynamicImage, WatermarkError> {
        let layer = self.build_layer(style)?;
        let (width, height) = canvas.dimensions();
        let placed = self.place(ImageDimensions { width, height }, &layer, placement)?;

        tracing::debug!(
            text = %style.text,
            font = %layer.font.reference,
            x = placed.position.x,
            y = placed.position.y,
            "Rendering watermark"
        );

        Ok(Compositor::apply(canvas, &placed.pixels, placed.position))
    }
}

impl Watermarker<'static> {
    /// Watermarker over the process-wide catalog with default settings.
    pub fn with_defaults() -> Self {
        Self::new(
            FontCatalog::global(),
            ResolverPolicy::default(),
            StyleSimulator::default(),
        )
    }
}
