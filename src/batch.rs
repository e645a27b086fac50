//! Batch rendering across many canvases.
//!
//! Canvases are rendered in parallel on the rayon pool, one render call per
//! canvas. A failed render is reported in its slot and never stops the rest
//! of the batch.

use crate::watermark::{PlacementSpec, WatermarkError, WatermarkStyleSpec, Watermarker};
use image::DynamicImage;
use rayon::prelude::*;
use std::path::Path;

/// Per-image results in input order.
pub type BatchResults = Vec<Result<DynamicImage, WatermarkError>>;

/// Counts of a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub rendered: usize,
    pub failed: usize,
}

impl BatchSummary {
    pub fn of(results: &[Result<DynamicImage, WatermarkError>]) -> Self {
        let failed = results.iter().filter(|r| r.is_err()).count();
        Self {
            rendered: results.len() - failed,
            failed,
        }
    }
}

/// Watermark every image in `images` with the same style and placement.
pub fn render_batch(
    images: &[DynamicImage],
    style: &WatermarkStyleSpec,
    placement: &PlacementSpec,
    watermarker: &Watermarker<'_>,
) -> BatchResults {
    let results: BatchResults = images
        .par_iter()
        .map(|image| watermarker.render(image, style, placement))
        .collect();

    let summary = BatchSummary::of(&results);
    if summary.failed > 0 {
        tracing::warn!(
            rendered = summary.rendered,
            failed = summary.failed,
            "Batch finished with failures"
        );
    } else {
        tracing::debug!(rendered = summary.rendered, "Batch finished");
    }

    results
}

/// Read `input`, watermark it, and write the result to `output`.
///
/// The output format follows the extension of `output`.
pub fn render_file(
    input: &Path,
    output: &Path,
    style: &WatermarkStyleSpec,
    placement: &PlacementSpec,
    watermarker: &Watermarker<'_>,
) -> Result<(), WatermarkError> {
    let canvas = image::open(input)?;
    let result = watermarker.render(&canvas, style, placement)?;
    result.save(output)?;
    Ok(())
}
