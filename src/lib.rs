// Textmark text watermarking library

pub mod batch;
pub mod config;
pub mod font;
pub mod logging;
pub mod watermark;

pub use batch::{render_batch, render_file, BatchSummary};
pub use config::WatermarkConfig;
pub use font::{FontCatalog, FontResolver, ResolverPolicy};
pub use watermark::{
    Anchor, PlacementSpec, StyleSimulator, WatermarkError, WatermarkLayerBuilder,
    WatermarkStyleSpec, Watermarker,
};
