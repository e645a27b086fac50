//! Font discovery and resolution.
//!
//! - [`catalog`]: build-once inventory of installed fonts grouped by family
//! - [`discovery`]: platform sources that enumerate font files
//! - [`name`]: display-name parsing and family normalization
//! - [`alias`]: fixed alias table and family predicates
//! - [`resolver`]: ordered fallback pipeline from a request to an asset
//! - [`reference`]: font file/handle references and the loaded-font cache

pub mod alias;
pub mod catalog;
pub mod discovery;
pub mod name;
pub mod reference;
pub mod resolver;

pub use alias::{alias_candidates, FamilyPredicate, DEFAULT_ITALIC_SIMULATION_ONLY};
pub use catalog::{FontAsset, FontCatalog, FontCatalogEntry, FontVariantKey, LazyCatalog};
pub use discovery::{
    platform_font_dirs, platform_sources, DirectorySource, DiscoveredFont, FontDiscoverySource,
};
pub use name::{normalize_family, parse_display_name, ParsedFontName};
pub use reference::{bundled_font, bundled_font_data, FontReference, BUNDLED_FAMILY};
pub use resolver::{
    platform_default_chain, FontResolver, Resolution, ResolutionStep, ResolveMiss, ResolverPolicy,
};

#[cfg(target_os = "windows")]
pub use discovery::DirectWriteSource;
