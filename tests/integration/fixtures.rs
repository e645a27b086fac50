// Shared helpers for building deterministic font catalogs

use std::path::Path;
use tempfile::TempDir;
use textmark::font::{
    bundled_font_data, DirectorySource, FontCatalog, FontDiscoverySource, FamilyPredicate,
    ResolverPolicy,
};
use textmark::watermark::{StyleSimulator, Watermarker};

/// Complete four-style family.
pub const ARIAL_FILES: [&str; 4] = [
    "Arial.ttf",
    "Arial-Bold.ttf",
    "Arial-Italic.ttf",
    "Arial-BoldItalic.ttf",
];

/// Write the bundled font under each file name into `dir`.
pub fn write_fonts(dir: &Path, files: &[&str]) {
    for file in files {
        let path = dir.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, bundled_font_data()).unwrap();
    }
}

/// Temporary font directory holding `files`.
pub fn font_dir(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write_fonts(dir.path(), files);
    dir
}

pub fn directory_sources(dir: &Path) -> Vec<Box<dyn FontDiscoverySource>> {
    vec![Box::new(DirectorySource::new(dir))]
}

/// Catalog discovered from a single directory.
pub fn catalog_of(dir: &Path) -> FontCatalog {
    FontCatalog::discover(&directory_sources(dir))
}

/// Policy without platform default fonts, so misses end at the bundled font.
pub fn hermetic_policy() -> ResolverPolicy {
    ResolverPolicy {
        default_chain: Vec::new(),
        italic_simulation_only: FamilyPredicate::italic_simulation_only(),
    }
}

pub fn watermarker(catalog: &FontCatalog) -> Watermarker<'_> {
    Watermarker::new(catalog, hermetic_policy(), StyleSimulator::default())
}
