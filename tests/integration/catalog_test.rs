// Catalog construction and sharing across threads

use super::fixtures::*;
use std::sync::Arc;
use textmark::font::{DirectorySource, FontCatalog, FontDiscoverySource, FontVariantKey, LazyCatalog};
use textmark::watermark::{PlacementSpec, WatermarkStyleSpec};

#[test]
fn test_catalog_groups_variants_by_family() {
    let dir = font_dir(&[
        "Arial.ttf",
        "Arial-Bold.ttf",
        "Arial-Italic.ttf",
        "Arial-BoldItalic.ttf",
        "DejaVuSans.ttf",
        "DejaVuSans-Bold.ttf",
    ]);
    let catalog = catalog_of(dir.path());

    assert_eq!(catalog.len(), 2);
    assert_eq!(catalog.families(), vec!["Arial".to_string(), "DejaVuSans".to_string()]);

    let arial = catalog.family("ARIAL").unwrap();
    for key in FontVariantKey::ALL {
        assert!(arial.has_variant(key), "missing {}", key);
    }
    assert_eq!(arial.base.variant, FontVariantKey::REGULAR);

    let dejavu = catalog.family("dejavu sans").unwrap();
    assert!(dejavu.has_variant(FontVariantKey::BOLD));
    assert!(!dejavu.has_variant(FontVariantKey::ITALIC));
}

#[test]
fn test_missing_source_is_skipped() {
    let dir = font_dir(&ARIAL_FILES);
    let sources: Vec<Box<dyn FontDiscoverySource>> = vec![
        Box::new(DirectorySource::new(dir.path().join("does-not-exist"))),
        Box::new(DirectorySource::new(dir.path())),
    ];

    let catalog = FontCatalog::discover(&sources);
    assert_eq!(catalog.len(), 1);
    assert!(catalog.family("Arial").is_some());
}

#[test]
fn test_lazy_catalog_builds_once_under_concurrency() {
    let dir = font_dir(&ARIAL_FILES);
    let lazy = Arc::new(LazyCatalog::new(directory_sources(dir.path())));
    assert!(!lazy.is_built());

    let addresses: Vec<usize> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let lazy = Arc::clone(&lazy);
                scope.spawn(move || lazy.get() as *const FontCatalog as usize)
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(lazy.is_built());
    assert_eq!(lazy.build_count(), 1);
    assert!(addresses.windows(2).all(|w| w[0] == w[1]));
    assert_eq!(lazy.get().len(), 1);
}

#[test]
fn test_concurrent_renders_share_one_catalog() {
    let dir = font_dir(&["Upright.ttf"]);
    let lazy = LazyCatalog::new(directory_sources(dir.path()));
    let watermarker = watermarker(lazy.get());

    let outputs: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = ["one", "two", "three", "four"]
            .iter()
            .map(|text| {
                let watermarker = &watermarker;
                scope.spawn(move || {
                    let style = WatermarkStyleSpec {
                        family: "Upright".to_string(),
                        italic: true,
                        ..WatermarkStyleSpec::new(*text)
                    };
                    let canvas = image::DynamicImage::new_rgb8(160, 90);
                    watermarker.render(&canvas, &style, &PlacementSpec::default())
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(outputs.iter().all(|r| r.is_ok()));
    assert_eq!(lazy.build_count(), 1);
}
