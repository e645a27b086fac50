// Font resolution against catalogs discovered from temporary directories

use super::fixtures::*;
use rstest::rstest;
use textmark::font::{FontResolver, FontVariantKey, ResolutionStep};
use textmark::watermark::WatermarkStyleSpec;

fn file_name(asset: &textmark::font::FontAsset) -> String {
    asset
        .reference
        .file_path()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[rstest]
#[case(false, false, "Arial.ttf")]
#[case(true, false, "Arial-Bold.ttf")]
#[case(false, true, "Arial-Italic.ttf")]
#[case(true, true, "Arial-BoldItalic.ttf")]
fn test_direct_match_picks_true_variant(
    #[case] bold: bool,
    #[case] italic: bool,
    #[case] expected: &str,
) {
    let dir = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(dir.path());
    let resolver = FontResolver::new(&catalog, hermetic_policy());

    let resolution = resolver.resolve("arial", bold, italic);
    assert_eq!(resolution.step, ResolutionStep::Direct);
    assert_eq!(resolution.asset.variant, FontVariantKey::new(bold, italic));
    assert_eq!(file_name(&resolution.asset), expected);
}

#[test]
fn test_alias_maps_to_installed_equivalent() {
    let dir = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(dir.path());
    let resolver = FontResolver::new(&catalog, hermetic_policy());

    let resolution = resolver.resolve("Helvetica", true, false);
    assert_eq!(resolution.step, ResolutionStep::Alias);
    assert_eq!(resolution.asset.display_family, "Arial");
    assert!(resolution.asset.variant.bold);
}

#[test]
fn test_fuzzy_match_by_substring() {
    let dir = font_dir(&["NotoSans-Regular.ttf", "NotoSans-Bold.ttf"]);
    let catalog = catalog_of(dir.path());
    let resolver = FontResolver::new(&catalog, hermetic_policy());

    let resolution = resolver.resolve("Noto Sans CJK", false, false);
    assert_eq!(resolution.step, ResolutionStep::Fuzzy);
    assert_eq!(resolution.asset.family, "notosans");
}

#[test]
fn test_literal_file_path() {
    let installed = font_dir(&ARIAL_FILES);
    let loose = font_dir(&["Handwriting.ttf"]);
    let catalog = catalog_of(installed.path());
    let resolver = FontResolver::new(&catalog, hermetic_policy());

    let path = loose.path().join("Handwriting.ttf");
    let resolution = resolver.resolve(path.to_str().unwrap(), false, false);
    assert_eq!(resolution.step, ResolutionStep::LiteralFile);
    assert_eq!(resolution.asset.reference.file_path(), Some(path.as_path()));
}

#[test]
fn test_unknown_family_ends_at_bundled_font() {
    let dir = font_dir(&[]);
    let catalog = catalog_of(dir.path());
    assert!(catalog.is_empty());

    let resolver = FontResolver::new(&catalog, hermetic_policy());
    let resolution = resolver.resolve("Nonexistent Family", true, true);
    assert_eq!(resolution.step, ResolutionStep::Bundled);
    assert!(resolution.asset.reference.is_bundled());
}

#[test]
fn test_platform_default_chain_used_before_bundled() {
    let fallback = font_dir(&["Fallback.ttf"]);
    let catalog = catalog_of(font_dir(&[]).path());
    let mut policy = hermetic_policy();
    policy.default_chain = vec![
        fallback.path().join("Missing.ttf"),
        fallback.path().join("Fallback.ttf"),
    ];

    let resolution = FontResolver::new(&catalog, policy).resolve("Nope", false, false);
    assert_eq!(resolution.step, ResolutionStep::PlatformDefault);
    assert_eq!(file_name(&resolution.asset), "Fallback.ttf");
}

#[test]
fn test_missing_italic_keeps_bold() {
    let dir = font_dir(&["Upright.ttf", "Upright-Bold.ttf"]);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);

    let style = WatermarkStyleSpec {
        family: "Upright".to_string(),
        bold: true,
        italic: true,
        ..WatermarkStyleSpec::new("Half true")
    };
    let layer = watermarker.build_layer(&style).unwrap();
    assert_eq!(file_name(&layer.font), "Upright-Bold.ttf");
    assert!(!layer.simulation.bold);
    assert!(layer.simulation.italic);
}

#[test]
fn test_italic_simulation_only_family_ignores_italic_file() {
    let dir = font_dir(&["MicrosoftYaHei.ttf", "MicrosoftYaHei-Italic.ttf"]);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);

    let style = WatermarkStyleSpec {
        family: "Microsoft YaHei".to_string(),
        italic: true,
        ..WatermarkStyleSpec::new("Slant")
    };
    let layer = watermarker.build_layer(&style).unwrap();
    assert_eq!(file_name(&layer.font), "MicrosoftYaHei.ttf");
    assert!(layer.simulation.italic);
}

#[test]
fn test_light_face_does_not_displace_regular() {
    let dir = font_dir(&["Arial-Light.ttf", "Arial.ttf"]);
    let catalog = catalog_of(dir.path());
    let resolver = FontResolver::new(&catalog, hermetic_policy());

    let asset = resolver.get("Arial", false, false);
    assert_eq!(file_name(&asset), "Arial.ttf");
}

#[test]
fn test_nested_directories_are_scanned() {
    let dir = font_dir(&["a/b/c/Deep.otf", "Top.ttf", "notes.txt"]);
    let catalog = catalog_of(dir.path());

    assert!(catalog.family("Deep").is_some());
    assert!(catalog.family("Top").is_some());
    assert_eq!(catalog.len(), 2);
}
