// End-to-end render scenarios: build, place, composite

use super::fixtures::*;
use image::{DynamicImage, GenericImageView, Rgba, RgbaImage};
use textmark::font::{bundled_font, ResolutionStep};
use textmark::watermark::{
    measure_text, Anchor, Color, ImageDimensions, PlacementEngine, PlacementPosition,
    PlacementSpec, WatermarkStyleSpec,
};

const BACKGROUND: Rgba<u8> = Rgba([20, 40, 60, 255]);

fn canvas(width: u32, height: u32) -> DynamicImage {
    DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, BACKGROUND))
}

fn opaque_red(text: &str) -> WatermarkStyleSpec {
    WatermarkStyleSpec {
        color: Color::new(255, 0, 0),
        opacity: 1.0,
        ..WatermarkStyleSpec::new(text)
    }
}

#[test]
fn test_plain_request_uses_base_asset_without_simulation() {
    let dir = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);

    let style = WatermarkStyleSpec {
        family: "Arial".to_string(),
        size: 24.0,
        ..WatermarkStyleSpec::new("2024-03-15")
    };
    let layer = watermarker.build_layer(&style).unwrap();

    assert_eq!(layer.resolution_step, ResolutionStep::Direct);
    assert!(!layer.font.variant.bold && !layer.font.variant.italic);
    assert!(!layer.simulation.is_active());

    let (w, h) = measure_text(bundled_font(), "2024-03-15", 24.0).size();
    assert!(layer.width() >= w && layer.width() <= w + 4);
    assert!(layer.height() >= h && layer.height() <= h + 4);
}

#[test]
fn test_missing_italic_is_simulated_with_shear_margin() {
    let dir = font_dir(&["Upright.ttf"]);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);

    let style = WatermarkStyleSpec {
        family: "Upright".to_string(),
        italic: true,
        ..WatermarkStyleSpec::new("Italic please")
    };
    let layer = watermarker.build_layer(&style).unwrap();
    assert!(layer.simulation.italic);

    let margin = watermarker.builder().simulator().shear_margin(layer.text_size.1);
    assert!(layer.width() >= layer.text_size.0 + margin);
}

#[test]
fn test_bottom_right_anchor_position() {
    let layer = RgbaImage::new(120, 40);
    let image = ImageDimensions {
        width: 800,
        height: 600,
    };
    let (placed, position) = PlacementEngine::new()
        .place(&image, &layer, &PlacementSpec::anchored(Anchor::BottomRight, 10, 10))
        .unwrap();

    assert_eq!(position, PlacementPosition::new(670, 550));
    assert_eq!(placed.dimensions(), (120, 40));
}

#[test]
fn test_rotation_expands_bounding_box() {
    let layer = RgbaImage::from_pixel(100, 30, Rgba([255, 255, 255, 255]));
    let image = ImageDimensions {
        width: 800,
        height: 600,
    };
    let spec = PlacementSpec::anchored(Anchor::Center, 0, 0).with_rotation(45.0);
    let (rotated, position) = PlacementEngine::new().place(&image, &layer, &spec).unwrap();

    let (w, h) = rotated.dimensions();
    assert!(h > 30, "height grows under rotation");
    assert!(w * h > 100 * 30, "box area grows under rotation");
    // Center placement uses the rotated box
    assert_eq!(
        position,
        PlacementPosition::new((800 - w as i32) / 2, (600 - h as i32) / 2)
    );
}

#[test]
fn test_custom_negative_x_draws_clipped_portion() {
    let dir = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);

    let style = opaque_red("Clipped on the left");
    let layer = watermarker.build_layer(&style).unwrap();
    let input = canvas(300, 100);

    let result = watermarker
        .render(&input, &style, &PlacementSpec::custom(-20, 10))
        .unwrap()
        .to_rgba8();

    assert_eq!(result.dimensions(), (300, 100));
    let visible_right = layer.width() - 20;
    for (x, y, p) in result.enumerate_pixels() {
        let under_layer = x < visible_right && y >= 10 && y < 10 + layer.height();
        if !under_layer {
            assert_eq!(*p, BACKGROUND, "pixel ({}, {}) outside the layer", x, y);
        }
    }
    assert!(result.pixels().any(|p| *p != BACKGROUND));
}

#[test]
fn test_layer_fully_outside_leaves_canvas_untouched() {
    let dir = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);
    let input = canvas(200, 100);

    let result = watermarker
        .render(&input, &opaque_red("Gone"), &PlacementSpec::custom(5000, 5000))
        .unwrap();
    assert_eq!(result, input);
}

#[test]
fn test_custom_position_near_integer_limits_is_clipped() {
    let dir = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);
    let input = canvas(200, 100);

    for (x, y) in [(i32::MAX - 5, 0), (0, i32::MAX), (i32::MIN, i32::MIN)] {
        let result = watermarker
            .render(&input, &opaque_red("Far away"), &PlacementSpec::custom(x, y))
            .unwrap();
        assert_eq!(result, input, "custom ({}, {})", x, y);
    }
}

#[test]
fn test_every_grid_anchor_keeps_layer_inside() {
    let dir = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);
    let layer = watermarker.build_layer(&opaque_red("Grid")).unwrap();

    for anchor in Anchor::GRID {
        let spec = PlacementSpec::anchored(anchor, 10, 10);
        let placed = watermarker
            .place(ImageDimensions { width: 640, height: 480 }, &layer, &spec)
            .unwrap();
        let p = placed.position;
        assert!(p.x >= 0 && p.y >= 0, "{:?} at {:?}", anchor, p);
        assert!(p.x as u32 + layer.width() <= 640, "{:?}", anchor);
        assert!(p.y as u32 + layer.height() <= 480, "{:?}", anchor);
    }
}

#[test]
fn test_render_does_not_modify_input() {
    let dir = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);

    let input = canvas(320, 200);
    let snapshot = input.clone();
    let output = watermarker
        .render(&input, &opaque_red("Copy"), &PlacementSpec::default())
        .unwrap();

    assert_eq!(input, snapshot);
    assert_ne!(output, input);
}

#[test]
fn test_render_is_deterministic() {
    let dir = font_dir(&["Upright.ttf"]);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);

    let style = WatermarkStyleSpec {
        family: "Upright".to_string(),
        bold: true,
        italic: true,
        ..opaque_red("Deterministic")
    };
    let placement = PlacementSpec::anchored(Anchor::Center, 0, 0).with_rotation(-20.0);
    let input = canvas(400, 300);

    let first = watermarker.render(&input, &style, &placement).unwrap();
    let second = watermarker.render(&input, &style, &placement).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_bundled_font_renders_without_any_installed_fonts() {
    let dir = font_dir(&[]);
    let catalog = catalog_of(dir.path());
    let watermarker = watermarker(&catalog);

    let style = WatermarkStyleSpec {
        family: "Definitely Not Installed".to_string(),
        bold: true,
        italic: true,
        ..opaque_red("Fallback")
    };
    let layer = watermarker.build_layer(&style).unwrap();
    assert_eq!(layer.resolution_step, ResolutionStep::Bundled);
    assert!(layer.simulation.bold && layer.simulation.italic);
    assert!(layer.has_content());
}
