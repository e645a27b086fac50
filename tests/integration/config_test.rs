// Settings file to rendered image

use super::fixtures::*;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage};
use textmark::config::WatermarkConfig;
use textmark::font::{LazyCatalog, ResolutionStep};
use textmark::render_batch;
use textmark::watermark::{Anchor, Watermarker};

fn write_config(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_yaml_config_renders_end_to_end() {
    let fonts = font_dir(&["Upright.ttf"]);
    let work = tempfile::tempdir().unwrap();
    let yaml = format!(
        r##"
text:
  text: "Proof"
  font_family: "Upright"
  font_size: 40
  color: "#00FF00"
  opacity: 1.0
  italic: true
  stroke:
    width: 1
    color: "#000000"
placement:
  position: top-left
  margin_h: 5
  margin_v: 5
fonts:
  extra_dirs: ['{}']
  default_chain: []
"##,
        fonts.path().display()
    );
    let path = write_config(work.path(), "watermark.yaml", &yaml);
    let config = WatermarkConfig::from_file(&path).unwrap();

    let lazy = LazyCatalog::new(config.extra_font_sources());
    let watermarker = Watermarker::new(lazy.get(), config.to_resolver_policy(), config.to_simulator());
    let style = config.to_style_spec().unwrap();
    let placement = config.to_placement_spec();
    assert_eq!(placement.anchor, Anchor::TopLeft);

    let layer = watermarker.build_layer(&style).unwrap();
    assert_eq!(layer.resolution_step, ResolutionStep::Direct);
    assert!(layer.simulation.italic);

    let canvas = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 120, Rgb([255, 255, 255])));
    let output = watermarker.render(&canvas, &style, &placement).unwrap().to_rgb8();

    // Nothing is drawn left of or above the margins
    for (x, y, p) in output.enumerate_pixels() {
        if x < 5 || y < 5 {
            assert_eq!(*p, Rgb([255, 255, 255]));
        }
    }
    assert!(output.pixels().any(|p| *p == Rgb([0, 255, 0])));
}

#[test]
fn test_json_config_with_simulation_disabled() {
    let fonts = font_dir(&["Upright.ttf"]);
    let work = tempfile::tempdir().unwrap();
    let json = format!(
        r#"{{
  "text": {{"text": "Upright only", "font_family": "Upright", "italic": true}},
  "fonts": {{"extra_dirs": [{:?}], "default_chain": [], "simulate_italic": "none"}}
}}"#,
        fonts.path().display().to_string()
    );
    let path = write_config(work.path(), "watermark.json", &json);
    let config = WatermarkConfig::from_file(&path).unwrap();

    let lazy = LazyCatalog::new(config.extra_font_sources());
    let watermarker = Watermarker::new(lazy.get(), config.to_resolver_policy(), config.to_simulator());
    let layer = watermarker.build_layer(&config.to_style_spec().unwrap()).unwrap();
    assert!(!layer.simulation.italic);
}

#[test]
fn test_batch_from_config() {
    let fonts = font_dir(&ARIAL_FILES);
    let catalog = catalog_of(fonts.path());
    let watermarker = watermarker(&catalog);

    let config = WatermarkConfig::from_yaml_with_env(
        "text:\n  text: Batch\n  bold: true\nplacement:\n  position: center\n  rotation: 15\n",
    )
    .unwrap();
    let style = config.to_style_spec().unwrap();
    let placement = config.to_placement_spec();

    let images: Vec<DynamicImage> = (0..4).map(|i| DynamicImage::new_rgba8(200 + i, 150)).collect();
    let results = render_batch(&images, &style, &placement, &watermarker);

    assert_eq!(results.len(), 4);
    for (input, result) in images.iter().zip(results) {
        let output = result.unwrap();
        assert_eq!(output.dimensions(), input.dimensions());
    }
}
