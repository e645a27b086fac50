use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use textmark::config::WatermarkConfig;
use textmark::render_file;
use textmark::watermark::{parse_hex_color, Anchor, Watermarker};

/// Textmark - draw styled text watermarks onto images
#[derive(Parser, Debug)]
#[command(name = "textmark")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML, or JSON with a .json extension)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Image to watermark
    #[arg(required_unless_present = "list_fonts")]
    input: Option<PathBuf>,

    /// Where to write the result; the format follows the extension
    #[arg(required_unless_present = "list_fonts")]
    output: Option<PathBuf>,

    /// Watermark text
    #[arg(short, long)]
    text: Option<String>,

    /// Font family or font file name
    #[arg(short, long)]
    font: Option<String>,

    /// Explicit font file, tried before the family
    #[arg(long)]
    font_path: Option<PathBuf>,

    /// Font size in pixels
    #[arg(short, long)]
    size: Option<f32>,

    /// Text color (#RGB, #RRGGBB or #RRGGBBAA)
    #[arg(long)]
    color: Option<String>,

    /// Opacity from 0.0 to 1.0
    #[arg(long)]
    opacity: Option<f32>,

    #[arg(long)]
    bold: bool,

    #[arg(long)]
    italic: bool,

    /// Anchor such as bottom-right, center or custom
    #[arg(short, long)]
    position: Option<String>,

    /// Horizontal and vertical margin in pixels
    #[arg(long)]
    margin: Option<u32>,

    /// Left edge for custom placement
    #[arg(long, allow_hyphen_values = true)]
    x: Option<i32>,

    /// Top edge for custom placement
    #[arg(long, allow_hyphen_values = true)]
    y: Option<i32>,

    /// Counter-clockwise rotation in degrees
    #[arg(short, long, allow_hyphen_values = true)]
    rotation: Option<f32>,

    /// Print the installed font families and exit
    #[arg(long)]
    list_fonts: bool,
}

fn parse_anchor(name: &str) -> anyhow::Result<Anchor> {
    serde_json::from_value(serde_json::Value::String(name.to_string()))
        .with_context(|| format!("Unknown position '{}'", name))
}

fn apply_overrides(config: &mut WatermarkConfig, args: &Args) -> anyhow::Result<()> {
    let text = &mut config.text;
    if let Some(value) = &args.text {
        text.text = value.clone();
    }
    if let Some(value) = &args.font {
        text.font_family = value.clone();
    }
    if let Some(value) = &args.font_path {
        text.font_path = Some(value.clone());
    }
    if let Some(value) = args.size {
        text.font_size = value;
    }
    if let Some(value) = &args.color {
        parse_hex_color(value)?;
        text.color = value.clone();
    }
    if let Some(value) = args.opacity {
        text.opacity = value;
    }
    text.bold |= args.bold;
    text.italic |= args.italic;

    let placement = &mut config.placement;
    if let Some(value) = &args.position {
        placement.position = parse_anchor(value)?;
    }
    if let Some(value) = args.margin {
        placement.margin_h = value;
        placement.margin_v = value;
    }
    if args.x.is_some() || args.y.is_some() {
        placement.position = Anchor::Custom;
        placement.x = args.x.or(placement.x);
        placement.y = args.y.or(placement.y);
    }
    if let Some(value) = args.rotation {
        placement.rotation = value;
    }

    Ok(())
}

fn run(args: Args) -> anyhow::Result<()> {
    let mut config = match &args.config {
        Some(path) => WatermarkConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => WatermarkConfig::default(),
    };

    textmark::logging::init_subscriber(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    apply_overrides(&mut config, &args)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid settings: {}", e))?;

    let lazy_catalog = config.font_catalog();
    let catalog = lazy_catalog.get();

    if args.list_fonts {
        for family in catalog.families() {
            println!("{}", family);
        }
        return Ok(());
    }

    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        bail!("Both an input and an output image are required");
    };

    let style = config.to_style_spec()?;
    let placement = config.to_placement_spec();
    let watermarker = Watermarker::new(catalog, config.to_resolver_policy(), config.to_simulator());

    render_file(input, output, &style, &placement, &watermarker)
        .with_context(|| format!("Failed to watermark {}", input.display()))?;

    tracing::info!(
        input = %input.display(),
        output = %output.display(),
        text = %style.text,
        "Watermark written"
    );

    Ok(())
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
