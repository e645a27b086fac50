// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::font::{
    platform_default_chain, DirectorySource, FamilyPredicate, FontDiscoverySource, LazyCatalog,
    ResolverPolicy,
};
use crate::watermark::{
    parse_hex_color, Anchor, PlacementSpec, ShadowSpec, SimulationParams, StrokeSpec,
    StyleSimulator, WatermarkError, WatermarkStyleSpec, MAX_FONT_SIZE, MAX_SHADOW_OFFSET,
    MAX_STROKE_WIDTH,
};

// Default values
fn default_font_family() -> String {
    "Arial".to_string()
}

fn default_font_size() -> f32 {
    24.0
}

fn default_color() -> String {
    "#FFFFFF".to_string()
}

fn default_shadow_color() -> String {
    "#000000".to_string()
}

fn default_opacity() -> f32 {
    0.5
}

fn default_margin() -> u32 {
    10
}

fn default_shadow_offset() -> i32 {
    2
}

fn default_stroke_width() -> u32 {
    1
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WatermarkConfig {
    #[serde(default)]
    pub text: TextConfig,
    #[serde(default)]
    pub placement: PlacementConfig,
    #[serde(default)]
    pub fonts: FontsConfig,
    #[serde(default)]
    pub simulation: SimulationParams,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Text and style of the watermark.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextConfig {
    /// Text to draw; may be left empty and supplied per call.
    #[serde(default)]
    pub text: String,

    /// Font family name or font file name (default: "Arial")
    #[serde(default = "default_font_family")]
    pub font_family: String,

    /// Explicit font file, tried before the family
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,

    /// Font size in pixels (default: 24)
    #[serde(default = "default_font_size")]
    pub font_size: f32,

    /// Text color as hex string (default: "#FFFFFF")
    #[serde(default = "default_color")]
    pub color: String,

    /// Opacity from 0.0 (transparent) to 1.0 (opaque) (default: 0.5)
    #[serde(default = "default_opacity")]
    pub opacity: f32,

    #[serde(default)]
    pub bold: bool,

    #[serde(default)]
    pub italic: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<ShadowConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<StrokeConfig>,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            text: String::new(),
            font_family: default_font_family(),
            font_path: None,
            font_size: default_font_size(),
            color: default_color(),
            opacity: default_opacity(),
            bold: false,
            italic: false,
            shadow: None,
            stroke: None,
        }
    }
}

impl TextConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.font_size.is_finite() || self.font_size <= 0.0 {
            return Err(format!(
                "font_size must be a positive number, got {}",
                self.font_size
            ));
        }

        if self.font_size > MAX_FONT_SIZE {
            return Err(format!(
                "font_size must be at most {}, got {}",
                MAX_FONT_SIZE, self.font_size
            ));
        }

        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!(
                "opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            ));
        }

        parse_hex_color(&self.color).map_err(|e| format!("color '{}': {}", self.color, e))?;

        if let Some(shadow) = &self.shadow {
            shadow.validate()?;
        }

        if let Some(stroke) = &self.stroke {
            stroke.validate()?;
        }

        Ok(())
    }
}

/// Drop shadow settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShadowConfig {
    #[serde(default = "default_shadow_offset")]
    pub offset_x: i32,
    #[serde(default = "default_shadow_offset")]
    pub offset_y: i32,
    #[serde(default = "default_shadow_color")]
    pub color: String,
    /// Multiplied into the shadow color's alpha (default: 0.5)
    #[serde(default = "default_opacity")]
    pub opacity: f32,
}

impl Default for ShadowConfig {
    fn default() -> Self {
        Self {
            offset_x: default_shadow_offset(),
            offset_y: default_shadow_offset(),
            color: default_shadow_color(),
            opacity: default_opacity(),
        }
    }
}

impl ShadowConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.offset_x.unsigned_abs() > MAX_SHADOW_OFFSET
            || self.offset_y.unsigned_abs() > MAX_SHADOW_OFFSET
        {
            return Err(format!(
                "shadow offset must be within {} pixels, got ({}, {})",
                MAX_SHADOW_OFFSET, self.offset_x, self.offset_y
            ));
        }

        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(format!(
                "shadow opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            ));
        }

        parse_hex_color(&self.color)
            .map(|_| ())
            .map_err(|e| format!("shadow color '{}': {}", self.color, e))
    }

    fn to_spec(&self) -> Result<ShadowSpec, WatermarkError> {
        let color = parse_hex_color(&self.color)?;
        let alpha = (color.a as f32 * self.opacity.clamp(0.0, 1.0)).round() as u8;
        Ok(ShadowSpec {
            offset_x: self.offset_x,
            offset_y: self.offset_y,
            color: color.with_alpha(alpha),
        })
    }
}

/// Outline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrokeConfig {
    #[serde(default = "default_stroke_width")]
    pub width: u32,
    #[serde(default = "default_shadow_color")]
    pub color: String,
}

impl Default for StrokeConfig {
    fn default() -> Self {
        Self {
            width: default_stroke_width(),
            color: default_shadow_color(),
        }
    }
}

impl StrokeConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.width > MAX_STROKE_WIDTH {
            return Err(format!(
                "stroke width must be at most {}, got {}",
                MAX_STROKE_WIDTH, self.width
            ));
        }

        parse_hex_color(&self.color)
            .map(|_| ())
            .map_err(|e| format!("stroke color '{}': {}", self.color, e))
    }

    fn to_spec(&self) -> Result<StrokeSpec, WatermarkError> {
        Ok(StrokeSpec {
            width: self.width,
            color: parse_hex_color(&self.color)?,
        })
    }
}

/// Where the watermark goes on the image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// One of the nine grid anchors or `custom` (default: bottom-right)
    #[serde(default)]
    pub position: Anchor,

    /// Horizontal margin from the edge in pixels (default: 10)
    #[serde(default = "default_margin")]
    pub margin_h: u32,

    /// Vertical margin from the edge in pixels (default: 10)
    #[serde(default = "default_margin")]
    pub margin_v: u32,

    /// Top-left corner for `custom` placement
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,

    /// Counter-clockwise rotation in degrees
    #[serde(default)]
    pub rotation: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            position: Anchor::default(),
            margin_h: default_margin(),
            margin_v: default_margin(),
            x: None,
            y: None,
            rotation: 0.0,
        }
    }
}

impl PlacementConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.rotation.is_finite() {
            return Err(format!("rotation must be finite, got {}", self.rotation));
        }

        if self.position != Anchor::Custom && (self.x.is_some() || self.y.is_some()) {
            return Err(format!(
                "x/y coordinates require position 'custom', got '{:?}'",
                self.position
            ));
        }

        Ok(())
    }
}

/// Which families get their missing italics simulated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SimulateItalic {
    Mode(SimulateItalicMode),
    Families(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulateItalicMode {
    All,
    None,
}

impl Default for SimulateItalic {
    fn default() -> Self {
        Self::Mode(SimulateItalicMode::All)
    }
}

impl SimulateItalic {
    pub fn to_predicate(&self) -> FamilyPredicate {
        match self {
            Self::Mode(SimulateItalicMode::All) => FamilyPredicate::All,
            Self::Mode(SimulateItalicMode::None) => FamilyPredicate::Nothing,
            Self::Families(names) => FamilyPredicate::families(names),
        }
    }
}

/// Font discovery and resolution settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FontsConfig {
    /// Directories scanned in addition to the platform font sources
    #[serde(default)]
    pub extra_dirs: Vec<PathBuf>,

    /// Replaces the platform default font chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_chain: Option<Vec<PathBuf>>,

    /// Replaces the built-in list of families whose italics are always
    /// simulated
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub italic_simulation_only: Option<Vec<String>>,

    #[serde(default)]
    pub simulate_italic: SimulateItalic,
}

impl FontsConfig {
    pub fn validate(&self) -> Result<(), String> {
        for dir in &self.extra_dirs {
            if dir.as_os_str().is_empty() {
                return Err("fonts.extra_dirs contains an empty path".to_string());
            }
        }
        Ok(())
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when RUST_LOG is unset (default: "info")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit one JSON object per event
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Replace `${VAR_NAME}` with environment variable values.
fn substitute_env(raw: &str) -> Result<String, String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| e.to_string())?;

    // First, check that all referenced environment variables exist
    for caps in re.captures_iter(raw) {
        let var_name = &caps[1];
        std::env::var(var_name).map_err(|_| {
            format!(
                "Environment variable '{}' is referenced but not set",
                var_name
            )
        })?;
    }

    Ok(re
        .replace_all(raw, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        })
        .into_owned())
}

impl WatermarkConfig {
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, String> {
        let substituted = substitute_env(yaml)?;
        serde_yaml::from_str(&substituted).map_err(|e| e.to_string())
    }

    pub fn from_json_with_env(json: &str) -> Result<Self, String> {
        let substituted = substitute_env(json)?;
        serde_json::from_str(&substituted).map_err(|e| e.to_string())
    }

    /// Load and validate a settings file. `.json` files are parsed as JSON,
    /// everything else as YAML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, WatermarkError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config = if is_json {
            Self::from_json_with_env(&raw)
        } else {
            Self::from_yaml_with_env(&raw)
        }
        .map_err(|e| WatermarkError::Config(format!("{}: {}", path.display(), e)))?;

        config
            .validate()
            .map_err(|e| WatermarkError::Config(format!("{}: {}", path.display(), e)))?;

        tracing::debug!(
            config_file = %path.display(),
            family = %config.text.font_family,
            position = ?config.placement.position,
            extra_font_dirs = config.fonts.extra_dirs.len(),
            "Configuration loaded"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        self.text.validate()?;
        self.placement.validate()?;
        self.fonts.validate()?;
        self.simulation
            .validate()
            .map_err(|e| format!("simulation: {}", e))?;

        if self.logging.level.trim().is_empty() {
            return Err("logging.level cannot be empty".to_string());
        }

        Ok(())
    }

    pub fn to_style_spec(&self) -> Result<WatermarkStyleSpec, WatermarkError> {
        let text = &self.text;
        Ok(WatermarkStyleSpec {
            text: text.text.clone(),
            family: text.font_family.clone(),
            font_path: text.font_path.clone(),
            size: text.font_size,
            color: parse_hex_color(&text.color)?,
            opacity: text.opacity,
            bold: text.bold,
            italic: text.italic,
            shadow: text.shadow.as_ref().map(ShadowConfig::to_spec).transpose()?,
            stroke: text.stroke.as_ref().map(StrokeConfig::to_spec).transpose()?,
        })
    }

    pub fn to_placement_spec(&self) -> PlacementSpec {
        let placement = &self.placement;
        let spec = match placement.position {
            Anchor::Custom => PlacementSpec::custom(
                placement.x.unwrap_or(0),
                placement.y.unwrap_or(0),
            ),
            anchor => PlacementSpec::anchored(anchor, placement.margin_h, placement.margin_v),
        };
        spec.with_rotation(placement.rotation)
    }

    pub fn to_resolver_policy(&self) -> ResolverPolicy {
        ResolverPolicy {
            default_chain: self
                .fonts
                .default_chain
                .clone()
                .unwrap_or_else(platform_default_chain),
            italic_simulation_only: match &self.fonts.italic_simulation_only {
                Some(names) => FamilyPredicate::families(names),
                None => FamilyPredicate::italic_simulation_only(),
            },
        }
    }

    pub fn to_simulation_params(&self) -> SimulationParams {
        self.simulation.clone()
    }

    pub fn to_simulator(&self) -> StyleSimulator {
        StyleSimulator::new(
            self.to_simulation_params(),
            self.fonts.simulate_italic.to_predicate(),
        )
    }

    /// Discovery sources for the configured extra font directories.
    pub fn extra_font_sources(&self) -> Vec<Box<dyn FontDiscoverySource>> {
        self.fonts
            .extra_dirs
            .iter()
            .map(|dir| Box::new(DirectorySource::new(dir)) as Box<dyn FontDiscoverySource>)
            .collect()
    }

    /// Lazily built catalog over the platform sources and the extra dirs.
    pub fn font_catalog(&self) -> LazyCatalog {
        LazyCatalog::platform_with(self.extra_font_sources())
    }
}
