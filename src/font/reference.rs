//! Font references and loaded font handles.
//!
//! A [`FontReference`] is either a path on disk or an already loaded font.
//! Callers only ever ask for a handle via [`FontReference::resolve_to_handle`].
//! Parsed font files are kept in a process-wide cache keyed by
//! `(path, face index)`, so repeated renders never re-read font data.

use crate::watermark::WatermarkError;
use ab_glyph::{FontArc, FontVec};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Embedded generic fallback font (DejaVu Sans, see LICENSE-DejaVu.txt).
const BUNDLED_FONT_DATA: &[u8] = include_bytes!("fonts/DejaVuSans.ttf");

/// Family name reported for the bundled font.
pub const BUNDLED_FAMILY: &str = "DejaVu Sans";

static BUNDLED_FONT: OnceLock<FontArc> = OnceLock::new();

type CacheKey = (PathBuf, u32);

static LOADED_FONTS: OnceLock<RwLock<HashMap<CacheKey, FontArc>>> = OnceLock::new();

fn loaded_fonts() -> &'static RwLock<HashMap<CacheKey, FontArc>> {
    LOADED_FONTS.get_or_init(|| RwLock::new(HashMap::new()))
}

/// The bundled fallback font. Always available.
pub fn bundled_font() -> &'static FontArc {
    BUNDLED_FONT.get_or_init(|| {
        FontArc::try_from_slice(BUNDLED_FONT_DATA)
            .expect("Failed to load embedded font - this is a bug")
    })
}

/// Raw bytes of the bundled fallback font.
pub fn bundled_font_data() -> &'static [u8] {
    BUNDLED_FONT_DATA
}

/// Load a font file (or one face of a collection), going through the cache.
pub fn load_font_file(path: &Path, index: u32) -> Result<FontArc, WatermarkError> {
    let key = (path.to_path_buf(), index);

    if let Some(font) = loaded_fonts().read().get(&key) {
        return Ok(font.clone());
    }

    let data = std::fs::read(path).map_err(|e| WatermarkError::FontLoad {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let font = FontVec::try_from_vec_and_index(data, index).map_err(|e| {
        WatermarkError::FontLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }
    })?;

    let font = FontArc::new(font);
    tracing::debug!(path = %path.display(), index, "Loaded font file");

    // Another thread may have raced us here; keep whichever landed first.
    Ok(loaded_fonts().write().entry(key).or_insert(font).clone())
}

/// Number of font faces currently held by the loaded-font cache.
pub fn cached_font_count() -> usize {
    loaded_fonts().read().len()
}

/// Where a font's data comes from.
#[derive(Clone)]
pub enum FontReference {
    /// A font file on disk; `index` selects the face inside `.ttc` collections.
    Path { path: PathBuf, index: u32 },
    /// A font that is already parsed (the bundled font, or caller supplied).
    Loaded { label: String, font: FontArc },
}

impl FontReference {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path {
            path: path.into(),
            index: 0,
        }
    }

    /// Reference to the bundled fallback font.
    pub fn bundled() -> Self {
        Self::Loaded {
            label: BUNDLED_FAMILY.to_string(),
            font: bundled_font().clone(),
        }
    }

    /// Produce a renderable font handle.
    pub fn resolve_to_handle(&self) -> Result<FontArc, WatermarkError> {
        match self {
            Self::Path { path, index } => load_font_file(path, *index),
            Self::Loaded { font, .. } => Ok(font.clone()),
        }
    }

    /// File path, when the reference points at one.
    pub fn file_path(&self) -> Option<&Path> {
        match self {
            Self::Path { path, .. } => Some(path),
            Self::Loaded { .. } => None,
        }
    }

    pub fn is_bundled(&self) -> bool {
        matches!(self, Self::Loaded { label, .. } if label == BUNDLED_FAMILY)
    }
}

impl PartialEq for FontReference {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Path { path: a, index: i }, Self::Path { path: b, index: j }) => {
                a == b && i == j
            }
            (Self::Loaded { label: a, .. }, Self::Loaded { label: b, .. }) => a == b,
            _ => false,
        }
    }
}

impl Eq for FontReference {}

impl fmt::Debug for FontReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { path, index } => f
                .debug_struct("Path")
                .field("path", path)
                .field("index", index)
                .finish(),
            Self::Loaded { label, .. } => f.debug_struct("Loaded").field("label", label).finish(),
        }
    }
}

impl fmt::Display for FontReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path { path, index: 0 } => write!(f, "{}", path.display()),
            Self::Path { path, index } => write!(f, "{}#{}", path.display(), index),
            Self::Loaded { label, .. } => write!(f, "<{}>", label),
        }
    }
}
