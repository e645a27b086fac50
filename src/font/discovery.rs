//! Platform font discovery: finding installed font files.
//!
//! Each [`FontDiscoverySource`] enumerates font assets from one inventory:
//! a font directory walked recursively, or (on Windows) the DirectWrite
//! system collection. Sources only report what they find; grouping into
//! families happens in the catalog.

use crate::watermark::WatermarkError;
use std::path::{Path, PathBuf};

/// File extensions treated as font files (compared case-insensitively).
pub const FONT_EXTENSIONS: &[&str] = &["ttf", "otf", "ttc", "otc"];

/// Directory nesting limit for recursive scans.
const MAX_SCAN_DEPTH: usize = 16;

/// One font asset as reported by a discovery source.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DiscoveredFont {
    /// Free-form name the source knows the font by (file stem, or
    /// `family + face` from a font service).
    pub display_name: String,
    pub path: PathBuf,
    /// Face index inside collections; 0 for single-face files.
    pub index: u32,
}

impl DiscoveredFont {
    pub fn new(display_name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            display_name: display_name.into(),
            path: path.into(),
            index: 0,
        }
    }
}

/// A source of installed fonts.
///
/// A source that cannot be read returns `Err`; the catalog logs it and moves
/// on to the next source.
pub trait FontDiscoverySource: Send + Sync {
    /// Short human-readable name used in logs.
    fn name(&self) -> String;

    fn enumerate(&self) -> Result<Vec<DiscoveredFont>, WatermarkError>;
}

/// Whether a path carries one of the [`FONT_EXTENSIONS`].
pub fn has_font_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            FONT_EXTENSIONS
                .iter()
                .any(|known| known.eq_ignore_ascii_case(ext))
        })
}

/// Recursive walk of one font directory. Fonts are named by file stem.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn walk(&self, dir: &Path, depth: usize, found: &mut Vec<DiscoveredFont>) {
        if depth > MAX_SCAN_DEPTH {
            tracing::debug!(dir = %dir.display(), "Font scan depth limit reached");
            return;
        }

        let entries = match std::fs::read_dir(dir) {
            Ok(e) => e,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Skipping unreadable font directory");
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            // file_type() does not follow symlinks, so linked directory
            // cycles are never entered
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);

            if is_dir {
                self.walk(&path, depth + 1, found);
            } else if has_font_extension(&path) && path.is_file() {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    found.push(DiscoveredFont::new(stem, path.clone()));
                }
            }
        }
    }
}

impl FontDiscoverySource for DirectorySource {
    fn name(&self) -> String {
        format!("directory {}", self.root.display())
    }

    fn enumerate(&self) -> Result<Vec<DiscoveredFont>, WatermarkError> {
        // Only the root is required to exist; unreadable subdirectories are skipped
        std::fs::read_dir(&self.root).map_err(|e| WatermarkError::Discovery {
            source_name: self.name(),
            reason: e.to_string(),
        })?;

        let mut found = Vec::new();
        self.walk(&self.root, 0, &mut found);
        Ok(found)
    }
}

/// The DirectWrite system font collection.
///
/// Faces that DirectWrite itself simulates are skipped: they share the file
/// of the real face and would claim a variant slot the family does not have.
#[cfg(target_os = "windows")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectWriteSource;

#[cfg(target_os = "windows")]
impl FontDiscoverySource for DirectWriteSource {
    fn name(&self) -> String {
        "DirectWrite system collection".to_string()
    }

    fn enumerate(&self) -> Result<Vec<DiscoveredFont>, WatermarkError> {
        let collection = dwrote::FontCollection::system();
        let mut found = Vec::new();

        for family in collection.families_iter() {
            let family_name = family.name();

            for i in 0..family.get_font_count() {
                let font = family.get_font(i);
                if !matches!(font.simulations(), dwrote::FontSimulations::None) {
                    continue;
                }

                let face = font.create_font_face();
                let Some(path) = face
                    .files()
                    .ok()
                    .and_then(|files| files.first().and_then(|f| f.font_file_path().ok()))
                else {
                    continue;
                };

                found.push(DiscoveredFont {
                    display_name: format!("{} {}", family_name, font.face_name()),
                    path,
                    index: face.get_index(),
                });
            }
        }

        if found.is_empty() {
            return Err(WatermarkError::Discovery {
                source_name: self.name(),
                reason: "collection returned no file-backed fonts".to_string(),
            });
        }

        Ok(found)
    }
}

/// Font directories scanned on this platform, most specific last.
pub fn platform_font_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    #[cfg(target_os = "windows")]
    {
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            dirs.push(PathBuf::from(local).join(r"Microsoft\Windows\Fonts"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        dirs.push(PathBuf::from("/System/Library/Fonts"));
        dirs.push(PathBuf::from("/Library/Fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(home).join("Library/Fonts"));
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        dirs.push(PathBuf::from("/usr/share/fonts"));
        dirs.push(PathBuf::from("/usr/local/share/fonts"));
        if let Ok(home) = std::env::var("HOME") {
            dirs.push(PathBuf::from(&home).join(".fonts"));
            dirs.push(PathBuf::from(home).join(".local/share/fonts"));
        }
    }

    dirs
}

/// The native discovery sources for this platform.
pub fn platform_sources() -> Vec<Box<dyn FontDiscoverySource>> {
    let mut sources: Vec<Box<dyn FontDiscoverySource>> = Vec::new();

    #[cfg(target_os = "windows")]
    sources.push(Box::new(DirectWriteSource));

    for dir in platform_font_dirs() {
        sources.push(Box::new(DirectorySource::new(dir)));
    }

    sources
}
