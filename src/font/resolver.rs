//! Font resolution: family name + style flags to a concrete font asset.
//!
//! Resolution is an ordered pipeline of steps. Every step either produces a
//! result or a [`ResolveMiss`] naming why it could not; misses are traced and
//! the next step runs. The last step (the bundled font) cannot miss, so
//! [`FontResolver::get`] always returns an asset.
//!
//! Steps, in order:
//!
//! 1. normalize the requested name
//! 2. direct catalog family match
//! 3. alias table
//! 4. substring containment against catalog families
//! 5. the name as a literal font file (path, or file name known to the catalog)
//! 6. platform default font chain
//! 7. bundled font

use super::alias::{alias_candidates, FamilyPredicate};
use super::catalog::{FontAsset, FontCatalog, FontCatalogEntry, FontVariantKey};
use super::discovery::{has_font_extension, DiscoveredFont};
use super::name::normalize_family;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Shortest request that takes part in substring matching.
const MIN_FUZZY_LEN: usize = 3;

/// Which pipeline step produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolutionStep {
    /// Explicit font file supplied with the request.
    Override,
    Direct,
    Alias,
    Fuzzy,
    LiteralFile,
    PlatformDefault,
    Bundled,
}

/// Why a resolution step did not produce a result.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveMiss {
    #[error("requested family name is empty")]
    EmptyName,

    #[error("no catalog family '{0}'")]
    NoFamily(String),

    #[error("'{0}' has no alias entry")]
    NoAlias(String),

    #[error("no alias of '{0}' is installed")]
    AliasNotInstalled(String),

    #[error("no catalog family contains or is contained in '{0}'")]
    NoFuzzyMatch(String),

    #[error("'{0}' is not a font file")]
    NotAFontFile(String),

    #[error("none of the platform default fonts exist")]
    NoPlatformDefault,
}

/// A resolved asset and the step that found it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub asset: FontAsset,
    pub step: ResolutionStep,
}

/// Tunable resolver behavior.
#[derive(Debug, Clone)]
pub struct ResolverPolicy {
    /// Font files tried in order when nothing in the catalog matches.
    pub default_chain: Vec<PathBuf>,
    /// Families whose italic requests always use an upright asset.
    pub italic_simulation_only: FamilyPredicate,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            default_chain: platform_default_chain(),
            italic_simulation_only: FamilyPredicate::italic_simulation_only(),
        }
    }
}

/// Common system fonts, first existing wins.
pub fn platform_default_chain() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let windir = std::env::var("WINDIR").unwrap_or_else(|_| r"C:\Windows".to_string());
        let fonts = PathBuf::from(windir).join("Fonts");
        ["arial.ttf", "msyh.ttc", "calibri.ttf", "tahoma.ttf", "segoeui.ttf"]
            .iter()
            .map(|f| fonts.join(f))
            .collect()
    }

    #[cfg(target_os = "macos")]
    {
        [
            "/System/Library/Fonts/Helvetica.ttc",
            "/System/Library/Fonts/Supplemental/Arial.ttf",
            "/Library/Fonts/Arial.ttf",
            "/System/Library/Fonts/PingFang.ttc",
        ]
        .iter()
        .map(PathBuf::from)
        .collect()
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        [
            "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
            "/usr/share/fonts/TTF/DejaVuSans.ttf",
            "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
            "/usr/share/fonts/liberation-sans/LiberationSans-Regular.ttf",
            "/usr/share/fonts/noto/NotoSans-Regular.ttf",
            "/usr/share/fonts/TTF/arial.ttf",
        ]
        .iter()
        .map(PathBuf::from)
        .collect()
    }
}

/// Resolves family requests against a catalog. Never fails.
#[derive(Debug, Clone)]
pub struct FontResolver<'c> {
    catalog: &'c FontCatalog,
    policy: ResolverPolicy,
}

impl<'c> FontResolver<'c> {
    pub fn new(catalog: &'c FontCatalog, policy: ResolverPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &'c FontCatalog {
        self.catalog
    }

    pub fn policy(&self) -> &ResolverPolicy {
        &self.policy
    }

    /// Resolve `family` with the requested style to a font asset.
    pub fn get(&self, family: &str, bold: bool, italic: bool) -> FontAsset {
        self.resolve(family, bold, italic).asset
    }

    /// Like [`get`](Self::get), but reports which step matched.
    pub fn resolve(&self, family: &str, bold: bool, italic: bool) -> Resolution {
        let requested = FontVariantKey::new(bold, italic);
        let key = normalize_family(family);

        let family_match = self
            .direct_match(&key)
            .map(|e| (ResolutionStep::Direct, e))
            .or_else(|miss| {
                trace_miss(ResolutionStep::Direct, &miss);
                self.alias_match(family).map(|e| (ResolutionStep::Alias, e))
            })
            .or_else(|miss| {
                trace_miss(ResolutionStep::Alias, &miss);
                self.fuzzy_match(&key).map(|e| (ResolutionStep::Fuzzy, e))
            });

        let asset_match = match family_match {
            Ok((step, entry)) => Ok((step, self.select_variant(entry, requested))),
            Err(miss) => {
                trace_miss(ResolutionStep::Fuzzy, &miss);
                self.literal_file(family)
                    .map(|a| (ResolutionStep::LiteralFile, a))
                    .or_else(|miss| {
                        trace_miss(ResolutionStep::LiteralFile, &miss);
                        self.platform_default().map(|a| (ResolutionStep::PlatformDefault, a))
                    })
            }
        };

        let (step, asset) = asset_match.unwrap_or_else(|miss| {
            trace_miss(ResolutionStep::PlatformDefault, &miss);
            (ResolutionStep::Bundled, FontAsset::bundled())
        });

        tracing::debug!(
            family = %family,
            requested = %requested,
            step = ?step,
            font = %asset.reference,
            variant = %asset.variant,
            "Resolved font"
        );

        Resolution { asset, step }
    }

    /// Resolve with an explicit font file taking precedence over the catalog.
    /// An override that is not a readable font file falls back to `family`.
    pub fn resolve_with_override(
        &self,
        font_path: Option<&Path>,
        family: &str,
        bold: bool,
        italic: bool,
    ) -> Resolution {
        if let Some(path) = font_path {
            match literal_path(path) {
                Ok(asset) => {
                    return Resolution {
                        asset,
                        step: ResolutionStep::Override,
                    }
                }
                Err(miss) => {
                    tracing::warn!(path = %path.display(), reason = %miss, "Ignoring font path override");
                }
            }
        }

        self.resolve(family, bold, italic)
    }

    fn direct_match(&self, key: &str) -> Result<&'c FontCatalogEntry, ResolveMiss> {
        if key.is_empty() {
            return Err(ResolveMiss::EmptyName);
        }
        self.catalog
            .family_by_key(key)
            .ok_or_else(|| ResolveMiss::NoFamily(key.to_string()))
    }

    fn alias_match(&self, family: &str) -> Result<&'c FontCatalogEntry, ResolveMiss> {
        let candidates = alias_candidates(family);
        if candidates.is_empty() {
            return Err(ResolveMiss::NoAlias(family.to_string()));
        }

        candidates
            .iter()
            .find_map(|alias| self.catalog.family(alias))
            .ok_or_else(|| ResolveMiss::AliasNotInstalled(family.to_string()))
    }

    /// Closest family by containment; ties go to the family with more
    /// variants, then to key order.
    fn fuzzy_match(&self, key: &str) -> Result<&'c FontCatalogEntry, ResolveMiss> {
        let miss = || ResolveMiss::NoFuzzyMatch(key.to_string());
        if key.chars().count() < MIN_FUZZY_LEN {
            return Err(miss());
        }

        self.catalog
            .entries()
            .filter(|e| {
                e.family.chars().count() >= MIN_FUZZY_LEN
                    && (e.family.contains(key) || key.contains(e.family.as_str()))
            })
            .min_by_key(|e| {
                (
                    e.family.len().abs_diff(key.len()),
                    usize::MAX - e.variants.len(),
                    e.family.clone(),
                )
            })
            .ok_or_else(miss)
    }

    fn literal_file(&self, family: &str) -> Result<FontAsset, ResolveMiss> {
        literal_path(Path::new(family.trim())).or_else(|miss| {
            self.catalog
                .file(family)
                .cloned()
                .ok_or(miss)
        })
    }

    fn platform_default(&self) -> Result<FontAsset, ResolveMiss> {
        self.policy
            .default_chain
            .iter()
            .find_map(|p| literal_path(p).ok())
            .ok_or(ResolveMiss::NoPlatformDefault)
    }

    /// Pick the family member for the requested style.
    ///
    /// Fallbacks only ever drop a requested flag, never add one: the style
    /// simulator can add missing weight or slant but cannot remove it.
    fn select_variant(&self, entry: &FontCatalogEntry, requested: FontVariantKey) -> FontAsset {
        let italic = requested.italic && !self.policy.italic_simulation_only.matches(&entry.family);

        let preference = [
            FontVariantKey::new(requested.bold, italic),
            FontVariantKey::new(requested.bold, false),
            FontVariantKey::new(false, italic),
        ];

        preference
            .iter()
            .find_map(|k| entry.variant(*k))
            .unwrap_or(&entry.base)
            .clone()
    }
}

/// An existing file with a font extension, as an asset.
fn literal_path(path: &Path) -> Result<FontAsset, ResolveMiss> {
    if !(has_font_extension(path) && path.is_file()) {
        return Err(ResolveMiss::NotAFontFile(path.display().to_string()));
    }

    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    Ok(FontAsset::from_discovered(&DiscoveredFont::new(name, path)))
}

fn trace_miss(step: ResolutionStep, miss: &ResolveMiss) {
    tracing::trace!(step = ?step, reason = %miss, "Resolution step missed");
}
