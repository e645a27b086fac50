//! Installed-font catalog.
//!
//! The catalog groups every discovered font asset into families keyed by
//! [`normalize_family`], with up to four variants per family. It is built
//! once and never mutated afterwards, so concurrent readers need no locking.
//! [`LazyCatalog`] provides the build-once guard; [`FontCatalog::global`] is
//! the process-wide instance over the platform's discovery sources.

use super::discovery::{platform_sources, DiscoveredFont, FontDiscoverySource};
use super::name::{normalize_family, parse_display_name};
use super::reference::{FontReference, BUNDLED_FAMILY};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Bold/italic combination of a font asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FontVariantKey {
    pub bold: bool,
    pub italic: bool,
}

impl FontVariantKey {
    pub const REGULAR: Self = Self::new(false, false);
    pub const BOLD: Self = Self::new(true, false);
    pub const ITALIC: Self = Self::new(false, true);
    pub const BOLD_ITALIC: Self = Self::new(true, true);

    /// All variants, in base-selection preference order.
    pub const ALL: [Self; 4] = [Self::REGULAR, Self::BOLD, Self::ITALIC, Self::BOLD_ITALIC];

    pub const fn new(bold: bool, italic: bool) -> Self {
        Self { bold, italic }
    }
}

impl std::fmt::Display for FontVariantKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match (self.bold, self.italic) {
            (false, false) => "regular",
            (true, false) => "bold",
            (false, true) => "italic",
            (true, true) => "bold-italic",
        };
        f.write_str(name)
    }
}

/// A concrete font asset. Immutable once discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontAsset {
    pub reference: FontReference,
    /// Normalized family key.
    pub family: String,
    /// Family name as parsed from the display name.
    pub display_family: String,
    pub variant: FontVariantKey,
}

impl FontAsset {
    /// Asset for the bundled fallback font.
    pub fn bundled() -> Self {
        Self {
            reference: FontReference::bundled(),
            family: normalize_family(BUNDLED_FAMILY),
            display_family: BUNDLED_FAMILY.to_string(),
            variant: FontVariantKey::REGULAR,
        }
    }

    /// Asset for a font reported by a discovery source (or a literal file),
    /// with family and variant taken from its display name.
    pub fn from_discovered(font: &DiscoveredFont) -> Self {
        let parsed = parse_display_name(&font.display_name);
        Self {
            reference: FontReference::Path {
                path: font.path.clone(),
                index: font.index,
            },
            family: normalize_family(&parsed.family),
            display_family: parsed.family,
            variant: FontVariantKey::new(parsed.bold, parsed.italic),
        }
    }
}

/// One family: its base asset plus every variant that was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontCatalogEntry {
    pub family: String,
    pub display_family: String,
    pub base: FontAsset,
    pub variants: BTreeMap<FontVariantKey, FontAsset>,
}

impl FontCatalogEntry {
    pub fn variant(&self, key: FontVariantKey) -> Option<&FontAsset> {
        self.variants.get(&key)
    }

    pub fn has_variant(&self, key: FontVariantKey) -> bool {
        self.variants.contains_key(&key)
    }
}

struct Slot {
    asset: FontAsset,
    light: bool,
}

/// Immutable inventory of installed fonts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontCatalog {
    families: BTreeMap<String, FontCatalogEntry>,
    /// Case-folded file names and file stems.
    files: BTreeMap<String, FontAsset>,
}

impl FontCatalog {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Group discovered fonts into families.
    ///
    /// Input order does not matter: fonts are sorted by path first, so the
    /// same inventory always yields the same catalog.
    pub fn from_fonts(mut fonts: Vec<DiscoveredFont>) -> Self {
        fonts.sort_by(|a, b| (&a.path, a.index, &a.display_name).cmp(&(&b.path, b.index, &b.display_name)));
        fonts.dedup();

        let mut groups: BTreeMap<String, (String, BTreeMap<FontVariantKey, Slot>)> =
            BTreeMap::new();
        let mut files = BTreeMap::new();

        for font in &fonts {
            let parsed = parse_display_name(&font.display_name);
            let asset = FontAsset::from_discovered(font);
            if asset.family.is_empty() {
                continue;
            }

            for key in file_keys(font) {
                files.entry(key).or_insert_with(|| asset.clone());
            }

            let (_, slots) = groups
                .entry(asset.family.clone())
                .or_insert_with(|| (parsed.family.clone(), BTreeMap::new()));

            match slots.entry(asset.variant) {
                Entry::Vacant(v) => {
                    v.insert(Slot {
                        asset,
                        light: parsed.light,
                    });
                }
                // A standard-weight face displaces a light one in the same slot
                Entry::Occupied(mut o) if o.get().light && !parsed.light => {
                    o.insert(Slot {
                        asset,
                        light: false,
                    });
                }
                Entry::Occupied(_) => {}
            }
        }

        let families = groups
            .into_iter()
            .filter_map(|(family, (display_family, slots))| {
                let base = pick_base(&slots)?;
                let variants = slots.into_iter().map(|(k, s)| (k, s.asset)).collect();
                Some((
                    family.clone(),
                    FontCatalogEntry {
                        family,
                        display_family,
                        base,
                        variants,
                    },
                ))
            })
            .collect();

        Self { families, files }
    }

    /// Enumerate every source and build a catalog. Failing sources are
    /// logged and skipped; the result may be empty.
    pub fn discover(sources: &[Box<dyn FontDiscoverySource>]) -> Self {
        let mut fonts = Vec::new();

        for source in sources {
            match source.enumerate() {
                Ok(found) => {
                    tracing::debug!(source = %source.name(), count = found.len(), "Font source enumerated");
                    fonts.extend(found);
                }
                Err(e) => {
                    tracing::warn!(source = %source.name(), error = %e, "Skipping font discovery source");
                }
            }
        }

        let catalog = Self::from_fonts(fonts);
        tracing::info!(
            families = catalog.len(),
            files = catalog.files.len(),
            "Font catalog built"
        );
        catalog
    }

    /// Process-wide catalog over the platform discovery sources, built on
    /// first access.
    pub fn global() -> &'static FontCatalog {
        static GLOBAL: OnceLock<LazyCatalog> = OnceLock::new();
        GLOBAL.get_or_init(LazyCatalog::platform).get()
    }

    /// Look up a family by name (normalized before lookup).
    pub fn family(&self, name: &str) -> Option<&FontCatalogEntry> {
        self.families.get(&normalize_family(name))
    }

    /// Look up a family by an already normalized key.
    pub fn family_by_key(&self, key: &str) -> Option<&FontCatalogEntry> {
        self.families.get(key)
    }

    /// All families in key order.
    pub fn entries(&self) -> impl Iterator<Item = &FontCatalogEntry> {
        self.families.values()
    }

    /// Display names of every family, sorted.
    pub fn families(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .families
            .values()
            .map(|e| e.display_family.clone())
            .collect();
        names.sort();
        names
    }

    /// Look up an asset by file name or file stem, case-insensitively.
    pub fn file(&self, name: &str) -> Option<&FontAsset> {
        self.files.get(&name.trim().to_lowercase())
    }

    pub fn len(&self) -> usize {
        self.families.len()
    }

    pub fn is_empty(&self) -> bool {
        self.families.is_empty()
    }
}

fn file_keys(font: &DiscoveredFont) -> Vec<String> {
    [font.path.file_name(), font.path.file_stem()]
        .into_iter()
        .flatten()
        .filter_map(|s| s.to_str())
        .map(str::to_lowercase)
        .collect()
}

/// Regular if present, else the first standard-weight variant, else anything.
fn pick_base(slots: &BTreeMap<FontVariantKey, Slot>) -> Option<FontAsset> {
    slots
        .get(&FontVariantKey::REGULAR)
        .or_else(|| {
            FontVariantKey::ALL
                .iter()
                .filter_map(|k| slots.get(k))
                .find(|s| !s.light)
        })
        .or_else(|| slots.values().next())
        .map(|s| s.asset.clone())
}

/// A catalog that is built at most once, on first [`get`](Self::get).
///
/// Concurrent first callers block until the single build finishes and then
/// all observe the same catalog.
pub struct LazyCatalog {
    sources: Vec<Box<dyn FontDiscoverySource>>,
    catalog: OnceLock<FontCatalog>,
    builds: AtomicUsize,
}

impl LazyCatalog {
    pub fn new(sources: Vec<Box<dyn FontDiscoverySource>>) -> Self {
        Self {
            sources,
            catalog: OnceLock::new(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Lazy catalog over the platform's native sources.
    pub fn platform() -> Self {
        Self::new(platform_sources())
    }

    /// Lazy catalog over the platform sources plus extra sources.
    pub fn platform_with(extra: Vec<Box<dyn FontDiscoverySource>>) -> Self {
        let mut sources = platform_sources();
        sources.extend(extra);
        Self::new(sources)
    }

    pub fn get(&self) -> &FontCatalog {
        self.catalog.get_or_init(|| {
            self.builds.fetch_add(1, Ordering::SeqCst);
            FontCatalog::discover(&self.sources)
        })
    }

    pub fn is_built(&self) -> bool {
        self.catalog.get().is_some()
    }

    /// How many times discovery ran (0 or 1).
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for LazyCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazyCatalog")
            .field("sources", &self.sources.iter().map(|s| s.name()).collect::<Vec<_>>())
            .field("built", &self.is_built())
            .finish()
    }
}
