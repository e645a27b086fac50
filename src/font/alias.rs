//! Family alias table and family predicates.
//!
//! The alias table is a fixed list of groups of names that refer to the same
//! (or a metric-compatible) family: localized names, legacy short names and
//! cross-platform substitutes. A request for any member tries the other
//! members in order.

use super::name::normalize_family;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Groups of interchangeable family names. Within a group, earlier names
/// are preferred.
const FAMILY_ALIASES: &[&[&str]] = &[
    // CJK families by their Chinese and legacy names
    &["Microsoft YaHei", "微软雅黑", "Microsoft YaHei UI", "msyh"],
    &["SimSun", "宋体", "NSimSun", "新宋体", "STSong", "华文宋体"],
    &["SimHei", "黑体", "STHeiti", "Heiti SC", "华文黑体"],
    &["FangSong", "仿宋", "FangSong_GB2312", "STFangsong", "华文仿宋"],
    &["KaiTi", "楷体", "KaiTi_GB2312", "STKaiti", "华文楷体"],
    &["DengXian", "等线"],
    &["PingFang SC", "苹方"],
    &["Noto Sans CJK SC", "Source Han Sans SC", "思源黑体", "Noto Sans SC"],
    // Latin metric-compatible substitutes
    &["Arial", "Helvetica", "Liberation Sans", "Arimo", "Nimbus Sans"],
    &["Times New Roman", "Times", "Liberation Serif", "Tinos", "Nimbus Roman"],
    &["Courier New", "Courier", "Liberation Mono", "Cousine", "Nimbus Mono PS"],
    &["Calibri", "Carlito"],
    &["Cambria", "Caladea"],
];

/// Families whose installed assets never contain a true italic. Italic
/// requests for these always go to the upright face and get simulated.
pub const DEFAULT_ITALIC_SIMULATION_ONLY: &[&str] = &[
    "Microsoft YaHei",
    "微软雅黑",
    "Microsoft YaHei UI",
    "SimSun",
    "宋体",
    "NSimSun",
    "SimHei",
    "黑体",
    "FangSong",
    "仿宋",
    "KaiTi",
    "楷体",
    "DengXian",
    "等线",
];

/// Alternative names for `name`, in preference order, excluding `name`
/// itself. Empty when the name is not in the table.
pub fn alias_candidates(name: &str) -> Vec<&'static str> {
    let key = normalize_family(name);
    if key.is_empty() {
        return Vec::new();
    }

    FAMILY_ALIASES
        .iter()
        .filter(|group| group.iter().any(|member| normalize_family(member) == key))
        .flat_map(|group| group.iter().copied())
        .filter(|member| normalize_family(member) != key)
        .collect()
}

/// A configurable yes/no test over family names.
#[derive(Clone, Default)]
pub enum FamilyPredicate {
    /// Every family matches.
    #[default]
    All,
    /// No family matches.
    Nothing,
    /// Only the listed families match (stored normalized).
    Families(BTreeSet<String>),
    /// Caller-supplied test over normalized family keys.
    Custom(Arc<dyn Fn(&str) -> bool + Send + Sync>),
}

impl FamilyPredicate {
    pub fn families<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::Families(
            names
                .into_iter()
                .map(|n| normalize_family(n.as_ref()))
                .filter(|n| !n.is_empty())
                .collect(),
        )
    }

    pub fn custom(f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Default list of italic-simulation-only families.
    pub fn italic_simulation_only() -> Self {
        Self::families(DEFAULT_ITALIC_SIMULATION_ONLY)
    }

    pub fn matches(&self, family: &str) -> bool {
        let key = normalize_family(family);
        match self {
            Self::All => true,
            Self::Nothing => false,
            Self::Families(set) => set.contains(&key),
            Self::Custom(f) => f(&key),
        }
    }
}

impl fmt::Debug for FamilyPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("All"),
            Self::Nothing => f.write_str("Nothing"),
            Self::Families(set) => f.debug_tuple("Families").field(set).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
