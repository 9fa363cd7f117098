//! Construction-time configuration.

use core::fmt;
use core::str::FromStr;

use alloc::string::ToString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::priority::DEFAULT_TREAP_SEED;
use crate::raw::DEFAULT_MIN_DEGREE;

/// Balancing strategy of an [`AnyIndex`](crate::AnyIndex).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    Avl,
    RedBlack,
    Wavl,
    Treap,
    #[serde(rename = "btree")]
    BTree,
    #[default]
    #[serde(rename = "bplus-tree")]
    BPlusTree,
}

impl Variant {
    /// Every variant, binary trees first.
    pub const ALL: [Variant; 6] = [
        Variant::Avl,
        Variant::RedBlack,
        Variant::Wavl,
        Variant::Treap,
        Variant::BTree,
        Variant::BPlusTree,
    ];

    /// Canonical lowercase name, as accepted by [`FromStr`] and written by serde.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Variant::Avl => "avl",
            Variant::RedBlack => "red-black",
            Variant::Wavl => "wavl",
            Variant::Treap => "treap",
            Variant::BTree => "btree",
            Variant::BPlusTree => "bplus-tree",
        }
    }

    /// True for the node-splitting variants, which honour
    /// [`IndexConfig::min_degree`].
    #[must_use]
    pub const fn is_multiway(self) -> bool {
        matches!(self, Variant::BTree | Variant::BPlusTree)
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ConfigError;

    /// Parses a variant name, ignoring ASCII case and treating `_` like `-`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase().replace('_', "-");
        match name.as_str() {
            "avl" => Ok(Variant::Avl),
            "red-black" | "redblack" | "rb" => Ok(Variant::RedBlack),
            "wavl" => Ok(Variant::Wavl),
            "treap" => Ok(Variant::Treap),
            "btree" | "b-tree" => Ok(Variant::BTree),
            "bplus-tree" | "bplustree" | "b+tree" | "b-plus-tree" => Ok(Variant::BPlusTree),
            _ => Err(ConfigError::UnknownVariant(s.to_string())),
        }
    }
}

/// Which index to build and how.
///
/// Fields missing from a serialized config take their default values.
///
/// # Examples
///
/// ```
/// use ordered_index::{AnyIndex, IndexConfig, OrderedIndex, Variant};
///
/// let config = IndexConfig::default().with_variant(Variant::BTree).with_min_degree(4);
/// let mut index = AnyIndex::with_config(&config)?;
/// index.insert("k", 1);
/// assert_eq!(index.variant(), Variant::BTree);
/// # Ok::<(), ordered_index::ConfigError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Balancing strategy.
    pub variant: Variant,
    /// Minimum degree `t` of the B-tree family; ignored by the binary variants.
    pub min_degree: usize,
    /// Seed for treap priorities; ignored by the other variants.
    pub treap_seed: u64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            min_degree: DEFAULT_MIN_DEGREE,
            treap_seed: DEFAULT_TREAP_SEED,
        }
    }
}

impl IndexConfig {
    #[must_use]
    pub const fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub const fn with_min_degree(mut self, min_degree: usize) -> Self {
        self.min_degree = min_degree;
        self
    }

    #[must_use]
    pub const fn with_treap_seed(mut self, treap_seed: u64) -> Self {
        self.treap_seed = treap_seed;
        self
    }

    /// Checks the settings without building anything.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MinDegreeTooSmall`] if `min_degree < 2`, whatever the variant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        checked_min_degree(self.min_degree).map(|_| ())
    }
}

pub(crate) fn checked_min_degree(min_degree: usize) -> Result<usize, ConfigError> {
    if min_degree < 2 {
        return Err(ConfigError::MinDegreeTooSmall { min_degree });
    }
    Ok(min_degree)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::format;

    #[test]
    fn test_index_config_defaults() {
        let config = IndexConfig::default();
        assert_eq!(config.variant, Variant::BPlusTree);
        assert_eq!(config.min_degree, 3);
        assert_eq!(config.treap_seed, DEFAULT_TREAP_SEED);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_index_config_custom() {
        let config = IndexConfig::default()
            .with_variant(Variant::Treap)
            .with_min_degree(8)
            .with_treap_seed(99);
        assert_eq!(config.variant, Variant::Treap);
        assert_eq!(config.min_degree, 8);
        assert_eq!(config.treap_seed, 99);
    }

    #[test]
    fn test_index_config_rejects_small_degree() {
        for min_degree in [0, 1] {
            let config = IndexConfig::default().with_min_degree(min_degree);
            assert_eq!(config.validate(), Err(ConfigError::MinDegreeTooSmall { min_degree }));
        }
    }

    #[test]
    fn test_index_config_serde_roundtrip() {
        let config = IndexConfig::default().with_variant(Variant::RedBlack).with_min_degree(5);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"red-black\""));
        let decoded: IndexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, config);
    }

    #[test]
    fn test_index_config_serde_fills_defaults() {
        let decoded: IndexConfig = serde_json::from_str(r#"{"variant":"btree"}"#).unwrap();
        assert_eq!(decoded, IndexConfig::default().with_variant(Variant::BTree));
    }

    #[test]
    fn test_variant_names_roundtrip() {
        for variant in Variant::ALL {
            assert_eq!(variant.to_string().parse::<Variant>(), Ok(variant));
            assert_eq!(serde_json::to_string(&variant).unwrap(), format!("\"{variant}\""));
        }
    }

    #[test]
    fn test_variant_parse_is_lenient() {
        assert_eq!("RED_BLACK".parse(), Ok(Variant::RedBlack));
        assert_eq!(" Bplus_Tree ".parse(), Ok(Variant::BPlusTree));
        assert_eq!("B-Tree".parse(), Ok(Variant::BTree));
        assert_eq!(
            "splay".parse::<Variant>(),
            Err(ConfigError::UnknownVariant("splay".to_string()))
        );
    }

    #[test]
    fn test_variant_families() {
        assert!(Variant::BTree.is_multiway());
        assert!(!Variant::Wavl.is_multiway());
    }
}
