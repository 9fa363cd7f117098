//! Error types for building indexes.

use alloc::string::String;

use thiserror::Error;

/// Rejected index configuration.
///
/// Operations on a built index never fail: absent keys, duplicate inserts and inverted
/// ranges are ordinary outcomes, and broken invariants panic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("minimum degree must be at least 2, got {min_degree}")]
    MinDegreeTooSmall { min_degree: usize },

    #[error("unknown index variant `{0}`")]
    UnknownVariant(String),
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn messages_name_the_offending_input() {
        assert_eq!(
            ConfigError::MinDegreeTooSmall { min_degree: 1 }.to_string(),
            "minimum degree must be at least 2, got 1"
        );
        assert_eq!(
            ConfigError::UnknownVariant("splay".to_string()).to_string(),
            "unknown index variant `splay`"
        );
    }
}
