//! Bridge configuration, loaded from `[bridge]` in `raya.toml`.

use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};

/// Tunables shared by all bridges built from one context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BridgeConfig {
    /// Sequence writes past the end append null placeholders (default: true).
    /// When false such writes fail with `IndexOutOfRange`.
    pub grow_on_write: bool,
    /// Maximum number of placeholder slots a single write may append
    /// (default: unlimited)
    pub max_growth: Option<usize>,
    /// Assigning `undefined` to a string-keyed map entry deletes it
    /// (default: true)
    pub undefined_deletes: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            grow_on_write: true,
            max_growth: None,
            undefined_deletes: true,
        }
    }
}

#[derive(Deserialize)]
struct Manifest {
    #[serde(default)]
    bridge: BridgeConfig,
}

impl BridgeConfig {
    /// Create the default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the `[bridge]` table of a `raya.toml` document.
    ///
    /// Other tables are ignored; a missing `[bridge]` table yields the
    /// defaults.
    pub fn from_toml_str(source: &str) -> BridgeResult<Self> {
        let manifest: Manifest =
            toml::from_str(source).map_err(|e| BridgeError::Config(e.to_string()))?;
        Ok(manifest.bridge)
    }

    /// Number of slots a write at `index` appends to a sequence of `len`
    /// elements (zero when `index < len`)
    pub fn growth_for(index: usize, len: usize) -> usize {
        if index < len {
            0
        } else {
            (index - len).saturating_add(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BridgeConfig::new();
        assert!(config.grow_on_write);
        assert!(config.undefined_deletes);
        assert_eq!(config.max_growth, None);
    }

    #[test]
    fn test_from_toml() {
        let src = r#"
[package]
name = "app"

[bridge]
max_growth = 64
undefined_deletes = false
"#;
        let config = BridgeConfig::from_toml_str(src).unwrap();
        assert_eq!(config.max_growth, Some(64));
        assert!(!config.undefined_deletes);
        // unspecified keys keep their defaults
        assert!(config.grow_on_write);
    }

    #[test]
    fn test_missing_table_is_default() {
        let config = BridgeConfig::from_toml_str("[package]\nname = \"x\"\n").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        let err = BridgeConfig::from_toml_str("[bridge]\ngrow = true\n").unwrap_err();
        assert!(matches!(err, BridgeError::Config(_)));
    }

    #[test]
    fn test_growth_for() {
        assert_eq!(BridgeConfig::growth_for(2, 0), 3);
        assert_eq!(BridgeConfig::growth_for(2, 3), 0);
        assert_eq!(BridgeConfig::growth_for(5, 3), 3);
        assert_eq!(BridgeConfig::growth_for(usize::MAX, 3), usize::MAX - 2);
        assert_eq!(BridgeConfig::growth_for(usize::MAX, 0), usize::MAX);
    }
}
