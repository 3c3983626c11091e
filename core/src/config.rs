//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! index_mode = "single_depth"
//! default_top_n = 5
//! ```

use serde::{Deserialize, Serialize};

use crate::engine::IndexMode;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Which prefix depths get an index.
    pub index_mode: IndexMode,

    /// Result count used by `Autocomplete::suggest`.
    pub default_top_n: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            index_mode: IndexMode::MultiDepth,
            default_top_n: 10,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn with_index_mode(mut self, mode: IndexMode) -> Self {
        self.index_mode = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_multi_depth() {
        let cfg = Config::default();
        assert_eq!(cfg.index_mode, IndexMode::MultiDepth);
        assert_eq!(cfg.default_top_n, 10);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let cfg = Config::from_toml_str("index_mode = \"single_depth\"").unwrap();
        assert_eq!(cfg.index_mode, IndexMode::SingleDepth);
        assert_eq!(cfg.default_top_n, 10);

        let cfg = Config::from_toml_str("").unwrap();
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn toml_string_roundtrip() {
        let cfg = Config {
            index_mode: IndexMode::SingleDepth,
            default_top_n: 3,
        };
        let text = cfg.to_toml_string().unwrap();
        assert_eq!(Config::from_toml_str(&text).unwrap(), cfg);
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(Config::from_toml_str("index_mode = \"deep\"").is_err());
    }

    #[test]
    fn load_and_save_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("autocomplete.toml");
        let cfg = Config::default().with_index_mode(IndexMode::SingleDepth);
        cfg.save_toml(&path).unwrap();
        assert_eq!(Config::load_toml(&path).unwrap(), cfg);
    }
}
