//! Configuration system for yamlrewrite.
//!
//! This module provides the application settings, loaded from
//! `~/.config/yamlrewrite/config.toml`, and the recipe files that list the
//! rewrites to run.
//!
//! # Example
//!
//! ```
//! use yamlrewrite::config::{Config, RecipeFile};
//!
//! // Use default configuration
//! let config = Config::default();
//! assert!(!config.create_backup);
//! assert_eq!(config.log_level, "warn");
//!
//! let recipes: RecipeFile = r#"
//! [[recipe]]
//! name = "change-value"
//! oldKeyPath = "subjects/kind"
//! value = "Deployment"
//! "#
//! .parse()
//! .unwrap();
//! assert_eq!(recipes.recipes.len(), 1);
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::recipe::{Recipe, RecipeConfig, RecipeError};

/// Settings for the yamlrewrite application.
///
/// # Fields
///
/// * `create_backup` - Create .bak files before overwriting (default: false)
/// * `validate_input` - Check input with a strict YAML parser before rewriting (default: true)
/// * `validate_output` - Check rewritten output still parses before saving (default: true)
/// * `log_level` - Default log filter when `RUST_LOG` is unset (default: "warn")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Create .bak files before overwriting
    #[serde(default)]
    pub create_backup: bool,

    /// Check input with a strict YAML parser before rewriting
    #[serde(default = "default_validate")]
    pub validate_input: bool,

    /// Check rewritten output still parses before saving
    #[serde(default = "default_validate")]
    pub validate_output: bool,

    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_validate() -> bool {
    true
}

/// Returns the default log filter.
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            create_backup: false,
            validate_input: default_validate(),
            validate_output: default_validate(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Returns the path to the config file.
    ///
    /// Uses `~/.config/yamlrewrite/config.toml` on all platforms.
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|mut path| {
            path.push(".config");
            path.push("yamlrewrite");
            path.push("config.toml");
            path
        })
    }

    /// Loads configuration from the default config file.
    ///
    /// Returns the default configuration if the file doesn't exist or can't be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    /// Loads configuration from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|err| {
                tracing::warn!(path = %path.display(), error = %err, "ignoring invalid config file");
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }

    /// Saves configuration to the default config file.
    pub fn save(&self) -> Result<()> {
        let config_path =
            Self::config_path().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
        self.save_to(&config_path)
    }

    /// Saves configuration to `path`, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;

        Ok(())
    }
}

/// An ordered list of recipes, as stored in a TOML recipe file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeFile {
    #[serde(rename = "recipe", default)]
    pub recipes: Vec<RecipeConfig>,
}

impl RecipeFile {
    /// Reads and parses a recipe file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read recipe file: {}", path.display()))?;
        contents
            .parse()
            .with_context(|| format!("Failed to parse recipe file: {}", path.display()))
    }

    /// Builds every recipe, failing on the first invalid one.
    pub fn build(&self) -> Result<Vec<Box<dyn Recipe>>, RecipeError> {
        self.recipes.iter().map(RecipeConfig::build).collect()
    }
}

impl FromStr for RecipeFile {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        toml::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_enabled_by_default() {
        let config = Config::default();
        assert!(config.validate_input);
        assert!(config.validate_output);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config: Config = toml::from_str("create_backup = true\n").unwrap();
        assert!(config.create_backup);
        assert!(config.validate_output);
        assert_eq!(config.log_level, "warn");
    }

    #[test]
    fn test_recipe_file_keeps_order() {
        let file: RecipeFile = r#"
[[recipe]]
name = "change-value"
oldKeyPath = "a"
value = "1"

[[recipe]]
name = "change-value"
oldKeyPath = "b"
value = "2"
"#
        .parse()
        .unwrap();

        let recipes = file.build().unwrap();
        assert_eq!(recipes.len(), 2);
        assert!(recipes.iter().all(|r| r.name() == "change-value"));
    }

    #[test]
    fn test_recipe_file_rejects_unknown_recipe() {
        let result = "[[recipe]]\nname = \"delete-key\"\n".parse::<RecipeFile>();
        assert!(result.is_err());
    }
}
