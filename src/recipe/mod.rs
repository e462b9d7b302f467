//! Recipes: named, configurable rewrites of YAML documents.
//!
//! A recipe is built once from validated options and can then be run against
//! any number of documents, from any thread. Running a recipe never modifies
//! its input; it returns a new tree that shares every untouched subtree with
//! the input.
//!
//! # Example
//!
//! ```
//! use yamlrewrite::recipe::RecipeConfig;
//!
//! let config: RecipeConfig = toml::from_str(
//!     "name = \"change-value\"\noldKeyPath = \"subjects/kind\"\nvalue = \"Deployment\"\n",
//! )
//! .unwrap();
//! let recipe = config.build().unwrap();
//! assert_eq!(recipe.name(), "change-value");
//! ```

pub mod change_value;
pub mod visitor;

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info_span;

use crate::document::node::Documents;
use crate::yamlpath::YamlPathError;

pub use change_value::{ChangeValue, ChangeValueOptions};
pub use visitor::YamlVisitor;

/// Errors raised while building a recipe from its options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecipeError {
    #[error("invalid path expression '{expression}': {source}")]
    InvalidPath {
        expression: String,
        #[source]
        source: YamlPathError,
    },
    #[error("invalid option '{option}': {message}")]
    InvalidOption {
        option: &'static str,
        message: String,
    },
}

/// A rewrite that can be applied to a YAML stream.
pub trait Recipe: Send + Sync {
    /// Identifier used in recipe files and on the command line.
    fn name(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Returns the rewritten stream. When nothing changes, the returned `Arc`
    /// points at `documents` itself.
    fn run(&self, documents: &Arc<Documents>) -> Arc<Documents>;
}

/// Describes one option of a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub example: &'static str,
    pub required: bool,
}

/// Describes a recipe and its options, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDescriptor {
    pub name: &'static str,
    pub display_name: &'static str,
    pub description: &'static str,
    pub options: Vec<OptionDescriptor>,
}

/// All available recipes, keyed by name, in listing order.
pub fn descriptors() -> IndexMap<&'static str, RecipeDescriptor> {
    [ChangeValue::descriptor()]
        .into_iter()
        .map(|descriptor| (descriptor.name, descriptor))
        .collect()
}

/// A recipe as written in configuration: its name plus its options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "kebab-case")]
pub enum RecipeConfig {
    ChangeValue(ChangeValueOptions),
}

impl RecipeConfig {
    /// Validates the options and builds the recipe.
    pub fn build(&self) -> Result<Box<dyn Recipe>, RecipeError> {
        match self {
            RecipeConfig::ChangeValue(options) => {
                Ok(Box::new(ChangeValue::from_options(options.clone())?))
            }
        }
    }
}

/// Runs `recipes` in order, each on the output of the previous one.
pub fn run_all(recipes: &[Box<dyn Recipe>], documents: &Arc<Documents>) -> Arc<Documents> {
    recipes.iter().fold(Arc::clone(documents), |current, recipe| {
        let _span = info_span!("recipe", name = recipe.name()).entered();
        recipe.run(&current)
    })
}
