//! yamlrewrite - format-preserving, path-addressed rewrites of YAML documents.
//!
//! A YAML stream is parsed into an immutable, lossless tree
//! ([`document::node::Documents`]). Recipes such as [`recipe::ChangeValue`]
//! walk the tree with a [`document::cursor::Cursor`], ask a compiled
//! [`yamlpath::YamlPathMatcher`] whether the current position is selected,
//! and rebuild only the nodes above a change. Everything else is shared with
//! the input tree, and printing reproduces untouched regions byte for byte.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use yamlrewrite::document::parser::parse_yaml;
//! use yamlrewrite::document::printer::print_yaml;
//! use yamlrewrite::recipe::{ChangeValue, Recipe};
//!
//! let documents = Arc::new(parse_yaml("subjects:\n  kind: Service # keep\n").unwrap());
//! let recipe = ChangeValue::new("subjects/kind", "Deployment").unwrap();
//! let changed = recipe.run(&documents);
//! assert_eq!(print_yaml(&changed), "subjects:\n  kind: Deployment # keep\n");
//! ```

pub mod config;
pub mod document;
pub mod file;
pub mod recipe;
pub mod yamlpath;
