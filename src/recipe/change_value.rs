//! Replacing the value of selected mapping entries.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::visitor::{self, walk_mapping_entry, YamlVisitor};
use super::{OptionDescriptor, Recipe, RecipeDescriptor, RecipeError};
use crate::document::cursor::Cursor;
use crate::document::node::{Block, Documents, MappingEntry, Scalar, ScalarStyle};
use crate::yamlpath::YamlPathMatcher;

/// Options accepted by [`ChangeValue`], as they appear in recipe files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeValueOptions {
    /// Path expression selecting the mapping entries to change.
    #[serde(alias = "old_key_path")]
    pub old_key_path: String,
    /// Plain scalar text written in place of each selected value. Text that
    /// would not read back unchanged as a plain scalar is rejected.
    pub value: String,
}

/// Changes the value of every mapping entry selected by a path expression,
/// leaving the key and the surrounding formatting intact.
///
/// Descendants are rewritten before the entry that contains them is checked,
/// so when an expression selects both an entry and one of its descendants,
/// the outer replacement wins.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use yamlrewrite::document::parser::parse_yaml;
/// use yamlrewrite::document::printer::print_yaml;
/// use yamlrewrite::recipe::{ChangeValue, Recipe};
///
/// let recipe = ChangeValue::new("a/b/c", "2").unwrap();
/// let documents = Arc::new(parse_yaml("a: {b: {c: 1}}").unwrap());
/// assert_eq!(print_yaml(&recipe.run(&documents)), "a: {b: {c: 2}}");
/// ```
#[derive(Debug, Clone)]
pub struct ChangeValue {
    options: ChangeValueOptions,
    matcher: YamlPathMatcher,
}

impl ChangeValue {
    pub const NAME: &'static str = "change-value";

    pub fn new(
        old_key_path: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<Self, RecipeError> {
        Self::from_options(ChangeValueOptions {
            old_key_path: old_key_path.into(),
            value: value.into(),
        })
    }

    /// Validates the options and compiles the path expression.
    pub fn from_options(options: ChangeValueOptions) -> Result<Self, RecipeError> {
        if options.old_key_path.trim().is_empty() {
            return Err(RecipeError::InvalidOption {
                option: "oldKeyPath",
                message: "must not be empty".to_string(),
            });
        }
        if let Some(problem) = plain_scalar_problem(&options.value) {
            return Err(RecipeError::InvalidOption {
                option: "value",
                message: problem.to_string(),
            });
        }

        let matcher = YamlPathMatcher::new(&options.old_key_path).map_err(|source| {
            RecipeError::InvalidPath {
                expression: options.old_key_path.clone(),
                source,
            }
        })?;
        debug!(key_path = %matcher, value = %options.value, "compiled change-value recipe");

        Ok(Self { options, matcher })
    }

    pub fn options(&self) -> &ChangeValueOptions {
        &self.options
    }

    pub fn matcher(&self) -> &YamlPathMatcher {
        &self.matcher
    }

    pub(crate) fn descriptor() -> RecipeDescriptor {
        RecipeDescriptor {
            name: Self::NAME,
            display_name: "Change value",
            description: "Change a YAML mapping entry value leaving the key intact.",
            options: vec![
                OptionDescriptor {
                    name: "oldKeyPath",
                    display_name: "Key path",
                    description: "A path expression to locate a YAML entry. Sequence items are path steps, as in `subjects/*/kind`.",
                    example: "subjects/kind",
                    required: true,
                },
                OptionDescriptor {
                    name: "value",
                    display_name: "New value",
                    description: "The new value to set for the key identified by oldKeyPath.",
                    example: "Deployment",
                    required: true,
                },
            ],
        }
    }

    /// True when `value` already prints exactly as the replacement would.
    fn is_replacement(&self, value: &Block) -> bool {
        value.as_scalar().is_some_and(|scalar| {
            scalar.style() == ScalarStyle::Plain
                && scalar.anchor().is_none()
                && scalar.value() == self.options.value
        })
    }
}

impl Recipe for ChangeValue {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn display_name(&self) -> &'static str {
        "Change value"
    }

    fn description(&self) -> &'static str {
        "Change a YAML mapping entry value leaving the key intact."
    }

    fn run(&self, documents: &Arc<Documents>) -> Arc<Documents> {
        visitor::visit(self, documents)
    }
}

impl YamlVisitor for ChangeValue {
    fn visit_mapping_entry(
        &self,
        entry: &Arc<MappingEntry>,
        cursor: &Cursor<'_>,
    ) -> Arc<MappingEntry> {
        let visited = walk_mapping_entry(self, entry, cursor);
        if !self.matcher.matches(cursor) {
            return visited;
        }
        // an equal plain value keeps the entry, so a rerun returns the input tree itself
        if self.is_replacement(entry.value()) {
            return visited;
        }

        let prefix = replacement_prefix(entry.value());
        debug!(
            path = %cursor.describe(),
            entry = %entry.id(),
            "replacing mapping entry value"
        );

        let scalar = Scalar::plain(prefix, self.options.value.as_str());
        Arc::new(visited.with_value(Block::Scalar(Arc::new(scalar))))
    }
}

/// Prefix for a scalar replacing `value`, so that it stays nested under its key.
fn replacement_prefix(value: &Block) -> String {
    match value {
        // `key:\n- a` ends its prefix at the key's column
        Block::Sequence(sequence) if sequence.is_indentless() && sequence.prefix().contains('\n') => {
            format!("{}  ", sequence.prefix())
        }
        // `key:` with no value
        _ if value.prefix().is_empty() => " ".to_string(),
        _ => value.prefix().to_string(),
    }
}

/// Returns why `value` would not read back as the same plain scalar, in block
/// or flow context.
fn plain_scalar_problem(value: &str) -> Option<&'static str> {
    if value.contains(['\n', '\r']) {
        return Some("must be a single line");
    }
    if value.trim() != value {
        return Some("must not start or end with whitespace");
    }

    let mut chars = value.chars();
    let first = chars.next()?;
    if matches!(
        first,
        '#' | '&' | '*' | '!' | '|' | '>' | '%' | '@' | '`' | '"' | '\''
    ) {
        return Some("must not start with a YAML indicator character");
    }
    if matches!(first, '-' | '?' | ':') && chars.next().map_or(true, |c| c == ' ' || c == '\t') {
        return Some("must not start with a YAML indicator character");
    }
    if value.contains(": ") || value.contains(":\t") || value.ends_with(':') {
        return Some("must not contain ': ' or end with ':'");
    }
    if value.contains(" #") || value.contains("\t#") {
        return Some("must not contain ' #'");
    }
    if value.contains([',', '[', ']', '{', '}']) {
        return Some("must not contain flow indicators (, [ ] { })");
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parser::parse_yaml;
    use crate::document::printer::print_yaml;

    fn rewrite(source: &str, path: &str, value: &str) -> String {
        let documents = Arc::new(parse_yaml(source).unwrap());
        let recipe = ChangeValue::new(path, value).unwrap();
        print_yaml(&recipe.run(&documents))
    }

    #[test]
    fn test_change_block_value() {
        assert_eq!(
            rewrite("subjects:\n  kind: Service\n", "subjects/kind", "Deployment"),
            "subjects:\n  kind: Deployment\n"
        );
    }

    #[test]
    fn test_empty_value_gets_separator() {
        assert_eq!(rewrite("a:\nb: 1\n", "/a", "x"), "a: x\nb: 1\n");
    }

    #[test]
    fn test_indentless_sequence_value_is_indented() {
        assert_eq!(
            rewrite("items:\n- a\n- b\nnext: 1\n", "items", "none"),
            "items:\n  none\nnext: 1\n"
        );
        assert_eq!(
            rewrite("spec:\n  ports: # open\n  - 80\n  name: web\n", "ports", "none"),
            "spec:\n  ports: # open\n    none\n  name: web\n"
        );
    }

    #[test]
    fn test_indented_sequence_keeps_prefix() {
        assert_eq!(
            rewrite("items:\n  - a\nnext: 1\n", "items", "none"),
            "items:\n  none\nnext: 1\n"
        );
        assert_eq!(rewrite("items: &list\n- a\n", "items", "none"), "items: none\n");
    }

    #[test]
    fn test_quoted_value_becomes_plain() {
        assert_eq!(rewrite("a: 'old'  # c\n", "a", "new"), "a: new  # c\n");
    }

    #[test]
    fn test_collection_value_is_replaced_whole() {
        assert_eq!(
            rewrite("a:\n  b: 1\n  c: 2\nd: 3\n", "/a", "gone"),
            "a:\n  gone\nd: 3\n"
        );
    }

    #[test]
    fn test_outer_match_wins_over_nested_match() {
        assert_eq!(rewrite("a:\n  a: 1\n", "a", "z"), "a:\n  z\n");
    }

    #[test]
    fn test_invalid_options() {
        assert!(matches!(
            ChangeValue::new("", "x"),
            Err(RecipeError::InvalidOption { option: "oldKeyPath", .. })
        ));
        assert!(matches!(
            ChangeValue::new("a", "x\ny"),
            Err(RecipeError::InvalidOption { option: "value", .. })
        ));
        assert!(matches!(
            ChangeValue::new("a/", "x"),
            Err(RecipeError::InvalidPath { .. })
        ));
    }

    fn rejects_value(value: &str) -> bool {
        matches!(
            ChangeValue::new("a", value),
            Err(RecipeError::InvalidOption { option: "value", .. })
        )
    }

    #[test]
    fn test_value_with_leading_indicator_rejected() {
        for value in ["#x", "&x", "*x", "!x", "|", ">x", "%x", "@x", "`x", "'x", "\"x", "- x", "-", "? x", ":"] {
            assert!(rejects_value(value), "{:?} should be rejected", value);
        }
    }

    #[test]
    fn test_value_with_comment_or_mapping_indicator_rejected() {
        for value in ["x #y", "a: b", "key:", "x\t#y"] {
            assert!(rejects_value(value), "{:?} should be rejected", value);
        }
    }

    #[test]
    fn test_value_with_flow_indicators_rejected() {
        for value in ["x, y", "[x]", "x]", "{x}", "a}"] {
            assert!(rejects_value(value), "{:?} should be rejected", value);
        }
    }

    #[test]
    fn test_value_with_surrounding_whitespace_rejected() {
        assert!(rejects_value(" x"));
        assert!(rejects_value("x "));
    }

    #[test]
    fn test_plain_safe_values_accepted() {
        for value in ["", "x#y", "a:b", "nginx:2.0", "-1", "http://example.com/a", "a b", "x?", "50%"] {
            assert!(ChangeValue::new("a", value).is_ok(), "{:?} should be accepted", value);
        }
        assert_eq!(rewrite("{a: 1}", "a", "x-y"), "{a: x-y}");
    }

    #[test]
    fn test_options_accept_both_spellings() {
        let camel: ChangeValueOptions =
            serde_yaml::from_str("oldKeyPath: a/b\nvalue: c\n").unwrap();
        let snake: ChangeValueOptions =
            serde_yaml::from_str("old_key_path: a/b\nvalue: c\n").unwrap();
        assert_eq!(camel, snake);
        assert_eq!(camel.old_key_path, "a/b");
    }
}
