//! Matching compiled path expressions against traversal positions.

use std::fmt;
use std::str::FromStr;

use super::ast::{PathSegment, YamlPath};
use super::error::YamlPathError;
use super::parser::Parser;
use crate::document::cursor::{Cursor, PathStep};

/// A path expression compiled once and evaluated against many positions.
///
/// Matching is a pure function of the cursor, so one matcher can be shared
/// between threads and reused across documents.
///
/// # Example
///
/// ```
/// use yamlrewrite::document::cursor::PathStep;
/// use yamlrewrite::yamlpath::YamlPathMatcher;
///
/// let matcher = YamlPathMatcher::new("items/*/kind").unwrap();
/// let steps = [
///     PathStep::Key("items"),
///     PathStep::Index { index: 0, len: 2 },
///     PathStep::Key("kind"),
/// ];
/// assert!(matcher.matches_steps(&steps));
/// assert!(!matcher.matches_steps(&steps[..2]));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct YamlPathMatcher {
    expression: String,
    path: YamlPath,
}

impl YamlPathMatcher {
    /// Compiles `expression`, failing on malformed syntax.
    pub fn new(expression: &str) -> Result<Self, YamlPathError> {
        let path = Parser::parse(expression)?;
        Ok(Self {
            expression: expression.to_string(),
            path,
        })
    }

    /// The expression this matcher was compiled from.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn path(&self) -> &YamlPath {
        &self.path
    }

    /// Whether the cursor's current position is selected by the expression.
    pub fn matches(&self, cursor: &Cursor<'_>) -> bool {
        self.matches_steps(&cursor.steps())
    }

    /// Whether a position, given as steps from the document root, is
    /// selected by the expression.
    pub fn matches_steps(&self, steps: &[PathStep<'_>]) -> bool {
        let segments = &self.path.segments;
        if self.path.anchored {
            match_from(segments, steps)
        } else {
            (0..=steps.len()).any(|start| match_from(segments, &steps[start..]))
        }
    }
}

impl FromStr for YamlPathMatcher {
    type Err = YamlPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for YamlPathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.expression)
    }
}

fn match_from(segments: &[PathSegment], steps: &[PathStep<'_>]) -> bool {
    let Some((segment, rest)) = segments.split_first() else {
        return steps.is_empty();
    };

    if let PathSegment::RecursiveDescent = segment {
        return (0..=steps.len()).any(|skip| match_from(rest, &steps[skip..]));
    }

    match steps.split_first() {
        Some((step, remaining)) => segment_matches(segment, step) && match_from(rest, remaining),
        None => false,
    }
}

fn segment_matches(segment: &PathSegment, step: &PathStep<'_>) -> bool {
    match (segment, *step) {
        (PathSegment::Wildcard, _) => true,
        (PathSegment::Child(name), PathStep::Key(key)) => name == key,
        (PathSegment::MultiProperty(names), PathStep::Key(key)) => {
            names.iter().any(|name| name == key)
        }
        (PathSegment::Index(idx), PathStep::Index { index, len }) => {
            resolve_index(*idx, len) == Some(index)
        }
        (PathSegment::Slice(start, end), PathStep::Index { index, len }) => {
            let start = start.map_or(0, |s| clamp_index(s, len));
            let end = end.map_or(len, |e| clamp_index(e, len));
            start <= index && index < end
        }
        _ => false,
    }
}

/// Resolves a possibly negative index against a sequence length.
fn resolve_index(idx: isize, len: usize) -> Option<usize> {
    if idx >= 0 {
        Some(idx as usize)
    } else {
        len.checked_sub(idx.unsigned_abs())
    }
}

fn clamp_index(idx: isize, len: usize) -> usize {
    if idx >= 0 {
        (idx as usize).min(len)
    } else {
        len.saturating_sub(idx.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(k: &str) -> PathStep<'_> {
        PathStep::Key(k)
    }

    fn idx(index: usize, len: usize) -> PathStep<'static> {
        PathStep::Index { index, len }
    }

    #[test]
    fn test_relative_path_matches_suffix() {
        let matcher = YamlPathMatcher::new("subjects/kind").unwrap();
        assert!(matcher.matches_steps(&[key("subjects"), key("kind")]));
        assert!(matcher.matches_steps(&[key("spec"), key("subjects"), key("kind")]));
        assert!(!matcher.matches_steps(&[key("subjects")]));
        assert!(!matcher.matches_steps(&[key("subjects"), key("kind"), key("x")]));
    }

    #[test]
    fn test_anchored_path_matches_from_root() {
        let matcher = YamlPathMatcher::new("/subjects/kind").unwrap();
        assert!(matcher.matches_steps(&[key("subjects"), key("kind")]));
        assert!(!matcher.matches_steps(&[key("spec"), key("subjects"), key("kind")]));
    }

    #[test]
    fn test_wildcard_matches_keys_and_items() {
        let matcher = YamlPathMatcher::new("items/*/kind").unwrap();
        assert!(matcher.matches_steps(&[key("items"), idx(3, 4), key("kind")]));
        assert!(matcher.matches_steps(&[key("items"), key("first"), key("kind")]));
        assert!(!matcher.matches_steps(&[key("items"), key("kind")]));
    }

    #[test]
    fn test_descendant_gap() {
        let matcher = YamlPathMatcher::new("/spec//image").unwrap();
        assert!(matcher.matches_steps(&[key("spec"), key("image")]));
        assert!(matcher.matches_steps(&[
            key("spec"),
            key("containers"),
            idx(0, 1),
            key("image")
        ]));
        assert!(!matcher.matches_steps(&[key("status"), key("image")]));
    }

    #[test]
    fn test_negative_index() {
        let matcher = YamlPathMatcher::new("$.items[-1].name").unwrap();
        assert!(matcher.matches_steps(&[key("items"), idx(2, 3), key("name")]));
        assert!(!matcher.matches_steps(&[key("items"), idx(1, 3), key("name")]));
    }

    #[test]
    fn test_index_out_of_range_never_matches() {
        let matcher = YamlPathMatcher::new("items[-5]").unwrap();
        assert!(!matcher.matches_steps(&[key("items"), idx(0, 2)]));
    }

    #[test]
    fn test_slice_and_multi_property() {
        let matcher = YamlPathMatcher::new("$.items[1:].*").unwrap();
        assert!(!matcher.matches_steps(&[key("items"), idx(0, 3), key("a")]));
        assert!(matcher.matches_steps(&[key("items"), idx(2, 3), key("a")]));

        let matcher = YamlPathMatcher::new("$..['name','namespace']").unwrap();
        assert!(matcher.matches_steps(&[key("metadata"), key("namespace")]));
        assert!(!matcher.matches_steps(&[key("metadata"), key("labels")]));
    }

    #[test]
    fn test_keys_do_not_match_indices() {
        let matcher = YamlPathMatcher::new("items/0").unwrap();
        assert!(!matcher.matches_steps(&[key("items"), idx(0, 1)]));
        assert!(matcher.matches_steps(&[key("items"), key("0")]));
    }

    #[test]
    fn test_from_str_and_display() {
        let matcher: YamlPathMatcher = "a/b".parse().unwrap();
        assert_eq!(matcher.to_string(), "a/b");
        assert!("a/".parse::<YamlPathMatcher>().is_err());
    }
}
