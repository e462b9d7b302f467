//! Abstract syntax tree types for path expressions.

/// A segment in a path expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Mapping key (`name`, `.name` or `['name']`)
    Child(String),
    /// Sequence index (`[0]`, `[-1]`)
    Index(isize),
    /// Any single step (`*`, `.*` or `[*]`)
    Wildcard,
    /// Zero or more steps (`//` or `..`)
    RecursiveDescent,
    /// Sequence slice (`[start:end]`)
    Slice(Option<isize>, Option<isize>),
    /// Any of several mapping keys (`['a','b']`)
    MultiProperty(Vec<String>),
}

/// A compiled path expression.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlPath {
    /// Whether the first segment must match at the document root. Unanchored
    /// paths match any position whose trailing steps fit the segments.
    pub anchored: bool,
    /// Segments that make up the path.
    pub segments: Vec<PathSegment>,
}

impl YamlPath {
    /// Creates a new path with the given segments.
    pub fn new(anchored: bool, segments: Vec<PathSegment>) -> Self {
        Self { anchored, segments }
    }
}
