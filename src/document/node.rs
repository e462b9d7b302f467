//! Lossless YAML node representation.
//!
//! Every piece of source text lives in exactly one place in the tree: either
//! in a node's payload (keys, scalar text, indicators) or in a formatting
//! `prefix` (the whitespace and comments that precede a node). Printing a tree
//! is therefore plain concatenation, and an unmodified tree prints back to the
//! exact bytes it was parsed from.
//!
//! Children are held behind [`Arc`] so a rewrite can rebuild only the spine of
//! nodes above a change and share every other subtree with the input tree.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use yamlrewrite::document::node::{Block, Mapping, MappingEntry, Scalar};
//!
//! let entry = MappingEntry::new(
//!     "",
//!     Scalar::plain("", "kind"),
//!     "",
//!     Block::Scalar(Arc::new(Scalar::plain(" ", "Service"))),
//! );
//! let mapping = Mapping::block("", vec![Arc::new(entry)]);
//! assert_eq!(mapping.entries().len(), 1);
//! ```

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use uuid::Uuid;

/// Stable identity of a node.
///
/// Assigned when a node is constructed and carried through every rewrite that
/// does not replace the node itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Returns a fresh identity, distinct from every other node's.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Non-semantic information attached to a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// The file a tree was loaded from.
    Provenance { source: PathBuf },
    /// A message attached by a tool that inspected the node.
    Diagnostic { message: String },
}

/// An ordered set of markers. Opaque to rewrites, which carry it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Markers {
    entries: Vec<Marker>,
}

impl Markers {
    pub const EMPTY: Markers = Markers {
        entries: Vec::new(),
    };

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marker> {
        self.entries.iter()
    }

    /// Returns a copy of these markers with `marker` appended.
    pub fn with(&self, marker: Marker) -> Self {
        let mut entries = self.entries.clone();
        entries.push(marker);
        Self { entries }
    }

    /// Returns the source path recorded by a provenance marker, if any.
    pub fn provenance(&self) -> Option<&Path> {
        self.entries.iter().find_map(|marker| match marker {
            Marker::Provenance { source } => Some(source.as_path()),
            Marker::Diagnostic { .. } => None,
        })
    }
}

/// Presentation style of a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    /// `|` block scalar
    Literal,
    /// `>` block scalar
    Folded,
}

/// An `&name` anchor attached to a block.
///
/// The whitespace before the `&` belongs to the owning node's prefix; the
/// whitespace between the anchor name and same-line content is the postfix.
#[derive(Debug, Clone, PartialEq)]
pub struct Anchor {
    pub(crate) id: NodeId,
    pub(crate) key: String,
    pub(crate) postfix: String,
}

impl Anchor {
    pub fn new(key: impl Into<String>, postfix: impl Into<String>) -> Self {
        Self {
            id: NodeId::random(),
            key: key.into(),
            postfix: postfix.into(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn postfix(&self) -> &str {
        &self.postfix
    }
}

/// A scalar value.
///
/// `value` holds the source text of the scalar without its delimiters: the
/// text between the quotes for quoted styles, and everything after the `|` or
/// `>` indicator (header and content lines) for block styles. Escape sequences
/// are kept verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Scalar {
    pub(crate) id: NodeId,
    pub(crate) prefix: String,
    pub(crate) markers: Markers,
    pub(crate) anchor: Option<Anchor>,
    pub(crate) style: ScalarStyle,
    pub(crate) value: String,
}

impl Scalar {
    pub fn new(prefix: impl Into<String>, style: ScalarStyle, value: impl Into<String>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: prefix.into(),
            markers: Markers::EMPTY,
            anchor: None,
            style,
            value: value.into(),
        }
    }

    /// Creates a plain scalar with a fresh identity and no markers.
    pub fn plain(prefix: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(prefix, ScalarStyle::Plain, value)
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    pub fn style(&self) -> ScalarStyle {
        self.style
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn with_anchor(&self, anchor: Option<Anchor>) -> Self {
        Self {
            anchor,
            ..self.clone()
        }
    }
}

/// A `*name` alias.
#[derive(Debug, Clone, PartialEq)]
pub struct Alias {
    pub(crate) id: NodeId,
    pub(crate) prefix: String,
    pub(crate) markers: Markers,
    pub(crate) name: String,
}

impl Alias {
    pub fn new(prefix: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: prefix.into(),
            markers: Markers::EMPTY,
            name: name.into(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A `key: value` pair inside a mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct MappingEntry {
    pub(crate) id: NodeId,
    pub(crate) prefix: String,
    pub(crate) markers: Markers,
    pub(crate) key: Arc<Scalar>,
    pub(crate) before_mapping_value_indicator: String,
    pub(crate) value: Block,
    /// Whitespace before a `,` following the entry in a flow mapping.
    pub(crate) trailing_comma_prefix: Option<String>,
}

impl MappingEntry {
    pub fn new(
        prefix: impl Into<String>,
        key: Scalar,
        before_mapping_value_indicator: impl Into<String>,
        value: Block,
    ) -> Self {
        Self {
            id: NodeId::random(),
            prefix: prefix.into(),
            markers: Markers::EMPTY,
            key: Arc::new(key),
            before_mapping_value_indicator: before_mapping_value_indicator.into(),
            value,
            trailing_comma_prefix: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn key(&self) -> &Arc<Scalar> {
        &self.key
    }

    pub fn before_mapping_value_indicator(&self) -> &str {
        &self.before_mapping_value_indicator
    }

    pub fn value(&self) -> &Block {
        &self.value
    }

    pub fn trailing_comma_prefix(&self) -> Option<&str> {
        self.trailing_comma_prefix.as_deref()
    }

    /// Returns a copy of this entry holding `value`. Identity and key are kept.
    pub fn with_value(&self, value: Block) -> Self {
        Self {
            value,
            ..self.clone()
        }
    }

    pub fn with_trailing_comma_prefix(&self, trailing_comma_prefix: Option<String>) -> Self {
        Self {
            trailing_comma_prefix,
            ..self.clone()
        }
    }
}

/// A block (`key: value` lines) or flow (`{key: value}`) mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    pub(crate) id: NodeId,
    pub(crate) prefix: String,
    pub(crate) markers: Markers,
    pub(crate) anchor: Option<Anchor>,
    pub(crate) entries: Vec<Arc<MappingEntry>>,
    /// Whitespace before the closing `}`; `Some` exactly for flow mappings.
    pub(crate) closing_brace_prefix: Option<String>,
}

impl Mapping {
    pub fn block(prefix: impl Into<String>, entries: Vec<Arc<MappingEntry>>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: prefix.into(),
            markers: Markers::EMPTY,
            anchor: None,
            entries,
            closing_brace_prefix: None,
        }
    }

    pub fn flow(
        prefix: impl Into<String>,
        entries: Vec<Arc<MappingEntry>>,
        closing_brace_prefix: impl Into<String>,
    ) -> Self {
        Self {
            closing_brace_prefix: Some(closing_brace_prefix.into()),
            ..Self::block(prefix, entries)
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    pub fn entries(&self) -> &[Arc<MappingEntry>] {
        &self.entries
    }

    pub fn is_flow(&self) -> bool {
        self.closing_brace_prefix.is_some()
    }

    pub fn closing_brace_prefix(&self) -> Option<&str> {
        self.closing_brace_prefix.as_deref()
    }

    /// Looks up the first entry whose key text is `key`.
    pub fn get(&self, key: &str) -> Option<&Arc<MappingEntry>> {
        self.entries.iter().find(|entry| entry.key.value() == key)
    }

    pub fn with_entries(&self, entries: Vec<Arc<MappingEntry>>) -> Self {
        Self {
            entries,
            ..self.clone()
        }
    }

    pub fn with_anchor(&self, anchor: Option<Anchor>) -> Self {
        Self {
            anchor,
            ..self.clone()
        }
    }
}

/// An item of a sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceEntry {
    pub(crate) id: NodeId,
    pub(crate) prefix: String,
    pub(crate) markers: Markers,
    /// True for block entries introduced by `-`.
    pub(crate) dash: bool,
    pub(crate) block: Block,
    pub(crate) trailing_comma_prefix: Option<String>,
}

impl SequenceEntry {
    pub fn new(prefix: impl Into<String>, dash: bool, block: Block) -> Self {
        Self {
            id: NodeId::random(),
            prefix: prefix.into(),
            markers: Markers::EMPTY,
            dash,
            block,
            trailing_comma_prefix: None,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn is_dash(&self) -> bool {
        self.dash
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn trailing_comma_prefix(&self) -> Option<&str> {
        self.trailing_comma_prefix.as_deref()
    }

    pub fn with_block(&self, block: Block) -> Self {
        Self {
            block,
            ..self.clone()
        }
    }

    pub fn with_trailing_comma_prefix(&self, trailing_comma_prefix: Option<String>) -> Self {
        Self {
            trailing_comma_prefix,
            ..self.clone()
        }
    }
}

/// A block (`- item` lines) or flow (`[a, b]`) sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub(crate) id: NodeId,
    pub(crate) prefix: String,
    pub(crate) markers: Markers,
    pub(crate) anchor: Option<Anchor>,
    pub(crate) entries: Vec<Arc<SequenceEntry>>,
    /// Whitespace before the closing `]`; `Some` exactly for flow sequences.
    pub(crate) closing_bracket_prefix: Option<String>,
    /// Block sequence whose dashes sit at the column of the key owning it.
    pub(crate) indentless: bool,
}

impl Sequence {
    pub fn block(prefix: impl Into<String>, entries: Vec<Arc<SequenceEntry>>) -> Self {
        Self {
            id: NodeId::random(),
            prefix: prefix.into(),
            markers: Markers::EMPTY,
            anchor: None,
            entries,
            closing_bracket_prefix: None,
            indentless: false,
        }
    }

    pub fn flow(
        prefix: impl Into<String>,
        entries: Vec<Arc<SequenceEntry>>,
        closing_bracket_prefix: impl Into<String>,
    ) -> Self {
        Self {
            closing_bracket_prefix: Some(closing_bracket_prefix.into()),
            ..Self::block(prefix, entries)
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn anchor(&self) -> Option<&Anchor> {
        self.anchor.as_ref()
    }

    pub fn entries(&self) -> &[Arc<SequenceEntry>] {
        &self.entries
    }

    pub fn is_flow(&self) -> bool {
        self.closing_bracket_prefix.is_some()
    }

    pub fn closing_bracket_prefix(&self) -> Option<&str> {
        self.closing_bracket_prefix.as_deref()
    }

    /// True for a mapping value written as `key:\n- item`, with the dashes
    /// not indented past the key.
    pub fn is_indentless(&self) -> bool {
        self.indentless
    }

    pub fn with_entries(&self, entries: Vec<Arc<SequenceEntry>>) -> Self {
        Self {
            entries,
            ..self.clone()
        }
    }

    pub fn with_anchor(&self, anchor: Option<Anchor>) -> Self {
        Self {
            anchor,
            ..self.clone()
        }
    }
}

/// Any node that can stand as a document root, mapping value or sequence item.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Mapping(Arc<Mapping>),
    Sequence(Arc<Sequence>),
    Scalar(Arc<Scalar>),
    Alias(Arc<Alias>),
}

impl Block {
    /// An empty plain scalar, used for `key:` entries without a value.
    pub fn empty() -> Self {
        Block::Scalar(Arc::new(Scalar::plain("", "")))
    }

    pub fn id(&self) -> NodeId {
        match self {
            Block::Mapping(m) => m.id,
            Block::Sequence(s) => s.id,
            Block::Scalar(s) => s.id,
            Block::Alias(a) => a.id,
        }
    }

    pub fn prefix(&self) -> &str {
        match self {
            Block::Mapping(m) => &m.prefix,
            Block::Sequence(s) => &s.prefix,
            Block::Scalar(s) => &s.prefix,
            Block::Alias(a) => &a.prefix,
        }
    }

    pub fn markers(&self) -> &Markers {
        match self {
            Block::Mapping(m) => &m.markers,
            Block::Sequence(s) => &s.markers,
            Block::Scalar(s) => &s.markers,
            Block::Alias(a) => &a.markers,
        }
    }

    pub fn as_scalar(&self) -> Option<&Arc<Scalar>> {
        match self {
            Block::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Arc<Mapping>> {
        match self {
            Block::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Arc<Sequence>> {
        match self {
            Block::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// True when both blocks are the very same allocation.
    pub fn ptr_eq(&self, other: &Block) -> bool {
        match (self, other) {
            (Block::Mapping(a), Block::Mapping(b)) => Arc::ptr_eq(a, b),
            (Block::Sequence(a), Block::Sequence(b)) => Arc::ptr_eq(a, b),
            (Block::Scalar(a), Block::Scalar(b)) => Arc::ptr_eq(a, b),
            (Block::Alias(a), Block::Alias(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// The end of a document: trailing trivia and an optional `...` marker.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEnd {
    pub(crate) id: NodeId,
    pub(crate) prefix: String,
    pub(crate) markers: Markers,
    pub(crate) explicit: bool,
}

impl DocumentEnd {
    pub fn new(prefix: impl Into<String>, explicit: bool) -> Self {
        Self {
            id: NodeId::random(),
            prefix: prefix.into(),
            markers: Markers::EMPTY,
            explicit,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }
}

/// A single YAML document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) id: NodeId,
    pub(crate) prefix: String,
    pub(crate) markers: Markers,
    /// True when the document starts with `---`.
    pub(crate) explicit: bool,
    pub(crate) block: Block,
    pub(crate) end: DocumentEnd,
}

impl Document {
    pub fn new(prefix: impl Into<String>, explicit: bool, block: Block, end: DocumentEnd) -> Self {
        Self {
            id: NodeId::random(),
            prefix: prefix.into(),
            markers: Markers::EMPTY,
            explicit,
            block,
            end,
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn is_explicit(&self) -> bool {
        self.explicit
    }

    pub fn block(&self) -> &Block {
        &self.block
    }

    pub fn end(&self) -> &DocumentEnd {
        &self.end
    }

    pub fn with_block(&self, block: Block) -> Self {
        Self {
            block,
            ..self.clone()
        }
    }
}

/// A YAML stream: one or more documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Documents {
    pub(crate) id: NodeId,
    pub(crate) markers: Markers,
    pub(crate) documents: Vec<Arc<Document>>,
    /// Trivia after the last document's explicit `...` end marker.
    pub(crate) suffix: String,
}

impl Documents {
    pub fn new(documents: Vec<Arc<Document>>) -> Self {
        Self {
            id: NodeId::random(),
            markers: Markers::EMPTY,
            documents,
            suffix: String::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn markers(&self) -> &Markers {
        &self.markers
    }

    pub fn documents(&self) -> &[Arc<Document>] {
        &self.documents
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn with_documents(&self, documents: Vec<Arc<Document>>) -> Self {
        Self {
            documents,
            ..self.clone()
        }
    }

    pub fn with_markers(&self, markers: Markers) -> Self {
        Self {
            markers,
            ..self.clone()
        }
    }
}
