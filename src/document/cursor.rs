//! Traversal position tracking.
//!
//! A [`Cursor`] is an immutable, stack-allocated linked list of the nodes on
//! the path from the root of a traversal to the node currently being visited.
//! Descending into a child pushes a new frame that borrows its parent; the
//! frame is dropped when the visit of that child returns. No state outlives a
//! traversal and nothing is shared between sibling subtrees.
//!
//! # Example
//!
//! ```
//! use yamlrewrite::document::cursor::{Cursor, CursorValue, PathStep};
//! use yamlrewrite::document::node::{Block, MappingEntry, Scalar};
//!
//! let entry = MappingEntry::new("", Scalar::plain("", "kind"), "", Block::empty());
//! let root = Cursor::root();
//! let cursor = root.push(CursorValue::MappingEntry(&entry));
//! assert_eq!(cursor.steps(), vec![PathStep::Key("kind")]);
//! ```

use std::iter;

use super::node::{
    Alias, Document, Documents, Mapping, MappingEntry, Scalar, Sequence, SequenceEntry,
};

/// A node on the cursor stack.
#[derive(Debug, Clone, Copy)]
pub enum CursorValue<'a> {
    Documents(&'a Documents),
    Document(&'a Document),
    Mapping(&'a Mapping),
    MappingEntry(&'a MappingEntry),
    Sequence(&'a Sequence),
    /// A sequence item together with its position in the enclosing sequence.
    SequenceEntry {
        entry: &'a SequenceEntry,
        index: usize,
        len: usize,
    },
    Scalar(&'a Scalar),
    Alias(&'a Alias),
}

/// One addressable step of a position: a mapping key or a sequence index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'a> {
    Key(&'a str),
    Index { index: usize, len: usize },
}

/// The live ancestor chain of a traversal.
#[derive(Debug, Clone, Copy)]
pub struct Cursor<'a> {
    parent: Option<&'a Cursor<'a>>,
    value: Option<CursorValue<'a>>,
}

impl Cursor<'static> {
    /// The empty cursor a traversal starts from.
    pub fn root() -> Self {
        Cursor {
            parent: None,
            value: None,
        }
    }
}

impl<'a> Cursor<'a> {
    /// Returns a new frame for `value`, with `self` as its parent.
    pub fn push<'b>(&'b self, value: CursorValue<'b>) -> Cursor<'b> {
        Cursor {
            parent: Some(self),
            value: Some(value),
        }
    }

    /// The node this frame was pushed for; `None` for the root cursor.
    pub fn value(&self) -> Option<CursorValue<'a>> {
        self.value
    }

    pub fn parent(&self) -> Option<&'a Cursor<'a>> {
        self.parent
    }

    /// Iterates over the nodes on the stack, innermost first.
    pub fn ancestors(&self) -> impl Iterator<Item = CursorValue<'a>> + '_ {
        iter::successors(Some(self), |cursor| cursor.parent).filter_map(|cursor| cursor.value)
    }

    /// Number of nodes on the stack.
    pub fn depth(&self) -> usize {
        self.ancestors().count()
    }

    /// The addressable steps from the enclosing document root down to this
    /// frame, outermost first.
    pub fn steps(&self) -> Vec<PathStep<'a>> {
        let mut steps: Vec<PathStep<'a>> = self
            .ancestors()
            .take_while(|value| {
                !matches!(value, CursorValue::Document(_) | CursorValue::Documents(_))
            })
            .filter_map(|value| match value {
                CursorValue::MappingEntry(entry) => Some(PathStep::Key(entry.key().value())),
                CursorValue::SequenceEntry { index, len, .. } => {
                    Some(PathStep::Index { index, len })
                }
                _ => None,
            })
            .collect();
        steps.reverse();
        steps
    }

    /// Renders the steps as a slash-separated path, for logging.
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .steps()
            .iter()
            .map(|step| match step {
                PathStep::Key(key) => key.to_string(),
                PathStep::Index { index, .. } => format!("[{}]", index),
            })
            .collect();
        format!("/{}", parts.join("/"))
    }
}
