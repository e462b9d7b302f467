//! Cursor-tracking tree rewriting.
//!
//! A [`YamlVisitor`] walks a document tree depth first. Each `visit_*` method
//! receives the node and a [`Cursor`] whose innermost frame is that node, and
//! returns the node to put in its place. The default methods delegate to the
//! `walk_*` functions, which visit the children and rebuild the parent only
//! when a child came back as a different allocation. Unchanged subtrees are
//! returned as the very same [`Arc`], so a rewrite allocates only along the
//! spine above a change.
//!
//! Overriding a method and calling the matching `walk_*` function from it is
//! how a visitor runs custom logic around the default descent.

use std::sync::Arc;

use crate::document::cursor::{Cursor, CursorValue};
use crate::document::node::{
    Alias, Block, Document, Documents, Mapping, MappingEntry, Scalar, Sequence, SequenceEntry,
};

pub trait YamlVisitor {
    fn visit_documents(&self, documents: &Arc<Documents>, cursor: &Cursor<'_>) -> Arc<Documents> {
        walk_documents(self, documents, cursor)
    }

    fn visit_document(&self, document: &Arc<Document>, cursor: &Cursor<'_>) -> Arc<Document> {
        walk_document(self, document, cursor)
    }

    /// Dispatches on the block kind. Unlike the other methods, `cursor` here
    /// is the parent's cursor; the frame for the block itself is pushed by
    /// [`walk_block`].
    fn visit_block(&self, block: &Block, cursor: &Cursor<'_>) -> Block {
        walk_block(self, block, cursor)
    }

    fn visit_mapping(&self, mapping: &Arc<Mapping>, cursor: &Cursor<'_>) -> Arc<Mapping> {
        walk_mapping(self, mapping, cursor)
    }

    fn visit_mapping_entry(
        &self,
        entry: &Arc<MappingEntry>,
        cursor: &Cursor<'_>,
    ) -> Arc<MappingEntry> {
        walk_mapping_entry(self, entry, cursor)
    }

    fn visit_sequence(&self, sequence: &Arc<Sequence>, cursor: &Cursor<'_>) -> Arc<Sequence> {
        walk_sequence(self, sequence, cursor)
    }

    fn visit_sequence_entry(
        &self,
        entry: &Arc<SequenceEntry>,
        cursor: &Cursor<'_>,
    ) -> Arc<SequenceEntry> {
        walk_sequence_entry(self, entry, cursor)
    }

    fn visit_scalar(&self, scalar: &Arc<Scalar>, _cursor: &Cursor<'_>) -> Arc<Scalar> {
        Arc::clone(scalar)
    }

    fn visit_alias(&self, alias: &Arc<Alias>, _cursor: &Cursor<'_>) -> Arc<Alias> {
        Arc::clone(alias)
    }
}

/// Runs `visitor` over a whole stream, starting from an empty cursor.
pub fn visit<V: YamlVisitor + ?Sized>(visitor: &V, documents: &Arc<Documents>) -> Arc<Documents> {
    let root = Cursor::root();
    let cursor = root.push(CursorValue::Documents(documents));
    visitor.visit_documents(documents, &cursor)
}

pub fn walk_documents<V: YamlVisitor + ?Sized>(
    visitor: &V,
    documents: &Arc<Documents>,
    cursor: &Cursor<'_>,
) -> Arc<Documents> {
    let mut changed = false;
    let rebuilt: Vec<Arc<Document>> = documents
        .documents()
        .iter()
        .map(|document| {
            let child = cursor.push(CursorValue::Document(document));
            let visited = visitor.visit_document(document, &child);
            changed |= !Arc::ptr_eq(&visited, document);
            visited
        })
        .collect();

    if changed {
        Arc::new(documents.with_documents(rebuilt))
    } else {
        Arc::clone(documents)
    }
}

pub fn walk_document<V: YamlVisitor + ?Sized>(
    visitor: &V,
    document: &Arc<Document>,
    cursor: &Cursor<'_>,
) -> Arc<Document> {
    let block = visitor.visit_block(document.block(), cursor);
    if block.ptr_eq(document.block()) {
        Arc::clone(document)
    } else {
        Arc::new(document.with_block(block))
    }
}

pub fn walk_block<V: YamlVisitor + ?Sized>(
    visitor: &V,
    block: &Block,
    cursor: &Cursor<'_>,
) -> Block {
    match block {
        Block::Mapping(mapping) => {
            let child = cursor.push(CursorValue::Mapping(mapping));
            Block::Mapping(visitor.visit_mapping(mapping, &child))
        }
        Block::Sequence(sequence) => {
            let child = cursor.push(CursorValue::Sequence(sequence));
            Block::Sequence(visitor.visit_sequence(sequence, &child))
        }
        Block::Scalar(scalar) => {
            let child = cursor.push(CursorValue::Scalar(scalar));
            Block::Scalar(visitor.visit_scalar(scalar, &child))
        }
        Block::Alias(alias) => {
            let child = cursor.push(CursorValue::Alias(alias));
            Block::Alias(visitor.visit_alias(alias, &child))
        }
    }
}

pub fn walk_mapping<V: YamlVisitor + ?Sized>(
    visitor: &V,
    mapping: &Arc<Mapping>,
    cursor: &Cursor<'_>,
) -> Arc<Mapping> {
    let mut changed = false;
    let entries: Vec<Arc<MappingEntry>> = mapping
        .entries()
        .iter()
        .map(|entry| {
            let child = cursor.push(CursorValue::MappingEntry(entry));
            let visited = visitor.visit_mapping_entry(entry, &child);
            changed |= !Arc::ptr_eq(&visited, entry);
            visited
        })
        .collect();

    if changed {
        Arc::new(mapping.with_entries(entries))
    } else {
        Arc::clone(mapping)
    }
}

/// Visits the entry's value. Keys are never visited.
pub fn walk_mapping_entry<V: YamlVisitor + ?Sized>(
    visitor: &V,
    entry: &Arc<MappingEntry>,
    cursor: &Cursor<'_>,
) -> Arc<MappingEntry> {
    let value = visitor.visit_block(entry.value(), cursor);
    if value.ptr_eq(entry.value()) {
        Arc::clone(entry)
    } else {
        Arc::new(entry.with_value(value))
    }
}

pub fn walk_sequence<V: YamlVisitor + ?Sized>(
    visitor: &V,
    sequence: &Arc<Sequence>,
    cursor: &Cursor<'_>,
) -> Arc<Sequence> {
    let len = sequence.entries().len();
    let mut changed = false;
    let entries: Vec<Arc<SequenceEntry>> = sequence
        .entries()
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let child = cursor.push(CursorValue::SequenceEntry {
                entry,
                index,
                len,
            });
            let visited = visitor.visit_sequence_entry(entry, &child);
            changed |= !Arc::ptr_eq(&visited, entry);
            visited
        })
        .collect();

    if changed {
        Arc::new(sequence.with_entries(entries))
    } else {
        Arc::clone(sequence)
    }
}

pub fn walk_sequence_entry<V: YamlVisitor + ?Sized>(
    visitor: &V,
    entry: &Arc<SequenceEntry>,
    cursor: &Cursor<'_>,
) -> Arc<SequenceEntry> {
    let block = visitor.visit_block(entry.block(), cursor);
    if block.ptr_eq(entry.block()) {
        Arc::clone(entry)
    } else {
        Arc::new(entry.with_block(block))
    }
}
