//! Lossless YAML documents.
//!
//! This module holds the immutable node model, a parser that keeps every
//! byte of the source in the tree, the printer that turns a tree back into
//! text, and the cursor that tracks a traversal's position.

pub mod cursor;
pub mod node;
pub mod parser;
pub mod printer;
