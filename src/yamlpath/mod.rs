//! Path expressions over YAML documents.
//!
//! A path expression selects positions in a document by the keys and
//! sequence indices leading to them. Expressions are compiled once into a
//! [`YamlPathMatcher`] and then evaluated against a traversal
//! [`Cursor`](crate::document::cursor::Cursor).
//!
//! # Supported Syntax
//!
//! Slash form:
//!
//! - `a/b` - Entry `b` inside entry `a`, at any depth
//! - `/a/b` - Same, anchored at the document root
//! - `*` - Any single key or sequence item
//! - `//` - Any number of intermediate steps
//! - `[index]` - Sequence index, also after a key (`items[0]`)
//! - `'a/b'` or `"a/b"` - Quoted key
//!
//! Dollar form, always anchored:
//!
//! - `$.property` or `$['property']` - Named key
//! - `[index]` - Sequence index (supports negative indices)
//! - `[*]` or `.*` - Any child
//! - `..property` - Recursive descent
//! - `[start:end]` - Sequence slicing
//! - `['prop1','prop2']` - Multiple keys
//!
//! # Examples
//!
//! ```
//! // subjects/kind       - every `kind` directly inside a `subjects` entry
//! // /spec/containers/*/image
//! // $.items[0:3].name
//! // $..metadata['name','namespace']
//! ```

pub mod ast;
pub mod error;
pub mod matcher;
pub mod parser;

pub use ast::{PathSegment, YamlPath};
pub use error::YamlPathError;
pub use matcher::YamlPathMatcher;
pub use parser::Parser;
