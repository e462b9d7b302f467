//! File I/O operations for YAML documents.
//!
//! This module provides functionality to load YAML streams from disk or stdin,
//! and save rewritten trees back to files with atomic write operations and
//! optional backups. Files ending in `.gz` are transparently (de)compressed.

pub mod loader;
pub mod saver;
