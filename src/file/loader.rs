//! YAML file loading functionality.
//!
//! This module provides functions to load YAML streams from files, strings or
//! stdin, parsing them into lossless [`Documents`] trees that recipes can
//! rewrite.

use std::fs;
use std::io::{self, Read};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tracing::debug;

use crate::config::Config;
use crate::document::node::{Documents, Marker};
use crate::document::parser::parse_yaml;

/// Loads and parses a YAML file from the filesystem.
///
/// Files ending in `.gz` are decompressed first. The returned tree carries a
/// provenance marker naming `path`.
///
/// # Examples
///
/// ```no_run
/// use yamlrewrite::config::Config;
/// use yamlrewrite::file::loader::load_yaml_file;
///
/// let documents = load_yaml_file("deployment.yaml", &Config::default()).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - The file cannot be read (missing, permissions, etc.)
/// - The file is gzipped but corrupted
/// - The contents are not valid YAML
pub fn load_yaml_file<P: AsRef<Path>>(path: P, config: &Config) -> Result<Arc<Documents>> {
    let path = path.as_ref();

    let content = if is_gzipped(path) {
        read_gzipped_file(path)?
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?
    };
    debug!(path = %path.display(), bytes = content.len(), "loaded file");

    let documents = load_yaml_str(&content, config)
        .with_context(|| format!("Failed to load YAML from {}", path.display()))?;
    let markers = documents.markers().with(Marker::Provenance {
        source: path.to_path_buf(),
    });
    Ok(Arc::new(documents.with_markers(markers)))
}

/// Parses YAML text, validating it first when `config.validate_input` is set.
pub fn load_yaml_str(content: &str, config: &Config) -> Result<Documents> {
    if config.validate_input {
        validate_yaml(content)?;
    }
    parse_yaml(content).context("Failed to parse YAML")
}

/// Loads and parses YAML from standard input.
///
/// Input starting with the gzip magic bytes is decompressed first.
///
/// # Examples
///
/// ```no_run
/// use yamlrewrite::config::Config;
/// use yamlrewrite::file::loader::load_yaml_from_stdin;
///
/// // Usage: cat deployment.yaml | yamlrewrite change-value --key-path kind --value Job
/// let documents = load_yaml_from_stdin(&Config::default()).unwrap();
/// ```
pub fn load_yaml_from_stdin(config: &Config) -> Result<Arc<Documents>> {
    let mut buffer = Vec::new();
    io::stdin()
        .read_to_end(&mut buffer)
        .context("Failed to read from stdin")?;

    let content = decode_bytes(buffer)?;
    let documents = load_yaml_str(&content, config).context("Failed to load YAML from stdin")?;
    Ok(Arc::new(documents))
}

/// Checks `content` with the strict reference parser.
pub fn validate_yaml(content: &str) -> Result<()> {
    yaml_rust2::YamlLoader::load_from_str(content).context("Input is not valid YAML")?;
    Ok(())
}

/// Turns raw bytes into text, decompressing gzip data (magic bytes 0x1f 0x8b).
fn decode_bytes(buffer: Vec<u8>) -> Result<String> {
    if buffer.starts_with(&[0x1f, 0x8b]) {
        decompress_gzip_bytes(&buffer)
    } else {
        String::from_utf8(buffer).context("Invalid UTF-8 in input")
    }
}

fn is_gzipped(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext == "gz")
        .unwrap_or(false)
}

/// Reads and decompresses a gzipped file.
fn read_gzipped_file(path: &Path) -> Result<String> {
    let file = fs::File::open(path)
        .with_context(|| format!("Failed to open gzipped file: {}", path.display()))?;
    let mut decoder = GzDecoder::new(file);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped file - file may be corrupted")?;
    Ok(content)
}

fn decompress_gzip_bytes(bytes: &[u8]) -> Result<String> {
    let mut decoder = GzDecoder::new(bytes);
    let mut content = String::new();
    decoder
        .read_to_string(&mut content)
        .context("Failed to decompress gzipped input")?;
    Ok(content)
}
