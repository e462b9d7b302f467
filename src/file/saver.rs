//! YAML file saving functionality.
//!
//! This module provides functions to write rewritten trees to files with
//! atomic write operations and optional backup creation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::Deserialize;
use tracing::debug;

use crate::config::Config;
use crate::document::node::Documents;
use crate::document::printer::print_yaml;

/// Saves a YAML stream to a file with optional backup creation.
///
/// The tree is printed losslessly, checked to still be valid YAML when
/// `config.validate_output` is set, and written atomically (to a temp file
/// that is then renamed). Targets ending in `.gz` are gzip-compressed.
///
/// # Examples
///
/// ```no_run
/// use yamlrewrite::config::Config;
/// use yamlrewrite::document::parser::parse_yaml;
/// use yamlrewrite::file::saver::save_yaml_file;
///
/// let documents = parse_yaml("kind: Deployment\n").unwrap();
/// save_yaml_file("output.yaml", &documents, &Config::default()).unwrap();
/// ```
///
/// # Errors
///
/// This function will return an error if:
/// - Backup creation fails (if requested)
/// - The printed output is not valid YAML
/// - Writing to the temp file or renaming it fails
pub fn save_yaml_file<P: AsRef<Path>>(path: P, documents: &Documents, config: &Config) -> Result<()> {
    let path = path.as_ref();
    let should_compress = path.to_string_lossy().ends_with(".gz");

    let yaml = print_yaml(documents);
    if config.validate_output {
        validate_output(&yaml)?;
    }

    if config.create_backup && path.exists() {
        let backup = create_backup(path)?;
        debug!(backup = %backup.display(), "created backup");
    }

    write_file_atomic(path, yaml.as_bytes(), should_compress)?;
    debug!(path = %path.display(), bytes = yaml.len(), "saved file");

    Ok(())
}

/// Checks that printed output deserializes, document by document.
pub fn validate_output(yaml: &str) -> Result<()> {
    for (index, document) in serde_yaml::Deserializer::from_str(yaml).enumerate() {
        serde_yaml::Value::deserialize(document).with_context(|| {
            format!(
                "Generated invalid YAML in document {} - refusing to write it",
                index + 1
            )
        })?;
    }
    Ok(())
}

/// Creates a backup of a file by copying it with a .bak extension.
fn create_backup(path: &Path) -> Result<PathBuf> {
    let backup_path = sibling_path(path, "bak")?;
    fs::copy(path, &backup_path).context("Failed to create backup")?;
    Ok(backup_path)
}

/// `dir/name.ext` -> `dir/name.ext.<suffix>`
fn sibling_path(path: &Path, suffix: &str) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid file name: {}", path.display()))?;
    Ok(path.with_file_name(format!("{}.{}", name, suffix)))
}

/// Writes data to a file atomically, optionally compressing with gzip.
fn write_file_atomic(path: &Path, data: &[u8], compress: bool) -> Result<()> {
    let temp_path = sibling_path(path, "tmp")?;

    if compress {
        let file = fs::File::create(&temp_path).context("Failed to create temp file")?;
        let mut encoder = GzEncoder::new(file, Compression::default());
        encoder
            .write_all(data)
            .context("Failed to write compressed data")?;
        encoder.finish().context("Failed to finish compression")?;
    } else {
        fs::write(&temp_path, data).context("Failed to write temp file")?;
    }

    fs::rename(&temp_path, path).context("Failed to rename temp file")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sibling_path() {
        let path = sibling_path(Path::new("/tmp/app.yaml"), "bak").unwrap();
        assert_eq!(path, PathBuf::from("/tmp/app.yaml.bak"));
    }

    #[test]
    fn test_validate_output_accepts_multiple_documents() {
        assert!(validate_output("a: 1\n---\nb: [1, 2]\n").is_ok());
        assert!(validate_output("").is_ok());
    }

    #[test]
    fn test_validate_output_rejects_broken_yaml() {
        assert!(validate_output("a: [1, 2\n").is_err());
    }
}
