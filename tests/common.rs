//! Shared test utilities for integration tests.
//!
//! Provides helpers for laying out temporary documentation source trees and
//! reading generated pages back.

#![allow(dead_code)]

use anyhow::{Context, Result};
use std::path::Path;
use tempfile::TempDir;

/// Creates a temporary source tree with the given files.
///
/// # Arguments
///
/// * `files`: Pairs of relative path and file content
///
/// # Errors
///
/// Returns error if directory creation or a file write fails
pub fn create_source_tree(files: &[(&str, &str)]) -> Result<TempDir> {
    let dir = TempDir::new()?;
    for (path, content) in files {
        write_file(dir.path(), path, content)?;
    }
    Ok(dir)
}

/// Writes file below a root, creating parent directories as needed.
///
/// # Errors
///
/// Returns error if directory creation or file write fails
pub fn write_file(root: &Path, path: &str, content: &str) -> Result<()> {
    let file_path = root.join(path);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(file_path, content)?;
    Ok(())
}

/// Reads a generated file relative to an output root.
///
/// # Errors
///
/// Returns error if the file does not exist or is not UTF8
pub fn read_output(root: &Path, path: &str) -> Result<String> {
    let full = root.join(path);
    std::fs::read_to_string(&full).with_context(|| format!("Missing output {}", full.display()))
}
