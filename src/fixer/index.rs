//! Index of generated HTML pages by file name.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Maps HTML file names to every root relative path carrying that name.
///
/// Paths are collected in sorted walk order, so the first candidate for a
/// name is stable across runs.
#[derive(Debug, Default)]
pub struct HtmlIndex {
    files: Vec<PathBuf>,
    by_name: BTreeMap<String, Vec<PathBuf>>,
}

impl HtmlIndex {
    /// Walks a directory tree and indexes every `.html` file.
    ///
    /// The suffix check ignores case, so `Intro.HTML` is indexed too.
    ///
    /// # Errors
    ///
    /// Returns error if the tree cannot be walked
    pub fn build(root: &Path) -> Result<Self> {
        let mut index = Self::default();

        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
            if !entry.file_type().is_file() || !is_html(entry.path()) {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(root)
                .context("Indexed file outside root")?
                .to_path_buf();
            index.insert(relative);
        }

        Ok(index)
    }

    /// Every indexed file, relative to the root, in walk order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Candidates for a file name, first match first.
    pub fn lookup(&self, name: &str) -> &[PathBuf] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn insert(&mut self, relative: PathBuf) {
        if let Some(name) = relative.file_name() {
            self.by_name
                .entry(name.to_string_lossy().into_owned())
                .or_default()
                .push(relative.clone());
        }
        self.files.push(relative);
    }
}

fn is_html(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
}
