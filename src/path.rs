//! Path utilities for the mirrored output tree.
//!
//! Every path handled here is relative to a tree root (source or output)
//! and manipulated lexically; nothing touches the filesystem.

use std::path::{Component, Path, PathBuf};

/// Maps a source relative markdown path to its output page path.
///
/// Directory structure is preserved and the extension becomes `.html`,
/// so `guide/Intro.md` becomes `guide/Intro.html`.
pub fn output_path(source_relative: &Path) -> PathBuf {
    source_relative.with_extension("html")
}

/// Number of directories between the tree root and a root relative file.
///
/// # Arguments
///
/// * `file`: File path relative to the tree root
///
/// # Returns
///
/// Number of `../` steps needed to reach the root from the file's directory
pub fn depth(file: &Path) -> usize {
    file.parent()
        .map(|dir| {
            dir.components()
                .filter(|c| matches!(c, Component::Normal(_)))
                .count()
        })
        .unwrap_or(0)
}

/// Prefix leading from a file at `depth` back to the tree root.
pub fn root_prefix(depth: usize) -> String {
    "../".repeat(depth)
}

/// Resolves `.` and `..` components without touching the filesystem.
///
/// Root and prefix components are dropped, so the result is always
/// relative.
///
/// # Returns
///
/// Normalized path, or None if the path climbs above its starting point
pub fn normalize(path: &Path) -> Option<PathBuf> {
    let mut components = Vec::new();

    for component in path.components() {
        match component {
            Component::Normal(c) => components.push(c),
            Component::ParentDir => {
                components.pop()?;
            }
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }

    Some(components.iter().collect())
}

/// Relative URL path from a directory to a file, both relative to the same root.
///
/// Components are joined with `/` regardless of platform.
///
/// # Arguments
///
/// * `from_dir`: Directory of the referring page
/// * `target`: Referenced file
///
/// # Examples
///
/// ```
/// use docxref::relative_href;
/// use std::path::Path;
///
/// let href = relative_href(Path::new("HTML"), Path::new("Assets/logo@2x.png"));
/// assert_eq!(href, "../Assets/logo@2x.png");
/// ```
pub fn relative_href(from_dir: &Path, target: &Path) -> String {
    let from: Vec<_> = normal_components(from_dir);
    let to: Vec<_> = normal_components(target);

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut parts: Vec<String> = Vec::with_capacity(from.len() - common + to.len() - common);
    parts.extend(std::iter::repeat_n("..".to_string(), from.len() - common));
    parts.extend(to[common..].iter().map(|c| c.to_string_lossy().into_owned()));

    parts.join("/")
}

fn normal_components(path: &Path) -> Vec<&std::ffi::OsStr> {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(c) => Some(c),
            _ => None,
        })
        .collect()
}
