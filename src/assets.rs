//! Stylesheets and static asset copying

use anyhow::{Context, Result, bail};
use std::{fs, path::Path};
use syntect::highlighting::ThemeSet;
use syntect::html::{ClassStyle, css_for_theme_with_class_style};
use walkdir::WalkDir;

use crate::markdown::HIGHLIGHT_PREFIX;

const DOCS: &str = include_str!("../assets/docs.css");

/// Directory below the output root holding bundled stylesheets.
pub const CSS_DIR: &str = "css";

/// Stylesheets every page links, relative to [`CSS_DIR`].
pub const STYLESHEETS: &[&str] = &["docs.css", "highlight.css"];

/// Writes bundled stylesheets to the output directory.
///
/// `docs.css` is embedded in the binary; `highlight.css` is generated from
/// a syntect theme so it matches the classes emitted for code blocks.
///
/// # Errors
///
/// Returns error if the theme is unknown or a file cannot be written
pub fn write_css_assets(output: &Path, theme: &str) -> Result<()> {
    let css_dir = output.join(CSS_DIR);
    fs::create_dir_all(&css_dir)
        .with_context(|| format!("Failed to create {}", css_dir.display()))?;

    write_asset(&css_dir, "docs.css", DOCS)?;
    write_asset(&css_dir, "highlight.css", &highlight_css(theme)?)?;
    Ok(())
}

/// Generates CSS for highlighted code blocks from a bundled syntect theme.
///
/// # Errors
///
/// Returns error if no bundled theme has the given name
pub fn highlight_css(theme: &str) -> Result<String> {
    let themes = ThemeSet::load_defaults();
    let Some(theme_data) = themes.themes.get(theme) else {
        let names: Vec<_> = themes.themes.keys().map(String::as_str).collect();
        bail!(
            "Unknown syntax theme '{}' (available: {})",
            theme,
            names.join(", ")
        );
    };

    css_for_theme_with_class_style(
        theme_data,
        ClassStyle::SpacedPrefixed {
            prefix: HIGHLIGHT_PREFIX,
        },
    )
    .with_context(|| format!("Failed to generate CSS for theme {}", theme))
}

/// Recursively copies a directory.
///
/// # Returns
///
/// Number of files copied
///
/// # Errors
///
/// Returns error if the source cannot be walked or a file cannot be copied
pub fn copy_dir(source: &Path, destination: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in WalkDir::new(source).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("Failed to walk assets in {}", source.display()))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .context("Asset path outside assets directory")?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create {}", target.display()))?;
        } else {
            fs::copy(entry.path(), &target).with_context(|| {
                format!(
                    "Failed to copy {} to {}",
                    entry.path().display(),
                    target.display()
                )
            })?;
            copied += 1;
        }
    }

    Ok(copied)
}

fn write_asset(dir: &Path, name: &str, content: &str) -> Result<()> {
    fs::write(dir.join(name), content)
        .with_context(|| format!("Failed to write CSS asset: {}", name))?;
    Ok(())
}
