//! Batch conversion of a markdown tree into a mirrored HTML tree.

use anyhow::{Context, Result, bail};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::assets::{CSS_DIR, STYLESHEETS, copy_dir, write_css_assets};
use crate::fixer::{FixOptions, FixReport, fix_links};
use crate::markdown::MarkdownRenderer;
use crate::page::page_wrapper;
use crate::path::{depth, output_path, root_prefix};

/// Default syntect theme for code block colors.
pub const DEFAULT_THEME: &str = "InspiredGitHub";

/// Inputs of a documentation build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Root of the markdown source tree
    pub source: PathBuf,
    /// Root of the generated HTML tree
    pub output: PathBuf,
    /// Directory copied verbatim below the output root
    pub assets: Option<PathBuf>,
    /// Syntect theme name for highlight.css
    pub theme: String,
    /// Run the link fixing pass after conversion
    pub fix_links: bool,
    pub fix: FixOptions,
}

impl BuildOptions {
    pub fn new(source: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            output: output.into(),
            assets: None,
            theme: DEFAULT_THEME.to_string(),
            fix_links: true,
            fix: FixOptions::default(),
        }
    }
}

/// Outcome of a documentation build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Generated pages, relative to the output root
    pub pages: Vec<PathBuf>,
    /// Source documents that could not be converted
    pub failed: Vec<PathBuf>,
    /// Markers rewritten into links across all pages
    pub cross_references: usize,
    pub assets_copied: usize,
    /// Present when the link fixing pass ran
    pub fix: Option<FixReport>,
}

/// Converts every markdown file below the source root into HTML.
///
/// Output mirrors the source layout with `.html` extensions. Bundled
/// stylesheets and the optional assets directory are written next to the
/// pages, then the link fixing pass runs over the whole output tree.
///
/// A document that cannot be read or rendered is reported and skipped.
///
/// # Errors
///
/// Returns error if the source root is missing, the output tree cannot be
/// written, or the link fixing pass fails
pub fn build(options: &BuildOptions) -> Result<BuildSummary> {
    if !options.source.is_dir() {
        bail!(
            "Source directory does not exist: {}",
            options.source.display()
        );
    }

    fs::create_dir_all(&options.output).with_context(|| {
        format!(
            "Failed to create output directory {}",
            options.output.display()
        )
    })?;

    write_css_assets(&options.output, &options.theme).context("Failed to write stylesheets")?;

    let renderer = MarkdownRenderer::with_doc_links();
    let mut summary = BuildSummary::default();

    for source_relative in find_markdown_files(&options.source, &options.output)? {
        match convert(&renderer, options, &source_relative) {
            Ok((page, cross_references)) => {
                println!("Generated: {}", options.output.join(&page).display());
                summary.cross_references += cross_references;
                summary.pages.push(page);
            }
            Err(e) => {
                eprintln!(
                    "Warning: Failed to convert {}: {:#}",
                    source_relative.display(),
                    e
                );
                summary.failed.push(source_relative);
            }
        }
    }

    if let Some(assets) = &options.assets {
        let name = assets
            .file_name()
            .with_context(|| format!("Assets path has no name: {}", assets.display()))?;
        let destination = options.output.join(name);
        summary.assets_copied = copy_dir(assets, &destination)
            .with_context(|| format!("Failed to copy assets from {}", assets.display()))?;
        println!(
            "Copied {} assets to {}",
            summary.assets_copied,
            destination.display()
        );
    }

    if options.fix_links {
        let report = fix_links(&options.output, &options.fix).context("Failed to fix links")?;
        summary.fix = Some(report);
    }

    Ok(summary)
}

/// Renders one source document and writes its page.
///
/// # Returns
///
/// Output path relative to the output root and number of rewritten markers
fn convert(
    renderer: &MarkdownRenderer<'_>,
    options: &BuildOptions,
    source_relative: &Path,
) -> Result<(PathBuf, usize)> {
    let document = renderer.render_file(options.source.join(source_relative))?;
    let page = output_path(source_relative);

    let title = document.title.unwrap_or_else(|| {
        source_relative
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    });

    let prefix = root_prefix(depth(&page));
    let stylesheets: Vec<String> = STYLESHEETS
        .iter()
        .map(|name| format!("{}{}/{}", prefix, CSS_DIR, name))
        .collect();

    let html = page_wrapper(&title, &stylesheets, &document.html);

    let destination = options.output.join(&page);
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&destination, html.into_string())
        .with_context(|| format!("Failed to write {}", destination.display()))?;

    Ok((page, document.cross_references))
}

/// Lists markdown files below a root, relative to it, in sorted order.
///
/// Hidden entries and the output directory are skipped so a build into
/// `docs/dist` never reads its own output.
fn find_markdown_files(source: &Path, output: &Path) -> Result<Vec<PathBuf>> {
    let output = output.canonicalize().ok();
    let mut files = Vec::new();

    let walker = WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || (!is_hidden(entry) && !is_output(entry, output.as_deref()))
        });

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", source.display()))?;
        if !entry.file_type().is_file() || !is_markdown(entry.path()) {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(source)
            .context("Markdown file outside source root")?;
        files.push(relative.to_path_buf());
    }

    Ok(files)
}

fn is_markdown(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext == "md" || ext == "markdown")
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

fn is_output(entry: &DirEntry, output: Option<&Path>) -> bool {
    let Some(output) = output else {
        return false;
    };
    entry.file_type().is_dir() && entry.path().canonicalize().is_ok_and(|path| path == output)
}
