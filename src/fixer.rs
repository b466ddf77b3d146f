//! Post-processing pass over a generated HTML tree.
//!
//! Links produced while rendering are relative to the page that contains
//! them and assume the target sits next to it. Once the whole output tree
//! exists, this pass looks every local link up on disk, falling back to a
//! file name index, and rewrites it to the correct relative path. It can
//! also point bare image names at an assets directory and clean up the
//! landing page of a documentation set.

mod cleanup;
mod dom;
mod index;

pub use cleanup::clean_landing_page;
pub use index::HtmlIndex;

use anyhow::{Context, Result};
use percent_encoding::{AsciiSet, CONTROLS, percent_decode_str, utf8_percent_encode};
use std::fs;
use std::path::{Path, PathBuf};

use crate::path::{normalize, relative_href};
use cleanup::clean_document;

/// Suffix appended to image stems by default, matching retina exports.
pub const DEFAULT_IMAGE_SUFFIX: &str = "@2x.png";

/// Characters escaped in rewritten hrefs.
const HREF_ESCAPE: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Redirects bare image file names into an assets directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRule {
    /// Assets directory relative to the output root
    pub dir: PathBuf,
    /// Replaces the original extension (`logo.jpg` becomes `logo@2x.png`)
    pub suffix: String,
}

impl ImageRule {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            suffix: DEFAULT_IMAGE_SUFFIX.to_string(),
        }
    }
}

/// Options for the link fixing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixOptions {
    /// Rewrite bare `<img src>` names when set
    pub images: Option<ImageRule>,
    /// File name of the page that receives landing page cleanup
    pub cleanup_page: Option<String>,
}

/// Local link whose target could not be located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingTarget {
    /// Page containing the link, relative to the root
    pub page: PathBuf,
    pub href: String,
}

/// Outcome of a link fixing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FixReport {
    pub files_scanned: usize,
    pub files_updated: usize,
    pub links_updated: usize,
    pub images_updated: usize,
    pub cleanup_edits: usize,
    pub missing: Vec<MissingTarget>,
}

/// Repairs links in every HTML file below a root directory.
///
/// # Arguments
///
/// * `root`: Output tree root
/// * `options`: Image and cleanup rules
///
/// # Returns
///
/// Report of scanned and updated files
///
/// # Errors
///
/// Returns error if the root cannot be resolved or a page cannot be read or written
pub fn fix_links(root: &Path, options: &FixOptions) -> Result<FixReport> {
    let root = root
        .canonicalize()
        .with_context(|| format!("Failed to resolve output root {}", root.display()))?;

    println!("Building HTML index for {}", root.display());
    let index = HtmlIndex::build(&root).context("Failed to index HTML files")?;
    println!("Indexed {} HTML files", index.len());

    let fixer = LinkFixer {
        root: &root,
        index: &index,
        options,
    };

    let mut report = FixReport::default();
    for page in index.files() {
        fixer
            .fix_page(page, &mut report)
            .with_context(|| format!("Failed to fix links in {}", page.display()))?;
    }

    Ok(report)
}

/// Decision for a single href.
#[derive(Debug, PartialEq, Eq)]
enum HrefFix {
    Keep,
    Replace(String),
    Missing,
}

struct LinkFixer<'a> {
    root: &'a Path,
    index: &'a HtmlIndex,
    options: &'a FixOptions,
}

impl LinkFixer<'_> {
    fn fix_page(&self, page: &Path, report: &mut FixReport) -> Result<()> {
        let full_path = self.root.join(page);
        let content = fs::read_to_string(&full_path)
            .with_context(|| format!("Failed to read {}", full_path.display()))?;
        let page_dir = page.parent().unwrap_or_else(|| Path::new(""));
        report.files_scanned += 1;

        let document = dom::parse_html(&content);

        let mut links = 0;
        for anchor in dom::find_elements(&document, "a") {
            let Some(href) = dom::attribute(&anchor, "href") else {
                continue;
            };

            match self.resolve_href(page_dir, &href) {
                HrefFix::Keep => {}
                HrefFix::Replace(new_href) => {
                    println!(
                        "In {}: updating link '{}' -> '{}'",
                        page.display(),
                        href,
                        new_href
                    );
                    dom::set_attribute(&anchor, "href", &new_href);
                    links += 1;
                }
                HrefFix::Missing => {
                    eprintln!(
                        "Warning: In {}: target not found for link '{}'",
                        page.display(),
                        href
                    );
                    report.missing.push(MissingTarget {
                        page: page.to_path_buf(),
                        href,
                    });
                }
            }
        }

        let mut images = 0;
        for image in dom::find_elements(&document, "img") {
            let Some(src) = dom::attribute(&image, "src") else {
                continue;
            };
            let Some(new_src) = self.resolve_image(page_dir, &src) else {
                continue;
            };

            println!(
                "In {}: updating img src '{}' -> '{}'",
                page.display(),
                src,
                new_src
            );
            dom::set_attribute(&image, "src", &new_src);
            images += 1;
        }

        let mut cleanup_edits = 0;
        if self.is_cleanup_page(page) {
            cleanup_edits = clean_document(&document);
            if cleanup_edits > 0 {
                println!(
                    "In {}: applied {} cleanup edits",
                    page.display(),
                    cleanup_edits
                );
            }
        }

        report.links_updated += links;
        report.images_updated += images;
        report.cleanup_edits += cleanup_edits;

        // Untouched pages keep their original bytes
        if links + images + cleanup_edits > 0 {
            let html = dom::serialize_html(&document)?;
            fs::write(&full_path, html)
                .with_context(|| format!("Failed to write {}", full_path.display()))?;
            report.files_updated += 1;
            println!("Updated file: {}", page.display());
        }

        Ok(())
    }

    /// Decides the replacement for an anchor href.
    ///
    /// In-page anchors and external URLs are kept. Fragments and queries are
    /// carried over to the rewritten href.
    fn resolve_href(&self, page_dir: &Path, href: &str) -> HrefFix {
        if href.is_empty() || href.starts_with('#') || is_external(href) {
            return HrefFix::Keep;
        }

        let split = href.find(['#', '?']).unwrap_or(href.len());
        let (path_part, suffix) = href.split_at(split);
        if path_part.is_empty() {
            return HrefFix::Keep;
        }

        let decoded = percent_decode_str(path_part).decode_utf8_lossy();

        let Some(target) = self.find_target(page_dir, &decoded) else {
            return HrefFix::Missing;
        };

        let relative = relative_href(page_dir, &target);
        let new_href = format!("{}{}", utf8_percent_encode(&relative, HREF_ESCAPE), suffix);

        if new_href == href {
            HrefFix::Keep
        } else {
            HrefFix::Replace(new_href)
        }
    }

    /// Locates a link target, returning its path relative to the root.
    ///
    /// Tries the path relative to the page, then relative to the root, then
    /// the file name index. Candidates outside the root are ignored.
    fn find_target(&self, page_dir: &Path, link: &str) -> Option<PathBuf> {
        let root_relative = link.trim_start_matches('/');

        if !link.starts_with('/')
            && let Some(candidate) = normalize(&page_dir.join(root_relative))
            && self.root.join(&candidate).is_file()
        {
            return Some(candidate);
        }

        if let Some(candidate) = normalize(Path::new(root_relative))
            && self.root.join(&candidate).is_file()
        {
            return Some(candidate);
        }

        let name = Path::new(root_relative).file_name()?.to_str()?;
        match self.index.lookup(name) {
            [] => None,
            [only] => Some(only.clone()),
            candidates @ [first, ..] => {
                let listed: Vec<_> = candidates.iter().map(|p| p.display().to_string()).collect();
                eprintln!(
                    "Warning: multiple targets found for {}: [{}]. Using the first one.",
                    name,
                    listed.join(", ")
                );
                Some(first.clone())
            }
        }
    }

    /// Replacement for a bare image file name, when an image rule is set.
    fn resolve_image(&self, page_dir: &Path, src: &str) -> Option<String> {
        let rule = self.options.images.as_ref()?;

        if src.is_empty() || src.contains('/') || is_external(src) {
            return None;
        }

        let stem = Path::new(src).file_stem()?.to_str()?;
        let target = rule.dir.join(format!("{}{}", stem, rule.suffix));
        let new_src = relative_href(page_dir, &target);

        (new_src != src).then_some(new_src)
    }

    fn is_cleanup_page(&self, page: &Path) -> bool {
        match (&self.options.cleanup_page, page.file_name()) {
            (Some(wanted), Some(name)) => name == wanted.as_str(),
            _ => false,
        }
    }
}

/// Whether a link leaves the local tree.
///
/// Any URI scheme (`https:`, `mailto:`, `tel:`, `data:`) or a network path
/// (`//host/...`) counts as external.
fn is_external(link: &str) -> bool {
    link.starts_with("//") || has_scheme(link)
}

/// Scheme per RFC 3986: a letter, then letters, digits, `+`, `-` or `.`,
/// terminated by `:`.
fn has_scheme(link: &str) -> bool {
    let Some((scheme, _)) = link.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}
