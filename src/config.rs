//! Command line configuration.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::fixer::{DEFAULT_IMAGE_SUFFIX, FixOptions, ImageRule};
use crate::site::{BuildOptions, DEFAULT_THEME};

/// Command line configuration for docxref.
#[derive(Debug, Clone, Parser)]
#[command(name = "docxref", version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Convert a markdown tree to HTML and fix links in the output
    Build(BuildArgs),
    /// Fix links in an existing HTML tree
    FixLinks(FixLinksArgs),
}

#[derive(Debug, Clone, Args)]
pub struct BuildArgs {
    /// Markdown source directory
    #[arg(default_value = ".")]
    pub source: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = "dist")]
    pub output: PathBuf,

    /// Assets directory copied into the output
    #[arg(long)]
    pub assets: Option<PathBuf>,

    /// Syntax highlighting theme (InspiredGitHub, base16-ocean.light, etc.)
    #[arg(long, default_value = DEFAULT_THEME)]
    pub theme: String,

    /// Skip the link fixing pass
    #[arg(long)]
    pub no_fix: bool,

    /// Open the generated documentation in a browser
    #[arg(long)]
    pub open: bool,

    #[command(flatten)]
    pub fix: FixArgs,
}

#[derive(Debug, Clone, Args)]
pub struct FixLinksArgs {
    /// Root of the HTML tree
    #[arg(default_value = ".")]
    pub root: PathBuf,

    #[command(flatten)]
    pub fix: FixArgs,
}

/// Options shared by both subcommands.
#[derive(Debug, Clone, Args)]
pub struct FixArgs {
    /// Rewrite bare image names to this directory (relative to the output root)
    #[arg(long)]
    pub image_dir: Option<PathBuf>,

    /// Suffix replacing the extension of rewritten image names
    #[arg(long, default_value = DEFAULT_IMAGE_SUFFIX)]
    pub image_suffix: String,

    /// File name of the landing page to clean up
    #[arg(long)]
    pub cleanup_page: Option<String>,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if an input directory does not exist.
    pub fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Build(args) => {
                if !args.source.is_dir() {
                    bail!("Source directory does not exist: {}", args.source.display());
                }
                if let Some(assets) = &args.assets
                    && !assets.is_dir()
                {
                    bail!("Assets directory does not exist: {}", assets.display());
                }
            }
            Command::FixLinks(args) => {
                if !args.root.is_dir() {
                    bail!("HTML root does not exist: {}", args.root.display());
                }
            }
        }

        Ok(())
    }
}

impl BuildArgs {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            source: self.source.clone(),
            output: self.output.clone(),
            assets: self.assets.clone(),
            theme: self.theme.clone(),
            fix_links: !self.no_fix,
            fix: self.fix.fix_options(),
        }
    }
}

impl FixArgs {
    pub fn fix_options(&self) -> FixOptions {
        FixOptions {
            images: self.image_dir.as_ref().map(|dir| ImageRule {
                dir: dir.clone(),
                suffix: self.image_suffix.clone(),
            }),
            cleanup_page: self.cleanup_page.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Config {
        Config::try_parse_from(args).expect("Should parse arguments")
    }

    #[test]
    fn test_build_defaults() {
        // Act
        let config = parse(&["docxref", "build"]);

        // Assert
        let Command::Build(args) = config.command else {
            panic!("Expected build command");
        };
        let options = args.build_options();
        assert_eq!(options.source, PathBuf::from("."));
        assert_eq!(options.output, PathBuf::from("dist"));
        assert_eq!(options.theme, "InspiredGitHub");
        assert!(options.fix_links);
        assert_eq!(options.fix.images, None);
        assert!(!args.open);
    }

    #[test]
    fn test_build_with_fix_options() {
        // Act
        let config = parse(&[
            "docxref",
            "build",
            "Sources",
            "-o",
            "Output",
            "--assets",
            "Assets",
            "--image-dir",
            "Assets",
            "--cleanup-page",
            "The-Swift-Programming-Language.html",
            "--no-fix",
        ]);

        // Assert
        let Command::Build(args) = config.command else {
            panic!("Expected build command");
        };
        let options = args.build_options();
        assert_eq!(options.source, PathBuf::from("Sources"));
        assert_eq!(options.assets, Some(PathBuf::from("Assets")));
        assert!(!options.fix_links);
        assert_eq!(
            options.fix.images,
            Some(ImageRule {
                dir: PathBuf::from("Assets"),
                suffix: "@2x.png".to_string(),
            })
        );
        assert_eq!(
            options.fix.cleanup_page.as_deref(),
            Some("The-Swift-Programming-Language.html")
        );
    }

    #[test]
    fn test_fix_links_command() {
        // Act
        let config = parse(&["docxref", "fix-links", "out", "--image-dir", "img", "--image-suffix", ".png"]);

        // Assert
        let Command::FixLinks(args) = config.command else {
            panic!("Expected fix-links command");
        };
        assert_eq!(args.root, PathBuf::from("out"));
        assert_eq!(
            args.fix.fix_options().images,
            Some(ImageRule {
                dir: PathBuf::from("img"),
                suffix: ".png".to_string(),
            })
        );
    }

    #[test]
    fn test_validate_existing_path() {
        // Arrange
        let config = parse(&["docxref", "build", "."]);

        // Act
        let result = config.validate();

        // Assert
        assert!(result.is_ok(), "Current directory should be valid");
    }

    #[test]
    fn test_validate_missing_assets() {
        // Arrange
        let config = parse(&["docxref", "build", ".", "--assets", "no/such/assets"]);

        // Act
        let result = config.validate();

        // Assert
        let err = result.expect_err("Missing assets should fail").to_string();
        assert!(err.contains("Assets directory"), "{}", err);
    }

    #[test]
    fn test_validate_missing_html_root() {
        // Arrange
        let config = parse(&["docxref", "fix-links", "no/such/root"]);

        // Act & Assert
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_subcommand_rejected() {
        assert!(Config::try_parse_from(["docxref"]).is_err());
    }
}
