//! End-to-end tests for the docxref binary.

mod common;

use anyhow::Result;
use std::process::Command;
use tempfile::TempDir;

fn docxref() -> Command {
    Command::new(env!("CARGO_BIN_EXE_docxref"))
}

/// Tests the build subcommand generates pages and fixes links.
#[test]
fn test_build_command_e2e() -> Result<()> {
    // Arrange
    let source = common::create_source_tree(&[
        ("index.md", "# Home\n\nSee <doc:Reference>.\n"),
        ("api/Reference.md", "# Reference\n"),
    ])?;
    let output = TempDir::new()?;

    // Act
    let result = docxref()
        .arg("build")
        .arg(source.path())
        .arg("-o")
        .arg(output.path())
        .output()?;

    // Assert
    assert!(
        result.status.success(),
        "Build should succeed: {}",
        String::from_utf8_lossy(&result.stderr)
    );
    let stdout = String::from_utf8_lossy(&result.stdout);
    assert!(stdout.contains("Generated 2 pages"), "{}", stdout);

    let index = common::read_output(output.path(), "index.html")?;
    assert!(
        index.contains("<a href=\"api/Reference.html\">Reference</a>"),
        "{}",
        index
    );
    Ok(())
}

/// Tests the fix-links subcommand on an existing tree.
#[test]
fn test_fix_links_command_e2e() -> Result<()> {
    // Arrange
    let root = common::create_source_tree(&[
        ("HTML/Landing.html", "<h3>Start</h3><a href=\"Topic.html\">t</a>"),
        ("HTML/topics/Topic.html", "<p>topic</p>"),
    ])?;

    // Act
    let result = docxref()
        .arg("fix-links")
        .arg(root.path())
        .args(["--cleanup-page", "Landing.html"])
        .output()?;

    // Assert
    assert!(result.status.success());
    let landing = common::read_output(root.path(), "HTML/Landing.html")?;
    assert!(
        landing.contains("<body><h2>Start</h2><a href=\"topics/Topic.html\">t</a></body>"),
        "{}",
        landing
    );
    Ok(())
}

/// Tests that a missing source directory is rejected.
#[test]
fn test_missing_source_fails_e2e() -> Result<()> {
    // Arrange
    let dir = TempDir::new()?;

    // Act
    let result = docxref()
        .arg("build")
        .arg(dir.path().join("missing"))
        .arg("-o")
        .arg(dir.path().join("out"))
        .output()?;

    // Assert
    assert!(!result.status.success());
    let stderr = String::from_utf8_lossy(&result.stderr);
    assert!(stderr.contains("Source directory does not exist"), "{}", stderr);
    Ok(())
}
