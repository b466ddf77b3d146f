use anyhow::{Context, Result};
use docxref::{BuildArgs, BuildSummary, Command, Config, FixLinksArgs, FixReport};
use std::path::Path;

fn main() -> Result<()> {
    let config = Config::parse();
    config.validate().context("Invalid configuration")?;

    match &config.command {
        Command::Build(args) => run_build(args),
        Command::FixLinks(args) => run_fix_links(args),
    }
}

fn run_build(args: &BuildArgs) -> Result<()> {
    let summary = docxref::build(&args.build_options()).context("Build failed")?;
    print_build_summary(&summary);

    if args.open {
        open_output(&args.output, &summary)?;
    }

    Ok(())
}

fn run_fix_links(args: &FixLinksArgs) -> Result<()> {
    let report = docxref::fix_links(&args.root, &args.fix.fix_options())
        .with_context(|| format!("Failed to fix links in {}", args.root.display()))?;
    print_fix_report(&report);
    Ok(())
}

fn print_build_summary(summary: &BuildSummary) {
    println!(
        "Generated {} pages ({} cross references)",
        summary.pages.len(),
        summary.cross_references
    );

    if !summary.failed.is_empty() {
        eprintln!(
            "Warning: {} documents could not be converted",
            summary.failed.len()
        );
    }

    if let Some(report) = &summary.fix {
        print_fix_report(report);
    }
}

fn print_fix_report(report: &FixReport) {
    println!(
        "Scanned {} HTML files, updated {} ({} links, {} images, {} cleanup edits)",
        report.files_scanned,
        report.files_updated,
        report.links_updated,
        report.images_updated,
        report.cleanup_edits
    );

    if !report.missing.is_empty() {
        eprintln!("Warning: {} links have no target", report.missing.len());
    }
}

/// Opens `index.html` if the build produced one, otherwise the first page.
fn open_output(output: &Path, summary: &BuildSummary) -> Result<()> {
    let index = output.join("index.html");
    let page = if index.exists() {
        index
    } else if let Some(first) = summary.pages.first() {
        output.join(first)
    } else {
        println!("Nothing to open: no pages generated");
        return Ok(());
    };

    open::that(&page).with_context(|| format!("Failed to open {}", page.display()))?;
    Ok(())
}
