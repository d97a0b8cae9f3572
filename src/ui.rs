//! Terminal output helpers: styled status lines, the deploy spinner, and
//! the delete confirmation prompt.

use std::time::Duration;

use console::style;
use dialoguer::Confirm;
use indicatif::{ProgressBar, ProgressStyle};

use crate::deploy::DeployReport;

/// Spinner shown while a deployment pipeline runs.
pub fn deploy_spinner(slug: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner} {msg}")
            .expect("progress bar template is a valid static string"),
    );
    bar.set_message(format!("Deploying {}...", style(slug).cyan()));
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Human summary of a finished deployment.
pub fn print_report(report: &DeployReport) {
    println!();
    println!("{} Deployment complete", style("✓").green().bold());
    println!(
        "  {}       {}",
        style("Site:").dim(),
        style(&report.site_url).cyan().underlined()
    );
    println!(
        "  {}       {}",
        style("Repo:").dim(),
        report.repository.full_name
    );
    println!(
        "  {}    {} active chemicals, {} files uploaded",
        style("Content:").dim(),
        report.chemical_count,
        report.uploaded.len()
    );
    if !report.skipped.is_empty() {
        println!(
            "  {}    {}",
            style("Skipped:").dim(),
            style(report.skipped.join(", ")).yellow()
        );
    }
    println!("  {}  {}", style("QR mobile:").dim(), report.qr.mobile);
    println!(
        "  {}  {}",
        style("QR emerg.:").dim(),
        report.qr.emergency
    );
}

/// Ask before destroying a customer's repository and config.
pub fn confirm_delete(slug: &str) -> anyhow::Result<bool> {
    Ok(Confirm::new()
        .with_prompt(format!(
            "Delete {} (removes the GitHub repository and the local config)?",
            style(slug).red().bold()
        ))
        .default(false)
        .interact()?)
}
