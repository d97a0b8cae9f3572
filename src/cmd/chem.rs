//! Chemical registry commands — `bindery chem`.
//!
//! Mutations save first, then redeploy (unless `--no-deploy`), so a failed
//! publish never loses the edit.

use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use bindery::config::AppConfig;
use bindery::registry::{self, ChemicalPatch, NewChemical};
use bindery::store::CustomerStore;
use bindery::ui;

pub async fn cmd_chem_add(
    config: &AppConfig,
    slug: &str,
    new: NewChemical,
    no_deploy: bool,
) -> Result<()> {
    let store = CustomerStore::new(config.customers_dir());
    let record = registry::add(&store, slug, new)?;

    println!();
    println!(
        "{} Added {} ({})",
        style("✓").green().bold(),
        record.name,
        record.id
    );
    for (slot, doc) in record.documents() {
        println!("  {:<12} {}", format!("{}:", slot), doc.filename);
    }
    redeploy(config, &store, slug, no_deploy).await
}

pub async fn cmd_chem_remove(
    config: &AppConfig,
    slug: &str,
    id: &str,
    no_deploy: bool,
) -> Result<()> {
    let store = CustomerStore::new(config.customers_dir());
    let record = registry::remove(&store, slug, id)?;

    println!();
    println!(
        "{} Deactivated {} ({})",
        style("✓").green().bold(),
        record.name,
        record.id
    );
    println!("  The record and its PDFs stay in the config for traceability.");
    redeploy(config, &store, slug, no_deploy).await
}

pub async fn cmd_chem_update(
    config: &AppConfig,
    slug: &str,
    id: &str,
    patch: ChemicalPatch,
    no_deploy: bool,
) -> Result<()> {
    if patch.is_empty() {
        bail!("Nothing to update; pass at least one field flag");
    }
    let store = CustomerStore::new(config.customers_dir());
    let record = registry::update(&store, slug, id, patch)?;

    println!();
    println!(
        "{} Updated {} ({})",
        style("✓").green().bold(),
        record.name,
        record.id
    );
    redeploy(config, &store, slug, no_deploy).await
}

pub fn cmd_chem_list(config: &AppConfig, slug: &str, all: bool) -> Result<()> {
    let store = CustomerStore::new(config.customers_dir());
    let listing = registry::list(&store, slug, all)?;

    println!();
    if listing.chemicals.is_empty() {
        println!("No chemicals registered for {}.", slug);
    } else {
        println!(
            "{:<24} {:<28} {:<7} {}",
            "ID", "NAME", "ACTIVE", "UPDATED"
        );
        for chemical in &listing.chemicals {
            let active = if chemical.active {
                style(format!("{:<7}", "yes")).green()
            } else {
                style(format!("{:<7}", "no")).dim()
            };
            println!(
                "{:<24} {:<28} {} {}",
                chemical.id, chemical.name, active, chemical.last_updated
            );
        }
    }
    println!();
    println!(
        "{} active, {} inactive, {} total",
        listing.counts.active, listing.counts.inactive, listing.counts.total
    );
    println!();
    Ok(())
}

pub fn cmd_chem_checklist(config: &AppConfig, slug: &str, output: Option<&Path>) -> Result<()> {
    let store = CustomerStore::new(config.customers_dir());
    let checklist = registry::generate_checklist(&store, slug)?;
    match output {
        Some(path) => {
            std::fs::write(path, &checklist)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!("Checklist written to {}", path.display());
        }
        None => print!("{}", checklist),
    }
    Ok(())
}

/// Republish after a mutation. The edit is already saved, so a deploy
/// failure leaves the site stale, not the data lost — say exactly that.
async fn redeploy(
    config: &AppConfig,
    store: &CustomerStore,
    slug: &str,
    no_deploy: bool,
) -> Result<()> {
    if no_deploy {
        println!(
            "{}",
            style("Saved without redeploying (--no-deploy); the change goes live on the next deploy.")
                .yellow()
        );
        return Ok(());
    }
    let deployer = super::build_deployer(config)?;
    let mut customer = store.load(slug)?;
    let spinner = ui::deploy_spinner(slug);
    let result = deployer.deploy(&mut customer).await;
    spinner.finish_and_clear();
    store.save(&customer)?;

    let report = result.context(
        "The change is saved, but redeployment failed; the published site is stale until the next successful deploy",
    )?;
    ui::print_report(&report);
    Ok(())
}
