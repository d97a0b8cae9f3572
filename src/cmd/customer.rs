//! Customer lifecycle commands — `bindery deploy|list|new|delete`.

use std::path::Path;

use anyhow::{Context, Result, bail};
use console::style;

use bindery::config::AppConfig;
use bindery::errors::GithubError;
use bindery::models::{DeploymentStatus, NewCustomer};
use bindery::store::CustomerStore;
use bindery::ui;

/// Run the full pipeline on an explicit config file. The file is written
/// back afterwards so the status stamp survives either outcome.
pub async fn cmd_deploy(config: &AppConfig, config_file: &Path) -> Result<()> {
    let deployer = super::build_deployer(config)?;
    let mut customer = CustomerStore::load_path(config_file)?;

    println!();
    println!(
        "Deploying {} ({})",
        style(&customer.customer_info.name).bold(),
        customer.slug()
    );
    let spinner = ui::deploy_spinner(customer.slug());
    let result = deployer.deploy(&mut customer).await;
    spinner.finish_and_clear();
    CustomerStore::save_path(config_file, &customer)?;

    let report = result?;
    ui::print_report(&report);
    Ok(())
}

/// Table of all registered customers.
pub fn cmd_list(config: &AppConfig) -> Result<()> {
    let store = CustomerStore::new(config.customers_dir());
    let customers = store.load_all()?;

    println!();
    if customers.is_empty() {
        println!("No customers yet. Run 'bindery new' to register one.");
        println!();
        return Ok(());
    }

    println!(
        "{:<24} {:<28} {:>9}  {:<10} {}",
        "SLUG", "NAME", "CHEMICALS", "STATUS", "LAST DEPLOYED"
    );
    for customer in &customers {
        let status = format!("{:<10}", customer.deployment.status.as_str());
        let status = match customer.deployment.status {
            DeploymentStatus::Deployed => style(status).green(),
            DeploymentStatus::Failed => style(status).red(),
            DeploymentStatus::Created => style(status).dim(),
        };
        let last = customer
            .deployment
            .last_deployed
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!(
            "{:<24} {:<28} {:>9}  {} {}",
            customer.slug(),
            customer.customer_info.name,
            customer.active_count(),
            status,
            last
        );
    }
    println!();
    println!("{} customers", customers.len());
    println!();
    Ok(())
}

/// Register a new customer config. Does not deploy; the binder goes live on
/// the first `deploy`.
pub fn cmd_new(config: &AppConfig, new: NewCustomer) -> Result<()> {
    for (field, value) in [
        ("name", &new.name),
        ("phone", &new.phone),
        ("email", &new.email),
    ] {
        if value.trim().is_empty() {
            bail!("--{} must not be empty", field);
        }
    }
    let owner = config.require_owner()?;
    let store = CustomerStore::new(config.customers_dir());
    let customer = new.into_config(owner);
    store.create(&customer)?;

    println!();
    println!(
        "{} Created {} ({})",
        style("✓").green().bold(),
        customer.customer_info.name,
        customer.slug()
    );
    println!("  Config: {}", store.path_for(customer.slug()).display());
    println!("  Site:   {} (after first deploy)", customer.site_url());
    println!();
    println!(
        "Next: bindery chem add {} --name <chemical> --literature <file.pdf> --sds <file.pdf>",
        customer.slug()
    );
    println!();
    Ok(())
}

/// Delete the GitHub repository and the local config. A repository that is
/// already gone is not an error; anything else aborts before the local file
/// is touched.
pub async fn cmd_delete(config: &AppConfig, slug: &str, force: bool) -> Result<()> {
    let store = CustomerStore::new(config.customers_dir());
    let customer = store.load(slug)?;

    if !force && !ui::confirm_delete(slug)? {
        println!("Aborted.");
        return Ok(());
    }

    let deployer = super::build_deployer(config)?;
    let repo = &customer.customer_info.repository.name;
    match deployer.github().delete_repository(repo).await {
        Ok(()) => println!("Deleted repository {}", repo),
        Err(GithubError::NotFound) => {
            println!("Repository {} already gone, removing local config", repo)
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to delete repository {}", repo));
        }
    }
    store.delete(slug)?;
    println!("{} Deleted {}", style("✓").green().bold(), slug);
    Ok(())
}
