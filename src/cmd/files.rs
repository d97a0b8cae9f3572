//! PDF reconciliation report — `bindery files [<slug>]`.

use anyhow::Result;
use console::style;

use bindery::config::AppConfig;
use bindery::reconcile;
use bindery::store::CustomerStore;

pub fn cmd_files(config: &AppConfig, slug: Option<&str>) -> Result<()> {
    let store = CustomerStore::new(config.customers_dir());
    let statuses = match slug {
        Some(slug) => {
            let customer = store.load(slug)?;
            vec![reconcile::reconcile(&config.uploads_dir(slug), &customer)]
        }
        None => reconcile::reconcile_all(config, &store)?,
    };

    println!();
    if statuses.is_empty() {
        println!("No customers yet.");
        println!();
        return Ok(());
    }

    let mut incomplete = 0;
    for status in &statuses {
        let mark = if status.complete {
            style("✓").green()
        } else {
            incomplete += 1;
            style("✗").red()
        };
        println!(
            "{} {}  {} required, {} staged",
            mark,
            style(&status.slug).bold(),
            status.required,
            status.staged
        );
        for file in &status.missing {
            println!("    {} {}", style("missing: ").red(), file);
        }
        for file in &status.orphaned {
            println!("    {} {}", style("orphaned:").yellow(), file);
        }
    }
    println!();
    if incomplete == 0 {
        println!("All customers have their PDFs staged.");
    } else {
        println!(
            "{} of {} customers missing files. Stage them in {} or the dashboard.",
            incomplete,
            statuses.len(),
            config.pdf_dir().display()
        );
    }
    println!();
    Ok(())
}
