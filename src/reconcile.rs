//! File-status reconciliation for the dashboard: compares the filenames an
//! active chemical list requires against what actually sits in a customer's
//! upload staging directory.

use std::collections::BTreeSet;
use std::path::Path;

use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::StoreError;
use crate::models::CustomerConfig;
use crate::store::CustomerStore;

/// Result of reconciling one customer, with both file sets sorted.
#[derive(Debug, Clone, Serialize)]
pub struct FileStatus {
    pub slug: String,
    /// Referenced by an active chemical but absent from staging.
    pub missing: Vec<String>,
    /// Staged but referenced by no active chemical.
    pub orphaned: Vec<String>,
    pub required: usize,
    pub staged: usize,
    pub complete: bool,
}

/// Filenames every active chemical requires, deduplicated.
fn required_files(config: &CustomerConfig) -> BTreeSet<String> {
    config
        .active_chemicals()
        .flat_map(|c| c.documents())
        .map(|(_, doc)| doc.filename.clone())
        .filter(|f| !f.is_empty())
        .collect()
}

/// Plain files in the staging directory. A directory that does not exist yet
/// means zero files, not an error.
fn staged_files(dir: &Path) -> BTreeSet<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return BTreeSet::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect()
}

/// Pure read: compute missing/orphaned/complete for one customer.
pub fn reconcile(staging_dir: &Path, config: &CustomerConfig) -> FileStatus {
    let required = required_files(config);
    let staged = staged_files(staging_dir);

    let missing: Vec<String> = required.difference(&staged).cloned().collect();
    let orphaned: Vec<String> = staged.difference(&required).cloned().collect();
    FileStatus {
        slug: config.slug().to_string(),
        complete: missing.is_empty(),
        required: required.len(),
        staged: staged.len(),
        missing,
        orphaned,
    }
}

/// Reconcile every stored customer, for the dashboard aggregate report.
pub fn reconcile_all(
    config: &AppConfig,
    store: &CustomerStore,
) -> Result<Vec<FileStatus>, StoreError> {
    Ok(store
        .load_all()?
        .iter()
        .map(|customer| reconcile(&config.uploads_dir(customer.slug()), customer))
        .collect())
}
