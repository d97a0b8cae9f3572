//! Chemical registry operations: add, soft-remove, patch, list, checklist.
//!
//! Every mutation is a load-edit-save of the customer's JSON document and
//! nothing more. Redeployment is the caller's follow-up step, so these
//! functions stay testable without any network.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::errors::RegistryError;
use crate::models::{ChemicalRecord, DocumentRef, chemical_id};
use crate::store::CustomerStore;

/// Input for registering a chemical.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewChemical {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hazards: String,
    #[serde(default)]
    pub supplier: String,
    pub literature_file: String,
    pub sds_file: String,
}

/// Partial update for an existing chemical. Unknown fields are rejected so a
/// typo in the dashboard payload fails loudly instead of being dropped. The
/// `id` is fixed at creation and is deliberately not patchable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChemicalPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub hazards: Option<String>,
    pub supplier: Option<String>,
    pub literature_file: Option<String>,
    pub sds_file: Option<String>,
}

impl ChemicalPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.hazards.is_none()
            && self.supplier.is_none()
            && self.literature_file.is_none()
            && self.sds_file.is_none()
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct ChemicalCounts {
    pub active: usize,
    pub inactive: usize,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct ChemicalListing {
    pub chemicals: Vec<ChemicalRecord>,
    pub counts: ChemicalCounts,
}

fn literature_title(name: &str) -> String {
    format!("{} - Product Literature", name)
}

fn sds_title(name: &str) -> String {
    format!("{} - Safety Data Sheet", name)
}

fn check_pdf_name(label: &str, filename: &str, problems: &mut Vec<String>) {
    if filename.trim().is_empty() {
        problems.push(format!("{} filename is required", label));
    } else if !filename.to_lowercase().ends_with(".pdf") {
        problems.push(format!("{} filename must end in .pdf", label));
    }
}

/// All validation problems with a new chemical, empty when it is acceptable.
fn validate(new: &NewChemical) -> Vec<String> {
    let mut problems = Vec::new();
    if new.name.trim().is_empty() {
        problems.push("chemical name is required".to_string());
    }
    check_pdf_name("literature", &new.literature_file, &mut problems);
    check_pdf_name("SDS", &new.sds_file, &mut problems);
    problems
}

/// Register a chemical for `slug`. A record whose derived id already exists
/// (active or not) is updated in place and reactivated rather than
/// duplicated. Returns the stored record.
pub fn add(
    store: &CustomerStore,
    slug: &str,
    new: NewChemical,
) -> Result<ChemicalRecord, RegistryError> {
    let problems = validate(&new);
    if !problems.is_empty() {
        return Err(RegistryError::Validation { problems });
    }

    let mut config = store.load(slug)?;
    let id = chemical_id(&new.name);
    let today = Utc::now().date_naive();
    let record = ChemicalRecord {
        id: id.clone(),
        name: new.name.clone(),
        description: new.description,
        hazards: new.hazards,
        literature: DocumentRef::pdf(&new.literature_file, literature_title(&new.name)),
        sds: DocumentRef::pdf(&new.sds_file, sds_title(&new.name)),
        supplier: new.supplier,
        last_updated: today,
        active: true,
        deactivated_date: None,
    };

    match config.find_chemical_mut(&id) {
        Some(existing) => {
            tracing::info!(slug, id = %id, "Updating existing chemical in place");
            *existing = record.clone();
        }
        None => {
            tracing::info!(slug, id = %id, "Adding chemical");
            config.chemicals.push(record.clone());
        }
    }
    config.site_settings.last_updated = today;
    store.save(&config)?;
    Ok(record)
}

/// Soft-remove: the record stays in the document with `active=false` and a
/// deactivation date, so its history and PDFs remain traceable.
pub fn remove(
    store: &CustomerStore,
    slug: &str,
    id: &str,
) -> Result<ChemicalRecord, RegistryError> {
    let mut config = store.load(slug)?;
    let today = Utc::now().date_naive();
    let record = match config.find_chemical_mut(id) {
        Some(record) => {
            record.active = false;
            record.deactivated_date = Some(today);
            record.last_updated = today;
            record.clone()
        }
        None => return Err(RegistryError::ChemicalNotFound { id: id.to_string() }),
    };
    config.site_settings.last_updated = today;
    store.save(&config)?;
    tracing::info!(slug, id, "Deactivated chemical");
    Ok(record)
}

/// Apply a partial update to an existing chemical.
pub fn update(
    store: &CustomerStore,
    slug: &str,
    id: &str,
    patch: ChemicalPatch,
) -> Result<ChemicalRecord, RegistryError> {
    let mut problems = Vec::new();
    if let Some(name) = &patch.name {
        if name.trim().is_empty() {
            problems.push("chemical name is required".to_string());
        }
    }
    if let Some(file) = &patch.literature_file {
        check_pdf_name("literature", file, &mut problems);
    }
    if let Some(file) = &patch.sds_file {
        check_pdf_name("SDS", file, &mut problems);
    }
    if !problems.is_empty() {
        return Err(RegistryError::Validation { problems });
    }

    let mut config = store.load(slug)?;
    let today = Utc::now().date_naive();
    let record = match config.find_chemical_mut(id) {
        Some(record) => {
            if let Some(name) = patch.name {
                record.name = name;
                record.literature.title = literature_title(&record.name);
                record.sds.title = sds_title(&record.name);
            }
            if let Some(description) = patch.description {
                record.description = description;
            }
            if let Some(hazards) = patch.hazards {
                record.hazards = hazards;
            }
            if let Some(supplier) = patch.supplier {
                record.supplier = supplier;
            }
            if let Some(file) = patch.literature_file {
                record.literature = DocumentRef::pdf(&file, literature_title(&record.name));
            }
            if let Some(file) = patch.sds_file {
                record.sds = DocumentRef::pdf(&file, sds_title(&record.name));
            }
            record.last_updated = today;
            record.clone()
        }
        None => return Err(RegistryError::ChemicalNotFound { id: id.to_string() }),
    };
    config.site_settings.last_updated = today;
    store.save(&config)?;
    Ok(record)
}

/// Chemicals for `slug`, active-only unless `include_inactive`.
pub fn list(
    store: &CustomerStore,
    slug: &str,
    include_inactive: bool,
) -> Result<ChemicalListing, RegistryError> {
    let config = store.load(slug)?;
    let active = config.active_count();
    let total = config.chemicals.len();
    let chemicals = config
        .chemicals
        .into_iter()
        .filter(|c| include_inactive || c.active)
        .collect();
    Ok(ChemicalListing {
        chemicals,
        counts: ChemicalCounts {
            active,
            inactive: total - active,
            total,
        },
    })
}

/// Markdown checklist of every active chemical's two required PDFs, for
/// preparing source files by hand. Read-only.
pub fn generate_checklist(store: &CustomerStore, slug: &str) -> Result<String, RegistryError> {
    let config = store.load(slug)?;
    let today = Utc::now().date_naive();
    let mut out = String::new();
    out.push_str(&format!(
        "# PDF Checklist - {}\n\nGenerated {}. Place each file in the PDF source folder using the exact\nfilename shown.\n",
        config.customer_info.name, today
    ));
    let mut files = 0;
    for chemical in config.active_chemicals() {
        out.push_str(&format!("\n## {}\n", chemical.name));
        for (slot, doc) in chemical.documents() {
            out.push_str(&format!("- [ ] `{}` ({})\n", doc.filename, slot));
            files += 1;
        }
    }
    out.push_str(&format!(
        "\n{} active chemicals, {} files required.\n",
        config.active_count(),
        files
    ));
    Ok(out)
}
