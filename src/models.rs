//! Customer configuration data model.
//!
//! Mirrors the on-disk JSON layout: one document per customer with four
//! top-level sections (`customer_info`, `chemicals`, `site_settings`,
//! `deployment`). Field names here are the wire names — the dashboard and
//! the CLI both read and write these files directly.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Maximum length of a derived slug or chemical id.
pub const SLUG_MAX_LEN: usize = 40;

/// Convert a display name to a URL-safe slug, limited to `max_len` characters.
///
/// Keeps ASCII alphanumerics (lowercased), collapses every other run of
/// characters to a single hyphen, and trims leading/trailing hyphens. The
/// result contains only `[a-z0-9-]`, so byte truncation is safe. Derivation
/// is deterministic: the same name always yields the same slug.
pub fn slugify(name: &str, max_len: usize) -> String {
    let mut slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.len() > max_len {
        slug.truncate(max_len);
        slug = slug.trim_end_matches('-').to_string();
    }
    slug
}

/// Derive the stable id for a chemical from its display name.
pub fn chemical_id(name: &str) -> String {
    slugify(name, SLUG_MAX_LEN)
}

/// Derive the repository name for a customer slug.
pub fn repository_name(slug: &str) -> String {
    format!("{}-ghs-binder", slug)
}

// ── Customer document ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerConfig {
    pub customer_info: CustomerInfo,
    #[serde(default)]
    pub chemicals: Vec<ChemicalRecord>,
    pub site_settings: SiteSettings,
    pub deployment: DeploymentInfo,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub slug: String,
    pub contact: ContactInfo,
    pub branding: Branding,
    pub repository: RepositoryInfo,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub emergency_phone: String,
    #[serde(default)]
    pub address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branding {
    /// Local path of the logo asset, relative to the customer asset folder.
    #[serde(default)]
    pub logo: Option<String>,
    pub primary_color: String,
    pub secondary_color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub name: String,
    /// Public URL of the published site.
    pub url: String,
    #[serde(default)]
    pub custom_domain: Option<String>,
}

/// One of the two document slots every chemical carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub filename: String,
    /// Path relative to the site root, e.g. `pdfs/acetone_sds.pdf`.
    pub url: String,
    pub title: String,
}

impl DocumentRef {
    pub fn pdf(filename: &str, title: String) -> Self {
        Self {
            filename: filename.to_string(),
            url: format!("pdfs/{}", filename),
            title,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChemicalRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub hazards: String,
    pub literature: DocumentRef,
    pub sds: DocumentRef,
    #[serde(default)]
    pub supplier: String,
    pub last_updated: NaiveDate,
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deactivated_date: Option<NaiveDate>,
}

impl ChemicalRecord {
    /// The two document slots as `(slot name, reference)` pairs, in upload order.
    pub fn documents(&self) -> [(&'static str, &DocumentRef); 2] {
        [("literature", &self.literature), ("sds", &self.sds)]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteSettings {
    pub last_updated: NaiveDate,
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    pub complete_binder: DocumentRef,
    #[serde(default)]
    pub analytics_enabled: bool,
    pub seo: SeoSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeoSettings {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentStatus {
    Created,
    Deployed,
    Failed,
}

impl DeploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Deployed => "deployed",
            Self::Failed => "failed",
        }
    }
}

impl FromStr for DeploymentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(Self::Created),
            "deployed" => Ok(Self::Deployed),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid deployment status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentInfo {
    pub status: DeploymentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_deployed: Option<DateTime<Utc>>,
    pub version: String,
    pub auto_update: bool,
}

impl CustomerConfig {
    pub fn slug(&self) -> &str {
        &self.customer_info.slug
    }

    /// Chemicals published on the site — the `active` ones, in list order.
    pub fn active_chemicals(&self) -> impl Iterator<Item = &ChemicalRecord> {
        self.chemicals.iter().filter(|c| c.active)
    }

    pub fn active_count(&self) -> usize {
        self.active_chemicals().count()
    }

    pub fn find_chemical(&self, id: &str) -> Option<&ChemicalRecord> {
        self.chemicals.iter().find(|c| c.id == id)
    }

    pub fn find_chemical_mut(&mut self, id: &str) -> Option<&mut ChemicalRecord> {
        self.chemicals.iter_mut().find(|c| c.id == id)
    }

    /// Public URL of the published site: the custom domain when one is
    /// configured (scheme added when absent), else the stored Pages URL.
    pub fn site_url(&self) -> String {
        match self.customer_info.repository.custom_domain.as_deref() {
            Some(domain) if !domain.is_empty() => {
                if domain.starts_with("http://") || domain.starts_with("https://") {
                    domain.trim_end_matches('/').to_string()
                } else {
                    format!("https://{}", domain.trim_end_matches('/'))
                }
            }
            _ => self
                .customer_info
                .repository
                .url
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

// ── Creation input ────────────────────────────────────────────────────

/// Input for creating a customer; everything not listed gets a default.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(default)]
    pub emergency_phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
    #[serde(default)]
    pub custom_domain: Option<String>,
}

pub const DEFAULT_PRIMARY_COLOR: &str = "#1b5e20";
pub const DEFAULT_SECONDARY_COLOR: &str = "#43a047";
pub const INITIAL_SITE_VERSION: &str = "1.0.0";

impl NewCustomer {
    /// Build the initial config document. `owner` is the GitHub account the
    /// repository will live under; it determines the default Pages URL.
    pub fn into_config(self, owner: &str) -> CustomerConfig {
        let slug = slugify(&self.name, SLUG_MAX_LEN);
        let repo_name = repository_name(&slug);
        let today = Utc::now().date_naive();
        CustomerConfig {
            customer_info: CustomerInfo {
                name: self.name.clone(),
                slug: slug.clone(),
                contact: ContactInfo {
                    phone: self.phone,
                    email: self.email,
                    emergency_phone: self.emergency_phone.unwrap_or_default(),
                    address: self.address.unwrap_or_default(),
                },
                branding: Branding {
                    logo: self.logo,
                    primary_color: self
                        .primary_color
                        .unwrap_or_else(|| DEFAULT_PRIMARY_COLOR.to_string()),
                    secondary_color: self
                        .secondary_color
                        .unwrap_or_else(|| DEFAULT_SECONDARY_COLOR.to_string()),
                },
                repository: RepositoryInfo {
                    name: repo_name.clone(),
                    url: format!("https://{}.github.io/{}", owner, repo_name),
                    custom_domain: self.custom_domain,
                },
            },
            chemicals: Vec::new(),
            site_settings: SiteSettings {
                last_updated: today,
                generated_at: None,
                complete_binder: DocumentRef::pdf(
                    &format!("{}_complete_binder.pdf", slug),
                    format!("{} - Complete GHS Binder", self.name),
                ),
                analytics_enabled: false,
                seo: SeoSettings {
                    title: format!("{} - GHS Safety Binder", self.name),
                    description: format!(
                        "Safety Data Sheets and product literature for {}",
                        self.name
                    ),
                },
            },
            deployment: DeploymentInfo {
                status: DeploymentStatus::Created,
                created_at: Utc::now(),
                last_deployed: None,
                version: INITIAL_SITE_VERSION.to_string(),
                auto_update: true,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── slugify / chemical_id ────────────────────────────────────────

    #[test]
    fn slugify_lowercases_and_hyphenates() {
        assert_eq!(slugify("Acme Chemical Co.", 40), "acme-chemical-co");
    }

    #[test]
    fn slugify_collapses_punctuation_runs() {
        assert_eq!(slugify("Sodium Hydroxide (50% w/w)", 40), "sodium-hydroxide-50-w-w");
    }

    #[test]
    fn slugify_strips_non_ascii() {
        assert_eq!(slugify("Crème Brûlée Cleaner", 40), "cr-me-br-l-e-cleaner");
    }

    #[test]
    fn slugify_truncates_without_trailing_hyphen() {
        let out = slugify("aaaa bbbb cccc dddd eeee", 9);
        assert_eq!(out, "aaaa-bbbb");
        assert!(!out.ends_with('-'));
    }

    #[test]
    fn chemical_id_is_stable() {
        let a = chemical_id("Isopropyl Alcohol 70%");
        let b = chemical_id("Isopropyl Alcohol 70%");
        assert_eq!(a, b);
        assert_eq!(a, "isopropyl-alcohol-70");
    }

    #[test]
    fn chemical_id_is_lowercase_alnum_hyphen_only() {
        for name in ["Hydrochloric Acid!", "  D-Limonene  ", "№ 5 дegreaser", "A_B.C"] {
            let id = chemical_id(name);
            assert!(
                id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'),
                "unexpected char in id {:?} for {:?}",
                id,
                name
            );
            assert!(!id.starts_with('-') && !id.ends_with('-'));
        }
    }

    #[test]
    fn repository_name_appends_suffix() {
        assert_eq!(repository_name("acme-labs"), "acme-labs-ghs-binder");
    }

    // ── document refs and config helpers ─────────────────────────────

    #[test]
    fn document_ref_pdf_builds_relative_url() {
        let doc = DocumentRef::pdf("acetone_sds.pdf", "Acetone SDS".into());
        assert_eq!(doc.url, "pdfs/acetone_sds.pdf");
        assert_eq!(doc.filename, "acetone_sds.pdf");
    }

    fn sample_config() -> CustomerConfig {
        NewCustomer {
            name: "Acme Labs".into(),
            phone: "555-0100".into(),
            email: "safety@acme.test".into(),
            ..Default::default()
        }
        .into_config("acme-safety")
    }

    #[test]
    fn new_customer_derives_slug_repo_and_url() {
        let config = sample_config();
        assert_eq!(config.customer_info.slug, "acme-labs");
        assert_eq!(config.customer_info.repository.name, "acme-labs-ghs-binder");
        assert_eq!(
            config.customer_info.repository.url,
            "https://acme-safety.github.io/acme-labs-ghs-binder"
        );
        assert_eq!(config.deployment.status, DeploymentStatus::Created);
        assert!(config.deployment.last_deployed.is_none());
        assert_eq!(config.deployment.version, "1.0.0");
        assert!(config.chemicals.is_empty());
    }

    #[test]
    fn site_url_prefers_custom_domain() {
        let mut config = sample_config();
        config.customer_info.repository.custom_domain = Some("safety.acme.example".into());
        assert_eq!(config.site_url(), "https://safety.acme.example");

        config.customer_info.repository.custom_domain =
            Some("http://127.0.0.1:4170/".into());
        assert_eq!(config.site_url(), "http://127.0.0.1:4170");
    }

    #[test]
    fn site_url_falls_back_to_pages_url() {
        let config = sample_config();
        assert_eq!(
            config.site_url(),
            "https://acme-safety.github.io/acme-labs-ghs-binder"
        );
    }

    #[test]
    fn active_chemicals_filters_inactive() {
        let mut config = sample_config();
        let today = Utc::now().date_naive();
        for (name, active) in [("Acetone", true), ("Toluene", false), ("Ethanol", true)] {
            config.chemicals.push(ChemicalRecord {
                id: chemical_id(name),
                name: name.into(),
                description: String::new(),
                hazards: String::new(),
                literature: DocumentRef::pdf("lit.pdf", "lit".into()),
                sds: DocumentRef::pdf("sds.pdf", "sds".into()),
                supplier: String::new(),
                last_updated: today,
                active,
                deactivated_date: None,
            });
        }
        assert_eq!(config.active_count(), 2);
        assert!(config.find_chemical("toluene").is_some());
        assert!(config.active_chemicals().all(|c| c.name != "Toluene"));
    }

    // ── serde wire format ────────────────────────────────────────────

    #[test]
    fn deployment_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&DeploymentStatus::Deployed).unwrap(),
            "\"deployed\""
        );
        let status: DeploymentStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, DeploymentStatus::Failed);
        assert_eq!(DeploymentStatus::from_str("created").unwrap(), DeploymentStatus::Created);
        assert!(DeploymentStatus::from_str("destroyed").is_err());
    }

    #[test]
    fn customer_config_round_trips() {
        let config = sample_config();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: CustomerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.customer_info.slug, config.customer_info.slug);
        assert_eq!(back.deployment.status, config.deployment.status);
        assert_eq!(back.site_settings.seo.title, config.site_settings.seo.title);
    }

    #[test]
    fn chemical_record_parses_spec_shaped_json() {
        let json = r#"{
            "id": "acetone",
            "name": "Acetone",
            "description": "Solvent",
            "hazards": "Highly flammable liquid and vapour.",
            "literature": {"filename": "acetone_lit.pdf", "url": "pdfs/acetone_lit.pdf", "title": "Acetone Literature"},
            "sds": {"filename": "acetone_sds.pdf", "url": "pdfs/acetone_sds.pdf", "title": "Acetone SDS"},
            "supplier": "Acme Supply",
            "last_updated": "2026-03-14",
            "active": true
        }"#;
        let record: ChemicalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "acetone");
        assert_eq!(record.last_updated, NaiveDate::from_ymd_opt(2026, 3, 14).unwrap());
        assert!(record.deactivated_date.is_none());
        // deactivated_date is omitted from output while unset
        let out = serde_json::to_string(&record).unwrap();
        assert!(!out.contains("deactivated_date"));
    }

    #[test]
    fn deactivated_date_survives_round_trip() {
        let mut record: ChemicalRecord = serde_json::from_str(
            r#"{
                "id": "toluene", "name": "Toluene",
                "literature": {"filename": "a.pdf", "url": "pdfs/a.pdf", "title": "t"},
                "sds": {"filename": "b.pdf", "url": "pdfs/b.pdf", "title": "t"},
                "last_updated": "2026-01-01", "active": true
            }"#,
        )
        .unwrap();
        record.active = false;
        record.deactivated_date = NaiveDate::from_ymd_opt(2026, 2, 2);
        let json = serde_json::to_string(&record).unwrap();
        let back: ChemicalRecord = serde_json::from_str(&json).unwrap();
        assert!(!back.active);
        assert_eq!(back.deactivated_date, NaiveDate::from_ymd_opt(2026, 2, 2));
    }
}
