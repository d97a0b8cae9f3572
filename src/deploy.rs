//! The deployment pipeline: config in, published GitHub Pages site out.
//!
//! Steps run strictly in sequence; one upload after another keeps log order
//! deterministic and stays friendly to the API's rate limits. Nothing is
//! rolled back on failure — every upload is create-or-update, so re-running
//! the whole pipeline is the recovery path.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use walkdir::WalkDir;

use crate::config::AppConfig;
use crate::errors::DeployError;
use crate::github::{GithubClient, Repository};
use crate::models::{CustomerConfig, DeploymentStatus};
use crate::render;

/// URLs to encode as QR codes for the binder station. Image rendering is out
/// of scope; these are the targets.
#[derive(Debug, Clone, Serialize)]
pub struct QrTargets {
    pub site: String,
    pub mobile: String,
    pub emergency: String,
}

impl QrTargets {
    pub fn for_site(site_url: &str) -> Self {
        Self {
            site: site_url.to_string(),
            mobile: format!("{}?view=mobile", site_url),
            emergency: format!("{}?view=emergency", site_url),
        }
    }
}

/// What a successful deployment produced.
#[derive(Debug, Serialize)]
pub struct DeployReport {
    pub repository: Repository,
    pub site_url: String,
    pub qr: QrTargets,
    pub deployed_at: DateTime<Utc>,
    pub version: String,
    pub chemical_count: usize,
    /// Remote paths written this run.
    pub uploaded: Vec<String>,
    /// Documents skipped because no source PDF was found (non-fatal).
    pub skipped: Vec<String>,
}

pub struct Deployer {
    github: GithubClient,
    /// Plain client for verification HEADs against the published site.
    http: reqwest::Client,
    config: AppConfig,
}

impl Deployer {
    pub fn new(github: GithubClient, config: AppConfig) -> Self {
        Self {
            github,
            http: reqwest::Client::new(),
            config,
        }
    }

    pub fn github(&self) -> &GithubClient {
        &self.github
    }

    /// Run the full pipeline for one customer. On success the config is
    /// stamped deployed (status, `last_deployed`, `generated_at`); on any
    /// failure it is stamped failed before the error propagates. Persisting
    /// the stamped config is the caller's job.
    pub async fn deploy(&self, customer: &mut CustomerConfig) -> Result<DeployReport, DeployError> {
        let result = self.run_pipeline(customer).await;
        match &result {
            Ok(report) => {
                customer.deployment.status = DeploymentStatus::Deployed;
                customer.deployment.last_deployed = Some(report.deployed_at);
                customer.site_settings.generated_at = Some(report.deployed_at);
            }
            Err(e) => {
                tracing::error!(slug = customer.slug(), error = %e, "Deployment failed");
                customer.deployment.status = DeploymentStatus::Failed;
            }
        }
        result
    }

    async fn run_pipeline(&self, customer: &CustomerConfig) -> Result<DeployReport, DeployError> {
        let slug = customer.slug().to_string();
        let deployed_at = Utc::now();
        let mut uploaded: Vec<String> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();

        // 1. create the repository, or reuse it when it already exists
        let repo_name = &customer.customer_info.repository.name;
        let description = format!("GHS safety binder for {}", customer.customer_info.name);
        let site_url = customer.site_url();
        tracing::info!(slug = %slug, repo = %repo_name, "Creating repository");
        let repo = self
            .github
            .create_repository(repo_name, &description, &site_url)
            .await?;

        // 2. publish to whatever branch Pages actually serves from
        let branch = self
            .github
            .detect_pages_branch(&repo.name, &repo.default_branch)
            .await;
        tracing::info!(branch = %branch, "Publishing");

        // 3. render the site and README up front, before touching the remote
        let template = render::load_template(render::SITE_TEMPLATE)?;
        let html = render::render_site(&template, customer, deployed_at)?;
        let readme = render::render_readme(customer);

        // 4. site skeleton: .nojekyll keeps Pages from running the PDFs
        // through Jekyll, .gitkeep markers make the directories exist
        self.github
            .upload_text(&repo.name, ".nojekyll", "", "Disable Jekyll processing", &branch)
            .await?;
        uploaded.push(".nojekyll".to_string());
        for dir in ["pdfs", "assets", "qr-codes"] {
            let path = format!("{}/.gitkeep", dir);
            self.github
                .upload_text(&repo.name, &path, "", "Keep directory", &branch)
                .await?;
            uploaded.push(path);
        }

        // 5. page and README
        self.github
            .upload_text(&repo.name, "index.html", &html, "Publish binder site", &branch)
            .await?;
        uploaded.push("index.html".to_string());
        self.github
            .upload_text(&repo.name, "README.md", &readme, "Update README", &branch)
            .await?;
        uploaded.push("README.md".to_string());

        // 6. brand assets, nested paths preserved; no directory, no step
        let assets_dir = self.config.assets_dir(&slug);
        if assets_dir.is_dir() {
            for entry in WalkDir::new(&assets_dir).sort_by_file_name() {
                let entry = entry.map_err(|e| {
                    let path = e.path().map(PathBuf::from).unwrap_or_else(|| assets_dir.clone());
                    DeployError::LocalFile {
                        path,
                        source: e.into(),
                    }
                })?;
                if !entry.file_type().is_file() {
                    continue;
                }
                let rel = entry
                    .path()
                    .strip_prefix(&assets_dir)
                    .unwrap_or(entry.path())
                    .to_string_lossy()
                    .replace('\\', "/");
                let bytes = std::fs::read(entry.path()).map_err(|source| DeployError::LocalFile {
                    path: entry.path().to_path_buf(),
                    source,
                })?;
                let remote = format!("assets/{}", rel);
                self.github
                    .upload_binary(&repo.name, &remote, &bytes, "Upload brand asset", &branch)
                    .await?;
                uploaded.push(remote);
            }
        } else {
            tracing::debug!(slug = %slug, "No asset directory, skipping brand assets");
        }

        // 7. chemical documents, one by one; a missing source PDF is a
        // warning and a skip, never an abort
        let mut documents: Vec<String> = Vec::new();
        for chemical in customer.active_chemicals() {
            for (slot, doc) in chemical.documents() {
                if doc.filename.is_empty() {
                    tracing::warn!(chemical = %chemical.name, slot, "No filename configured, skipping");
                    skipped.push(format!("{} ({})", chemical.name, slot));
                    continue;
                }
                let Some(path) = self.locate_pdf(&slug, &doc.filename) else {
                    tracing::warn!(chemical = %chemical.name, file = %doc.filename, "Source PDF not found, skipping");
                    skipped.push(doc.filename.clone());
                    continue;
                };
                let bytes = std::fs::read(&path).map_err(|source| DeployError::LocalFile {
                    path: path.clone(),
                    source,
                })?;
                let remote = format!("pdfs/{}", doc.filename);
                let message = format!("Upload {} for {}", slot, chemical.name);
                self.github
                    .upload_binary(&repo.name, &remote, &bytes, &message, &branch)
                    .await?;
                uploaded.push(remote);
                documents.push(doc.url.clone());
            }
        }

        // 8. turn on Pages
        self.github.enable_pages(&repo.name, &branch).await?;

        // 9. let the CDN settle before checking anything
        let settle = self.config.deploy.settle_secs;
        if settle > 0 {
            tracing::info!(seconds = settle, "Waiting for Pages to settle");
            tokio::time::sleep(Duration::from_secs(settle)).await;
        }

        // 10. verify every uploaded document is actually being served
        for doc_path in &documents {
            let url = format!("{}/{}", site_url, doc_path);
            self.verify_document(&url).await?;
        }

        // 11-12. QR targets and the report
        let qr = QrTargets::for_site(&site_url);
        tracing::info!(slug = %slug, site = %site_url, uploads = uploaded.len(), "Deployment complete");
        Ok(DeployReport {
            repository: repo,
            site_url,
            qr,
            deployed_at,
            version: customer.deployment.version.clone(),
            chemical_count: customer.active_count(),
            uploaded,
            skipped,
        })
    }

    /// Find a source PDF by filename: the shared pool first, then the
    /// customer's upload staging area.
    fn locate_pdf(&self, slug: &str, filename: &str) -> Option<PathBuf> {
        let pooled = self.config.pdf_dir().join(filename);
        if pooled.is_file() {
            return Some(pooled);
        }
        let staged = self.config.uploads_dir(slug).join(filename);
        staged.is_file().then_some(staged)
    }

    /// HEAD one published document: success status, a PDF content type, and
    /// a plausible size, or the deployment fails naming this URL.
    async fn verify_document(&self, url: &str) -> Result<(), DeployError> {
        let fail = |reason: String| DeployError::Verification {
            url: url.to_string(),
            reason,
        };
        let resp = self
            .http
            .head(url)
            .send()
            .await
            .map_err(|e| fail(format!("request failed: {}", e)))?;
        let status = resp.status();
        if !status.is_success() {
            return Err(fail(format!("status {}", status)));
        }
        let content_type = resp
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        if !content_type.to_lowercase().contains("pdf") {
            // Pages serves an HTML 404/placeholder page with status 200 in
            // some propagation states; the content type catches that
            return Err(fail(format!("content type '{}' is not a PDF", content_type)));
        }
        let length = resp
            .headers()
            .get(reqwest::header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok());
        match length {
            None => Err(fail("no content length reported".to_string())),
            Some(n) if n < self.config.deploy.min_pdf_bytes => {
                Err(fail(format!("implausibly small at {} bytes", n)))
            }
            _ => {
                tracing::debug!(url, "Verified");
                Ok(())
            }
        }
    }
}
