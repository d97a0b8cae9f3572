//! REST API for the dashboard. Thin handlers over the store, registry,
//! reconciler, and deployer; every response is the
//! `{"success": true, ...}` / `{"success": false, "error": ...}` envelope
//! except the checklist download, which is a file attachment.

use std::path::Path as FsPath;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::AppConfig;
use crate::deploy::{DeployReport, Deployer};
use crate::errors::{DeployError, GithubError, RegistryError, StoreError};
use crate::github::GithubClient;
use crate::models::{CustomerConfig, NewCustomer};
use crate::reconcile;
use crate::registry::{self, NewChemical};
use crate::store::CustomerStore;

// ── Shared application state ──────────────────────────────────────────

pub struct AppState {
    pub config: AppConfig,
    pub store: CustomerStore,
    pub deployer: Deployer,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(config: AppConfig, token: &str) -> Self {
        let github = GithubClient::new(&config.github.owner, token, &config.github.api_url);
        let store = CustomerStore::new(config.customers_dir());
        let deployer = Deployer::new(github, config.clone());
        Self {
            config,
            store,
            deployer,
        }
    }
}

// ── Error handling ────────────────────────────────────────────────────

pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(json!({"success": false, "error": message}))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::CustomerNotFound { .. } => ApiError::NotFound(e.to_string()),
            StoreError::AlreadyExists { .. } => ApiError::BadRequest(e.to_string()),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<RegistryError> for ApiError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Validation { .. } => ApiError::BadRequest(e.to_string()),
            RegistryError::ChemicalNotFound { .. } => ApiError::NotFound(e.to_string()),
            RegistryError::Store(inner) => inner.into(),
        }
    }
}

impl From<DeployError> for ApiError {
    fn from(e: DeployError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

/// Success envelope: `success: true` merged into the payload object.
fn ok(mut payload: Value) -> Json<Value> {
    if let Value::Object(map) = &mut payload {
        map.insert("success".to_string(), Value::Bool(true));
    }
    Json(payload)
}

// ── Router ────────────────────────────────────────────────────────────

pub fn api_router() -> Router<SharedState> {
    Router::new()
        .route("/api/customers", get(list_customers).post(create_customer))
        .route("/api/customers/{slug}", axum::routing::delete(delete_customer))
        .route(
            "/api/customers/{slug}/chemicals",
            get(list_chemicals).post(add_chemical),
        )
        .route(
            "/api/customers/{slug}/chemicals/{id}",
            axum::routing::delete(remove_chemical),
        )
        .route("/api/customers/{slug}/deploy", post(deploy_customer))
        .route("/api/customers/{slug}/checklist", get(download_checklist))
        .route("/api/customers/{slug}/files", get(list_files))
        .route(
            "/api/customers/{slug}/files/{filename}",
            put(upload_file).delete(delete_file),
        )
        .route("/api/files/status", get(files_status))
        .route("/health", get(health_check))
}

// ── Customer handlers ─────────────────────────────────────────────────

fn customer_summary(config: &CustomerConfig) -> Value {
    json!({
        "slug": config.slug(),
        "name": config.customer_info.name,
        "active_chemicals": config.active_count(),
        "total_chemicals": config.chemicals.len(),
        "status": config.deployment.status.as_str(),
        "last_deployed": config.deployment.last_deployed,
        "site_url": config.site_url(),
    })
}

async fn list_customers(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let customers: Vec<Value> = state
        .store
        .load_all()?
        .iter()
        .map(customer_summary)
        .collect();
    Ok(ok(json!({ "customers": customers })))
}

async fn create_customer(
    State(state): State<SharedState>,
    Json(new): Json<NewCustomer>,
) -> Result<impl IntoResponse, ApiError> {
    let mut problems = Vec::new();
    for (field, value) in [
        ("name", &new.name),
        ("phone", &new.phone),
        ("email", &new.email),
    ] {
        if value.trim().is_empty() {
            problems.push(format!("{} is required", field));
        }
    }
    if !problems.is_empty() {
        return Err(ApiError::BadRequest(problems.join("; ")));
    }

    let owner = state
        .config
        .require_owner()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let config = new.into_config(owner);
    state.store.create(&config)?;
    tracing::info!(slug = config.slug(), "Customer created");
    Ok((StatusCode::CREATED, ok(json!({ "customer": config }))))
}

async fn delete_customer(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let config = state.store.load(&slug)?;
    let repo = &config.customer_info.repository.name;
    match state.deployer.github().delete_repository(repo).await {
        Ok(()) => tracing::info!(slug = %slug, repo = %repo, "Deleted repository"),
        Err(GithubError::NotFound) => {
            tracing::warn!(slug = %slug, repo = %repo, "Repository already gone")
        }
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    }
    state.store.delete(&slug)?;
    Ok(ok(json!({ "deleted": slug })))
}

// ── Chemical handlers ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
struct ChemicalQuery {
    #[serde(default)]
    include_inactive: bool,
}

async fn list_chemicals(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Query(query): Query<ChemicalQuery>,
) -> Result<Json<Value>, ApiError> {
    let config = state.store.load(&slug)?;
    let listing = registry::list(&state.store, &slug, query.include_inactive)?;
    Ok(ok(json!({
        "customer": { "name": config.customer_info.name, "site_url": config.site_url() },
        "chemicals": listing.chemicals,
        "counts": listing.counts,
    })))
}

async fn add_chemical(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
    Json(new): Json<NewChemical>,
) -> Result<impl IntoResponse, ApiError> {
    let record = registry::add(&state.store, &slug, new)?;
    let report = redeploy(&state, &slug).await?;
    Ok((
        StatusCode::CREATED,
        ok(json!({ "chemical": record, "deployment": report })),
    ))
}

async fn remove_chemical(
    State(state): State<SharedState>,
    Path((slug, id)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let record = registry::remove(&state.store, &slug, &id)?;
    let report = redeploy(&state, &slug).await?;
    Ok(ok(json!({ "chemical": record, "deployment": report })))
}

/// Republish after a registry mutation. The mutation is already on disk, so
/// a failure here reports exactly that: saved, not published.
async fn redeploy(state: &SharedState, slug: &str) -> Result<DeployReport, ApiError> {
    let mut customer = state.store.load(slug)?;
    let result = state.deployer.deploy(&mut customer).await;
    state.store.save(&customer)?;
    result.map_err(|e| {
        ApiError::Internal(format!(
            "chemical change saved but redeployment failed: {}",
            e
        ))
    })
}

// ── Deployment handlers ───────────────────────────────────────────────

async fn deploy_customer(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let mut customer = state.store.load(&slug)?;
    let result = state.deployer.deploy(&mut customer).await;
    // persist the status stamp whether it says deployed or failed
    state.store.save(&customer)?;
    let report = result?;
    Ok(ok(json!({ "report": report })))
}

async fn download_checklist(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Response, ApiError> {
    let checklist = registry::generate_checklist(&state.store, &slug)?;
    let disposition = format!("attachment; filename=\"{}_checklist.md\"", slug);
    Ok((
        [
            (header::CONTENT_TYPE, "text/markdown; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        checklist,
    )
        .into_response())
}

// ── File handlers ─────────────────────────────────────────────────────

/// Upload names become filesystem paths; anything that could escape the
/// staging directory is rejected before it touches the disk.
fn checked_filename(filename: &str) -> Result<&str, ApiError> {
    if filename.is_empty()
        || filename.contains('/')
        || filename.contains('\\')
        || filename.contains("..")
    {
        return Err(ApiError::BadRequest(format!(
            "invalid filename '{}'",
            filename
        )));
    }
    if !filename.to_lowercase().ends_with(".pdf") {
        return Err(ApiError::BadRequest("filename must end in .pdf".to_string()));
    }
    Ok(filename)
}

fn staged_names(dir: &FsPath) -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

async fn list_files(
    State(state): State<SharedState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let config = state.store.load(&slug)?;
    let staging = state.config.uploads_dir(&slug);
    let status = reconcile::reconcile(&staging, &config);
    Ok(ok(json!({
        "files": staged_names(&staging),
        "status": status,
    })))
}

async fn upload_file(
    State(state): State<SharedState>,
    Path((slug, filename)): Path<(String, String)>,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    let filename = checked_filename(&filename)?;
    if !state.store.exists(&slug) {
        return Err(ApiError::NotFound(format!("Customer '{}' not found", slug)));
    }
    let staging = state.config.uploads_dir(&slug);
    std::fs::create_dir_all(&staging)
        .map_err(|e| ApiError::Internal(format!("Failed to create staging directory: {}", e)))?;
    let path = staging.join(filename);
    std::fs::write(&path, &body)
        .map_err(|e| ApiError::Internal(format!("Failed to write {}: {}", path.display(), e)))?;
    tracing::info!(slug = %slug, file = %filename, bytes = body.len(), "Staged upload");
    Ok(ok(json!({ "file": filename, "bytes": body.len() })))
}

async fn delete_file(
    State(state): State<SharedState>,
    Path((slug, filename)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let filename = checked_filename(&filename)?;
    if !state.store.exists(&slug) {
        return Err(ApiError::NotFound(format!("Customer '{}' not found", slug)));
    }
    let path = state.config.uploads_dir(&slug).join(filename);
    if !path.is_file() {
        return Err(ApiError::NotFound(format!("File '{}' not staged", filename)));
    }
    std::fs::remove_file(&path)
        .map_err(|e| ApiError::Internal(format!("Failed to delete {}: {}", path.display(), e)))?;
    Ok(ok(json!({ "deleted": filename })))
}

async fn files_status(State(state): State<SharedState>) -> Result<Json<Value>, ApiError> {
    let statuses = reconcile::reconcile_all(&state.config, &state.store)?;
    Ok(ok(json!({ "customers": statuses })))
}

// ── Health ────────────────────────────────────────────────────────────

async fn health_check() -> Json<Value> {
    ok(json!({ "status": "ok" }))
}
