//! Customer config persistence: one JSON document per customer under
//! `customers/`, named `<slug>.json`. The file on disk is the source of
//! truth; every mutation loads, edits, and saves the whole document.

use std::path::{Path, PathBuf};

use glob::glob;

use crate::config::TEMPLATE_FILE;
use crate::errors::StoreError;
use crate::models::CustomerConfig;

#[derive(Debug, Clone)]
pub struct CustomerStore {
    dir: PathBuf,
}

impl CustomerStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn path_for(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{}.json", slug))
    }

    pub fn exists(&self, slug: &str) -> bool {
        self.path_for(slug).is_file()
    }

    /// Load a customer by slug; `CustomerNotFound` when the file is absent.
    pub fn load(&self, slug: &str) -> Result<CustomerConfig, StoreError> {
        let path = self.path_for(slug);
        if !path.is_file() {
            return Err(StoreError::CustomerNotFound {
                slug: slug.to_string(),
            });
        }
        Self::load_path(&path)
    }

    /// Load a customer config from an explicit file path.
    pub fn load_path(path: &Path) -> Result<CustomerConfig, StoreError> {
        let raw = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the document back, creating `customers/` on first save.
    pub fn save(&self, config: &CustomerConfig) -> Result<(), StoreError> {
        Self::save_path(&self.path_for(config.slug()), config)
    }

    /// Write a customer config to an explicit file path, creating parent
    /// directories as needed. Used when deploying from a file outside the
    /// store directory.
    pub fn save_path(path: &Path, config: &CustomerConfig) -> Result<(), StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }
        // pretty-printed so the files stay hand-editable
        let mut json = serde_json::to_string_pretty(config).map_err(|source| StoreError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        json.push('\n');
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Register a new customer; fails if a config with the same slug exists.
    pub fn create(&self, config: &CustomerConfig) -> Result<(), StoreError> {
        if self.exists(config.slug()) {
            return Err(StoreError::AlreadyExists {
                slug: config.slug().to_string(),
            });
        }
        self.save(config)
    }

    /// Remove a customer's config file. The published repository is not
    /// touched here; that is the caller's decision.
    pub fn delete(&self, slug: &str) -> Result<(), StoreError> {
        let path = self.path_for(slug);
        if !path.is_file() {
            return Err(StoreError::CustomerNotFound {
                slug: slug.to_string(),
            });
        }
        std::fs::remove_file(&path).map_err(|source| StoreError::Io { path, source })
    }

    /// Slugs of all registered customers, sorted. The blank template file is
    /// skipped, as is anything that fails to parse (a warning is logged so a
    /// broken file does not hide the rest).
    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        let pattern = self.dir.join("*.json").to_string_lossy().to_string();
        let mut slugs = Vec::new();
        for entry in glob(&pattern).map_err(|e| StoreError::Io {
            path: self.dir.clone(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()),
        })? {
            let Ok(path) = entry else { continue };
            if path.file_name().is_some_and(|n| n == TEMPLATE_FILE) {
                continue;
            }
            match Self::load_path(&path) {
                Ok(config) => slugs.push(config.customer_info.slug),
                Err(e) => tracing::warn!("Skipping unreadable customer file: {}", e),
            }
        }
        slugs.sort();
        Ok(slugs)
    }

    /// Load every registered customer, sorted by slug.
    pub fn load_all(&self) -> Result<Vec<CustomerConfig>, StoreError> {
        let mut configs = self
            .list()?
            .into_iter()
            .map(|slug| self.load(&slug))
            .collect::<Result<Vec<_>, _>>()?;
        configs.sort_by(|a, b| a.customer_info.slug.cmp(&b.customer_info.slug));
        Ok(configs)
    }
}
