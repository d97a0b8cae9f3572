use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// Name of the optional config file, looked up in the working directory.
pub const CONFIG_FILE: &str = "bindery.toml";

/// Customer file that ships as a blank template and is never listed.
pub const TEMPLATE_FILE: &str = "customer_template.json";

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_api_url() -> String {
    "https://api.github.com".to_string()
}

fn default_settle_secs() -> u64 {
    30
}

fn default_min_pdf_bytes() -> u64 {
    1024
}

/// On-disk layout of `bindery.toml`. The GitHub token deliberately has no
/// field here: it is read from the environment only.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    paths: FilePaths,
    #[serde(default)]
    github: FileGithub,
    #[serde(default)]
    deploy: FileDeploy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FilePaths {
    #[serde(default)]
    data_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileGithub {
    #[serde(default)]
    owner: Option<String>,
    #[serde(default)]
    api_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileDeploy {
    #[serde(default)]
    settle_secs: Option<u64>,
    #[serde(default)]
    min_pdf_bytes: Option<u64>,
}

/// Runtime configuration, resolved in order: defaults, `bindery.toml`,
/// environment, CLI flags. Later layers win.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Root of all local state; see the path helpers below.
    pub data_dir: PathBuf,
    pub github: GithubSettings,
    pub deploy: DeploySettings,
}

#[derive(Debug, Clone)]
pub struct GithubSettings {
    /// Account the binder repositories live under.
    pub owner: String,
    /// API base URL; overridable so tests can point at a local server.
    pub api_url: String,
    /// Personal access token, from `GITHUB_TOKEN` only.
    pub token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeploySettings {
    /// Seconds to wait before verifying a freshly published site.
    pub settle_secs: u64,
    /// Uploads smaller than this are treated as corrupt PDFs.
    pub min_pdf_bytes: u64,
}

impl AppConfig {
    /// Load configuration from the standard locations.
    pub fn load(config_file: Option<&Path>, data_dir_override: Option<PathBuf>) -> Result<Self> {
        Self::load_with(config_file, data_dir_override, |key| {
            std::env::var(key).ok()
        })
    }

    /// Like [`load`](Self::load) but with the environment lookup injected,
    /// so tests do not depend on the process environment.
    pub fn load_with(
        config_file: Option<&Path>,
        data_dir_override: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = match config_file {
            Some(path) => Some(Self::read_file(path)?),
            None => {
                let default = PathBuf::from(CONFIG_FILE);
                if default.exists() {
                    Some(Self::read_file(&default)?)
                } else {
                    None
                }
            }
        };
        let file = file.unwrap_or_default();

        let data_dir = data_dir_override
            .or_else(|| env("BINDERY_DATA_DIR").map(PathBuf::from))
            .or(file.paths.data_dir)
            .unwrap_or_else(default_data_dir);

        let owner = env("GITHUB_OWNER")
            .or(file.github.owner)
            .unwrap_or_default();
        let api_url = env("BINDERY_API_URL")
            .or(file.github.api_url)
            .unwrap_or_else(default_api_url);
        let token = env("GITHUB_TOKEN").filter(|t| !t.is_empty());

        let settle_secs = match env("BINDERY_SETTLE_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("Invalid BINDERY_SETTLE_SECS value: {}", raw))?,
            None => file.deploy.settle_secs.unwrap_or_else(default_settle_secs),
        };
        let min_pdf_bytes = file
            .deploy
            .min_pdf_bytes
            .unwrap_or_else(default_min_pdf_bytes);

        Ok(Self {
            data_dir,
            github: GithubSettings {
                owner,
                api_url: api_url.trim_end_matches('/').to_string(),
                token,
            },
            deploy: DeploySettings {
                settle_secs,
                min_pdf_bytes,
            },
        })
    }

    fn read_file(path: &Path) -> Result<FileConfig> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Token for GitHub calls, or a setup hint when it is missing.
    pub fn require_token(&self) -> Result<&str> {
        self.github
            .token
            .as_deref()
            .ok_or_else(|| anyhow!("GITHUB_TOKEN is not set; export it or add it to .env"))
    }

    /// Owner for GitHub repositories, or a setup hint when it is missing.
    pub fn require_owner(&self) -> Result<&str> {
        if self.github.owner.is_empty() {
            return Err(anyhow!(
                "GitHub owner is not configured; set GITHUB_OWNER or [github].owner in {}",
                CONFIG_FILE
            ));
        }
        Ok(&self.github.owner)
    }

    // ── path helpers ─────────────────────────────────────────────────

    /// Per-customer config documents, one JSON file each.
    pub fn customers_dir(&self) -> PathBuf {
        self.data_dir.join("customers")
    }

    /// Shared pool of source PDFs referenced by chemical records.
    pub fn pdf_dir(&self) -> PathBuf {
        self.data_dir.join("pdfs")
    }

    /// Per-customer assets (logo etc.), uploaded to the site root.
    pub fn assets_dir(&self, slug: &str) -> PathBuf {
        self.data_dir.join("assets").join(slug)
    }

    /// Per-customer staging area for dashboard uploads.
    pub fn uploads_dir(&self, slug: &str) -> PathBuf {
        self.data_dir.join("uploads").join(slug)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        let roots = [
            self.customers_dir(),
            self.pdf_dir(),
            self.data_dir.join("assets"),
            self.data_dir.join("uploads"),
        ];
        for dir in roots {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file_or_env() {
        let config = AppConfig::load_with(None, None, no_env).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.github.token.is_none());
        assert_eq!(config.deploy.settle_secs, 30);
        assert_eq!(config.deploy.min_pdf_bytes, 1024);
    }

    #[test]
    fn test_file_values_applied() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            r#"
[paths]
data_dir = "/srv/binders"

[github]
owner = "acme-safety"

[deploy]
settle_secs = 5
min_pdf_bytes = 64
"#,
        )
        .unwrap();
        let config = AppConfig::load_with(Some(&path), None, no_env).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/srv/binders"));
        assert_eq!(config.github.owner, "acme-safety");
        assert_eq!(config.deploy.settle_secs, 5);
        assert_eq!(config.deploy.min_pdf_bytes, 64);
    }

    #[test]
    fn test_env_overrides_file_and_cli_overrides_env() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[paths]\ndata_dir = \"/from/file\"\n[github]\nowner = \"file-owner\"\n",
        )
        .unwrap();

        let env: HashMap<&str, &str> = HashMap::from([
            ("BINDERY_DATA_DIR", "/from/env"),
            ("GITHUB_OWNER", "env-owner"),
            ("GITHUB_TOKEN", "ghp_test"),
            ("BINDERY_API_URL", "http://127.0.0.1:9999/"),
            ("BINDERY_SETTLE_SECS", "0"),
        ]);
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let config = AppConfig::load_with(Some(&path), None, lookup).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/env"));
        assert_eq!(config.github.owner, "env-owner");
        assert_eq!(config.github.token.as_deref(), Some("ghp_test"));
        // trailing slash trimmed so URL joins stay clean
        assert_eq!(config.github.api_url, "http://127.0.0.1:9999");
        assert_eq!(config.deploy.settle_secs, 0);

        let config =
            AppConfig::load_with(Some(&path), Some(PathBuf::from("/from/cli")), lookup).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("/from/cli"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "data_dir = [not toml").unwrap();
        let err = AppConfig::load_with(Some(&path), None, no_env).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }

    #[test]
    fn test_unknown_file_keys_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        // tokens do not belong in the config file
        fs::write(&path, "[github]\ntoken = \"ghp_leaked\"\n").unwrap();
        assert!(AppConfig::load_with(Some(&path), None, no_env).is_err());
    }

    #[test]
    fn test_invalid_settle_secs_is_an_error() {
        let lookup = |key: &str| {
            (key == "BINDERY_SETTLE_SECS").then(|| "soon".to_string())
        };
        let err = AppConfig::load_with(None, None, lookup).unwrap_err();
        assert!(err.to_string().contains("BINDERY_SETTLE_SECS"));
    }

    #[test]
    fn test_require_token_and_owner_messages() {
        let config = AppConfig::load_with(None, None, no_env).unwrap();
        assert!(config.require_token().unwrap_err().to_string().contains("GITHUB_TOKEN"));
        assert!(config.require_owner().unwrap_err().to_string().contains("GITHUB_OWNER"));
    }

    #[test]
    fn test_path_helpers() {
        let mut config = AppConfig::load_with(None, None, no_env).unwrap();
        config.data_dir = PathBuf::from("/srv/binders");
        assert_eq!(config.customers_dir(), PathBuf::from("/srv/binders/customers"));
        assert_eq!(config.pdf_dir(), PathBuf::from("/srv/binders/pdfs"));
        assert_eq!(
            config.assets_dir("acme-labs"),
            PathBuf::from("/srv/binders/assets/acme-labs")
        );
    }

    #[test]
    fn test_ensure_directories() {
        let dir = tempdir().unwrap();
        let mut config = AppConfig::load_with(None, None, no_env).unwrap();
        config.data_dir = dir.path().join("state");
        config.ensure_directories().unwrap();
        assert!(config.customers_dir().is_dir());
        assert!(config.pdf_dir().is_dir());
    }
}
