//! GitHub REST client for the binder sites: repository lifecycle, the
//! contents API, and Pages. One client instance is built from configuration
//! and shared by everything that talks to GitHub.
//!
//! Every non-2xx response collapses into the closed [`GithubError`] set, so
//! callers match on `NotFound`/`Conflict` instead of status numbers.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::errors::GithubError;

const USER_AGENT: &str = "bindery";

/// Known GitHub token prefixes.
/// See: https://github.blog/2021-04-05-behind-githubs-new-authentication-token-formats/
const GITHUB_TOKEN_PREFIXES: &[&str] = &[
    "ghp_",        // Personal access tokens (classic)
    "github_pat_", // Fine-grained personal access tokens
    "gho_",        // OAuth access tokens
    "ghu_",        // GitHub App user-to-server tokens
    "ghs_",        // GitHub App server-to-server tokens
    "ghr_",        // GitHub App refresh tokens
];

/// Format check only: does this look like a GitHub token? Does not verify
/// the token is active or scoped; used to warn before the first API call.
pub fn looks_like_token(token: &str) -> bool {
    GITHUB_TOKEN_PREFIXES
        .iter()
        .any(|prefix| token.starts_with(prefix))
}

/// A GitHub repository (subset of fields we care about).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub private: bool,
    pub default_branch: String,
}

/// Pages configuration (subset).
#[derive(Debug, Deserialize)]
struct PagesInfo {
    source: Option<PagesSource>,
}

#[derive(Debug, Deserialize)]
struct PagesSource {
    branch: String,
}

/// Contents-API blob metadata (subset).
#[derive(Debug, Deserialize)]
struct ContentInfo {
    sha: String,
}

/// Error body GitHub attaches to most failures.
#[derive(Debug, Deserialize)]
struct ApiMessage {
    message: Option<String>,
}

pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
    owner: String,
    token: String,
}

impl GithubClient {
    /// `api_base` is the REST endpoint, normally `https://api.github.com`;
    /// tests point it at a local server.
    pub fn new(owner: &str, token: &str, api_base: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: api_base.trim_end_matches('/').to_string(),
            owner: owner.to_string(),
            token: token.to_string(),
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    fn request(&self, method: Method, url: String) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("User-Agent", USER_AGENT)
            .header("Accept", "application/vnd.github+json")
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::Response, GithubError> {
        let resp = request.send().await?;
        if resp.status().is_success() {
            Ok(resp)
        } else {
            Err(Self::classify(resp).await)
        }
    }

    /// Collapse a failure response into the closed error set. The body is
    /// consumed for its `message` so logs stay descriptive.
    async fn classify(resp: reqwest::Response) -> GithubError {
        let status = resp.status().as_u16();
        let message = match resp.text().await {
            Ok(body) => serde_json::from_str::<ApiMessage>(&body)
                .ok()
                .and_then(|m| m.message)
                .unwrap_or(body),
            Err(_) => String::new(),
        };
        match status {
            404 => GithubError::NotFound,
            // GitHub reports duplicate repo names as 422 and Pages/content
            // races as 409; both mean "it is already there"
            409 | 422 => {
                tracing::debug!(status, message = %message, "GitHub conflict");
                GithubError::Conflict
            }
            _ => GithubError::Api { status, message },
        }
    }

    /// Create a public, auto-initialized repository under the configured
    /// account. When the name is already taken the existing repository is
    /// fetched and returned instead of failing.
    pub async fn create_repository(
        &self,
        name: &str,
        description: &str,
        homepage: &str,
    ) -> Result<Repository, GithubError> {
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "homepage": homepage,
            "private": false,
            "auto_init": true,
        });
        let url = format!("{}/user/repos", self.api_base);
        match self.execute(self.request(Method::POST, url).json(&body)).await {
            Ok(resp) => Ok(resp.json::<Repository>().await?),
            Err(GithubError::Conflict) => {
                tracing::info!(name, "Repository already exists, reusing it");
                self.get_repository(name).await
            }
            Err(e) => Err(e),
        }
    }

    pub async fn get_repository(&self, name: &str) -> Result<Repository, GithubError> {
        let url = format!("{}/repos/{}/{}", self.api_base, self.owner, name);
        let resp = self.execute(self.request(Method::GET, url)).await?;
        Ok(resp.json::<Repository>().await?)
    }

    pub async fn delete_repository(&self, name: &str) -> Result<(), GithubError> {
        let url = format!("{}/repos/{}/{}", self.api_base, self.owner, name);
        self.execute(self.request(Method::DELETE, url)).await?;
        Ok(())
    }

    /// Blob sha for a path on a branch, or `None` when no file exists there.
    /// Any failure other than 404 propagates.
    pub async fn get_file_sha(
        &self,
        repo: &str,
        path: &str,
        branch: &str,
    ) -> Result<Option<String>, GithubError> {
        let url = format!(
            "{}/repos/{}/{}/contents/{}?ref={}",
            self.api_base, self.owner, repo, path, branch
        );
        match self.execute(self.request(Method::GET, url)).await {
            Ok(resp) => {
                let info = resp.json::<ContentInfo>().await?;
                Ok(Some(info.sha))
            }
            Err(GithubError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Create-or-update via the contents API. The single base64 encoding for
    /// every upload happens here; callers always hand over raw bytes.
    async fn put_contents(
        &self,
        repo: &str,
        path: &str,
        bytes: &[u8],
        message: &str,
        branch: &str,
    ) -> Result<(), GithubError> {
        let sha = self.get_file_sha(repo, path, branch).await?;
        let mut body = serde_json::json!({
            "message": message,
            "content": BASE64.encode(bytes),
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = serde_json::Value::String(sha);
        }
        let url = format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, repo, path
        );
        self.execute(self.request(Method::PUT, url).json(&body))
            .await?;
        Ok(())
    }

    pub async fn upload_text(
        &self,
        repo: &str,
        path: &str,
        content: &str,
        message: &str,
        branch: &str,
    ) -> Result<(), GithubError> {
        self.put_contents(repo, path, content.as_bytes(), message, branch)
            .await
    }

    pub async fn upload_binary(
        &self,
        repo: &str,
        path: &str,
        bytes: &[u8],
        message: &str,
        branch: &str,
    ) -> Result<(), GithubError> {
        self.put_contents(repo, path, bytes, message, branch).await
    }

    /// Turn on Pages for the repository, serving `/` from `branch`. An
    /// already-enabled site (conflict) is success.
    pub async fn enable_pages(&self, repo: &str, branch: &str) -> Result<(), GithubError> {
        let body = serde_json::json!({
            "source": { "branch": branch, "path": "/" },
        });
        let url = format!("{}/repos/{}/{}/pages", self.api_base, self.owner, repo);
        match self.execute(self.request(Method::POST, url).json(&body)).await {
            Ok(_) => Ok(()),
            Err(GithubError::Conflict) => {
                tracing::debug!(repo, "Pages already enabled");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Branch Pages currently serves from, or `fallback` when Pages is not
    /// configured or the lookup fails for any reason. Never errors.
    pub async fn detect_pages_branch(&self, repo: &str, fallback: &str) -> String {
        let url = format!("{}/repos/{}/{}/pages", self.api_base, self.owner, repo);
        match self.execute(self.request(Method::GET, url)).await {
            Ok(resp) => match resp.json::<PagesInfo>().await {
                Ok(info) => info
                    .source
                    .map(|s| s.branch)
                    .unwrap_or_else(|| fallback.to_string()),
                Err(_) => fallback.to_string(),
            },
            Err(e) => {
                tracing::debug!(repo, error = %e, fallback, "Pages lookup failed, using fallback branch");
                fallback.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};

    fn client_for(server: &ServerGuard) -> GithubClient {
        GithubClient::new("test-owner", "ghp_testtoken", &server.url())
    }

    fn repo_json(name: &str, default_branch: &str) -> String {
        serde_json::json!({
            "name": name,
            "full_name": format!("test-owner/{}", name),
            "html_url": format!("https://github.com/test-owner/{}", name),
            "description": "Chemical safety binder",
            "private": false,
            "default_branch": default_branch,
        })
        .to_string()
    }

    // ── token format check ───────────────────────────────────────────

    #[test]
    fn test_classic_and_fine_grained_tokens_accepted() {
        assert!(looks_like_token("ghp_abc123"));
        assert!(looks_like_token("github_pat_abc123"));
    }

    #[test]
    fn test_random_string_rejected() {
        assert!(!looks_like_token("not-a-token"));
        assert!(!looks_like_token(""));
    }

    // ── create_repository ────────────────────────────────────────────

    #[tokio::test]
    async fn test_create_repository_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/user/repos")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "name": "acme-labs-ghs-binder",
                "private": false,
                "auto_init": true,
            })))
            .with_status(201)
            .with_body(repo_json("acme-labs-ghs-binder", "main"))
            .create_async()
            .await;

        let client = client_for(&server);
        let repo = client
            .create_repository("acme-labs-ghs-binder", "Chemical safety binder", "")
            .await
            .unwrap();
        assert_eq!(repo.default_branch, "main");
        assert_eq!(repo.full_name, "test-owner/acme-labs-ghs-binder");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_repository_conflict_reuses_existing() {
        let mut server = Server::new_async().await;
        let create = server
            .mock("POST", "/user/repos")
            .with_status(422)
            .with_body(r#"{"message":"name already exists on this account"}"#)
            .create_async()
            .await;
        let fetch = server
            .mock("GET", "/repos/test-owner/acme-labs-ghs-binder")
            .with_status(200)
            .with_body(repo_json("acme-labs-ghs-binder", "trunk"))
            .create_async()
            .await;

        let client = client_for(&server);
        let repo = client
            .create_repository("acme-labs-ghs-binder", "", "")
            .await
            .unwrap();
        // the existing repository's branch wins, not an assumed name
        assert_eq!(repo.default_branch, "trunk");
        create.assert_async().await;
        fetch.assert_async().await;
    }

    #[tokio::test]
    async fn test_create_repository_server_error_propagates() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/user/repos")
            .with_status(500)
            .with_body(r#"{"message":"boom"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .create_repository("x", "", "")
            .await
            .unwrap_err();
        assert!(matches!(err, GithubError::Api { status: 500, .. }));
    }

    // ── contents API ─────────────────────────────────────────────────

    #[tokio::test]
    async fn test_get_file_sha_found_and_missing() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/test-owner/repo/contents/index.html")
            .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
            .with_status(200)
            .with_body(r#"{"sha":"abc123","size":10}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/repos/test-owner/repo/contents/missing.html")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let client = client_for(&server);
        let sha = client.get_file_sha("repo", "index.html", "main").await.unwrap();
        assert_eq!(sha.as_deref(), Some("abc123"));
        let missing = client.get_file_sha("repo", "missing.html", "main").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_get_file_sha_server_error_propagates() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/test-owner/repo/contents/index.html")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body(r#"{"message":"upstream down"}"#)
            .create_async()
            .await;

        let err = client_for(&server)
            .get_file_sha("repo", "index.html", "main")
            .await
            .unwrap_err();
        assert!(matches!(err, GithubError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_upload_new_file_sends_base64_without_sha() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/test-owner/repo/contents/index.html")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/test-owner/repo/contents/index.html")
            // exact body: a fresh file carries no sha field at all
            .match_body(Matcher::Json(serde_json::json!({
                "content": BASE64.encode("<html></html>"),
                "branch": "main",
                "message": "Publish site",
            })))
            .with_status(201)
            .with_body(r#"{"content":{"sha":"new"}}"#)
            .create_async()
            .await;

        client_for(&server)
            .upload_text("repo", "index.html", "<html></html>", "Publish site", "main")
            .await
            .unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_second_upload_updates_in_place_with_sha() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/test-owner/repo/contents/index.html")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"sha":"oldsha"}"#)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/test-owner/repo/contents/index.html")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "sha": "oldsha",
            })))
            .with_status(200)
            .with_body(r#"{"content":{"sha":"newsha"}}"#)
            .create_async()
            .await;

        client_for(&server)
            .upload_text("repo", "index.html", "<html>v2</html>", "Update site", "main")
            .await
            .unwrap();
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_binary_upload_encodes_exactly_once() {
        let bytes: &[u8] = b"%PDF-1.4 fake body";
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/test-owner/repo/contents/pdfs/acetone_sds.pdf")
            .match_query(Matcher::Any)
            .with_status(404)
            .create_async()
            .await;
        let put = server
            .mock("PUT", "/repos/test-owner/repo/contents/pdfs/acetone_sds.pdf")
            .match_body(Matcher::PartialJson(serde_json::json!({
                // the wire content is the single-pass encoding of the raw bytes
                "content": BASE64.encode(bytes),
            })))
            .with_status(201)
            .with_body(r#"{"content":{"sha":"x"}}"#)
            .create_async()
            .await;

        client_for(&server)
            .upload_binary("repo", "pdfs/acetone_sds.pdf", bytes, "Add SDS", "main")
            .await
            .unwrap();
        put.assert_async().await;
    }

    // ── Pages ────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_enable_pages_fresh_and_already_enabled() {
        let mut server = Server::new_async().await;
        let fresh = server
            .mock("POST", "/repos/test-owner/repo/pages")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "source": {"branch": "main", "path": "/"},
            })))
            .with_status(201)
            .with_body("{}")
            .create_async()
            .await;

        let client = client_for(&server);
        client.enable_pages("repo", "main").await.unwrap();
        fresh.assert_async().await;

        server
            .mock("POST", "/repos/test-owner/repo/pages")
            .with_status(409)
            .with_body(r#"{"message":"GitHub Pages is already enabled."}"#)
            .create_async()
            .await;
        client.enable_pages("repo", "main").await.unwrap();
    }

    #[tokio::test]
    async fn test_enable_pages_other_error_propagates() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/repos/test-owner/repo/pages")
            .with_status(403)
            .with_body(r#"{"message":"forbidden"}"#)
            .create_async()
            .await;

        let err = client_for(&server).enable_pages("repo", "main").await.unwrap_err();
        assert!(matches!(err, GithubError::Api { status: 403, .. }));
    }

    #[tokio::test]
    async fn test_detect_pages_branch_reads_source() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/test-owner/repo/pages")
            .with_status(200)
            .with_body(r#"{"source":{"branch":"gh-pages","path":"/"}}"#)
            .create_async()
            .await;

        let branch = client_for(&server).detect_pages_branch("repo", "main").await;
        assert_eq!(branch, "gh-pages");
    }

    #[tokio::test]
    async fn test_detect_pages_branch_falls_back_on_404() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/repos/test-owner/repo/pages")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let branch = client_for(&server).detect_pages_branch("repo", "main").await;
        assert_eq!(branch, "main");
    }

    // ── delete ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_delete_repository() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/repos/test-owner/old-repo")
            .with_status(204)
            .create_async()
            .await;

        client_for(&server).delete_repository("old-repo").await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_repository_is_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/repos/test-owner/ghost")
            .with_status(404)
            .with_body(r#"{"message":"Not Found"}"#)
            .create_async()
            .await;

        let err = client_for(&server).delete_repository("ghost").await.unwrap_err();
        assert!(matches!(err, GithubError::NotFound));
    }
}
