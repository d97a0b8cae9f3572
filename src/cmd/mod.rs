//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module     | Commands handled                              |
//! |------------|-----------------------------------------------|
//! | `customer` | `Deploy`, `List`, `New`, `Delete`             |
//! | `chem`     | `Chem` (add/remove/update/list/checklist)     |
//! | `files`    | `Files`                                       |
//! | `serve`    | `Serve`                                       |

pub mod chem;
pub mod customer;
pub mod files;
pub mod serve;

pub use chem::{
    cmd_chem_add, cmd_chem_checklist, cmd_chem_list, cmd_chem_remove, cmd_chem_update,
};
pub use customer::{cmd_delete, cmd_deploy, cmd_list, cmd_new};
pub use files::cmd_files;
pub use serve::cmd_serve;

use anyhow::Result;
use bindery::config::AppConfig;
use bindery::deploy::Deployer;
use bindery::github::{self, GithubClient};

/// Deployer for commands that publish. Fails fast when the token or owner
/// is missing rather than partway through a pipeline.
pub(crate) fn build_deployer(config: &AppConfig) -> Result<Deployer> {
    let token = config.require_token()?;
    let owner = config.require_owner()?;
    if !github::looks_like_token(token) {
        tracing::warn!("GITHUB_TOKEN does not look like a GitHub personal access token");
    }
    let client = GithubClient::new(owner, token, &config.github.api_url);
    Ok(Deployer::new(client, config.clone()))
}
