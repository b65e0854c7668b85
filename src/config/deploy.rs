//! `[deploy]` section configuration.
//!
//! Publish target settings for git branches and local directories.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the artifact is published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployProvider {
    /// Push to a branch of a git remote (GitHub Pages or any other host).
    #[default]
    Github,
    /// Replace a local directory (served by a web server, mounted volume, ...).
    Directory,
}

/// `[deploy]` section in pressroom.toml.
///
/// # Example
/// ```toml
/// [deploy]
/// provider = "github"
///
/// [deploy.github]
/// url = "https://github.com/alice/alice.github.io"
/// branch = "gh-pages"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct DeployConfig {
    #[serde(default)]
    pub provider: DeployProvider,

    /// Force push (overwrites remote history).
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub force: bool,

    /// Publish commit message; `{digest}` expands to the short artifact digest.
    #[serde(default = "defaults::deploy::message")]
    #[educe(Default = defaults::deploy::message())]
    pub message: String,

    #[serde(default)]
    pub github: GithubDeployConfig,

    #[serde(default)]
    pub directory: DirectoryDeployConfig,
}

/// `[deploy.github]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct GithubDeployConfig {
    /// Remote URL (HTTPS or SSH format).
    #[serde(default)]
    pub url: String,

    /// Publish branch, overwritten on every deploy.
    #[serde(default = "defaults::deploy::github::branch")]
    #[educe(Default = defaults::deploy::github::branch())]
    pub branch: String,

    /// Environment variable holding the access token.
    #[serde(default = "defaults::deploy::github::token_env")]
    #[educe(Default = defaults::deploy::github::token_env())]
    pub token_env: Option<String>,

    /// File holding the access token, used when `token_env` is unset or empty.
    ///
    /// Keep it outside the repository (e.g. `~/.github-token`).
    #[serde(default)]
    pub token_path: Option<PathBuf>,

    /// Committer name, defaults to `[base].author`.
    #[serde(default)]
    pub name: Option<String>,

    /// Committer email, defaults to `[base].email`.
    #[serde(default)]
    pub email: Option<String>,
}

/// `[deploy.directory]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectoryDeployConfig {
    /// Target directory, replaced wholesale on every deploy.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
