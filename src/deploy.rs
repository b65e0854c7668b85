//! Deploy step: publish the artifact to the configured target.
//!
//! | Provider    | Target                       | Unchanged when                    |
//! |-------------|------------------------------|-----------------------------------|
//! | `github`    | a branch of a git remote     | artifact tree equals branch tree  |
//! | `directory` | a local directory            | directory digest equals artifact  |
//!
//! Both overwrite the target wholesale; neither reads published files back.

use crate::{
    artifact::{Artifact, digest_dir},
    config::{DeployProvider, GithubDeployConfig, SiteConfig},
    log,
    utils::git::{self, Identity},
};
use anyhow::{Context, Result};
use std::{fmt, fs, path::Path};

/// What the deploy step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The target now holds the artifact (commit id or directory).
    Published(String),
    /// The target already held an identical artifact.
    Unchanged,
    /// No deploy step ran (`build`).
    Skipped,
}

impl fmt::Display for PublishOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Published(target) => write!(f, "published {target}"),
            Self::Unchanged => f.write_str("unchanged"),
            Self::Skipped => f.write_str("skipped"),
        }
    }
}

/// Deploy the artifact to the configured provider
pub fn deploy_site(config: &SiteConfig, artifact: &Artifact, token: Option<&str>) -> Result<PublishOutcome> {
    match config.deploy.provider {
        DeployProvider::Github => deploy_github(config, artifact, token),
        DeployProvider::Directory => deploy_directory(config, artifact),
    }
}

/// Access token from `token_env`, else from `token_path`.
pub fn resolve_token(github: &GithubDeployConfig) -> Result<Option<String>> {
    if let Some(var) = &github.token_env
        && let Ok(value) = std::env::var(var)
        && !value.trim().is_empty()
    {
        return Ok(Some(value.trim().to_owned()));
    }

    if let Some(path) = &github.token_path {
        let token = fs::read_to_string(path)
            .with_context(|| format!("Failed to read token file {}", path.display()))?;
        let token = token.trim();
        if !token.is_empty() {
            return Ok(Some(token.to_owned()));
        }
    }
    Ok(None)
}

/// Commit the artifact on top of the published branch head and push it.
fn deploy_github(config: &SiteConfig, artifact: &Artifact, token: Option<&str>) -> Result<PublishOutcome> {
    let github = &config.deploy.github;
    let force = config.deploy.force;
    let root = artifact.root();

    let repo = git::ensure_repo(root)?;
    let url = git::build_authenticated_url(&github.url, token)?;
    git::configure_origin_remote(root, &repo.to_thread_local(), &url)?;

    log!("deploy"; "{} -> {} ({})", artifact.short_digest(), github.url, github.branch);
    let published = git::fetch_branch_head(root, &github.branch)?;

    // reopen so objects fetched by the git CLI are visible
    let repo = git::open_repo(root)?;
    let tree = git::write_tree(&repo)?;

    if let Some(head) = published
        && git::tree_of_commit(&repo, head)? == tree
    {
        log!("deploy"; "{} already up to date", github.branch);
        return Ok(PublishOutcome::Unchanged);
    }

    let (name, email) = config.committer();
    let message = config.deploy.message.replace("{digest}", artifact.short_digest());
    let parent = if force { None } else { published };
    let commit = git::commit_tree(root, tree, parent, &message, &Identity { name, email })?;

    git::push_head(root, &github.branch, force)?;
    log!("deploy"; "pushed {} to {}", commit, github.branch);
    Ok(PublishOutcome::Published(commit.to_string()))
}

/// Copy the artifact beside the target directory, then swap it in.
fn deploy_directory(config: &SiteConfig, artifact: &Artifact) -> Result<PublishOutcome> {
    let target = config
        .deploy
        .directory
        .path
        .as_deref()
        .context("[deploy.directory.path] is not set")?;

    if digest_dir(target)?.as_deref() == Some(artifact.digest()) {
        log!("deploy"; "{} already up to date", target.display());
        return Ok(PublishOutcome::Unchanged);
    }

    let parent = target
        .parent()
        .with_context(|| format!("Deploy target {} has no parent", target.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("Failed to create {}", parent.display()))?;
    let swap = tempfile::Builder::new()
        .prefix(".pressroom-deploy-")
        .tempdir_in(parent)
        .with_context(|| format!("Failed to create a temporary directory in {}", parent.display()))?;

    let fresh = swap.path().join("site");
    for relative in artifact.files() {
        copy_into(&artifact.root().join(relative), &fresh.join(relative))?;
    }
    fs::create_dir_all(&fresh)?;

    let previous = swap.path().join("previous");
    if target.exists() {
        fs::rename(target, &previous)
            .with_context(|| format!("Failed to move {} aside", target.display()))?;
    }
    if let Err(err) = fs::rename(&fresh, target) {
        let err = anyhow::Error::new(err).context(format!("Failed to replace {}", target.display()));
        if let Err(restore_err) = restore(&previous, target) {
            let kept = swap.keep();
            log!("deploy"; "{:#}, previous site kept in {}", restore_err, kept.join("previous").display());
            return Err(err.context(format!("{restore_err:#}")));
        }
        return Err(err);
    }

    log!("deploy"; "{} -> {}", artifact.short_digest(), target.display());
    Ok(PublishOutcome::Published(target.display().to_string()))
}

/// Move the set-aside target back after a failed swap.
fn restore(previous: &Path, target: &Path) -> Result<()> {
    if previous.exists() {
        fs::rename(previous, target).with_context(|| {
            format!("Failed to restore {} from {}", target.display(), previous.display())
        })?;
    }
    Ok(())
}

fn copy_into(source: &Path, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, dest)
        .map(drop)
        .with_context(|| format!("Failed to copy {}", source.display()))
}
