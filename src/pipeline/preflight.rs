//! Environment checks that run before a stage does any work.

use super::RunMode;
use crate::{
    config::{CheckoutStrategy, DeployProvider, GeneratorKind, SiteConfig},
    deploy::resolve_token,
    utils::git,
};
use anyhow::{Context, Result, bail};
use std::path::Path;

/// Resolve required tools and the publish credential.
///
/// Returns the access token when the publish target needs one.
pub fn check_environment(config: &SiteConfig, mode: RunMode) -> Result<Option<String>> {
    let deploys_to_git = mode == RunMode::Deploy && config.deploy.provider == DeployProvider::Github;
    let uses_git = deploys_to_git
        || config.checkout.strategy == CheckoutStrategy::Clone
        || (config.checkout.submodules && config.get_root().join(".gitmodules").is_file());

    if uses_git {
        require_command("git")?;
    }

    if !deploys_to_git {
        return Ok(None);
    }

    let github = &config.deploy.github;
    let token = resolve_token(github)?;
    if token.is_none() && git::needs_token(&github.url) {
        match &github.token_env {
            Some(var) => bail!(
                "No credential for {}: set `{var}` or [deploy.github.token_path]",
                github.url
            ),
            None => bail!(
                "No credential for {}: set [deploy.github.token_path]",
                github.url
            ),
        }
    }
    Ok(token)
}

/// Resolve the external generator program against the checked-out tree.
pub fn check_generator(config: &SiteConfig, root: &Path) -> Result<()> {
    if config.build.generator != GeneratorKind::Command {
        return Ok(());
    }
    let program = config
        .build
        .command
        .argv
        .first()
        .context("[build.command.argv] is empty")?;

    which::which_in(program, std::env::var_os("PATH"), root)
        .with_context(|| format!("`{program}` not found. Please install it first."))?;
    Ok(())
}

fn require_command(name: &str) -> Result<()> {
    which::which(name).with_context(|| format!("`{name}` not found. Please install it first."))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_mode_needs_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.set_root(dir.path());
        config.deploy.github.url = "https://github.com/alice/alice.github.io".into();

        assert!(check_environment(&config, RunMode::Build).unwrap().is_none());
    }

    #[test]
    fn test_https_deploy_requires_credential() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.set_root(dir.path());
        config.deploy.github.url = "https://github.com/alice/alice.github.io".into();
        config.deploy.github.token_env = Some("PRESSROOM_TEST_TOKEN_THAT_IS_NEVER_SET".into());

        let err = check_environment(&config, RunMode::Deploy).unwrap_err().to_string();
        assert!(err.contains("No credential"), "{err}");
    }

    #[test]
    fn test_ssh_deploy_needs_no_credential() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.set_root(dir.path());
        config.deploy.github.url = "git@github.com:alice/alice.github.io.git".into();
        config.deploy.github.token_env = Some("PRESSROOM_TEST_TOKEN_THAT_IS_NEVER_SET".into());

        if which::which("git").is_ok() {
            assert!(check_environment(&config, RunMode::Deploy).unwrap().is_none());
        }
    }

    #[test]
    fn test_missing_generator_program() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.build.generator = GeneratorKind::Command;
        config.build.command.argv = vec!["pressroom-no-such-generator".into()];

        let err = check_generator(&config, dir.path()).unwrap_err().to_string();
        assert!(err.contains("pressroom-no-such-generator"));

        config.build.generator = GeneratorKind::Builtin;
        assert!(check_generator(&config, dir.path()).is_ok());
    }
}
