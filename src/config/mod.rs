//! Site configuration management for `pressroom.toml`.
//!
//! # Sections
//!
//! | Section      | Purpose                                            |
//! |--------------|----------------------------------------------------|
//! | `[base]`     | Site metadata (title, author, url)                 |
//! | `[build]`    | Paths, generator, feed, sitemap, slugs             |
//! | `[checkout]` | How the source tree is acquired for a run          |
//! | `[deploy]`   | Publish target (git branch or directory)           |
//! | `[extra]`    | User-defined custom fields                         |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "Notes"
//! url = "https://alice.github.io"
//!
//! [build]
//! content = "source/_posts"
//!
//! [deploy.github]
//! url = "https://github.com/alice/alice.github.io"
//! branch = "gh-pages"
//! ```

mod base;
mod build;
mod checkout;
pub mod defaults;
mod deploy;
mod error;

pub use build::{GeneratorKind, SlugMode};
pub use checkout::CheckoutStrategy;
pub use deploy::{DeployProvider, GithubDeployConfig};
pub use error::ConfigError;

use base::BaseConfig;
use build::BuildConfig;
use checkout::CheckoutConfig;
use deploy::DeployConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

/// Root configuration structure representing pressroom.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Source acquisition
    #[serde(default)]
    pub checkout: CheckoutConfig,

    /// Publish target
    #[serde(default)]
    pub deploy: DeployConfig,

    /// User-defined extra fields
    #[serde(default)]
    pub extra: BTreeMap<String, toml::Value>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Committer identity for publish commits.
    pub fn committer(&self) -> (&str, &str) {
        let github = &self.deploy.github;
        (
            github.name.as_deref().unwrap_or(&self.base.author),
            github.email.as_deref().unwrap_or(&self.base.email),
        )
    }

    /// Apply CLI arguments: root, path overrides, and per-command flags.
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let base = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        let root = match &cli.command {
            Commands::Init { name: Some(name) } => base.join(name),
            _ => base,
        };

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());
        self.update_path_with_root(&root, &cli.config);

        if let Some(args) = cli.build_args() {
            self.build.drafts |= args.drafts;
            Self::update_option(&mut self.build.minify, args.minify.as_ref());
            if let Some(url) = &args.base_url {
                self.base.url = Some(url.clone());
            }
        }

        if let Commands::Deploy { force, .. } = &cli.command {
            Self::update_option(&mut self.deploy.force, force.as_ref());
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve root-relative paths to absolute paths.
    ///
    /// `content` and `assets` stay relative: they are resolved against the
    /// checked-out source tree, which is not the root for clone checkouts.
    fn update_path_with_root(&mut self, root: &Path, config_name: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config_name));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));

        if let Some(path) = &self.deploy.directory.path {
            self.deploy.directory.path = Some(Self::normalize_path(&root.join(path)));
        }

        if let Some(token_path) = &self.deploy.github.token_path {
            let expanded = shellexpand::tilde(&token_path.to_string_lossy()).into_owned();
            self.deploy.github.token_path = Some(Self::normalize_path(&root.join(expanded)));
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command.
    ///
    /// Only checks the config itself. Tools and credentials are checked by
    /// the pipeline before the first stage runs.
    pub fn validate(&self, command: &Commands) -> Result<()> {
        if !self.config_path.exists() {
            bail!(ConfigError::Missing(self.config_path.clone()));
        }

        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if self.build.feed.enable && self.base.url.is_none() {
            bail!(ConfigError::Validation(
                "[base.url] is required for feed generation".into()
            ));
        }

        if self.build.sitemap.enable && self.base.url.is_none() {
            bail!(ConfigError::Validation(
                "[base.url] is required for sitemap generation".into()
            ));
        }

        if self.build.path_prefix.is_absolute() {
            bail!(ConfigError::Validation(
                "[build.path_prefix] must be a relative path".into()
            ));
        }

        if self.build.generator == GeneratorKind::Command && self.build.command.argv.is_empty() {
            bail!(ConfigError::Validation(
                "[build.generator] = \"command\" requires [build.command.argv]".into()
            ));
        }

        if self.checkout.strategy == CheckoutStrategy::Clone && self.checkout.repository.is_none()
        {
            bail!(ConfigError::Validation(
                "[checkout.strategy] = \"clone\" requires [checkout.repository]".into()
            ));
        }

        if matches!(command, Commands::Deploy { .. }) {
            self.validate_deploy()?;
        }

        Ok(())
    }

    fn validate_deploy(&self) -> Result<()> {
        match self.deploy.provider {
            DeployProvider::Github => {
                if self.deploy.github.url.trim().is_empty() {
                    bail!(ConfigError::Validation("[deploy.github.url] is empty".into()));
                }
                if self.deploy.github.branch.trim().is_empty() {
                    bail!(ConfigError::Validation("[deploy.github.branch] is empty".into()));
                }
            }
            DeployProvider::Directory => match &self.deploy.directory.path {
                None => bail!(ConfigError::Validation(
                    "[deploy.provider] = \"directory\" requires [deploy.directory.path]".into()
                )),
                Some(path) if path.starts_with(&self.build.output) || self.build.output.starts_with(path) => {
                    bail!(ConfigError::Validation(
                        "[deploy.directory.path] must not overlap the output directory".into()
                    ))
                }
                Some(_) => {}
            },
        }
        Ok(())
    }
}
