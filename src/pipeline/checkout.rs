//! Checkout step: acquire the source tree for one run.

use crate::{
    config::{CheckoutStrategy, SiteConfig},
    log,
    utils::git,
};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Marker file for nested repositories.
const GITMODULES: &str = ".gitmodules";

/// The checked-out source tree. A cloned tree is removed on drop.
pub struct Workspace {
    root: PathBuf,
    _guard: Option<TempDir>,
}

impl Workspace {
    pub fn acquire(config: &SiteConfig) -> Result<Self> {
        let checkout = &config.checkout;
        match checkout.strategy {
            CheckoutStrategy::Local => {
                let root = config.get_root().to_path_buf();
                if checkout.submodules && root.join(GITMODULES).is_file() {
                    log!("checkout"; "updating submodules");
                    git::update_submodules(&root)?;
                }
                Ok(Self { root, _guard: None })
            }
            CheckoutStrategy::Clone => {
                let repository = checkout
                    .repository
                    .as_deref()
                    .context("[checkout.repository] is not set")?;
                let guard = tempfile::Builder::new()
                    .prefix("pressroom-checkout-")
                    .tempdir()
                    .context("Failed to create checkout directory")?;

                log!("checkout"; "cloning {} ({})", repository, checkout.branch);
                git::clone(repository, &checkout.branch, guard.path(), checkout.submodules)?;
                Ok(Self {
                    root: guard.path().to_path_buf(),
                    _guard: Some(guard),
                })
            }
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
