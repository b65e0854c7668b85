//! Generate step: turn the content store into a build artifact.
//!
//! | Kind      | Module       | Output                                      |
//! |-----------|--------------|---------------------------------------------|
//! | `builtin` | `builtin`    | pages, listings, feed, sitemap, assets      |
//! | `command` | `external`   | whatever `[build.command] argv` writes      |
//!
//! Both write into a fresh staging directory; replacing the output
//! directory is the artifact's job.

mod builtin;
mod external;
mod feed;
mod layout;
mod markdown;
mod sitemap;
mod url;

use crate::{
    config::{GeneratorKind, SiteConfig},
    content::ContentStore,
};
use anyhow::Result;
use std::path::Path;

/// Everything a generator reads.
pub struct Input<'a> {
    pub config: &'a SiteConfig,
    /// Root of the checked-out source tree.
    pub source_root: &'a Path,
    pub store: &'a ContentStore,
}

/// Generate into `staging`, returning the number of HTML pages.
pub fn generate(input: &Input<'_>, staging: &Path) -> Result<usize> {
    match input.config.build.generator {
        GeneratorKind::Builtin => builtin::generate(input, staging),
        GeneratorKind::Command => external::generate(input, staging),
    }
}
