//! Site scaffolding for `pressroom init`.
//!
//! Writes a default config, a sample post, the assets directory, a
//! `.gitignore` and a CI workflow that deploys on every push. Existing
//! files are left alone, so `init` can also be run inside an existing
//! Markdown repository.

use crate::{config::SiteConfig, log, utils::git};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Workflow that runs `pressroom deploy` on push.
const WORKFLOW_PATH: &str = ".github/workflows/publish.yml";

const SAMPLE_POST: &str = "\
---
title: Hello, world
date: 2024-01-01
tags: [meta]
---

This is the first post. Edit or delete `content/hello.md`, then push.
";

/// Scaffold a site in the configured root.
pub fn new_site(config: &SiteConfig) -> Result<()> {
    let root = config.get_root();
    fs::create_dir_all(root).with_context(|| format!("Failed to create {}", root.display()))?;

    git::ensure_repo(root)?;

    write_new(&config.config_path, &default_config(root)?)?;
    write_new(&root.join(&config.build.content).join("hello.md"), SAMPLE_POST)?;
    fs::create_dir_all(root.join(&config.build.assets))?;
    write_new(&root.join(".gitignore"), &gitignore(root, &config.build.output))?;
    write_new(&root.join(WORKFLOW_PATH), &workflow(&config.checkout.branch))?;

    log!("init"; "site ready in {}", root.display());
    Ok(())
}

/// The default config, titled after the site directory.
fn default_config(root: &Path) -> Result<String> {
    let mut config = SiteConfig::default();
    if let Some(name) = root.file_name() {
        config.base.title = name.to_string_lossy().into_owned();
    }
    Ok(toml::to_string_pretty(&config)?)
}

fn gitignore(root: &Path, output: &Path) -> String {
    let output = output.strip_prefix(root).unwrap_or(output);
    format!("/{}/\n", output.display())
}

fn workflow(branch: &str) -> String {
    format!(
        r#"name: publish

on:
  push:
    branches: [{branch}]

jobs:
  deploy:
    runs-on: ubuntu-latest
    steps:
      - uses: actions/checkout@v4
        with:
          submodules: recursive
      - run: cargo install pressroom --locked
      - run: pressroom deploy
        env:
          GITHUB_TOKEN: ${{{{ secrets.GITHUB_TOKEN }}}}
"#
    )
}

/// Write `content` to `path` unless the file already exists.
fn write_new(path: &Path, content: &str) -> Result<()> {
    if path.exists() {
        log!("init"; "keeping existing {}", path.display());
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}
