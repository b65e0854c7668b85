//! Build-and-publish pipeline.
//!
//! ```text
//! Idle -> CheckingOut -> Generating -> Deploying -> Done
//!              |              |            |
//!              +--------------+------------+-------> Failed
//! ```
//!
//! Each step runs only after the previous one succeeded. `build` stops after
//! `Generating`. A failure moves straight to `Failed` and skips the rest, so
//! the publish target is never touched by a run whose generate step failed.

mod checkout;
mod error;
mod preflight;

pub use error::{PipelineError, Stage};

use crate::{
    artifact::{Artifact, Staging},
    config::SiteConfig,
    content::ContentStore,
    deploy::{PublishOutcome, deploy_site},
    generator::{self, Input},
    log,
};
use anyhow::Result;
use checkout::Workspace;
use std::{fmt, path::Path};

/// Run state. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    CheckingOut,
    Generating,
    Deploying,
    Done,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::CheckingOut => "checking out",
            Self::Generating => "generating",
            Self::Deploying => "deploying",
            Self::Done => "done",
            Self::Failed => "failed",
        })
    }
}

/// Whether the run ends with a deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Build,
    Deploy,
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub history: Vec<RunState>,
    pub digest: String,
    pub pages: usize,
    pub files: usize,
    pub outcome: PublishOutcome,
}

impl RunReport {
    pub fn short_digest(&self) -> &str {
        &self.digest[..self.digest.len().min(12)]
    }
}

pub struct Pipeline<'a> {
    config: &'a SiteConfig,
    mode: RunMode,
    history: Vec<RunState>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a SiteConfig, mode: RunMode) -> Self {
        Self {
            config,
            mode,
            history: vec![RunState::Idle],
        }
    }

    pub fn state(&self) -> RunState {
        self.history.last().copied().unwrap_or(RunState::Idle)
    }

    /// Every state the last run passed through, starting with `Idle`.
    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    /// Run checkout, generate and (in deploy mode) deploy.
    ///
    /// Runs are independent: calling this again starts over from `Idle`.
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        self.history.clear();
        self.history.push(RunState::Idle);

        match self.execute() {
            Ok((artifact, pages, outcome)) => {
                self.transition(RunState::Done);
                Ok(RunReport {
                    history: self.history.clone(),
                    digest: artifact.digest().to_owned(),
                    pages,
                    files: artifact.files().len(),
                    outcome,
                })
            }
            Err(err) => {
                self.transition(RunState::Failed);
                Err(err)
            }
        }
    }

    fn execute(&mut self) -> Result<(Artifact, usize, PublishOutcome), PipelineError> {
        self.transition(RunState::CheckingOut);
        let token = preflight::check_environment(self.config, self.mode)
            .map_err(|e| PipelineError::environment(Stage::Checkout, e))?;
        let workspace =
            Workspace::acquire(self.config).map_err(|e| PipelineError::classify(Stage::Checkout, e))?;

        self.transition(RunState::Generating);
        preflight::check_generator(self.config, workspace.root())
            .map_err(|e| PipelineError::environment(Stage::Generate, e))?;
        let (artifact, pages) = generate(self.config, workspace.root())
            .map_err(|e| PipelineError::classify(Stage::Generate, e))?;

        let outcome = match self.mode {
            RunMode::Build => PublishOutcome::Skipped,
            RunMode::Deploy => {
                self.transition(RunState::Deploying);
                deploy_site(self.config, &artifact, token.as_deref())
                    .map_err(|e| PipelineError::classify(Stage::Deploy, e))?
            }
        };
        Ok((artifact, pages, outcome))
    }

    fn transition(&mut self, next: RunState) {
        log!("pipeline"; "{} -> {}", self.state(), next);
        self.history.push(next);
    }
}

/// Scan the content store, generate into a staging directory and install it.
fn generate(config: &SiteConfig, source_root: &Path) -> Result<(Artifact, usize)> {
    let store = ContentStore::open(&source_root.join(&config.build.content))?
        .with_drafts(config.build.drafts);

    let staging = Staging::new(&config.build.output)?;
    let input = Input {
        config,
        source_root,
        store: &store,
    };
    let pages = generator::generate(&input, staging.path())?;
    let artifact = staging.finish(&config.build.output)?;

    log!("generate"; "artifact {} ({} files)", artifact.short_digest(), artifact.files().len());
    Ok((artifact, pages))
}

/// Scan the local content store and report content errors without building.
pub fn check(config: &SiteConfig) -> Result<usize, PipelineError> {
    let dir = config.get_root().join(&config.build.content);
    let store = ContentStore::open(&dir)
        .map_err(|e| PipelineError::classify(Stage::Generate, e.into()))?
        .with_drafts(config.build.drafts);

    let published = store.published().count();
    log!(
        "check";
        "{} documents ({} published), {} assets",
        store.documents().len(),
        published,
        store.assets().len()
    );
    Ok(store.documents().len())
}
