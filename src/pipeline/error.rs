//! Pipeline error taxonomy.

use crate::content::ContentError;
use std::fmt;
use thiserror::Error;

/// The step a run was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Checkout,
    Generate,
    Deploy,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Checkout => "checkout",
            Self::Generate => "generate",
            Self::Deploy => "deploy",
        })
    }
}

/// Why a run ended in `Failed`.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Missing tool, credential or directory.
    #[error("{stage} failed: environment error")]
    Environment {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    /// A document the author has to fix.
    #[error("{stage} failed: content error")]
    Content {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    /// The generator itself failed.
    #[error("{stage} failed: generator error")]
    Generate {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },

    /// The publish target rejected or could not receive the artifact.
    #[error("{stage} failed: publish error")]
    Publish {
        stage: Stage,
        #[source]
        source: anyhow::Error,
    },
}

impl PipelineError {
    /// Environment errors raised before a stage does any work.
    pub fn environment(stage: Stage, source: anyhow::Error) -> Self {
        Self::Environment { stage, source }
    }

    /// Sort an error raised inside `stage` into its category.
    pub fn classify(stage: Stage, source: anyhow::Error) -> Self {
        let content = source
            .chain()
            .find_map(|cause| cause.downcast_ref::<ContentError>());

        match (content, stage) {
            (Some(err), _) if err.is_environment() => Self::Environment { stage, source },
            (Some(_), _) => Self::Content { stage, source },
            (None, Stage::Checkout) => Self::Environment { stage, source },
            (None, Stage::Generate) => Self::Generate { stage, source },
            (None, Stage::Deploy) => Self::Publish { stage, source },
        }
    }

    pub const fn stage(&self) -> Stage {
        match self {
            Self::Environment { stage, .. }
            | Self::Content { stage, .. }
            | Self::Generate { stage, .. }
            | Self::Publish { stage, .. } => *stage,
        }
    }

    /// Process exit code for this category.
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Content { .. } => 2,
            Self::Environment { .. } => 3,
            Self::Generate { .. } => 4,
            Self::Publish { .. } => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Context, anyhow};
    use std::path::PathBuf;

    #[test]
    fn test_classify_by_stage() {
        let err = PipelineError::classify(Stage::Deploy, anyhow!("push rejected"));
        assert!(matches!(err, PipelineError::Publish { .. }));
        assert_eq!(err.exit_code(), 5);

        let err = PipelineError::classify(Stage::Generate, anyhow!("exit 1"));
        assert_eq!(err.exit_code(), 4);

        let err = PipelineError::classify(Stage::Checkout, anyhow!("clone failed"));
        assert_eq!(err.exit_code(), 3);
        assert_eq!(err.stage(), Stage::Checkout);
    }

    #[test]
    fn test_classify_content_errors_through_context() {
        let source = Err::<(), _>(ContentError::NotAMapping {
            path: PathBuf::from("a.md"),
        })
        .context("Failed to scan content")
        .unwrap_err();
        let err = PipelineError::classify(Stage::Generate, source);
        assert!(matches!(err, PipelineError::Content { .. }));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_missing_content_dir_is_environment() {
        let source = anyhow::Error::new(ContentError::MissingDirectory(PathBuf::from("content")));
        let err = PipelineError::classify(Stage::Generate, source);
        assert!(matches!(err, PipelineError::Environment { .. }));
        assert_eq!(err.to_string(), "generate failed: environment error");
    }
}
