//! Content error types.
//!
//! Content errors belong to the author: they name the file and the reason
//! and are never corrected automatically.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content directory `{}` not found", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to read `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: unterminated front-matter, missing closing `{fence}`", .path.display())]
    Unterminated { path: PathBuf, fence: &'static str },

    #[error("{}: front-matter must be key/value pairs", .path.display())]
    NotAMapping { path: PathBuf },

    #[error("{}: malformed front-matter: {message}", .path.display())]
    Malformed { path: PathBuf, message: String },

    #[error("{}: invalid date `{value}` in `{key}`", .path.display())]
    InvalidDate {
        path: PathBuf,
        key: &'static str,
        value: String,
    },

    #[error("`{}` and `{}` both map to `{}`", .first.display(), .second.display(), .output.display())]
    DuplicateOutput {
        first: PathBuf,
        second: PathBuf,
        output: PathBuf,
    },

    #[error("{} document(s) failed:\n{}", .0.len(), render_list(.0))]
    Many(Vec<ContentError>),
}

impl ContentError {
    /// Collapse a list of errors, keeping a single error unwrapped.
    pub fn from_many(mut errors: Vec<ContentError>) -> Self {
        if errors.len() == 1 {
            errors.remove(0)
        } else {
            ContentError::Many(errors)
        }
    }

    /// Errors caused by the environment rather than by document text.
    pub fn is_environment(&self) -> bool {
        match self {
            ContentError::MissingDirectory(_) | ContentError::Io { .. } => true,
            ContentError::Many(errors) => errors.iter().all(ContentError::is_environment),
            _ => false,
        }
    }
}

fn render_list(errors: &[ContentError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}
