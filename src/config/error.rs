//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file `{0}` not found, run `pressroom init` first")]
    Missing(PathBuf),

    #[error("Config file `{0}` already exists")]
    Exists(PathBuf),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config validation error: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    #[test]
    fn test_config_error_display() {
        let io_err = ConfigError::Io(
            PathBuf::from("pressroom.toml"),
            Error::new(ErrorKind::NotFound, "file not found"),
        );
        let display = format!("{io_err}");
        assert!(display.contains("IO error"));
        assert!(display.contains("pressroom.toml"));

        let validation_err = ConfigError::Validation("[deploy.github.url] is empty".to_string());
        assert!(format!("{validation_err}").contains("[deploy.github.url] is empty"));

        let missing = ConfigError::Missing(PathBuf::from("site/pressroom.toml"));
        assert!(format!("{missing}").contains("pressroom init"));
    }
}
