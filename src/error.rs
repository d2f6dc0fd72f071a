//! Top-level error type of a generator run.

use std::path::PathBuf;

use binder_core::ConfigError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BinderError>;

/// Anything that stops a run. Nothing is written once one of these is raised
/// during rendering.
#[derive(Debug, Error)]
pub enum BinderError {
    /// Structural problem in the entity model or side-table.
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The entity model file is not valid JSON for the model.
    #[error("invalid entity model '{}': {source}", path.display())]
    Model {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid settings '{}': {source}", path.display())]
    Settings {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A line of the directive file could not be understood.
    #[error("{}:{line}: {message}", path.display())]
    Directive {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl BinderError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        BinderError::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the run failed on a configuration problem rather than I/O.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            BinderError::Config(_) | BinderError::Directive { .. } | BinderError::Settings { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directive_error_names_line() {
        let err = BinderError::Directive {
            path: PathBuf::from("config.txt"),
            line: 7,
            message: "unknown directive '+frobnicate'".to_string(),
        };
        assert_eq!(err.to_string(), "config.txt:7: unknown directive '+frobnicate'");
        assert!(err.is_config());
    }

    #[test]
    fn config_error_is_transparent() {
        let err: BinderError = ConfigError::InvalidCapacity {
            module: "Test".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            ConfigError::InvalidCapacity {
                module: "Test".to_string()
            }
            .to_string()
        );
    }
}
