//! Error types for deckhand-helm

use deckhand_core::RuntimeError;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for deckhand-helm operations
pub type Result<T> = std::result::Result<T, HelmError>;

/// Problems with a chart manifest
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("Chart.yaml not found in {dir}")]
    NotFound { dir: PathBuf },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse Chart.yaml: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HelmError {
    /// Chart metadata could not be resolved
    #[error("chart metadata error: {0}")]
    Metadata(#[from] ChartError),

    /// The custom base image has no working helm
    #[error("base image cannot run helm: {0}")]
    InvalidBase(#[source] RuntimeError),

    /// A helm step failed inside the container
    #[error("helm execution failed: {0}")]
    Execution(#[from] RuntimeError),
}
