//! Error types for deckhand-kubectl

use deckhand_core::RuntimeError;
use thiserror::Error;

/// Result type for deckhand-kubectl operations
pub type Result<T> = std::result::Result<T, KubectlError>;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubectlError {
    /// No kubeconfig was supplied, or it was empty
    #[error("no kubeconfig configured\nHint: pass --kubeconfig or set KUBECONFIG")]
    MissingConfig,

    /// A cloud credential was missing or empty
    #[error("missing cloud credential: {name}")]
    MissingCredential { name: String },

    /// kubectl (or a setup step) failed inside the container
    #[error("kubectl execution failed: {0}")]
    Execution(#[from] RuntimeError),
}
