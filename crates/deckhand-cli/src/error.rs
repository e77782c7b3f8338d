//! CLI error types with exit code handling
//!
//! Library errors are folded into one diagnostic type that knows its exit
//! code and, for tool failures, carries the tool's own stderr.

use deckhand_core::{CoreError, RuntimeError};
use deckhand_helm::HelmError;
use deckhand_kubectl::KubectlError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Chart directory or Chart.yaml problem
    #[error("Chart error: {message}")]
    #[diagnostic(code(deckhand::cli::chart))]
    Chart {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Missing kubeconfig, credentials, or an invalid config file
    #[error("Configuration error: {message}")]
    #[diagnostic(code(deckhand::cli::config))]
    Config {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The wrapped tool or the container runtime failed
    #[error("Execution failed: {message}")]
    #[diagnostic(code(deckhand::cli::execution))]
    Execution {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(deckhand::cli::io))]
    Io { message: String },

    /// Stopped by a signal before the command finished
    #[error("Interrupted by {signal}")]
    #[diagnostic(code(deckhand::cli::interrupted))]
    Interrupted { signal: &'static str },

    #[error("Internal error: {message}")]
    #[diagnostic(code(deckhand::cli::internal))]
    Internal { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Chart { .. } => exit_codes::CHART_ERROR,
            CliError::Config { .. } => exit_codes::CONFIG_ERROR,
            CliError::Execution { .. } => exit_codes::EXECUTION_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Interrupted { .. } => exit_codes::INTERRUPTED,
            CliError::Internal { .. } => exit_codes::ERROR,
        }
    }

    pub fn chart(message: impl Into<String>) -> Self {
        Self::Chart {
            message: message.into(),
            help: None,
        }
    }

    pub fn config_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<RuntimeError> for CliError {
    fn from(err: RuntimeError) -> Self {
        let help = match &err {
            RuntimeError::Spawn { command, .. } => Some(format!(
                "Is `{command}` installed and on PATH? Use --docker to point at another binary."
            )),
            _ => None,
        };
        CliError::Execution {
            message: err.to_string(),
            help,
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Runtime(e) => e.into(),
            CoreError::InvalidConfig { .. }
            | CoreError::YamlParse(_)
            | CoreError::MissingEnvVar { .. } => CliError::Config {
                message: err.to_string(),
                help: None,
            },
            other => CliError::Io {
                message: other.to_string(),
            },
        }
    }
}

impl From<HelmError> for CliError {
    fn from(err: HelmError) -> Self {
        match err {
            HelmError::Metadata(e) => CliError::Chart {
                message: e.to_string(),
                help: Some("A chart directory needs a Chart.yaml with `name` and `version`".into()),
            },
            HelmError::InvalidBase(e) => CliError::Config {
                message: format!("base image cannot run helm: {e}"),
                help: Some("The image passed with --base-image must have `helm` on its PATH".into()),
            },
            HelmError::Execution(e) => e.into(),
            other => CliError::internal(other.to_string()),
        }
    }
}

impl From<KubectlError> for CliError {
    fn from(err: KubectlError) -> Self {
        match err {
            KubectlError::MissingConfig => CliError::config_with_help(
                "no kubeconfig configured",
                "Pass --kubeconfig <PATH> or set KUBECONFIG",
            ),
            KubectlError::MissingCredential { name } => CliError::config_with_help(
                format!("missing cloud credential: {name}"),
                "Export AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY for --eks-cluster",
            ),
            KubectlError::Execution(e) => e.into(),
            other => CliError::internal(other.to_string()),
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
