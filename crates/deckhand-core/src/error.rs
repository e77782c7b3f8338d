//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Environment variable {name} is not set")]
    MissingEnvVar { name: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to parse configuration: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Errors raised while running a container
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum RuntimeError {
    /// The runtime binary could not be spawned at all
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// A runtime-level operation (create, copy, remove) failed
    #[error("container runtime error during {operation}: {message}")]
    Engine { operation: String, message: String },

    /// An exec step exited non-zero
    #[error("command `{}` exited with {}: {}", args.join(" "), exit_code.map_or_else(|| "signal".to_string(), |c| format!("status {c}")), stderr.trim())]
    ExecFailed {
        args: Vec<String>,
        exit_code: Option<i32>,
        stderr: String,
    },

    /// The container has no exec step to produce output from
    #[error("container has no exec step to run")]
    NothingToRun,

    /// A file was requested that the container never produced
    #[error("file not found in container: {path}")]
    FileNotFound { path: String },

    /// Output was requested as text but is not valid UTF-8
    #[error("command output is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("failed to stage {what}: {source}")]
    Staging {
        what: String,
        #[source]
        source: std::io::Error,
    },
}

impl RuntimeError {
    /// Diagnostic output of a failed exec step, if any
    pub fn stderr(&self) -> Option<&str> {
        match self {
            RuntimeError::ExecFailed { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
