//! Standard exit codes for CLI operations
//!
//! These exit codes follow Unix conventions and sysexits.h where applicable.

/// General error - unspecified failure
pub const ERROR: i32 = 1;

/// Chart error - missing or invalid Chart.yaml
pub const CHART_ERROR: i32 = 3;

/// Configuration error - missing kubeconfig, credentials, or bad config file
pub const CONFIG_ERROR: i32 = 4;

/// IO error - file not found, permission denied, etc.
pub const IO_ERROR: i32 = 5;

/// Execution error - the wrapped tool or the container runtime failed
pub const EXECUTION_ERROR: i32 = 6;

/// Interrupted - SIGINT or SIGTERM received (128 + SIGINT, shell convention)
pub const INTERRUPTED: i32 = 130;
