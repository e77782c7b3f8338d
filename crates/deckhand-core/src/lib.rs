//! Deckhand Core - container execution primitives for pipeline modules
//!
//! This crate provides the pieces every Deckhand module is built from:
//! - `Container`: a declarative description of an image, its mounts and exec steps
//! - `Directory`, `File`, `Secret`: host-side handles passed into containers
//! - `ContainerRuntime`: the execution environment that actually runs a container
//! - `DockerRuntime` / `MockRuntime`: a docker-CLI backed runtime and an in-memory fake
//! - `DeckhandConfig`: image and runtime defaults loaded from YAML

pub mod config;
pub mod container;
pub mod error;
pub mod handles;
pub mod runtime;

pub use config::{DeckhandConfig, HelmConfig, KubectlConfig};
pub use container::{Container, ExecOptions, ExecStep, Mount, MountSource};
pub use error::{CoreError, Result, RuntimeError};
pub use handles::{Directory, File, Secret};
pub use runtime::{ContainerRuntime, DockerRuntime, MockRuntime, RuntimeCall};
