//! CLI commands

pub mod helm;
pub mod kubectl;

use deckhand_core::{DeckhandConfig, DockerRuntime};
use std::path::PathBuf;
use tracing::debug;

use crate::error::Result;

/// Options shared by every command
pub struct Settings {
    pub config: Option<PathBuf>,
    pub docker: Option<PathBuf>,
}

impl Settings {
    /// Load the config file named on the command line, or the default one
    pub fn load_config(&self) -> Result<DeckhandConfig> {
        let config = match &self.config {
            Some(path) => DeckhandConfig::load_from(path)?,
            None => DeckhandConfig::load()?,
        };
        debug!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Docker runtime, `--docker` winning over the config file
    pub fn runtime(&self, config: &DeckhandConfig) -> DockerRuntime {
        match self.docker.as_ref().or(config.docker.as_ref()) {
            Some(binary) => DockerRuntime::new().with_binary(binary),
            None => DockerRuntime::new(),
        }
    }
}
