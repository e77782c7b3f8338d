//! Execution environments for containers
//!
//! A runtime takes a [`Container`] description and runs its pending exec
//! steps in order, inside one fresh container per call:
//! - **Docker**: drives the local `docker` CLI
//! - **Mock**: records calls and replays canned results, for tests

mod docker;
mod mock;

pub use docker::DockerRuntime;
pub use mock::{MockRuntime, RuntimeCall};

use async_trait::async_trait;

use crate::container::Container;
use crate::error::RuntimeError;
use crate::handles::File;

/// Runs container descriptions
///
/// Implementations must be Send + Sync so one runtime can back several
/// facades used from concurrent tasks.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Run every exec step and return the raw stdout of the last one
    async fn stdout_bytes(&self, container: &Container) -> Result<Vec<u8>, RuntimeError>;

    /// Like [`stdout_bytes`](Self::stdout_bytes), decoded as UTF-8
    ///
    /// Invalid UTF-8 is an error, never replaced.
    async fn stdout(&self, container: &Container) -> Result<String, RuntimeError> {
        let bytes = self.stdout_bytes(container).await?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Run every exec step and read back the file at `path`
    async fn file(&self, container: &Container, path: &str) -> Result<File, RuntimeError>;

    /// Run every exec step, discarding output
    async fn sync(&self, container: &Container) -> Result<(), RuntimeError> {
        self.stdout_bytes(container).await.map(|_| ())
    }
}
