//! Deckhand Kubectl - run kubectl subcommands inside a container
//!
//! One facade, parameterized by how the container authenticates:
//! - **Static config**: a kubeconfig secret mounted at `/root/.kube/config`
//! - **Cloud IAM**: provider credentials exchanged for a kubeconfig in the container (EKS)
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use deckhand_core::{DockerRuntime, Secret};
//! use deckhand_kubectl::Kubectl;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let kubectl = Kubectl::new(Arc::new(DockerRuntime::new()));
//! let cli = kubectl.bind_config(Some(Secret::from_file("kubeconfig")?))?;
//! let pods = cli.exec(&["get", "pods", "-n", "default"]).await?;
//! print!("{pods}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod error;
pub mod kubectl;

pub use auth::{AuthStrategy, AwsCredentials, CloudCredentials, CloudProvider};
pub use error::{KubectlError, Result};
pub use kubectl::{KUBECONFIG_PATH, Kubectl, KubectlCli, KubectlOptions};
