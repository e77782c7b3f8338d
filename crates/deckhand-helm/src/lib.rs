//! Deckhand Helm - render Helm charts inside a container
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use deckhand_core::{Directory, DockerRuntime, File};
//! use deckhand_helm::Helm;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let helm = Helm::new(Arc::new(DockerRuntime::new()), None).await?;
//!
//! let manifest = helm
//!     .template(
//!         &Directory::open("charts/web")?,
//!         &["values-prod.yaml"],
//!         vec![File::from_path("overrides.yaml")?],
//!     )
//!     .await?;
//!
//! manifest.export("out")?;
//! # Ok(())
//! # }
//! ```

pub mod chart;
pub mod error;
pub mod helm;
pub mod values;

pub use chart::{CHART_FILE, ChartDependency, ChartMetadata};
pub use error::{ChartError, HelmError, Result};
pub use helm::{Helm, OUTPUT_DIR, WORK_DIR};
pub use values::ValuesSource;
