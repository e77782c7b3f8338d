//! Helm commands

use console::style;
use deckhand_core::config::DEFAULT_HELM_IMAGE;
use deckhand_core::{Container, Directory, File};
use deckhand_helm::Helm;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::Settings;
use crate::error::{CliError, Result};

/// Render a chart and write or print the manifest
pub async fn template(
    settings: &Settings,
    chart: &Path,
    values: &[String],
    values_files: &[PathBuf],
    base_image: Option<&str>,
    output_dir: Option<&Path>,
) -> Result<()> {
    let config = settings.load_config()?;

    let dir = Directory::open(chart).map_err(|_| {
        CliError::chart(format!("chart directory not found: {}", chart.display()))
    })?;

    let external = values_files
        .iter()
        .map(File::from_path)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let image = base_image.unwrap_or(config.helm.image.as_str());
    let base = (image != DEFAULT_HELM_IMAGE).then(|| Container::from(image));

    let helm = Helm::new(Arc::new(settings.runtime(&config)), base).await?;
    let manifest = helm.template(&dir, values, external).await?;

    match output_dir {
        Some(out) => {
            let path = manifest.export(out)?;
            println!("{} {}", style("wrote").green(), path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(manifest.contents())?;
            stdout.flush()?;
        }
    }

    Ok(())
}
