//! kubectl commands

use deckhand_core::Secret;
use deckhand_kubectl::{AuthStrategy, AwsCredentials, Kubectl, KubectlOptions};
use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

use super::Settings;
use crate::error::Result;

/// Run a kubectl subcommand and print its stdout verbatim
///
/// `eks` is `(cluster, region)`; when set, AWS credentials are read from the
/// environment and the kubeconfig is ignored. Without `--kubeconfig`, the
/// first existing file listed in `KUBECONFIG` is used.
pub async fn exec(
    settings: &Settings,
    kubeconfig: Option<&Path>,
    kubectl_version: Option<&str>,
    eks: Option<(String, String)>,
    args: &[String],
) -> Result<()> {
    let config = settings.load_config()?;

    let mut options = KubectlOptions::from(&config.kubectl);
    if let Some(version) = kubectl_version {
        options.version = version.to_string();
    }
    let kubectl = Kubectl::with_options(Arc::new(settings.runtime(&config)), options);

    let cli = match eks {
        Some((cluster, region)) => {
            let credentials = AwsCredentials::from_env()?;
            kubectl.bind(AuthStrategy::eks(cluster, region, credentials))?
        }
        None => {
            let kubeconfig = match kubeconfig {
                Some(path) => Some(path.to_path_buf()),
                None => std::env::var_os("KUBECONFIG").and_then(|list| first_kubeconfig(&list)),
            };
            debug!(?kubeconfig, "Kubeconfig");
            let secret = kubeconfig.map(Secret::from_file).transpose()?;
            kubectl.bind_config(secret)?
        }
    };

    let output = cli.exec_bytes(args).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&output)?;
    stdout.flush()?;
    Ok(())
}

/// Pick one file from a `KUBECONFIG` path list
///
/// kubectl merges every listed file; a mounted config is a single file, so
/// the first one that exists wins. When none exist the first entry is
/// returned, to be reported as missing.
fn first_kubeconfig(list: &OsStr) -> Option<PathBuf> {
    let paths: Vec<PathBuf> = std::env::split_paths(list)
        .filter(|p| !p.as_os_str().is_empty())
        .collect();

    paths
        .iter()
        .find(|p| p.is_file())
        .or_else(|| paths.first())
        .cloned()
}
