//! Deckhand configuration
//!
//! Stored in `~/.config/deckhand/config.yaml`. Every field is optional; a
//! missing file means all defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Default Helm image
pub const DEFAULT_HELM_IMAGE: &str = "alpine/helm:3.17";

/// Default kubectl image repository; the version is appended as the tag
pub const DEFAULT_KUBECTL_IMAGE: &str = "bitnami/kubectl";

/// Default kubectl version
pub const DEFAULT_KUBECTL_VERSION: &str = "1.33.0";

/// Image repository used for the EKS strategy (kubectl + aws-cli)
pub const DEFAULT_EKS_IMAGE: &str = "alpine/k8s";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeckhandConfig {
    /// Docker-compatible binary used to run containers
    #[serde(default)]
    pub docker: Option<PathBuf>,

    #[serde(default)]
    pub helm: HelmConfig,

    #[serde(default)]
    pub kubectl: KubectlConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelmConfig {
    /// Image with a `helm` binary on its PATH
    #[serde(default = "default_helm_image")]
    pub image: String,
}

impl Default for HelmConfig {
    fn default() -> Self {
        Self {
            image: default_helm_image(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KubectlConfig {
    #[serde(default = "default_kubectl_version")]
    pub version: String,

    /// Image repository for static kubeconfig access
    #[serde(default = "default_kubectl_image")]
    pub image: String,

    /// Image repository for EKS access
    #[serde(default = "default_eks_image")]
    pub eks_image: String,
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            version: default_kubectl_version(),
            image: default_kubectl_image(),
            eks_image: default_eks_image(),
        }
    }
}

fn default_helm_image() -> String {
    DEFAULT_HELM_IMAGE.to_string()
}

fn default_kubectl_version() -> String {
    DEFAULT_KUBECTL_VERSION.to_string()
}

fn default_kubectl_image() -> String {
    DEFAULT_KUBECTL_IMAGE.to_string()
}

fn default_eks_image() -> String {
    DEFAULT_EKS_IMAGE.to_string()
}

impl DeckhandConfig {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| CoreError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("deckhand").join("config.yaml"))
    }

    fn validate(&self) -> Result<()> {
        let blank = [
            ("helm.image", &self.helm.image),
            ("kubectl.version", &self.kubectl.version),
            ("kubectl.image", &self.kubectl.image),
            ("kubectl.eksImage", &self.kubectl.eks_image),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty());

        match blank {
            Some((field, _)) => Err(CoreError::InvalidConfig {
                message: format!("{field} must not be empty"),
            }),
            None => Ok(()),
        }
    }
}
