//! Chart.yaml metadata
//!
//! Only `name` and `version` drive behavior (they name the rendered file);
//! the other Helm fields are kept for logging and callers.

use deckhand_core::Directory;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ChartError;

/// File name of the chart manifest inside a chart directory
pub const CHART_FILE: &str = "Chart.yaml";

/// Helm Chart.yaml structure
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartMetadata {
    /// API version (v1 or v2)
    #[serde(default)]
    pub api_version: Option<String>,

    /// Chart name
    #[serde(default)]
    pub name: String,

    /// Chart version, kept exactly as written
    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub description: Option<String>,

    /// Chart type (application or library)
    #[serde(default, rename = "type")]
    pub chart_type: Option<String>,

    #[serde(default)]
    pub app_version: Option<String>,

    #[serde(default)]
    pub kube_version: Option<String>,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Chart dependencies, fetched by `helm dependency build`
    #[serde(default)]
    pub dependencies: Vec<ChartDependency>,

    #[serde(default)]
    pub deprecated: bool,

    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartDependency {
    pub name: String,

    /// Version constraint
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub repository: Option<String>,

    #[serde(default)]
    pub condition: Option<String>,

    #[serde(default)]
    pub alias: Option<String>,
}

impl ChartMetadata {
    /// Parse Chart.yaml content, requiring a non-empty name and version
    pub fn parse(content: &str) -> Result<Self, ChartError> {
        let metadata: Self = serde_yaml::from_str(content)?;

        if metadata.name.trim().is_empty() {
            return Err(ChartError::MissingField("name".to_string()));
        }
        if metadata.version.trim().is_empty() {
            return Err(ChartError::MissingField("version".to_string()));
        }

        Ok(metadata)
    }

    /// Resolve the metadata of a chart directory
    pub fn resolve(dir: &Directory) -> Result<Self, ChartError> {
        let path = dir.join(CHART_FILE);
        if !path.is_file() {
            return Err(ChartError::NotFound {
                dir: dir.path().to_path_buf(),
            });
        }

        let content =
            std::fs::read_to_string(&path).map_err(|source| ChartError::Read { path, source })?;
        Self::parse(&content)
    }

    /// Name of the rendered manifest: lowercased name, version untouched
    pub fn rendered_file_name(&self) -> String {
        format!("{}-{}.yaml", self.name.to_lowercase(), self.version)
    }
}
