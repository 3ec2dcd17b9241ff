//! Step configuration from YAML

use anyhow::Result;
use serde::{Deserialize, Serialize, Serializer};
use std::path::Path;

/// Environment variable consulted when no service key is configured
pub const SERVICE_KEY_ENV: &str = "CPI_API_SERVICE_KEY";

/// Top-level configuration loaded from YAML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepsConfig {
    /// Values shared by all steps
    #[serde(default)]
    pub general: GeneralConfig,

    /// Per-step sections
    #[serde(default)]
    pub steps: StepSections,
}

/// Values shared by all steps
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralConfig {
    /// Service key as inline JSON or as a path to a JSON file
    #[serde(default, serialize_with = "redact_service_key")]
    pub api_service_key: Option<String>,

    /// Timeout for a single HTTP request (in seconds)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Per-step configuration sections
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSections {
    #[serde(default)]
    pub script_collection_deploy: Option<ScriptCollectionDeployConfig>,

    #[serde(default)]
    pub get_package_list: Option<GetPackageListConfig>,

    #[serde(default)]
    pub value_mapping_artifact_upload: Option<ValueMappingUploadConfig>,
}

/// `scriptCollectionDeploy` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCollectionDeployConfig {
    #[serde(default, serialize_with = "redact_service_key")]
    pub api_service_key: Option<String>,

    #[serde(default)]
    pub script_collection_id: Option<String>,

    /// Designtime version to deploy (defaults to "Active")
    #[serde(default)]
    pub version: Option<String>,

    /// Number of status requests before giving up
    #[serde(default)]
    pub retries: Option<u32>,

    /// Delay between status requests (in seconds)
    #[serde(default)]
    pub poll_interval_secs: Option<u64>,

    /// Whether to wait for the build task to finish
    #[serde(default)]
    pub wait: Option<bool>,
}

/// `getPackageList` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPackageListConfig {
    #[serde(default, serialize_with = "redact_service_key")]
    pub api_service_key: Option<String>,
}

/// `valueMappingArtifactUpload` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueMappingUploadConfig {
    #[serde(default, serialize_with = "redact_service_key")]
    pub api_service_key: Option<String>,

    #[serde(default)]
    pub value_mapping_id: Option<String>,

    #[serde(default)]
    pub value_mapping_name: Option<String>,

    #[serde(default)]
    pub package_id: Option<String>,

    /// Path to the value mapping zip archive
    #[serde(default)]
    pub file_path: Option<String>,
}

/// Serialize a service key setting without exposing inline credentials
///
/// File paths are kept as they are; inline JSON becomes `<inline>`.
fn redact_service_key<S: Serializer>(
    value: &Option<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match value {
        Some(key) if key.trim_start().starts_with('{') => serializer.serialize_some("<inline>"),
        Some(key) => serializer.serialize_some(key),
        None => serializer.serialize_none(),
    }
}

impl StepsConfig {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: StepsConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate value ranges
    pub fn validate(&self) -> Result<()> {
        if self.general.timeout_secs == Some(0) {
            anyhow::bail!("general.timeoutSecs must be greater than zero");
        }

        if let Some(deploy) = &self.steps.script_collection_deploy {
            if deploy.retries == Some(0) {
                anyhow::bail!("steps.scriptCollectionDeploy.retries must be greater than zero");
            }
            if let Some(id) = &deploy.script_collection_id {
                if id.trim().is_empty() {
                    anyhow::bail!("steps.scriptCollectionDeploy.scriptCollectionId is empty");
                }
            }
        }

        if let Some(upload) = &self.steps.value_mapping_artifact_upload {
            if let Some(path) = &upload.file_path {
                if path.trim().is_empty() {
                    anyhow::bail!("steps.valueMappingArtifactUpload.filePath is empty");
                }
            }
        }

        Ok(())
    }

    pub fn script_collection_deploy(&self) -> ScriptCollectionDeployConfig {
        self.steps.script_collection_deploy.clone().unwrap_or_default()
    }

    pub fn get_package_list(&self) -> GetPackageListConfig {
        self.steps.get_package_list.clone().unwrap_or_default()
    }

    pub fn value_mapping_artifact_upload(&self) -> ValueMappingUploadConfig {
        self.steps.value_mapping_artifact_upload.clone().unwrap_or_default()
    }

    /// Pick the service key source
    ///
    /// Order: command line, step section, `general`, then the
    /// `CPI_API_SERVICE_KEY` environment variable.
    pub fn resolve_service_key(
        &self,
        cli: Option<&str>,
        step_section: Option<&str>,
    ) -> Option<String> {
        cli.map(str::to_string)
            .or_else(|| step_section.map(str::to_string))
            .or_else(|| self.general.api_service_key.clone())
            .or_else(|| std::env::var(SERVICE_KEY_ENV).ok())
            .filter(|s| !s.trim().is_empty())
    }
}
