//! Common pipeline environment - values handed from one step to the next

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default location, relative to the workspace, that pipelines read back
pub const DEFAULT_ENV_DIR: &str = ".pipeline/commonPipelineEnvironment";

/// Key written by `getPackageList`
pub const INTEGRATION_PACKAGE_LIST: &str = "integrationPackageList";

/// Key written by `scriptCollectionDeploy`
pub const SCRIPT_COLLECTION_DEPLOY_STATUS: &str = "scriptCollectionDeployStatus";

/// Key written by `valueMappingArtifactUpload`
pub const VALUE_MAPPING_ID: &str = "valueMappingId";

/// Output values shared across pipeline steps
///
/// Each value is stored as one file, `{dir}/custom/{key}`, so that
/// later steps in any language can read it without a parser.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonPipelineEnvironment {
    pub custom: BTreeMap<String, String>,
}

impl CommonPipelineEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a custom value
    pub fn set_custom(&mut self, key: &str, value: impl Into<String>) {
        self.custom.insert(key.to_string(), value.into());
    }

    /// Get a custom value
    pub fn custom(&self, key: &str) -> Option<&str> {
        self.custom.get(key).map(String::as_str)
    }

    /// Take over every value of `other`, replacing values with the same key
    pub fn merge(&mut self, other: &CommonPipelineEnvironment) {
        for (key, value) in &other.custom {
            self.custom.insert(key.clone(), value.clone());
        }
    }

    /// Write every value below `dir`
    pub fn persist(&self, dir: &Path) -> Result<()> {
        let custom_dir = dir.join("custom");
        std::fs::create_dir_all(&custom_dir)
            .with_context(|| format!("Failed to create {}", custom_dir.display()))?;

        for (key, value) in &self.custom {
            let path = value_path(&custom_dir, key)?;
            std::fs::write(&path, value)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            debug!("wrote {}", path.display());
        }

        Ok(())
    }

    /// Read values previously written with `persist`
    ///
    /// A missing directory yields an empty environment.
    pub fn load(dir: &Path) -> Result<Self> {
        let custom_dir = dir.join("custom");
        let mut env = Self::new();
        if !custom_dir.is_dir() {
            return Ok(env);
        }

        let entries = std::fs::read_dir(&custom_dir)
            .with_context(|| format!("Failed to read {}", custom_dir.display()))?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let key = entry.file_name().to_string_lossy().into_owned();
            let value = std::fs::read_to_string(entry.path())
                .with_context(|| format!("Failed to read {}", entry.path().display()))?;
            env.custom.insert(key, value);
        }

        Ok(env)
    }
}

fn value_path(custom_dir: &Path, key: &str) -> Result<PathBuf> {
    if key.is_empty() || key.contains(['/', '\\']) || key == "." || key == ".." {
        anyhow::bail!("Invalid pipeline environment key: {:?}", key);
    }
    Ok(custom_dir.join(key))
}
