//! `valueMappingArtifactUpload` - upload a value mapping archive as a designtime artifact

use crate::client::{HttpSender, Method};
use crate::core::{CommonPipelineEnvironment, VALUE_MAPPING_ID};
use crate::cpi::{self, ServiceKeySource};
use crate::steps::StepError;
use base64::Engine;
use serde_json::json;
use std::path::PathBuf;
use tracing::{debug, error, info};

pub const STEP_NAME: &str = "valueMappingArtifactUpload";

/// Options for `valueMappingArtifactUpload`
#[derive(Debug, Clone)]
pub struct ValueMappingUploadOptions {
    pub api_service_key: ServiceKeySource,
    pub value_mapping_id: String,
    pub value_mapping_name: String,
    pub package_id: String,

    /// Zip archive holding the value mapping
    pub file_path: PathBuf,
}

impl ValueMappingUploadOptions {
    pub fn validate(&self) -> Result<(), StepError> {
        for (name, value) in [
            ("valueMappingId", &self.value_mapping_id),
            ("valueMappingName", &self.value_mapping_name),
            ("packageId", &self.package_id),
        ] {
            if value.trim().is_empty() {
                return Err(StepError::Config(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

/// Upload the archive and store the artifact ID in `custom.valueMappingId`
pub async fn run_value_mapping_upload(
    options: &ValueMappingUploadOptions,
    sender: &dyn HttpSender,
    env: &mut CommonPipelineEnvironment,
) -> Result<(), StepError> {
    options.validate()?;

    let content = tokio::fs::read(&options.file_path)
        .await
        .map_err(|e| StepError::Io {
            path: options.file_path.display().to_string(),
            source: e,
        })?;
    debug!(
        "read {} bytes from {}",
        content.len(),
        options.file_path.display()
    );

    let service_key = options.api_service_key.load()?;
    let api = cpi::authenticate(sender, &service_key).await?;

    let url = api.value_mapping_designtime_artifacts_url();
    let body = json!({
        "Name": options.value_mapping_name,
        "Id": options.value_mapping_id,
        "PackageId": options.package_id,
        "ArtifactContent": base64::engine::general_purpose::STANDARD.encode(&content),
    });

    let response = sender
        .send(api.post(&url).json_body(&body))
        .await
        .map_err(|e| StepError::http(Method::Post, &url, e))?;

    if response.status != 201 {
        error!(
            "a HTTP error occurred! Response body: {}, Response status code: {}",
            response.body, response.status
        );
        return Err(StepError::unexpected_status(
            "value mapping artifact upload failed",
            response.status,
            response.body,
        ));
    }

    info!(
        value_mapping_id = %options.value_mapping_id,
        package_id = %options.package_id,
        "successfully uploaded value mapping artifact"
    );
    env.set_custom(VALUE_MAPPING_ID, options.value_mapping_id.clone());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_ids() {
        let mut options = ValueMappingUploadOptions {
            api_service_key: ServiceKeySource::new("key.json"),
            value_mapping_id: "VM1".to_string(),
            value_mapping_name: "Value Mapping".to_string(),
            package_id: "Pkg".to_string(),
            file_path: PathBuf::from("vm.zip"),
        };
        assert!(options.validate().is_ok());

        options.package_id = String::new();
        let err = options.validate().unwrap_err();
        assert!(err.to_string().contains("packageId"));
    }
}
