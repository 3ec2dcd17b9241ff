//! Tenant API endpoints

use crate::client::HttpRequest;

/// Version deployed when none is given
pub const ACTIVE_VERSION: &str = "Active";

/// An authenticated view of one tenant's API
#[derive(Clone)]
pub struct ApiSession {
    host: String,
    token: String,
}

impl std::fmt::Debug for ApiSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiSession").field("host", &self.host).finish_non_exhaustive()
    }
}

impl ApiSession {
    pub fn new(host: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            token: token.into(),
        }
    }

    /// GET with bearer auth and `Accept: application/json`
    pub fn get(&self, url: &str) -> HttpRequest {
        HttpRequest::get(url).accept_json().bearer(&self.token)
    }

    /// POST with bearer auth and `Accept: application/json`
    pub fn post(&self, url: &str) -> HttpRequest {
        HttpRequest::post(url).accept_json().bearer(&self.token)
    }

    pub fn deploy_script_collection_url(&self, id: &str, version: &str) -> String {
        format!(
            "{}/api/v1/DeployScriptCollectionDesigntimeArtifact?Id='{}'&Version='{}'",
            self.host, id, version
        )
    }

    pub fn build_and_deploy_status_url(&self, task_id: &str) -> String {
        format!("{}/api/v1/BuildAndDeployStatus(TaskId='{}')", self.host, task_id)
    }

    pub fn artifact_error_information_url(&self, artifact_id: &str) -> String {
        format!(
            "{}/api/v1/IntegrationRuntimeArtifacts('{}')/ErrorInformation/$value",
            self.host, artifact_id
        )
    }

    pub fn integration_packages_url(&self) -> String {
        format!("{}/api/v1/IntegrationPackages", self.host)
    }

    pub fn value_mapping_designtime_artifacts_url(&self) -> String {
        format!("{}/api/v1/ValueMappingDesigntimeArtifacts", self.host)
    }
}
