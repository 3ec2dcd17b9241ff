//! `getPackageList` - list the integration packages of a tenant

use crate::client::{HttpSender, Method};
use crate::core::{CommonPipelineEnvironment, INTEGRATION_PACKAGE_LIST};
use crate::cpi::{self, ServiceKeySource};
use crate::steps::StepError;
use tracing::{debug, error, info, warn};

pub const STEP_NAME: &str = "getPackageList";

/// Options for `getPackageList`
#[derive(Debug, Clone)]
pub struct GetPackageListOptions {
    pub api_service_key: ServiceKeySource,
}

impl GetPackageListOptions {
    pub fn new(api_service_key: ServiceKeySource) -> Self {
        Self { api_service_key }
    }
}

/// Fetch the package list and store the IDs, comma separated, in
/// `custom.integrationPackageList`
///
/// Returns the IDs in the order the tenant listed them.
pub async fn run_get_package_list(
    options: &GetPackageListOptions,
    sender: &dyn HttpSender,
    env: &mut CommonPipelineEnvironment,
) -> Result<Vec<String>, StepError> {
    let service_key = options.api_service_key.load()?;
    let api = cpi::authenticate(sender, &service_key).await?;

    let url = api.integration_packages_url();
    let response = sender
        .send(api.get(&url))
        .await
        .map_err(|e| StepError::http(Method::Get, &url, e))?;

    if response.status != 200 {
        error!(
            "a HTTP error occurred! Response body: {}, Response status code: {}",
            response.body, response.status
        );
        return Err(StepError::unexpected_status(
            "unable to get integration package list",
            response.status,
            response.body,
        ));
    }

    let json: serde_json::Value = response
        .json()
        .map_err(|e| StepError::Json(format!("{}: {}", e, response.body)))?;
    let package_ids = package_ids(&json);

    info!(count = package_ids.len(), "retrieved integration package list");
    env.set_custom(INTEGRATION_PACKAGE_LIST, package_ids.join(","));
    Ok(package_ids)
}

/// Collect `d.results[*].Id`
fn package_ids(json: &serde_json::Value) -> Vec<String> {
    let Some(results) = json.pointer("/d/results").and_then(|v| v.as_array()) else {
        warn!("response has no d.results array");
        return Vec::new();
    };

    results
        .iter()
        .filter_map(|entry| match entry.get("Id").and_then(|id| id.as_str()) {
            Some(id) => Some(id.to_string()),
            None => {
                debug!("skipping package entry without string Id: {}", entry);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_package_ids_in_order() {
        let body = json!({
            "d": {
                "results": [
                    {"Id": "PkgB", "Name": "B"},
                    {"Id": "PkgA", "Name": "A"}
                ]
            }
        });
        assert_eq!(package_ids(&body), vec!["PkgB", "PkgA"]);
    }

    #[test]
    fn test_package_ids_skip_non_string() {
        let body = json!({"d": {"results": [{"Id": 7}, {"Name": "x"}, {"Id": "Ok"}]}});
        assert_eq!(package_ids(&body), vec!["Ok"]);
    }

    #[test]
    fn test_package_ids_missing_results() {
        assert!(package_ids(&json!({"d": {}})).is_empty());
        assert!(package_ids(&json!({"d": {"results": []}})).is_empty());
    }
}
