//! `scriptCollectionDeploy` - deploy a script collection into the CPI runtime

use crate::client::{HttpSender, Method};
use crate::core::{CommonPipelineEnvironment, SCRIPT_COLLECTION_DEPLOY_STATUS};
use crate::cpi::{self, ApiSession, ServiceKeySource, ACTIVE_VERSION};
use crate::steps::poll::{poll_until, PollDecision, PollPolicy};
use crate::steps::StepError;
use tracing::{debug, error, info, warn};

pub const STEP_NAME: &str = "scriptCollectionDeploy";

/// Options for `scriptCollectionDeploy`
#[derive(Debug, Clone)]
pub struct ScriptCollectionDeployOptions {
    pub api_service_key: ServiceKeySource,

    pub script_collection_id: String,

    /// Designtime version to deploy
    pub version: String,

    /// Status polling budget
    pub poll: PollPolicy,

    /// Wait for the build task to finish before returning
    pub wait: bool,
}

impl ScriptCollectionDeployOptions {
    pub fn new(
        api_service_key: ServiceKeySource,
        script_collection_id: impl Into<String>,
    ) -> Self {
        Self {
            api_service_key,
            script_collection_id: script_collection_id.into(),
            version: ACTIVE_VERSION.to_string(),
            poll: PollPolicy::script_collection(),
            wait: true,
        }
    }

    pub fn validate(&self) -> Result<(), StepError> {
        if self.script_collection_id.trim().is_empty() {
            return Err(StepError::Config("scriptCollectionId must not be empty".to_string()));
        }
        if self.version.trim().is_empty() {
            return Err(StepError::Config("version must not be empty".to_string()));
        }
        if self.wait && self.poll.retries == 0 {
            return Err(StepError::Config("retries must be greater than zero".to_string()));
        }
        Ok(())
    }
}

/// Status reported by `BuildAndDeployStatus`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployStatus {
    Deploying,
    Success,
    Fail,
    FailOnLicenseError,
    Other(String),
}

impl DeployStatus {
    pub fn parse(status: &str) -> Self {
        match status {
            "DEPLOYING" => DeployStatus::Deploying,
            "SUCCESS" => DeployStatus::Success,
            "FAIL" => DeployStatus::Fail,
            "FAIL_ON_LICENSE_ERROR" => DeployStatus::FailOnLicenseError,
            other => DeployStatus::Other(other.to_string()),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, DeployStatus::Fail | DeployStatus::FailOnLicenseError)
    }
}

/// Deploy the script collection and, if asked to, wait for the build task
///
/// Writes `custom.scriptCollectionDeployStatus` on success: `SUCCESS` when
/// the task was waited on, `ACCEPTED` otherwise.
pub async fn run_script_collection_deploy(
    options: &ScriptCollectionDeployOptions,
    sender: &dyn HttpSender,
    env: &mut CommonPipelineEnvironment,
) -> Result<(), StepError> {
    options.validate()?;

    let service_key = options.api_service_key.load()?;
    let api = cpi::authenticate(sender, &service_key).await?;

    let deploy_url =
        api.deploy_script_collection_url(&options.script_collection_id, &options.version);
    debug!("deploy URL: {}", deploy_url);

    let response = sender
        .send(api.post(&deploy_url))
        .await
        .map_err(|e| StepError::http(Method::Post, &deploy_url, e))?;

    if response.status != 202 {
        error!(
            "a HTTP error occurred! Response body: {}, Response status code: {}",
            response.body, response.status
        );
        return Err(StepError::unexpected_status(
            "script collection deployment failed",
            response.status,
            response.body,
        ));
    }

    info!(
        script_collection_id = %options.script_collection_id,
        "successfully deployed into CPI runtime"
    );

    let task_id = response.body.trim().trim_matches('"').to_string();
    if !options.wait || task_id.is_empty() {
        if options.wait {
            warn!("deploy response carried no task id, not waiting for the build");
        }
        env.set_custom(SCRIPT_COLLECTION_DEPLOY_STATUS, "ACCEPTED");
        return Ok(());
    }

    poll_deployment_status(sender, &api, options, &task_id).await?;
    env.set_custom(SCRIPT_COLLECTION_DEPLOY_STATUS, "SUCCESS");
    Ok(())
}

/// Poll the build task until it settles
///
/// On `FAIL`/`FAIL_ON_LICENSE_ERROR` the artifact's error information is
/// fetched and returned in the error.
pub async fn poll_deployment_status(
    sender: &dyn HttpSender,
    api: &ApiSession,
    options: &ScriptCollectionDeployOptions,
    task_id: &str,
) -> Result<(), StepError> {
    let status = poll_until(&options.poll, move || async move {
        let status = get_deploy_status(sender, api, options, task_id).await?;
        if status == DeployStatus::Deploying {
            info!(task_id, "script collection is still deploying");
            Ok(PollDecision::Pending)
        } else {
            Ok(PollDecision::Done(status))
        }
    })
    .await?;

    match status {
        DeployStatus::Success => Ok(()),
        failed if failed.is_failure() => {
            let details = get_deploy_error(sender, api, options).await?;
            Err(StepError::DeploymentFailed {
                artifact_id: options.script_collection_id.clone(),
                details,
            })
        }
        other => {
            warn!(?other, "unrecognised deploy status, treating as settled");
            Ok(())
        }
    }
}

/// Read `d.Status` from `BuildAndDeployStatus(TaskId=..)`
pub async fn get_deploy_status(
    sender: &dyn HttpSender,
    api: &ApiSession,
    options: &ScriptCollectionDeployOptions,
    task_id: &str,
) -> Result<DeployStatus, StepError> {
    let status_url = api.build_and_deploy_status_url(task_id);
    let request = api.get(&status_url).header("Content-Type", "application/json");

    let response = sender
        .send(request)
        .await
        .map_err(|e| StepError::http(Method::Get, &status_url, e))?;

    if response.status != 200 {
        error!(
            "a HTTP error occurred! Response body: {}, response status code: {}",
            response.body, response.status
        );
        return Err(StepError::unexpected_status(
            "failed to get script collection artefact runtime status",
            response.status,
            response.body,
        ));
    }

    let json: serde_json::Value = response
        .json()
        .map_err(|e| StepError::Json(format!("{}: {}", e, response.body)))?;
    let status = json
        .pointer("/d/Status")
        .and_then(|v| v.as_str())
        .ok_or_else(|| StepError::Json(format!("no string d.Status in {}", response.body)))?;

    debug!(
        script_collection_id = %options.script_collection_id,
        status,
        "retrieved script collection deploy status"
    );
    Ok(DeployStatus::parse(status))
}

/// Fetch the runtime artifact's error information text
pub async fn get_deploy_error(
    sender: &dyn HttpSender,
    api: &ApiSession,
    options: &ScriptCollectionDeployOptions,
) -> Result<String, StepError> {
    let error_url = api.artifact_error_information_url(&options.script_collection_id);
    let request = api.get(&error_url).header("Content-Type", "application/json");

    let response = sender
        .send(request)
        .await
        .map_err(|e| StepError::http(Method::Get, &error_url, e))?;

    if response.status != 200 {
        error!(
            "a HTTP error occurred! Response body: {}, response status code: {}",
            response.body, response.status
        );
        return Err(StepError::unexpected_status(
            "failed to get script collection artefact deploy error details",
            response.status,
            response.body,
        ));
    }

    info!(
        script_collection_id = %options.script_collection_id,
        "Successfully retrieved script collection artefact deploy error details"
    );
    error!("script collection deploy error details: {}", response.body);
    Ok(response.body)
}
