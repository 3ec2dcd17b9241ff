//! CLI command definitions

use crate::core::config::StepsConfig;
use crate::cpi::ServiceKeySource;
use crate::steps::{
    GetPackageListOptions, PollPolicy, ScriptCollectionDeployOptions, StepError,
    ValueMappingUploadOptions,
};
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

/// Deploy a script collection
#[derive(Debug, Args, Clone)]
pub struct ScriptCollectionDeployCommand {
    /// ID of the script collection designtime artifact
    #[arg(long)]
    pub script_collection_id: Option<String>,

    /// Designtime version to deploy
    #[arg(long)]
    pub version: Option<String>,

    /// Number of status requests before giving up
    #[arg(long)]
    pub retries: Option<u32>,

    /// Delay between status requests (in seconds)
    #[arg(long)]
    pub poll_interval_secs: Option<u64>,

    /// Return once the deployment is accepted, without polling its status
    #[arg(long)]
    pub no_wait: bool,
}

/// List integration packages
#[derive(Debug, Args, Clone)]
pub struct GetPackageListCommand {}

/// Upload a value mapping
#[derive(Debug, Args, Clone)]
pub struct ValueMappingUploadCommand {
    #[arg(long)]
    pub value_mapping_id: Option<String>,

    #[arg(long)]
    pub value_mapping_name: Option<String>,

    /// Integration package that receives the artifact
    #[arg(long)]
    pub package_id: Option<String>,

    /// Path to the value mapping zip archive
    #[arg(long)]
    pub file_path: Option<PathBuf>,
}

/// Validate configuration
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {}

/// Show step run history
#[derive(Debug, Args, Clone)]
pub struct HistoryCommand {
    /// Step name to filter by, e.g. scriptCollectionDeploy
    #[arg(short, long)]
    pub step: Option<String>,

    /// Number of recent runs to show
    #[arg(short, long, default_value_t = 10)]
    pub limit: usize,

    /// Show a specific run ID
    #[arg(long)]
    pub run_id: Option<String>,
}

fn require(value: Option<String>, name: &str) -> Result<String, StepError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| StepError::Config(format!("missing required parameter {}", name)))
}

fn service_key(
    config: &StepsConfig,
    cli_key: Option<&str>,
    step_key: Option<&str>,
) -> Result<ServiceKeySource, StepError> {
    config
        .resolve_service_key(cli_key, step_key)
        .map(ServiceKeySource::new)
        .ok_or_else(|| StepError::Config("missing required parameter apiServiceKey".to_string()))
}

impl ScriptCollectionDeployCommand {
    /// Merge flags over the config file section
    pub fn to_options(
        &self,
        config: &StepsConfig,
        cli_key: Option<&str>,
    ) -> Result<ScriptCollectionDeployOptions, StepError> {
        let section = config.script_collection_deploy();
        let key = service_key(config, cli_key, section.api_service_key.as_deref())?;
        let id = require(
            self.script_collection_id.clone().or(section.script_collection_id),
            "scriptCollectionId",
        )?;

        let mut options = ScriptCollectionDeployOptions::new(key, id);
        if let Some(version) = self.version.clone().or(section.version) {
            options.version = version;
        }

        let defaults = PollPolicy::script_collection();
        options.poll = PollPolicy::new(
            self.retries.or(section.retries).unwrap_or(defaults.retries),
            self.poll_interval_secs
                .or(section.poll_interval_secs)
                .map(Duration::from_secs)
                .unwrap_or(defaults.interval),
        );
        options.wait = !self.no_wait && section.wait.unwrap_or(true);

        options.validate()?;
        Ok(options)
    }
}

impl GetPackageListCommand {
    pub fn to_options(
        &self,
        config: &StepsConfig,
        cli_key: Option<&str>,
    ) -> Result<GetPackageListOptions, StepError> {
        let section = config.get_package_list();
        let key = service_key(config, cli_key, section.api_service_key.as_deref())?;
        Ok(GetPackageListOptions::new(key))
    }
}

impl ValueMappingUploadCommand {
    pub fn to_options(
        &self,
        config: &StepsConfig,
        cli_key: Option<&str>,
    ) -> Result<ValueMappingUploadOptions, StepError> {
        let section = config.value_mapping_artifact_upload();
        let key = service_key(config, cli_key, section.api_service_key.as_deref())?;

        let file_path = self
            .file_path
            .clone()
            .or(section.file_path.map(PathBuf::from))
            .ok_or_else(|| StepError::Config("missing required parameter filePath".to_string()))?;

        let options = ValueMappingUploadOptions {
            api_service_key: key,
            value_mapping_id: require(
                self.value_mapping_id.clone().or(section.value_mapping_id),
                "valueMappingId",
            )?,
            value_mapping_name: require(
                self.value_mapping_name.clone().or(section.value_mapping_name),
                "valueMappingName",
            )?,
            package_id: require(self.package_id.clone().or(section.package_id), "packageId")?,
            file_path,
        };

        options.validate()?;
        Ok(options)
    }
}
