//! Command-line interface

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};
use commands::{
    GetPackageListCommand, HistoryCommand, ScriptCollectionDeployCommand, ValidateCommand,
    ValueMappingUploadCommand,
};
use std::ffi::OsString;

/// Pipeline steps for SAP Cloud Platform Integration
#[derive(Debug, Parser, Clone)]
#[command(name = "cpi-steps")]
#[command(author = "Pipeline Contributors")]
#[command(version)]
#[command(
    about = "CI/CD pipeline steps for SAP Cloud Platform Integration tenants",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to step configuration file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Service key as inline JSON or path to a JSON file
    #[arg(long, global = true)]
    pub service_key: Option<String>,

    /// Directory of the common pipeline environment
    #[arg(long, global = true, default_value = crate::core::DEFAULT_ENV_DIR)]
    pub env_dir: String,

    /// Don't save the run to history
    #[arg(long, global = true)]
    pub no_history: bool,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,
}

/// Available commands
#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Deploy a script collection into the CPI runtime
    ScriptCollectionDeploy(ScriptCollectionDeployCommand),

    /// List the integration packages of the tenant
    GetPackageList(GetPackageListCommand),

    /// Upload a value mapping archive as a designtime artifact
    #[command(name = "value-mapping-artifact-upload")]
    ValueMappingArtifactUpload(ValueMappingUploadCommand),

    /// Validate configuration and service key without calling the tenant
    Validate(ValidateCommand),

    /// Show step run history
    History(HistoryCommand),
}

impl Cli {
    /// Parse CLI arguments from environment
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Parse CLI arguments from a slice
    pub fn try_parse_from<I, T>(itr: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(itr)
    }
}
