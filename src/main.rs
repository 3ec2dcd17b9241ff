use anyhow::{Context, Result};
use cpi_steps::cli::commands::HistoryCommand;
use cpi_steps::cli::output::*;
use cpi_steps::cli::{Cli, Command};
use cpi_steps::client::{ClientConfig, ReqwestSender};
use cpi_steps::core::config::StepsConfig;
use cpi_steps::core::{CommonPipelineEnvironment, RunRecord};
use cpi_steps::persistence::{HistoryBackend, InMemoryHistory};
use cpi_steps::steps::{
    self, get_package_list, script_collection_deploy, value_mapping_upload, StepError,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let config = match &cli.config {
        Some(path) => StepsConfig::from_file(path)
            .with_context(|| format!("Failed to load step config {}", path))?,
        None => StepsConfig::default(),
    };

    match &cli.command {
        Command::ScriptCollectionDeploy(cmd) => {
            let options = cmd.to_options(&config, cli.service_key.as_deref())?;
            let sender = build_sender(&config)?;
            run_step(&cli, script_collection_deploy::STEP_NAME, |mut env| async move {
                let result = steps::run_script_collection_deploy(&options, &sender, &mut env).await;
                (env, result)
            })
            .await?
        }
        Command::GetPackageList(cmd) => {
            let options = cmd.to_options(&config, cli.service_key.as_deref())?;
            let sender = build_sender(&config)?;
            run_step(&cli, get_package_list::STEP_NAME, |mut env| async move {
                let result = steps::run_get_package_list(&options, &sender, &mut env).await;
                (env, result.map(|_| ()))
            })
            .await?
        }
        Command::ValueMappingArtifactUpload(cmd) => {
            let options = cmd.to_options(&config, cli.service_key.as_deref())?;
            let sender = build_sender(&config)?;
            run_step(&cli, value_mapping_upload::STEP_NAME, |mut env| async move {
                let result = steps::run_value_mapping_upload(&options, &sender, &mut env).await;
                (env, result)
            })
            .await?
        }
        Command::Validate(_) => validate(&cli, &config)?,
        Command::History(cmd) => show_history(cmd, cli.json).await?,
    }

    Ok(())
}

fn build_sender(config: &StepsConfig) -> Result<ReqwestSender> {
    let mut client_config = ClientConfig::default();
    if let Some(timeout) = config.general.timeout_secs {
        client_config = client_config.with_timeout(timeout);
    }
    ReqwestSender::new(client_config).context("Failed to create HTTP client")
}

async fn open_history() -> Result<Arc<dyn HistoryBackend>> {
    #[cfg(feature = "sqlite")]
    {
        let store = cpi_steps::persistence::SqliteHistoryStore::with_default_path().await?;
        Ok(Arc::new(store))
    }
    #[cfg(not(feature = "sqlite"))]
    {
        Ok(Arc::new(InMemoryHistory::new()))
    }
}

/// Run one step against the environment on disk, record it, and report
async fn run_step<F, Fut>(cli: &Cli, step_name: &str, step: F) -> Result<()>
where
    F: FnOnce(CommonPipelineEnvironment) -> Fut,
    Fut: Future<Output = (CommonPipelineEnvironment, Result<(), StepError>)>,
{
    let env_dir = Path::new(&cli.env_dir);
    let mut env = CommonPipelineEnvironment::load(env_dir)
        .context("Failed to load common pipeline environment")?;

    let history: Arc<dyn HistoryBackend> = if cli.no_history {
        Arc::new(InMemoryHistory::new())
    } else {
        open_history().await?
    };

    println!("{} Running step {}", ROCKET, style(step_name).bold());
    let mut run = RunRecord::start(step_name);
    history.save_run(&run).await?;

    // the step writes into its own environment so its values are always reported
    let spinner = create_spinner(step_name);
    let (output, result) = step(CommonPipelineEnvironment::new()).await;
    spinner.finish_and_clear();

    match result {
        Ok(()) => {
            env.merge(&output);
            env.persist(env_dir)
                .context("Failed to write common pipeline environment")?;
            run.complete(output.custom.values().next().cloned());
            history.save_run(&run).await?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                if !output.custom.is_empty() {
                    println!("{}", format_environment(&output));
                }
                println!(
                    "{} {} completed {}",
                    CHECK,
                    style(step_name).bold(),
                    style("successfully").green()
                );
            }
            info!(step = step_name, run_id = %run.run_id, "step execution finished");
            Ok(())
        }
        Err(e) => {
            let message = format!("{:#}", anyhow::Error::new(e));
            run.fail(message.clone());
            history.save_run(&run).await?;

            println!("{} {} {}", CROSS, style(step_name).bold(), style("failed").red());
            error!(step = step_name, "step execution failed: {}", message);
            std::process::exit(1);
        }
    }
}

fn validate(cli: &Cli, config: &StepsConfig) -> Result<()> {
    println!("{} Validating configuration...", INFO);

    let key = config.resolve_service_key(cli.service_key.as_deref(), None);
    match key {
        Some(source) => match cpi_steps::ServiceKey::load(&source) {
            Ok(key) => {
                println!("{} Service key is valid", CHECK);
                println!("  Host: {}", style(&key.oauth.host).bold());
                println!("  Token URL: {}", style(&key.oauth.token_url).dim());
                println!("  Client ID: {}", style(&key.oauth.client_id).cyan());
            }
            Err(e) => {
                println!("{} Service key is invalid:", CROSS);
                println!("  {}", style(e).red());
                std::process::exit(1);
            }
        },
        None => println!("{} No general service key configured", WARN),
    }

    let sections = &config.steps;
    println!("{} Configuration is valid!", CHECK);
    println!(
        "  Steps configured: {}",
        style(
            [
                sections
                    .script_collection_deploy
                    .as_ref()
                    .map(|_| script_collection_deploy::STEP_NAME),
                sections
                    .get_package_list
                    .as_ref()
                    .map(|_| get_package_list::STEP_NAME),
                sections
                    .value_mapping_artifact_upload
                    .as_ref()
                    .map(|_| value_mapping_upload::STEP_NAME),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
        )
        .cyan()
    );

    if cli.json {
        println!("\n{}", serde_json::to_string_pretty(config)?);
    }
    Ok(())
}

async fn show_history(cmd: &HistoryCommand, json: bool) -> Result<()> {
    let store = open_history().await?;

    if let Some(run_id) = &cmd.run_id {
        let run_id = uuid::Uuid::parse_str(run_id).context("Invalid run ID format")?;
        match store.load_run(run_id).await? {
            Some(run) if json => println!("{}", serde_json::to_string_pretty(&run)?),
            Some(run) => println!("{}", format_run_details(&run)),
            None => println!("{} Run not found", WARN),
        }
        return Ok(());
    }

    let mut runs = match &cmd.step {
        Some(step) => store.list_runs(step).await?,
        None => store.list_recent(cmd.limit).await?,
    };
    runs.truncate(cmd.limit);

    if json {
        let data = serde_json::json!({ "runs": runs });
        println!("{}", serde_json::to_string_pretty(&data)?);
        return Ok(());
    }

    if runs.is_empty() {
        println!("{} No runs found", INFO);
        return Ok(());
    }

    println!("{} Run history (showing latest {}):", INFO, cmd.limit);
    for run in &runs {
        println!("  {}", format_run_record(run));
    }

    Ok(())
}
