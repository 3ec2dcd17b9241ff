//! CLI output formatting

use crate::core::{CommonPipelineEnvironment, RunRecord, RunStatus};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while a step talks to the tenant
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Format a run status for display
pub fn format_status(status: RunStatus) -> String {
    match status {
        RunStatus::Running => style("RUNNING").yellow().to_string(),
        RunStatus::Completed => style("COMPLETED").green().to_string(),
        RunStatus::Failed => style("FAILED").red().to_string(),
    }
}

/// One-line summary of a run
pub fn format_run_record(run: &RunRecord) -> String {
    let status_icon = match run.status {
        RunStatus::Completed => CHECK,
        RunStatus::Failed => CROSS,
        RunStatus::Running => SPINNER,
    };

    let duration = run
        .duration()
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} - {} - {} - {} ({})",
        status_icon,
        style(&run.run_id.to_string()[..8]).dim(),
        style(&run.step_name).bold(),
        format_status(run.status),
        style(run.started_at.format("%Y-%m-%d %H:%M:%S")).dim(),
        duration
    )
}

/// Multi-line details of a run
pub fn format_run_details(run: &RunRecord) -> String {
    let mut lines = vec![
        format!("{} Run Details", INFO),
        format!("  ID: {}", style(run.run_id).cyan()),
        format!("  Step: {}", style(&run.step_name).bold()),
        format!("  Status: {}", format_status(run.status)),
        format!("  Started: {}", style(run.started_at.to_rfc3339()).dim()),
    ];
    if let Some(completed) = run.completed_at {
        lines.push(format!("  Completed: {}", style(completed.to_rfc3339()).dim()));
    }
    if let Some(duration) = run.duration() {
        lines.push(format!("  Duration: {}", style(format_duration(duration)).dim()));
    }
    if let Some(output) = &run.output {
        lines.push(format!("  Output: {}", output));
    }
    if let Some(error) = &run.error {
        lines.push(format!("  Error: {}", style(error).red()));
    }
    lines.join("\n")
}

/// Format the values a step handed to the pipeline environment
pub fn format_environment(env: &CommonPipelineEnvironment) -> String {
    env.custom
        .iter()
        .map(|(key, value)| format!("  custom.{} = {}", style(key).cyan(), format_output(value, 5)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration as `1h 2m 3s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Format output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}
