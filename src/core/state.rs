//! Step run state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Status of one step run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunStatus {
    /// Step is currently running
    Running,
    /// Step finished successfully
    Completed,
    /// Step failed
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Running => "Running",
            RunStatus::Completed => "Completed",
            RunStatus::Failed => "Failed",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RunStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Running" => Ok(RunStatus::Running),
            "Completed" => Ok(RunStatus::Completed),
            "Failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status: {}", other)),
        }
    }
}

/// Record of a single step run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique run ID
    pub run_id: Uuid,

    /// Step name, e.g. `scriptCollectionDeploy`
    pub step_name: String,

    pub status: RunStatus,

    pub started_at: DateTime<Utc>,

    pub completed_at: Option<DateTime<Utc>>,

    /// Value the step handed to the pipeline environment
    pub output: Option<String>,

    /// Error chain if the step failed
    pub error: Option<String>,
}

impl RunRecord {
    /// Start a new run
    pub fn start(step_name: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            step_name: step_name.to_string(),
            status: RunStatus::Running,
            started_at: Utc::now(),
            completed_at: None,
            output: None,
            error: None,
        }
    }

    /// Mark run as completed
    pub fn complete(&mut self, output: Option<String>) {
        self.status = RunStatus::Completed;
        self.completed_at = Some(Utc::now());
        self.output = output;
    }

    /// Mark run as failed
    pub fn fail(&mut self, error: String) {
        self.status = RunStatus::Failed;
        self.completed_at = Some(Utc::now());
        self.error = Some(error);
    }

    /// Wall-clock duration, if the run has finished
    pub fn duration(&self) -> Option<std::time::Duration> {
        self.completed_at
            .and_then(|end| end.signed_duration_since(self.started_at).to_std().ok())
    }
}
