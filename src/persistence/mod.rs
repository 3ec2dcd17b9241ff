//! Persistence layer for step run history

#[cfg(feature = "sqlite")]
pub mod store;

#[cfg(feature = "sqlite")]
pub use store::SqliteHistoryStore;

pub use crate::core::{RunRecord, RunStatus};
use anyhow::Result;
use uuid::Uuid;

/// Trait for history backends
#[async_trait::async_trait]
pub trait HistoryBackend: Send + Sync {
    /// Save (insert or update) a step run
    async fn save_run(&self, run: &RunRecord) -> Result<()>;

    /// Load a run by ID
    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>>;

    /// List runs of one step, newest first
    async fn list_runs(&self, step_name: &str) -> Result<Vec<RunRecord>>;

    /// List the most recent runs across all steps, newest first
    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>>;

    /// List all step names that have runs
    async fn list_steps(&self) -> Result<Vec<String>>;
}

/// In-memory history (for testing or ephemeral use)
pub struct InMemoryHistory {
    runs: tokio::sync::RwLock<std::collections::HashMap<Uuid, RunRecord>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self {
            runs: tokio::sync::RwLock::new(std::collections::HashMap::new()),
        }
    }
}

impl Default for InMemoryHistory {
    fn default() -> Self {
        Self::new()
    }
}

fn newest_first(mut runs: Vec<RunRecord>) -> Vec<RunRecord> {
    runs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    runs
}

#[async_trait::async_trait]
impl HistoryBackend for InMemoryHistory {
    async fn save_run(&self, run: &RunRecord) -> Result<()> {
        let mut runs = self.runs.write().await;
        runs.insert(run.run_id, run.clone());
        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>> {
        let runs = self.runs.read().await;
        Ok(runs.get(&run_id).cloned())
    }

    async fn list_runs(&self, step_name: &str) -> Result<Vec<RunRecord>> {
        let runs = self.runs.read().await;
        let matching = runs
            .values()
            .filter(|r| r.step_name == step_name)
            .cloned()
            .collect();
        Ok(newest_first(matching))
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let runs = self.runs.read().await;
        let mut all = newest_first(runs.values().cloned().collect());
        all.truncate(limit);
        Ok(all)
    }

    async fn list_steps(&self) -> Result<Vec<String>> {
        let runs = self.runs.read().await;
        let mut steps: Vec<String> = runs.values().map(|r| r.step_name.clone()).collect();
        steps.sort();
        steps.dedup();
        Ok(steps)
    }
}
