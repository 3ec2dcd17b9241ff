//! SQLite-based history store

use crate::persistence::{HistoryBackend, RunRecord, RunStatus};
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

const SELECT_COLUMNS: &str =
    "SELECT id, step_name, status, started_at, completed_at, output, error FROM runs";

/// SQLite history store
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

impl SqliteHistoryStore {
    /// Open (or create) a store at `db_path`; `:memory:` is accepted
    pub async fn new(db_path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .context("Invalid database path")?
            .create_if_missing(true);

        // a single connection keeps `:memory:` databases alive and shared
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let store = Self { pool };
        store.init().await?;

        Ok(store)
    }

    /// Create store with default path
    pub async fn with_default_path() -> Result<Self> {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| std::path::PathBuf::from("."));
        Self::in_dir(&data_dir.join("cpi-steps")).await
    }

    /// Create store as `history.db` inside `dir`
    pub async fn in_dir(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;

        let db_path = dir.join("history.db");
        let db_path = db_path
            .to_str()
            .with_context(|| format!("Non UTF-8 database path: {}", db_path.display()))?;
        Self::new(db_path).await
    }

    /// Initialize database schema
    async fn init(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS runs (
                id TEXT PRIMARY KEY,
                step_name TEXT NOT NULL,
                status TEXT NOT NULL,
                started_at TEXT NOT NULL,
                completed_at TEXT,
                output TEXT,
                error TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_step_name ON runs(step_name);
            CREATE INDEX IF NOT EXISTS idx_started_at ON runs(started_at);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    fn to_naive(dt: DateTime<Utc>) -> NaiveDateTime {
        dt.naive_utc()
    }

    fn from_naive(dt: NaiveDateTime) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(dt, Utc)
    }

    fn from_row(row: &SqliteRow) -> Result<RunRecord> {
        let status: String = row.get("status");
        Ok(RunRecord {
            run_id: Uuid::parse_str(&row.get::<String, _>("id"))?,
            step_name: row.get("step_name"),
            status: RunStatus::from_str(&status).map_err(anyhow::Error::msg)?,
            started_at: Self::from_naive(row.get("started_at")),
            completed_at: row
                .get::<Option<NaiveDateTime>, _>("completed_at")
                .map(Self::from_naive),
            output: row.get("output"),
            error: row.get("error"),
        })
    }
}

#[async_trait::async_trait]
impl HistoryBackend for SqliteHistoryStore {
    async fn save_run(&self, run: &RunRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO runs
            (id, step_name, status, started_at, completed_at, output, error)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(run.run_id.to_string())
        .bind(&run.step_name)
        .bind(run.status.to_string())
        .bind(Self::to_naive(run.started_at))
        .bind(run.completed_at.map(Self::to_naive))
        .bind(&run.output)
        .bind(&run.error)
        .execute(&self.pool)
        .await
        .context("Failed to save run")?;

        Ok(())
    }

    async fn load_run(&self, run_id: Uuid) -> Result<Option<RunRecord>> {
        let row = sqlx::query(&format!("{} WHERE id = ?1", SELECT_COLUMNS))
            .bind(run_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .context("Failed to load run")?;

        row.as_ref().map(Self::from_row).transpose()
    }

    async fn list_runs(&self, step_name: &str) -> Result<Vec<RunRecord>> {
        let rows = sqlx::query(&format!(
            "{} WHERE step_name = ?1 ORDER BY started_at DESC",
            SELECT_COLUMNS
        ))
        .bind(step_name)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list runs")?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<RunRecord>> {
        let rows = sqlx::query(&format!(
            "{} ORDER BY started_at DESC LIMIT ?1",
            SELECT_COLUMNS
        ))
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list recent runs")?;

        rows.iter().map(Self::from_row).collect()
    }

    async fn list_steps(&self) -> Result<Vec<String>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT step_name
            FROM runs
            ORDER BY step_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list steps")?;

        Ok(rows.iter().map(|row| row.get("step_name")).collect())
    }
}
