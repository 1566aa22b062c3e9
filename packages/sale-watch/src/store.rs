//! Seen-set storage.
//!
//! A single-table SQLite file holding every identity key that has already
//! been delivered. Keys are only ever inserted.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};
use url::Url;

use crate::error::Result;
use crate::listing::ListingRecord;

/// New listings for this run plus the page they came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunDiff {
    pub new_messages: Vec<String>,
    /// URL of the last processed record; `None` when nothing was extracted.
    pub page_url: Option<Url>,
}

pub struct SeenStore {
    pool: SqlitePool,
}

impl SeenStore {
    /// Open (creating if needed) the seen-set database at `path`.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path.as_ref())
            .create_if_missing(true);
        Self::connect(options).await
    }

    /// Create an in-memory store (for testing).
    pub async fn in_memory() -> Result<Self> {
        Self::connect(SqliteConnectOptions::from_str("sqlite::memory:")?).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One connection: keeps an in-memory database alive for the pool's
        // lifetime and serializes the run's statements.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        sqlx::query("CREATE TABLE IF NOT EXISTS seen (id TEXT PRIMARY KEY)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Filter `records` down to the ones never delivered before and record
    /// their keys.
    ///
    /// All inserts share one transaction committed after the last record, so
    /// an error part-way leaves the seen set untouched.
    pub async fn diff_since_last_run(&self, records: &[ListingRecord]) -> Result<RunDiff> {
        let mut tx = self.pool.begin().await?;
        let mut diff = RunDiff::default();

        for record in records {
            let seen = sqlx::query_scalar::<_, i64>("SELECT 1 FROM seen WHERE id = ?")
                .bind(&record.id)
                .fetch_optional(&mut *tx)
                .await?;

            if seen.is_none() {
                debug!(id = %record.id, "New listing");
                diff.new_messages.push(record.body.clone());
                sqlx::query("INSERT INTO seen (id) VALUES (?)")
                    .bind(&record.id)
                    .execute(&mut *tx)
                    .await?;
            }

            // Every record of a run shares the same page URL.
            diff.page_url = Some(record.page_url.clone());
        }

        tx.commit().await?;

        info!(
            extracted = records.len(),
            new = diff.new_messages.len(),
            "Seen set updated"
        );
        Ok(diff)
    }

    pub async fn contains(&self, id: &str) -> Result<bool> {
        let hit = sqlx::query_scalar::<_, i64>("SELECT 1 FROM seen WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(hit.is_some())
    }

    pub async fn count(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM seen")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Release the database handle.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

/// Open the store at `path`, diff `records`, and close the store again on
/// every exit path.
pub async fn diff_since_last_run(path: &Path, records: &[ListingRecord]) -> Result<RunDiff> {
    let store = SeenStore::open(path).await?;
    let result = store.diff_since_last_run(records).await;
    store.close().await;
    result
}
