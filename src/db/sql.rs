//! SQL storage backend (SQLite via sqlx).

use serde_json::Value;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::info;

use super::{now_timestamp, Entity, Filter, FilterValue, StoreResult};

#[derive(Clone)]
pub struct SqlStore {
    pool: SqlitePool,
}

/// Execute a SQL migration file, properly handling comments
async fn execute_sql(pool: &SqlitePool, sql: &str) -> StoreResult<()> {
    for statement in sql.split(';') {
        // Strip SQL comment lines (lines starting with --)
        let cleaned: String = statement
            .lines()
            .filter(|line| !line.trim().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        let trimmed = cleaned.trim();
        if !trimmed.is_empty() {
            sqlx::query(trimmed).execute(pool).await?;
        }
    }
    Ok(())
}

/// Database file named by a `sqlite:` URL, if it is file-backed
fn sqlite_file(url: &str) -> Option<&Path> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(Path::new(path))
}

impl SqlStore {
    pub async fn connect(url: &str, max_connections: u32) -> StoreResult<Self> {
        info!("Connecting to SQL database at {}", url);

        // SQLite creates the file but not its directory
        if let Some(dir) = sqlite_file(url).and_then(Path::parent) {
            if !dir.as_os_str().is_empty() {
                tokio::fs::create_dir_all(dir).await?;
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        // Enable WAL mode for better concurrency
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await?;
        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&pool)
            .await?;

        let store = Self { pool };
        store.run_migrations().await?;

        info!("Database initialized successfully");
        Ok(store)
    }

    async fn run_migrations(&self) -> StoreResult<()> {
        info!("Running database migrations...");

        // Migration 001: Initial content schema (idempotent)
        execute_sql(&self.pool, include_str!("../../migrations/001_initial.sql")).await?;

        Ok(())
    }

    /// Id the next created `T` will get, from the AUTOINCREMENT sequence
    pub async fn next_id<T: Entity>(&self) -> StoreResult<i64> {
        let seq: Option<i64> =
            sqlx::query_scalar("SELECT seq FROM sqlite_sequence WHERE name = ?")
                .bind(T::TABLE)
                .fetch_optional(&self.pool)
                .await?;
        Ok(seq.unwrap_or(0) + 1)
    }

    pub async fn list<T: Entity>(&self, filter: Option<Filter>) -> StoreResult<Vec<T>> {
        let where_clause = filter
            .map(|f| format!("WHERE {} = ?", f.column))
            .unwrap_or_default();
        let sql = format!(
            "SELECT * FROM {} {} ORDER BY {}",
            T::TABLE,
            where_clause,
            T::ORDER.sql()
        );

        let mut query = sqlx::query_as::<_, T>(&sql);
        if let Some(filter) = filter {
            query = match filter.value {
                FilterValue::Int(v) => query.bind(v),
                FilterValue::Bool(v) => query.bind(v),
            };
        }

        Ok(query.fetch_all(&self.pool).await?)
    }

    pub async fn get<T: Entity>(&self, id: i64) -> StoreResult<Option<T>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", T::TABLE);
        let record = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    pub async fn create<T: Entity>(&self, input: T::Input) -> StoreResult<T> {
        let now = now_timestamp();
        let record = T::build(0, input, &now, &now);

        let placeholders = vec!["?"; T::COLUMNS.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            T::TABLE,
            T::COLUMNS.join(", "),
            placeholders
        );

        let result = record
            .bind_columns(sqlx::query(&sql))
            .execute(&self.pool)
            .await?;
        let id = result.last_insert_rowid();

        let sql = format!("SELECT * FROM {} WHERE id = ?", T::TABLE);
        let created = sqlx::query_as::<_, T>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    pub async fn update<T: Entity>(&self, id: i64, input: T::Input) -> StoreResult<Option<T>> {
        let Some(existing) = self.get::<T>(id).await? else {
            return Ok(None);
        };

        let now = now_timestamp();
        let record = T::build(id, input, existing.created_at(), &now);

        let assignments = T::COLUMNS
            .iter()
            .map(|c| format!("{c} = ?"))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE {} SET {} WHERE id = ?", T::TABLE, assignments);

        record
            .bind_columns(sqlx::query(&sql))
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get(id).await
    }

    pub async fn delete<T: Entity>(&self, id: i64) -> StoreResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = ?", T::TABLE);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn settings(&self) -> StoreResult<BTreeMap<String, Value>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM site_settings ORDER BY key")
                .fetch_all(&self.pool)
                .await?;

        Ok(rows
            .into_iter()
            .map(|(key, raw)| {
                // Rows written by hand may hold bare strings rather than JSON
                let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                (key, value)
            })
            .collect())
    }

    pub async fn save_settings(&self, values: BTreeMap<String, Value>) -> StoreResult<()> {
        let now = now_timestamp();
        let mut tx = self.pool.begin().await?;

        for (key, value) in &values {
            let encoded = serde_json::to_string(value)?;
            sqlx::query(
                r#"
                INSERT INTO site_settings (key, value, updated_at)
                VALUES (?, ?, ?)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(&encoded)
            .bind(&now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}
