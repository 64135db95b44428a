mod json;
mod models;
mod seeders;
mod sql;

pub use json::JsonStore;
pub use models::*;
pub use seeders::seed_defaults;
pub use sql::SqlStore;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use sqlx::{
    query::Query,
    sqlite::{SqliteArguments, SqliteRow},
    FromRow, Sqlite,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{StorageBackend, StorageConfig};

/// A SQLite query under construction, as handed to [`Entity::bind_columns`].
pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Errors raised by either storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("store file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record in {table}: {source}")]
    Decode {
        table: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Sort order applied by list queries in both backends.
///
/// Ties are broken by `id` in the same direction so both backends return
/// identical orderings.
#[derive(Debug, Clone, Copy)]
pub struct Order {
    pub column: &'static str,
    pub descending: bool,
}

impl Order {
    pub const fn asc(column: &'static str) -> Self {
        Self {
            column,
            descending: false,
        }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self {
            column,
            descending: true,
        }
    }

    fn sql(&self) -> String {
        let dir = if self.descending { "DESC" } else { "ASC" };
        format!("{} {dir}, id {dir}", self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterValue {
    Int(i64),
    Bool(bool),
}

/// Equality filter on a single column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Filter {
    pub column: &'static str,
    pub value: FilterValue,
}

impl Filter {
    pub const fn int(column: &'static str, value: i64) -> Self {
        Self {
            column,
            value: FilterValue::Int(value),
        }
    }

    pub const fn bool(column: &'static str, value: bool) -> Self {
        Self {
            column,
            value: FilterValue::Bool(value),
        }
    }

    /// Check a serialized record against this filter
    pub fn matches(&self, record: &Value) -> bool {
        let field = record.get(self.column);
        match (self.value, field) {
            (FilterValue::Int(expected), Some(v)) => v.as_i64() == Some(expected),
            (FilterValue::Bool(expected), Some(Value::Bool(b))) => *b == expected,
            // Rows exported from SQLite may carry booleans as 0/1
            (FilterValue::Bool(expected), Some(v)) => v.as_i64() == Some(expected as i64),
            _ => false,
        }
    }
}

/// A content record that both storage backends know how to persist.
///
/// The JSON backend works from the serde representation; the SQL backend
/// uses `TABLE`, `COLUMNS` and `bind_columns`, which must list and bind the
/// same columns in the same order. `id` is never part of `COLUMNS`.
pub trait Entity:
    Serialize + DeserializeOwned + for<'r> FromRow<'r, SqliteRow> + Clone + Send + Sync + Unpin + 'static
{
    /// Table name in SQL, collection name in the JSON document
    const TABLE: &'static str;
    const COLUMNS: &'static [&'static str];
    const ORDER: Order;

    /// Editable fields accepted from API callers
    type Input: DeserializeOwned + Send + Sync + 'static;

    fn id(&self) -> i64;

    fn created_at(&self) -> &str;

    /// Build a full record from caller input
    fn build(id: i64, input: Self::Input, created_at: &str, updated_at: &str) -> Self;

    fn bind_columns<'q>(&'q self, query: SqliteQuery<'q>) -> SqliteQuery<'q>;
}

/// Full contents of a store, in the on-disk layout of [`JsonStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<Value>>,
    #[serde(default)]
    pub settings: BTreeMap<String, Value>,
    #[serde(default)]
    pub next_ids: BTreeMap<String, i64>,
}

/// Content storage, backed either by SQL or by a single JSON file
#[derive(Clone)]
pub enum Store {
    Sql(SqlStore),
    Json(JsonStore),
}

impl Store {
    /// Name of the active backend, reported by the health endpoint
    pub fn backend(&self) -> &'static str {
        match self {
            Store::Sql(_) => "sql",
            Store::Json(_) => "json",
        }
    }

    pub async fn list<T: Entity>(&self, filter: Option<Filter>) -> StoreResult<Vec<T>> {
        match self {
            Store::Sql(s) => s.list(filter).await,
            Store::Json(j) => j.list(filter).await,
        }
    }

    pub async fn get<T: Entity>(&self, id: i64) -> StoreResult<Option<T>> {
        match self {
            Store::Sql(s) => s.get(id).await,
            Store::Json(j) => j.get(id).await,
        }
    }

    pub async fn create<T: Entity>(&self, input: T::Input) -> StoreResult<T> {
        match self {
            Store::Sql(s) => s.create(input).await,
            Store::Json(j) => j.create(input).await,
        }
    }

    /// Replace the editable fields of a record. Returns `None` if the id is unknown.
    pub async fn update<T: Entity>(&self, id: i64, input: T::Input) -> StoreResult<Option<T>> {
        match self {
            Store::Sql(s) => s.update(id, input).await,
            Store::Json(j) => j.update(id, input).await,
        }
    }

    /// Returns `false` if nothing was deleted
    pub async fn delete<T: Entity>(&self, id: i64) -> StoreResult<bool> {
        match self {
            Store::Sql(s) => s.delete::<T>(id).await,
            Store::Json(j) => j.delete::<T>(id).await,
        }
    }

    pub async fn settings(&self) -> StoreResult<BTreeMap<String, Value>> {
        match self {
            Store::Sql(s) => s.settings().await,
            Store::Json(j) => j.settings().await,
        }
    }

    /// Upsert every key in `values`; keys not mentioned are left alone.
    pub async fn save_settings(&self, values: BTreeMap<String, Value>) -> StoreResult<()> {
        match self {
            Store::Sql(s) => s.save_settings(values).await,
            Store::Json(j) => j.save_settings(values).await,
        }
    }

    /// Id the next created `T` will get. Deleted ids are never handed out again.
    pub async fn next_id<T: Entity>(&self) -> StoreResult<i64> {
        match self {
            Store::Sql(s) => s.next_id::<T>().await,
            Store::Json(j) => j.next_id::<T>().await,
        }
    }

    /// Whether the store holds no content records at all
    pub async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.list::<Mission>(None).await?.is_empty()
            && self.list::<GalleryItem>(None).await?.is_empty()
            && self.list::<NewsArticle>(None).await?.is_empty()
            && self.list::<TeamMember>(None).await?.is_empty()
            && self.list::<Project>(None).await?.is_empty()
            && self.list::<HeroSlide>(None).await?.is_empty()
            && self.list::<Testimonial>(None).await?.is_empty())
    }

    /// Dump everything into the JSON store layout
    pub async fn export(&self) -> StoreResult<Snapshot> {
        let mut snapshot = Snapshot {
            settings: self.settings().await?,
            ..Snapshot::default()
        };
        self.export_collection::<Mission>(&mut snapshot).await?;
        self.export_collection::<GalleryItem>(&mut snapshot).await?;
        self.export_collection::<NewsArticle>(&mut snapshot).await?;
        self.export_collection::<TeamMember>(&mut snapshot).await?;
        self.export_collection::<Project>(&mut snapshot).await?;
        self.export_collection::<HeroSlide>(&mut snapshot).await?;
        self.export_collection::<Testimonial>(&mut snapshot).await?;
        Ok(snapshot)
    }

    async fn export_collection<T: Entity>(&self, snapshot: &mut Snapshot) -> StoreResult<()> {
        let records = self.list::<T>(None).await?;
        let max_id = records.iter().map(|r| r.id()).max().unwrap_or(0);
        let next_id = self.next_id::<T>().await?.max(max_id + 1);
        let values = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        snapshot.collections.insert(T::TABLE.to_string(), values);
        snapshot.next_ids.insert(T::TABLE.to_string(), next_id);
        Ok(())
    }
}

/// Open the configured store.
///
/// In `auto` mode a failing SQL connection falls back to the JSON file,
/// logging the failure so a misconfigured database is visible.
pub async fn open(config: &StorageConfig) -> Result<Store> {
    match config.backend {
        StorageBackend::Sql => {
            let url = config
                .database_url
                .as_deref()
                .context("storage.backend = \"sql\" requires storage.database_url")?;
            let store = SqlStore::connect(url, config.max_connections)
                .await
                .context("Failed to connect to the SQL database")?;
            Ok(Store::Sql(store))
        }
        StorageBackend::Json => open_json(config).await,
        StorageBackend::Auto => {
            let Some(url) = config.database_url.as_deref() else {
                info!("No database_url configured, using JSON file store");
                return open_json(config).await;
            };
            match SqlStore::connect(url, config.max_connections).await {
                Ok(store) => Ok(Store::Sql(store)),
                Err(e) => {
                    warn!(
                        error = %e,
                        fallback = %config.json_path.display(),
                        "SQL database unavailable, falling back to JSON file store"
                    );
                    open_json(config).await
                }
            }
        }
    }
}

async fn open_json(config: &StorageConfig) -> Result<Store> {
    let store = JsonStore::open(&config.json_path)
        .await
        .with_context(|| format!("Failed to open JSON store at {}", config.json_path.display()))?;
    Ok(Store::Json(store))
}

/// Current time as stored in `created_at` / `updated_at`
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Ordering used by the JSON backend to mirror `ORDER BY`.
///
/// NULL sorts before every other value, as it does in SQLite.
pub(crate) fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(0.0);
            let y = y.as_f64().unwrap_or(0.0);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(x), Some(y)) => x.to_string().cmp(&y.to_string()),
    }
}
