//! Dataset repository (component C, §4.C, §3 "Dataset").
//!
//! `save` is an upsert on `(namespace, name)`, unlike `files::save`'s
//! strict insert (§4.C). Adding a dataset with a parent is checked for a
//! cycle before the edge is written — an Open Question the source left
//! unresolved beyond "must be acyclic"; see DESIGN.md for why the check
//! happens here rather than being pushed onto callers.

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::Postgres, Executor, FromRow};

use crate::error::{CatalogError, CatalogResult};
use crate::model::Dataset;

#[derive(FromRow)]
struct DatasetRow {
    namespace: String,
    name: String,
    parent_namespace: Option<String>,
    parent_name: Option<String>,
    frozen: bool,
    monotonic: bool,
    metadata: Value,
    creator: Option<String>,
    created_timestamp: Option<DateTime<Utc>>,
    description: Option<String>,
}

impl From<DatasetRow> for Dataset {
    fn from(row: DatasetRow) -> Self {
        Dataset {
            namespace: row.namespace,
            name: row.name,
            parent_namespace: row.parent_namespace,
            parent_name: row.parent_name,
            frozen: row.frozen,
            monotonic: row.monotonic,
            metadata: row.metadata,
            creator: row.creator,
            created_timestamp: row.created_timestamp,
            description: row.description,
        }
    }
}

const SELECT_COLUMNS: &str =
    "namespace, name, parent_namespace, parent_name, frozen, monotonic, metadata, creator, created_timestamp, description";

pub async fn get<'e>(namespace: &str, name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Option<Dataset>> {
    let sql = format!("select {SELECT_COLUMNS} from datasets where namespace = $1 and name = $2");
    let row = sqlx::query_as::<_, DatasetRow>(&sql)
        .bind(namespace)
        .bind(name)
        .fetch_optional(db)
        .await?;
    Ok(row.map(Dataset::from))
}

pub async fn exists<'e>(namespace: &str, name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<bool> {
    let row: (bool,) = sqlx::query_as("select exists(select 1 from datasets where namespace = $1 and name = $2)")
        .bind(namespace)
        .bind(name)
        .fetch_one(db)
        .await?;
    Ok(row.0)
}

/// Walks the parent chain starting at `(parent_namespace, parent_name)`
/// looking for `(namespace, name)`; if found, adding that edge would
/// create a cycle.
async fn would_cycle<'e>(
    namespace: &str,
    name: &str,
    parent_namespace: &str,
    parent_name: &str,
    db: impl Executor<'e, Database = Postgres> + Copy,
) -> CatalogResult<bool> {
    let mut cur_ns = parent_namespace.to_string();
    let mut cur_name = parent_name.to_string();
    loop {
        if cur_ns == namespace && cur_name == name {
            return Ok(true);
        }
        let next: Option<(Option<String>, Option<String>)> = sqlx::query_as(
            "select parent_namespace, parent_name from datasets where namespace = $1 and name = $2",
        )
        .bind(&cur_ns)
        .bind(&cur_name)
        .fetch_optional(db)
        .await?;
        match next {
            Some((Some(ns), Some(nm))) => {
                cur_ns = ns;
                cur_name = nm;
            }
            _ => return Ok(false),
        }
    }
}

/// Upsert on `(namespace, name)`, rejecting a parent assignment that would
/// close a cycle (§3 "Dataset" invariant).
pub async fn save<'e>(dataset: &Dataset, db: impl Executor<'e, Database = Postgres> + Copy) -> CatalogResult<()> {
    if let (Some(parent_ns), Some(parent_name)) = (&dataset.parent_namespace, &dataset.parent_name) {
        if would_cycle(&dataset.namespace, &dataset.name, parent_ns, parent_name, db).await? {
            let dependency = format!("{}:{} -> {}:{}", dataset.namespace, dataset.name, parent_ns, parent_name);
            tracing::warn!(dependency = %dependency, "dataset save rejected: circular dependency");
            return Err(CatalogError::CircularDatasetDependency(dependency));
        }
    }
    sqlx::query(
        "insert into datasets (namespace, name, parent_namespace, parent_name, frozen, monotonic, metadata, creator, created_timestamp, description) \
         values ($1, $2, $3, $4, $5, $6, $7, $8, now(), $9) \
         on conflict (namespace, name) do update set \
            parent_namespace = excluded.parent_namespace, parent_name = excluded.parent_name, \
            frozen = excluded.frozen, monotonic = excluded.monotonic, metadata = excluded.metadata, \
            description = excluded.description",
    )
    .bind(&dataset.namespace)
    .bind(&dataset.name)
    .bind(&dataset.parent_namespace)
    .bind(&dataset.parent_name)
    .bind(dataset.frozen)
    .bind(dataset.monotonic)
    .bind(&dataset.metadata)
    .bind(&dataset.creator)
    .bind(&dataset.description)
    .execute(db)
    .await?;
    tracing::debug!(namespace = %dataset.namespace, name = %dataset.name, "dataset saved");
    Ok(())
}

pub async fn nfiles<'e>(namespace: &str, name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<i64> {
    let row: (i64,) = sqlx::query_as(
        "select count(*) from files_datasets where dataset_namespace = $1 and dataset_name = $2",
    )
    .bind(namespace)
    .bind(name)
    .fetch_one(db)
    .await?;
    Ok(row.0)
}
