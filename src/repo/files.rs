//! File repository (component C, §4.C, §3 "File"/"Parent-child file
//! edges"/"File membership").
//!
//! Grounded on `agent-sql::live_specs`'s shape (plain row structs, free
//! functions taking `impl sqlx::Executor`) but using runtime `query`/
//! `query_as` instead of the compile-time `query!` macros, since the SQL
//! text here is itself dynamically compiled by [`crate::query`].

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{postgres::Postgres, Executor, FromRow};

use crate::error::{CatalogError, CatalogResult};
use crate::model::File;
use crate::query::{AliasGen, BasicQuery, Plan};

const SELECT_COLUMNS: &str =
    "id, namespace, name, metadata, size, checksums, creator, created_timestamp, parents, children";

#[derive(FromRow)]
struct FileRow {
    id: String,
    namespace: Option<String>,
    name: Option<String>,
    metadata: Option<Value>,
    size: Option<i64>,
    checksums: Option<Value>,
    creator: Option<String>,
    created_timestamp: Option<DateTime<Utc>>,
    parents: Option<Vec<String>>,
    children: Option<Vec<String>>,
}

impl From<FileRow> for File {
    fn from(row: FileRow) -> Self {
        let checksums = row
            .checksums
            .and_then(|v| serde_json::from_value::<BTreeMap<String, String>>(v).ok())
            .unwrap_or_default();
        File {
            fid: row.id,
            namespace: row.namespace,
            name: row.name,
            metadata: row.metadata,
            size: row.size,
            checksums,
            creator: row.creator,
            created_timestamp: row.created_timestamp,
            parents: row.parents,
            children: row.children,
            datasets: None,
        }
    }
}

/// Looks a file up by fid; `None` rather than `NotFound` (§4.C "get").
pub async fn get<'e>(fid: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Option<File>> {
    let row = sqlx::query_as::<_, FileRow>(&format!(
        "select {SELECT_COLUMNS} from files_with_provenance where id = $1"
    ))
    .bind(fid)
    .fetch_optional(db)
    .await?;
    Ok(row.map(File::from))
}

pub async fn exists<'e>(namespace: &str, name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<bool> {
    let row: (bool,) = sqlx::query_as("select exists(select 1 from files where namespace = $1 and name = $2)")
        .bind(namespace)
        .bind(name)
        .fetch_one(db)
        .await?;
    Ok(row.0)
}

/// Strict insert: fails with `AlreadyExists` if `(namespace, name)` is
/// already taken (§4.C "save").
pub async fn save<'e>(file: &File, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
    let checksums = serde_json::to_value(&file.checksums).unwrap_or(Value::Null);
    let result = sqlx::query(
        "insert into files (id, namespace, name, metadata, size, checksums, creator, created_timestamp) \
         values ($1, $2, $3, $4, $5, $6, $7, now())",
    )
    .bind(&file.fid)
    .bind(&file.namespace)
    .bind(&file.name)
    .bind(file.metadata.clone().unwrap_or_else(|| Value::Object(Default::default())))
    .bind(file.size)
    .bind(checksums)
    .bind(&file.creator)
    .execute(db)
    .await;
    match result {
        Ok(_) => {
            tracing::debug!(fid = %file.fid, "file saved");
            Ok(())
        }
        Err(err) => {
            let err: CatalogError = err.into();
            if matches!(err, CatalogError::AlreadyExists(_)) {
                tracing::warn!(fid = %file.fid, "file save rejected: already exists");
            }
            Err(err)
        }
    }
}

/// Resolves a dataset selector eagerly (§4.F step 2/3's probe) to the list
/// of `(namespace, name)` pairs it yields.
async fn resolve_selector<'e>(
    sql: &str,
    db: impl Executor<'e, Database = Postgres>,
) -> CatalogResult<Vec<(String, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(sql).fetch_all(db).await?;
    Ok(rows)
}

/// Runs a basic query end to end: resolves the dataset selector (if any),
/// picks a plan, executes it, and applies the relationship hop (§4.F).
///
/// `limit=0` is answered directly as empty, without any store round trip
/// (§8 boundary behavior).
pub async fn run_basic_query(basic: &BasicQuery, pool: &sqlx::PgPool) -> CatalogResult<Vec<File>> {
    if basic.limit == Some(0) {
        return Ok(Vec::new());
    }

    let mut aliases = AliasGen::new();
    let resolved = match &basic.dataset_selector {
        None => None,
        Some(selector) => {
            let sql = selector.compile(&mut aliases)?;
            Some(resolve_selector(&sql, pool).await?)
        }
    };

    let plan = basic.plan(resolved.as_deref(), &mut aliases)?;
    let rows = match plan {
        Plan::Empty => Vec::new(),
        Plan::SingleScan(sql) | Plan::SingleDataset { sql, .. } | Plan::MultiDataset(sql) => {
            sqlx::query_as::<_, FileRow>(&sql).fetch_all(pool).await?
        }
    };
    let mut files: Vec<File> = rows.into_iter().map(File::from).collect();

    if let Some(relationship) = basic.relationship {
        let ids: Vec<String> = files.iter().map(|f| f.fid.clone()).collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let hop_sql = crate::query::relationship_hop_sql(relationship, &ids);
        let hop_rows = sqlx::query_as::<_, FileRow>(&hop_sql).fetch_all(pool).await?;
        files = hop_rows.into_iter().map(File::from).collect();
    }

    Ok(files)
}

/// Inserts `(parent_fid, child_fid)` edges, failing with `AlreadyExists`
/// if an edge already exists (§3 "Parent-child file edges").
pub async fn add_parents<'e>(
    child_fid: &str,
    parent_fids: &[String],
    db: impl Executor<'e, Database = Postgres> + Copy,
) -> CatalogResult<()> {
    for parent in parent_fids {
        let result = sqlx::query("insert into parent_child (parent_id, child_id) values ($1, $2)")
            .bind(parent)
            .bind(child_fid)
            .execute(db)
            .await;
        if let Err(err) = result {
            let err: CatalogError = err.into();
            if matches!(err, CatalogError::AlreadyExists(_)) {
                tracing::warn!(parent = %parent, child = %child_fid, "add_child rejected: already exists");
            }
            return Err(err);
        }
    }
    tracing::debug!(child = %child_fid, nparents = parent_fids.len(), "add_child succeeded");
    Ok(())
}

pub async fn remove_child<'e>(
    parent_fid: &str,
    child_fid: &str,
    db: impl Executor<'e, Database = Postgres>,
) -> CatalogResult<()> {
    sqlx::query("delete from parent_child where parent_id = $1 and child_id = $2")
        .bind(parent_fid)
        .bind(child_fid)
        .execute(db)
        .await?;
    Ok(())
}

/// Replaces a file's full parent set: deletes all existing parent edges
/// then inserts the given ones, inside a caller-managed transaction.
pub async fn set_parents(
    child_fid: &str,
    parent_fids: &[String],
    txn: &mut sqlx::Transaction<'_, Postgres>,
) -> CatalogResult<()> {
    sqlx::query("delete from parent_child where child_id = $1")
        .bind(child_fid)
        .execute(&mut **txn)
        .await?;
    for parent in parent_fids {
        sqlx::query("insert into parent_child (parent_id, child_id) values ($1, $2)")
            .bind(parent)
            .bind(child_fid)
            .execute(&mut **txn)
            .await?;
    }
    tracing::debug!(child = %child_fid, nparents = parent_fids.len(), "set_parents succeeded");
    Ok(())
}

pub async fn datasets_for_file<'e>(
    fid: &str,
    db: impl Executor<'e, Database = Postgres>,
) -> CatalogResult<Vec<(String, String)>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "select dataset_namespace, dataset_name from files_datasets where file_id = $1",
    )
    .bind(fid)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Resolves a mixed list of bare fids and `namespace:name` specs to their
/// files in a single query, grounded on `DBFile.from_name_list`'s
/// `sql_for_file_list`.
pub async fn list_by_specs<'e>(
    specs: &[String],
    db: impl Executor<'e, Database = Postgres>,
) -> CatalogResult<Vec<File>> {
    if specs.is_empty() {
        return Ok(Vec::new());
    }
    let mut fids = Vec::new();
    let mut pairs = Vec::new();
    for spec in specs {
        match spec.split_once(':') {
            Some((namespace, name)) => pairs.push((namespace.to_string(), name.to_string())),
            None => fids.push(spec.clone()),
        }
    }

    let namespaces: Vec<String> = pairs.iter().map(|(n, _)| n.clone()).collect();
    let names: Vec<String> = pairs.iter().map(|(_, n)| n.clone()).collect();

    // Both clauses are always present so `$1`/`$2`/`$3` are always bound;
    // an empty array makes the corresponding clause match nothing.
    let sql = format!(
        "select {SELECT_COLUMNS} from files_with_provenance \
         where id = any($1) or (namespace, name) in (select * from unnest($2::text[], $3::text[]))"
    );
    let rows = sqlx::query_as::<_, FileRow>(&sql)
        .bind(&fids)
        .bind(&namespaces)
        .bind(&names)
        .fetch_all(db)
        .await?;
    Ok(rows.into_iter().map(File::from).collect())
}

/// Lists every file registered directly in `namespace`, grounded on
/// `DBFile.list`.
pub async fn list_in_namespace<'e>(
    namespace: &str,
    db: impl Executor<'e, Database = Postgres>,
) -> CatalogResult<Vec<File>> {
    let rows = sqlx::query_as::<_, FileRow>(&format!(
        "select {SELECT_COLUMNS} from files_with_provenance where namespace = $1"
    ))
    .bind(namespace)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(File::from).collect())
}

pub async fn add_to_dataset<'e>(
    fid: &str,
    namespace: &str,
    name: &str,
    db: impl Executor<'e, Database = Postgres>,
) -> CatalogResult<()> {
    sqlx::query("insert into files_datasets (file_id, dataset_namespace, dataset_name) values ($1, $2, $3)")
        .bind(fid)
        .bind(namespace)
        .bind(name)
        .execute(db)
        .await?;
    Ok(())
}
