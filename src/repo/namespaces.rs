//! Namespace repository (component C, §4.C, §3 "Namespace", §4.H access
//! control). Listing supports the "owned by user, direct or via role"
//! filters that back `namespace.owned_by` at the API surface, grounded on
//! `metacat/db/dbobjects2.py`'s `DBNamespace.list`.

use chrono::{DateTime, Utc};
use sqlx::{postgres::Postgres, Executor, FromRow};

use crate::error::CatalogResult;
use crate::model::{Namespace, Owner};

#[derive(FromRow)]
struct NamespaceRow {
    name: String,
    owner_user: Option<String>,
    owner_role: Option<String>,
    description: Option<String>,
    creator: Option<String>,
    created_timestamp: Option<DateTime<Utc>>,
}

fn from_row(row: NamespaceRow) -> CatalogResult<Namespace> {
    let owner = Namespace::from_owner_columns(&row.name, row.owner_user, row.owner_role)?;
    Ok(Namespace {
        name: row.name,
        owner,
        description: row.description,
        creator: row.creator,
        created_timestamp: row.created_timestamp,
    })
}

pub async fn get<'e>(name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Option<Namespace>> {
    let row = sqlx::query_as::<_, NamespaceRow>(
        "select name, owner_user, owner_role, description, creator, created_timestamp from namespaces where name = $1",
    )
    .bind(name)
    .fetch_optional(db)
    .await?;
    row.map(from_row).transpose()
}

pub async fn exists<'e>(name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<bool> {
    let row: (bool,) = sqlx::query_as("select exists(select 1 from namespaces where name = $1)")
        .bind(name)
        .fetch_one(db)
        .await?;
    Ok(row.0)
}

pub async fn save<'e>(ns: &Namespace, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
    let (owner_user, owner_role) = match &ns.owner {
        Owner::User(u) => (Some(u.clone()), None),
        Owner::Role(r) => (None, Some(r.clone())),
    };
    sqlx::query(
        "insert into namespaces (name, owner_user, owner_role, description, creator, created_timestamp) \
         values ($1, $2, $3, $4, $5, now()) \
         on conflict (name) do update set \
            owner_user = excluded.owner_user, owner_role = excluded.owner_role, description = excluded.description",
    )
    .bind(&ns.name)
    .bind(owner_user)
    .bind(owner_role)
    .bind(&ns.description)
    .bind(&ns.creator)
    .execute(db)
    .await?;
    tracing::debug!(name = %ns.name, "namespace saved");
    Ok(())
}

/// Lists namespaces owned by `user`, directly or (unless `direct`) via any
/// role the user is a member of.
pub async fn list_owned_by<'e>(
    user: &str,
    direct: bool,
    db: impl Executor<'e, Database = Postgres>,
) -> CatalogResult<Vec<Namespace>> {
    let sql = if direct {
        "select name, owner_user, owner_role, description, creator, created_timestamp from namespaces where owner_user = $1"
    } else {
        "select n.name, n.owner_user, n.owner_role, n.description, n.creator, n.created_timestamp from namespaces n \
         where n.owner_user = $1 \
            or n.owner_role in (select role_name from users_roles where username = $1)"
    };
    let rows = sqlx::query_as::<_, NamespaceRow>(sql).bind(user).fetch_all(db).await?;
    rows.into_iter().map(from_row).collect()
}

pub async fn file_count<'e>(namespace: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<i64> {
    let row: (i64,) = sqlx::query_as("select count(*) from files where namespace = $1")
        .bind(namespace)
        .fetch_one(db)
        .await?;
    Ok(row.0)
}

pub async fn dataset_count<'e>(namespace: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<i64> {
    let row: (i64,) = sqlx::query_as("select count(*) from datasets where namespace = $1")
        .bind(namespace)
        .fetch_one(db)
        .await?;
    Ok(row.0)
}

pub async fn query_count<'e>(namespace: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<i64> {
    let row: (i64,) = sqlx::query_as("select count(*) from queries where namespace = $1")
        .bind(namespace)
        .fetch_one(db)
        .await?;
    Ok(row.0)
}
