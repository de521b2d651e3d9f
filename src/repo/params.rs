//! Parameter-category repository (component C, supplemented per
//! SPEC_FULL.md §11 from `DBParamCategory`/`DBParamValidator`).
//!
//! `category_for_path` implements the "deepest category that contains
//! this path" lookup `model::param::validate_metadata` needs, walking
//! `candidate_paths` from deepest to shallowest and returning the first
//! hit.

use sqlx::{postgres::Postgres, Executor, FromRow};

use crate::error::CatalogResult;
use crate::model::param::candidate_paths;
use crate::model::ParamCategory;

#[derive(FromRow)]
struct ParamCategoryRow {
    path: String,
    owner: String,
    restricted: bool,
    definitions: serde_json::Value,
}

impl ParamCategoryRow {
    fn into_category(self) -> CatalogResult<ParamCategory> {
        let definitions = serde_json::from_value(self.definitions).map_err(|e| {
            crate::error::CatalogError::query_compile(format!("malformed parameter definitions: {e}"))
        })?;
        Ok(ParamCategory { path: self.path, owner_role: self.owner, restricted: self.restricted, definitions })
    }
}

pub async fn get<'e>(path: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Option<ParamCategory>> {
    let row = sqlx::query_as::<_, ParamCategoryRow>(
        "select path, owner, restricted, definitions from parameter_categories where path = $1",
    )
    .bind(path)
    .fetch_optional(db)
    .await?;
    row.map(ParamCategoryRow::into_category).transpose()
}

pub async fn save<'e>(category: &ParamCategory, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
    let definitions = serde_json::to_value(&category.definitions).unwrap_or(serde_json::Value::Null);
    sqlx::query(
        "insert into parameter_categories (path, owner, restricted, definitions) values ($1, $2, $3, $4) \
         on conflict (path) do update set owner = excluded.owner, restricted = excluded.restricted, definitions = excluded.definitions",
    )
    .bind(&category.path)
    .bind(&category.owner_role)
    .bind(category.restricted)
    .bind(definitions)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn exists<'e>(path: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<bool> {
    let row: (bool,) = sqlx::query_as("select exists(select 1 from parameter_categories where path = $1)")
        .bind(path)
        .fetch_one(db)
        .await?;
    Ok(row.0)
}

/// Deepest-prefix-match lookup: the category rooted at the longest path
/// that is a prefix of (or equal to) `path`, or `None` if no category
/// governs it.
pub async fn category_for_path<'e>(
    path: &str,
    db: impl Executor<'e, Database = Postgres> + Copy,
) -> CatalogResult<Option<ParamCategory>> {
    for candidate in candidate_paths(path).into_iter().rev() {
        if let Some(category) = get(&candidate, db).await? {
            return Ok(Some(category));
        }
    }
    Ok(None)
}
