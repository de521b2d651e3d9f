//! Role repository (component C, §4.C, §3 "Role").

use sqlx::{postgres::Postgres, Executor, FromRow};

use crate::error::CatalogResult;
use crate::model::Role;
use crate::repo::membership::USER_ROLES;

#[derive(FromRow)]
struct RoleRow {
    name: String,
    description: Option<String>,
}

pub async fn get<'e>(name: &str, db: impl Executor<'e, Database = Postgres> + Copy) -> CatalogResult<Option<Role>> {
    let row = sqlx::query_as::<_, RoleRow>("select name, description from roles where name = $1")
        .bind(name)
        .fetch_optional(db)
        .await?;
    let Some(row) = row else { return Ok(None) };
    let members = USER_ROLES.left_of(&row.name, db).await?;
    Ok(Some(Role { name: row.name, description: row.description, members }))
}

pub async fn save<'e>(role: &Role, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
    sqlx::query(
        "insert into roles (name, description) values ($1, $2) \
         on conflict (name) do update set description = excluded.description",
    )
    .bind(&role.name)
    .bind(&role.description)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn list<'e>(db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("select name from roles order by name").fetch_all(db).await?;
    Ok(rows.into_iter().map(|(n,)| n).collect())
}
