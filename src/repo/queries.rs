//! Named-query repository (component C, §4.C, §3 "Named query").

use sqlx::{postgres::Postgres, Executor, FromRow};

use crate::error::CatalogResult;
use crate::model::NamedQuery;

#[derive(FromRow)]
struct QueryRow {
    namespace: String,
    name: String,
    source: String,
    parameters: Vec<String>,
    creator: Option<String>,
}

impl From<QueryRow> for NamedQuery {
    fn from(row: QueryRow) -> Self {
        NamedQuery {
            namespace: row.namespace,
            name: row.name,
            source: row.source,
            parameters: row.parameters,
            creator: row.creator,
        }
    }
}

pub async fn get<'e>(namespace: &str, name: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Option<NamedQuery>> {
    let row = sqlx::query_as::<_, QueryRow>(
        "select namespace, name, source, parameters, creator from queries where namespace = $1 and name = $2",
    )
    .bind(namespace)
    .bind(name)
    .fetch_optional(db)
    .await?;
    Ok(row.map(NamedQuery::from))
}

pub async fn save<'e>(query: &NamedQuery, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
    sqlx::query(
        "insert into queries (namespace, name, source, parameters, creator) values ($1, $2, $3, $4, $5) \
         on conflict (namespace, name) do update set source = excluded.source, parameters = excluded.parameters",
    )
    .bind(&query.namespace)
    .bind(&query.name)
    .bind(&query.source)
    .bind(&query.parameters)
    .bind(&query.creator)
    .execute(db)
    .await?;
    Ok(())
}

pub async fn list_in_namespace<'e>(namespace: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Vec<NamedQuery>> {
    let rows = sqlx::query_as::<_, QueryRow>(
        "select namespace, name, source, parameters, creator from queries where namespace = $1 order by name",
    )
    .bind(namespace)
    .fetch_all(db)
    .await?;
    Ok(rows.into_iter().map(NamedQuery::from).collect())
}
