//! Core catalog engine: the record model, repository layer, and query
//! compiler for a scientific-data metadata catalog (files, datasets,
//! namespaces, users/roles, named queries, and the parameter-category
//! validator that governs their metadata).
//!
//! The query engine (DNF compiler, dataset-selector compiler, and
//! basic-query planner) lives in [`query`] and is deliberately pure: every
//! compiler takes an [`query::AliasGen`] and returns SQL text, with no
//! connection of its own. [`repo`] is the only module that talks to
//! Postgres.

pub mod access;
pub mod config;
pub mod error;
pub mod ingest;
pub mod model;
pub mod names;
pub mod query;
pub mod repo;

pub use config::Config;
pub use error::{CatalogError, CatalogResult, MetaFieldError};

use sqlx::postgres::PgPoolOptions;

/// A connected catalog: a pool plus the config it was built from.
/// Free functions in [`repo`] take a pool or transaction directly; this
/// exists mainly to bundle connection setup (statement timeout) in one
/// place, mirroring how the pack's services construct their pool once at
/// startup rather than threading config through every call.
pub struct Catalog {
    pub pool: sqlx::PgPool,
    pub config: Config,
}

impl Catalog {
    pub async fn connect(config: Config) -> CatalogResult<Self> {
        let statement_timeout_ms = config.statement_timeout.map(|d| d.as_millis() as i64);
        let pool = PgPoolOptions::new()
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    if let Some(ms) = statement_timeout_ms {
                        sqlx::query(&format!("set statement_timeout = {ms}"))
                            .execute(&mut *conn)
                            .await?;
                    }
                    Ok(())
                })
            })
            .connect(&config.database_url)
            .await?;
        Ok(Catalog { pool, config })
    }

    pub fn pool(&self) -> &sqlx::PgPool {
        &self.pool
    }
}
