//! Generic many-to-many association helper.
//!
//! `metacat/db/dbobjects2.py` has two incompatible `_DBManyToMany`
//! implementations (one for user/role membership, one for dataset
//! membership) that differ only in column names. SPEC_FULL.md §9 resolves
//! that as a single Open Question: collapse them into one generic helper
//! parameterized by table and column names, used for the one pair
//! membership needs (user/role) this crate's repository exposes at the
//! model layer. Table/column names here are always crate-internal
//! constants, never caller input, so the `format!`-built SQL carries no
//! injection surface.

use sqlx::{postgres::Postgres, Executor};

use crate::error::CatalogResult;

pub struct Association {
    pub table: &'static str,
    pub left_column: &'static str,
    pub right_column: &'static str,
}

impl Association {
    pub async fn add<'e>(&self, left: &str, right: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
        let sql = format!(
            "insert into {} ({}, {}) values ($1, $2) on conflict do nothing",
            self.table, self.left_column, self.right_column
        );
        sqlx::query(&sql).bind(left).bind(right).execute(db).await?;
        Ok(())
    }

    pub async fn remove<'e>(&self, left: &str, right: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<()> {
        let sql = format!(
            "delete from {} where {} = $1 and {} = $2",
            self.table, self.left_column, self.right_column
        );
        sqlx::query(&sql).bind(left).bind(right).execute(db).await?;
        Ok(())
    }

    pub async fn right_of<'e>(&self, left: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Vec<String>> {
        let sql = format!("select {} from {} where {} = $1", self.right_column, self.table, self.left_column);
        let rows: Vec<(String,)> = sqlx::query_as(&sql).bind(left).fetch_all(db).await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }

    pub async fn left_of<'e>(&self, right: &str, db: impl Executor<'e, Database = Postgres>) -> CatalogResult<Vec<String>> {
        let sql = format!("select {} from {} where {} = $1", self.left_column, self.table, self.right_column);
        let rows: Vec<(String,)> = sqlx::query_as(&sql).bind(right).fetch_all(db).await?;
        Ok(rows.into_iter().map(|(v,)| v).collect())
    }
}

pub const USER_ROLES: Association = Association {
    table: "users_roles",
    left_column: "username",
    right_column: "role_name",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn association_constants_are_well_formed() {
        assert_eq!(USER_ROLES.table, "users_roles");
        assert_eq!(USER_ROLES.left_column, "username");
    }
}
