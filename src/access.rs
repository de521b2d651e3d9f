//! Access-control model (component H, §4.H).
//!
//! The predicate itself lives on [`crate::model::Namespace::owned_by`];
//! this module adds the DB-backed role-membership check that predicate
//! takes as a closure, and the namespace-deletion guard (§3 "Lifecycles":
//! "Namespace deletion is rejected if non-empty").

use sqlx::{postgres::Postgres, Executor};

use crate::error::{CatalogError, CatalogResult};
use crate::model::Namespace;
use crate::repo::{namespaces, roles};

/// Resolves `namespace.owned_by(user, direct)` against the database,
/// fetching role membership only if the namespace is role-owned and
/// `direct` is false.
pub async fn owns_namespace<'e>(
    namespace: &Namespace,
    user: &str,
    direct: bool,
    db: impl Executor<'e, Database = Postgres> + Copy,
) -> CatalogResult<bool> {
    use crate::model::namespace::Owner;
    match &namespace.owner {
        Owner::User(owner) => Ok(owner == user),
        Owner::Role(role_name) if !direct => {
            let role = roles::get(role_name, db).await?;
            Ok(role.map(|r| r.contains(user)).unwrap_or(false))
        }
        Owner::Role(_) => Ok(false),
    }
}

/// Rejects deleting a namespace that still owns files or datasets (§3
/// "Lifecycles"). The engine enforces this as a distinct error kind
/// rather than letting a foreign-key violation surface as an opaque
/// `StoreError`.
pub async fn ensure_namespace_deletable<'e>(
    namespace: &str,
    db: impl Executor<'e, Database = Postgres> + Copy,
) -> CatalogResult<()> {
    let files = namespaces::file_count(namespace, db).await?;
    let datasets = namespaces::dataset_count(namespace, db).await?;
    if files > 0 || datasets > 0 {
        return Err(CatalogError::InvalidName(format!(
            "namespace {namespace} is not empty ({files} files, {datasets} datasets)"
        )));
    }
    Ok(())
}
