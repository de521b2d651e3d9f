//! Namespace record model (component B, §3 "Namespace").

use chrono::{DateTime, Utc};

use crate::error::{CatalogError, CatalogResult};

/// Exactly one of `owner_user` / `owner_role` is set.
#[derive(Debug, Clone, PartialEq)]
pub enum Owner {
    User(String),
    Role(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub owner: Owner,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub created_timestamp: Option<DateTime<Utc>>,
}

impl Namespace {
    pub fn new(name: impl Into<String>, owner: Owner) -> Self {
        Namespace {
            name: name.into(),
            owner,
            description: None,
            creator: None,
            created_timestamp: None,
        }
    }

    /// Reconstructs a namespace from the two nullable owner columns
    /// persisted in the `namespaces` table, enforcing the exactly-one-of
    /// constraint (§6 schema, §8 invariant).
    pub fn from_owner_columns(
        name: impl Into<String>,
        owner_user: Option<String>,
        owner_role: Option<String>,
    ) -> CatalogResult<Owner> {
        match (owner_user, owner_role) {
            (Some(u), None) => Ok(Owner::User(u)),
            (None, Some(r)) => Ok(Owner::Role(r)),
            _ => {
                let _ = name.into();
                Err(CatalogError::invalid_name(
                    "exactly one of owner_user/owner_role must be set",
                ))
            }
        }
    }

    /// §4.H access-control predicate: true if `user` owns this namespace
    /// directly, or (unless `direct` is set) via role membership. Role
    /// membership itself is resolved by the caller and passed in as
    /// `user_in_role`, since namespace records don't carry role rosters.
    pub fn owned_by(&self, user: &str, direct: bool, user_in_role: impl FnOnce(&str) -> bool) -> bool {
        match &self.owner {
            Owner::User(owner) => owner == user,
            Owner::Role(role) => !direct && user_in_role(role),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owned_by_user_directly() {
        let ns = Namespace::new("cms", Owner::User("alice".into()));
        assert!(ns.owned_by("alice", false, |_| false));
        assert!(!ns.owned_by("bob", false, |_| false));
    }

    #[test]
    fn owned_by_role_unless_direct() {
        let ns = Namespace::new("cms", Owner::Role("physicists".into()));
        assert!(ns.owned_by("alice", false, |role| role == "physicists"));
        assert!(!ns.owned_by("alice", true, |role| role == "physicists"));
    }

    #[test]
    fn from_owner_columns_rejects_both_or_neither() {
        assert!(Namespace::from_owner_columns("cms", None, None).is_err());
        assert!(Namespace::from_owner_columns("cms", Some("a".into()), Some("b".into())).is_err());
        assert!(Namespace::from_owner_columns("cms", Some("a".into()), None).is_ok());
    }
}
