//! User, role, and authenticator models (component B, §3 "User"/"Role",
//! grounded on `metacat/db/dbobjects2.py`'s `DBUser`/`DBRole`/`Authenticator`
//! hierarchy). Password hashing itself is out of scope (§1); this module
//! only stores and compares already-hashed secrets.

use std::collections::BTreeMap;

/// A secret, stored as `$<algo>:<hash>`. A bare value supplied on ingest is
/// treated as algorithm-default, matching §6 "Secret encoding".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Secret(pub String);

const DEFAULT_PASSWORD_ALGORITHM: &str = "bcrypt";

impl Secret {
    pub fn format_password(hashed: &str) -> Secret {
        if hashed.starts_with('$') && hashed.contains(':') {
            Secret(hashed.to_string())
        } else {
            Secret(format!("${DEFAULT_PASSWORD_ALGORITHM}:{hashed}"))
        }
    }

    pub fn unpack_password(&self) -> &str {
        if self.0.starts_with('$') {
            if let Some((_, rest)) = self.0[1..].split_once(':') {
                return rest;
            }
        }
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AuthenticatorType {
    Password,
    X509,
}

#[derive(Debug, Clone, Default)]
pub struct Authenticator {
    pub secrets: Vec<Secret>,
}

impl Authenticator {
    pub fn set_password(&mut self, hashed_password: &str) {
        self.secrets = vec![Secret::format_password(hashed_password)];
    }

    pub fn verify_password(&self, hashed_password: &str) -> bool {
        self.secrets
            .first()
            .map(|s| s.unpack_password() == hashed_password)
            .unwrap_or(false)
    }

    pub fn add_x509(&mut self, dn: &str) {
        if !self.secrets.iter().any(|s| s.0 == dn) {
            self.secrets.push(Secret(dn.to_string()));
        }
    }

    pub fn verify_x509(&self, dn: &str) -> bool {
        self.secrets.iter().any(|s| s.0 == dn)
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub username: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub flags: String,
    pub authenticators: BTreeMap<AuthenticatorType, Authenticator>,
    pub role_names: Vec<String>,
}

impl User {
    pub fn new(username: impl Into<String>) -> Self {
        User {
            username: username.into(),
            name: None,
            email: None,
            flags: String::new(),
            authenticators: BTreeMap::new(),
            role_names: Vec::new(),
        }
    }

    /// `'a'` in flags marks an admin (§4.B). The engine itself never
    /// consults this when enforcing access control (§4.H) — that's a
    /// caller-side decision — but it's exposed for callers to use.
    pub fn is_admin(&self) -> bool {
        self.flags.contains('a')
    }

    pub fn verify_password(&self, password_hash: &str) -> Result<(), &'static str> {
        match self.authenticators.get(&AuthenticatorType::Password) {
            None => Err("no password found"),
            Some(auth) if !auth.verify_password(password_hash) => Err("password mismatch"),
            Some(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Role {
    pub name: String,
    pub description: Option<String>,
    pub members: Vec<String>,
}

impl Role {
    pub fn new(name: impl Into<String>) -> Self {
        Role {
            name: name.into(),
            description: None,
            members: Vec::new(),
        }
    }

    pub fn contains(&self, username: &str) -> bool {
        self.members.iter().any(|m| m == username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_bare_password_with_default_algorithm() {
        let s = Secret::format_password("deadbeef");
        assert_eq!(s.0, "$bcrypt:deadbeef");
        assert_eq!(s.unpack_password(), "deadbeef");
    }

    #[test]
    fn preserves_already_formatted_password() {
        let s = Secret::format_password("$argon2:deadbeef");
        assert_eq!(s.0, "$argon2:deadbeef");
        assert_eq!(s.unpack_password(), "deadbeef");
    }

    #[test]
    fn user_password_roundtrip() {
        let mut user = User::new("alice");
        let mut auth = Authenticator::default();
        auth.set_password("deadbeef");
        user.authenticators.insert(AuthenticatorType::Password, auth);
        assert!(user.verify_password("deadbeef").is_ok());
        assert!(user.verify_password("wrong").is_err());
    }

    #[test]
    fn role_membership() {
        let role = Role {
            name: "physicists".into(),
            description: None,
            members: vec!["alice".into()],
        };
        assert!(role.contains("alice"));
        assert!(!role.contains("bob"));
    }
}
