//! Name and identifier utilities (component A).
//!
//! `parse_name` splits a `namespace:name` spec the way the catalog's CLI and
//! HTTP frontends hand specs down to the core; `generate_fid` produces the
//! 128-bit hex file identifier used when a caller does not supply one of its
//! own, following the `models::Id`/`agent_sql::Id` pattern of a fixed-width
//! byte array rendered as lowercase hex.

use crate::error::CatalogError;
use uuid::Uuid;

/// Splits `input` on the first `:`. If there is no `:`, or the left-hand
/// side is empty, `default_namespace` is used instead, and fails with
/// `InvalidName` if that is also absent.
pub fn parse_name(input: &str, default_namespace: Option<&str>) -> Result<(String, String), CatalogError> {
    let mut parts = input.splitn(2, ':');
    let first = parts.next().unwrap_or("");
    let rest = parts.next();

    let (namespace, name) = match rest {
        Some(name) if !first.is_empty() => (first.to_string(), name.to_string()),
        Some(name) => {
            let ns = default_namespace
                .ok_or_else(|| CatalogError::invalid_name("null default namespace"))?;
            (ns.to_string(), name.to_string())
        }
        None => {
            let ns = default_namespace
                .ok_or_else(|| CatalogError::invalid_name("null default namespace"))?;
            (ns.to_string(), first.to_string())
        }
    };
    Ok((namespace, name))
}

/// Generates a fresh 128-bit file identifier as lowercase hex, used when a
/// caller omits one on ingest.
pub fn generate_fid() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_namespace_and_name() {
        let (ns, name) = parse_name("cms:run1.root", None).unwrap();
        assert_eq!(ns, "cms");
        assert_eq!(name, "run1.root");
    }

    #[test]
    fn falls_back_to_default_namespace_when_absent() {
        let (ns, name) = parse_name("run1.root", Some("cms")).unwrap();
        assert_eq!(ns, "cms");
        assert_eq!(name, "run1.root");
    }

    #[test]
    fn falls_back_to_default_namespace_when_left_empty() {
        let (ns, name) = parse_name(":run1.root", Some("cms")).unwrap();
        assert_eq!(ns, "cms");
        assert_eq!(name, "run1.root");
    }

    #[test]
    fn errors_without_default_namespace() {
        let err = parse_name("run1.root", None).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidName(_)));
    }

    #[test]
    fn generated_fid_is_32_hex_chars() {
        let fid = generate_fid();
        assert_eq!(fid.len(), 32);
        assert!(fid.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
