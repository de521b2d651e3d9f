//! File record model (component B, §3 "File").
//!
//! Mirrors `agent_sql::live_specs::LiveSpec`: a plain struct with public
//! fields, constructed by the repository layer from query rows, with a
//! `to_plain` projection used for the external JSON shape (§6).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::{CatalogError, CatalogResult};

/// A file record. `namespace`/`name` are always both present or both
/// absent (§3 invariant); `metadata`, `parents`, `children`, `datasets` are
/// populated only when the caller asked for them, keeping the struct shape
/// uniform across queries that do or don't project those columns.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    pub fid: String,
    pub namespace: Option<String>,
    pub name: Option<String>,
    pub metadata: Option<Value>,
    pub size: Option<i64>,
    pub checksums: BTreeMap<String, String>,
    pub creator: Option<String>,
    pub created_timestamp: Option<DateTime<Utc>>,
    pub parents: Option<Vec<String>>,
    pub children: Option<Vec<String>>,
    pub datasets: Option<Vec<(String, String)>>,
}

impl File {
    /// Builds a new file, generating a fid if `fid` is `None`. Returns
    /// `InvalidName` if exactly one of `namespace`/`name` is set.
    pub fn new(
        fid: Option<String>,
        namespace: Option<String>,
        name: Option<String>,
    ) -> CatalogResult<Self> {
        if namespace.is_some() != name.is_some() {
            return Err(CatalogError::invalid_name(
                "namespace and name must both be present or both be absent",
            ));
        }
        Ok(File {
            fid: fid.unwrap_or_else(crate::names::generate_fid),
            namespace,
            name,
            metadata: None,
            size: None,
            checksums: BTreeMap::new(),
            creator: None,
            created_timestamp: None,
            parents: None,
            children: None,
            datasets: None,
        })
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.metadata
            .as_ref()
            .and_then(|m| m.as_object())
            .map(|obj| obj.contains_key(name))
            .unwrap_or(false)
    }

    pub fn get_attribute(&self, name: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(name))
    }

    /// Projects the record to the external JSON shape described in §6.
    /// Optional fields are omitted when unset, rather than emitted as
    /// `null`, so callers can distinguish "not requested" from "empty".
    pub fn to_plain(&self) -> Value {
        let mut obj = serde_json::Map::new();
        obj.insert("fid".into(), json!(self.fid));
        obj.insert("namespace".into(), json!(self.namespace));
        obj.insert("name".into(), json!(self.name));
        if !self.checksums.is_empty() {
            obj.insert("checksums".into(), json!(self.checksums));
        }
        if let Some(size) = self.size {
            obj.insert("size".into(), json!(size));
        }
        if let Some(ref meta) = self.metadata {
            obj.insert("metadata".into(), meta.clone());
        }
        if let Some(ref parents) = self.parents {
            obj.insert("parents".into(), json!(parents));
        }
        if let Some(ref children) = self.children {
            obj.insert("children".into(), json!(children));
        }
        if let Some(ref datasets) = self.datasets {
            let list: Vec<Value> = datasets
                .iter()
                .map(|(ns, name)| json!({"namespace": ns, "name": name}))
                .collect();
            obj.insert("datasets".into(), json!(list));
        }
        Value::Object(obj)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_half_set_namespace_name() {
        let err = File::new(None, Some("cms".into()), None).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidName(_)));
    }

    #[test]
    fn generates_fid_when_absent() {
        let f = File::new(None, None, None).unwrap();
        assert_eq!(f.fid.len(), 32);
    }

    #[test]
    fn to_plain_omits_unset_optional_fields() {
        let f = File::new(Some("abc".into()), Some("cms".into()), Some("a.root".into())).unwrap();
        let plain = f.to_plain();
        let obj = plain.as_object().unwrap();
        assert!(!obj.contains_key("metadata"));
        assert!(!obj.contains_key("parents"));
        assert!(!obj.contains_key("children"));
        assert_eq!(obj["fid"], json!("abc"));
    }

    #[test]
    fn to_plain_includes_populated_optional_fields() {
        let mut f = File::new(Some("abc".into()), Some("cms".into()), Some("a.root".into())).unwrap();
        f.metadata = Some(json!({"run": 4242}));
        f.parents = Some(vec!["p1".into()]);
        let plain = f.to_plain();
        assert_eq!(plain["metadata"]["run"], json!(4242));
        assert_eq!(plain["parents"], json!(["p1"]));
    }
}
