//! Dataset record model (component B, §3 "Dataset").

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::{CatalogError, CatalogResult};

#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub namespace: String,
    pub name: String,
    pub parent_namespace: Option<String>,
    pub parent_name: Option<String>,
    pub frozen: bool,
    pub monotonic: bool,
    pub metadata: Value,
    pub creator: Option<String>,
    pub created_timestamp: Option<DateTime<Utc>>,
    pub description: Option<String>,
}

impl Dataset {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        parent_namespace: Option<String>,
        parent_name: Option<String>,
    ) -> CatalogResult<Self> {
        if parent_namespace.is_some() != parent_name.is_some() {
            return Err(CatalogError::invalid_name(
                "parent_namespace and parent_name must both be present or both be absent",
            ));
        }
        Ok(Dataset {
            namespace: namespace.into(),
            name: name.into(),
            parent_namespace,
            parent_name,
            frozen: false,
            monotonic: false,
            metadata: json!({}),
            creator: None,
            created_timestamp: None,
            description: None,
        })
    }

    pub fn has_parent(&self) -> bool {
        self.parent_namespace.is_some()
    }

    /// §6 external JSON shape. `created_timestamp` is seconds-since-epoch.
    pub fn to_plain(&self) -> Value {
        json!({
            "namespace": self.namespace,
            "name": self.name,
            "parent_namespace": self.parent_namespace,
            "parent_name": self.parent_name,
            "metadata": self.metadata,
            "creator": self.creator,
            "created_timestamp": self.created_timestamp.map(|t| t.timestamp() as f64),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_half_set_parent() {
        let err = Dataset::new("cms", "raw", Some("cms".into()), None).unwrap_err();
        assert!(matches!(err, CatalogError::InvalidName(_)));
    }

    #[test]
    fn to_plain_shape() {
        let ds = Dataset::new("cms", "raw", None, None).unwrap();
        let plain = ds.to_plain();
        assert_eq!(plain["namespace"], json!("cms"));
        assert_eq!(plain["name"], json!("raw"));
        assert_eq!(plain["parent_namespace"], Value::Null);
    }
}
