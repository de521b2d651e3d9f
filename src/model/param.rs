//! Parameter category / definition / validator (component B, §3 "Parameter
//! category", supplemented per SPEC_FULL.md §11 from
//! `metacat/db/dbobjects2.py`'s `DBParamDefinition`/`DBParamCategory`/
//! `DBParamValidator`).
//!
//! The DB-backed "find the category that owns this path" lookup
//! (`category_for_path`) lives in `repo::params`; this module holds the
//! pure validation logic, taking the lookup as an injected closure so it's
//! testable without a database.

use std::collections::{BTreeMap, HashMap};

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CatalogError, MetaFieldError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    Int,
    Double,
    Text,
    Boolean,
    IntArray,
    DoubleArray,
    TextArray,
    BooleanArray,
}

/// Type + range/enum/regex constraints on a single metadata key, relative
/// to its owning category's path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamDefinition {
    pub name: String,
    pub typ: ParamType,
    pub int_values: Option<Vec<i64>>,
    pub int_min: Option<i64>,
    pub int_max: Option<i64>,
    pub double_values: Option<Vec<f64>>,
    pub double_min: Option<f64>,
    pub double_max: Option<f64>,
    pub text_values: Option<Vec<String>>,
    pub text_pattern: Option<String>,
}

impl ParamDefinition {
    pub fn new(name: impl Into<String>, typ: ParamType) -> Self {
        ParamDefinition {
            name: name.into(),
            typ,
            int_values: None,
            int_min: None,
            int_max: None,
            double_values: None,
            double_min: None,
            double_max: None,
            text_values: None,
            text_pattern: None,
        }
    }

    /// Checks a single JSON value against this definition's constraints.
    /// An integer value is additionally checked against the double
    /// constraints (mirroring the source's "check floating point
    /// constraints too" fallthrough).
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if let Some(i) = value.as_i64() {
            self.check_int(i)?;
            return self.check_double(i as f64);
        }
        if let Some(f) = value.as_f64() {
            return self.check_double(f);
        }
        if let Some(s) = value.as_str() {
            return self.check_text(s);
        }
        if value.is_boolean() {
            return Ok(());
        }
        Err(format!("unsupported value type for {}", self.name))
    }

    fn check_int(&self, value: i64) -> Result<(), String> {
        if let Some(ref values) = self.int_values {
            if !values.contains(&value) {
                return Err(format!("{value} is not one of the allowed values"));
            }
        }
        if let Some(min) = self.int_min {
            if value < min {
                return Err(format!("{value} is below minimum {min}"));
            }
        }
        if let Some(max) = self.int_max {
            if value > max {
                return Err(format!("{value} is above maximum {max}"));
            }
        }
        Ok(())
    }

    fn check_double(&self, value: f64) -> Result<(), String> {
        if let Some(ref values) = self.double_values {
            if !values.iter().any(|v| (*v - value).abs() < f64::EPSILON) {
                return Err(format!("{value} is not one of the allowed values"));
            }
        }
        if let Some(min) = self.double_min {
            if value < min {
                return Err(format!("{value} is below minimum {min}"));
            }
        }
        if let Some(max) = self.double_max {
            if value > max {
                return Err(format!("{value} is above maximum {max}"));
            }
        }
        Ok(())
    }

    fn check_text(&self, value: &str) -> Result<(), String> {
        if let Some(ref pattern) = self.text_pattern {
            let re = Regex::new(pattern).map_err(|e| format!("invalid pattern {pattern}: {e}"))?;
            if !re.is_match(value) {
                return Err(format!("{value} does not match pattern {pattern}"));
            }
        }
        if let Some(ref values) = self.text_values {
            if !values.iter().any(|v| v == value) {
                return Err(format!("{value} is not one of the allowed values"));
            }
        }
        Ok(())
    }
}

/// A path-rooted scope carrying typed constraints on the metadata keys
/// beneath it (§3, GLOSSARY "Parameter category").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamCategory {
    pub path: String,
    pub owner_role: String,
    pub restricted: bool,
    pub definitions: BTreeMap<String, ParamDefinition>,
}

impl ParamCategory {
    pub fn new(path: impl Into<String>, owner_role: impl Into<String>) -> Self {
        ParamCategory {
            path: path.into(),
            owner_role: owner_role.into(),
            restricted: false,
            definitions: BTreeMap::new(),
        }
    }

    /// `name` is relative to the category path. Unknown names are allowed
    /// unless the category is `restricted`.
    pub fn check_metadata(&self, name: &str, value: &Value) -> Result<(), MetaFieldError> {
        match self.definitions.get(name) {
            Some(def) => def.check(value).map_err(|message| MetaFieldError {
                key: name.to_string(),
                message,
            }),
            None if self.restricted => Err(MetaFieldError {
                key: name.to_string(),
                message: format!("unknown name {name} in a restricted category"),
            }),
            None => Ok(()),
        }
    }
}

/// Builds the list of candidate paths from deepest to shallowest, used by
/// `category_for_path`'s "deepest category containing path" lookup.
pub fn candidate_paths(path: &str) -> Vec<String> {
    let mut paths = vec![".".to_string()];
    let mut prefix = Vec::new();
    for word in path.split('.').filter(|w| !w.is_empty()) {
        prefix.push(word);
        paths.push(prefix.join("."));
    }
    paths
}

/// Validates a whole metadata object, resolving each dotted key to its
/// owning category via `lookup` (a cached, memoizing closure over the
/// real DB-backed `category_for_path` in the caller).
pub fn validate_metadata(
    meta: &serde_json::Map<String, Value>,
    mut lookup: impl FnMut(&str) -> Result<Option<ParamCategory>, CatalogError>,
) -> Result<(), CatalogError> {
    let mut cache: HashMap<String, Option<ParamCategory>> = HashMap::new();
    let mut errors = Vec::new();

    let mut keys: Vec<&String> = meta.keys().collect();
    keys.sort();

    for key in keys {
        let value = &meta[key];
        let (parent, name) = match key.rsplit_once('.') {
            Some((parent, name)) => (parent, name),
            None => ("", key.as_str()),
        };
        if !cache.contains_key(parent) {
            let category = lookup(parent)?;
            cache.insert(parent.to_string(), category);
        }
        if let Some(Some(category)) = cache.get(parent) {
            if let Err(e) = category.check_metadata(name, value) {
                errors.push(e);
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CatalogError::MetaValidationError(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn checks_int_range() {
        let mut def = ParamDefinition::new("run", ParamType::Int);
        def.int_min = Some(1);
        def.int_max = Some(10);
        assert!(def.check(&json!(5)).is_ok());
        assert!(def.check(&json!(20)).is_err());
    }

    #[test]
    fn checks_text_pattern() {
        let mut def = ParamDefinition::new("site", ParamType::Text);
        def.text_pattern = Some("^T[0-3]_".to_string());
        assert!(def.check(&json!("T1_US_FNAL")).is_ok());
        assert!(def.check(&json!("nonsense")).is_err());
    }

    #[test]
    fn restricted_category_rejects_unknown_keys() {
        let mut cat = ParamCategory::new("cms", "physicists");
        cat.restricted = true;
        assert!(cat.check_metadata("run", &json!(1)).is_err());
    }

    #[test]
    fn unrestricted_category_allows_unknown_keys() {
        let cat = ParamCategory::new("cms", "physicists");
        assert!(cat.check_metadata("anything", &json!("x")).is_ok());
    }

    #[test]
    fn candidate_paths_from_deepest_to_root() {
        assert_eq!(candidate_paths("cms.reco"), vec![".", "cms", "cms.reco"]);
        assert_eq!(candidate_paths(""), vec!["."]);
    }

    #[test]
    fn validate_metadata_collects_errors_across_keys() {
        let mut cat = ParamCategory::new("cms", "physicists");
        let mut def = ParamDefinition::new("run", ParamType::Int);
        def.int_min = Some(1);
        cat.definitions.insert("run".into(), def);

        let meta = serde_json::json!({"cms.run": -1, "cms.site": "T1_US_FNAL"})
            .as_object()
            .unwrap()
            .clone();

        let result = validate_metadata(&meta, |parent| {
            if parent == "cms" {
                Ok(Some(cat.clone()))
            } else {
                Ok(None)
            }
        });

        let err = result.unwrap_err();
        match err {
            CatalogError::MetaValidationError(errs) => assert_eq!(errs.len(), 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
