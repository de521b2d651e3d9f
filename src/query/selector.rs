//! Dataset selector compiler (component E, §4.E): resolves a set of
//! namespace/name wildcard patterns, an optional recursive children walk,
//! and an optional `having` metadata filter into the SQL that enumerates
//! matching datasets.
//!
//! Grounded on `metacat/db/dbobjects2.py`'s `DBDataset.list_datasets` /
//! `apply_dataset_selector` / `sql_for_selector`: the one-hop children join
//! and the recursive variant both come from that method's two branches.

use crate::query::alias::AliasGen;
use crate::query::ast::Dnf;
use crate::query::dnf::compile_dnf;
use crate::error::CatalogResult;

/// One `namespace:name` pattern, each side optionally a SQL `LIKE`
/// wildcard (`%`/`_`) per §4.E "Input".
#[derive(Debug, Clone)]
pub struct Pattern {
    pub namespace: String,
    pub name: String,
}

impl Pattern {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Pattern { namespace: namespace.into(), name: name.into() }
    }

    fn is_wildcard(s: &str) -> bool {
        s.contains('%') || s.contains('_')
    }

    fn sql_literal(s: &str) -> String {
        format!("'{}'", s.replace('\'', "''"))
    }

    /// `namespace <op> 'pattern' and name <op> 'pattern'`, `op` being
    /// `like` for a wildcard side and `=` for an exact one.
    fn condition(&self, table: &str) -> String {
        let ns_op = if Self::is_wildcard(&self.namespace) { "like" } else { "=" };
        let name_op = if Self::is_wildcard(&self.name) { "like" } else { "=" };
        format!(
            "{table}.namespace {ns_op} {} and {table}.name {name_op} {}",
            Self::sql_literal(&self.namespace),
            Self::sql_literal(&self.name)
        )
    }
}

/// A dataset selector: a union of patterns, optionally widened to
/// children, optionally filtered by a DNF predicate over dataset metadata
/// (§4.E "Input").
#[derive(Debug, Clone, Default)]
pub struct DatasetSelector {
    pub patterns: Vec<Pattern>,
    pub with_children: bool,
    pub recursively: bool,
    pub having: Option<Dnf>,
}

impl DatasetSelector {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        DatasetSelector { patterns, with_children: false, recursively: false, having: None }
    }

    /// Compiles to a SQL query over `datasets d` returning `d.namespace,
    /// d.name`. `None` patterns list is invalid (caller should validate
    /// non-empty); an empty selector with no patterns still compiles, just
    /// to an always-empty result.
    pub fn compile(&self, aliases: &mut AliasGen) -> CatalogResult<String> {
        let base_alias = aliases.next("d");
        let base = if self.patterns.is_empty() {
            format!("select {base_alias}.namespace, {base_alias}.name from datasets {base_alias} where false")
        } else {
            let union = self
                .patterns
                .iter()
                .map(|p| {
                    format!(
                        "select {base_alias}.namespace, {base_alias}.name from datasets {base_alias} where {}",
                        p.condition(&base_alias)
                    )
                })
                .collect::<Vec<_>>()
                .join(" union ");
            union
        };

        let widened = if self.with_children {
            self.widen_with_children(&base, aliases)
        } else {
            base
        };

        match &self.having {
            None => Ok(widened),
            Some(dnf) => {
                let outer_alias = aliases.next("sel");
                let ds_alias = aliases.next("d");
                let where_clause = compile_dnf(dnf, &ds_alias)?.unwrap_or_else(|| "true".to_string());
                Ok(format!(
                    "select {outer_alias}.namespace, {outer_alias}.name from ({widened}) {outer_alias} \
                     join datasets {ds_alias} on {ds_alias}.namespace = {outer_alias}.namespace \
                     and {ds_alias}.name = {outer_alias}.name where {where_clause}"
                ))
            }
        }
    }

    /// One-hop children join: `base UNION (base join datasets on
    /// parent_namespace/parent_name)`.
    fn one_hop_children(&self, base: &str, aliases: &mut AliasGen) -> String {
        let base_cte = aliases.next("base");
        let child_alias = aliases.next("d");
        format!(
            "with {base_cte} as ({base}) \
             select namespace, name from {base_cte} \
             union \
             select {child_alias}.namespace, {child_alias}.name from datasets {child_alias} \
             join {base_cte} on {child_alias}.parent_namespace = {base_cte}.namespace \
             and {child_alias}.parent_name = {base_cte}.name"
        )
    }

    /// Recursive-CTE closure over all descendants, mirroring
    /// `sql_for_selector`'s recursive branch.
    fn recursive_children(&self, base: &str, aliases: &mut AliasGen) -> String {
        let cte = aliases.next("closure");
        let child_alias = aliases.next("d");
        format!(
            "with recursive {cte}(namespace, name) as ( \
                {base} \
                union \
                select {child_alias}.namespace, {child_alias}.name from datasets {child_alias} \
                join {cte} on {child_alias}.parent_namespace = {cte}.namespace \
                and {child_alias}.parent_name = {cte}.name \
             ) select namespace, name from {cte}"
        )
    }

    fn widen_with_children(&self, base: &str, aliases: &mut AliasGen) -> String {
        if self.recursively {
            self.recursive_children(base, aliases)
        } else {
            self.one_hop_children(base, aliases)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_exact_pattern() {
        let sel = DatasetSelector::new(vec![Pattern::new("cms", "reco")]);
        let mut aliases = AliasGen::new();
        let sql = sel.compile(&mut aliases).unwrap();
        assert!(sql.contains("d_1.namespace = 'cms'"));
        assert!(sql.contains("d_1.name = 'reco'"));
    }

    #[test]
    fn wildcard_pattern_uses_like() {
        let sel = DatasetSelector::new(vec![Pattern::new("cms", "reco_%")]);
        let mut aliases = AliasGen::new();
        let sql = sel.compile(&mut aliases).unwrap();
        assert!(sql.contains("name like 'reco_%'"));
    }

    #[test]
    fn multiple_patterns_union() {
        let sel = DatasetSelector::new(vec![Pattern::new("cms", "a"), Pattern::new("cms", "b")]);
        let mut aliases = AliasGen::new();
        let sql = sel.compile(&mut aliases).unwrap();
        assert_eq!(sql.matches(" union ").count(), 1);
    }

    #[test]
    fn with_children_one_hop_joins_once() {
        let mut sel = DatasetSelector::new(vec![Pattern::new("cms", "reco")]);
        sel.with_children = true;
        let mut aliases = AliasGen::new();
        let sql = sel.compile(&mut aliases).unwrap();
        assert!(sql.contains("with base_1 as"));
        assert!(sql.contains("parent_namespace = base_1.namespace"));
    }

    #[test]
    fn with_children_recursively_uses_recursive_cte() {
        let mut sel = DatasetSelector::new(vec![Pattern::new("cms", "reco")]);
        sel.with_children = true;
        sel.recursively = true;
        let mut aliases = AliasGen::new();
        let sql = sel.compile(&mut aliases).unwrap();
        assert!(sql.starts_with("with recursive closure_1"));
    }

    #[test]
    fn empty_pattern_list_compiles_to_always_false() {
        let sel = DatasetSelector::new(vec![]);
        let mut aliases = AliasGen::new();
        let sql = sel.compile(&mut aliases).unwrap();
        assert!(sql.contains("where false"));
    }
}
