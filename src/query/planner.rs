//! Basic-query planner (component F, §4.F): composes the DNF compiler and
//! the dataset selector compiler into one query, choosing among four plan
//! shapes depending on how many datasets the selector resolves to.
//!
//! Grounded on `metacat/db/dbobjects2.py`'s `DBFileSet.from_basic_query` /
//! `sql_for_basic_query`. The "how many datasets does the selector
//! resolve to" probe is inherently a database round trip, so this module
//! takes the already-resolved dataset list as an argument rather than
//! reaching for a connection itself — the repo layer performs that probe
//! and calls into `plan`, keeping this module a pure, unit-testable SQL
//! compiler like `dnf` and `selector`.

use crate::error::CatalogResult;
use crate::query::alias::AliasGen;
use crate::query::ast::Dnf;
use crate::query::dnf::compile_dnf;
use crate::query::selector::DatasetSelector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relationship {
    Parents,
    Children,
}

/// A basic query: a file-metadata filter, optionally scoped to a set of
/// datasets (§4.F "Input").
#[derive(Debug, Clone, Default)]
pub struct BasicQuery {
    pub dataset_selector: Option<DatasetSelector>,
    pub wheres: Dnf,
    pub with_metadata: bool,
    pub with_provenance: bool,
    pub limit: Option<i64>,
    pub relationship: Option<Relationship>,
}

/// The compiled shape chosen for one basic query (§4.F plan steps 1-4).
#[derive(Debug, Clone)]
pub enum Plan {
    /// No dataset selector: a single scan over `files_with_provenance`.
    SingleScan(String),
    /// The selector resolved to zero datasets at plan time: always empty.
    Empty,
    /// The selector resolved to exactly one dataset: delegated to that
    /// dataset's own file listing.
    SingleDataset { namespace: String, name: String, sql: String },
    /// The selector resolved to more than one dataset: one query with a
    /// `WITH` clause naming the selector result.
    MultiDataset(String),
}

fn projection(alias: &str, with_metadata: bool, with_provenance: bool) -> String {
    let metadata = if with_metadata { format!("{alias}.metadata") } else { "null".to_string() };
    let parents = if with_provenance { format!("{alias}.parents") } else { "null".to_string() };
    let children = if with_provenance { format!("{alias}.children") } else { "null".to_string() };
    format!(
        "{alias}.id, {alias}.namespace, {alias}.name, {metadata} as metadata, \
         {alias}.size, {alias}.checksums, {alias}.creator, {alias}.created_timestamp, \
         {parents} as parents, {children} as children"
    )
}

fn limit_clause(limit: Option<i64>) -> String {
    match limit {
        Some(n) => format!(" limit {n}"),
        None => String::new(),
    }
}

impl BasicQuery {
    fn where_clause(&self, alias: &str) -> CatalogResult<String> {
        Ok(compile_dnf(&self.wheres, alias)?.map(|w| format!(" where {w}")).unwrap_or_default())
    }

    fn single_scan_sql(&self, aliases: &mut AliasGen) -> CatalogResult<String> {
        let alias = aliases.next("f");
        let proj = projection(&alias, self.with_metadata, self.with_provenance);
        let wh = self.where_clause(&alias)?;
        Ok(format!(
            "select {proj} from files_with_provenance {alias}{wh}{}",
            limit_clause(self.limit)
        ))
    }

    fn single_dataset_sql(&self, namespace: &str, name: &str, aliases: &mut AliasGen) -> CatalogResult<String> {
        let f = aliases.next("f");
        let fd = aliases.next("fd");
        let proj = projection(&f, self.with_metadata, self.with_provenance);
        let wh = compile_dnf(&self.wheres, &f)?
            .map(|w| format!(" and {w}"))
            .unwrap_or_default();
        Ok(format!(
            "select {proj} from files_with_provenance {f} join files_datasets {fd} on {fd}.file_id = {f}.id \
             where {fd}.dataset_namespace = '{ns}' and {fd}.dataset_name = '{nm}'{wh}{limit}",
            ns = namespace.replace('\'', "''"),
            nm = name.replace('\'', "''"),
            wh = wh,
            limit = limit_clause(self.limit),
        ))
    }

    fn multi_dataset_sql(&self, selector_sql: &str, aliases: &mut AliasGen) -> CatalogResult<String> {
        let sel_cte = aliases.next("selected");
        let f = aliases.next("f");
        let fd = aliases.next("fd");
        let proj = projection(&f, self.with_metadata, self.with_provenance);
        let wh = compile_dnf(&self.wheres, &f)?
            .map(|w| format!(" and {w}"))
            .unwrap_or_default();
        Ok(format!(
            "with {sel_cte} as ({selector_sql}) \
             select {proj} from files_with_provenance {f} \
             join files_datasets {fd} on {fd}.file_id = {f}.id \
             join {sel_cte} on {sel_cte}.namespace = {fd}.dataset_namespace and {sel_cte}.name = {fd}.dataset_name{wh}{limit}",
            limit = limit_clause(self.limit),
        ))
    }

    /// Chooses and compiles one of the four plan shapes (§4.F steps 1-4),
    /// given `resolved_datasets`: the selector's already-executed result,
    /// or `None` when there is no selector at all.
    pub fn plan(&self, resolved_datasets: Option<&[(String, String)]>, aliases: &mut AliasGen) -> CatalogResult<Plan> {
        if self.limit == Some(0) {
            return Ok(Plan::Empty);
        }
        let Some(datasets) = resolved_datasets else {
            return Ok(Plan::SingleScan(self.single_scan_sql(aliases)?));
        };
        match datasets {
            [] => Ok(Plan::Empty),
            [(namespace, name)] => Ok(Plan::SingleDataset {
                namespace: namespace.clone(),
                name: name.clone(),
                sql: self.single_dataset_sql(namespace, name, aliases)?,
            }),
            _ => {
                let selector = self
                    .dataset_selector
                    .as_ref()
                    .expect("resolved_datasets implies a selector was present");
                let selector_sql = selector.compile(aliases)?;
                Ok(Plan::MultiDataset(self.multi_dataset_sql(&selector_sql, aliases)?))
            }
        }
    }
}

/// Builds the relationship-hop query (§4.F "Relationship hop"): given the
/// base query's resulting file IDs, fetches the parent or child set,
/// deduplicated by the join.
pub fn relationship_hop_sql(relationship: Relationship, ids: &[String]) -> String {
    let (self_col, other_col) = match relationship {
        Relationship::Parents => ("child_id", "parent_id"),
        Relationship::Children => ("parent_id", "child_id"),
    };
    let id_list = ids.iter().map(|id| format!("'{}'", id.replace('\'', "''"))).collect::<Vec<_>>().join(",");
    format!(
        "select distinct f.* from files_with_provenance f, parent_child pc \
         where f.id = pc.{other_col} and pc.{self_col} = any(array[{id_list}])"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ast::{ArgShape, CmpOp, Literal, Op, Predicate};
    use crate::query::selector::{DatasetSelector, Pattern};

    fn sample_wheres() -> Dnf {
        vec![vec![Predicate::new(
            ArgShape::Scalar { name: "run".into() },
            Op::Cmp(CmpOp::Eq, Literal::Int(1)),
            false,
        )]]
    }

    #[test]
    fn no_selector_is_single_scan() {
        let q = BasicQuery { wheres: sample_wheres(), ..Default::default() };
        let mut aliases = AliasGen::new();
        match q.plan(None, &mut aliases).unwrap() {
            Plan::SingleScan(sql) => assert!(sql.contains("files_with_provenance")),
            other => panic!("expected SingleScan, got {other:?}"),
        }
    }

    #[test]
    fn zero_resolved_datasets_is_empty() {
        let q = BasicQuery {
            dataset_selector: Some(DatasetSelector::new(vec![Pattern::new("cms", "x")])),
            ..Default::default()
        };
        let mut aliases = AliasGen::new();
        assert!(matches!(q.plan(Some(&[]), &mut aliases).unwrap(), Plan::Empty));
    }

    #[test]
    fn one_resolved_dataset_delegates() {
        let q = BasicQuery {
            dataset_selector: Some(DatasetSelector::new(vec![Pattern::new("cms", "x")])),
            wheres: sample_wheres(),
            ..Default::default()
        };
        let mut aliases = AliasGen::new();
        let datasets = vec![("cms".to_string(), "reco".to_string())];
        match q.plan(Some(&datasets), &mut aliases).unwrap() {
            Plan::SingleDataset { namespace, name, sql } => {
                assert_eq!(namespace, "cms");
                assert_eq!(name, "reco");
                assert!(sql.contains("dataset_namespace = 'cms'"));
            }
            other => panic!("expected SingleDataset, got {other:?}"),
        }
    }

    #[test]
    fn multiple_resolved_datasets_uses_with_clause() {
        let q = BasicQuery {
            dataset_selector: Some(DatasetSelector::new(vec![Pattern::new("cms", "%")])),
            ..Default::default()
        };
        let mut aliases = AliasGen::new();
        let datasets = vec![("cms".to_string(), "a".to_string()), ("cms".to_string(), "b".to_string())];
        match q.plan(Some(&datasets), &mut aliases).unwrap() {
            Plan::MultiDataset(sql) => {
                assert!(sql.starts_with("with selected_1 as"));
                assert!(sql.contains("join files_datasets"));
            }
            other => panic!("expected MultiDataset, got {other:?}"),
        }
    }

    #[test]
    fn projection_falls_back_to_null_literals() {
        let q = BasicQuery { with_metadata: false, with_provenance: false, ..Default::default() };
        let mut aliases = AliasGen::new();
        let sql = q.single_scan_sql(&mut aliases).unwrap();
        assert!(sql.contains("null as metadata"));
        assert!(sql.contains("null as parents"));
    }

    #[test]
    fn zero_limit_is_empty_without_a_selector_probe() {
        let q = BasicQuery { limit: Some(0), wheres: sample_wheres(), ..Default::default() };
        let mut aliases = AliasGen::new();
        assert!(matches!(q.plan(None, &mut aliases).unwrap(), Plan::Empty));
    }

    #[test]
    fn relationship_hop_builds_parent_join() {
        let sql = relationship_hop_sql(Relationship::Parents, &["a".to_string(), "b".to_string()]);
        assert!(sql.contains("f.id = pc.parent_id"));
        assert!(sql.contains("pc.child_id = any(array['a','b'])"));
    }
}
