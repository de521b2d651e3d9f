//! DNF compiler (component D, §4.D): translates a DNF expression tree over
//! the file-metadata attribute algebra into a single SQL boolean
//! expression, combining direct column comparisons for fixed columns with
//! JSON-path predicates (`@@`, `@?`, `?`, `jsonb_array_length`) for
//! metadata keys.
//!
//! Grounded on `metacat/db/dbobjects2.py`'s `MetaExpressionDNF.sql_and`/
//! `sql`, adapted into a pure function over the `ast` types instead of a
//! stateful object walking an external parser's node tree. A couple of
//! source quirks are cleaned up rather than reproduced verbatim (see
//! DESIGN.md): `not_present` now applies the outer negation the spec calls
//! for, and `not_in_set` on `array_length` absorbs negation the same way
//! `not_in_range` does, instead of the source's redundant double-negation.

use crate::error::{CatalogError, CatalogResult};
use crate::query::ast::{AndTerm, ArgShape, CmpOp, Dnf, Literal, Op, Predicate};

/// Attributes backed by a typed column rather than a JSON metadata key
/// (GLOSSARY "Fixed column").
pub const FIXED_COLUMNS: &[&str] = &["creator", "created_timestamp", "name", "namespace", "size"];

pub fn is_fixed_column(name: &str) -> bool {
    !name.contains('.') && FIXED_COLUMNS.contains(&name)
}

fn sql_literal(lit: &Literal) -> String {
    match lit {
        Literal::Bool(b) => if *b { "true" } else { "false" }.to_string(),
        Literal::Int(i) => i.to_string(),
        Literal::Float(f) => format!("{f}"),
        Literal::Str(s) => format!("'{}'", s.replace('\'', "''")),
        Literal::Null => "null".to_string(),
    }
}

fn json_literal(lit: &Literal) -> String {
    match lit {
        Literal::Str(s) => serde_json::to_string(s).expect("string always serializes"),
        other => sql_literal(other),
    }
}

/// Quotes a bare SQL string argument (e.g. to `?` or `->`), as opposed to
/// a jsonpath string.
fn sql_quote(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

/// JSON-escapes and quotes an attribute name for use inside a jsonpath
/// expression, i.e. the `<name>` in `$."<name>"` (§4.D invariant (c)).
fn json_path_name(name: &str) -> String {
    serde_json::to_string(name).expect("string always serializes")
}

fn cmp_symbol(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "=",
        CmpOp::Ne => "!=",
        CmpOp::Lt => "<",
        CmpOp::Le => "<=",
        CmpOp::Gt => ">",
        CmpOp::Ge => ">=",
        CmpOp::Match => "~",
        CmpOp::IMatch => "~*",
        CmpOp::NotMatch => "!~",
        CmpOp::NotIMatch => "!~*",
    }
}

fn json_cmp_symbol(op: CmpOp) -> &'static str {
    match op {
        CmpOp::Eq => "==",
        other => cmp_symbol(other),
    }
}

/// Where a non-fixed attribute's JSON path predicate is anchored:
/// `$."name"`, `$."name"[i]`, or `$."name"[*]`.
fn json_subscript(arg: &ArgShape) -> CatalogResult<String> {
    match arg {
        ArgShape::Scalar { .. } => Ok(String::new()),
        ArgShape::ArraySubscript { index, .. } => Ok(format!("[{}]", json_literal(index))),
        ArgShape::ArrayAny { .. } => Ok("[*]".to_string()),
        ArgShape::ArrayLength { .. } => Err(CatalogError::query_compile(
            "array_length has no json subscript form",
        )),
    }
}

/// Validates that a fixed-column attribute is addressed with the plain
/// `scalar` shape; fixed columns aren't arrays, so subscript/any/length
/// access on one is a compile error (§4.D "Failure modes").
fn require_scalar(arg: &ArgShape) -> CatalogResult<()> {
    match arg {
        ArgShape::Scalar { .. } => Ok(()),
        other => Err(CatalogError::query_compile(format!(
            "fixed column '{}' cannot be addressed with {:?}",
            other.name(),
            other
        ))),
    }
}

fn compile_present(name: &str, table: &str, want_present: bool) -> String {
    if is_fixed_column(name) {
        if want_present { "true" } else { "false" }.to_string()
    } else {
        let base = format!("{table}.metadata ? {}", sql_quote(name));
        if want_present {
            base
        } else {
            format!("not ({base})")
        }
    }
}

fn compile_range(
    arg: &ArgShape,
    table: &str,
    low: &Literal,
    high: &Literal,
    not_in_range: bool,
    neg: bool,
) -> CatalogResult<(String, bool)> {
    let name = arg.name();
    if is_fixed_column(name) {
        require_scalar(arg)?;
        let between = format!(
            "{table}.{name} between {} and {}",
            sql_literal(low),
            sql_literal(high)
        );
        let term = if not_in_range {
            format!("not ({between})")
        } else {
            between
        };
        return Ok((term, false));
    }
    match arg {
        ArgShape::ArrayLength { .. } => {
            let not_kw = if not_in_range == neg { "" } else { "not" };
            let term = format!(
                "jsonb_array_length({table}.metadata -> {}) {not_kw} between {} and {}",
                sql_quote(name),
                sql_literal(low),
                sql_literal(high)
            )
            .replace("  ", " ");
            Ok((term, true)) // absorbed: neg already folded into not_kw
        }
        ArgShape::Scalar { .. } | ArgShape::ArraySubscript { .. } | ArgShape::ArrayAny { .. } => {
            let subscript = json_subscript(arg)?;
            let path = json_path_name(name);
            let inner = if not_in_range {
                format!("@ < {} || @ > {}", json_literal(low), json_literal(high))
            } else {
                format!("@ >= {} && @ <= {}", json_literal(low), json_literal(high))
            };
            let term = format!("{table}.metadata @? {}", sql_quote(&format!("$.{path}{subscript} ? ({inner})")));
            Ok((term, false))
        }
    }
}

fn compile_set(
    arg: &ArgShape,
    table: &str,
    set: &[Literal],
    not_in_set: bool,
    neg: bool,
) -> CatalogResult<(String, bool)> {
    let name = arg.name();
    if is_fixed_column(name) {
        require_scalar(arg)?;
        let values = set.iter().map(sql_literal).collect::<Vec<_>>().join(",");
        let term = format!("{table}.{name} in ({values})");
        let term = if not_in_set { format!("not ({term})") } else { term };
        return Ok((term, false));
    }
    match arg {
        ArgShape::ArrayLength { .. } => {
            let values = set.iter().map(sql_literal).collect::<Vec<_>>().join(",");
            let not_kw = if not_in_set == neg { "" } else { "not" };
            let term = format!(
                "jsonb_array_length({table}.metadata -> {}) {not_kw} in ({values})",
                sql_quote(name)
            )
            .replace("  ", " ");
            Ok((term, true))
        }
        ArgShape::Scalar { .. } | ArgShape::ArraySubscript { .. } | ArgShape::ArrayAny { .. } => {
            let subscript = json_subscript(arg)?;
            let path = json_path_name(name);
            let inner = if not_in_set {
                set.iter()
                    .map(|v| format!("@ != {}", json_literal(v)))
                    .collect::<Vec<_>>()
                    .join(" && ")
            } else {
                set.iter()
                    .map(|v| format!("@ == {}", json_literal(v)))
                    .collect::<Vec<_>>()
                    .join(" || ")
            };
            let term = format!("{table}.metadata @? {}", sql_quote(&format!("$.{path}{subscript} ? ({inner})")));
            Ok((term, false))
        }
    }
}

fn compile_cmp(arg: &ArgShape, table: &str, op: CmpOp, value: &Literal) -> CatalogResult<String> {
    let name = arg.name();
    if is_fixed_column(name) {
        require_scalar(arg)?;
        return Ok(format!("{table}.{name} {} {}", cmp_symbol(op), sql_literal(value)));
    }
    match arg {
        ArgShape::ArrayLength { .. } => {
            if op.is_regex() {
                return Err(CatalogError::query_compile(
                    "regex comparison is not valid on length(...)",
                ));
            }
            Ok(format!(
                "jsonb_array_length({table}.metadata -> {}) {} {}",
                sql_quote(name),
                cmp_symbol(op),
                json_literal(value)
            ))
        }
        ArgShape::Scalar { .. } | ArgShape::ArraySubscript { .. } | ArgShape::ArrayAny { .. } => {
            let subscript = json_subscript(arg)?;
            let path = json_path_name(name);
            if op.is_regex() {
                let Literal::Str(pattern) = value else {
                    return Err(CatalogError::query_compile("regex operand must be a string"));
                };
                let negate_predicate = matches!(op, CmpOp::NotMatch | CmpOp::NotIMatch);
                let case_insensitive = matches!(op, CmpOp::IMatch | CmpOp::NotIMatch);
                let flag = if case_insensitive { " flag \"i\"" } else { "" };
                let mut predicate = format!("@ like_regex {}{flag}", json_literal(&Literal::Str(pattern.clone())));
                if negate_predicate {
                    predicate = format!("!({predicate})");
                }
                Ok(format!(
                    "{table}.metadata @? {}",
                    sql_quote(&format!("$.{path}{subscript} ? ({predicate})"))
                ))
            } else {
                Ok(format!(
                    "{table}.metadata @@ {}",
                    sql_quote(&format!("$.{path}{subscript} {} {}", json_cmp_symbol(op), json_literal(value)))
                ))
            }
        }
    }
}

/// Compiles one atomic predicate to a parenthesized SQL boolean term.
pub fn compile_predicate(p: &Predicate, table: &str) -> CatalogResult<String> {
    let (term, absorbed) = match &p.op {
        Op::Present => (compile_present(p.arg.name(), table, !p.neg), true),
        Op::NotPresent => (compile_present(p.arg.name(), table, p.neg), true),
        Op::Cmp(op, value) => (compile_cmp(&p.arg, table, *op, value)?, false),
        Op::InRange(low, high) => compile_range(&p.arg, table, low, high, false, p.neg)?,
        Op::NotInRange(low, high) => compile_range(&p.arg, table, low, high, true, p.neg)?,
        Op::InSet(set) => compile_set(&p.arg, table, set, false, p.neg)?,
        Op::NotInSet(set) => compile_set(&p.arg, table, set, true, p.neg)?,
    };
    if absorbed || !p.neg {
        Ok(term)
    } else {
        Ok(format!("not ({term})"))
    }
}

/// Compiles an AND-term: `(p1) and (p2) ...` (§4.D rule 7).
pub fn compile_and_term(term: &AndTerm, table: &str) -> CatalogResult<String> {
    let parts = term
        .iter()
        .map(|p| compile_predicate(p, table).map(|t| format!("({t})")))
        .collect::<CatalogResult<Vec<_>>>()?;
    Ok(parts.join(" and "))
}

/// Compiles a full DNF predicate. Returns `None` for an empty DNF, meaning
/// "no WHERE clause" (§4.D rule 7, §8 boundary behavior).
pub fn compile_dnf(dnf: &Dnf, table: &str) -> CatalogResult<Option<String>> {
    if dnf.is_empty() {
        return Ok(None);
    }
    let terms = dnf
        .iter()
        .map(|t| compile_and_term(t, table))
        .collect::<CatalogResult<Vec<_>>>()?;
    let sql = terms.join(" or ");
    tracing::trace!(sql = %sql, "compiled DNF");
    Ok(Some(sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(name: &str) -> ArgShape {
        ArgShape::Scalar { name: name.into() }
    }

    #[test]
    fn empty_dnf_has_no_where_clause() {
        assert_eq!(compile_dnf(&vec![], "f").unwrap(), None);
    }

    #[test]
    fn fixed_column_equality() {
        let p = Predicate::new(scalar("creator"), Op::Cmp(CmpOp::Eq, Literal::Str("alice".into())), false);
        assert_eq!(compile_predicate(&p, "f").unwrap(), "f.creator = 'alice'");
    }

    #[test]
    fn json_top_level_key_equality_scenario_1() {
        // §8 scenario 1: run == 4242 -> metadata @@ '$."run" == 4242'
        let p = Predicate::new(scalar("run"), Op::Cmp(CmpOp::Eq, Literal::Int(4242)), false);
        assert_eq!(compile_predicate(&p, "f").unwrap(), "f.metadata @@ '$.\"run\" == 4242'");
    }

    #[test]
    fn array_any_regex_scenario_2() {
        // §8 scenario 2
        let arg = ArgShape::ArrayAny { name: "files".into() };
        let p = Predicate::new(arg, Op::Cmp(CmpOp::IMatch, Literal::Str("\\.root$".into())), false);
        let sql = compile_predicate(&p, "f").unwrap();
        assert_eq!(
            sql,
            "f.metadata @? '$.\"files\"[*] ? (@ like_regex \"\\\\.root$\" flag \"i\")'"
        );
    }

    #[test]
    fn array_length_not_between_scenario_3() {
        // §8 scenario 3: not length(parents) between 2 and 5
        let arg = ArgShape::ArrayLength { name: "parents".into() };
        let p = Predicate::new(arg, Op::InRange(Literal::Int(2), Literal::Int(5)), true);
        let sql = compile_predicate(&p, "f").unwrap();
        assert_eq!(
            sql,
            "jsonb_array_length(f.metadata -> 'parents') not between 2 and 5"
        );
    }

    #[test]
    fn double_negated_array_length_range_cancels() {
        let arg = ArgShape::ArrayLength { name: "parents".into() };
        let p = Predicate::new(arg, Op::NotInRange(Literal::Int(2), Literal::Int(5)), true);
        let sql = compile_predicate(&p, "f").unwrap();
        assert_eq!(sql, "jsonb_array_length(f.metadata -> 'parents')  between 2 and 5".replace("  ", " "));
    }

    #[test]
    fn in_set_json_path() {
        let arg = ArgShape::Scalar { name: "site".into() };
        let p = Predicate::new(
            arg,
            Op::InSet(vec![Literal::Str("A".into()), Literal::Str("B".into())]),
            false,
        );
        let sql = compile_predicate(&p, "f").unwrap();
        assert_eq!(sql, "f.metadata @? '$.\"site\" ? (@ == \"A\" || @ == \"B\")'");
    }

    #[test]
    fn not_present_on_json_key_is_negated() {
        let p = Predicate::new(scalar("run"), Op::NotPresent, false);
        assert_eq!(compile_predicate(&p, "f").unwrap(), "not (f.metadata ? 'run')");
    }

    #[test]
    fn present_on_fixed_column_is_constant_true() {
        let p = Predicate::new(scalar("creator"), Op::Present, false);
        assert_eq!(compile_predicate(&p, "f").unwrap(), "true");
    }

    #[test]
    fn rejects_array_subscript_on_fixed_column() {
        let arg = ArgShape::ArraySubscript { name: "size".into(), index: Literal::Int(0) };
        let p = Predicate::new(arg, Op::Cmp(CmpOp::Eq, Literal::Int(1)), false);
        assert!(compile_predicate(&p, "f").is_err());
    }

    #[test]
    fn and_term_joins_with_and() {
        let p1 = Predicate::new(scalar("creator"), Op::Cmp(CmpOp::Eq, Literal::Str("alice".into())), false);
        let p2 = Predicate::new(scalar("run"), Op::Present, false);
        let sql = compile_and_term(&vec![p1, p2], "f").unwrap();
        assert_eq!(sql, "(f.creator = 'alice') and (f.metadata ? 'run')");
    }

    #[test]
    fn dnf_joins_and_terms_with_or() {
        let p1 = Predicate::new(scalar("run"), Op::Cmp(CmpOp::Eq, Literal::Int(1)), false);
        let p2 = Predicate::new(scalar("run"), Op::Cmp(CmpOp::Eq, Literal::Int(2)), false);
        let sql = compile_dnf(&vec![vec![p1], vec![p2]], "f").unwrap().unwrap();
        assert_eq!(sql, "(f.metadata @@ '$.\"run\" == 1') or (f.metadata @@ '$.\"run\" == 2')");
    }
}
