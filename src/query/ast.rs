//! The DNF expression tree consumed by the compiler (§4.D "Input").
//!
//! This is the interface boundary with the external metadata-grammar
//! parser (§1 Non-goals / out of scope): that parser is responsible for
//! turning query text into this tree. Rust's type system replaces the
//! source's runtime `T`/`C` tagged-node walk with a closed set of enums, so
//! `UnknownArgumentShape`/`UnknownOperator` (§4.D "Failure modes") can only
//! arise from a handful of explicitly-checked mismatches (e.g. a fixed
//! column addressed with array syntax) rather than from a malformed tree.

use serde_json::Value;

/// A literal value appearing in a predicate. Booleans, strings, integers,
/// floats, and null are the only shapes the compiler needs to encode
/// (§4.D rule 6).
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Null,
}

impl Literal {
    pub fn from_json(value: &Value) -> Literal {
        match value {
            Value::Bool(b) => Literal::Bool(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Literal::Int(i)
                } else {
                    Literal::Float(n.as_f64().unwrap_or_default())
                }
            }
            Value::String(s) => Literal::Str(s.clone()),
            Value::Null => Literal::Null,
            other => Literal::Str(other.to_string()),
        }
    }
}

/// One of the four argument shapes an atomic predicate's attribute
/// reference may take (§4.D "Input").
#[derive(Debug, Clone, PartialEq)]
pub enum ArgShape {
    /// Bare name: a fixed column or a top-level JSON key.
    Scalar { name: String },
    /// `name[i]`, `i` an integer or string index.
    ArraySubscript { name: String, index: Literal },
    /// `name[*]`: existential quantification over an array.
    ArrayAny { name: String },
    /// `length(name)`.
    ArrayLength { name: String },
}

impl ArgShape {
    pub fn name(&self) -> &str {
        match self {
            ArgShape::Scalar { name }
            | ArgShape::ArraySubscript { name, .. }
            | ArgShape::ArrayAny { name }
            | ArgShape::ArrayLength { name } => name,
        }
    }
}

/// Scalar comparison operators (§4.D rule 2). `Eq` covers both `=` and
/// `==` from the source grammar; the regex variants correspond to
/// `~`/`~*`/`!~`/`!~*`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Match,
    IMatch,
    NotMatch,
    NotIMatch,
}

impl CmpOp {
    pub fn is_regex(self) -> bool {
        matches!(self, CmpOp::Match | CmpOp::IMatch | CmpOp::NotMatch | CmpOp::NotIMatch)
    }
}

/// The op-specific payload of an atomic predicate (§4.D).
#[derive(Debug, Clone, PartialEq)]
pub enum Op {
    Present,
    NotPresent,
    Cmp(CmpOp, Literal),
    InRange(Literal, Literal),
    NotInRange(Literal, Literal),
    InSet(Vec<Literal>),
    NotInSet(Vec<Literal>),
}

/// One atomic predicate: an attribute reference, an operator, and a
/// negation flag (§4.D).
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub arg: ArgShape,
    pub op: Op,
    pub neg: bool,
}

impl Predicate {
    pub fn new(arg: ArgShape, op: Op, neg: bool) -> Self {
        Predicate { arg, op, neg }
    }
}

/// An AND of atomic predicates.
pub type AndTerm = Vec<Predicate>;

/// An OR of AND-terms: the DNF predicate itself. An empty `Dnf` compiles
/// to no `WHERE` clause at all (§4.D rule 7, §8 boundary behavior).
pub type Dnf = Vec<AndTerm>;
