//! Lookup resolution: `field__operator` keywords to predicates.
//!
//! A lookup keyword is a field name optionally followed by `__` and an
//! operator token. The resolver picks the longest registered token that
//! ends the keyword; without a match the whole keyword is the field name
//! and the operator is `exact`. A field literally named `gt` therefore
//! filters by equality, while `age__gt` compares.
//!
//! Predicates use the value's own semantics, so a field retyped into a
//! date by a post-parse hook supports `lt`/`gt` without any change here.
//! Applying an operator to a value it cannot handle is an error rather
//! than a silent mismatch.

use std::cmp::Ordering;

use chrono::NaiveDate;
use thiserror::Error;

use crate::error::{FwfError, Result};
use crate::record::Record;
use crate::value::Value;

/// Error evaluating an operator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("'{operator}' cannot be applied to {value} with {comparand}")]
    TypeMismatch {
        operator: &'static str,
        value: &'static str,
        comparand: &'static str,
    },

    #[error("'{0}' expects a list of values")]
    ExpectedList(&'static str),

    #[error("'{0}' expects a single value, not a list")]
    ExpectedScalar(&'static str),
}

/// Right-hand side of a lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum Comparand {
    Value(Value),
    List(Vec<Value>),
}

impl Comparand {
    fn kind(&self) -> &'static str {
        match self {
            Comparand::Value(v) => v.kind(),
            Comparand::List(_) => "list",
        }
    }
}

impl From<Value> for Comparand {
    fn from(v: Value) -> Self {
        Comparand::Value(v)
    }
}

impl From<&str> for Comparand {
    fn from(s: &str) -> Self {
        Comparand::Value(Value::from(s))
    }
}

impl From<String> for Comparand {
    fn from(s: String) -> Self {
        Comparand::Value(Value::from(s))
    }
}

impl From<i64> for Comparand {
    fn from(i: i64) -> Self {
        Comparand::Value(Value::Int(i))
    }
}

impl From<i32> for Comparand {
    fn from(i: i32) -> Self {
        Comparand::Value(Value::from(i))
    }
}

impl From<f64> for Comparand {
    fn from(x: f64) -> Self {
        Comparand::Value(Value::Float(x))
    }
}

impl From<bool> for Comparand {
    fn from(b: bool) -> Self {
        Comparand::Value(Value::Bool(b))
    }
}

impl From<NaiveDate> for Comparand {
    fn from(d: NaiveDate) -> Self {
        Comparand::Value(Value::Date(d))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Comparand {
    fn from(items: Vec<T>) -> Self {
        Comparand::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>, const N: usize> From<[T; N]> for Comparand {
    fn from(items: [T; N]) -> Self {
        Comparand::List(items.into_iter().map(Into::into).collect())
    }
}

/// Expected shape of an operator's comparand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Scalar,
    List,
}

type Outcome<T> = std::result::Result<T, LookupError>;

type Predicate = fn(&'static str, &Value, &Comparand) -> Outcome<bool>;

/// A registered lookup operator.
#[derive(Debug)]
pub struct Operator {
    pub token: &'static str,
    pub arity: Arity,
    predicate: Predicate,
}

impl Operator {
    /// Evaluate the operator for one value.
    pub fn apply(&self, value: &Value, comparand: &Comparand) -> Outcome<bool> {
        (self.predicate)(self.token, value, comparand)
    }

    fn check_arity(&self, comparand: &Comparand) -> Outcome<()> {
        match (self.arity, comparand) {
            (Arity::Scalar, Comparand::List(_)) => Err(LookupError::ExpectedScalar(self.token)),
            (Arity::List, Comparand::Value(_)) => Err(LookupError::ExpectedList(self.token)),
            _ => Ok(()),
        }
    }
}

/// Default operator when a keyword carries no known suffix.
pub static EXACT: Operator = Operator {
    token: "exact",
    arity: Arity::Scalar,
    predicate: exact,
};

/// Suffix operators. Adding an operator is one entry here.
pub static OPERATORS: &[Operator] = &[
    Operator {
        token: "in",
        arity: Arity::List,
        predicate: contained_in,
    },
    Operator {
        token: "lt",
        arity: Arity::Scalar,
        predicate: lt,
    },
    Operator {
        token: "lte",
        arity: Arity::Scalar,
        predicate: lte,
    },
    Operator {
        token: "gt",
        arity: Arity::Scalar,
        predicate: gt,
    },
    Operator {
        token: "gte",
        arity: Arity::Scalar,
        predicate: gte,
    },
    Operator {
        token: "ne",
        arity: Arity::Scalar,
        predicate: ne,
    },
    Operator {
        token: "len",
        arity: Arity::Scalar,
        predicate: len,
    },
    Operator {
        token: "startswith",
        arity: Arity::Scalar,
        predicate: starts_with,
    },
    Operator {
        token: "endswith",
        arity: Arity::Scalar,
        predicate: ends_with,
    },
];

fn scalar(comparand: &Comparand) -> Option<&Value> {
    match comparand {
        Comparand::Value(v) => Some(v),
        Comparand::List(_) => None,
    }
}

fn mismatch(operator: &'static str, value: &Value, comparand: &Comparand) -> LookupError {
    LookupError::TypeMismatch {
        operator,
        value: value.kind(),
        comparand: comparand.kind(),
    }
}

fn exact(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    let c = scalar(c).ok_or(LookupError::ExpectedScalar(op))?;
    Ok(value == c)
}

fn ne(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    exact(op, value, c).map(|eq| !eq)
}

fn contained_in(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    match c {
        Comparand::List(items) => Ok(items.contains(value)),
        Comparand::Value(_) => Err(LookupError::ExpectedList(op)),
    }
}

fn ordering(op: &'static str, value: &Value, c: &Comparand) -> Outcome<Ordering> {
    scalar(c)
        .and_then(|other| value.compare(other))
        .ok_or_else(|| mismatch(op, value, c))
}

fn lt(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    ordering(op, value, c).map(Ordering::is_lt)
}

fn lte(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    ordering(op, value, c).map(Ordering::is_le)
}

fn gt(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    ordering(op, value, c).map(Ordering::is_gt)
}

fn gte(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    ordering(op, value, c).map(Ordering::is_ge)
}

fn len(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    match (value.char_len(), scalar(c).and_then(Value::as_int)) {
        (Some(n), Some(expected)) => Ok(n as i64 == expected),
        _ => Err(mismatch(op, value, c)),
    }
}

fn strings<'a>(
    op: &'static str,
    value: &'a Value,
    c: &'a Comparand,
) -> Outcome<(&'a str, &'a str)> {
    match (value.as_str(), scalar(c).and_then(Value::as_str)) {
        (Some(s), Some(affix)) => Ok((s, affix)),
        _ => Err(mismatch(op, value, c)),
    }
}

fn starts_with(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    strings(op, value, c).map(|(s, prefix)| s.starts_with(prefix))
}

fn ends_with(op: &'static str, value: &Value, c: &Comparand) -> Outcome<bool> {
    strings(op, value, c).map(|(s, suffix)| s.ends_with(suffix))
}

/// Split a keyword into field name and operator.
///
/// The longest registered `__token` suffix wins; the remaining field name
/// must be non-empty.
pub fn resolve(keyword: &str) -> (&str, &'static Operator) {
    let mut best: Option<(&str, &'static Operator)> = None;
    for op in OPERATORS {
        if let Some(field) = keyword
            .strip_suffix(op.token)
            .and_then(|rest| rest.strip_suffix("__"))
            && !field.is_empty()
            && best.is_none_or(|(_, b)| op.token.len() > b.token.len())
        {
            best = Some((field, op));
        }
    }
    best.unwrap_or((keyword, &EXACT))
}

/// A compiled lookup: field, operator and comparand.
#[derive(Debug, Clone)]
pub struct Lookup {
    keyword: String,
    field: String,
    operator: &'static Operator,
    comparand: Comparand,
}

impl Lookup {
    /// Resolve `keyword` and check the comparand's shape.
    pub fn parse(keyword: impl Into<String>, comparand: impl Into<Comparand>) -> Result<Self> {
        let keyword = keyword.into();
        let comparand = comparand.into();
        let (field, operator) = resolve(&keyword);
        let field = field.to_string();
        operator
            .check_arity(&comparand)
            .map_err(|source| FwfError::Lookup {
                keyword: keyword.clone(),
                source,
            })?;
        Ok(Self {
            keyword,
            field,
            operator,
            comparand,
        })
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn operator(&self) -> &'static Operator {
        self.operator
    }

    pub fn comparand(&self) -> &Comparand {
        &self.comparand
    }

    /// Evaluate against a record. A record without the field does not match.
    pub fn matches(&self, record: &Record) -> Result<bool> {
        let Some(value) = record.lookup(&self.field) else {
            return Ok(false);
        };
        self.operator
            .apply(&value, &self.comparand)
            .map_err(|source| FwfError::Lookup {
                keyword: self.keyword.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_resolve_plain_field_is_exact() {
        let (field, op) = resolve("name");
        assert_eq!(field, "name");
        assert_eq!(op.token, "exact");
    }

    #[test]
    fn test_resolve_suffix() {
        let (field, op) = resolve("birthday__gte");
        assert_eq!(field, "birthday");
        assert_eq!(op.token, "gte");
        let (field, op) = resolve("name__startswith");
        assert_eq!(field, "name");
        assert_eq!(op.token, "startswith");
    }

    #[test]
    fn test_resolve_field_named_like_operator() {
        let (field, op) = resolve("gt");
        assert_eq!(field, "gt");
        assert_eq!(op.token, "exact");
        let (field, op) = resolve("__gt");
        assert_eq!(field, "__gt");
        assert_eq!(op.token, "exact");
        let (field, op) = resolve("gt__lt");
        assert_eq!(field, "gt");
        assert_eq!(op.token, "lt");
    }

    #[test]
    fn test_resolve_unknown_suffix_is_field_name() {
        let (field, op) = resolve("birthday__month");
        assert_eq!(field, "birthday__month");
        assert_eq!(op.token, "exact");
    }

    #[test]
    fn test_resolve_prefers_longest_token() {
        let (field, op) = resolve("name__len");
        assert_eq!(field, "name");
        assert_eq!(op.token, "len");
        let (field, op) = resolve("x__lte");
        assert_eq!(field, "x");
        assert_eq!(op.token, "lte");
    }

    #[test]
    fn test_ordering_operators_on_dates() {
        let v = Value::Date(date(1957, 3, 1));
        let c = Comparand::from(date(1951, 1, 1));
        assert!(resolve("b__gt").1.apply(&v, &c).unwrap());
        assert!(!resolve("b__lt").1.apply(&v, &c).unwrap());
        assert!(resolve("b__gte").1.apply(&v, &Comparand::from(date(1957, 3, 1))).unwrap());
        assert!(resolve("b__lte").1.apply(&v, &Comparand::from(date(1957, 3, 1))).unwrap());
    }

    #[test]
    fn test_ordering_across_kinds_is_error() {
        let err = resolve("b__gt")
            .1
            .apply(&Value::from("1957"), &Comparand::from(1957))
            .unwrap_err();
        assert_eq!(
            err,
            LookupError::TypeMismatch {
                operator: "gt",
                value: "str",
                comparand: "int",
            }
        );
    }

    #[test]
    fn test_in_and_shape_errors() {
        let op = resolve("s__in").1;
        assert!(op.apply(&Value::from("TX"), &Comparand::from(["TX", "NY"])).unwrap());
        assert!(!op.apply(&Value::from("CA"), &Comparand::from(vec!["TX", "NY"])).unwrap());
        assert_eq!(
            op.apply(&Value::from("TX"), &Comparand::from("TX")),
            Err(LookupError::ExpectedList("in"))
        );
    }

    #[test]
    fn test_len_counts_untrimmed_chars() {
        let op = resolve("s__len").1;
        assert!(op.apply(&Value::from("AB  "), &Comparand::from(4)).unwrap());
        assert!(op.apply(&Value::Int(7), &Comparand::from(1)).is_err());
        assert!(op.apply(&Value::from("AB"), &Comparand::from("2")).is_err());
    }

    #[test]
    fn test_string_operators_require_strings() {
        let op = resolve("s__startswith").1;
        assert!(op.apply(&Value::from("JOHN"), &Comparand::from("JO")).unwrap());
        assert!(op.apply(&Value::Int(12), &Comparand::from("1")).is_err());
        let op = resolve("s__endswith").1;
        assert!(op.apply(&Value::from("JOHN"), &Comparand::from("HN")).unwrap());
        assert!(op.apply(&Value::from("JOHN"), &Comparand::from(1)).is_err());
    }

    #[test]
    fn test_exact_and_ne_do_not_coerce() {
        let v = Value::from("1");
        assert!(!EXACT.apply(&v, &Comparand::from(1)).unwrap());
        assert!(resolve("s__ne").1.apply(&v, &Comparand::from(1)).unwrap());
    }

    #[test]
    fn test_int_and_float_agree_across_operators() {
        let mut r = Record::new(1, "1");
        r.set("n", 1i64);
        assert!(!Lookup::parse("n", 1.0).unwrap().matches(&r).unwrap());
        assert!(Lookup::parse("n__ne", 1.0).unwrap().matches(&r).unwrap());
        assert!(!Lookup::parse("n__in", [1.0]).unwrap().matches(&r).unwrap());
        for keyword in ["n__lte", "n__gte", "n__lt", "n__gt"] {
            let err = Lookup::parse(keyword, 1.0).unwrap().matches(&r).unwrap_err();
            assert!(matches!(
                err,
                FwfError::Lookup {
                    source: LookupError::TypeMismatch {
                        value: "int",
                        comparand: "float",
                        ..
                    },
                    ..
                }
            ));
        }
        assert!(Lookup::parse("n__lte", 1).unwrap().matches(&r).unwrap());
    }

    #[test]
    fn test_lookup_parse_checks_arity() {
        assert!(Lookup::parse("state__in", "TX").is_err());
        assert!(Lookup::parse("state", ["TX"]).is_err());
        let lookup = Lookup::parse("state__in", ["TX"]).unwrap();
        assert_eq!(lookup.field(), "state");
        assert_eq!(lookup.operator().token, "in");
        assert_eq!(lookup.keyword(), "state__in");
    }

    #[test]
    fn test_lookup_missing_field_does_not_match() {
        let mut r = Record::new(1, "x");
        r.set("a", "x");
        let lookup = Lookup::parse("b__startswith", "x").unwrap();
        assert!(!lookup.matches(&r).unwrap());
    }

    #[test]
    fn test_lookup_pseudo_field() {
        let r = Record::new(3, "x");
        assert!(Lookup::parse("_line_number__gt", 2).unwrap().matches(&r).unwrap());
    }
}
