//! Tagged field values.
//!
//! Every field starts life as the raw slice of its line (`Value::Str`).
//! Post-parse hooks may retype it, e.g. into a `Date`, and the query layer
//! then compares it with that type's own ordering.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::NaiveDate;

/// A single field value.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Date(NaiveDate),
}

impl Value {
    /// Short name of the value's kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Str(_) => "str",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Date(_) => "date",
        }
    }

    /// Natural ordering between two values.
    ///
    /// Returns `None` when the kinds differ. Integers and floats are
    /// distinct kinds here, matching equality, which never coerces.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
            (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
            (Value::Date(a), Value::Date(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Length in characters, for string values only.
    pub fn char_len(&self) -> Option<usize> {
        match self {
            Value::Str(s) => Some(s.chars().count()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Value::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Parse a string value as a date with the given `chrono` format.
    ///
    /// Returns `None` for non-string values and for strings that do not
    /// match the format. Surrounding padding is ignored.
    pub fn parse_date(&self, fmt: &str) -> Option<Value> {
        let s = self.as_str()?;
        NaiveDate::parse_from_str(s.trim(), fmt).ok().map(Value::Date)
    }

    /// Parse a string value as an integer, ignoring surrounding padding.
    pub fn parse_int(&self) -> Option<Value> {
        let s = self.as_str()?;
        s.trim().parse().ok().map(Value::Int)
    }
}

// Floats compare by `total_cmp` so that equality is reflexive and agrees
// with `Hash`; `unique` relies on both.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.total_cmp(b) == Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Date(a), Value::Date(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Str(s) => s.hash(state),
            Value::Int(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Bool(b) => b.hash(state),
            Value::Date(d) => d.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_compare_same_kind() {
        assert_eq!(
            Value::from("abc").compare(&Value::from("abd")),
            Some(Ordering::Less)
        );
        assert_eq!(
            date(1957, 1, 2).compare(&date(1951, 5, 5)),
            Some(Ordering::Greater)
        );
    }

    #[test]
    fn test_compare_int_float_is_none() {
        assert_eq!(
            Value::Float(2.5).compare(&Value::Float(1.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(1).compare(&Value::Float(1.0)), None);
        assert_eq!(Value::Float(1.0).compare(&Value::Int(1)), None);
        // Past 2^53 an i64 -> f64 cast would collapse these.
        let big = 1i64 << 53;
        assert_eq!(
            Value::Int(big + 1).compare(&Value::Int(big)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::Int(big + 1).compare(&Value::Float(big as f64)), None);
    }

    #[test]
    fn test_compare_across_kinds_is_none() {
        assert_eq!(Value::from("1").compare(&Value::Int(1)), None);
        assert_eq!(date(2000, 1, 1).compare(&Value::from("2000")), None);
    }

    #[test]
    fn test_no_coercion_in_equality() {
        assert_ne!(Value::from("1"), Value::Int(1));
        assert_ne!(Value::Int(1), Value::Float(1.0));
    }

    #[test]
    fn test_float_equality_is_reflexive() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        let mut set = HashSet::new();
        set.insert(nan.clone());
        assert!(set.contains(&nan));
    }

    #[test]
    fn test_char_len_counts_characters() {
        assert_eq!(Value::from("héllo ").char_len(), Some(6));
        assert_eq!(Value::Int(12345).char_len(), None);
    }

    #[test]
    fn test_parse_date_trims_padding() {
        let v = Value::from("19570214  ");
        assert_eq!(v.parse_date("%Y%m%d"), Some(date(1957, 2, 14)));
        assert_eq!(Value::from("garbage").parse_date("%Y%m%d"), None);
        assert_eq!(Value::Int(3).parse_date("%Y%m%d"), None);
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(Value::from(" 0042").parse_int(), Some(Value::Int(42)));
        assert_eq!(Value::from("x").parse_int(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(date(1994, 7, 4).to_string(), "1994-07-04");
        assert_eq!(Value::from("SMITH   ").to_string(), "SMITH   ");
        assert_eq!(Value::Int(-3).to_string(), "-3");
    }
}
