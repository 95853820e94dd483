//! Parsed records.
//!
//! A [`Record`] holds one value per active field plus the line it came
//! from. Its `headers` list names the active fields in iteration order and
//! always matches the set of stored fields: `set` appends new names,
//! `remove` drops them, and `set_headers` only reorders.

use std::borrow::Cow;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{FwfError, Result};
use crate::value::Value;

/// Pseudo-field holding the 1-based physical line number.
pub const LINE_NUMBER: &str = "_line_number";
/// Pseudo-field holding the untouched input line, terminator included.
pub const UNPARSED_LINE: &str = "_unparsed_line";

/// Shared handle to a record. Record sets hold these, never copies.
pub type RecordRef = Arc<Record>;

/// One parsed line.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    line_number: usize,
    unparsed_line: String,
    headers: Vec<String>,
    fields: HashMap<String, Value>,
}

impl Record {
    /// Create an empty record for a line. Fields are added with [`set`].
    ///
    /// [`set`]: Record::set
    pub fn new(line_number: usize, unparsed_line: impl Into<String>) -> Self {
        Self {
            line_number,
            unparsed_line: unparsed_line.into(),
            headers: Vec::new(),
            fields: HashMap::new(),
        }
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn unparsed_line(&self) -> &str {
        &self.unparsed_line
    }

    /// Names of the active fields, in iteration order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// Value of an active field.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Value of an active field or of one of the pseudo-fields
    /// [`LINE_NUMBER`] and [`UNPARSED_LINE`].
    pub fn lookup(&self, name: &str) -> Option<Cow<'_, Value>> {
        if let Some(value) = self.fields.get(name) {
            return Some(Cow::Borrowed(value));
        }
        match name {
            LINE_NUMBER => Some(Cow::Owned(Value::from(self.line_number))),
            UNPARSED_LINE => Some(Cow::Owned(Value::Str(self.unparsed_line.clone()))),
            _ => None,
        }
    }

    /// Set a field, replacing its value if it exists.
    ///
    /// A new field is appended to the end of the headers.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        if !self.fields.contains_key(&name) {
            self.headers.push(name.clone());
        }
        self.fields.insert(name, value.into());
    }

    /// Remove a field and its header, returning the old value.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let value = self.fields.remove(name)?;
        self.headers.retain(|h| h != name);
        Some(value)
    }

    /// Reorder the headers.
    ///
    /// `headers` must name every active field exactly once.
    pub fn set_headers<I, S>(&mut self, headers: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let headers: Vec<String> = headers.into_iter().map(Into::into).collect();
        let mut unmatched: HashSet<&str> = self.fields.keys().map(String::as_str).collect();
        for name in &headers {
            if !unmatched.remove(name.as_str()) {
                return Err(FwfError::Schema(format!(
                    "header '{name}' is unknown or repeated on line {}",
                    self.line_number
                )));
            }
        }
        if let Some(missing) = unmatched.iter().next() {
            return Err(FwfError::Schema(format!(
                "header list omits field '{missing}' on line {}",
                self.line_number
            )));
        }
        self.headers = headers;
        Ok(())
    }

    /// `(name, value)` pairs in header order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.headers
            .iter()
            .filter_map(|h| self.fields.get(h).map(|v| (h.as_str(), v)))
    }

    /// Values in header order.
    pub fn values(&self) -> Vec<&Value> {
        self.iter().map(|(_, v)| v).collect()
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = &'a Value;
    type IntoIter = Box<dyn Iterator<Item = &'a Value> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter().map(|(_, v)| v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Record {
        let mut r = Record::new(4, "US-a  JOHN\n");
        r.set("country", "US");
        r.set("name", "JOHN");
        r
    }

    #[test]
    fn test_set_appends_header() {
        let mut r = sample();
        r.set("age", 42i64);
        assert_eq!(r.headers(), ["country", "name", "age"]);
        assert_eq!(r.get("age"), Some(&Value::Int(42)));
    }

    #[test]
    fn test_set_existing_keeps_position() {
        let mut r = sample();
        r.set("country", Value::Int(1));
        assert_eq!(r.headers(), ["country", "name"]);
        assert_eq!(r.get("country"), Some(&Value::Int(1)));
    }

    #[test]
    fn test_remove_drops_header() {
        let mut r = sample();
        assert_eq!(r.remove("country"), Some(Value::from("US")));
        assert_eq!(r.headers(), ["name"]);
        assert!(!r.contains("country"));
        assert_eq!(r.remove("country"), None);
    }

    #[test]
    fn test_set_headers_reorders() {
        let mut r = sample();
        r.set_headers(["name", "country"]).unwrap();
        let mut values = Vec::new();
        for v in &r {
            values.push(v);
        }
        assert_eq!(values, vec![&Value::from("JOHN"), &Value::from("US")]);
    }

    #[test]
    fn test_set_headers_rejects_non_permutation() {
        let mut r = sample();
        assert!(r.set_headers(["name"]).is_err());
        assert!(r.set_headers(["name", "name"]).is_err());
        assert!(r.set_headers(["name", "country", "age"]).is_err());
        assert_eq!(r.headers(), ["country", "name"]);
    }

    #[test]
    fn test_lookup_pseudo_fields() {
        let r = sample();
        assert_eq!(r.lookup(LINE_NUMBER).as_deref(), Some(&Value::Int(4)));
        assert_eq!(
            r.lookup(UNPARSED_LINE).as_deref(),
            Some(&Value::from("US-a  JOHN\n"))
        );
        assert_eq!(r.lookup("missing"), None);
    }

    #[test]
    fn test_pseudo_fields_not_in_headers() {
        let r = sample();
        assert!(!r.headers().iter().any(|h| h.starts_with('_')));
        assert!(r.get(LINE_NUMBER).is_none());
    }
}
