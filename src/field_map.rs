//! Field maps: the ordered `name -> [start, end)` layout of a line.

use std::collections::HashSet;
use std::ops::Range;

use crate::error::{FwfError, Result};

/// Ordered declaration of the byte range each field occupies in a line.
///
/// Declaration order is the default header order of parsed records.
/// Ranges may overlap or leave gaps.
///
/// ```
/// use fwf_records::FieldMap;
///
/// let map = FieldMap::new()
///     .field("location", 0..9)
///     .field("state", 9..11)
///     .field("name", 32..56);
///
/// assert_eq!(map.names().collect::<Vec<_>>(), ["location", "state", "name"]);
/// assert_eq!(map.get("state"), Some(9..11));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldMap {
    fields: Vec<(String, Range<usize>)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field, builder style.
    pub fn field(mut self, name: impl Into<String>, range: Range<usize>) -> Self {
        self.push(name, range);
        self
    }

    /// Append a field.
    pub fn push(&mut self, name: impl Into<String>, range: Range<usize>) {
        self.fields.push((name.into(), range));
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    /// `(name, range)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Range<usize>)> {
        self.fields
            .iter()
            .map(|(name, range)| (name.as_str(), range.clone()))
    }

    /// The range declared for `name`.
    pub fn get(&self, name: &str) -> Option<Range<usize>> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, range)| range.clone())
    }

    /// Check the map is usable for parsing.
    ///
    /// Names must be non-empty, unique, and must not start with `_`, which
    /// is reserved for the `_line_number` and `_unparsed_line`
    /// pseudo-fields. Ranges must not end before they start.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (name, range) in &self.fields {
            if name.is_empty() {
                return Err(FwfError::Schema("field name is empty".to_string()));
            }
            if name.starts_with('_') {
                return Err(FwfError::Schema(format!(
                    "field name '{name}' starts with '_', which is reserved"
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(FwfError::Schema(format!("duplicate field '{name}'")));
            }
            if range.start > range.end {
                return Err(FwfError::Schema(format!(
                    "field '{name}' range {}..{} ends before it starts",
                    range.start, range.end
                )));
            }
        }
        Ok(())
    }
}

impl<S: Into<String>> FromIterator<(S, Range<usize>)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (S, Range<usize>)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (name, range) in iter {
            map.push(name, range);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declaration_order_is_kept() {
        let map: FieldMap = [("name", 32..56), ("sex", 19..20), ("birthday", 11..19)]
            .into_iter()
            .collect();
        assert_eq!(map.len(), 3);
        assert_eq!(
            map.names().collect::<Vec<_>>(),
            vec!["name", "sex", "birthday"]
        );
    }

    #[test]
    fn test_overlapping_ranges_are_valid() {
        let map = FieldMap::new().field("date", 0..8).field("year", 0..4);
        assert!(map.validate().is_ok());
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let map = FieldMap::new().field("a", 0..1).field("a", 1..2);
        let err = map.validate().unwrap_err();
        assert!(matches!(err, FwfError::Schema(_)));
        assert!(err.to_string().contains("duplicate field 'a'"));
    }

    #[test]
    fn test_reserved_name_is_rejected() {
        let map = FieldMap::new().field("_line_number", 0..3);
        assert!(map.validate().is_err());
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let map = FieldMap::new().field("", 0..3);
        assert!(map.validate().is_err());
    }

    #[test]
    fn test_backwards_range_is_rejected() {
        #[allow(clippy::reversed_empty_ranges)]
        let map = FieldMap::new().field("a", 5..2);
        assert!(map.validate().is_err());
    }

    #[test]
    fn test_get_missing_field() {
        let map = FieldMap::new().field("a", 0..1);
        assert_eq!(map.get("b"), None);
    }
}
