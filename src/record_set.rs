//! Record sets: ordered, chainable, non-mutating queries over records.
//!
//! Every query returns a new [`RecordSet`]. Records are shared by
//! reference ([`RecordRef`]), never copied, so `rs.slice(2..5)[0]` is the
//! same record as `rs[2]`.
//!
//! A set also remembers which field names its records may carry: the
//! field map's names plus any added by hooks. Derived sets inherit that
//! list, so whether a lookup names an unknown field does not depend on
//! which records survived earlier queries.
//!
//! ```
//! use fwf_records::{FieldMap, FileParser};
//!
//! let map = FieldMap::new().field("name", 0..6).field("sex", 6..7);
//! let people = FileParser::new(map)
//!     .parse_str("ANNA  F\nBOB   M\nCARL  M\nDORA  F\n")
//!     .unwrap();
//!
//! let men = people.filter([("sex", "M")]).unwrap();
//! assert_eq!(men.count(), 2);
//!
//! let not_an = people.exclude([("name__startswith", "AN")]).unwrap();
//! assert_eq!(not_an.count(), 3);
//!
//! let sexes = people.unique("sex").unwrap();
//! assert_eq!(sexes.len(), 2);
//! ```

use std::cmp::Ordering;
use std::collections::HashSet;
use std::ops::{Bound, Index, RangeBounds};
use std::sync::Arc;

use log::debug;

use crate::error::{FwfError, Result};
use crate::lookup::{Comparand, Lookup};
use crate::record::{LINE_NUMBER, RecordRef, UNPARSED_LINE};
use crate::value::Value;

/// Ordered collection of shared records.
#[derive(Debug, Clone, Default)]
pub struct RecordSet {
    records: Vec<RecordRef>,
    fields: Arc<HashSet<String>>,
}

/// Projected values, with the field names they came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Values {
    headers: Vec<String>,
    rows: Rows,
}

/// Rows of a projection.
#[derive(Debug, Clone, PartialEq)]
pub enum Rows {
    /// One field was requested: one value per record.
    Scalars(Vec<Value>),
    /// Zero or several fields were requested: one tuple per record.
    Tuples(Vec<Vec<Value>>),
}

impl Values {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &Rows {
        &self.rows
    }

    pub fn into_rows(self) -> Rows {
        self.rows
    }

    pub fn len(&self) -> usize {
        match &self.rows {
            Rows::Scalars(v) => v.len(),
            Rows::Tuples(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_scalars(&self) -> Option<&[Value]> {
        match &self.rows {
            Rows::Scalars(v) => Some(v),
            Rows::Tuples(_) => None,
        }
    }

    pub fn as_tuples(&self) -> Option<&[Vec<Value>]> {
        match &self.rows {
            Rows::Tuples(v) => Some(v),
            Rows::Scalars(_) => None,
        }
    }
}

fn is_pseudo_field(name: &str) -> bool {
    name == LINE_NUMBER || name == UNPARSED_LINE
}

impl RecordSet {
    /// A set whose known fields are those its records carry.
    pub fn new(records: Vec<RecordRef>) -> Self {
        Self::with_fields(records, std::iter::empty::<String>())
    }

    /// A set that also knows `fields`, even if no record carries them.
    pub fn with_fields<I, S>(records: Vec<RecordRef>, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut known: HashSet<String> = fields.into_iter().map(Into::into).collect();
        known.extend(records.iter().flat_map(|r| r.headers().iter().cloned()));
        Self {
            records,
            fields: Arc::new(known),
        }
    }

    /// A set over `records` with the same known fields as `self`.
    fn derive(&self, records: Vec<RecordRef>) -> RecordSet {
        RecordSet {
            records,
            fields: Arc::clone(&self.fields),
        }
    }

    /// True when records of this set may carry `field`.
    pub fn has_field(&self, field: &str) -> bool {
        is_pseudo_field(field) || self.fields.contains(field)
    }

    /// A new set over the same records.
    pub fn all(&self) -> RecordSet {
        self.clone()
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&RecordRef> {
        self.records.get(index)
    }

    pub fn first(&self) -> Option<&RecordRef> {
        self.records.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RecordRef> {
        self.records.iter()
    }

    /// A new set over a sub-range. Bounds past the end are clamped.
    pub fn slice<R: RangeBounds<usize>>(&self, range: R) -> RecordSet {
        let len = self.records.len();
        let start = match range.start_bound() {
            Bound::Included(&s) => s,
            Bound::Excluded(&s) => s.saturating_add(1),
            Bound::Unbounded => 0,
        }
        .min(len);
        let end = match range.end_bound() {
            Bound::Included(&e) => e.saturating_add(1),
            Bound::Excluded(&e) => e,
            Bound::Unbounded => len,
        }
        .clamp(start, len);
        self.derive(self.records[start..end].to_vec())
    }

    /// Fail when the set was never given `field`.
    fn check_known(&self, field: &str) -> Result<()> {
        if self.has_field(field) {
            Ok(())
        } else {
            Err(FwfError::UnknownField(field.to_string()))
        }
    }

    fn compile<I, K, C>(&self, lookups: I) -> Result<Vec<Lookup>>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Comparand>,
    {
        let lookups = lookups
            .into_iter()
            .map(|(keyword, comparand)| Lookup::parse(keyword.as_ref(), comparand))
            .collect::<Result<Vec<_>>>()?;
        for lookup in &lookups {
            self.check_known(lookup.field())?;
        }
        Ok(lookups)
    }

    /// Split records by whether they satisfy every lookup.
    ///
    /// All lookups are evaluated on every record so that misuse surfaces
    /// regardless of evaluation order.
    fn partition(&self, lookups: &[Lookup]) -> Result<(Vec<RecordRef>, Vec<RecordRef>)> {
        let mut matched = Vec::new();
        let mut rest = Vec::new();
        for record in &self.records {
            let mut all = true;
            for lookup in lookups {
                all &= lookup.matches(record)?;
            }
            if all {
                matched.push(record.clone());
            } else {
                rest.push(record.clone());
            }
        }
        Ok((matched, rest))
    }

    /// Records satisfying every lookup.
    ///
    /// Each lookup is a `field` or `field__operator` keyword with its
    /// comparand. Operators: `in`, `lt`, `lte`, `gt`, `gte`, `ne`, `len`,
    /// `startswith`, `endswith`; no suffix means equality.
    pub fn filter<I, K, C>(&self, lookups: I) -> Result<RecordSet>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Comparand>,
    {
        let lookups = self.compile(lookups)?;
        let (matched, _) = self.partition(&lookups)?;
        debug!(
            "filter with {} lookups kept {} of {} records",
            lookups.len(),
            matched.len(),
            self.records.len()
        );
        Ok(self.derive(matched))
    }

    /// Records that do not satisfy all lookups together.
    ///
    /// This negates the whole conjunction: a record is excluded only when
    /// every lookup matches it, so `filter(kw)` and `exclude(kw)` always
    /// partition the set.
    pub fn exclude<I, K, C>(&self, lookups: I) -> Result<RecordSet>
    where
        I: IntoIterator<Item = (K, C)>,
        K: AsRef<str>,
        C: Into<Comparand>,
    {
        let lookups = self.compile(lookups)?;
        let (matched, rest) = self.partition(&lookups)?;
        debug!(
            "exclude with {} lookups dropped {} of {} records",
            lookups.len(),
            matched.len(),
            self.records.len()
        );
        Ok(self.derive(rest))
    }

    /// Records sorted by one field; ties keep their input order.
    pub fn order_by(&self, field: &str, reverse: bool) -> Result<RecordSet> {
        self.check_known(field)?;
        let keys = self
            .records
            .iter()
            .map(|r| {
                r.lookup(field).ok_or_else(|| FwfError::MissingField {
                    field: field.to_string(),
                    line_number: r.line_number(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        if let Some(first) = keys.first() {
            for key in &keys[1..] {
                if first.compare(key).is_none() {
                    return Err(FwfError::Unorderable {
                        field: field.to_string(),
                        left: first.kind(),
                        right: key.kind(),
                    });
                }
            }
        }

        let mut order: Vec<usize> = (0..keys.len()).collect();
        order.sort_by(|&a, &b| {
            let ord = keys[a].compare(&keys[b]).unwrap_or(Ordering::Equal);
            if reverse { ord.reverse() } else { ord }
        });
        debug!("order_by '{field}' (reverse={reverse}) over {} records", order.len());
        Ok(self.derive(
            order.into_iter().map(|i| self.records[i].clone()).collect(),
        ))
    }

    fn project(&self, field: &str) -> Result<Vec<Value>> {
        self.records
            .iter()
            .map(|r| {
                r.lookup(field)
                    .map(|v| v.into_owned())
                    .ok_or_else(|| FwfError::MissingField {
                        field: field.to_string(),
                        line_number: r.line_number(),
                    })
            })
            .collect()
    }

    /// Distinct values of one field, in first-seen order.
    pub fn unique(&self, field: &str) -> Result<Vec<Value>> {
        self.check_known(field)?;
        let mut seen = HashSet::new();
        let mut distinct = Vec::new();
        for value in self.project(field)? {
            if seen.insert(value.clone()) {
                distinct.push(value);
            }
        }
        Ok(distinct)
    }

    /// Distinct tuples over several fields, in first-seen order.
    pub fn unique_rows(&self, fields: &[&str]) -> Result<Vec<Vec<Value>>> {
        let rows = match self.values(fields)?.into_rows() {
            Rows::Tuples(rows) => rows,
            Rows::Scalars(values) => values.into_iter().map(|v| vec![v]).collect(),
        };
        let mut seen = HashSet::new();
        Ok(rows
            .into_iter()
            .filter(|row| seen.insert(row.clone()))
            .collect())
    }

    /// Project fields.
    ///
    /// Exactly one name yields [`Rows::Scalars`]. Several names yield
    /// tuples in the requested order; no names yield every field in header
    /// order, which then must be the same for all records. The
    /// pseudo-fields `_line_number` and `_unparsed_line` may be requested.
    pub fn values(&self, fields: &[&str]) -> Result<Values> {
        for field in fields {
            self.check_known(field)?;
        }
        match fields {
            [field] => Ok(Values {
                headers: vec![field.to_string()],
                rows: Rows::Scalars(self.project(field)?),
            }),
            [] => {
                let headers = self
                    .records
                    .first()
                    .map(|r| r.headers().to_vec())
                    .unwrap_or_default();
                if let Some(odd) = self.records.iter().find(|r| r.headers() != headers.as_slice()) {
                    return Err(FwfError::HeaderMismatch {
                        line_number: odd.line_number(),
                    });
                }
                let rows = self
                    .records
                    .iter()
                    .map(|r| r.values().into_iter().cloned().collect())
                    .collect();
                Ok(Values {
                    headers,
                    rows: Rows::Tuples(rows),
                })
            }
            _ => {
                let rows = self
                    .records
                    .iter()
                    .map(|r| {
                        fields
                            .iter()
                            .map(|field| {
                                r.lookup(field).map(|v| v.into_owned()).ok_or_else(|| {
                                    FwfError::MissingField {
                                        field: field.to_string(),
                                        line_number: r.line_number(),
                                    }
                                })
                            })
                            .collect::<Result<Vec<_>>>()
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(Values {
                    headers: fields.iter().map(|f| f.to_string()).collect(),
                    rows: Rows::Tuples(rows),
                })
            }
        }
    }
}

impl Index<usize> for RecordSet {
    type Output = RecordRef;

    fn index(&self, index: usize) -> &Self::Output {
        &self.records[index]
    }
}

impl FromIterator<RecordRef> for RecordSet {
    fn from_iter<I: IntoIterator<Item = RecordRef>>(iter: I) -> Self {
        RecordSet::new(iter.into_iter().collect())
    }
}

impl IntoIterator for RecordSet {
    type Item = RecordRef;
    type IntoIter = std::vec::IntoIter<RecordRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}

impl<'a> IntoIterator for &'a RecordSet {
    type Item = &'a RecordRef;
    type IntoIter = std::slice::Iter<'a, RecordRef>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
