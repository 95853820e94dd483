//! # fwf-records
//!
//! Fixed-width text records with a chainable query layer.
//!
//! Each line of a fixed-width file is sliced into named fields according
//! to a [`FieldMap`], optionally massaged by parse hooks, and collected
//! into a [`RecordSet`] that supports `filter`, `exclude`, `order_by`,
//! `unique` and `values` by field name and `__operator` suffix.
//!
//! ## Overview
//!
//! - **Field map**: ordered `name -> [start, end)` byte ranges
//! - **Record parser**: slices one line, running a before-parse and an
//!   after-parse hook that may rewrite, retype, or skip it
//! - **File parser**: reads a whole source eagerly, numbering every line
//! - **Lookups**: `name`, `name__startswith`, `birthday__gte`, `state__in`, ...
//! - **Record sets**: non-mutating queries sharing the same records
//!
//! ## Example
//!
//! ```
//! use fwf_records::{FieldMap, FileParser, HookError, Hooks, Value};
//!
//! // Layout: Country(2) Name(8) Birthday(8)
//! let map = FieldMap::new()
//!     .field("country", 0..2)
//!     .field("name", 2..10)
//!     .field("birthday", 10..18);
//!
//! let hooks = Hooks::new()
//!     .before(|line| {
//!         if line.unparsed_line().starts_with("US") {
//!             Ok(())
//!         } else {
//!             Err(HookError::Skip)
//!         }
//!     })
//!     .after(|record| {
//!         let birthday = record
//!             .get("birthday")
//!             .and_then(|v| v.parse_date("%Y%m%d"))
//!             .ok_or_else(|| HookError::failed("bad birthday"))?;
//!         record.set("birthday", birthday);
//!         Ok(())
//!     });
//!
//! let input = "USSMITH   19940704\nUKJONES   19510101\nUSDOE     19570214\n";
//! let people = FileParser::new(map).with_hooks(hooks).parse_str(input).unwrap();
//! assert_eq!(people.count(), 2);
//!
//! let born_late = people
//!     .filter([("birthday__gt", chrono::NaiveDate::from_ymd_opt(1960, 1, 1).unwrap())])
//!     .unwrap();
//! assert_eq!(born_late[0].get("name"), Some(&Value::from("SMITH   ")));
//! assert_eq!(born_late[0].line_number(), 1);
//! ```

pub mod error;
pub mod field_map;
pub mod file_parser;
pub mod lookup;
pub mod parser;
pub mod record;
pub mod record_set;
pub mod value;

pub use error::{FwfError, Result};
pub use field_map::FieldMap;
pub use file_parser::FileParser;
pub use lookup::{Comparand, Lookup, LookupError, OPERATORS, Operator, resolve};
pub use parser::{HookError, HookResult, Hooks, LineContext, NoHooks, ParseHooks, parse_line};
pub use record::{LINE_NUMBER, Record, RecordRef, UNPARSED_LINE};
pub use record_set::{RecordSet, Rows, Values};
pub use value::Value;
