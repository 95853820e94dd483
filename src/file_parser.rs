//! File parser: reads a whole fixed-width source into a [`RecordSet`].

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

use log::info;

use crate::error::Result;
use crate::field_map::FieldMap;
use crate::parser::{NoHooks, ParseHooks, parse_line};
use crate::record_set::RecordSet;

/// A field map plus parse hooks, ready to read sources.
///
/// Parsing is eager and all-or-nothing: either every line is read and
/// every non-skipped record returned, or the first fatal error is.
#[derive(Debug, Clone)]
pub struct FileParser<H = NoHooks> {
    field_map: FieldMap,
    hooks: H,
}

impl FileParser<NoHooks> {
    pub fn new(field_map: FieldMap) -> Self {
        Self {
            field_map,
            hooks: NoHooks,
        }
    }
}

impl<H: ParseHooks> FileParser<H> {
    /// Replace the hooks.
    pub fn with_hooks<H2: ParseHooks>(self, hooks: H2) -> FileParser<H2> {
        FileParser {
            field_map: self.field_map,
            hooks,
        }
    }

    pub fn field_map(&self) -> &FieldMap {
        &self.field_map
    }

    pub fn hooks(&self) -> &H {
        &self.hooks
    }

    /// Open and parse a file.
    ///
    /// A malformed field map is reported before the file is touched.
    pub fn open(&self, path: impl AsRef<Path>) -> Result<RecordSet> {
        let path = path.as_ref();
        info!("Opening fixed-width file: {}", path.display());
        self.field_map.validate()?;
        let file = File::open(path)?;
        self.read_validated(BufReader::new(file))
    }

    /// Parse every line of an already open reader.
    ///
    /// The reader is not closed; that stays with the caller.
    pub fn read<R: BufRead>(&self, reader: R) -> Result<RecordSet> {
        self.field_map.validate()?;
        self.read_validated(reader)
    }

    fn read_validated<R: BufRead>(&self, mut reader: R) -> Result<RecordSet> {
        let mut records = Vec::new();
        let mut line = String::new();
        let mut line_number = 0;
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_number += 1;
            if let Some(record) = parse_line(&line, line_number, &self.field_map, &self.hooks)? {
                records.push(Arc::new(record));
            }
        }
        info!(
            "Parsed {} records from {} lines ({} skipped)",
            records.len(),
            line_number,
            line_number - records.len()
        );
        Ok(RecordSet::with_fields(records, self.field_map.names()))
    }

    /// Parse in-memory text.
    pub fn parse_str(&self, text: &str) -> Result<RecordSet> {
        self.read(text.as_bytes())
    }
}
