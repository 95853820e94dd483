//! Record parser: turns one raw line into a [`Record`].
//!
//! Parsing runs in a fixed order:
//!
//! 1. The raw line is kept verbatim as the record's unparsed line, and a
//!    copy without its terminator becomes the *parsable* line.
//! 2. [`ParseHooks::before_parse`] may rewrite the parsable line or skip it.
//! 3. Each field of the [`FieldMap`] is sliced out of the parsable line,
//!    untrimmed, in declaration order.
//! 4. [`ParseHooks::after_parse`] may retype, add, remove or reorder
//!    fields, or skip the record after looking at its values.
//!
//! A hook returning [`HookError::Skip`] drops only the current line. Any
//! other hook error is fatal to the whole parse.

use log::{debug, trace};
use thiserror::Error;

use crate::error::{FwfError, Result};
use crate::field_map::FieldMap;
use crate::record::Record;

/// Error returned by a parse hook.
#[derive(Debug, Error)]
pub enum HookError {
    /// Drop this line and carry on with the next one.
    #[error("line skipped")]
    Skip,

    /// Abort the parse.
    #[error("{0}")]
    Failed(Box<dyn std::error::Error + Send + Sync>),
}

impl HookError {
    /// A fatal hook error with a plain message.
    pub fn failed(msg: impl Into<String>) -> Self {
        HookError::Failed(msg.into().into())
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, HookError::Skip)
    }
}

impl From<FwfError> for HookError {
    fn from(e: FwfError) -> Self {
        HookError::Failed(Box::new(e))
    }
}

impl From<chrono::ParseError> for HookError {
    fn from(e: chrono::ParseError) -> Self {
        HookError::Failed(Box::new(e))
    }
}

impl From<std::num::ParseIntError> for HookError {
    fn from(e: std::num::ParseIntError) -> Self {
        HookError::Failed(Box::new(e))
    }
}

pub type HookResult = std::result::Result<(), HookError>;

/// The line being parsed, as seen by [`ParseHooks::before_parse`].
#[derive(Debug)]
pub struct LineContext<'a> {
    unparsed_line: &'a str,
    parsable_line: String,
    line_number: usize,
    field_map: &'a FieldMap,
}

impl<'a> LineContext<'a> {
    /// The raw line, terminator included. Never modified.
    pub fn unparsed_line(&self) -> &'a str {
        self.unparsed_line
    }

    /// The line fields will be sliced from.
    pub fn parsable_line(&self) -> &str {
        &self.parsable_line
    }

    pub fn parsable_line_mut(&mut self) -> &mut String {
        &mut self.parsable_line
    }

    pub fn set_parsable_line(&mut self, line: impl Into<String>) {
        self.parsable_line = line.into();
    }

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn field_map(&self) -> &'a FieldMap {
        self.field_map
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'a str> {
        self.field_map.names()
    }
}

/// Customisation points of the record parser.
///
/// Both methods default to doing nothing.
pub trait ParseHooks {
    /// Called before any field is sliced.
    fn before_parse(&self, _line: &mut LineContext<'_>) -> HookResult {
        Ok(())
    }

    /// Called with the freshly built record.
    fn after_parse(&self, _record: &mut Record) -> HookResult {
        Ok(())
    }
}

/// Hooks that accept every line unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl ParseHooks for NoHooks {}

impl<H: ParseHooks + ?Sized> ParseHooks for &H {
    fn before_parse(&self, line: &mut LineContext<'_>) -> HookResult {
        (**self).before_parse(line)
    }

    fn after_parse(&self, record: &mut Record) -> HookResult {
        (**self).after_parse(record)
    }
}

impl<H: ParseHooks + ?Sized> ParseHooks for Box<H> {
    fn before_parse(&self, line: &mut LineContext<'_>) -> HookResult {
        (**self).before_parse(line)
    }

    fn after_parse(&self, record: &mut Record) -> HookResult {
        (**self).after_parse(record)
    }
}

type BeforeParseFn = Box<dyn Fn(&mut LineContext<'_>) -> HookResult + Send + Sync>;
type AfterParseFn = Box<dyn Fn(&mut Record) -> HookResult + Send + Sync>;

/// Closure-based hooks.
///
/// ```
/// use fwf_records::{HookError, Hooks};
///
/// let hooks = Hooks::new()
///     .before(|line| {
///         if line.unparsed_line().starts_with("US") {
///             Ok(())
///         } else {
///             Err(HookError::Skip)
///         }
///     })
///     .after(|record| {
///         record.set("checked", true);
///         Ok(())
///     });
/// # let _ = hooks;
/// ```
#[derive(Default)]
pub struct Hooks {
    before: Option<BeforeParseFn>,
    after: Option<AfterParseFn>,
}

impl Hooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut LineContext<'_>) -> HookResult + Send + Sync + 'static,
    {
        self.before = Some(Box::new(f));
        self
    }

    pub fn after<F>(mut self, f: F) -> Self
    where
        F: Fn(&mut Record) -> HookResult + Send + Sync + 'static,
    {
        self.after = Some(Box::new(f));
        self
    }
}

impl ParseHooks for Hooks {
    fn before_parse(&self, line: &mut LineContext<'_>) -> HookResult {
        match &self.before {
            Some(f) => f(line),
            None => Ok(()),
        }
    }

    fn after_parse(&self, record: &mut Record) -> HookResult {
        match &self.after {
            Some(f) => f(record),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("before", &self.before.is_some())
            .field("after", &self.after.is_some())
            .finish()
    }
}

/// Remove a trailing `\n` or `\r\n`.
fn strip_terminator(line: &str) -> &str {
    line.strip_suffix('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .unwrap_or(line)
}

/// Slice `range` out of `line` by byte offsets.
///
/// Offsets past the end are clamped. A boundary inside a multi-byte
/// character is decoded lossily.
fn slice_field(line: &str, range: std::ops::Range<usize>) -> String {
    let bytes = line.as_bytes();
    let end = range.end.min(bytes.len());
    let start = range.start.min(end);
    match line.get(start..end) {
        Some(s) => s.to_string(),
        None => String::from_utf8_lossy(&bytes[start..end]).into_owned(),
    }
}

/// Parse one raw line.
///
/// Returns `Ok(None)` when a hook skipped the line.
pub fn parse_line<H: ParseHooks + ?Sized>(
    raw: &str,
    line_number: usize,
    field_map: &FieldMap,
    hooks: &H,
) -> Result<Option<Record>> {
    let mut ctx = LineContext {
        unparsed_line: raw,
        parsable_line: strip_terminator(raw).to_string(),
        line_number,
        field_map,
    };

    match hooks.before_parse(&mut ctx) {
        Ok(()) => {}
        Err(HookError::Skip) => {
            debug!("Line {line_number} skipped before parse");
            return Ok(None);
        }
        Err(source) => return Err(FwfError::Hook { line_number, source }),
    }

    let mut record = Record::new(line_number, raw);
    for (name, range) in field_map.iter() {
        record.set(name, slice_field(&ctx.parsable_line, range));
    }

    match hooks.after_parse(&mut record) {
        Ok(()) => {}
        Err(HookError::Skip) => {
            debug!("Line {line_number} skipped after parse");
            return Ok(None);
        }
        Err(source) => return Err(FwfError::Hook { line_number, source }),
    }

    trace!("Line {line_number} parsed into {} fields", record.len());
    Ok(Some(record))
}
