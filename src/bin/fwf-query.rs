//! CLI tool to query a fixed-width file.
//!
//! Usage:
//!   fwf-query <input> --field name=32:56 --field state=9:11 --filter state__in=TX,NY
//!   fwf-query <input> --field name=32:56 --order-by name --values name
//!   fwf-query <input> --field state=9:11 --unique state
//!
//! Rows are printed tab-separated, one per line.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use fwf_records::{Comparand, FieldMap, FileParser, RecordSet, Rows, Value, resolve};

/// Parse a fixed-width file and query its records.
#[derive(Parser)]
#[command(name = "fwf-query")]
struct Cli {
    /// Input file (fixed-width records, or /dev/stdin)
    input: String,

    /// Field layout as NAME=START:END (byte offsets, end exclusive)
    #[arg(short, long = "field", value_name = "NAME=START:END", required = true)]
    fields: Vec<String>,

    /// Keep records matching LOOKUP=VALUE (repeat to AND)
    #[arg(long, value_name = "LOOKUP=VALUE")]
    filter: Vec<String>,

    /// Drop records matching all of LOOKUP=VALUE
    #[arg(long, value_name = "LOOKUP=VALUE")]
    exclude: Vec<String>,

    /// Order by a field
    #[arg(long, value_name = "FIELD")]
    order_by: Option<String>,

    /// Reverse the ordering
    #[arg(long, requires = "order_by")]
    reverse: bool,

    /// Comma-separated fields to print (default: all)
    #[arg(long, value_name = "A,B,...")]
    values: Option<String>,

    /// Print the distinct values of a field instead of rows
    #[arg(long, value_name = "FIELD", conflicts_with_all = ["values", "count"])]
    unique: Option<String>,

    /// Print only the number of matching records
    #[arg(long)]
    count: bool,

    /// Show input, layout, and record counts on stderr
    #[arg(short, long)]
    verbose: bool,
}

fn parse_field(spec: &str) -> Result<(String, std::ops::Range<usize>), String> {
    let (name, range) = spec
        .split_once('=')
        .ok_or_else(|| format!("Field '{spec}' must look like NAME=START:END"))?;
    let (start, end) = range
        .split_once(':')
        .ok_or_else(|| format!("Field '{spec}' must look like NAME=START:END"))?;
    let start: usize = start
        .trim()
        .parse()
        .map_err(|_| format!("Invalid start offset in '{spec}'"))?;
    let end: usize = end
        .trim()
        .parse()
        .map_err(|_| format!("Invalid end offset in '{spec}'"))?;
    Ok((name.trim().to_string(), start..end))
}

/// Turn `LOOKUP=VALUE` into a keyword and comparand.
///
/// `in` splits its value on commas and `len` expects an integer; anything
/// else compares as a string.
fn parse_lookup(spec: &str) -> Result<(String, Comparand), String> {
    let (keyword, raw) = spec
        .split_once('=')
        .ok_or_else(|| format!("Lookup '{spec}' must look like LOOKUP=VALUE"))?;
    let comparand = match resolve(keyword).1.token {
        "in" => Comparand::List(raw.split(',').map(Value::from).collect()),
        "len" => {
            let n: i64 = raw
                .parse()
                .map_err(|_| format!("Lookup '{spec}' needs an integer length"))?;
            Comparand::from(n)
        }
        _ => Comparand::from(raw),
    };
    Ok((keyword.to_string(), comparand))
}

fn run(cli: &Cli) -> Result<String, String> {
    let map = cli
        .fields
        .iter()
        .map(|f| parse_field(f))
        .collect::<Result<FieldMap, String>>()?;
    let filters = cli
        .filter
        .iter()
        .map(|f| parse_lookup(f))
        .collect::<Result<Vec<_>, String>>()?;
    let excludes = cli
        .exclude
        .iter()
        .map(|f| parse_lookup(f))
        .collect::<Result<Vec<_>, String>>()?;

    if cli.verbose {
        eprintln!("Input:    {}", cli.input);
        eprintln!("Fields:   {}", map.names().collect::<Vec<_>>().join(", "));
    }

    let all: RecordSet = FileParser::new(map)
        .open(&cli.input)
        .map_err(|e| e.to_string())?;
    let mut records = all.filter(filters).map_err(|e| e.to_string())?;
    if !excludes.is_empty() {
        records = records.exclude(excludes).map_err(|e| e.to_string())?;
    }
    if let Some(field) = &cli.order_by {
        records = records
            .order_by(field, cli.reverse)
            .map_err(|e| e.to_string())?;
    }

    if cli.verbose {
        eprintln!("Records:  {} read -> {} matched", all.count(), records.count());
    }

    if cli.count {
        return Ok(format!("{}\n", records.count()));
    }

    let mut out = String::new();
    if let Some(field) = &cli.unique {
        for value in records.unique(field).map_err(|e| e.to_string())? {
            out.push_str(&format!("{value}\n"));
        }
        return Ok(out);
    }

    let names: Vec<&str> = cli
        .values
        .as_deref()
        .map(|v| v.split(',').map(str::trim).collect())
        .unwrap_or_default();
    match records.values(&names).map_err(|e| e.to_string())?.into_rows() {
        Rows::Scalars(values) => {
            for value in values {
                out.push_str(&format!("{value}\n"));
            }
        }
        Rows::Tuples(rows) => {
            for row in rows {
                let line: Vec<String> = row.iter().map(Value::to_string).collect();
                out.push_str(&line.join("\t"));
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    match run(&cli) {
        Ok(output) => {
            if let Err(e) = io::stdout().write_all(output.as_bytes()) {
                eprintln!("Error writing output: {e}");
                process::exit(1);
            }
        }
        Err(e) => {
            eprintln!("Query error: {e}");
            process::exit(1);
        }
    }
}
