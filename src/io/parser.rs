//! Delimited-text parsing
//!
//! Turns an in-memory text buffer into an ordered sequence of raw rows plus
//! the header row, without attaching any meaning to individual columns.
//! Semantic checks (is this a date, is the amount numeric, are required
//! fields present) belong to the validator; the parser stays dialect-agnostic
//! on purpose, so a row that is merely shorter or longer than the header is
//! passed through rather than rejected here.
//!
//! # Failure modes
//!
//! Only two conditions are parse failures, both fatal to the run:
//!
//! - unbalanced quoting, detected by a pre-scan (the csv crate silently
//!   swallows the rest of the buffer in that case, so the scan is what
//!   produces a usable line number);
//! - a row whose field count is wildly inconsistent with the header (more
//!   than twice the header width), which indicates the declared delimiter or
//!   quote convention does not match the file.
//!
//! # Design
//!
//! Parsing is a pure transformation over the buffer; no I/O happens here.
//! The csv crate is configured with `flexible(true)` so short/long rows
//! survive to validation, and `Trim::All` so cell whitespace is normalized
//! at the boundary.

use crate::types::{ImportError, RowIndex};
use csv::{ReaderBuilder, Trim};

/// Delimiter and quote convention declared by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    /// Field delimiter byte (e.g. b',' or b';')
    pub delimiter: u8,

    /// Quote byte (almost always b'"')
    pub quote: u8,

    /// Whether the first non-empty row is a header
    pub has_header: bool,
}

impl Default for Dialect {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_header: true,
        }
    }
}

/// One data row as read from the input
///
/// Immutable once parsed. `index` is 1-based over data rows (the header is
/// not counted) and is the key used by every later stage for reporting.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub index: RowIndex,
    pub fields: Vec<String>,
}

impl RawRow {
    /// Field at a column index, if the row is wide enough
    pub fn field(&self, column: usize) -> Option<&str> {
        self.fields.get(column).map(String::as_str)
    }
}

/// Parsed input: optional header plus ordered data rows
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedInput {
    pub header: Option<Vec<String>>,
    pub rows: Vec<RawRow>,
}

/// Parse a text buffer into header + data rows
///
/// Supports quoted fields containing the delimiter or embedded newlines.
/// A blank trailing line is treated as end-of-input rather than an empty row.
///
/// # Errors
///
/// Returns [`ImportError::MalformedInput`] when quoting is unbalanced or a
/// row's field count is wildly inconsistent with the header.
pub fn parse(text: &str, dialect: &Dialect) -> Result<ParsedInput, ImportError> {
    check_quote_balance(text, dialect)?;

    let mut reader = ReaderBuilder::new()
        .delimiter(dialect.delimiter)
        .quote(dialect.quote)
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(text.as_bytes());

    let mut header: Option<Vec<String>> = None;
    let mut rows: Vec<RawRow> = Vec::new();
    let mut next_index: RowIndex = 1;

    for result in reader.records() {
        let record = result.map_err(|e| {
            let line = e.position().map(|pos| pos.line()).unwrap_or(0);
            ImportError::malformed_input(line, e.to_string())
        })?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);

        let fields: Vec<String> = record.iter().map(str::to_string).collect();

        // The csv crate skips fully blank lines; a lone empty field can still
        // appear for a line of stray whitespace and is not a data row.
        if fields.len() == 1 && fields[0].is_empty() {
            continue;
        }

        if dialect.has_header && header.is_none() {
            header = Some(fields);
            continue;
        }

        if let Some(header) = &header {
            if fields.len() > header.len().saturating_mul(2) {
                return Err(ImportError::malformed_input(
                    line,
                    format!(
                        "row has {} fields but the header declares {}",
                        fields.len(),
                        header.len()
                    ),
                ));
            }
        }

        rows.push(RawRow {
            index: next_index,
            fields,
        });
        next_index += 1;
    }

    Ok(ParsedInput { header, rows })
}

/// Verify RFC-4180 quote balance before handing the buffer to the csv crate
///
/// Tracks quoted state byte by byte, honoring doubled-quote escapes. If the
/// buffer ends inside a quoted field, the line on which the offending quote
/// was opened is reported.
fn check_quote_balance(text: &str, dialect: &Dialect) -> Result<(), ImportError> {
    let quote = dialect.quote;
    let bytes = text.as_bytes();
    let mut line: u64 = 1;
    let mut in_quotes = false;
    let mut opened_on: u64 = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quotes {
            if b == quote {
                // A doubled quote is an escaped literal, not a close
                if bytes.get(i + 1) == Some(&quote) {
                    i += 2;
                    continue;
                }
                in_quotes = false;
            } else if b == b'\n' {
                line += 1;
            }
        } else if b == quote {
            in_quotes = true;
            opened_on = line;
        } else if b == b'\n' {
            line += 1;
        }
        i += 1;
    }

    if in_quotes {
        return Err(ImportError::malformed_input(
            opened_on,
            "unbalanced quote: quoted field is never closed",
        ));
    }
    Ok(())
}
