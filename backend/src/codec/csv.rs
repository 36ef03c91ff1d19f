//! CSV encoding and decoding for the export/import files.
//!
//! Encoding quotes a field only when it contains a comma, a double quote or a
//! line break, doubling any embedded quotes. Decoding is a single pass over the
//! characters with an explicit in-quotes flag. Malformed quoting is never an
//! error: an unterminated quote simply swallows the rest of the input into the
//! current field.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use std::borrow::Cow;
use std::collections::HashMap;

/// A single scalar value rendered into one CSV field
#[derive(Debug, Clone, PartialEq)]
pub enum CsvValue {
    Null,
    Integer(i64),
    Number(f64),
    Text(String),
    /// Rendered as `YYYY-MM-DD`
    Date(NaiveDate),
    /// Rendered as `YYYY-MM-DDTHH:MM:SS.sssZ`
    Timestamp(DateTime<Utc>),
}

impl CsvValue {
    /// Render the value as unescaped field text
    pub fn render(&self) -> Cow<'_, str> {
        match self {
            CsvValue::Null => Cow::Borrowed(""),
            CsvValue::Integer(value) => Cow::Owned(value.to_string()),
            CsvValue::Number(value) if value.is_finite() => Cow::Owned(value.to_string()),
            CsvValue::Number(_) => Cow::Borrowed(""),
            CsvValue::Text(value) => Cow::Borrowed(value.as_str()),
            CsvValue::Date(date) => Cow::Owned(date.format("%Y-%m-%d").to_string()),
            CsvValue::Timestamp(ts) => Cow::Owned(ts.to_rfc3339_opts(SecondsFormat::Millis, true)),
        }
    }
}

impl From<i64> for CsvValue {
    fn from(value: i64) -> Self {
        CsvValue::Integer(value)
    }
}

impl From<f64> for CsvValue {
    fn from(value: f64) -> Self {
        CsvValue::Number(value)
    }
}

impl From<&str> for CsvValue {
    fn from(value: &str) -> Self {
        CsvValue::Text(value.to_string())
    }
}

impl From<String> for CsvValue {
    fn from(value: String) -> Self {
        CsvValue::Text(value)
    }
}

impl From<NaiveDate> for CsvValue {
    fn from(value: NaiveDate) -> Self {
        CsvValue::Date(value)
    }
}

impl From<DateTime<Utc>> for CsvValue {
    fn from(value: DateTime<Utc>) -> Self {
        CsvValue::Timestamp(value)
    }
}

impl<T: Into<CsvValue>> From<Option<T>> for CsvValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(CsvValue::Null, Into::into)
    }
}

fn needs_quoting(field: &str) -> bool {
    field.contains([',', '"', '\n', '\r'])
}

/// Escape one field, quoting it only when required
pub fn escape_field(field: &str) -> Cow<'_, str> {
    if needs_quoting(field) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Encode a header line followed by one line per record.
///
/// The output always ends in a newline, so zero records yield just the header
/// line.
pub fn encode_records<I>(columns: &[&str], records: I) -> String
where
    I: IntoIterator<Item = Vec<CsvValue>>,
{
    let mut out = columns
        .iter()
        .map(|column| escape_field(column))
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');

    for record in records {
        let line = record
            .iter()
            .map(|value| escape_field(&value.render()).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }

    out
}

/// Split text into rows of raw string fields.
///
/// `\n`, `\r\n` and a bare `\r` all terminate a record outside quotes. Rows
/// consisting of a single empty field (blank lines) are dropped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
            continue;
        }

        match ch {
            '"' => in_quotes = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\n' | '\r' => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows.retain(|r| !(r.len() == 1 && r[0].is_empty()));
    rows
}

/// Parsed CSV with the first row used as a column-name index
#[derive(Debug, Clone, Default)]
pub struct CsvTable {
    columns: HashMap<String, usize>,
    rows: Vec<Vec<String>>,
}

impl CsvTable {
    /// Parse text, taking the first non-blank row as the header.
    ///
    /// Header names are trimmed; when a name repeats, the last column wins.
    pub fn parse(text: &str) -> Self {
        let mut rows = parse_rows(text).into_iter();
        let columns = rows
            .next()
            .map(|header| {
                header
                    .into_iter()
                    .enumerate()
                    .map(|(index, name)| (name.trim().to_string(), index))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            columns,
            rows: rows.collect(),
        }
    }

    /// Column index for a header name
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.get(name).copied()
    }

    /// Data rows, header excluded
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Field of `row` under column `name`, if both the column and the field exist
    pub fn get<'a>(&self, row: &'a [String], name: &str) -> Option<&'a str> {
        self.column(name)
            .and_then(|index| row.get(index))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
