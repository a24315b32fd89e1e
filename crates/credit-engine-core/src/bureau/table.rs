//! Delimited-text ingestion into a header/rows table.

use serde::{Deserialize, Serialize};

use crate::fields::{record_from_row, FieldRecord};

/// Candidate delimiters; on equal counts the earlier one wins.
pub const DELIMITERS: &[char] = &[',', ';', '\t', '|'];

/// Where a table came from, so callers can tell a real parse from a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TableSource {
    JsonArray { path: String },
    JsonObject,
    Delimited { delimiter: char, has_header: bool },
    RawLines,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BureauTable {
    pub source: TableSource,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl BureauTable {
    pub fn empty() -> Self {
        BureauTable {
            source: TableSource::Empty,
            headers: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Rows keyed by normalized header.
    pub fn records(&self) -> Vec<FieldRecord> {
        self.rows
            .iter()
            .map(|row| record_from_row(&self.headers, row))
            .collect()
    }
}

/// `column_1 .. column_n`.
pub fn generic_headers(width: usize) -> Vec<String> {
    (1..=width).map(|i| format!("column_{i}")).collect()
}

/// Pick the delimiter occurring most often in `line`, if any occurs at all.
pub fn detect_delimiter(line: &str) -> Option<char> {
    let mut best: Option<(char, usize)> = None;
    for &d in DELIMITERS {
        let count = line.matches(d).count();
        if count > 0 && best.map_or(true, |(_, c)| count > c) {
            best = Some((d, count));
        }
    }
    best.map(|(d, _)| d)
}

/// Parse delimited text. Never fails: text without a delimiter becomes a
/// single-column table of its non-empty lines.
pub fn parse_delimited(raw: &str) -> BureauTable {
    let lines: Vec<&str> = raw
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();

    let Some(first) = lines.first() else {
        return BureauTable::empty();
    };

    let Some(delimiter) = detect_delimiter(first) else {
        tracing::debug!(lines = lines.len(), "no delimiter found; single-column table");
        return BureauTable {
            source: TableSource::RawLines,
            headers: generic_headers(1),
            rows: lines.iter().map(|l| vec![l.trim().to_string()]).collect(),
        };
    };

    let mut rows = split_rows(&lines, delimiter);
    let has_header = rows.len() > 1
        && rows[0]
            .iter()
            .any(|cell| cell.chars().any(char::is_alphabetic));

    let headers = if has_header {
        rows.remove(0)
    } else {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        generic_headers(width)
    };
    tracing::debug!(?delimiter, has_header, rows = rows.len(), "parsed delimited bureau text");

    BureauTable {
        source: TableSource::Delimited {
            delimiter,
            has_header,
        },
        headers,
        rows,
    }
}

/// One record per line. Lines with balanced quotes go through `csv` so quoted
/// cells keep their delimiters; a line with a stray quote is split plainly so it
/// cannot swallow the lines after it.
fn split_rows(lines: &[&str], delimiter: char) -> Vec<Vec<String>> {
    lines
        .iter()
        .map(|line| {
            if line.matches('"').count() % 2 == 0 {
                if let Some(cells) = split_quoted(line, delimiter) {
                    return cells;
                }
            }
            tracing::debug!(line, "unbalanced or unreadable line; using plain split");
            line.split(delimiter)
                .map(|c| c.trim().trim_matches('"').trim().to_string())
                .collect()
        })
        .collect()
}

fn split_quoted(line: &str, delimiter: char) -> Option<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(u8::try_from(delimiter).ok()?)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());
    let record = reader.records().next()?.ok()?;
    Some(record.iter().map(str::to_string).collect())
}
