// 📂 CSV Codec - decode input into a Table, encode the annotated Table back
// Same delimiter in and out so the file round-trips through spreadsheet tools

use crate::error::{AuditError, Result};
use crate::table::Table;
use anyhow::Context;
use chrono::NaiveDate;
use csv::{ReaderBuilder, WriterBuilder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const UTF8_BOM: char = '\u{feff}';

/// Decode a CSV stream; the first record is the header.
///
/// Short records are padded with empty cells. A record with more fields than
/// the header is rejected with the line it starts on.
pub fn read_table<R: Read>(reader: R, delimiter: u8) -> Result<Table> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(reader);

    let mut headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if let Some(first) = headers.first_mut() {
        if let Some(stripped) = first.strip_prefix(UTF8_BOM) {
            *first = stripped.to_string();
        }
    }
    if headers.is_empty() || (headers.len() == 1 && headers[0].is_empty()) {
        return Err(AuditError::EmptyInput);
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.len() > headers.len() {
            return Err(AuditError::RaggedRow {
                line: record.position().map(|p| p.line()).unwrap_or(0),
                expected: headers.len(),
                found: record.len(),
            });
        }
        rows.push(record.iter().map(str::to_string).collect());
    }

    Ok(Table::new(headers, rows))
}

pub fn read_table_from_path(path: &Path, delimiter: u8) -> anyhow::Result<Table> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: {}", path.display()))?;

    read_table(file, delimiter)
        .with_context(|| format!("Failed to read table from {}", path.display()))
}

/// Encode a table as CSV, header first
pub fn write_table<W: Write>(writer: W, table: &Table, delimiter: u8) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(writer);

    let encode = |e: csv::Error| AuditError::Encode(e.to_string());

    wtr.write_record(&table.headers).map_err(encode)?;
    for row in &table.rows {
        wtr.write_record(row).map_err(encode)?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn write_table_to_path(path: &Path, table: &Table, delimiter: u8) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create file: {}", path.display()))?;

    write_table(file, table, delimiter)
        .with_context(|| format!("Failed to write table to {}", path.display()))
}

/// Encode into an in-memory buffer
pub fn table_to_bytes(table: &Table, delimiter: u8) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    write_table(&mut buf, table, delimiter)?;
    Ok(buf)
}

/// `ket_qua_TKHQ_DDMMYYYY.csv`
pub fn output_file_name(audit_date: NaiveDate) -> String {
    format!("ket_qua_TKHQ_{}.csv", audit_date.format("%d%m%Y"))
}

/// Single ASCII delimiter from a CLI/query argument (`\t` and `tab` accepted)
pub fn parse_delimiter(raw: &str) -> Result<u8> {
    match raw {
        "\\t" | "tab" | "\t" => Ok(b'\t'),
        s if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
        other => Err(AuditError::Config(format!(
            "delimiter must be a single ASCII character, got {other:?}"
        ))),
    }
}

// ============================================================================
// TESTS
// ============================================================================
