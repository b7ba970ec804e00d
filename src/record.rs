// 🧾 Declaration Record - typed view over one table row
// Optional columns are explicit: "column missing" and "value missing" are distinct variants

use crate::dates::DateNormalizer;
use crate::error::{AuditError, Result};
use crate::table::Table;
use chrono::NaiveDate;

pub const DECLARATION_DUE_DATE: &str = "DECLARATION_DUE_DATE";
pub const DECLARATION_RECEIVED_DATE: &str = "DECLARATION_RECEIVED_DATE";
pub const AUDIT_DATE2: &str = "AUDIT_DATE2";
pub const DECLARATION_REF_NO: &str = "DECLARATION_REF_NO";

pub const REQUIRED_COLUMNS: [&str; 2] = [DECLARATION_DUE_DATE, DECLARATION_RECEIVED_DATE];

// ============================================================================
// COLUMN VALUE
// ============================================================================

/// Value of an optional column for one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnValue<'a> {
    /// The table has no such column
    NoColumn,
    /// Column exists, cell is empty or whitespace
    Blank,
    Text(&'a str),
}

impl<'a> ColumnValue<'a> {
    pub fn from_cell(cell: Option<&'a str>) -> Self {
        match cell {
            None => ColumnValue::NoColumn,
            Some(text) if text.trim().is_empty() => ColumnValue::Blank,
            Some(text) => ColumnValue::Text(text),
        }
    }

    pub fn is_present(&self) -> bool {
        matches!(self, ColumnValue::Text(_))
    }

    pub fn text(&self) -> Option<&'a str> {
        match self {
            ColumnValue::Text(text) => Some(text),
            _ => None,
        }
    }
}

// ============================================================================
// COLUMN RESOLUTION
// ============================================================================

/// Column positions, resolved once per table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeclarationColumns {
    pub due_date: usize,
    pub received_date: usize,
    pub audit_date2: Option<usize>,
    pub ref_no: Option<usize>,
}

impl DeclarationColumns {
    /// Fails with `MissingColumns` naming every absent required column
    pub fn resolve(table: &Table) -> Result<Self> {
        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !table.has_column(name))
            .map(|name| name.to_string())
            .collect();

        match (
            table.column_index(DECLARATION_DUE_DATE),
            table.column_index(DECLARATION_RECEIVED_DATE),
        ) {
            (Some(due_date), Some(received_date)) => Ok(DeclarationColumns {
                due_date,
                received_date,
                audit_date2: table.column_index(AUDIT_DATE2),
                ref_no: table.column_index(DECLARATION_REF_NO),
            }),
            _ => Err(AuditError::MissingColumns { columns: missing }),
        }
    }
}

// ============================================================================
// DECLARATION
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration<'a> {
    pub due_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub audit_date2: ColumnValue<'a>,
    pub ref_no: ColumnValue<'a>,
}

impl<'a> Declaration<'a> {
    pub fn from_row(
        columns: &DeclarationColumns,
        row: &'a [String],
        normalizer: &DateNormalizer,
    ) -> Self {
        let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");
        let optional = |idx: Option<usize>| {
            ColumnValue::from_cell(idx.map(|i| row.get(i).map(String::as_str).unwrap_or("")))
        };

        Declaration {
            due_date: normalizer.normalize(cell(columns.due_date)),
            received_date: normalizer.normalize(cell(columns.received_date)),
            audit_date2: optional(columns.audit_date2),
            ref_no: optional(columns.ref_no),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
