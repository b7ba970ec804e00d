// TKHQ Audit - Core Library
// Exposes the rule engine for the CLI, the API server, and tests

pub mod error;
pub mod config;
pub mod table;
pub mod io;
pub mod dates;
pub mod record;
pub mod rules;
pub mod summary;
pub mod assembler;

#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use error::{AuditError, Result};
pub use config::{AuditConfig, LabelStyle};
pub use table::Table;
pub use io::{
    read_table, read_table_from_path, write_table, write_table_to_path,
    table_to_bytes, output_file_name, parse_delimiter,
};
pub use dates::{DateNormalizer, parse_audit_date};
pub use record::{
    ColumnValue, Declaration, DeclarationColumns,
    DECLARATION_DUE_DATE, DECLARATION_RECEIVED_DATE, AUDIT_DATE2, DECLARATION_REF_NO,
    REQUIRED_COLUMNS,
};
pub use rules::{
    AuditContext, DerivedFields, DerivedRule, RuleEngine,
    missing_due_date, overdue_days, overdue_unfiled, overdue_over, extension_raised,
    normalize_token,
};
pub use summary::AuditSummary;
pub use assembler::{Assembler, AuditOutcome};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
