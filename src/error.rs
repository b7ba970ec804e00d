// ❗ Audit Errors
// Structural failures only - per-row anomalies never surface here

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    /// Required columns are absent from the table header
    #[error("missing required column(s): {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("input has no header row")]
    EmptyInput,

    #[error("failed to decode CSV input: {0}")]
    Decode(#[from] csv::Error),

    /// A data record carries more fields than the header names
    #[error("line {line}: record has {found} fields but the header has {expected}")]
    RaggedRow { line: u64, expected: usize, found: usize },

    #[error("failed to encode output: {0}")]
    Encode(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("invalid audit date: {0:?}")]
    InvalidAuditDate(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl AuditError {
    /// True for errors caused by the shape of the input rather than the environment
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            AuditError::MissingColumns { .. }
                | AuditError::EmptyInput
                | AuditError::Decode(_)
                | AuditError::RaggedRow { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
