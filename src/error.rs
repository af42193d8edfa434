use std::{
    num::{ParseFloatError, ParseIntError},
    path::PathBuf,
    str::Utf8Error,
};
use thiserror::Error;

pub type VcxResult<T> = std::result::Result<T, VcxError>;

#[derive(Debug, Error)]
pub enum VcxError {
    #[error("{0}")]
    Message(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    SpillSort(#[from] vcf_spill_sort::SpillSortError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    ParseInt(#[from] ParseIntError),
    #[error(transparent)]
    ParseFloat(#[from] ParseFloatError),
    #[error("Invalid gzip header: {}", path.display())]
    InvalidGzipHeader { path: PathBuf },
    #[error("Line exceeds the maximum supported length of {limit} bytes")]
    OversizedLine { limit: usize },
    #[error("Invalid include expression: {reason}")]
    InvalidExpression { reason: String },
    #[error("Malformed VCF row: {reason}")]
    MalformedRow { reason: String },
}

impl VcxError {
    pub fn message(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub fn invalid_expression(reason: impl Into<String>) -> Self {
        Self::InvalidExpression {
            reason: reason.into(),
        }
    }

    pub fn malformed_row(reason: impl Into<String>) -> Self {
        Self::MalformedRow {
            reason: reason.into(),
        }
    }
}

#[macro_export]
macro_rules! vcx_error {
    ($($arg:tt)*) => {
        $crate::error::VcxError::message(format!($($arg)*))
    };
}
