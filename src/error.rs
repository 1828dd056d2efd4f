use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while loading sales data, computing statistics, or
/// managing user accounts.
///
/// Only [`Error::NotFound`] (and the other load errors) end a session; the
/// rest are reported by the menu shell, which then carries on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("sales data file not found or unreadable: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("reading CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column {0:?}")]
    MissingColumn(String),

    #[error("invalid column pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("line {line}: {message}")]
    Parse { line: u64, message: String },

    #[error("record {item:?}: {reason}")]
    InvalidRecord { item: String, reason: String },

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("user {0:?} already exists")]
    UserExists(String),

    #[error("profit margin is undefined when total revenue is zero")]
    DivisionUndefined,

    #[error("window size {window} must be between 1 and the series length {len}")]
    InvalidWindowSize { window: usize, len: usize },

    #[error("cost ratio {0} must be a finite, non-negative number")]
    InvalidCostRatio(f64),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
