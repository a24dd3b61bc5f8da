//! Error types for loading and merging bibliographic records.
//!
//! Normalizers and the reference parser are total and never fail; errors
//! only arise while mapping a record source onto the schema or while doing
//! I/O on behalf of the host.

use crate::record::Source;
use thiserror::Error;

/// A specialized Result type for merge operations.
pub type Result<T> = std::result::Result<T, MergeError>;

/// Represents errors that can occur while loading, merging or writing records.
#[derive(Error, Debug)]
pub enum MergeError {
    /// A field the engine cannot work without is absent from a source's headers.
    #[error("Schema mismatch in {origin} export: no column maps to \"{field}\"")]
    SchemaMismatch { origin: Source, field: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[cfg(feature = "csv")]
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
