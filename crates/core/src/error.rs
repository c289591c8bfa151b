//! Error types for tsid
//!
//! This module defines all error types used throughout the catalog.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.

use crate::types::{FieldType, MetricId};
use std::io;
use thiserror::Error;

/// Result type alias for catalog operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the catalog
#[derive(Debug, Error)]
pub enum Error {
    /// Lookup of an unknown metric name, tag key or field
    #[error("Not found: {0}")]
    NotFound(String),

    /// An existing field was requested with a different value type
    #[error("Field type conflict for {field}: stored as {existing}, requested {requested}")]
    FieldTypeConflict {
        /// Field name
        field: String,
        /// Type the field was created with
        existing: FieldType,
        /// Type of the rejected request
        requested: FieldType,
    },

    /// The per-metric field ceiling has been reached
    #[error("Too many fields for metric {metric_id} (limit {limit})")]
    TooManyFields {
        /// Metric the allocation was for
        metric_id: MetricId,
        /// Configured ceiling
        limit: u16,
    },

    /// A 32-bit ID sequence has no values left
    #[error("ID space exhausted: {0} sequence is at its maximum")]
    IdSpaceExhausted(&'static str),

    /// Snapshot, reader or flusher failure
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Durable bytes failed to decode
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// I/O error (table files, config files)
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),

    /// Invalid argument supplied by the caller
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be read or parsed
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl Error {
    /// Create a NotFound error
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Create a StorageError
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::StorageError(msg.into())
    }

    /// Create a Corruption error
    pub fn corruption(msg: impl Into<String>) -> Self {
        Error::Corruption(msg.into())
    }

    /// Create an InvalidInput error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }

    /// True for NotFound
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// True for failures of the durable layer (storage, corruption, I/O)
    ///
    /// Suggestion queries downgrade exactly this class to an empty result.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Error::StorageError(_) | Error::Corruption(_) | Error::IoError(_)
        )
    }
}
