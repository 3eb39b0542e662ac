//! Error types for lurewatch.
//!
//! This module defines all error types used throughout the lurewatch crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for lurewatch operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Input Errors ===
    /// Failed to read an input file.
    #[error("failed to read {path}: {source}")]
    InputRead {
        /// Path of the input file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A JSON lines record could not be parsed.
    #[error("{path}:{line}: malformed record: {source}")]
    InputParse {
        /// Path of the input file.
        path: PathBuf,
        /// 1-based line number of the bad record.
        line: usize,
        /// The underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// No path was given for a required input, either on the command line or in config.
    #[error("no {kind} input given; pass it on the command line or set inputs.{kind} in config")]
    MissingInput {
        /// Which input is missing (`domains`, `subscriptions`, `graph`).
        kind: &'static str,
    },

    // === Matching Errors ===
    /// A term in the term list is unusable.
    #[error("invalid term {term:?}: {reason}")]
    InvalidTerm {
        /// The offending term.
        term: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The term list has no terms.
    #[error("term list is empty")]
    EmptyTermList,

    /// The lure threshold cannot be reached, or is zero.
    #[error("min_matches ({min_matches}) must be between 1 and the number of distinct terms ({terms})")]
    InvalidThreshold {
        /// The requested threshold.
        min_matches: usize,
        /// Distinct terms after normalization.
        terms: usize,
    },

    /// The term set could not be compiled.
    #[error("failed to compile term matcher: {0}")]
    TermCompile(#[from] regex::Error),

    // === Hierarchy Errors ===
    /// The reporting graph contains a cycle.
    #[error("reporting cycle detected at user '{user}'")]
    HierarchyCycle {
        /// A user that is part of the cycle.
        user: String,
    },

    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Pipeline Errors ===
    /// A notification sink failed to deliver.
    #[error("sink '{sink}' failed: {message}")]
    Delivery {
        /// Name of the sink.
        sink: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for lurewatch operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create an invalid term error.
    #[must_use]
    pub fn invalid_term(term: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidTerm {
            term: term.into(),
            reason: reason.into(),
        }
    }

    /// Create a delivery error for the named sink.
    #[must_use]
    pub fn delivery(sink: &'static str, message: impl Into<String>) -> Self {
        Self::Delivery {
            sink,
            message: message.into(),
        }
    }

    /// Check if this error came from bad input data rather than the environment.
    #[must_use]
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InputParse { .. }
                | Self::InvalidTerm { .. }
                | Self::EmptyTermList
                | Self::InvalidThreshold { .. }
                | Self::HierarchyCycle { .. }
        )
    }
}
