//! Error types for the modelmove tooling.
//!
//! This module provides the [`ModelMoveError`] enum covering every failure
//! class the tool can hit: operator-facing precondition failures, internal
//! invariant violations, migration-apply failures, and the ambient database,
//! configuration, serialization, and IO errors.

use thiserror::Error;

/// The primary error type for the modelmove tooling.
///
/// The first three variants form the operator-facing taxonomy:
///
/// - [`Precondition`](Self::Precondition): a check failed before anything
///   was written; the process exits with code 2 and no side effects.
/// - [`InvariantViolation`](Self::InvariantViolation): the change detector
///   produced an unexpected operation count or shape; this signals a broken
///   assumption inside the tool, not operator error, and aborts immediately.
/// - [`Apply`](Self::Apply): applying generated migrations against the live
///   database failed. Already-written migration files are kept; they remain
///   valid, reusable artifacts.
#[derive(Error, Debug)]
pub enum ModelMoveError {
    /// A precondition check failed; nothing has been written.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The change detector broke an internal assumption.
    #[error("Internal invariant violated: {0}")]
    InvariantViolation(String),

    /// The migrate step failed against the live database.
    #[error("Apply failed: {0}")]
    Apply(String),

    /// A generic database error.
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// An operational database error (connection failure, etc.).
    #[error("Operational error: {0}")]
    OperationalError(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ModelMoveError {
    /// Returns the process exit code associated with this error.
    ///
    /// Precondition failures exit with code 2, matching the contract that
    /// other tooling can distinguish "your project is not ready" from
    /// "the tool itself failed".
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Precondition(_) => 2,
            Self::InvariantViolation(_)
            | Self::Apply(_)
            | Self::DatabaseError(_)
            | Self::OperationalError(_)
            | Self::ConfigurationError(_)
            | Self::SerializationError(_)
            | Self::IoError(_) => 1,
        }
    }

    /// Returns `true` if this error represents a precondition failure.
    pub const fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }
}

/// A convenience type alias for `Result<T, ModelMoveError>`.
pub type ModelMoveResult<T> = Result<T, ModelMoveError>;
