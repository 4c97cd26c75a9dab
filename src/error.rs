//! Error types for fast-to-sql.
//!
//! Errors are layered the same way the loader is:
//! - [`ValidationError`] is raised before anything touches the database
//! - [`DriverError`] is what an [`SqlExecutor`](crate::connection::SqlExecutor)
//!   reports, already classified into a [`DriverErrorKind`]
//! - [`LoadError`] is what callers of [`load`](crate::load::load) see
//!
//! [`ConnectionError`] covers opening and configuring a SQL Server connection.

use thiserror::Error;

/// Input problems detected before any statement is sent.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Two or more columns collapse to the same identifier (case-insensitive).
    #[error(
        "There are duplicate column names. Repeated names are: {0:?}. SQL Server dialect requires unique names (case insensitive)."
    )]
    DuplicateColumns(Vec<String>),

    /// A custom type override names a column that is not in the input.
    #[error("Custom column {0} is not in the dataframe.")]
    CustomColumnNotFound(String),

    /// The `if_exists` policy string is not one of `append`, `fail`, `replace`.
    #[error("Incorrect parameter value {0} for 'if_exists'. Can be 'append', 'fail', or 'replace'")]
    InvalidPolicy(String),

    /// The input has no columns to create a table from.
    #[error("Input has no columns")]
    EmptyInput,

    /// Record batches of one input disagree on their schema.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),
}

/// Category of a driver failure, as decided by the driver's translation function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverErrorKind {
    /// The statement tried to create an object that already exists.
    ObjectAlreadyExists,
    /// The connection itself is unusable (IO, TLS, login, routing).
    Connection,
    /// Any other server or client error.
    Other,
}

/// An error reported by an [`SqlExecutor`](crate::connection::SqlExecutor).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DriverError {
    /// Classified category of the failure.
    pub kind: DriverErrorKind,
    /// Driver message, kept verbatim.
    pub message: String,
}

impl DriverError {
    /// Create a driver error of the given kind.
    pub fn new(kind: DriverErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Shorthand for an unclassified error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Other, message)
    }

    /// Shorthand for a connection-level error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::new(DriverErrorKind::Connection, message)
    }

    /// Whether this is the "object already exists" condition.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        self.kind == DriverErrorKind::ObjectAlreadyExists
    }
}

/// Errors raised while configuring or opening a SQL Server connection.
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// A connection parameter has an unusable value
    #[error("Invalid connection parameter '{parameter}': {message}")]
    InvalidParameter { parameter: String, message: String },

    /// A required connection parameter was not supplied
    #[error("Missing connection parameter: {0}")]
    MissingParameter(String),

    /// TCP connect, TLS handshake or login failed
    #[error("Failed to connect to {addr}: {message}")]
    ConnectionFailed { addr: String, message: String },

    /// Closing the connection failed
    #[error("Failed to close connection: {0}")]
    CloseFailed(String),
}

/// Errors that can occur while loading a table.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Invalid input, detected before any mutation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Target exists and the policy is `fail`, or a concurrent caller created it first
    #[error("{target} already exists")]
    AlreadyExists {
        /// Human readable target, e.g. `Table [dbo].[t]`
        target: String,
    },

    /// The connection cannot be used
    #[error("Connection error: {0}")]
    Connection(String),

    /// Default schema or catalog lookup failed
    #[error("Catalog query failed: {0}")]
    CatalogQuery(String),

    /// Drop, create or insert failed
    #[error("SQL execution failed: {0}")]
    Execution(String),

    /// A cell could not be converted to a SQL value
    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl LoadError {
    /// Map a driver error raised by a catalog lookup.
    pub(crate) fn catalog(err: DriverError) -> Self {
        match err.kind {
            DriverErrorKind::Connection => LoadError::Connection(err.message),
            _ => LoadError::CatalogQuery(err.message),
        }
    }

    /// Map a driver error raised by DDL or DML.
    pub(crate) fn execution(err: DriverError) -> Self {
        match err.kind {
            DriverErrorKind::Connection => LoadError::Connection(err.message),
            _ => LoadError::Execution(err.message),
        }
    }
}

impl From<ConnectionError> for LoadError {
    fn from(err: ConnectionError) -> Self {
        LoadError::Connection(err.to_string())
    }
}

impl From<::arrow::error::ArrowError> for LoadError {
    fn from(err: ::arrow::error::ArrowError) -> Self {
        LoadError::Conversion(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_columns_message() {
        let err = ValidationError::DuplicateColumns(vec!["[t1]".to_string(), "[t1]".to_string()]);
        assert_eq!(
            err.to_string(),
            "There are duplicate column names. Repeated names are: [\"[t1]\", \"[t1]\"]. \
             SQL Server dialect requires unique names (case insensitive)."
        );
    }

    #[test]
    fn test_custom_column_message() {
        let err = ValidationError::CustomColumnNotFound("fail".to_string());
        assert_eq!(err.to_string(), "Custom column fail is not in the dataframe.");
    }

    #[test]
    fn test_driver_connection_errors_stay_connection_errors() {
        let err = DriverError::connection("socket closed");
        assert!(matches!(LoadError::catalog(err.clone()), LoadError::Connection(_)));
        assert!(matches!(LoadError::execution(err), LoadError::Connection(_)));
    }

    #[test]
    fn test_already_exists_is_not_catalog_absence() {
        let err = DriverError::new(DriverErrorKind::ObjectAlreadyExists, "exists");
        assert!(err.is_already_exists());
        assert!(matches!(LoadError::catalog(err), LoadError::CatalogQuery(_)));
    }

    #[test]
    fn test_connection_error_converts_to_load_error() {
        let err = ConnectionError::ConnectionFailed {
            addr: "localhost:1433".to_string(),
            message: "refused".to_string(),
        };
        let load: LoadError = err.into();
        assert!(matches!(load, LoadError::Connection(ref m) if m.contains("localhost:1433")));
    }

    #[test]
    fn test_validation_is_transparent() {
        let err: LoadError = ValidationError::EmptyInput.into();
        assert_eq!(err.to_string(), "Input has no columns");
    }
}
