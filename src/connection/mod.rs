//! Database access for the loader.
//!
//! The loader never talks to a driver directly. It goes through the
//! [`SqlExecutor`] trait, which a SQL Server connection implements in
//! [`mssql`]. Tests and alternative drivers can supply their own executor.
//!

pub mod mssql;
pub mod params;

use async_trait::async_trait;

use crate::error::DriverError;
use crate::types::SqlValue;

pub use mssql::{classify_mssql_error, Connection};
pub use params::{ConnectionBuilder, ConnectionParams, CONNECTION_STRING_ENV};

/// Query returning the session's default schema.
pub const DEFAULT_SCHEMA_QUERY: &str = "SELECT SCHEMA_NAME()";

/// Minimal statement execution surface the loader needs.
///
/// Implementations translate their native errors into a [`DriverError`]
/// whose kind tells the loader whether a failure means "object already
/// exists", an unusable connection, or anything else.
#[async_trait]
pub trait SqlExecutor: Send {
    /// Return the default schema of the current session.
    async fn default_schema(&mut self) -> Result<String, DriverError>;

    /// Run a query and return the first column of its first row as an integer.
    ///
    /// Returns `None` if the query produced no rows.
    async fn query_scalar(&mut self, sql: &str) -> Result<Option<i64>, DriverError>;

    /// Execute a statement with positional parameters `@P1..@Pn`.
    ///
    /// Returns the number of affected rows as reported by the server.
    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DriverError>;
}
