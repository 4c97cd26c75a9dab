//! # fast-to-sql
//!
//! Load Apache Arrow data into Microsoft SQL Server tables.
//!
//! Given one or more Arrow `RecordBatch`es and a target table name, the
//! loader infers a SQL Server column type for every column, creates the
//! table (or appends to, replaces, or refuses an existing one), and inserts
//! the rows in batched multi-row `INSERT` statements.
//!
//! ## Features
//!
//! - **Type inference**: Arrow types map to `bigint`, `int`, `float`, `bit`,
//!   `datetime2`, `nvarchar(255)` and friends, with per-column overrides
//! - **Identifier sanitization**: column names become bracket identifiers
//! - **Existing-table policy**: `append`, `replace` or `fail`
//! - **Temporary tables**: session-scoped `#` tables
//! - **Batched inserts**: parameterized or literal, sized to SQL Server limits
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use arrow::array::{Float64Array, Int64Array, RecordBatch, StringArray};
//! use fast_to_sql::*;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let batch = RecordBatch::try_from_iter(vec![
//!     ("id", Arc::new(Int64Array::from(vec![1, 2, 3])) as _),
//!     ("unit price", Arc::new(Float64Array::from(vec![1.5, 2.0, 0.25])) as _),
//!     ("name", Arc::new(StringArray::from(vec!["a", "b", "c"])) as _),
//! ])?;
//!
//! let mut connection = Connection::builder()
//!     .host("localhost")
//!     .username("sa")
//!     .password("secret")
//!     .trust_cert(true)
//!     .connect()
//!     .await?;
//!
//! let options = LoadOptions::new()
//!     .if_exists(IfExists::Replace)
//!     .with_override("id", "INT PRIMARY KEY");
//!
//! let ddl = connection
//!     .load(&TabularInput::from(batch), "dbo.products", options)
//!     .await?;
//! println!("{ddl}");
//!
//! connection.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Custom executors
//!
//! The loader only needs the [`SqlExecutor`] trait. Anything that can run a
//! statement with `@P1..@Pn` parameters and answer a scalar query can be used
//! in place of [`Connection`]:
//!
//! ```no_run
//! use fast_to_sql::{load, LoadOptions, SqlExecutor, TabularInput};
//!
//! # async fn example<E: SqlExecutor>(executor: &mut E, input: TabularInput) -> Result<(), fast_to_sql::LoadError> {
//! let ddl = load(executor, &input, "staging.events", LoadOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod connection;
pub mod error;
pub mod load;
pub mod query;
pub mod types;

// =============================================================================
// Connection Types
// =============================================================================

/// Re-export the SQL Server connection and the executor seam.
pub use connection::{
    classify_mssql_error, Connection, ConnectionBuilder, ConnectionParams, SqlExecutor,
};

// =============================================================================
// Error Types
// =============================================================================

/// Re-export error types for convenient error handling.
pub use error::{ConnectionError, DriverError, DriverErrorKind, LoadError, ValidationError};

// =============================================================================
// Loading
// =============================================================================

/// Re-export the load entry points and options.
pub use load::{
    load, IfExists, InsertMode, LoadOptions, LoadReport, Loader, TableAction, TabularInput,
};

// =============================================================================
// Type System
// =============================================================================

/// Re-export type mapping and identifier utilities.
pub use types::{
    clean_table_name, sanitize_column_name, ColumnDefinition, NativeType, SqlTypeMap, SqlValue,
    TypeMapper,
};

// =============================================================================
// Query Builder Types
// =============================================================================

/// Statement builders for CREATE, DROP and INSERT.
///
/// ```
/// use fast_to_sql::query::{generate_create, InsertQuery, TargetRef};
/// use fast_to_sql::types::ColumnDefinition;
///
/// let target = TargetRef::new("dbo", "events", false);
/// let ddl = generate_create(&target, &[ColumnDefinition::new("[id]", "bigint")]);
/// assert_eq!(ddl, "create table [dbo].[events]\n(\n\t[id] bigint\n)");
///
/// let insert = InsertQuery::new(&target, 1).parameterized(2);
/// assert_eq!(insert, "insert into [dbo].[events] values (@P1),(@P2)");
/// ```
pub use query::{generate_create, generate_drop, InsertQuery, TargetRef};
