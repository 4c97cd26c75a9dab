//! SQL statement generation and catalog lookups.
//!
//! The query module is organized into:
//! - `target` - target table references and schema resolution
//! - `create` - CREATE TABLE / DROP TABLE generation
//! - `exists` - table existence checks against the catalog
//! - `insert` - multi-row INSERT generation and batch sizing

pub mod create;
pub mod exists;
pub mod insert;
pub mod target;

pub use create::{generate_create, generate_drop};
pub use exists::{check_exists, exists_query};
pub use insert::{rows_per_batch, InsertQuery, MAX_INSERT_PARAMETERS, MAX_ROWS_PER_INSERT};
pub use target::{resolve_schema, split_table_reference, TargetRef};
