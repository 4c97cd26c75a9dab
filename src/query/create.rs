//! CREATE TABLE and DROP TABLE statement generation.

use super::target::TargetRef;
use crate::types::ColumnDefinition;

/// Generate a CREATE TABLE statement.
///
/// The output is byte-stable: column definitions appear in the given order,
/// one per line, each indented with a single tab.
///
/// # Example
///
/// ```
/// use fast_to_sql::query::{generate_create, TargetRef};
/// use fast_to_sql::types::ColumnDefinition;
///
/// let ddl = generate_create(
///     &TargetRef::new("dbo", "test3", false),
///     &[
///         ColumnDefinition::new("[A]", "bigint"),
///         ColumnDefinition::new("[B]", "nvarchar(255)"),
///     ],
/// );
/// assert_eq!(ddl, "create table [dbo].[test3]\n(\n\t[A] bigint,\n\t[B] nvarchar(255)\n)");
/// ```
#[must_use]
pub fn generate_create(target: &TargetRef, columns: &[ColumnDefinition]) -> String {
    let column_defs: Vec<String> = columns
        .iter()
        .map(|col| format!("\n\t{} {}", col.identifier, col.sql_type))
        .collect();

    format!(
        "create table {}\n({}\n)",
        target.qualified_name(),
        column_defs.join(",")
    )
}

/// Generate a DROP TABLE statement for the target.
#[must_use]
pub fn generate_drop(target: &TargetRef) -> String {
    format!("drop table {}", target.qualified_name())
}
