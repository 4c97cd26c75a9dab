//! Target table references and schema resolution.

use std::fmt;

use crate::connection::SqlExecutor;
use crate::error::LoadError;
use crate::types::{quote_identifier, with_temp_marker};

/// A resolved load target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetRef {
    /// Schema the table lives in. Unused in SQL for temporary tables.
    pub schema: String,
    /// Table name, including the `#` marker for temporary tables.
    pub table: String,
    /// Whether the table is session-scoped.
    pub temporary: bool,
}

impl TargetRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>, temporary: bool) -> Self {
        let table = table.into();
        Self {
            schema: schema.into(),
            table: with_temp_marker(&table, temporary),
            temporary,
        }
    }

    /// Bracket-quoted name as used in DDL and DML.
    ///
    /// Temporary tables are never schema-qualified.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.temporary {
            quote_identifier(&self.table)
        } else {
            format!(
                "{}.{}",
                quote_identifier(&self.schema),
                quote_identifier(&self.table)
            )
        }
    }
}

impl fmt::Display for TargetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.temporary {
            write!(f, "Temp table {}", self.qualified_name())
        } else {
            write!(f, "Table {}", self.qualified_name())
        }
    }
}

/// Split a possibly dotted table reference into schema and table.
///
/// The schema is everything before the first `.`; the table is everything
/// after it, so `a.b.c` yields schema `a` and table `b.c`.
///
/// # Example
///
/// ```
/// use fast_to_sql::query::split_table_reference;
///
/// assert_eq!(split_table_reference("dbo.mytable"), (Some("dbo"), "mytable"));
/// assert_eq!(split_table_reference("mytable"), (None, "mytable"));
/// ```
#[must_use]
pub fn split_table_reference(name: &str) -> (Option<&str>, &str) {
    match name.split_once('.') {
        Some((schema, table)) => (Some(schema), table),
        None => (None, name),
    }
}

/// Resolve a table reference into `(schema, table)`.
///
/// Unqualified names, and names with an empty schema part, take the
/// session's default schema from the executor.
///
/// # Errors
///
/// Returns `LoadError::CatalogQuery` (or `LoadError::Connection`) if the
/// default schema lookup fails.
pub async fn resolve_schema<E>(executor: &mut E, name: &str) -> Result<(String, String), LoadError>
where
    E: SqlExecutor + ?Sized,
{
    let (schema, table) = split_table_reference(name);

    let schema = match schema {
        Some(schema) if !schema.is_empty() => schema.to_string(),
        _ => {
            let schema = executor
                .default_schema()
                .await
                .map_err(LoadError::catalog)?;
            tracing::debug!(schema = %schema, "resolved default schema");
            schema
        }
    };

    Ok((schema, table.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_table_reference("dbo.test"), (Some("dbo"), "test"));
    }

    #[test]
    fn test_split_unqualified() {
        assert_eq!(split_table_reference("test"), (None, "test"));
    }

    #[test]
    fn test_split_multiple_dots_keeps_rest_as_table() {
        assert_eq!(split_table_reference("sales.q1.2024"), (Some("sales"), "q1.2024"));
    }

    #[test]
    fn test_split_leading_dot() {
        assert_eq!(split_table_reference(".test"), (Some(""), "test"));
    }

    #[test]
    fn test_qualified_name() {
        let target = TargetRef::new("dbo", "test3", false);
        assert_eq!(target.qualified_name(), "[dbo].[test3]");
    }

    #[test]
    fn test_temporary_target_gets_marker_and_no_schema() {
        let target = TargetRef::new("dbo", "seriesTest", true);
        assert_eq!(target.table, "#seriesTest");
        assert_eq!(target.qualified_name(), "[#seriesTest]");

        let target = TargetRef::new("dbo", "#already", true);
        assert_eq!(target.table, "#already");
    }

    #[test]
    fn test_display() {
        assert_eq!(
            TargetRef::new("dbo", "t", false).to_string(),
            "Table [dbo].[t]"
        );
        assert_eq!(
            TargetRef::new("dbo", "t", true).to_string(),
            "Temp table [#t]"
        );
    }
}
