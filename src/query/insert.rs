//! INSERT statement generation.
//!
//! Rows are sent as multi-row `VALUES` lists. SQL Server accepts at most
//! 1000 row constructors per `VALUES` list and 2100 parameters per request,
//! two of which `sp_executesql` takes for itself.

use super::target::TargetRef;
use crate::types::SqlValue;

/// Maximum row constructors in a single `VALUES` list.
pub const MAX_ROWS_PER_INSERT: usize = 1000;

/// Maximum bound parameters available to one parameterized insert.
pub const MAX_INSERT_PARAMETERS: usize = 2098;

/// Number of rows that fit in one insert statement.
///
/// Never more than `requested`, [`MAX_ROWS_PER_INSERT`] or what
/// [`MAX_INSERT_PARAMETERS`] allows for `column_count` columns, and never
/// less than one.
#[must_use]
pub fn rows_per_batch(column_count: usize, requested: usize) -> usize {
    let by_parameters = MAX_INSERT_PARAMETERS / column_count.max(1);
    requested.min(MAX_ROWS_PER_INSERT).min(by_parameters).max(1)
}

/// Builder for multi-row INSERT statements against one target.
#[derive(Debug, Clone)]
pub struct InsertQuery {
    /// Bracket-quoted target name
    table: String,
    /// Number of values per row
    column_count: usize,
}

impl InsertQuery {
    /// Create an insert builder for `column_count` columns of `target`.
    pub fn new(target: &TargetRef, column_count: usize) -> Self {
        Self {
            table: target.qualified_name(),
            column_count,
        }
    }

    /// Number of values per row.
    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    /// Build a parameterized insert for `rows` rows.
    ///
    /// Placeholders are numbered row-major: `(@P1,@P2),(@P3,@P4)`.
    #[must_use]
    pub fn parameterized(&self, rows: usize) -> String {
        let mut sql = self.prefix();
        let mut param = 1;

        for row in 0..rows {
            if row > 0 {
                sql.push(',');
            }
            sql.push('(');
            for col in 0..self.column_count {
                if col > 0 {
                    sql.push(',');
                }
                sql.push_str("@P");
                sql.push_str(&param.to_string());
                param += 1;
            }
            sql.push(')');
        }

        sql
    }

    /// Build an insert with the values embedded as literals.
    ///
    /// NULLs are written as the `NULL` keyword.
    #[must_use]
    pub fn literal(&self, rows: &[Vec<SqlValue>]) -> String {
        let mut sql = self.prefix();

        for (idx, row) in rows.iter().enumerate() {
            if idx > 0 {
                sql.push(',');
            }
            sql.push('(');
            let values: Vec<String> = row.iter().map(SqlValue::to_literal).collect();
            sql.push_str(&values.join(","));
            sql.push(')');
        }

        sql
    }

    fn prefix(&self) -> String {
        format!("insert into {} values ", self.table)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NativeType;

    #[test]
    fn test_parameterized_single_row() {
        let query = InsertQuery::new(&TargetRef::new("dbo", "test_table2", false), 3);
        assert_eq!(
            query.parameterized(1),
            "insert into [dbo].[test_table2] values (@P1,@P2,@P3)"
        );
    }

    #[test]
    fn test_parameterized_multi_row_numbering() {
        let query = InsertQuery::new(&TargetRef::new("dbo", "t", false), 2);
        assert_eq!(
            query.parameterized(3),
            "insert into [dbo].[t] values (@P1,@P2),(@P3,@P4),(@P5,@P6)"
        );
    }

    #[test]
    fn test_parameterized_temp_table() {
        let query = InsertQuery::new(&TargetRef::new("dbo", "seriesTest", true), 1);
        assert_eq!(query.parameterized(1), "insert into [#seriesTest] values (@P1)");
    }

    #[test]
    fn test_literal_insert_nulls() {
        let query = InsertQuery::new(&TargetRef::new("dbo", "t", false), 2);
        let sql = query.literal(&[
            vec![SqlValue::I64(1), SqlValue::Null(NativeType::Float)],
            vec![SqlValue::Null(NativeType::Int64), SqlValue::F64(4.3)],
        ]);
        assert_eq!(sql, "insert into [dbo].[t] values (1,NULL),(NULL,4.3e0)");
        assert!(!sql.contains("'NULL'"));
    }

    #[test]
    fn test_literal_insert_strings() {
        let query = InsertQuery::new(&TargetRef::new("dbo", "t", false), 2);
        let sql = query.literal(&[vec![
            SqlValue::Text("hello's".to_string()),
            SqlValue::Bool(true),
        ]]);
        assert_eq!(sql, "insert into [dbo].[t] values (N'hello''s',1)");
    }

    #[test]
    fn test_rows_per_batch_limits() {
        assert_eq!(rows_per_batch(3, 1000), 699);
        assert_eq!(rows_per_batch(1, 5000), MAX_ROWS_PER_INSERT);
        assert_eq!(rows_per_batch(2, 10), 10);
        assert_eq!(rows_per_batch(5000, 1000), 1);
        assert_eq!(rows_per_batch(3, 0), 1);
    }

    #[test]
    fn test_rows_per_batch_never_exceeds_parameter_limit() {
        for columns in 1..=300 {
            let rows = rows_per_batch(columns, 1000);
            assert!(rows * columns <= MAX_INSERT_PARAMETERS || rows == 1);
        }
    }
}
