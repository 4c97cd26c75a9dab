//! Shared helpers for integration tests.
//!
//! Two kinds of tests use this module:
//! - scenario tests that run against [`MockExecutor`], an in-memory catalog
//!   that records every statement
//! - live tests marked `#[ignore]` that need a SQL Server reachable through
//!   `MSSQL_CONNECTION_STRING`

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Int64Array, RecordBatch, StringArray};
use async_trait::async_trait;
use fast_to_sql::connection::CONNECTION_STRING_ENV;
use fast_to_sql::{
    Connection, ConnectionError, DriverError, DriverErrorKind, SqlExecutor, SqlValue,
};

/// Skip a live test when no connection string is configured.
#[macro_export]
macro_rules! skip_if_no_mssql {
    () => {
        if std::env::var("MSSQL_CONNECTION_STRING").is_err() {
            eprintln!("MSSQL_CONNECTION_STRING not set, skipping");
            return;
        }
    };
}

/// Open a live connection from `MSSQL_CONNECTION_STRING`.
pub async fn get_test_connection() -> Result<Connection, ConnectionError> {
    Connection::from_env().await
}

/// Whether a live server is configured.
pub fn mssql_available() -> bool {
    std::env::var(CONNECTION_STRING_ENV).is_ok()
}

/// Unique table name per test run.
pub fn generate_test_table_name(prefix: &str) -> String {
    static COUNTER: AtomicU32 = AtomicU32::new(0);
    let n = COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{prefix}_{}_{n}", std::process::id())
}

/// The three-column table used across scenarios: int, text, bool.
pub fn sample_batch() -> RecordBatch {
    RecordBatch::try_from_iter(vec![
        ("A", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
        (
            "B",
            Arc::new(StringArray::from(vec![Some("hello's"), Some("My"), None])) as ArrayRef,
        ),
        (
            "C",
            Arc::new(BooleanArray::from(vec![true, false, false])) as ArrayRef,
        ),
    ])
    .expect("valid sample batch")
}

/// In-memory stand-in for a SQL Server session.
///
/// Tracks which tables exist (by bracket-quoted name) and how many rows each
/// holds, and records every statement with its parameters.
#[derive(Debug)]
pub struct MockExecutor {
    pub default_schema: String,
    pub tables: HashMap<String, usize>,
    pub statements: Vec<(String, Vec<SqlValue>)>,
    pub schema_lookups: usize,
    /// Report "not found" from the catalog for tables that do exist.
    pub hide_existing: bool,
    /// Fail any statement containing the key with the given error.
    pub failures: Vec<(String, DriverError)>,
}

impl Default for MockExecutor {
    fn default() -> Self {
        Self {
            default_schema: "dbo".to_string(),
            tables: HashMap::new(),
            statements: Vec::new(),
            schema_lookups: 0,
            hide_existing: false,
            failures: Vec::new(),
        }
    }
}

impl MockExecutor {
    pub fn with_default_schema(schema: &str) -> Self {
        Self {
            default_schema: schema.to_string(),
            ..Default::default()
        }
    }

    /// Pretend `qualified` already exists with `rows` rows.
    pub fn with_table(mut self, qualified: &str, rows: usize) -> Self {
        self.tables.insert(qualified.to_string(), rows);
        self
    }

    pub fn fail_on(mut self, needle: &str, err: DriverError) -> Self {
        self.failures.push((needle.to_string(), err));
        self
    }

    pub fn row_count(&self, qualified: &str) -> Option<usize> {
        self.tables.get(qualified).copied()
    }

    pub fn sql(&self) -> Vec<&str> {
        self.statements.iter().map(|(sql, _)| sql.as_str()).collect()
    }

    fn check_failures(&self, sql: &str) -> Result<(), DriverError> {
        match self.failures.iter().find(|(needle, _)| sql.contains(needle.as_str())) {
            Some((_, err)) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// Pull the quoted value following `marker` out of a catalog query.
fn literal_after(sql: &str, marker: &str) -> Option<String> {
    let start = sql.find(marker)? + marker.len();
    let rest = &sql[start..];
    let mut value = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                value.push('\'');
                continue;
            }
            return Some(value);
        }
        value.push(c);
    }
    None
}

#[async_trait]
impl SqlExecutor for MockExecutor {
    async fn default_schema(&mut self) -> Result<String, DriverError> {
        self.check_failures("SCHEMA_NAME()")?;
        self.schema_lookups += 1;
        Ok(self.default_schema.clone())
    }

    async fn query_scalar(&mut self, sql: &str) -> Result<Option<i64>, DriverError> {
        self.check_failures(sql)?;
        self.statements.push((sql.to_string(), Vec::new()));

        let key = if let Some(name) = literal_after(sql, "OBJECT_ID('tempdb..") {
            name
        } else {
            let table = literal_after(sql, "TABLE_NAME = '")
                .ok_or_else(|| DriverError::other(format!("unexpected query: {sql}")))?;
            let schema = literal_after(sql, "TABLE_SCHEMA = '")
                .ok_or_else(|| DriverError::other(format!("unexpected query: {sql}")))?;
            format!("[{schema}].[{table}]")
        };

        let exists = !self.hide_existing && self.tables.contains_key(&key);
        Ok(Some(i64::from(exists)))
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DriverError> {
        self.check_failures(sql)?;
        self.statements.push((sql.to_string(), params.to_vec()));

        if let Some(rest) = sql.strip_prefix("create table ") {
            let name = rest.lines().next().unwrap_or_default().to_string();
            if self.tables.contains_key(&name) {
                return Err(DriverError::new(
                    DriverErrorKind::ObjectAlreadyExists,
                    format!("There is already an object named '{name}' in the database."),
                ));
            }
            self.tables.insert(name, 0);
            return Ok(0);
        }

        if let Some(name) = sql.strip_prefix("drop table ") {
            return match self.tables.remove(name) {
                Some(_) => Ok(0),
                None => Err(DriverError::other(format!(
                    "Cannot drop the table '{name}', because it does not exist"
                ))),
            };
        }

        if let Some(rest) = sql.strip_prefix("insert into ") {
            let (name, values) = rest
                .split_once(" values ")
                .ok_or_else(|| DriverError::other("malformed insert"))?;
            let rows = values.matches("),(").count() + 1;
            let count = self
                .tables
                .get_mut(name)
                .ok_or_else(|| DriverError::other(format!("Invalid object name '{name}'")))?;
            *count += rows;
            return Ok(rows as u64);
        }

        Ok(0)
    }
}
