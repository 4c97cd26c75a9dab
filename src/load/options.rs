//! Load options and the existing-table policy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{ColumnNameMode, SqlTypeMap};

/// Default number of rows requested per insert statement.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// What to do when the target table already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IfExists {
    /// Insert into the existing table without touching its structure
    #[default]
    Append,
    /// Drop the table and create it again
    Replace,
    /// Refuse to load
    Fail,
}

impl IfExists {
    pub fn as_str(&self) -> &'static str {
        match self {
            IfExists::Append => "append",
            IfExists::Replace => "replace",
            IfExists::Fail => "fail",
        }
    }
}

impl fmt::Display for IfExists {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IfExists {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "append" => Ok(IfExists::Append),
            "replace" => Ok(IfExists::Replace),
            "fail" => Ok(IfExists::Fail),
            other => Err(ValidationError::InvalidPolicy(other.to_string())),
        }
    }
}

/// How row values reach the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsertMode {
    /// Bind values as `@P1..@Pn` parameters
    #[default]
    Parameterized,
    /// Embed values as SQL literals
    Literal,
}

/// Options for loading a table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoadOptions {
    /// Policy when the target exists (default: append).
    pub if_exists: IfExists,

    /// Column name to literal SQL type clause, e.g. `"INT PRIMARY KEY"`.
    pub overrides: Vec<(String, String)>,

    /// Load into a session-scoped `#` table (default: false).
    pub temporary: bool,

    /// Sanitize column names into bracket identifiers (default: true).
    pub clean_cols: bool,

    /// Rows requested per insert statement (default: 1000).
    pub batch_size: usize,

    /// Parameter binding or literal values (default: parameterized).
    pub insert_mode: InsertMode,

    /// Native type to SQL type mapping.
    pub type_map: SqlTypeMap,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            if_exists: IfExists::Append,
            overrides: Vec::new(),
            temporary: false,
            clean_cols: true,
            batch_size: DEFAULT_BATCH_SIZE,
            insert_mode: InsertMode::Parameterized,
            type_map: SqlTypeMap::default(),
        }
    }
}

impl LoadOptions {
    /// Create new load options with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the existing-table policy.
    #[must_use]
    pub fn if_exists(mut self, policy: IfExists) -> Self {
        self.if_exists = policy;
        self
    }

    /// Set the existing-table policy from its string form.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPolicy` unless `policy` is one of
    /// `append`, `replace` or `fail`.
    pub fn if_exists_str(self, policy: &str) -> Result<Self, ValidationError> {
        Ok(self.if_exists(policy.parse()?))
    }

    /// Override the SQL type of one column.
    #[must_use]
    pub fn with_override(mut self, column: impl Into<String>, sql_type: impl Into<String>) -> Self {
        self.overrides.push((column.into(), sql_type.into()));
        self
    }

    /// Replace all column type overrides.
    #[must_use]
    pub fn overrides<I, K, V>(mut self, overrides: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.overrides = overrides
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self
    }

    /// Load into a temporary table.
    #[must_use]
    pub fn temporary(mut self, temporary: bool) -> Self {
        self.temporary = temporary;
        self
    }

    /// Enable or disable column name sanitization.
    #[must_use]
    pub fn clean_cols(mut self, clean: bool) -> Self {
        self.clean_cols = clean;
        self
    }

    /// Set the requested rows per insert statement.
    ///
    /// The effective value is capped by SQL Server's row and parameter limits.
    #[must_use]
    pub fn batch_size(mut self, rows: usize) -> Self {
        self.batch_size = rows;
        self
    }

    #[must_use]
    pub fn insert_mode(mut self, mode: InsertMode) -> Self {
        self.insert_mode = mode;
        self
    }

    /// Use a custom type mapping.
    #[must_use]
    pub fn type_map(mut self, types: SqlTypeMap) -> Self {
        self.type_map = types;
        self
    }

    /// Column naming mode implied by `clean_cols`.
    #[must_use]
    pub fn column_name_mode(&self) -> ColumnNameMode {
        if self.clean_cols {
            ColumnNameMode::Sanitize
        } else {
            ColumnNameMode::Verbatim
        }
    }
}
