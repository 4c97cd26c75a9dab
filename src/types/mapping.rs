//! Type mapping between Apache Arrow and SQL Server column types.

use arrow::datatypes::{DataType, Field};
use serde::{Deserialize, Serialize};

use super::identifier::sanitize_column_name;
use crate::error::ValidationError;

/// Column name handling mode for DDL generation.
///
/// Controls how column names from the input schema are turned into
/// SQL Server identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColumnNameMode {
    /// Sanitize names into bracket-quoted identifiers.
    ///
    /// Example: `my Column` becomes `[my_Column]`
    #[default]
    Sanitize,

    /// Use names exactly as given.
    ///
    /// For callers that already provide valid identifiers,
    /// e.g. `[My Special Col]` or `BCol`.
    Verbatim,
}

impl ColumnNameMode {
    /// Turn a source column name into an identifier according to this mode.
    #[must_use]
    pub fn format(self, name: &str) -> String {
        match self {
            ColumnNameMode::Sanitize => sanitize_column_name(name),
            ColumnNameMode::Verbatim => name.to_string(),
        }
    }
}

/// Native element type of an input column.
///
/// This is a closed set; every Arrow type classifies into exactly one tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Int64,
    Int32,
    Int16,
    Int8,
    Float,
    Boolean,
    DateTime,
    Text,
    /// Anything without a dedicated mapping
    Other,
}

/// Mapping from native element types to SQL Server type strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlTypeMap {
    pub int64: String,
    pub int32: String,
    pub int16: String,
    pub int8: String,
    pub float: String,
    pub boolean: String,
    pub datetime: String,
    pub text: String,
    /// Fallback for types with no dedicated entry
    pub other: String,
}

impl SqlTypeMap {
    /// Look up the SQL type for a native type.
    #[must_use]
    pub fn sql_type(&self, native: NativeType) -> &str {
        match native {
            NativeType::Int64 => &self.int64,
            NativeType::Int32 => &self.int32,
            NativeType::Int16 => &self.int16,
            NativeType::Int8 => &self.int8,
            NativeType::Float => &self.float,
            NativeType::Boolean => &self.boolean,
            NativeType::DateTime => &self.datetime,
            NativeType::Text => &self.text,
            NativeType::Other => &self.other,
        }
    }

    /// Use `varchar(255)` for text columns instead of `nvarchar(255)`.
    #[must_use]
    pub fn with_varchar_text(mut self) -> Self {
        self.text = "varchar(255)".to_string();
        self
    }
}

impl Default for SqlTypeMap {
    fn default() -> Self {
        Self {
            int64: "bigint".to_string(),
            int32: "int".to_string(),
            int16: "smallint".to_string(),
            int8: "tinyint".to_string(),
            float: "float".to_string(),
            boolean: "bit".to_string(),
            datetime: "datetime2".to_string(),
            text: "nvarchar(255)".to_string(),
            other: "varchar(255)".to_string(),
        }
    }
}

/// A source column prepared for type mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Name as it appears in the input schema.
    pub original_name: String,
    /// Identifier used in SQL (sanitized or verbatim).
    pub identifier: String,
    /// Classified native element type.
    pub native_type: NativeType,
    /// Arrow data type of the column.
    pub data_type: DataType,
}

impl ColumnDescriptor {
    /// Build a descriptor from an Arrow field.
    #[must_use]
    pub fn from_field(field: &Field, mode: ColumnNameMode) -> Self {
        Self {
            original_name: field.name().clone(),
            identifier: mode.format(field.name()),
            native_type: TypeMapper::classify(field.data_type()),
            data_type: field.data_type().clone(),
        }
    }
}

/// A resolved column definition, in table order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDefinition {
    /// Column identifier as written in DDL.
    pub identifier: String,
    /// SQL type clause, inferred or overridden.
    pub sql_type: String,
}

impl ColumnDefinition {
    pub fn new(identifier: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            sql_type: sql_type.into(),
        }
    }
}

/// Type mapper for converting Arrow columns to SQL Server column types.
#[derive(Debug, Clone, Default)]
pub struct TypeMapper {
    types: SqlTypeMap,
}

impl TypeMapper {
    /// Create a mapper over the given type map.
    #[must_use]
    pub fn new(types: SqlTypeMap) -> Self {
        Self { types }
    }

    /// The type map in use.
    #[must_use]
    pub fn types(&self) -> &SqlTypeMap {
        &self.types
    }

    /// Classify an Arrow data type into a native type tag.
    #[must_use]
    pub fn classify(data_type: &DataType) -> NativeType {
        match data_type {
            DataType::Int64 => NativeType::Int64,
            DataType::Int32 => NativeType::Int32,
            DataType::Int16 => NativeType::Int16,
            DataType::Int8 => NativeType::Int8,
            DataType::Float16 | DataType::Float32 | DataType::Float64 => NativeType::Float,
            DataType::Boolean => NativeType::Boolean,
            DataType::Timestamp(_, _) | DataType::Date32 | DataType::Date64 => {
                NativeType::DateTime
            }
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => NativeType::Text,
            _ => NativeType::Other,
        }
    }

    /// Normalize custom type overrides and check them against the columns.
    ///
    /// Override keys go through the same [`ColumnNameMode`] as the columns.
    /// When several keys name the same column, the last one wins.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::CustomColumnNotFound` with the caller's
    /// original key for the first key that matches no column.
    pub fn resolve_overrides(
        columns: &[ColumnDescriptor],
        overrides: &[(String, String)],
        mode: ColumnNameMode,
    ) -> Result<Vec<(String, String)>, ValidationError> {
        let mut resolved: Vec<(String, String)> = Vec::with_capacity(overrides.len());
        for (key, sql_type) in overrides {
            let identifier = mode.format(key);
            if !columns.iter().any(|c| c.identifier == identifier) {
                return Err(ValidationError::CustomColumnNotFound(key.clone()));
            }
            match resolved.iter_mut().find(|(existing, _)| *existing == identifier) {
                Some(entry) => entry.1 = sql_type.clone(),
                None => resolved.push((identifier, sql_type.clone())),
            }
        }
        Ok(resolved)
    }

    /// Compute the SQL type of every column, in column order.
    ///
    /// `overrides` maps column identifiers to literal type clauses and must
    /// already be normalized (see [`TypeMapper::resolve_overrides`]). An
    /// override is used verbatim; otherwise the type map decides.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::CustomColumnNotFound` if an override key is
    /// not one of the column identifiers.
    pub fn infer_types(
        &self,
        columns: &[ColumnDescriptor],
        overrides: &[(String, String)],
    ) -> Result<Vec<ColumnDefinition>, ValidationError> {
        if let Some((key, _)) = overrides
            .iter()
            .find(|(key, _)| !columns.iter().any(|c| &c.identifier == key))
        {
            return Err(ValidationError::CustomColumnNotFound(key.clone()));
        }

        Ok(columns
            .iter()
            .map(|col| {
                let sql_type = overrides
                    .iter()
                    .rfind(|(key, _)| key == &col.identifier)
                    .map(|(_, sql_type)| sql_type.clone())
                    .unwrap_or_else(|| self.types.sql_type(col.native_type).to_string());
                ColumnDefinition::new(col.identifier.clone(), sql_type)
            })
            .collect())
    }
}
