//! Type mapping between Arrow data and SQL Server columns.

mod identifier;
mod mapping;
mod value;

pub use identifier::{
    clean_table_name, escape_literal, quote_identifier, sanitize_column_name, with_temp_marker,
    TEMP_TABLE_PREFIX,
};
pub use mapping::{
    ColumnDefinition, ColumnDescriptor, ColumnNameMode, NativeType, SqlTypeMap, TypeMapper,
};
pub use value::{batch_rows, column_values, SqlValue};
