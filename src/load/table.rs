//! Tabular input for the loader.

use std::sync::Arc;

use arrow::array::{ArrayRef, RecordBatch};
use arrow::datatypes::{Field, Schema, SchemaRef};

use crate::error::{LoadError, ValidationError};
use crate::types::{ColumnDescriptor, ColumnNameMode};

/// Column name given to a single array loaded without a name.
pub const DEFAULT_SERIES_NAME: &str = "0";

/// Tabular data to load: one Arrow schema and the record batches sharing it.
#[derive(Debug, Clone)]
pub struct TabularInput {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl TabularInput {
    /// Create an input from a schema and batches.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::SchemaMismatch` if any batch's fields differ
    /// from `schema` in name or type.
    pub fn new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self, ValidationError> {
        for (idx, batch) in batches.iter().enumerate() {
            let batch_schema = batch.schema();
            let same = batch_schema.fields().len() == schema.fields().len()
                && batch_schema
                    .fields()
                    .iter()
                    .zip(schema.fields().iter())
                    .all(|(a, b)| a.name() == b.name() && a.data_type() == b.data_type());
            if !same {
                return Err(ValidationError::SchemaMismatch(format!(
                    "batch {idx} has columns {:?}, expected {:?}",
                    field_names(&batch_schema),
                    field_names(&schema)
                )));
            }
        }

        Ok(Self { schema, batches })
    }

    /// Create an input from batches; the first batch defines the schema.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyInput` if `batches` is empty, or
    /// `ValidationError::SchemaMismatch` if the batches disagree.
    pub fn from_batches(batches: Vec<RecordBatch>) -> Result<Self, ValidationError> {
        let schema = batches
            .first()
            .map(RecordBatch::schema)
            .ok_or(ValidationError::EmptyInput)?;
        Self::new(schema, batches)
    }

    /// Load a single array as a one-column table named `0`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Conversion` if Arrow rejects the batch.
    pub fn from_array(array: ArrayRef) -> Result<Self, LoadError> {
        Self::from_named_array(DEFAULT_SERIES_NAME, array)
    }

    /// Load a single array as a one-column table.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Conversion` if Arrow rejects the batch.
    pub fn from_named_array(name: &str, array: ArrayRef) -> Result<Self, LoadError> {
        let schema = Arc::new(Schema::new(vec![Field::new(
            name,
            array.data_type().clone(),
            true,
        )]));
        let batch = RecordBatch::try_new(Arc::clone(&schema), vec![array])?;
        Ok(Self {
            schema,
            batches: vec![batch],
        })
    }

    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    /// Describe the columns for DDL, checking they can form a table.
    ///
    /// Identifiers are compared case-insensitively; every occurrence of a
    /// repeated identifier is reported, lowercased.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyInput` for a schema without columns and
    /// `ValidationError::DuplicateColumns` for colliding identifiers.
    pub fn describe_columns(
        &self,
        mode: ColumnNameMode,
    ) -> Result<Vec<ColumnDescriptor>, ValidationError> {
        if self.schema.fields().is_empty() {
            return Err(ValidationError::EmptyInput);
        }

        let columns: Vec<ColumnDescriptor> = self
            .schema
            .fields()
            .iter()
            .map(|field| ColumnDescriptor::from_field(field, mode))
            .collect();

        let lowered: Vec<String> = columns
            .iter()
            .map(|c| c.identifier.to_lowercase())
            .collect();
        let duplicates: Vec<String> = lowered
            .iter()
            .filter(|name| lowered.iter().filter(|other| other == name).count() > 1)
            .cloned()
            .collect();
        if !duplicates.is_empty() {
            return Err(ValidationError::DuplicateColumns(duplicates));
        }

        Ok(columns)
    }
}

impl From<RecordBatch> for TabularInput {
    fn from(batch: RecordBatch) -> Self {
        Self {
            schema: batch.schema(),
            batches: vec![batch],
        }
    }
}

fn field_names(schema: &Schema) -> Vec<&str> {
    schema.fields().iter().map(|f| f.name().as_str()).collect()
}
