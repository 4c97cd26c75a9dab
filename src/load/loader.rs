//! Load orchestration.
//!
//! A load runs through these steps, stopping at the first error:
//!
//! 1. Validate: describe columns, reject duplicates, check overrides
//! 2. Resolve: split the target name, look up the default schema if needed
//! 3. Check whether the target exists
//! 4. Create, replace, append to, or refuse the target according to [`IfExists`]
//! 5. Insert rows in batches
//!
//! Everything in step 1 happens before any statement is sent.

use crate::connection::SqlExecutor;
use crate::error::{DriverError, LoadError};
use crate::query::{
    check_exists, generate_create, generate_drop, resolve_schema, rows_per_batch, InsertQuery,
    TargetRef,
};
use crate::types::{batch_rows, ColumnDefinition, SqlValue, TypeMapper};

use super::options::{IfExists, InsertMode, LoadOptions};
use super::table::TabularInput;

/// What happened to the target table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableAction {
    /// The table did not exist and was created
    Created,
    /// The table existed and was dropped and created again
    Replaced,
    /// The table existed and rows were added to it
    Appended,
}

/// Outcome of a successful load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadReport {
    /// CREATE TABLE statement that was executed; empty when appending.
    pub ddl: String,
    /// Number of rows sent to the server.
    pub rows_inserted: u64,
    pub action: TableAction,
    pub target: TargetRef,
}

/// Loads tabular data into SQL Server tables.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load `input` into the table `name` through `executor`.
    ///
    /// `name` may be schema qualified (`dbo.sales`). Unqualified names use
    /// the session's default schema.
    ///
    /// # Errors
    ///
    /// - `LoadError::Validation` for bad input, before anything is executed
    /// - `LoadError::AlreadyExists` if the table exists and the policy is
    ///   `fail`, or if another session created it between check and create
    /// - `LoadError::CatalogQuery` / `LoadError::Execution` for failed statements
    /// - `LoadError::Connection` if the connection is unusable
    /// - `LoadError::Conversion` if a cell cannot be read
    #[tracing::instrument(level = "debug", skip_all, fields(name = %name))]
    pub async fn run<E>(
        &self,
        executor: &mut E,
        input: &TabularInput,
        name: &str,
    ) -> Result<LoadReport, LoadError>
    where
        E: SqlExecutor + ?Sized,
    {
        let options = &self.options;

        // Validate
        let mode = options.column_name_mode();
        let columns = input.describe_columns(mode)?;
        let overrides = TypeMapper::resolve_overrides(&columns, &options.overrides, mode)?;
        let definitions =
            TypeMapper::new(options.type_map.clone()).infer_types(&columns, &overrides)?;

        // Resolve
        let (schema, table) = resolve_schema(executor, name).await?;
        let target = TargetRef::new(schema, table, options.temporary);

        // Check existence and apply the policy
        let exists = check_exists(executor, &target).await?;
        let (ddl, action) = match (exists, options.if_exists) {
            (false, _) => (
                create_table(executor, &target, &definitions).await?,
                TableAction::Created,
            ),
            (true, IfExists::Append) => (String::new(), TableAction::Appended),
            (true, IfExists::Fail) => {
                return Err(LoadError::AlreadyExists {
                    target: target.to_string(),
                })
            }
            (true, IfExists::Replace) => {
                let drop = generate_drop(&target);
                tracing::warn!(table = %target, "dropping existing table");
                tracing::debug!(sql = %drop, "executing drop");
                executor
                    .execute(&drop, &[])
                    .await
                    .map_err(LoadError::execution)?;
                (
                    create_table(executor, &target, &definitions).await?,
                    TableAction::Replaced,
                )
            }
        };

        // Insert
        let rows_inserted = insert_rows(executor, &target, input, options).await?;

        tracing::info!(
            table = %target,
            action = ?action,
            rows = rows_inserted,
            "load complete"
        );

        Ok(LoadReport {
            ddl,
            rows_inserted,
            action,
            target,
        })
    }
}

/// Load `input` into `name` and return the executed CREATE TABLE statement.
///
/// The result is empty when rows were appended to an existing table.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use arrow::array::{Int64Array, RecordBatch, StringArray};
/// use fast_to_sql::{load, Connection, IfExists, LoadOptions, TabularInput};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let batch = RecordBatch::try_from_iter(vec![
///     ("id", Arc::new(Int64Array::from(vec![1, 2])) as _),
///     ("name", Arc::new(StringArray::from(vec!["a", "b"])) as _),
/// ])?;
///
/// let mut conn = Connection::from_env().await?;
/// let options = LoadOptions::new()
///     .if_exists(IfExists::Replace)
///     .with_override("id", "INT PRIMARY KEY");
/// let ddl = load(&mut conn, &TabularInput::from(batch), "dbo.people", options).await?;
/// # Ok(())
/// # }
/// ```
///
/// # Errors
///
/// See [`Loader::run`].
pub async fn load<E>(
    executor: &mut E,
    input: &TabularInput,
    name: &str,
    options: LoadOptions,
) -> Result<String, LoadError>
where
    E: SqlExecutor + ?Sized,
{
    let report = Loader::new(options).run(executor, input, name).await?;
    Ok(report.ddl)
}

async fn create_table<E>(
    executor: &mut E,
    target: &TargetRef,
    definitions: &[ColumnDefinition],
) -> Result<String, LoadError>
where
    E: SqlExecutor + ?Sized,
{
    let ddl = generate_create(target, definitions);
    tracing::debug!(sql = %ddl, "executing create");

    executor
        .execute(&ddl, &[])
        .await
        .map_err(|err| create_error(target, err))?;

    Ok(ddl)
}

/// A create that collides with a concurrently created table is reported as
/// `AlreadyExists`, never as success.
fn create_error(target: &TargetRef, err: DriverError) -> LoadError {
    if err.is_already_exists() {
        LoadError::AlreadyExists {
            target: target.to_string(),
        }
    } else {
        LoadError::execution(err)
    }
}

async fn insert_rows<E>(
    executor: &mut E,
    target: &TargetRef,
    input: &TabularInput,
    options: &LoadOptions,
) -> Result<u64, LoadError>
where
    E: SqlExecutor + ?Sized,
{
    let query = InsertQuery::new(target, input.num_columns());
    let chunk_size = rows_per_batch(input.num_columns(), options.batch_size);
    tracing::debug!(
        rows_per_statement = chunk_size,
        mode = ?options.insert_mode,
        "inserting rows"
    );

    let mut inserted = 0u64;
    for batch in input.batches() {
        for offset in (0..batch.num_rows()).step_by(chunk_size) {
            let len = chunk_size.min(batch.num_rows() - offset);
            let rows = batch_rows(&batch.slice(offset, len))?;

            match options.insert_mode {
                InsertMode::Parameterized => {
                    let sql = query.parameterized(rows.len());
                    let params: Vec<SqlValue> = rows.into_iter().flatten().collect();
                    executor
                        .execute(&sql, &params)
                        .await
                        .map_err(LoadError::execution)?;
                }
                InsertMode::Literal => {
                    let sql = query.literal(&rows);
                    executor
                        .execute(&sql, &[])
                        .await
                        .map_err(LoadError::execution)?;
                }
            }
            inserted += len as u64;
        }
    }

    Ok(inserted)
}
