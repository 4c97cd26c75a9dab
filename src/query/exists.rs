//! Catalog lookups for table existence.

use super::target::TargetRef;
use crate::connection::SqlExecutor;
use crate::error::LoadError;
use crate::types::{escape_literal, quote_identifier};

/// Build the catalog query that selects 1 if the target exists, else 0.
///
/// Temporary tables are looked up in `tempdb`; regular tables in
/// `INFORMATION_SCHEMA.TABLES` by name and schema.
#[must_use]
pub fn exists_query(target: &TargetRef) -> String {
    if target.temporary {
        format!(
            "IF OBJECT_ID('tempdb..{}') IS NOT NULL select 1 else select 0",
            escape_literal(&quote_identifier(&target.table))
        )
    } else {
        format!(
            "IF EXISTS (SELECT * FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = '{}' and TABLE_SCHEMA = '{}') select 1 else select 0",
            escape_literal(&target.table),
            escape_literal(&target.schema)
        )
    }
}

/// Check whether the target table already exists.
///
/// # Errors
///
/// A failed lookup is returned as `LoadError::CatalogQuery` (or
/// `LoadError::Connection`) and is never read as "does not exist". A lookup
/// that returns no row at all is also an error.
pub async fn check_exists<E>(executor: &mut E, target: &TargetRef) -> Result<bool, LoadError>
where
    E: SqlExecutor + ?Sized,
{
    let sql = exists_query(target);
    tracing::debug!(sql = %sql, "checking table existence");

    let value = executor
        .query_scalar(&sql)
        .await
        .map_err(LoadError::catalog)?
        .ok_or_else(|| {
            LoadError::CatalogQuery(format!("Existence check for {target} returned no rows"))
        })?;

    Ok(value == 1)
}
