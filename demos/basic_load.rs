//! Load a small table into SQL Server.
//!
//! ```bash
//! export MSSQL_CONNECTION_STRING="server=tcp:localhost,1433;user id=sa;password=...;TrustServerCertificate=true"
//! RUST_LOG=fast_to_sql=debug cargo run --example basic_load
//! ```

use std::sync::Arc;

use arrow::array::{ArrayRef, BooleanArray, Float64Array, Int64Array, RecordBatch, StringArray};
use fast_to_sql::{Connection, IfExists, LoadOptions, TabularInput};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let batch = RecordBatch::try_from_iter(vec![
        ("id", Arc::new(Int64Array::from(vec![1, 2, 3])) as ArrayRef),
        (
            "product name",
            Arc::new(StringArray::from(vec![Some("widget"), Some("gadget"), None])) as ArrayRef,
        ),
        (
            "unit price",
            Arc::new(Float64Array::from(vec![Some(9.99), None, Some(f64::NAN)])) as ArrayRef,
        ),
        (
            "in stock",
            Arc::new(BooleanArray::from(vec![true, false, true])) as ArrayRef,
        ),
    ])?;

    let mut conn = Connection::from_env().await?;

    let options = LoadOptions::new()
        .if_exists(IfExists::Replace)
        .with_override("id", "INT PRIMARY KEY");
    let report = conn
        .load_with_report(&TabularInput::from(batch), "dbo.demo_products", options)
        .await?;

    println!("{}", report.ddl);
    println!(
        "{:?} {}: {} rows",
        report.action, report.target, report.rows_inserted
    );

    // Series form: a single array becomes a one-column temp table named [0]
    let series = TabularInput::from_array(Arc::new(StringArray::from(vec!["a", "b", "c"])))?;
    let ddl = conn
        .load(&series, "demo_series", LoadOptions::new().temporary(true))
        .await?;
    println!("{ddl}");

    conn.close().await?;
    Ok(())
}
