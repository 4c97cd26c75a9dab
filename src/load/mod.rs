//! Loading tabular data into SQL Server tables.
//!
//! - `options` - [`LoadOptions`] and the [`IfExists`] policy
//! - `table` - [`TabularInput`], the data being loaded
//! - `loader` - [`Loader`] and the [`load`] entry point

pub mod loader;
pub mod options;
pub mod table;

pub use loader::{load, LoadReport, Loader, TableAction};
pub use options::{IfExists, InsertMode, LoadOptions, DEFAULT_BATCH_SIZE};
pub use table::{TabularInput, DEFAULT_SERIES_NAME};
