//! SQL Server connection backed by `tiberius`.
//!
//! [`Connection`] owns a single tiberius client over a tokio TCP stream and
//! implements [`SqlExecutor`] so the loader can drive it. Driver errors are
//! translated in one place, [`classify_mssql_error`].

use std::borrow::Cow;
use std::sync::OnceLock;

use async_trait::async_trait;
use tiberius::error::Error as TdsError;
use tiberius::{Client, ColumnData, Config, SqlBrowser, ToSql};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use super::params::{ConnectionBuilder, ConnectionParams};
use super::{SqlExecutor, DEFAULT_SCHEMA_QUERY};
use crate::error::{ConnectionError, DriverError, DriverErrorKind, LoadError};
use crate::load::{LoadOptions, LoadReport, Loader, TabularInput};
use crate::types::{NativeType, SqlValue};

type MssqlClient = Client<Compat<TcpStream>>;

/// Server error number for "There is already an object named ... in the database".
const OBJECT_ALREADY_EXISTS: u32 = 2714;

/// Global tokio runtime for blocking operations.
///
/// Lazily initialized on first use. Connections used through the
/// `blocking_*` methods must also be opened on it, because the TCP stream is
/// bound to the runtime that created it.
fn blocking_runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| {
        tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime for blocking operations")
    })
}

/// Translate a tiberius error into a classified [`DriverError`].
///
/// Server error 2714 (or its message text) is `ObjectAlreadyExists`; IO, TLS
/// and routing failures are `Connection`; everything else is `Other`.
pub fn classify_mssql_error(err: &TdsError) -> DriverError {
    let message = err.to_string();

    let kind = match err {
        TdsError::Server(token) if token.code() == OBJECT_ALREADY_EXISTS => {
            DriverErrorKind::ObjectAlreadyExists
        }
        TdsError::Io { .. } | TdsError::Tls(_) | TdsError::Routing { .. } => {
            DriverErrorKind::Connection
        }
        _ if message.contains("There is already an object named") => {
            DriverErrorKind::ObjectAlreadyExists
        }
        _ => DriverErrorKind::Other,
    };

    DriverError::new(kind, message)
}

async fn open_client(config: Config) -> Result<MssqlClient, TdsError> {
    let tcp = TcpStream::connect_named(&config).await?;
    tcp.set_nodelay(true)?;
    Client::connect(config, tcp.compat_write()).await
}

/// A connection to a SQL Server database.
///
/// # Example
///
/// ```no_run
/// use fast_to_sql::{Connection, LoadOptions, TabularInput};
/// # async fn run(input: TabularInput) -> Result<(), Box<dyn std::error::Error>> {
/// let mut conn = Connection::builder()
///     .host("localhost")
///     .username("sa")
///     .password("secret")
///     .trust_cert(true)
///     .connect()
///     .await?;
///
/// let ddl = conn.load(&input, "dbo.sales", LoadOptions::default()).await?;
/// println!("{ddl}");
/// conn.close().await?;
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    client: MssqlClient,
    params: ConnectionParams,
}

impl Connection {
    /// Open a connection.
    ///
    /// A single routing redirect (as issued by Azure SQL gateways) is
    /// followed.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::ConnectionFailed` if the TCP connect, TLS
    /// handshake or login fails.
    pub async fn from_params(params: ConnectionParams) -> Result<Self, ConnectionError> {
        let config = params.config().clone();
        let failed = |addr: String, err: TdsError| ConnectionError::ConnectionFailed {
            addr,
            message: err.to_string(),
        };

        let client = match open_client(config.clone()).await {
            Ok(client) => client,
            Err(TdsError::Routing { host, port }) => {
                tracing::debug!(host = %host, port, "following server redirect");
                let mut config = config;
                config.host(&host);
                config.port(port);
                open_client(config)
                    .await
                    .map_err(|e| failed(format!("{host}:{port}"), e))?
            }
            Err(e) => return Err(failed(params.addr(), e)),
        };

        tracing::debug!(addr = %params.addr(), "connected to SQL Server");
        Ok(Self { client, params })
    }

    /// Create a builder for constructing a connection.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Open a connection from `MSSQL_CONNECTION_STRING`.
    ///
    /// # Errors
    ///
    /// Returns an error if the variable is missing or malformed, or if the
    /// connection cannot be opened.
    pub async fn from_env() -> Result<Self, ConnectionError> {
        Self::from_params(ConnectionParams::from_env()?).await
    }

    /// Connection parameters this connection was opened with.
    pub fn params(&self) -> &ConnectionParams {
        &self.params
    }

    /// Load tabular data into `name`, returning the executed DDL.
    ///
    /// The returned string is empty when rows were appended to an existing
    /// table. See [`Loader`] for the full behavior.
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on validation, catalog, DDL or insert failure.
    pub async fn load(
        &mut self,
        input: &TabularInput,
        name: &str,
        options: LoadOptions,
    ) -> Result<String, LoadError> {
        crate::load::load(self, input, name, options).await
    }

    /// Load tabular data into `name`, returning the full [`LoadReport`].
    ///
    /// # Errors
    ///
    /// Returns `LoadError` on validation, catalog, DDL or insert failure.
    pub async fn load_with_report(
        &mut self,
        input: &TabularInput,
        name: &str,
        options: LoadOptions,
    ) -> Result<LoadReport, LoadError> {
        Loader::new(options).run(self, input, name).await
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::CloseFailed` if the server side shutdown fails.
    pub async fn close(self) -> Result<(), ConnectionError> {
        self.client
            .close()
            .await
            .map_err(|e| ConnectionError::CloseFailed(e.to_string()))
    }

    // ========================================================================
    // Blocking API
    // ========================================================================

    /// Open a connection on the shared blocking runtime.
    ///
    /// Use this for connections that are driven through
    /// [`blocking_load`](Self::blocking_load).
    ///
    /// # Errors
    ///
    /// See [`from_params`](Self::from_params).
    pub fn blocking_from_params(params: ConnectionParams) -> Result<Self, ConnectionError> {
        blocking_runtime().block_on(Self::from_params(params))
    }

    /// Load tabular data (blocking).
    ///
    /// This is a synchronous wrapper around [`load`](Self::load) for use in
    /// non-async contexts.
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub fn blocking_load(
        &mut self,
        input: &TabularInput,
        name: &str,
        options: LoadOptions,
    ) -> Result<String, LoadError> {
        blocking_runtime().block_on(self.load(input, name, options))
    }

    /// Close the connection (blocking).
    ///
    /// # Errors
    ///
    /// See [`close`](Self::close).
    pub fn blocking_close(self) -> Result<(), ConnectionError> {
        blocking_runtime().block_on(self.close())
    }
}

impl ConnectionBuilder {
    /// Build the parameters and open a connection.
    ///
    /// # Errors
    ///
    /// Returns an error if parameters are missing or the connection fails.
    pub async fn connect(self) -> Result<Connection, ConnectionError> {
        Connection::from_params(self.build()?).await
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SqlExecutor for Connection {
    async fn default_schema(&mut self) -> Result<String, DriverError> {
        let row = self
            .client
            .simple_query(DEFAULT_SCHEMA_QUERY)
            .await
            .map_err(|e| classify_mssql_error(&e))?
            .into_row()
            .await
            .map_err(|e| classify_mssql_error(&e))?;

        let Some(row) = row else {
            return Err(DriverError::other("SCHEMA_NAME() returned no rows"));
        };
        match row.try_get::<&str, _>(0) {
            Ok(Some(schema)) => Ok(schema.to_string()),
            Ok(None) => Err(DriverError::other("SCHEMA_NAME() returned NULL")),
            Err(e) => Err(classify_mssql_error(&e)),
        }
    }

    async fn query_scalar(&mut self, sql: &str) -> Result<Option<i64>, DriverError> {
        let row = self
            .client
            .simple_query(sql)
            .await
            .map_err(|e| classify_mssql_error(&e))?
            .into_row()
            .await
            .map_err(|e| classify_mssql_error(&e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let value = match row.into_iter().next() {
            Some(ColumnData::U8(v)) => v.map(i64::from),
            Some(ColumnData::I16(v)) => v.map(i64::from),
            Some(ColumnData::I32(v)) => v.map(i64::from),
            Some(ColumnData::I64(v)) => v,
            Some(ColumnData::Bit(v)) => v.map(i64::from),
            None => None,
            Some(other) => {
                return Err(DriverError::other(format!(
                    "Expected an integer result, got {other:?}"
                )))
            }
        };
        Ok(value)
    }

    async fn execute(&mut self, sql: &str, params: &[SqlValue]) -> Result<u64, DriverError> {
        if params.is_empty() {
            // Temp tables created inside sp_executesql are dropped when it
            // returns, so parameterless statements run as a plain batch.
            // Plain batches do not report affected rows.
            self.client
                .simple_query(sql)
                .await
                .map_err(|e| classify_mssql_error(&e))?
                .into_results()
                .await
                .map_err(|e| classify_mssql_error(&e))?;
            return Ok(0);
        }

        let params: Vec<&dyn ToSql> = params.iter().map(|p| p as &dyn ToSql).collect();
        let result = self
            .client
            .execute(sql, &params)
            .await
            .map_err(|e| classify_mssql_error(&e))?;
        Ok(result.total())
    }
}

/// Typed NULL for a column of the given native type.
fn typed_null(native: NativeType) -> ColumnData<'static> {
    match native {
        NativeType::Int64 => ColumnData::I64(None),
        NativeType::Int32 => ColumnData::I32(None),
        NativeType::Int16 | NativeType::Int8 => ColumnData::I16(None),
        NativeType::Float => ColumnData::F64(None),
        NativeType::Boolean => ColumnData::Bit(None),
        NativeType::DateTime => ColumnData::DateTime2(None),
        NativeType::Text | NativeType::Other => ColumnData::String(None),
    }
}

impl ToSql for SqlValue {
    fn to_sql(&self) -> ColumnData<'_> {
        match self {
            SqlValue::Null(native) => typed_null(*native),
            SqlValue::Bool(v) => ColumnData::Bit(Some(*v)),
            SqlValue::I16(v) => ColumnData::I16(Some(*v)),
            SqlValue::I32(v) => ColumnData::I32(Some(*v)),
            SqlValue::I64(v) => ColumnData::I64(Some(*v)),
            SqlValue::F64(v) => ColumnData::F64(Some(*v)),
            SqlValue::Text(s) => ColumnData::String(Some(Cow::Borrowed(s.as_str()))),
            SqlValue::DateTime(dt) => dt.to_sql(),
            SqlValue::Binary(bytes) => ColumnData::Binary(Some(Cow::Borrowed(bytes.as_slice()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_classify_io_error_as_connection() {
        let err = TdsError::Io {
            kind: std::io::ErrorKind::ConnectionReset,
            message: "connection reset".to_string(),
        };
        assert_eq!(classify_mssql_error(&err).kind, DriverErrorKind::Connection);
    }

    #[test]
    fn test_classify_routing_as_connection() {
        let err = TdsError::Routing {
            host: "other".to_string(),
            port: 1433,
        };
        assert_eq!(classify_mssql_error(&err).kind, DriverErrorKind::Connection);
    }

    #[test]
    fn test_classify_already_exists_by_message() {
        let err = TdsError::Protocol(
            "There is already an object named 'test' in the database.".into(),
        );
        assert!(classify_mssql_error(&err).is_already_exists());
    }

    #[test]
    fn test_classify_other() {
        let err = TdsError::Conversion("bad value".into());
        let classified = classify_mssql_error(&err);
        assert_eq!(classified.kind, DriverErrorKind::Other);
        assert!(classified.message.contains("bad value"));
    }

    #[test]
    fn test_typed_nulls() {
        assert!(matches!(
            SqlValue::Null(NativeType::Int64).to_sql(),
            ColumnData::I64(None)
        ));
        assert!(matches!(
            SqlValue::Null(NativeType::Float).to_sql(),
            ColumnData::F64(None)
        ));
        assert!(matches!(
            SqlValue::Null(NativeType::DateTime).to_sql(),
            ColumnData::DateTime2(None)
        ));
        assert!(matches!(
            SqlValue::Null(NativeType::Int8).to_sql(),
            ColumnData::I16(None)
        ));
    }

    #[test]
    fn test_values_to_sql() {
        assert!(matches!(SqlValue::Bool(true).to_sql(), ColumnData::Bit(Some(true))));
        assert!(matches!(SqlValue::I64(7).to_sql(), ColumnData::I64(Some(7))));
        match SqlValue::Text("abc".to_string()).to_sql() {
            ColumnData::String(Some(s)) => assert_eq!(s, "abc"),
            other => panic!("unexpected {other:?}"),
        }

        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        assert!(matches!(
            SqlValue::DateTime(dt).to_sql(),
            ColumnData::DateTime2(Some(_))
        ));
    }
}
