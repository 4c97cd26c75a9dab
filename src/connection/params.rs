//! SQL Server connection parameters.
//!
//! Parameters can be assembled with [`ConnectionBuilder`] or parsed from an
//! ADO.NET style connection string:
//!
//! ```text
//! server=tcp:localhost,1433;database=master;user id=sa;password=secret;TrustServerCertificate=true
//! ```
//!
//! Connection strings are parsed by tiberius, so named instances
//! (`server=host\SQLEXPRESS`) are resolved through the SQL Browser service.

use std::fmt;
use std::str::FromStr;

use tiberius::{AuthMethod, Config, EncryptionLevel};

use crate::error::ConnectionError;

/// Environment variable read by [`ConnectionParams::from_env`].
pub const CONNECTION_STRING_ENV: &str = "MSSQL_CONNECTION_STRING";

/// Parameters for opening a SQL Server connection.
#[derive(Clone)]
pub struct ConnectionParams {
    config: Config,
}

impl ConnectionParams {
    /// Create a builder.
    pub fn builder() -> ConnectionBuilder {
        ConnectionBuilder::new()
    }

    /// Parse an ADO.NET style connection string.
    ///
    /// Keys are case-insensitive and unknown keys are ignored. `server`
    /// accepts `tcp:host,port`, `host,port` and `host\instance`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::InvalidParameter` if the string or one of
    /// its values is malformed.
    pub fn from_ado_string(s: &str) -> Result<Self, ConnectionError> {
        let config = Config::from_ado_string(s).map_err(|e| ConnectionError::InvalidParameter {
            parameter: "connection string".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { config })
    }

    /// Read the connection string from `MSSQL_CONNECTION_STRING`.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::MissingParameter` if the variable is unset,
    /// or any error of [`from_ado_string`](Self::from_ado_string).
    pub fn from_env() -> Result<Self, ConnectionError> {
        let value = std::env::var(CONNECTION_STRING_ENV)
            .map_err(|_| ConnectionError::MissingParameter(CONNECTION_STRING_ENV.to_string()))?;
        Self::from_ado_string(&value)
    }

    /// `host:port` the client connects to first.
    ///
    /// For a named instance this is the SQL Browser port, 1434.
    pub fn addr(&self) -> String {
        self.config.get_addr()
    }

    /// The tiberius configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl FromStr for ConnectionParams {
    type Err = ConnectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_ado_string(s)
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("addr", &self.addr())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConnectionParams`].
#[derive(Clone, Default)]
pub struct ConnectionBuilder {
    host: Option<String>,
    port: Option<u16>,
    instance: Option<String>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    encrypt: bool,
    trust_cert: bool,
    application_name: Option<String>,
}

impl ConnectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Named instance, resolved through the SQL Browser service.
    #[must_use]
    pub fn instance(mut self, name: impl Into<String>) -> Self {
        self.instance = Some(name.into());
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Require TLS for the whole session. Off by default.
    #[must_use]
    pub fn encrypt(mut self, encrypt: bool) -> Self {
        self.encrypt = encrypt;
        self
    }

    /// Skip server certificate validation. Off by default.
    #[must_use]
    pub fn trust_cert(mut self, trust: bool) -> Self {
        self.trust_cert = trust;
        self
    }

    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = Some(name.into());
        self
    }

    /// Build the connection parameters.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError::MissingParameter` if host or username is
    /// not set, and `ConnectionError::InvalidParameter` if the host is empty.
    pub fn build(self) -> Result<ConnectionParams, ConnectionError> {
        let host = self
            .host
            .ok_or_else(|| ConnectionError::MissingParameter("host".to_string()))?;
        if host.trim().is_empty() {
            return Err(ConnectionError::InvalidParameter {
                parameter: "host".to_string(),
                message: "host must not be empty".to_string(),
            });
        }
        let username = self
            .username
            .ok_or_else(|| ConnectionError::MissingParameter("username".to_string()))?;

        let mut config = Config::new();
        config.host(&host);
        if let Some(port) = self.port {
            config.port(port);
        }
        if let Some(instance) = &self.instance {
            config.instance_name(instance);
        }
        config.authentication(AuthMethod::sql_server(
            &username,
            self.password.as_deref().unwrap_or_default(),
        ));
        if let Some(database) = self.database.filter(|db| !db.is_empty()) {
            config.database(database);
        }
        if let Some(name) = &self.application_name {
            config.application_name(name);
        }
        config.encryption(if self.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });
        if self.trust_cert {
            config.trust_cert();
        }

        Ok(ConnectionParams { config })
    }
}

impl fmt::Debug for ConnectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("instance", &self.instance)
            .field("database", &self.database)
            .field("username", &self.username)
            .field("encrypt", &self.encrypt)
            .field("trust_cert", &self.trust_cert)
            .finish_non_exhaustive()
    }
}
