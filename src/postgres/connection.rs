//! PostgreSQL connection management

use std::fmt;
use tokio::task::JoinHandle;
use tokio_postgres::{Client, Config, NoTls};

/// Default PostgreSQL port
pub const DEFAULT_PORT: u16 = 5432;

/// Credentials for a PostgreSQL session
///
/// Built once at the process boundary (see
/// [`LoadConfig::from_env`](crate::config::LoadConfig::from_env)) and passed
/// in explicitly.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub password: String,
}

impl ConnectionParams {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            database: database.into(),
            user: user.into(),
            password: password.into(),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    fn config(&self) -> Config {
        let mut config = Config::new();
        config
            .host(&self.host)
            .port(self.port)
            .dbname(&self.database)
            .user(&self.user)
            .password(&self.password);
        config
    }
}

impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"********")
            .finish()
    }
}

impl fmt::Display for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}@{}:{}/{}",
            self.user, self.host, self.port, self.database
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to connect to {target}: {source}")]
pub struct ConnectError {
    target: String,
    #[source]
    source: tokio_postgres::Error,
}

/// A live PostgreSQL session
///
/// The socket is driven by a spawned task; [`Connection::close`] ends the
/// session and waits for that task.
pub struct Connection {
    client: Client,
    driver: JoinHandle<()>,
}

/// Open a session with the given credentials
///
/// No retries are attempted; callers treat failure as fatal.
pub async fn connect(params: &ConnectionParams) -> Result<Connection, ConnectError> {
    log::info!("Connecting to the PostgreSQL database at {}", params);
    let (client, connection) = params
        .config()
        .connect(NoTls)
        .await
        .map_err(|source| ConnectError {
            target: params.to_string(),
            source,
        })?;
    let driver = tokio::spawn(async move {
        if let Err(e) = connection.await {
            log::error!("PostgreSQL connection error: {}", e);
        }
    });
    Ok(Connection { client, driver })
}

impl Connection {
    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut Client {
        &mut self.client
    }

    /// Close the session
    pub async fn close(self) {
        drop(self.client);
        if let Err(e) = self.driver.await {
            log::warn!("PostgreSQL connection task did not shut down cleanly: {}", e);
        }
        log::debug!("Database connection closed");
    }
}
