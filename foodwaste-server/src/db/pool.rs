//! Database connection pool management
//!
//! Wraps a sqlx `MySqlPool` behind a semaphore sized to the pool. Waiting for
//! a free slot happens on the semaphore and never times out; sqlx's
//! `acquire_timeout` then only bounds opening a connection to the store.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;
use std::time::Duration;

use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::{MySql, MySqlConnection, MySqlPool};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::models::MissingField;

/// Default maximum connections for the pool.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 100;

/// Default MySQL port.
pub const DEFAULT_PORT: u16 = 3306;

/// Default time allowed for opening a connection to the store.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Database error type
///
/// Every failure talking to the store collapses into one variant; callers
/// never branch on the cause.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("store unavailable: {0}")]
    StoreUnavailable(#[from] sqlx::Error),
}

impl From<MissingField> for DbError {
    /// An absent body field fails at bind time, like any other rejected statement.
    fn from(e: MissingField) -> Self {
        Self::StoreUnavailable(sqlx::Error::Encode(Box::new(e)))
    }
}

/// Store connection settings
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            user: "root".to_string(),
            password: String::new(),
            database: "defaultdb".to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl PoolConfig {
    pub fn connect_options(&self) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.database)
    }
}

/// Bounded pool of store connections shared by all handlers.
#[derive(Clone)]
pub struct ConnectionPool {
    pool: MySqlPool,
    permits: Arc<Semaphore>,
    max_connections: u32,
}

/// A connection checked out of [`ConnectionPool`].
///
/// Dropping it hands the connection back to sqlx, then frees its slot.
/// Fields drop in declaration order, so `conn` must stay first. sqlx finishes
/// the hand-back on a spawned task; a waiter woken by the freed slot can wait
/// inside sqlx for that task, bounded by `acquire_timeout`.
pub struct PooledConnection {
    conn: PoolConnection<MySql>,
    _permit: OwnedSemaphorePermit,
}

impl Deref for PooledConnection {
    type Target = MySqlConnection;

    fn deref(&self) -> &Self::Target {
        &self.conn
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.conn
    }
}

impl ConnectionPool {
    /// Build the pool without connecting.
    ///
    /// Connections are opened on first use, so the service starts (and
    /// answers with store errors) while the store is down.
    pub fn new(config: &PoolConfig) -> Self {
        // Never build a zero-sized pool; sqlx rejects it and every request would hang.
        let max_connections = config.max_connections.max(1);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(config.connect_timeout)
            .connect_lazy_with(config.connect_options());

        tracing::debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            max_connections,
            "connection pool configured"
        );

        Self {
            pool,
            permits: Arc::new(Semaphore::new(max_connections as usize)),
            max_connections,
        }
    }

    /// Check out one connection, waiting as long as it takes for a free slot.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::StoreUnavailable`] if no connection can be opened.
    pub async fn acquire(&self) -> Result<PooledConnection, DbError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| DbError::StoreUnavailable(sqlx::Error::PoolClosed))?;

        let conn = self.pool.acquire().await?;

        Ok(PooledConnection {
            conn,
            _permit: permit,
        })
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections
    }

    /// Slots not currently checked out.
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Close the pool; waiters are released with an error.
    pub async fn close(&self) {
        self.permits.close();
        self.pool.close().await;
    }
}
