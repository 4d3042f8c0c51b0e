//! HTTP server command
//!
//! Builds the connection pool from flags/environment and runs the food waste
//! routes until Ctrl+C or SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use foodwaste_server::db::pool::DEFAULT_MAX_CONNECTIONS;
use foodwaste_server::{run_server, ConnectionPool, EntryRepo, PoolConfig, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to
    #[arg(long, short = 'b', env = "BIND_ADDR", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database host
    #[arg(long, env = "DB_HOST")]
    pub db_host: String,

    /// Database port
    #[arg(long, env = "DB_PORT", default_value_t = 3306)]
    pub db_port: u16,

    /// Database user
    #[arg(long, env = "DB_USER")]
    pub db_user: String,

    /// Database password
    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    pub db_password: String,

    /// Database (schema) holding the food_waste_entries table
    #[arg(long, env = "DB_NAME")]
    pub db_name: String,

    /// Maximum concurrent store connections
    #[arg(
        long,
        env = "DB_POOL_SIZE",
        default_value_t = DEFAULT_MAX_CONNECTIONS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub pool_size: u32,

    /// Seconds allowed for opening a store connection
    #[arg(long, env = "DB_CONNECT_TIMEOUT", default_value_t = 10)]
    pub connect_timeout_secs: u64,
}

impl ServeArgs {
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig {
            host: self.db_host.clone(),
            port: self.db_port,
            user: self.db_user.clone(),
            password: self.db_password.clone(),
            database: self.db_name.clone(),
            max_connections: self.pool_size,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            cors_permissive: self.cors_permissive,
        }
    }
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs) -> Result<()> {
    let pool_config = args.pool_config();
    tracing::info!(
        bind = %args.bind,
        db_host = %pool_config.host,
        db_name = %pool_config.database,
        pool_size = pool_config.max_connections,
        "Starting foodwaste server"
    );

    // Lazy: no connection is opened until the first request
    let pool = ConnectionPool::new(&pool_config);
    let repo = EntryRepo::new(pool.clone());

    // Run server (blocks until shutdown)
    let result = run_server(Arc::new(repo), args.server_config())
        .await
        .context("Server error");

    pool.close().await;
    result
}
