//! Database layer - connection pool and repositories
//!
//! - One statement per call, no transactions, no retries
//! - Connections are scoped to a single statement and released on drop
//! - Handlers see the store only through [`EntryStore`]

pub mod pool;
pub mod repos;

pub use pool::{ConnectionPool, DbError, PoolConfig, PooledConnection};
pub use repos::{EntryRepo, EntryStore, MemoryStore};
