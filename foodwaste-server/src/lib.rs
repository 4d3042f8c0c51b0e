//! foodwaste-server: HTTP service for food waste entries
//!
//! Four routes, each mapped to exactly one parameterized statement against
//! the `food_waste_entries` table through a bounded connection pool.

pub mod db;
pub mod http;
pub mod models;

pub use db::{ConnectionPool, DbError, EntryRepo, EntryStore, MemoryStore, PoolConfig};
pub use http::{build_router, run_server, ApiError, AppState, ServerConfig, ServerError};
pub use models::{EntryBody, FoodWasteEntry};
