//! Repository implementations for database access
//!
//! Each write reports the number of rows it changed. Callers turn a zero
//! count into "not found"; the repositories never do.

pub mod entries;
pub mod memory;

pub use entries::{EntryRepo, EntryStore};
pub use memory::MemoryStore;
