//! Command implementations for foodwaste CLI

pub mod serve;

pub use serve::run_serve;
