//! Adapter implementations
//!
//! Adapters implement the port traits with concrete technologies:
//! - DuckDB for the UserRepository port
//! - a per-process registry so every handle on one DuckDB file shares it

pub mod duckdb;
pub mod shared;
