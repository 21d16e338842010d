//! Port definitions (hexagonal architecture)
//!
//! Ports define the interfaces for external dependencies. Callers depend on
//! these traits, not on the DuckDB adapter.

mod repository;

pub use repository::{ColumnInfo, UserRepository};
