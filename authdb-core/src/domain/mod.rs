//! Core domain entities
//!
//! Pure data structures with validation logic - no I/O.

pub mod result;
mod user;

pub use user::{Criteria, FieldValue, User, UserField, UserUpdate, MAX_TEXT_LEN, USERS_TABLE};
