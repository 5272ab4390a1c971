//! Calendar event store boundary.
//!
//! This module defines the leaf persistence abstraction: committed records plus
//! field-based lookup, and an atomic `commit` for batches of staged changes.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use r#trait::{Change, EventField, EventStore, StoreError};
