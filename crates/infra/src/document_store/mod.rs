//! Document store boundary.
//!
//! This module defines the infrastructure-facing abstraction over a keyed
//! document database (point read/write/delete plus collection scan) and its
//! backends: in-memory for tests/dev, Postgres for persistence.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use postgres::PostgresDocumentStore;
pub use r#trait::{Decrement, Document, DocumentStore, Increment, StoreError, StoreResult};
