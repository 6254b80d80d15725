//! Infrastructure layer: document store backends, the inventory ledger, config.

pub mod config;
pub mod document_store;
pub mod ledger;

#[cfg(test)]
mod integration_tests;

pub use config::{ConfigError, PantryConfig, StoreBackend};
pub use document_store::{DocumentStore, InMemoryDocumentStore, StoreError};
pub use ledger::{InventoryLedger, InventorySnapshot, LedgerError, WriteStrategy};
