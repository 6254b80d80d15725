//! Inventory domain module.
//!
//! This crate contains business rules for the inventory ledger, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage):
//! key normalization, the record model, and the add/remove decision policy.

pub mod key;
pub mod policy;
pub mod record;

pub use key::{ItemKey, normalize};
pub use policy::{Decision, StockMove, StockOutcome, decide};
pub use record::{InventoryRecord, Quantity};
