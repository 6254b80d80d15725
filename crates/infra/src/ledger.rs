//! Inventory ledger (application-level orchestration).
//!
//! The ledger turns raw item names into store operations:
//!
//! ```text
//! raw name
//!   ↓
//! 1. Normalize into an `ItemKey` (empty → InvalidKey, no store call)
//!   ↓
//! 2. Read the current record (failure aborts before any write)
//!   ↓
//! 3. Decide (pure policy in `pantry_inventory::policy`)
//!   ↓
//! 4. Write / delete / nothing
//! ```
//!
//! With [`WriteStrategy::PreferAtomic`], steps 2-4 collapse into one native
//! store primitive when the backend has one. Without it, two concurrent adds on
//! the same key may both read the same quantity and one increment is lost.
//!
//! The ledger holds no state besides the store handle: every `get`/`list`
//! re-reads the store, and nothing is pushed to callers. Callers that mirror
//! the inventory re-list after every mutation ([`InventoryLedger::snapshot`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::instrument;

use pantry_core::DomainError;
use pantry_inventory::{
    Decision, InventoryRecord, ItemKey, Quantity, StockMove, StockOutcome, decide,
};

use crate::document_store::{Decrement, Document, DocumentStore, StoreError};

/// Collection used when none is configured.
pub const DEFAULT_COLLECTION: &str = "inventory";

/// Name of the single field of a stored record.
pub const QUANTITY_FIELD: &str = "quantity";

/// How mutations reach the store.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum WriteStrategy {
    /// Point-read, decide, point-write/delete. Not atomic per key.
    ReadModifyWrite,
    /// Use the store's atomic increment/decrement primitive; fall back to
    /// read-modify-write when the store has none.
    #[default]
    PreferAtomic,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    /// The item name normalized to an empty key.
    #[error("invalid item key: {0}")]
    InvalidKey(String),

    /// A store call failed; nothing after it was attempted.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// A stored document does not have the shape of an inventory record.
    #[error("corrupt inventory record: {0}")]
    CorruptRecord(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<StoreError> for LedgerError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Unavailable(msg) => LedgerError::StoreUnavailable(msg),
            StoreError::Codec(msg) => LedgerError::CorruptRecord(msg),
            StoreError::CounterOverflow(msg) => LedgerError::InvariantViolation(msg),
        }
    }
}

impl From<DomainError> for LedgerError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidKey(msg) => LedgerError::InvalidKey(msg),
            DomainError::Validation(msg) | DomainError::InvariantViolation(msg) => {
                LedgerError::InvariantViolation(msg)
            }
        }
    }
}

/// Full re-list of the inventory at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventorySnapshot {
    pub records: Vec<InventoryRecord>,
    pub fetched_at: DateTime<Utc>,
}

impl InventorySnapshot {
    pub fn get(&self, key: &ItemKey) -> Option<&InventoryRecord> {
        self.records.iter().find(|r| r.key() == key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn total_units(&self) -> u64 {
        self.records.iter().map(|r| r.quantity().get()).sum()
    }
}

/// Stored body of an inventory record.
#[derive(Debug, Serialize, Deserialize)]
struct QuantityDocument {
    quantity: Quantity,
}

/// Add/remove/get/list of item quantities over a [`DocumentStore`].
#[derive(Debug, Clone)]
pub struct InventoryLedger<S> {
    store: S,
    collection: String,
    strategy: WriteStrategy,
}

impl<S> InventoryLedger<S>
where
    S: DocumentStore,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            collection: DEFAULT_COLLECTION.to_string(),
            strategy: WriteStrategy::default(),
        }
    }

    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn with_strategy(mut self, strategy: WriteStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn strategy(&self) -> WriteStrategy {
        self.strategy
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Add one unit of `raw_name`, creating the record at quantity 1.
    #[instrument(skip(self), fields(collection = %self.collection), err)]
    pub async fn add(&self, raw_name: &str) -> Result<StockOutcome, LedgerError> {
        let key = ItemKey::parse(raw_name)?;

        if self.strategy == WriteStrategy::PreferAtomic
            && let Some(inc) = self
                .store
                .increment_or_init(&self.collection, key.as_str(), QUANTITY_FIELD)
                .await?
        {
            let before = inc.previous.map(|n| to_quantity(&key, n)).transpose()?;
            let after = to_quantity(&key, inc.current)?;
            let outcome = StockOutcome::new(key, before, Some(after));
            tracing::debug!(key = %outcome.key, after = %after, "item added (atomic)");
            return Ok(outcome);
        }

        self.read_decide_write(StockMove::Add, key).await
    }

    /// Remove one unit of `raw_name`. Deletes the record when its last unit
    /// goes; removing an absent item changes nothing.
    #[instrument(skip(self), fields(collection = %self.collection), err)]
    pub async fn remove(&self, raw_name: &str) -> Result<StockOutcome, LedgerError> {
        let key = ItemKey::parse(raw_name)?;

        if self.strategy == WriteStrategy::PreferAtomic
            && let Some(dec) = self
                .store
                .decrement_or_delete(&self.collection, key.as_str(), QUANTITY_FIELD)
                .await?
        {
            let outcome = match dec {
                Decrement::Absent => StockOutcome::new(key, None, None),
                Decrement::Deleted => StockOutcome::new(key, Some(Quantity::ONE), None),
                Decrement::Decremented { previous, current } => {
                    let before = to_quantity(&key, previous)?;
                    let after = to_quantity(&key, current)?;
                    StockOutcome::new(key, Some(before), Some(after))
                }
            };
            tracing::debug!(key = %outcome.key, deleted = outcome.deleted(), "item removed (atomic)");
            return Ok(outcome);
        }

        self.read_decide_write(StockMove::Remove, key).await
    }

    /// Look up one item. `Ok(None)` when there is no record for the key.
    #[instrument(skip(self), fields(collection = %self.collection), err)]
    pub async fn get(&self, raw_name: &str) -> Result<Option<InventoryRecord>, LedgerError> {
        let key = ItemKey::parse(raw_name)?;
        let quantity = self.read_quantity(&key).await?;
        Ok(quantity.map(|q| InventoryRecord::new(key, q)))
    }

    /// Every record in the collection, in the store's enumeration order.
    #[instrument(skip(self), fields(collection = %self.collection), err)]
    pub async fn list(&self) -> Result<Vec<InventoryRecord>, LedgerError> {
        let docs = self.store.scan_all(&self.collection).await?;

        let mut records = Vec::with_capacity(docs.len());
        for (raw_key, doc) in docs {
            let key = stored_key(&raw_key)?;
            let quantity = decode(&key, doc)?;
            records.push(InventoryRecord::new(key, quantity));
        }
        Ok(records)
    }

    /// `list()` stamped with the time the scan completed.
    pub async fn snapshot(&self) -> Result<InventorySnapshot, LedgerError> {
        let records = self.list().await?;
        Ok(InventorySnapshot {
            records,
            fetched_at: Utc::now(),
        })
    }

    async fn read_quantity(&self, key: &ItemKey) -> Result<Option<Quantity>, LedgerError> {
        let doc = self.store.point_read(&self.collection, key.as_str()).await?;
        doc.map(|d| decode(key, d)).transpose()
    }

    async fn read_decide_write(
        &self,
        mv: StockMove,
        key: ItemKey,
    ) -> Result<StockOutcome, LedgerError> {
        // A failed read returns here, before any write is issued.
        let current = self.read_quantity(&key).await?;
        let decision = decide(mv, &key, current)?;
        let outcome = StockOutcome::from_decision(key, current, &decision);

        match decision {
            Decision::Write(record) => {
                self.store
                    .point_write(&self.collection, record.key().as_str(), encode(&record)?)
                    .await?;
            }
            Decision::Delete(key) => {
                self.store.point_delete(&self.collection, key.as_str()).await?;
            }
            Decision::Noop => {}
        }

        tracing::debug!(
            key = %outcome.key,
            ?mv,
            before = ?outcome.before.map(Quantity::get),
            after = ?outcome.after.map(Quantity::get),
            "stock moved"
        );
        Ok(outcome)
    }
}

fn stored_key(raw: &str) -> Result<ItemKey, LedgerError> {
    let key = ItemKey::parse(raw)
        .map_err(|_| LedgerError::CorruptRecord(format!("stored key '{raw}' is empty")))?;
    if key.as_str() != raw {
        return Err(LedgerError::CorruptRecord(format!(
            "stored key '{raw}' is not normalized"
        )));
    }
    Ok(key)
}

fn to_quantity(key: &ItemKey, value: i64) -> Result<Quantity, LedgerError> {
    u64::try_from(value)
        .ok()
        .and_then(|n| Quantity::new(n).ok())
        .ok_or_else(|| {
            LedgerError::CorruptRecord(format!("'{key}' has non-positive quantity {value}"))
        })
}

fn decode(key: &ItemKey, doc: Document) -> Result<Quantity, LedgerError> {
    let parsed: QuantityDocument = serde_json::from_value(JsonValue::Object(doc))
        .map_err(|e| LedgerError::CorruptRecord(format!("'{key}': {e}")))?;
    Ok(parsed.quantity)
}

fn encode(record: &InventoryRecord) -> Result<Document, LedgerError> {
    let value = serde_json::to_value(QuantityDocument {
        quantity: record.quantity(),
    })
    .map_err(|e| LedgerError::CorruptRecord(format!("'{}': {e}", record.key())))?;

    match value {
        JsonValue::Object(doc) => Ok(doc),
        other => Err(LedgerError::CorruptRecord(format!(
            "'{}' encoded to a non-object: {other}",
            record.key()
        ))),
    }
}
