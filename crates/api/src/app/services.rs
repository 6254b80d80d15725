use std::sync::Arc;

use anyhow::Context;

use pantry_infra::document_store::{DocumentStore, InMemoryDocumentStore, PostgresDocumentStore};
use pantry_infra::{InventoryLedger, InventorySnapshot, LedgerError, PantryConfig, StoreBackend, WriteStrategy};
use pantry_inventory::{InventoryRecord, StockMove, StockOutcome};

/// Ledger over whichever store the configuration selected.
pub type SharedLedger = InventoryLedger<Arc<dyn DocumentStore>>;

/// A stock move that reached the store, with the listing taken after it.
#[derive(Debug)]
pub struct AppliedMove {
    pub outcome: StockOutcome,
    pub inventory: Result<InventorySnapshot, LedgerError>,
}

/// Services shared by all handlers.
pub struct AppServices {
    ledger: SharedLedger,
}

impl AppServices {
    pub fn new(store: Arc<dyn DocumentStore>, collection: impl Into<String>, strategy: WriteStrategy) -> Self {
        Self {
            ledger: InventoryLedger::new(store)
                .with_collection(collection)
                .with_strategy(strategy),
        }
    }

    /// In-memory services (tests/dev).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryDocumentStore::new()),
            pantry_infra::ledger::DEFAULT_COLLECTION,
            WriteStrategy::default(),
        )
    }

    pub fn ledger(&self) -> &SharedLedger {
        &self.ledger
    }

    /// Apply one stock move, then re-list the whole inventory.
    ///
    /// The ledger pushes nothing; the refreshed listing is how callers observe
    /// the new state. `Err` means the move was not applied. A failed re-list
    /// after an applied move is carried in [`AppliedMove::inventory`].
    pub async fn apply(&self, mv: StockMove, name: &str) -> Result<AppliedMove, LedgerError> {
        let outcome = match mv {
            StockMove::Add => self.ledger.add(name).await?,
            StockMove::Remove => self.ledger.remove(name).await?,
        };

        let inventory = self.ledger.snapshot().await;
        if let Err(e) = &inventory {
            tracing::warn!(key = %outcome.key, error = %e, "stock move applied but re-list failed");
        }
        Ok(AppliedMove { outcome, inventory })
    }

    pub async fn inventory(&self) -> Result<InventorySnapshot, LedgerError> {
        self.ledger.snapshot().await
    }

    pub async fn lookup(&self, name: &str) -> Result<Option<InventoryRecord>, LedgerError> {
        self.ledger.get(name).await
    }
}

/// Build services for the configured backend.
pub async fn build_services(config: &PantryConfig) -> anyhow::Result<AppServices> {
    let store: Arc<dyn DocumentStore> = match &config.store {
        StoreBackend::InMemory => {
            tracing::warn!("using in-memory document store; inventory is lost on restart");
            Arc::new(InMemoryDocumentStore::new())
        }
        StoreBackend::Postgres { database_url } => Arc::new(
            PostgresDocumentStore::connect(database_url)
                .await
                .context("failed to connect to postgres document store")?,
        ),
    };

    Ok(AppServices::new(store, config.collection.clone(), config.write_strategy))
}
