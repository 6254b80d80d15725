use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;

use super::r#trait::{
    Decrement, Document, DocumentStore, Increment, StoreError, StoreResult, counter_value,
    incremented_counter,
};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DocKey {
    collection: String,
    key: String,
}

impl DocKey {
    fn new(collection: &str, key: &str) -> Self {
        Self {
            collection: collection.to_string(),
            key: key.to_string(),
        }
    }
}

/// In-memory document store.
///
/// Intended for tests/dev. Scan order is `HashMap` iteration order, which is
/// unspecified, like most remote document stores.
#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    docs: RwLock<HashMap<DocKey, Document>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("lock poisoned".to_string())
}

#[async_trait::async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn point_read(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs.get(&DocKey::new(collection, key)).cloned())
    }

    async fn point_write(&self, collection: &str, key: &str, document: Document) -> StoreResult<()> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        docs.insert(DocKey::new(collection, key), document);
        Ok(())
    }

    async fn point_delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        docs.remove(&DocKey::new(collection, key));
        Ok(())
    }

    async fn scan_all(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        let docs = self.docs.read().map_err(|_| poisoned())?;
        Ok(docs
            .iter()
            .filter(|(k, _)| k.collection == collection)
            .map(|(k, d)| (k.key.clone(), d.clone()))
            .collect())
    }

    async fn increment_or_init(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> StoreResult<Option<Increment>> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        let doc_key = DocKey::new(collection, key);

        let increment = match docs.get_mut(&doc_key) {
            Some(doc) => {
                let (previous, current) = incremented_counter(doc, field)?;
                doc.insert(field.to_string(), JsonValue::from(current));
                Increment {
                    previous: Some(previous),
                    current,
                }
            }
            None => {
                let mut doc = Document::new();
                doc.insert(field.to_string(), JsonValue::from(1));
                docs.insert(doc_key, doc);
                Increment {
                    previous: None,
                    current: 1,
                }
            }
        };

        Ok(Some(increment))
    }

    async fn decrement_or_delete(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> StoreResult<Option<Decrement>> {
        let mut docs = self.docs.write().map_err(|_| poisoned())?;
        let doc_key = DocKey::new(collection, key);

        let previous = match docs.get(&doc_key) {
            Some(doc) => counter_value(doc, field)?,
            None => return Ok(Some(Decrement::Absent)),
        };

        if previous == 1 {
            docs.remove(&doc_key);
            return Ok(Some(Decrement::Deleted));
        }

        let current = previous - 1;
        if let Some(doc) = docs.get_mut(&doc_key) {
            doc.insert(field.to_string(), JsonValue::from(current));
        }
        Ok(Some(Decrement::Decremented { previous, current }))
    }
}
