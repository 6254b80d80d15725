use std::sync::Arc;

use serde_json::Value as JsonValue;
use thiserror::Error;

/// A stored document body: a flat JSON object.
pub type Document = serde_json::Map<String, JsonValue>;

pub type StoreResult<T> = Result<T, StoreError>;

/// Document store operation error.
///
/// These are **infrastructure errors**. "No such document" is never an error:
/// point reads return `Ok(None)` for absent keys.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the call (network, pool,
    /// permissions, poisoned lock).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A document could not be encoded/decoded, or a counter field did not
    /// hold a positive integer.
    #[error("document codec error: {0}")]
    Codec(String),

    /// A counter already holds the largest value the store can represent.
    #[error("counter overflow: {0}")]
    CounterOverflow(String),
}

/// Result of a native increment-or-initialize.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Increment {
    /// Counter value before the call; `None` if the document was created.
    pub previous: Option<i64>,
    pub current: i64,
}

/// Result of a native decrement-or-delete.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Decrement {
    /// No document under the key; nothing was changed.
    Absent,
    /// The counter was at 1 and the document was deleted.
    Deleted,
    Decremented { previous: i64, current: i64 },
}

/// Keyed document collections with point and scan operations.
///
/// ## Contract
///
/// - `point_write` is a full overwrite of the document body.
/// - `point_delete` of an absent key succeeds.
/// - `scan_all` returns every `(key, document)` of a collection in the
///   backend's native order; callers must not rely on that order.
/// - A client observes its own writes on subsequent reads.
///
/// ## Atomic counters
///
/// `increment_or_init` and `decrement_or_delete` are optional native
/// primitives operating on one integer field. The defaults return `Ok(None)`,
/// meaning "not supported"; callers then fall back to read-modify-write.
/// Implementations that support them must apply each call atomically with
/// respect to other calls on the same key.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    async fn point_read(&self, collection: &str, key: &str) -> StoreResult<Option<Document>>;

    async fn point_write(&self, collection: &str, key: &str, document: Document) -> StoreResult<()>;

    async fn point_delete(&self, collection: &str, key: &str) -> StoreResult<()>;

    async fn scan_all(&self, collection: &str) -> StoreResult<Vec<(String, Document)>>;

    /// Add one to `field`, creating the document as `{field: 1}` if absent.
    async fn increment_or_init(
        &self,
        _collection: &str,
        _key: &str,
        _field: &str,
    ) -> StoreResult<Option<Increment>> {
        Ok(None)
    }

    /// Subtract one from `field`, deleting the document when it reaches zero.
    async fn decrement_or_delete(
        &self,
        _collection: &str,
        _key: &str,
        _field: &str,
    ) -> StoreResult<Option<Decrement>> {
        Ok(None)
    }
}

#[async_trait::async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn point_read(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        (**self).point_read(collection, key).await
    }

    async fn point_write(&self, collection: &str, key: &str, document: Document) -> StoreResult<()> {
        (**self).point_write(collection, key, document).await
    }

    async fn point_delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        (**self).point_delete(collection, key).await
    }

    async fn scan_all(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        (**self).scan_all(collection).await
    }

    async fn increment_or_init(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> StoreResult<Option<Increment>> {
        (**self).increment_or_init(collection, key, field).await
    }

    async fn decrement_or_delete(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> StoreResult<Option<Decrement>> {
        (**self).decrement_or_delete(collection, key, field).await
    }
}

/// Read `field` of `document` as a counter (a positive integer).
pub(crate) fn counter_value(document: &Document, field: &str) -> StoreResult<i64> {
    let value = document
        .get(field)
        .ok_or_else(|| StoreError::Codec(format!("missing counter field '{field}'")))?;

    match value.as_i64() {
        Some(n) if n >= 1 => Ok(n),
        _ => Err(StoreError::Codec(format!(
            "counter field '{field}' is not a positive integer: {value}"
        ))),
    }
}

/// Value `field` of `document` takes after one increment.
///
/// Refuses anything [`counter_value`] refuses, so callers can check before
/// writing and leave a bad document untouched.
pub(crate) fn incremented_counter(document: &Document, field: &str) -> StoreResult<(i64, i64)> {
    let previous = counter_value(document, field)?;
    let current = previous
        .checked_add(1)
        .ok_or_else(|| StoreError::CounterOverflow(format!("counter field '{field}' is at {previous}")))?;
    Ok((previous, current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: JsonValue) -> Document {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn counter_value_reads_positive_integers() {
        assert_eq!(counter_value(&doc(json!({"quantity": 3})), "quantity").unwrap(), 3);
    }

    #[test]
    fn counter_value_rejects_bad_shapes() {
        for bad in [
            json!({}),
            json!({"quantity": 0}),
            json!({"quantity": -2}),
            json!({"quantity": "3"}),
            json!({"quantity": 1.5}),
            json!({"quantity": null}),
        ] {
            assert!(matches!(
                counter_value(&doc(bad), "quantity"),
                Err(StoreError::Codec(_))
            ));
        }
    }

    #[test]
    fn increment_checks_the_counter_first() {
        assert_eq!(
            incremented_counter(&doc(json!({"quantity": 4})), "quantity").unwrap(),
            (4, 5)
        );
        for bad in [json!({}), json!({"quantity": 0}), json!({"quantity": "3"})] {
            assert!(matches!(
                incremented_counter(&doc(bad), "quantity"),
                Err(StoreError::Codec(_))
            ));
        }
        assert!(matches!(
            incremented_counter(&doc(json!({"quantity": i64::MAX})), "quantity"),
            Err(StoreError::CounterOverflow(_))
        ));
    }
}
