//! Postgres-backed document store implementation.
//!
//! Every collection lives in one table keyed by `(collection, key)`, with the
//! document body stored as `JSONB`.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError | Scenario |
//! |------------|----------------------|------------|----------|
//! | Database | Any | `Unavailable` | Permissions, constraint, server errors |
//! | Decode / ColumnDecode | N/A | `Codec` | Body is not a JSON object |
//! | PoolClosed / Io / Tls / other | N/A | `Unavailable` | Network errors, connection failures, etc. |
//!
//! ## Atomic counters
//!
//! Both run in a transaction. `increment_or_init` first tries
//! `INSERT .. ON CONFLICT DO NOTHING`; on conflict it and `decrement_or_delete`
//! take a row lock (`SELECT .. FOR UPDATE`), so concurrent calls on the same
//! key serialize. The counter is checked in Rust before anything is written,
//! so a corrupt document is reported and left as it was.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use super::r#trait::{
    Decrement, Document, DocumentStore, Increment, StoreError, StoreResult, counter_value,
    incremented_counter,
};

const INCREMENT_ATTEMPTS: usize = 3;

/// Postgres-backed document store.
///
/// Uses the SQLx connection pool, which is `Send + Sync`; clones share it.
#[derive(Debug, Clone)]
pub struct PostgresDocumentStore {
    pool: Arc<PgPool>,
}

impl PostgresDocumentStore {
    /// Create a new PostgresDocumentStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Connect to `database_url` and make sure the documents table exists.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    /// Create the documents table if it does not exist yet.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS pantry_documents (
                collection TEXT  NOT NULL,
                key        TEXT  NOT NULL,
                body       JSONB NOT NULL,
                PRIMARY KEY (collection, key)
            )
            "#,
        )
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl DocumentStore for PostgresDocumentStore {
    #[instrument(skip(self), err)]
    async fn point_read(&self, collection: &str, key: &str) -> StoreResult<Option<Document>> {
        let row = sqlx::query(
            r#"
            SELECT body
            FROM pantry_documents
            WHERE collection = $1 AND key = $2
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("point_read", e))?;

        row.map(|r| decode_body(&r)).transpose()
    }

    #[instrument(skip(self, document), err)]
    async fn point_write(&self, collection: &str, key: &str, document: Document) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO pantry_documents (collection, key, body)
            VALUES ($1, $2, $3)
            ON CONFLICT (collection, key) DO UPDATE SET body = EXCLUDED.body
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(Json(document))
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("point_write", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn point_delete(&self, collection: &str, key: &str) -> StoreResult<()> {
        sqlx::query("DELETE FROM pantry_documents WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("point_delete", e))?;
        Ok(())
    }

    #[instrument(skip(self), err)]
    async fn scan_all(&self, collection: &str) -> StoreResult<Vec<(String, Document)>> {
        let rows = sqlx::query(
            r#"
            SELECT key, body
            FROM pantry_documents
            WHERE collection = $1
            ORDER BY key ASC
            "#,
        )
        .bind(collection)
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("scan_all", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row
                .try_get("key")
                .map_err(|e| StoreError::Codec(format!("failed to read key: {e}")))?;
            out.push((key, decode_body(&row)?));
        }

        tracing::Span::current().record("document_count", out.len());
        Ok(out)
    }

    #[instrument(skip(self), err)]
    async fn increment_or_init(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> StoreResult<Option<Increment>> {
        // A concurrent delete can remove the row between a lost insert and the
        // locking read; start over when that happens.
        for _ in 0..INCREMENT_ATTEMPTS {
            let mut tx = self
                .pool
                .begin()
                .await
                .map_err(|e| map_sqlx_error("increment_or_init", e))?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO pantry_documents (collection, key, body)
                VALUES ($1, $2, jsonb_build_object($3::text, 1))
                ON CONFLICT (collection, key) DO NOTHING
                "#,
            )
            .bind(collection)
            .bind(key)
            .bind(field)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("increment_or_init", e))?
            .rows_affected()
                == 1;

            if inserted {
                tx.commit()
                    .await
                    .map_err(|e| map_sqlx_error("increment_or_init", e))?;
                return Ok(Some(Increment {
                    previous: None,
                    current: 1,
                }));
            }

            let row = sqlx::query(
                r#"
                SELECT body
                FROM pantry_documents
                WHERE collection = $1 AND key = $2
                FOR UPDATE
                "#,
            )
            .bind(collection)
            .bind(key)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("increment_or_init", e))?;

            let Some(row) = row else {
                continue;
            };

            // Validated before the update; dropping `tx` rolls back.
            let mut body = decode_body(&row)?;
            let (previous, current) = incremented_counter(&body, field)?;
            body.insert(field.to_string(), JsonValue::from(current));

            sqlx::query("UPDATE pantry_documents SET body = $3 WHERE collection = $1 AND key = $2")
                .bind(collection)
                .bind(key)
                .bind(Json(body))
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("increment_or_init", e))?;

            tx.commit()
                .await
                .map_err(|e| map_sqlx_error("increment_or_init", e))?;
            return Ok(Some(Increment {
                previous: Some(previous),
                current,
            }));
        }

        Err(StoreError::Unavailable(format!(
            "increment of '{key}' kept racing with deletes"
        )))
    }

    #[instrument(skip(self), err)]
    async fn decrement_or_delete(
        &self,
        collection: &str,
        key: &str,
        field: &str,
    ) -> StoreResult<Option<Decrement>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("decrement_or_delete", e))?;

        let row = sqlx::query(
            r#"
            SELECT body
            FROM pantry_documents
            WHERE collection = $1 AND key = $2
            FOR UPDATE
            "#,
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("decrement_or_delete", e))?;

        // Dropping `tx` without commit rolls back and releases the lock.
        let mut body = match row {
            Some(r) => decode_body(&r)?,
            None => return Ok(Some(Decrement::Absent)),
        };
        let previous = counter_value(&body, field)?;

        let outcome = if previous == 1 {
            sqlx::query("DELETE FROM pantry_documents WHERE collection = $1 AND key = $2")
                .bind(collection)
                .bind(key)
                .execute(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("decrement_or_delete", e))?;
            Decrement::Deleted
        } else {
            let current = previous - 1;
            body.insert(field.to_string(), JsonValue::from(current));
            sqlx::query(
                "UPDATE pantry_documents SET body = $3 WHERE collection = $1 AND key = $2",
            )
            .bind(collection)
            .bind(key)
            .bind(Json(body))
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("decrement_or_delete", e))?;
            Decrement::Decremented { previous, current }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("decrement_or_delete", e))?;
        Ok(Some(outcome))
    }
}

fn decode_body(row: &sqlx::postgres::PgRow) -> StoreResult<Document> {
    let Json(body): Json<Document> = row
        .try_get("body")
        .map_err(|e| StoreError::Codec(format!("document body is not a JSON object: {e}")))?;
    Ok(body)
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            StoreError::Unavailable(format!("database error in {}: {}", operation, db_err.message()))
        }
        sqlx::Error::Decode(e) | sqlx::Error::ColumnDecode { source: e, .. } => {
            StoreError::Codec(format!("decode error in {}: {}", operation, e))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Unavailable(format!("connection pool closed in {}", operation))
        }
        _ => StoreError::Unavailable(format!("sqlx error in {}: {}", operation, err)),
    }
}
