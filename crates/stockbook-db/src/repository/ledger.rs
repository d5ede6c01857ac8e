//! # Stock Transaction Ledger
//!
//! The ledger is the only writer of `products.quantity`. Every stock movement
//! is recorded as a transaction row and applied to the product in the same
//! SQL transaction, so history and current stock can never disagree.
//!
//! ## Recording Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     record() - Atomic Stock Movement                    │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    1. Fetch product            ── missing?  → NotFound("Product")       │
//! │    2. Resolve customer         ── missing?  → NotFound("Customer")      │
//! │    3. Conditional UPDATE:                                               │
//! │         SET quantity = quantity + delta                                 │
//! │         WHERE id = ? AND quantity + delta >= 0                          │
//! │       0 rows matched           ──────────→ InsufficientStock           │
//! │    4. INSERT ledger row                                                 │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sufficiency check lives inside the UPDATE's WHERE clause. Two
//! concurrent stock-outs racing for the last units are serialized by
//! SQLite's write lock, and whichever runs second sees the decremented
//! quantity and matches zero rows. There is no check-then-act window.
//!
//! Reversal (`reverse`) deletes a ledger row and applies the inverse delta
//! under the same conditional guard, so undoing a stock-in can itself fail
//! with `InsufficientStock` if the received units were already sold. If the
//! product no longer exists the row is still deleted and the stock
//! adjustment is skipped.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockbook_core::{
    NewStockTransaction, StockTransaction, TransactionKind, TransactionRecord,
    DEFAULT_TRANSACTION_LIST_CAP,
};

/// Joined SELECT shared by every record-producing query.
const RECORD_QUERY: &str = r#"
    SELECT t.id, t.kind, t.product_id,
           p.name AS product_name, p.sku AS product_sku,
           t.customer_id, c.name AS customer_name,
           t.quantity, t.unit_price_cents, t.total_cents,
           t.reason, t.reference_number, t.notes, t.created_at
    FROM stock_transactions t
    INNER JOIN products p ON p.id = t.product_id
    LEFT JOIN customers c ON c.id = t.customer_id
"#;

// =============================================================================
// Filter
// =============================================================================

/// Filter for listing ledger entries.
///
/// All criteria are optional and combine with AND. `limit` defaults to the
/// standard list cap.
#[derive(Debug, Clone)]
pub struct TransactionFilter {
    /// Restrict to one movement direction.
    pub kind: Option<TransactionKind>,

    /// Only entries created at or after this instant.
    pub since: Option<DateTime<Utc>>,

    /// Case-insensitive substring match on product name, SKU or customer name.
    pub search: Option<String>,

    /// Maximum number of entries returned, newest first.
    pub limit: u32,
}

impl Default for TransactionFilter {
    fn default() -> Self {
        TransactionFilter {
            kind: None,
            since: None,
            search: None,
            limit: DEFAULT_TRANSACTION_LIST_CAP,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for the stock-transaction ledger.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    /// Records a stock movement atomically.
    ///
    /// ## Returns
    /// * `Ok(TransactionRecord)` - Ledger entry with resolved names
    /// * `Err(DbError::NotFound)` - Product or customer doesn't exist
    /// * `Err(DbError::InsufficientStock)` - Stock-out exceeds available quantity
    pub async fn record(&self, input: &NewStockTransaction) -> DbResult<TransactionRecord> {
        debug!(
            product_id = %input.product_id,
            kind = ?input.kind,
            quantity = input.quantity,
            "Recording stock movement"
        );

        let total = input
            .unit_price
            .line_total(input.quantity)
            .ok_or_else(|| DbError::Internal("transaction total overflows".to_string()))?;

        let delta = input.signed_delta();
        let now = Utc::now();
        let id = Uuid::new_v4().to_string();

        let mut tx = self.pool.begin().await?;

        // Existence checks run first so NotFound wins over InsufficientStock.
        let product: Option<(String, String, i64)> =
            sqlx::query_as("SELECT sku, name, quantity FROM products WHERE id = ?1")
                .bind(&input.product_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (sku, product_name, _) = match product {
            Some(p) => p,
            None => return Err(DbError::not_found("Product", &input.product_id)),
        };

        let customer_name: Option<String> = match &input.customer_id {
            Some(customer_id) => {
                let name: Option<String> =
                    sqlx::query_scalar("SELECT name FROM customers WHERE id = ?1")
                        .bind(customer_id)
                        .fetch_optional(&mut *tx)
                        .await?;
                match name {
                    Some(name) => Some(name),
                    None => return Err(DbError::not_found("Customer", customer_id)),
                }
            }
            None => None,
        };

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1 AND quantity + ?2 >= 0
            "#,
        )
        .bind(&input.product_id)
        .bind(delta)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            // Re-read inside the transaction so the reported availability is
            // the quantity the guard actually saw.
            let available: i64 = sqlx::query_scalar("SELECT quantity FROM products WHERE id = ?1")
                .bind(&input.product_id)
                .fetch_one(&mut *tx)
                .await?;

            return Err(DbError::InsufficientStock {
                sku,
                available,
                requested: input.quantity,
            });
        }

        sqlx::query(
            r#"
            INSERT INTO stock_transactions (
                id, kind, product_id, customer_id, quantity,
                unit_price_cents, total_cents, reason,
                reference_number, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&id)
        .bind(input.kind)
        .bind(&input.product_id)
        .bind(&input.customer_id)
        .bind(input.quantity)
        .bind(input.unit_price.cents())
        .bind(total.cents())
        .bind(input.reason)
        .bind(&input.reference_number)
        .bind(&input.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            id = %id,
            sku = %sku,
            delta = delta,
            "Stock movement recorded"
        );

        Ok(TransactionRecord {
            id,
            kind: input.kind,
            product_id: input.product_id.clone(),
            product_name,
            product_sku: sku,
            customer_id: input.customer_id.clone(),
            customer_name,
            quantity: input.quantity,
            unit_price_cents: input.unit_price.cents(),
            total_cents: total.cents(),
            reason: input.reason,
            reference_number: input.reference_number.clone(),
            notes: input.notes.clone(),
            created_at: now,
        })
    }

    /// Deletes a ledger entry, reversing its effect on the product's stock.
    ///
    /// Atomic like `record`. Undoing a stock-in below available stock fails
    /// with `InsufficientStock`. If the product has been removed the entry is
    /// still deleted and no stock adjustment occurs.
    pub async fn reverse(&self, id: &str) -> DbResult<StockTransaction> {
        debug!(id = %id, "Reversing stock movement");

        let mut tx = self.pool.begin().await?;

        let entry: Option<StockTransaction> = sqlx::query_as(
            r#"
            SELECT id, kind, product_id, customer_id, quantity, unit_price_cents,
                   total_cents, reason, reference_number, notes, created_at
            FROM stock_transactions WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let entry = match entry {
            Some(entry) => entry,
            None => return Err(DbError::not_found("Transaction", id)),
        };

        let delta = entry.reversal_delta();
        let now = Utc::now();

        let product: Option<(String, i64)> =
            sqlx::query_as("SELECT sku, quantity FROM products WHERE id = ?1")
                .bind(&entry.product_id)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some((sku, available)) = product {
            let updated = sqlx::query(
                r#"
                UPDATE products
                SET quantity = quantity + ?2, updated_at = ?3
                WHERE id = ?1 AND quantity + ?2 >= 0
                "#,
            )
            .bind(&entry.product_id)
            .bind(delta)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() == 0 {
                return Err(DbError::InsufficientStock {
                    sku,
                    available,
                    requested: entry.quantity,
                });
            }
        } else {
            // Product already gone: nothing to adjust, the row still goes.
            debug!(
                product_id = %entry.product_id,
                "Product missing during reversal, skipping stock adjustment"
            );
        }

        sqlx::query("DELETE FROM stock_transactions WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(id = %id, delta = delta, "Stock movement reversed");

        Ok(entry)
    }

    /// Gets a single ledger entry with resolved names.
    pub async fn get(&self, id: &str) -> DbResult<Option<TransactionRecord>> {
        let record = sqlx::query_as::<_, TransactionRecord>(&format!(
            "{RECORD_QUERY} WHERE t.id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    /// Lists ledger entries, newest first, capped by the filter's limit.
    pub async fn list(&self, filter: &TransactionFilter) -> DbResult<Vec<TransactionRecord>> {
        let records = sqlx::query_as::<_, TransactionRecord>(&format!(
            r#"
            {RECORD_QUERY}
            WHERE (?1 IS NULL OR t.kind = ?1)
              AND (?2 IS NULL OR t.created_at >= ?2)
              AND (?3 IS NULL OR p.name LIKE '%' || ?3 || '%'
                   OR p.sku LIKE '%' || ?3 || '%'
                   OR c.name LIKE '%' || ?3 || '%')
            ORDER BY t.created_at DESC
            LIMIT ?4
            "#
        ))
        .bind(filter.kind)
        .bind(filter.since)
        .bind(&filter.search)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Lists every ledger entry referencing a customer, newest first.
    ///
    /// Unbounded: used by the customer detail view and the deletion guard UI.
    pub async fn list_for_customer(&self, customer_id: &str) -> DbResult<Vec<TransactionRecord>> {
        let records = sqlx::query_as::<_, TransactionRecord>(&format!(
            "{RECORD_QUERY} WHERE t.customer_id = ?1 ORDER BY t.created_at DESC"
        ))
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records)
    }

    /// Counts total ledger entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_transactions")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockbook_core::{Money, NewCustomer, NewProduct, StockOutReason};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(db: &Database, sku: &str, quantity: i64) -> String {
        db.products()
            .insert(&NewProduct {
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                category: "widgets".to_string(),
                description: String::new(),
                quantity,
                price_cents: 500,
                cost_price_cents: 300,
                reorder_level: 10,
                supplier: String::new(),
                location: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    async fn seed_customer(db: &Database, name: &str) -> String {
        db.customers()
            .insert(&NewCustomer {
                name: name.to_string(),
                mobile: String::new(),
                email: None,
                address: String::new(),
                notes: None,
            })
            .await
            .unwrap()
            .id
    }

    fn stock_out(product_id: &str, customer_id: Option<String>, quantity: i64) -> NewStockTransaction {
        NewStockTransaction {
            kind: TransactionKind::StockOut,
            product_id: product_id.to_string(),
            customer_id,
            quantity,
            unit_price: Money::from_cents(500),
            reason: Some(StockOutReason::Sale),
            reference_number: None,
            notes: None,
        }
    }

    fn stock_in(product_id: &str, quantity: i64) -> NewStockTransaction {
        NewStockTransaction {
            kind: TransactionKind::StockIn,
            product_id: product_id.to_string(),
            customer_id: None,
            quantity,
            unit_price: Money::from_cents(300),
            reason: None,
            reference_number: None,
            notes: None,
        }
    }

    async fn quantity_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().quantity
    }

    #[tokio::test]
    async fn test_stock_in_increases_quantity() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 10).await;

        let record = db.ledger().record(&stock_in(&product_id, 5)).await.unwrap();

        assert_eq!(record.total_cents, 1500);
        assert_eq!(record.product_sku, "SKU-1");
        assert_eq!(quantity_of(&db, &product_id).await, 15);
    }

    #[tokio::test]
    async fn test_stock_out_decreases_quantity() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 10).await;
        let customer_id = seed_customer(&db, "Alice").await;

        let record = db
            .ledger()
            .record(&stock_out(&product_id, Some(customer_id), 4))
            .await
            .unwrap();

        assert_eq!(record.customer_name.as_deref(), Some("Alice"));
        assert_eq!(quantity_of(&db, &product_id).await, 6);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_no_trace() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 3).await;

        let err = db
            .ledger()
            .record(&stock_out(&product_id, None, 5))
            .await
            .unwrap_err();

        match err {
            DbError::InsufficientStock {
                sku,
                available,
                requested,
            } => {
                assert_eq!(sku, "SKU-1");
                assert_eq!(available, 3);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        // Neither the quantity nor the ledger changed.
        assert_eq!(quantity_of(&db, &product_id).await, 3);
        assert_eq!(db.ledger().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_exact_stock_out_reaches_zero() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 5).await;

        db.ledger()
            .record(&stock_out(&product_id, None, 5))
            .await
            .unwrap();

        assert_eq!(quantity_of(&db, &product_id).await, 0);
    }

    #[tokio::test]
    async fn test_missing_product_beats_insufficient_stock() {
        let db = test_db().await;
        let err = db
            .ledger()
            .record(&stock_out("missing", None, 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Product"));
    }

    #[tokio::test]
    async fn test_missing_customer_rejected() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 10).await;

        let err = db
            .ledger()
            .record(&stock_out(&product_id, Some("missing".to_string()), 1))
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "Customer"));
        // Existence check failure must not touch the stock.
        assert_eq!(quantity_of(&db, &product_id).await, 10);
    }

    #[tokio::test]
    async fn test_reverse_stock_out_restores_quantity() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 10).await;

        let record = db
            .ledger()
            .record(&stock_out(&product_id, None, 4))
            .await
            .unwrap();
        assert_eq!(quantity_of(&db, &product_id).await, 6);

        db.ledger().reverse(&record.id).await.unwrap();

        assert_eq!(quantity_of(&db, &product_id).await, 10);
        assert!(db.ledger().get(&record.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reverse_stock_in_can_fail() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 0).await;

        let received = db.ledger().record(&stock_in(&product_id, 10)).await.unwrap();
        db.ledger()
            .record(&stock_out(&product_id, None, 8))
            .await
            .unwrap();

        // Only 2 left; undoing the 10-unit receipt would go negative.
        let err = db.ledger().reverse(&received.id).await.unwrap_err();
        assert!(matches!(err, DbError::InsufficientStock { .. }));

        // The entry survives a failed reversal.
        assert!(db.ledger().get(&received.id).await.unwrap().is_some());
        assert_eq!(quantity_of(&db, &product_id).await, 2);
    }

    #[tokio::test]
    async fn test_reverse_after_product_vanishes() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 0).await;

        let received = db.ledger().record(&stock_in(&product_id, 10)).await.unwrap();

        // The API path can't delete a referenced product; remove it
        // out-of-band to simulate rows that predate the delete guard.
        sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(&product_id)
            .execute(db.pool())
            .await
            .unwrap();

        // Reversal still succeeds: the quantity step is skipped and the
        // ledger row is deleted anyway.
        let entry = db.ledger().reverse(&received.id).await.unwrap();
        assert_eq!(entry.id, received.id);
        assert_eq!(db.ledger().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reverse_missing_transaction() {
        let db = test_db().await;
        let err = db.ledger().reverse("missing").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_stock_outs_one_wins() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 5).await;

        let ledger_a = db.ledger();
        let ledger_b = db.ledger();
        let tx_a = stock_out(&product_id, None, 4);
        let tx_b = stock_out(&product_id, None, 4);

        let (a, b) = tokio::join!(ledger_a.record(&tx_a), ledger_b.record(&tx_b));

        let successes = [&a, &b].iter().filter(|r| r.is_ok()).count();
        assert_eq!(successes, 1);

        let failure = if a.is_err() { a } else { b };
        assert!(matches!(
            failure.unwrap_err(),
            DbError::InsufficientStock { .. }
        ));

        assert_eq!(quantity_of(&db, &product_id).await, 1);
        assert_eq!(db.ledger().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_list_filters_and_cap() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 100).await;

        db.ledger().record(&stock_in(&product_id, 10)).await.unwrap();
        db.ledger()
            .record(&stock_out(&product_id, None, 3))
            .await
            .unwrap();
        db.ledger()
            .record(&stock_out(&product_id, None, 2))
            .await
            .unwrap();

        let all = db.ledger().list(&TransactionFilter::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let outs = db
            .ledger()
            .list(&TransactionFilter {
                kind: Some(TransactionKind::StockOut),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(outs.len(), 2);

        let capped = db
            .ledger()
            .list(&TransactionFilter {
                limit: 2,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(capped.len(), 2);

        let searched = db
            .ledger()
            .list(&TransactionFilter {
                search: Some("SKU-1".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(searched.len(), 3);

        let nothing = db
            .ledger()
            .list(&TransactionFilter {
                search: Some("nope".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(nothing.is_empty());
    }

    #[tokio::test]
    async fn test_list_for_customer() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 100).await;
        let alice = seed_customer(&db, "Alice").await;
        let bob = seed_customer(&db, "Bob").await;

        db.ledger()
            .record(&stock_out(&product_id, Some(alice.clone()), 1))
            .await
            .unwrap();
        db.ledger()
            .record(&stock_out(&product_id, Some(bob), 2))
            .await
            .unwrap();

        let for_alice = db.ledger().list_for_customer(&alice).await.unwrap();
        assert_eq!(for_alice.len(), 1);
        assert_eq!(for_alice[0].quantity, 1);
    }

    #[tokio::test]
    async fn test_delete_guards_fire_after_activity() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-1", 10).await;
        let customer_id = seed_customer(&db, "Alice").await;

        db.ledger()
            .record(&stock_out(&product_id, Some(customer_id.clone()), 1))
            .await
            .unwrap();

        assert!(matches!(
            db.products().delete(&product_id).await.unwrap_err(),
            DbError::HasTransactions { .. }
        ));
        assert!(matches!(
            db.customers().delete(&customer_id).await.unwrap_err(),
            DbError::HasTransactions { .. }
        ));
    }
}
