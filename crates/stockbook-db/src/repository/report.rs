//! # Reporting Repository
//!
//! Read-only aggregations over products, customers and the ledger. Reports
//! are computed in SQL so they always reflect committed state; nothing here
//! writes.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use stockbook_core::TransactionKind;

// =============================================================================
// Report Types
// =============================================================================

/// Whole-inventory valuation snapshot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct InventoryValuation {
    /// Number of distinct products.
    pub total_products: i64,
    /// Sum of all quantities on hand.
    pub total_units: i64,
    /// `Σ quantity × price_cents`.
    pub retail_value_cents: i64,
    /// `Σ quantity × cost_price_cents`.
    pub cost_value_cents: i64,
    /// Products at or below their reorder level.
    pub low_stock_count: i64,
    /// Products with zero quantity on hand.
    pub out_of_stock_count: i64,
}

/// Per-category rollup of the product catalogue.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategorySummary {
    pub category: String,
    pub product_count: i64,
    pub total_units: i64,
    pub retail_value_cents: i64,
}

/// Totals for one movement direction.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementTotals {
    pub count: i64,
    pub units: i64,
    pub total_cents: i64,
}

/// One (kind, category) cell of the transaction breakdown.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct MovementBreakdown {
    pub kind: TransactionKind,
    pub category: String,
    pub count: i64,
    pub units: i64,
    pub total_cents: i64,
}

/// Ledger activity summary, optionally windowed by `since`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionSummary {
    pub stock_in: MovementTotals,
    pub stock_out: MovementTotals,
    /// Per-category cells, ordered by category then kind.
    pub breakdown: Vec<MovementBreakdown>,
}

/// Sales activity for one customer.
///
/// Customers with no recorded sales appear with zero totals, so the report
/// doubles as a full customer listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomerActivity {
    pub customer_id: String,
    pub name: String,
    pub mobile: String,
    pub transaction_count: i64,
    pub total_units: i64,
    pub total_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for report aggregations.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Computes the whole-inventory valuation.
    pub async fn inventory_valuation(&self) -> DbResult<InventoryValuation> {
        debug!("Computing inventory valuation");

        let report = sqlx::query_as::<_, InventoryValuation>(
            r#"
            SELECT
                COUNT(*) AS total_products,
                COALESCE(SUM(quantity), 0) AS total_units,
                COALESCE(SUM(quantity * price_cents), 0) AS retail_value_cents,
                COALESCE(SUM(quantity * cost_price_cents), 0) AS cost_value_cents,
                COALESCE(SUM(quantity <= reorder_level), 0) AS low_stock_count,
                COALESCE(SUM(quantity = 0), 0) AS out_of_stock_count
            FROM products
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(report)
    }

    /// Rolls the catalogue up by category, alphabetical.
    pub async fn category_summary(&self) -> DbResult<Vec<CategorySummary>> {
        let rows = sqlx::query_as::<_, CategorySummary>(
            r#"
            SELECT
                category,
                COUNT(*) AS product_count,
                COALESCE(SUM(quantity), 0) AS total_units,
                COALESCE(SUM(quantity * price_cents), 0) AS retail_value_cents
            FROM products
            GROUP BY category
            ORDER BY category
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Summarizes ledger activity, optionally restricted to entries at or
    /// after `since`.
    pub async fn transaction_summary(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> DbResult<TransactionSummary> {
        debug!(?since, "Computing transaction summary");

        let totals: Vec<(TransactionKind, i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT kind,
                   COUNT(*),
                   COALESCE(SUM(quantity), 0),
                   COALESCE(SUM(total_cents), 0)
            FROM stock_transactions
            WHERE (?1 IS NULL OR created_at >= ?1)
            GROUP BY kind
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        let mut stock_in = MovementTotals::default();
        let mut stock_out = MovementTotals::default();
        for (kind, count, units, total_cents) in totals {
            let slot = match kind {
                TransactionKind::StockIn => &mut stock_in,
                TransactionKind::StockOut => &mut stock_out,
            };
            slot.count = count;
            slot.units = units;
            slot.total_cents = total_cents;
        }

        let breakdown = sqlx::query_as::<_, MovementBreakdown>(
            r#"
            SELECT t.kind,
                   p.category,
                   COUNT(*) AS count,
                   COALESCE(SUM(t.quantity), 0) AS units,
                   COALESCE(SUM(t.total_cents), 0) AS total_cents
            FROM stock_transactions t
            INNER JOIN products p ON p.id = t.product_id
            WHERE (?1 IS NULL OR t.created_at >= ?1)
            GROUP BY p.category, t.kind
            ORDER BY p.category, t.kind
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(TransactionSummary {
            stock_in,
            stock_out,
            breakdown,
        })
    }

    /// Per-customer sales activity, biggest spenders first.
    ///
    /// Folds sale-type stock-outs only. `limit` trims the ranking to a top-N;
    /// ties sort stably by name. LIMIT -1 means unbounded in SQLite.
    pub async fn customer_activity(&self, limit: Option<u32>) -> DbResult<Vec<CustomerActivity>> {
        let rows = sqlx::query_as::<_, CustomerActivity>(
            r#"
            SELECT
                c.id AS customer_id,
                c.name,
                c.mobile,
                COUNT(t.id) AS transaction_count,
                COALESCE(SUM(t.quantity), 0) AS total_units,
                COALESCE(SUM(t.total_cents), 0) AS total_cents
            FROM customers c
            LEFT JOIN stock_transactions t
                ON t.customer_id = c.id AND t.kind = 'stock-out' AND t.reason = 'sale'
            GROUP BY c.id
            ORDER BY total_cents DESC, c.name ASC
            LIMIT CASE WHEN ?1 IS NULL THEN -1 ELSE ?1 END
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use stockbook_core::{Money, NewCustomer, NewProduct, NewStockTransaction, StockOutReason};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn seed_product(
        db: &Database,
        sku: &str,
        category: &str,
        quantity: i64,
        price_cents: i64,
        cost_price_cents: i64,
    ) -> String {
        db.products()
            .insert(&NewProduct {
                sku: sku.to_string(),
                name: format!("Product {sku}"),
                category: category.to_string(),
                description: String::new(),
                quantity,
                price_cents,
                cost_price_cents,
                reorder_level: 5,
                supplier: String::new(),
                location: String::new(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_inventory_valuation() {
        let db = test_db().await;

        // 10 × 100/60 and 2 × 500/300; the second is at/below reorder level 5
        seed_product(&db, "SKU-A", "widgets", 10, 100, 60).await;
        seed_product(&db, "SKU-B", "gadgets", 2, 500, 300).await;

        let report = db.reports().inventory_valuation().await.unwrap();
        assert_eq!(report.total_products, 2);
        assert_eq!(report.total_units, 12);
        assert_eq!(report.retail_value_cents, 10 * 100 + 2 * 500);
        assert_eq!(report.cost_value_cents, 10 * 60 + 2 * 300);
        assert_eq!(report.low_stock_count, 1);
        assert_eq!(report.out_of_stock_count, 0);
    }

    #[tokio::test]
    async fn test_out_of_stock_count() {
        let db = test_db().await;
        seed_product(&db, "SKU-A", "widgets", 0, 100, 60).await;
        seed_product(&db, "SKU-B", "widgets", 3, 100, 60).await;

        let report = db.reports().inventory_valuation().await.unwrap();
        assert_eq!(report.out_of_stock_count, 1);
        assert_eq!(report.low_stock_count, 2);
    }

    #[tokio::test]
    async fn test_inventory_valuation_empty() {
        let db = test_db().await;
        let report = db.reports().inventory_valuation().await.unwrap();
        assert_eq!(report.total_products, 0);
        assert_eq!(report.retail_value_cents, 0);
    }

    #[tokio::test]
    async fn test_category_summary() {
        let db = test_db().await;
        seed_product(&db, "SKU-A", "widgets", 10, 100, 60).await;
        seed_product(&db, "SKU-B", "widgets", 5, 200, 100).await;
        seed_product(&db, "SKU-C", "gadgets", 1, 999, 500).await;

        let rows = db.reports().category_summary().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].category, "gadgets");
        assert_eq!(rows[1].category, "widgets");
        assert_eq!(rows[1].product_count, 2);
        assert_eq!(rows[1].total_units, 15);
        assert_eq!(rows[1].retail_value_cents, 10 * 100 + 5 * 200);
    }

    #[tokio::test]
    async fn test_transaction_summary() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-A", "widgets", 0, 500, 300).await;

        db.ledger()
            .record(&NewStockTransaction {
                kind: TransactionKind::StockIn,
                product_id: product_id.clone(),
                customer_id: None,
                quantity: 10,
                unit_price: Money::from_cents(300),
                reason: None,
                reference_number: None,
                notes: None,
            })
            .await
            .unwrap();
        db.ledger()
            .record(&NewStockTransaction {
                kind: TransactionKind::StockOut,
                product_id,
                customer_id: None,
                quantity: 4,
                unit_price: Money::from_cents(500),
                reason: Some(StockOutReason::Damage),
                reference_number: None,
                notes: None,
            })
            .await
            .unwrap();

        let summary = db.reports().transaction_summary(None).await.unwrap();
        assert_eq!(summary.stock_in.count, 1);
        assert_eq!(summary.stock_in.units, 10);
        assert_eq!(summary.stock_in.total_cents, 3000);
        assert_eq!(summary.stock_out.count, 1);
        assert_eq!(summary.stock_out.units, 4);
        assert_eq!(summary.stock_out.total_cents, 2000);
        assert_eq!(summary.breakdown.len(), 2);
        assert_eq!(summary.breakdown[0].category, "widgets");
    }

    #[tokio::test]
    async fn test_customer_activity_includes_quiet_customers() {
        let db = test_db().await;
        let product_id = seed_product(&db, "SKU-A", "widgets", 100, 500, 300).await;

        let alice = db
            .customers()
            .insert(&NewCustomer {
                name: "Alice".to_string(),
                mobile: "111".to_string(),
                email: None,
                address: String::new(),
                notes: None,
            })
            .await
            .unwrap();
        db.customers()
            .insert(&NewCustomer {
                name: "Bob".to_string(),
                mobile: "222".to_string(),
                email: None,
                address: String::new(),
                notes: None,
            })
            .await
            .unwrap();

        db.ledger()
            .record(&NewStockTransaction {
                kind: TransactionKind::StockOut,
                product_id,
                customer_id: Some(alice.id.clone()),
                quantity: 3,
                unit_price: Money::from_cents(500),
                reason: Some(StockOutReason::Sale),
                reference_number: None,
                notes: None,
            })
            .await
            .unwrap();

        let rows = db.reports().customer_activity(None).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name, "Alice");
        assert_eq!(rows[0].transaction_count, 1);
        assert_eq!(rows[0].total_cents, 1500);
        assert_eq!(rows[1].name, "Bob");
        assert_eq!(rows[1].transaction_count, 0);
        assert_eq!(rows[1].total_cents, 0);

        let top_one = db.reports().customer_activity(Some(1)).await.unwrap();
        assert_eq!(top_one.len(), 1);
        assert_eq!(top_one[0].name, "Alice");
    }
}
