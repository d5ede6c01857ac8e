//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD with an immutable SKU
//! - Derived queries: low stock, by category
//! - Deletion guarded by ledger references
//!
//! ## Quantity Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                  Who May Touch products.quantity?                       │
//! │                                                                         │
//! │  insert()           sets the opening stock level          ✅            │
//! │  LedgerRepository   applies signed deltas atomically      ✅            │
//! │  update()           NEVER touches quantity                ❌            │
//! │                                                                         │
//! │  A generic update that could edit quantity would let current stock      │
//! │  drift away from ledger history. The column changes only through        │
//! │  the ledger's conditional UPDATE.                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockbook_core::{NewProduct, Product, ProductUpdate};

/// Column list shared by every product SELECT.
const PRODUCT_COLUMNS: &str = "id, sku, name, category, description, quantity, \
     price_cents, cost_price_cents, reorder_level, supplier, location, \
     created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products, name ascending.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
        ))
        .bind(sku)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Created product with generated id and timestamps
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, input: &NewProduct) -> DbResult<Product> {
        debug!(sku = %input.sku, "Inserting product");

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            sku: input.sku.clone(),
            name: input.name.clone(),
            category: input.category.clone(),
            description: input.description.clone(),
            quantity: input.quantity,
            price_cents: input.price_cents,
            cost_price_cents: input.cost_price_cents,
            reorder_level: input.reorder_level,
            supplier: input.supplier.clone(),
            location: input.location.clone(),
            created_at: now,
            updated_at: now,
        };

        let result = sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, category, description, quantity,
                price_cents, cost_price_cents, reorder_level,
                supplier, location, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.category)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(product.price_cents)
        .bind(product.cost_price_cents)
        .bind(product.reorder_level)
        .bind(&product.supplier)
        .bind(&product.location)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(product),
            // Rewrite the raw constraint message into a caller-friendly one
            Err(e) => match DbError::from(e) {
                DbError::UniqueViolation { .. } => Err(DbError::duplicate("sku", &input.sku)),
                other => Err(other),
            },
        }
    }

    /// Updates an existing product.
    ///
    /// `sku` and `quantity` cannot be changed through this path: the SKU is
    /// immutable and stock moves only through the ledger. `updated_at` is
    /// refreshed on every write.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Updated product
    /// * `Err(DbError::NotFound)` - Product doesn't exist
    pub async fn update(&self, id: &str, changes: &ProductUpdate) -> DbResult<Product> {
        debug!(id = %id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                category = ?3,
                description = ?4,
                price_cents = ?5,
                cost_price_cents = ?6,
                reorder_level = ?7,
                supplier = ?8,
                location = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.category)
        .bind(&changes.description)
        .bind(changes.price_cents)
        .bind(changes.cost_price_cents)
        .bind(changes.reorder_level)
        .bind(&changes.supplier)
        .bind(&changes.location)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// Refused while any ledger entry references the product, mirroring the
    /// customer deletion guard. Delete or reverse the transactions first.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        // Guard and delete share one transaction; a ledger insert cannot
        // land between the reference count and the DELETE.
        let mut tx = self.pool.begin().await?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_transactions WHERE product_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if references > 0 {
            return Err(DbError::has_transactions("product", id, references));
        }

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Lists products at or below their reorder level, ascending by quantity.
    pub async fn low_stock(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE quantity <= reorder_level ORDER BY quantity"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Lists products in a category (exact match), name ascending.
    pub async fn by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE category = ?1 ORDER BY name"
        ))
        .bind(category)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Counts total products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
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

    fn new_product(sku: &str, quantity: i64, reorder_level: i64) -> NewProduct {
        NewProduct {
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            category: "widgets".to_string(),
            description: String::new(),
            quantity,
            price_cents: 500,
            cost_price_cents: 300,
            reorder_level,
            supplier: String::new(),
            location: String::new(),
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(&new_product("SKU-1", 5, 10)).await.unwrap();
        assert_eq!(created.quantity, 5);

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.sku, "SKU-1");

        let by_sku = repo.get_by_sku("SKU-1").await.unwrap().unwrap();
        assert_eq!(by_sku.id, created.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku_rejected() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&new_product("SKU-1", 0, 10)).await.unwrap();
        let err = repo.insert(&new_product("SKU-1", 0, 10)).await.unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "SKU-1");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_cannot_change_sku_or_quantity() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(&new_product("SKU-1", 7, 10)).await.unwrap();

        let updated = repo
            .update(
                &created.id,
                &ProductUpdate {
                    name: "Renamed".to_string(),
                    category: "gadgets".to_string(),
                    description: "desc".to_string(),
                    price_cents: 900,
                    cost_price_cents: 400,
                    reorder_level: 3,
                    supplier: "Acme".to_string(),
                    location: "A-1".to_string(),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.name, "Renamed");
        assert_eq!(updated.sku, "SKU-1");
        assert_eq!(updated.quantity, 7);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_missing_product() {
        let db = test_db().await;
        let err = db
            .products()
            .update(
                "missing",
                &ProductUpdate {
                    name: "x".to_string(),
                    category: "y".to_string(),
                    description: String::new(),
                    price_cents: 0,
                    cost_price_cents: 0,
                    reorder_level: 0,
                    supplier: String::new(),
                    location: String::new(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_low_stock_ordering() {
        let db = test_db().await;
        let repo = db.products();

        // (quantity, reorder_level): (0,10) and (5,10) are low, (15,10) is not
        repo.insert(&new_product("SKU-A", 5, 10)).await.unwrap();
        repo.insert(&new_product("SKU-B", 0, 10)).await.unwrap();
        repo.insert(&new_product("SKU-C", 15, 10)).await.unwrap();

        let low = repo.low_stock().await.unwrap();
        let skus: Vec<&str> = low.iter().map(|p| p.sku.as_str()).collect();
        assert_eq!(skus, vec!["SKU-B", "SKU-A"]);
    }

    #[tokio::test]
    async fn test_by_category() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&new_product("SKU-1", 0, 10)).await.unwrap();
        let mut other = new_product("SKU-2", 0, 10);
        other.category = "gadgets".to_string();
        repo.insert(&other).await.unwrap();

        let widgets = repo.by_category("widgets").await.unwrap();
        assert_eq!(widgets.len(), 1);
        assert_eq!(widgets[0].sku, "SKU-1");
    }

    #[tokio::test]
    async fn test_delete_unblocked_after_reversal() {
        use stockbook_core::{Money, NewStockTransaction, TransactionKind};

        let db = test_db().await;
        let created = db.products().insert(&new_product("SKU-1", 0, 10)).await.unwrap();

        let received = db
            .ledger()
            .record(&NewStockTransaction {
                kind: TransactionKind::StockIn,
                product_id: created.id.clone(),
                customer_id: None,
                quantity: 5,
                unit_price: Money::from_cents(300),
                reason: None,
                reference_number: None,
                notes: None,
            })
            .await
            .unwrap();

        assert!(matches!(
            db.products().delete(&created.id).await.unwrap_err(),
            DbError::HasTransactions { count: 1, .. }
        ));

        // Reversing the receipt clears the reference and the delete commits.
        db.ledger().reverse(&received.id).await.unwrap();
        db.products().delete(&created.id).await.unwrap();
        assert!(db.products().get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.products();

        let created = repo.insert(&new_product("SKU-1", 0, 10)).await.unwrap();
        repo.delete(&created.id).await.unwrap();

        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete(&created.id).await.unwrap_err(),
            DbError::NotFound { .. }
        ));
    }
}
