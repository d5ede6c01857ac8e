//! # Customer Repository
//!
//! Database operations for customers. Deletion is guarded: a customer that
//! appears on any ledger entry cannot be removed, keeping transaction history
//! resolvable.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use stockbook_core::{Customer, CustomerUpdate, NewCustomer};

const CUSTOMER_COLUMNS: &str =
    "id, name, mobile, email, address, notes, created_at, updated_at";

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Lists all customers, name ascending.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY name"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Inserts a new customer.
    pub async fn insert(&self, input: &NewCustomer) -> DbResult<Customer> {
        debug!(name = %input.name, "Inserting customer");

        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: input.name.clone(),
            mobile: input.mobile.clone(),
            email: input.email.clone(),
            address: input.address.clone(),
            notes: input.notes.clone(),
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, mobile, email, address, notes, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.mobile)
        .bind(&customer.email)
        .bind(&customer.address)
        .bind(&customer.notes)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Updates an existing customer, refreshing `updated_at`.
    pub async fn update(&self, id: &str, changes: &CustomerUpdate) -> DbResult<Customer> {
        debug!(id = %id, "Updating customer");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET
                name = ?2,
                mobile = ?3,
                email = ?4,
                address = ?5,
                notes = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.mobile)
        .bind(&changes.email)
        .bind(&changes.address)
        .bind(&changes.notes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    /// Deletes a customer.
    ///
    /// ## Returns
    /// * `Err(DbError::HasTransactions)` - Customer appears on ledger entries
    /// * `Err(DbError::NotFound)` - Customer doesn't exist
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting customer");

        // Guard and delete share one transaction, like the product guard.
        let mut tx = self.pool.begin().await?;

        let references: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM stock_transactions WHERE customer_id = ?1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;

        if references > 0 {
            return Err(DbError::has_transactions("customer", id, references));
        }

        let result = sqlx::query("DELETE FROM customers WHERE id = ?1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        tx.commit().await?;
        Ok(())
    }

    /// Counts total customers (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM customers")
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

    fn new_customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            mobile: "0300-1234567".to_string(),
            email: None,
            address: "12 Mill Road".to_string(),
            notes: None,
        }
    }

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_get_update_delete() {
        let db = test_db().await;
        let repo = db.customers();

        let created = repo.insert(&new_customer("Alice")).await.unwrap();
        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Alice");

        let updated = repo
            .update(
                &created.id,
                &CustomerUpdate {
                    name: "Alice B".to_string(),
                    mobile: "0300-7654321".to_string(),
                    email: Some("alice@example.com".to_string()),
                    address: "12 Mill Road".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Alice B");
        assert_eq!(updated.email.as_deref(), Some("alice@example.com"));

        repo.delete(&created.id).await.unwrap();
        assert!(repo.get_by_id(&created.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_sorted_by_name() {
        let db = test_db().await;
        let repo = db.customers();

        repo.insert(&new_customer("Zed")).await.unwrap();
        repo.insert(&new_customer("Amy")).await.unwrap();

        let names: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Amy", "Zed"]);
    }

    #[tokio::test]
    async fn test_update_missing_customer() {
        let db = test_db().await;
        let err = db
            .customers()
            .update(
                "missing",
                &CustomerUpdate {
                    name: "x".to_string(),
                    mobile: String::new(),
                    email: None,
                    address: String::new(),
                    notes: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
