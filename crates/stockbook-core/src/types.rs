//! # Domain Types
//!
//! Core domain types used throughout stockbook.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │ StockTransaction│       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  name           │   │  kind (in/out)  │       │
//! │  │  quantity       │   │  mobile         │   │  product_id (FK)│       │
//! │  │  price_cents    │   │  address        │   │  customer_id    │       │
//! │  │  reorder_level  │   └─────────────────┘   │  quantity       │       │
//! │  └─────────────────┘                         │  total_cents    │       │
//! │                                              └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐                             │
//! │  │ TransactionKind │   │ StockOutReason  │                             │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  StockIn  (+)   │   │  Sale           │                             │
//! │  │  StockOut (-)   │   │  Damage         │                             │
//! │  └─────────────────┘   │  Return         │                             │
//! │                        │  Adjustment     │                             │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! A product has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - `sku`: business identifier - human-readable, unique, immutable after create

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Transaction Kind
// =============================================================================

/// The direction of a stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "kebab-case"))]
#[serde(rename_all = "kebab-case")]
pub enum TransactionKind {
    /// Increases a product's quantity (purchase receipt, restock).
    StockIn,
    /// Decreases a product's quantity (sale, damage, return to supplier).
    StockOut,
}

impl TransactionKind {
    /// The sign applied to the quantity when this movement hits the product.
    ///
    /// ## Example
    /// ```rust
    /// use stockbook_core::TransactionKind;
    ///
    /// assert_eq!(TransactionKind::StockIn.delta_sign(), 1);
    /// assert_eq!(TransactionKind::StockOut.delta_sign(), -1);
    /// ```
    #[inline]
    pub const fn delta_sign(&self) -> i64 {
        match self {
            TransactionKind::StockIn => 1,
            TransactionKind::StockOut => -1,
        }
    }
}

// =============================================================================
// Stock-Out Reason
// =============================================================================

/// Why stock left the shelf. Only meaningful for stock-out movements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum StockOutReason {
    /// Sold to a customer. Requires a customer reference.
    Sale,
    /// Written off as damaged.
    Damage,
    /// Returned to the supplier.
    Return,
    /// Manual stock correction.
    Adjustment,
}

impl StockOutReason {
    /// Whether this reason requires a customer on the transaction.
    #[inline]
    pub const fn requires_customer(&self) -> bool {
        matches!(self, StockOutReason::Sale)
    }
}

// =============================================================================
// Product
// =============================================================================

/// A product tracked in the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique and immutable.
    pub sku: String,

    /// Display name.
    pub name: String,

    /// Category used for grouping and reports.
    pub category: String,

    /// Optional free-text description.
    pub description: String,

    /// Current stock level. Never negative; mutated only by the ledger.
    pub quantity: i64,

    /// Selling price in cents.
    pub price_cents: i64,

    /// Cost price in cents (for inventory cost valuation).
    pub cost_price_cents: i64,

    /// Threshold at or below which the product is flagged low-stock.
    pub reorder_level: i64,

    /// Supplier name.
    pub supplier: String,

    /// Storage location (aisle, bin, warehouse).
    pub location: String,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the cost price as Money.
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    /// Checks whether the product is at or below its reorder level.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.reorder_level
    }

    /// Retail value of the stock on hand (`quantity × price`).
    pub fn stock_value(&self) -> Money {
        self.price().line_total(self.quantity).unwrap_or(Money::zero())
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer referenced by sale-type stock-out transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Stock Transaction
// =============================================================================

/// A stock movement as stored in the ledger.
///
/// Immutable once created: there is no update operation, only creation and
/// deletion (which reverses the quantity effect).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct StockTransaction {
    pub id: String,
    pub kind: TransactionKind,
    pub product_id: String,
    /// Set for sale-type stock-outs; optional otherwise.
    pub customer_id: Option<String>,
    /// Units moved. Always positive; direction comes from `kind`.
    pub quantity: i64,
    /// Purchase price for stock-in, selling price for stock-out.
    pub unit_price_cents: i64,
    /// `unit_price_cents × quantity`, computed at creation.
    pub total_cents: i64,
    /// Stock-out reason; `None` for stock-in.
    pub reason: Option<StockOutReason>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl StockTransaction {
    /// Signed quantity delta this movement applied to the product.
    #[inline]
    pub fn signed_delta(&self) -> i64 {
        self.kind.delta_sign() * self.quantity
    }

    /// The delta that undoes this movement.
    #[inline]
    pub fn reversal_delta(&self) -> i64 {
        -self.signed_delta()
    }

    /// Returns the total amount as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Transaction Record (joined view)
// =============================================================================

/// A ledger entry with product/customer identifiers resolved to display
/// names, ready for immediate UI consumption.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub kind: TransactionKind,
    pub product_id: String,
    pub product_name: String,
    pub product_sku: String,
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub total_cents: i64,
    pub reason: Option<StockOutReason>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Write Inputs
// =============================================================================
// Inputs for creating/updating entities. These carry only the fields a caller
// is allowed to set; notably ProductUpdate has no `sku` (immutable) and no
// `quantity` (ledger-only).

/// Validated input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub category: String,
    pub description: String,
    /// Opening stock level. Subsequent changes go through the ledger.
    pub quantity: i64,
    pub price_cents: i64,
    pub cost_price_cents: i64,
    pub reorder_level: i64,
    pub supplier: String,
    pub location: String,
}

/// Validated input for updating a product.
///
/// `sku` and `quantity` are deliberately absent: the SKU is immutable after
/// creation and the quantity is mutated only by the transaction ledger.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub category: String,
    pub description: String,
    pub price_cents: i64,
    pub cost_price_cents: i64,
    pub reorder_level: i64,
    pub supplier: String,
    pub location: String,
}

/// Validated input for creating a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: String,
    pub notes: Option<String>,
}

/// Validated input for updating a customer.
#[derive(Debug, Clone)]
pub struct CustomerUpdate {
    pub name: String,
    pub mobile: String,
    pub email: Option<String>,
    pub address: String,
    pub notes: Option<String>,
}

// =============================================================================
// New Transaction Input
// =============================================================================

/// Validated input for recording a stock movement.
///
/// Built by the API layer after structural validation; the ledger repository
/// performs the existence and sufficiency checks.
#[derive(Debug, Clone)]
pub struct NewStockTransaction {
    pub kind: TransactionKind,
    pub product_id: String,
    pub customer_id: Option<String>,
    pub quantity: i64,
    pub unit_price: Money,
    pub reason: Option<StockOutReason>,
    pub reference_number: Option<String>,
    pub notes: Option<String>,
}

impl NewStockTransaction {
    /// Signed quantity delta this movement will apply.
    #[inline]
    pub fn signed_delta(&self) -> i64 {
        self.kind.delta_sign() * self.quantity
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(quantity: i64, reorder_level: i64) -> Product {
        Product {
            id: "p1".to_string(),
            sku: "SKU-1".to_string(),
            name: "Widget".to_string(),
            category: "widgets".to_string(),
            description: String::new(),
            quantity,
            price_cents: 500,
            cost_price_cents: 300,
            reorder_level,
            supplier: String::new(),
            location: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_delta_sign() {
        assert_eq!(TransactionKind::StockIn.delta_sign(), 1);
        assert_eq!(TransactionKind::StockOut.delta_sign(), -1);
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(product(10, 10).is_low_stock());
        assert!(product(0, 10).is_low_stock());
        assert!(!product(11, 10).is_low_stock());
    }

    #[test]
    fn test_stock_value() {
        assert_eq!(product(4, 10).stock_value().cents(), 2000);
    }

    #[test]
    fn test_sale_requires_customer() {
        assert!(StockOutReason::Sale.requires_customer());
        assert!(!StockOutReason::Damage.requires_customer());
        assert!(!StockOutReason::Return.requires_customer());
        assert!(!StockOutReason::Adjustment.requires_customer());
    }

    #[test]
    fn test_signed_delta() {
        let tx = StockTransaction {
            id: "t1".to_string(),
            kind: TransactionKind::StockOut,
            product_id: "p1".to_string(),
            customer_id: None,
            quantity: 3,
            unit_price_cents: 500,
            total_cents: 1500,
            reason: Some(StockOutReason::Damage),
            reference_number: None,
            notes: None,
            created_at: Utc::now(),
        };
        assert_eq!(tx.signed_delta(), -3);
        assert_eq!(tx.reversal_delta(), 3);
    }

    #[test]
    fn test_kind_serde_tags() {
        assert_eq!(
            serde_json::to_string(&TransactionKind::StockIn).unwrap(),
            "\"stock-in\""
        );
        assert_eq!(
            serde_json::to_string(&StockOutReason::Sale).unwrap(),
            "\"sale\""
        );
    }
}
