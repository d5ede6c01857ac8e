//! # stockbook-db: Database Layer for stockbook
//!
//! This crate provides database access for the stockbook inventory system.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        stockbook Data Flow                              │
//! │                                                                         │
//! │  HTTP handler (POST /api/transactions)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   stockbook-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │ (ledger.rs)   │    │  (embedded)  │   │   │
//! │  │   │               │    │               │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│ ProductRepo   │    │ 001_init.sql │   │   │
//! │  │   │ Connection    │    │ CustomerRepo  │    │              │   │   │
//! │  │   │ Management    │    │ LedgerRepo    │    │              │   │   │
//! │  │   │               │    │ ReportRepo    │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys on, CHECK quantity >= 0)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types, including business-rule violations
//!   enforced in SQL (insufficient stock, referential guards)
//! - [`repository`] - Repository implementations (product, customer, ledger, report)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use stockbook_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/stockbook.db")).await?;
//!
//! let products = db.products().list().await?;
//! let record = db.ledger().record(&new_transaction).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::ledger::{LedgerRepository, TransactionFilter};
pub use repository::product::ProductRepository;
pub use repository::report::{
    CategorySummary, CustomerActivity, InventoryValuation, MovementBreakdown, MovementTotals,
    ReportRepository, TransactionSummary,
};
