//! # Repository Module
//!
//! Database repository implementations for stockbook.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.   │
//! │                                                                         │
//! │  HTTP handler                                                           │
//! │       │                                                                 │
//! │       │  db.ledger().record(&input)                                     │
//! │       ▼                                                                 │
//! │  LedgerRepository                                                       │
//! │  ├── record(&self, input)     ← atomic ledger insert + stock update     │
//! │  ├── reverse(&self, id)       ← inverse delta + row delete              │
//! │  └── list(&self, filter)                                                │
//! │       │                                                                 │
//! │       │  SQL (single transaction for mutations)                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Clean separation of concerns                                         │
//! │  • SQL is isolated in one place                                         │
//! │  • The quantity invariant lives behind a single choke point             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - Product CRUD and derived queries
//! - [`customer::CustomerRepository`] - Customer CRUD with delete guard
//! - [`ledger::LedgerRepository`] - Stock transaction recording and reversal
//! - [`report::ReportRepository`] - Read-only aggregations

pub mod customer;
pub mod ledger;
pub mod product;
pub mod report;
