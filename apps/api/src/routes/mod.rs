//! # Route Modules
//!
//! One module per resource, each exporting a `router()` that the library
//! nests under `/api`.
//!
//! - [`products`] - Catalogue CRUD plus low-stock and category queries
//! - [`customers`] - Customer CRUD plus per-customer transaction history
//! - [`transactions`] - The ledger: record, reverse, list, get
//! - [`reports`] - Read-only aggregations

pub mod customers;
pub mod products;
pub mod reports;
pub mod transactions;
