//! # Repository Module
//!
//! Database repository implementations for Caixa.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Caller                                                                 │
//! │    │  db.products().list(Some("cafe"))                                  │
//! │    ▼                                                                    │
//! │  Repository (clean API, SQL isolated in one place)                      │
//! │    │                                                                    │
//! │    ▼                                                                    │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product::ProductRepository`] - the inventory ledger: catalog CRUD,
//!   search, and the atomic stock reservation primitive
//! - [`sale::SaleRepository`] - sale queries and daily reporting
//! - [`store::StoreConfigRepository`] - store identity for receipts

pub mod product;
pub mod sale;
pub mod store;
