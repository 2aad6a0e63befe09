//! # caixa-db: Database Layer for Caixa
//!
//! SQLite persistence for the Caixa point-of-sale system: the inventory
//! ledger, the checkout transaction, and sale reporting.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Caixa Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │             Caller (terminal UI, HTTP layer, ...)               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ caixa-db (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐  ┌──────────────┐  ┌──────────┐  ┌──────────┐  │   │
//! │  │   │   pool   │  │ repositories │  │ checkout │  │migrations│  │   │
//! │  │   │ Database │  │ product/sale │  │  atomic  │  │ embedded │  │   │
//! │  │   │ DbConfig │  │    /store    │  │   sale   │  │   SQL    │  │   │
//! │  │   └──────────┘  └──────────────┘  └──────────┘  └──────────┘  │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                      SQLite (WAL mode)                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`pool`] - Database handle, pool configuration, SQLite tuning
//! - [`repository`] - Product, sale, and store-config repositories
//! - [`checkout`] - The atomic sale finalization coordinator
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - Database error types
//!
//! ## Quick Start
//! ```rust,ignore
//! use caixa_db::{Database, DbConfig, CheckoutRequest};
//! use caixa_core::CartItem;
//!
//! let db = Database::new(DbConfig::new("./caixa.db")).await?;
//!
//! let receipt = db
//!     .checkout()
//!     .finalize(CheckoutRequest::new(
//!         vec![CartItem::new("CAFE-500", 2)],
//!         "pix",
//!     ))
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{Checkout, CheckoutError, CheckoutRequest, Receipt, ReceiptLine};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::product::{ProductRepository, ReserveOutcome};
pub use repository::sale::{DailySummary, SaleRepository};
pub use repository::store::StoreConfigRepository;
