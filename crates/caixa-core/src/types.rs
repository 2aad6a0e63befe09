//! # Domain Types
//!
//! Core domain types used throughout Caixa.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │    SaleItem     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (catalog)   │   │  id (UUID)      │   │  sale_id (FK)   │       │
//! │  │  name           │   │  receipt_number │   │  product_id     │       │
//! │  │  price_cents    │   │  total_cents    │   │  name_snapshot  │       │
//! │  │  stock          │   │  payment_method │   │  unit_price ❄   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ❄ = frozen at sale time; later catalog edits never rewrite history    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
///
/// The `id` is the stable catalog key chosen by the operator (a SKU-like
/// string such as `"P1"` or `"CAFE-500"`), not a surrogate UUID. It is what
/// cart items and sale line items reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Catalog identifier - primary key.
    pub id: String,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Unit price in cents (smallest currency unit). Must be positive.
    pub price_cents: i64,

    /// Quantity on hand. Never negative after a committed transaction.
    pub stock: i64,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the unit price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A proposed `(product_id, quantity)` pair not yet committed to a sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: String,
    pub quantity: i64,
}

impl CartItem {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartItem {
            product_id: product_id.into(),
            quantity,
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A finalized sale transaction. Immutable once committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    /// Unique identifier (UUID v4), generated at finalization time.
    pub id: String,

    /// Human-readable time-based token printed on the receipt.
    pub receipt_number: String,

    /// Timestamp of finalization. Immutable once set.
    pub sale_date: DateTime<Utc>,

    /// Sum of `quantity * unit_price_cents` over line items.
    pub subtotal_cents: i64,

    /// Non-negative adjustment subtracted from the subtotal.
    pub discount_cents: i64,

    /// Non-negative adjustment added after the discount.
    pub surcharge_cents: i64,

    /// `max(0, subtotal - discount) + surcharge`. Never negative.
    pub total_cents: i64,

    /// How the customer paid ("cash", "card", "pix", ...). Never empty.
    pub payment_method: String,

    pub customer_name: Option<String>,
    pub customer_tax_id: Option<String>,
    pub notes: Option<String>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a finalized sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub sale_id: String,

    /// Non-owning reference to the catalog. The product may be edited or
    /// deleted later; the snapshots below keep this line renderable.
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// Quantity sold. Always positive.
    pub quantity: i64,
}

impl SaleItem {
    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total (unit price × quantity).
    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Store Configuration
// =============================================================================

/// Store identity record, stamped on receipts.
///
/// A single row in the database (the application manages one store).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct StoreConfig {
    /// Registered legal name.
    pub legal_name: String,

    /// Trading name shown on receipts; falls back to `legal_name` if empty.
    pub trade_name: Option<String>,

    /// Company tax identifier.
    pub tax_id: String,

    pub address: Option<String>,
    pub phone: Option<String>,
    pub tax_regime: Option<String>,
}

impl StoreConfig {
    /// Name to print on receipts.
    pub fn display_name(&self) -> &str {
        match self.trade_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.legal_name,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
