//! # Checkout Coordinator
//!
//! The all-or-nothing unit of work that finalizes a sale.
//!
//! ## Two Phases
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PHASE 1: VALIDATE (reads only — storage untouched on any failure)     │
//! │                                                                         │
//! │    normalize cart ──► check payment method ──► check adjustments       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │    resolve products (freeze price + name) ──► compute totals           │
//! │         │                                                               │
//! │         ▼  any failure: InvalidCart / MissingPaymentMethod /           │
//! │            ProductNotFound / InvalidTotal, nothing written             │
//! │                                                                         │
//! │  PHASE 2: EXECUTE (one SQLite transaction)                             │
//! │                                                                         │
//! │    BEGIN                                                                │
//! │      INSERT sale header          ← first statement takes the writer    │
//! │      INSERT line items, in order   lock, serializing checkouts         │
//! │      reserve stock per line, in order                                  │
//! │    COMMIT ─── or ─── any failure returns early, the transaction        │
//! │                      drops, and sqlx rolls everything back             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Failure Semantics
//! A failed reservation is a legitimate business rejection, not a
//! transient fault: the coordinator never retries. Business failures
//! carry the offending product id; anything else surfaces as
//! [`CheckoutError::Storage`] so the caller can tell "fix your cart"
//! apart from "try again".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DbError;
use crate::repository::{product, sale, store::StoreConfigRepository};
use caixa_core::cart::{normalize_cart, PricedLine, SaleTotals};
use caixa_core::validation::{validate_adjustment, validate_payment_method};
use caixa_core::{CartItem, CoreError, Sale, SaleItem, ValidationError};

// =============================================================================
// Request / Response Types
// =============================================================================

/// A proposed sale: cart lines plus payment and adjustment metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Cart lines in the order the cashier rang them up.
    pub items: Vec<CartItem>,

    /// How the customer pays. Must be non-blank.
    pub payment_method: String,

    /// Non-negative discount in cents. Defaults to zero.
    #[serde(default)]
    pub discount_cents: i64,

    /// Non-negative surcharge in cents. Defaults to zero.
    #[serde(default)]
    pub surcharge_cents: i64,

    #[serde(default)]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub customer_tax_id: Option<String>,

    #[serde(default)]
    pub notes: Option<String>,
}

impl CheckoutRequest {
    /// Plain cash-register request: items and a payment method, no
    /// adjustments, no customer data.
    pub fn new(items: Vec<CartItem>, payment_method: impl Into<String>) -> Self {
        CheckoutRequest {
            items,
            payment_method: payment_method.into(),
            discount_cents: 0,
            surcharge_cents: 0,
            customer_name: None,
            customer_tax_id: None,
            notes: None,
        }
    }
}

/// One committed line on the receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

/// The confirmed sale record returned on success: header fields, line
/// items, and resolved store metadata for receipt rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub sale_id: String,
    pub receipt_number: String,
    /// Store display name, when a store configuration exists.
    pub store_name: Option<String>,
    pub date: DateTime<Utc>,
    pub items: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub surcharge_cents: i64,
    pub total_cents: i64,
    pub payment_method: String,
    pub customer_name: Option<String>,
    pub customer_tax_id: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Error Type
// =============================================================================

/// Typed failure surface of [`Checkout::finalize`].
///
/// The first five variants are caller-correctable or business conflicts;
/// only [`CheckoutError::Storage`] indicates infrastructure trouble.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Empty cart, bad quantity, negative adjustment, oversized cart.
    #[error("invalid cart: {0}")]
    InvalidCart(String),

    /// Payment method was blank.
    #[error("a payment method is required")]
    MissingPaymentMethod,

    /// Discount drives the pre-clamp total negative. Rejected, not
    /// clamped: a discount larger than the order hides a caller bug.
    #[error(
        "invalid total: discount {discount_cents} exceeds subtotal {subtotal_cents} plus surcharge {surcharge_cents}"
    )]
    InvalidTotal {
        subtotal_cents: i64,
        discount_cents: i64,
        surcharge_cents: i64,
    },

    /// A reservation lost the race (or the cart simply asked for more
    /// than the shelf holds). The whole sale was rolled back.
    #[error("insufficient stock for {product_id}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        available: i64,
        requested: i64,
    },

    /// A cart line references a product the catalog doesn't have.
    #[error("product not found: {0}")]
    ProductNotFound(String),

    /// The persistence layer failed; nothing was committed.
    #[error("storage failure: {0}")]
    Storage(#[from] DbError),
}

impl From<CoreError> for CheckoutError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::NegativeTotal {
                subtotal_cents,
                discount_cents,
                surcharge_cents,
            } => CheckoutError::InvalidTotal {
                subtotal_cents,
                discount_cents,
                surcharge_cents,
            },
            other => CheckoutError::InvalidCart(other.to_string()),
        }
    }
}

// =============================================================================
// Coordinator
// =============================================================================

/// Coordinates the atomic finalization of a sale.
#[derive(Debug, Clone)]
pub struct Checkout {
    pool: SqlitePool,
}

impl Checkout {
    /// Creates a new checkout coordinator on the given pool.
    pub fn new(pool: SqlitePool) -> Self {
        Checkout { pool }
    }

    /// Finalizes a sale: validates the cart, then persists the header,
    /// the line items, and all stock decrements as one unit of work.
    ///
    /// ## Guarantees
    /// - Validation failures never touch storage
    /// - On any execution failure, no header, line item, or stock change
    ///   remains visible
    /// - Stock never goes below zero, even under concurrent checkouts
    /// - Line items freeze price and name at sale time
    pub async fn finalize(&self, request: CheckoutRequest) -> Result<Receipt, CheckoutError> {
        debug!(
            items = request.items.len(),
            payment_method = %request.payment_method,
            "Finalizing sale"
        );

        // ---------------------------------------------------------------
        // Phase 1: validation (reads only)
        // ---------------------------------------------------------------

        let merged = normalize_cart(&request.items)?;

        validate_payment_method(&request.payment_method).map_err(|err| match err {
            ValidationError::Required { .. } => CheckoutError::MissingPaymentMethod,
            other => CheckoutError::InvalidCart(other.to_string()),
        })?;

        validate_adjustment("discount", request.discount_cents)
            .map_err(|err| CheckoutError::InvalidCart(err.to_string()))?;
        validate_adjustment("surcharge", request.surcharge_cents)
            .map_err(|err| CheckoutError::InvalidCart(err.to_string()))?;

        // Resolve every product and freeze its price and name. Prices
        // captured here are what the sale records, independent of any
        // later catalog edit.
        let mut lines: Vec<PricedLine> = Vec::with_capacity(merged.len());
        {
            let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
            for item in &merged {
                let found = product::fetch_on(&mut conn, &item.product_id).await?;
                let found = found
                    .ok_or_else(|| CheckoutError::ProductNotFound(item.product_id.clone()))?;
                lines.push(PricedLine {
                    product_id: found.id,
                    name: found.name,
                    unit_price_cents: found.price_cents,
                    quantity: item.quantity,
                });
            }
        }

        let totals = SaleTotals::compute(&lines, request.discount_cents, request.surcharge_cents)?;

        // Store metadata for the receipt; read outside the transaction.
        let store_name = StoreConfigRepository::new(self.pool.clone())
            .get()
            .await?
            .map(|config| config.display_name().to_string());

        // ---------------------------------------------------------------
        // Phase 2: execution (one transaction, rollback on early return)
        // ---------------------------------------------------------------

        let sale_id = Uuid::new_v4().to_string();
        let receipt_number = generate_receipt_number();
        let now = Utc::now();

        let header = Sale {
            id: sale_id.clone(),
            receipt_number: receipt_number.clone(),
            sale_date: now,
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            surcharge_cents: totals.surcharge_cents,
            total_cents: totals.total_cents,
            payment_method: request.payment_method.trim().to_string(),
            customer_name: request.customer_name.clone(),
            customer_tax_id: request.customer_tax_id.clone(),
            notes: request.notes.clone(),
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        // The header insert is deliberately the transaction's first
        // statement: it takes SQLite's writer lock up front, so two
        // concurrent checkouts serialize here instead of deadlocking on
        // a read-to-write upgrade.
        sale::insert_header_on(&mut tx, &header).await?;

        for line in &lines {
            let item = SaleItem {
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: line.name.clone(),
                unit_price_cents: line.unit_price_cents,
                quantity: line.quantity,
            };
            sale::insert_item_on(&mut tx, &item).await?;
        }

        // Reserve in cart order; the first refusal aborts the whole
        // unit of work, discarding the header, the items, and every
        // reservation made so far in this attempt.
        for line in &lines {
            match product::reserve_on(&mut tx, &line.product_id, line.quantity).await? {
                product::ReserveOutcome::Reserved => {}
                product::ReserveOutcome::Insufficient { available } => {
                    return Err(CheckoutError::InsufficientStock {
                        product_id: line.product_id.clone(),
                        available,
                        requested: line.quantity,
                    });
                }
                product::ReserveOutcome::NotFound => {
                    // Deleted between validation and reservation.
                    return Err(CheckoutError::ProductNotFound(line.product_id.clone()));
                }
            }
        }

        tx.commit().await.map_err(DbError::from)?;

        info!(
            sale_id = %sale_id,
            receipt_number = %receipt_number,
            total_cents = totals.total_cents,
            items = lines.len(),
            "Sale finalized"
        );

        Ok(Receipt {
            sale_id,
            receipt_number,
            store_name,
            date: now,
            items: lines
                .into_iter()
                .map(|line| ReceiptLine {
                    line_total_cents: line.line_total().cents(),
                    product_id: line.product_id,
                    name: line.name,
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                })
                .collect(),
            subtotal_cents: totals.subtotal_cents,
            discount_cents: totals.discount_cents,
            surcharge_cents: totals.surcharge_cents,
            total_cents: totals.total_cents,
            payment_method: header.payment_method,
            customer_name: header.customer_name,
            customer_tax_id: header.customer_tax_id,
            notes: header.notes,
        })
    }
}

/// Generates a receipt number in format: `YYMMDD-HHMMSS-NNNN`.
///
/// The sale's real identity is its UUID; this token only needs to be
/// readable on paper and unique enough within one store's day.
fn generate_receipt_number() -> String {
    let now = Utc::now();
    let seq = now.timestamp_subsec_micros() % 10000;
    format!("{}-{:04}", now.format("%y%m%d-%H%M%S"), seq)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use caixa_core::{Product, StoreConfig};

    #[test]
    fn test_receipt_number_shape() {
        let number = generate_receipt_number();
        // YYMMDD-HHMMSS-NNNN
        assert_eq!(number.len(), 18);
        assert_eq!(number.matches('-').count(), 2);
    }

    #[test]
    fn test_core_error_mapping() {
        let err: CheckoutError = CoreError::EmptyCart.into();
        assert!(matches!(err, CheckoutError::InvalidCart(_)));

        let err: CheckoutError = CoreError::NegativeTotal {
            subtotal_cents: 1000,
            discount_cents: 2000,
            surcharge_cents: 0,
        }
        .into();
        assert!(matches!(err, CheckoutError::InvalidTotal { .. }));
    }

    // -- integration: the full unit of work against an in-memory database --

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    async fn stock_product(db: &Database, id: &str, price_cents: i64, stock: i64) {
        let now = Utc::now();
        db.products()
            .upsert(&Product {
                id: id.to_string(),
                name: format!("Product {id}"),
                price_cents,
                stock,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_successful_sale_decrements_stock_and_persists() {
        let db = test_db().await;
        stock_product(&db, "P1", 1000, 5).await;

        let receipt = db
            .checkout()
            .finalize(CheckoutRequest::new(vec![CartItem::new("P1", 3)], "cash"))
            .await
            .unwrap();

        assert_eq!(receipt.subtotal_cents, 3000);
        assert_eq!(receipt.total_cents, 3000);
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].line_total_cents, 3000);
        assert_eq!(stock_of(&db, "P1").await, 2);

        // Header and line items are retrievable afterwards.
        let sale = db.sales().get(&receipt.sale_id).await.unwrap().unwrap();
        assert_eq!(sale.total_cents, 3000);
        assert_eq!(sale.payment_method, "cash");

        let items = db.sales().items(&receipt.sale_id).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].quantity, 3);
        assert_eq!(items[0].unit_price_cents, 1000);
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_no_trace() {
        let db = test_db().await;
        stock_product(&db, "P1", 1000, 2).await;

        let err = db
            .checkout()
            .finalize(CheckoutRequest::new(vec![CartItem::new("P1", 3)], "cash"))
            .await
            .unwrap_err();

        match err {
            CheckoutError::InsufficientStock {
                product_id,
                available,
                requested,
            } => {
                assert_eq!(product_id, "P1");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        assert_eq!(stock_of(&db, "P1").await, 2);
        assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failure_on_second_line_rolls_back_first() {
        let db = test_db().await;
        stock_product(&db, "P1", 500, 10).await;
        stock_product(&db, "P2", 800, 1).await;

        let err = db
            .checkout()
            .finalize(CheckoutRequest::new(
                vec![CartItem::new("P1", 2), CartItem::new("P2", 5)],
                "card",
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InsufficientStock { ref product_id, .. } if product_id == "P2"));

        // P1's reservation was discarded along with the header and items.
        assert_eq!(stock_of(&db, "P1").await, 10);
        assert_eq!(stock_of(&db, "P2").await, 1);
        assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discount_reduces_total() {
        let db = test_db().await;
        stock_product(&db, "P1", 2500, 5).await;

        let mut request = CheckoutRequest::new(vec![CartItem::new("P1", 1)], "pix");
        request.discount_cents = 500;

        let receipt = db.checkout().finalize(request).await.unwrap();
        assert_eq!(receipt.subtotal_cents, 2500);
        assert_eq!(receipt.discount_cents, 500);
        assert_eq!(receipt.total_cents, 2000);
    }

    #[tokio::test]
    async fn test_excessive_discount_rejected_nothing_persisted() {
        let db = test_db().await;
        stock_product(&db, "P1", 1000, 5).await;

        let mut request = CheckoutRequest::new(vec![CartItem::new("P1", 1)], "cash");
        request.discount_cents = 1500;

        let err = db.checkout().finalize(request).await.unwrap_err();
        assert!(matches!(err, CheckoutError::InvalidTotal { .. }));

        assert_eq!(stock_of(&db, "P1").await, 5);
        assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_surcharge_added_after_clamp() {
        let db = test_db().await;
        stock_product(&db, "P1", 1000, 5).await;

        let mut request = CheckoutRequest::new(vec![CartItem::new("P1", 1)], "card");
        request.surcharge_cents = 150;

        let receipt = db.checkout().finalize(request).await.unwrap();
        assert_eq!(receipt.total_cents, 1150);
    }

    #[tokio::test]
    async fn test_empty_cart_rejected() {
        let db = test_db().await;

        let err = db
            .checkout()
            .finalize(CheckoutRequest::new(vec![], "cash"))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidCart(_)));
    }

    #[tokio::test]
    async fn test_blank_payment_method_rejected() {
        let db = test_db().await;
        stock_product(&db, "P1", 1000, 5).await;

        let err = db
            .checkout()
            .finalize(CheckoutRequest::new(vec![CartItem::new("P1", 1)], "   "))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::MissingPaymentMethod));
        assert_eq!(stock_of(&db, "P1").await, 5);
    }

    #[tokio::test]
    async fn test_unknown_product_rejected_before_any_write() {
        let db = test_db().await;
        stock_product(&db, "P1", 1000, 5).await;

        let err = db
            .checkout()
            .finalize(CheckoutRequest::new(
                vec![CartItem::new("P1", 1), CartItem::new("GHOST", 1)],
                "cash",
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::ProductNotFound(ref id) if id == "GHOST"));
        assert_eq!(stock_of(&db, "P1").await, 5);
        assert!(db.sales().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_cart_lines_merge() {
        let db = test_db().await;
        stock_product(&db, "P1", 300, 10).await;

        let receipt = db
            .checkout()
            .finalize(CheckoutRequest::new(
                vec![CartItem::new("P1", 2), CartItem::new("P1", 3)],
                "cash",
            ))
            .await
            .unwrap();

        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.items[0].quantity, 5);
        assert_eq!(receipt.total_cents, 1500);
        assert_eq!(stock_of(&db, "P1").await, 5);
    }

    #[tokio::test]
    async fn test_line_items_freeze_price_and_name() {
        let db = test_db().await;
        stock_product(&db, "P1", 1000, 5).await;

        let receipt = db
            .checkout()
            .finalize(CheckoutRequest::new(vec![CartItem::new("P1", 1)], "cash"))
            .await
            .unwrap();

        // Reprice and rename the product after the sale.
        let now = Utc::now();
        db.products()
            .upsert(&Product {
                id: "P1".to_string(),
                name: "Renamed".to_string(),
                price_cents: 9999,
                stock: 4,
                created_at: now,
                updated_at: now,
            })
            .await
            .unwrap();

        let items = db.sales().items(&receipt.sale_id).await.unwrap();
        assert_eq!(items[0].unit_price_cents, 1000);
        assert_eq!(items[0].name_snapshot, "Product P1");
    }

    #[tokio::test]
    async fn test_receipt_carries_store_name() {
        let db = test_db().await;
        stock_product(&db, "P1", 1000, 5).await;

        db.store_config()
            .save(&StoreConfig {
                legal_name: "Mercado Exemplo Ltda".to_string(),
                trade_name: Some("Mercado Exemplo".to_string()),
                tax_id: "00.000.000/0001-00".to_string(),
                address: None,
                phone: None,
                tax_regime: None,
            })
            .await
            .unwrap();

        let receipt = db
            .checkout()
            .finalize(CheckoutRequest::new(vec![CartItem::new("P1", 1)], "cash"))
            .await
            .unwrap();

        assert_eq!(receipt.store_name.as_deref(), Some("Mercado Exemplo"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checkouts_never_oversell() {
        // File-backed database so both tasks share real writer-lock
        // contention instead of an in-memory single connection.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contention.db");
        let db = Database::new(DbConfig::new(&path).max_connections(5))
            .await
            .unwrap();

        stock_product(&db, "LAST-ONE", 1000, 1).await;

        let a = {
            let db = db.clone();
            tokio::spawn(async move {
                db.checkout()
                    .finalize(CheckoutRequest::new(
                        vec![CartItem::new("LAST-ONE", 1)],
                        "cash",
                    ))
                    .await
            })
        };
        let b = {
            let db = db.clone();
            tokio::spawn(async move {
                db.checkout()
                    .finalize(CheckoutRequest::new(
                        vec![CartItem::new("LAST-ONE", 1)],
                        "card",
                    ))
                    .await
            })
        };

        let results = [a.await.unwrap(), b.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let losses = results
            .iter()
            .filter(|r| matches!(r, Err(CheckoutError::InsufficientStock { .. })))
            .count();

        assert_eq!(wins, 1, "exactly one checkout must win the last unit");
        assert_eq!(losses, 1, "the other must be refused, not errored");
        assert_eq!(stock_of(&db, "LAST-ONE").await, 0);
        assert_eq!(db.sales().list_recent(10).await.unwrap().len(), 1);
    }
}
