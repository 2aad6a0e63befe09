//! # Sale Repository
//!
//! Read-side queries and reporting over committed sales, plus the
//! connection-level inserts the checkout transaction uses.
//!
//! Sales are write-once: the only code path that inserts them is the
//! checkout coordinator, inside its transaction. There is no update or
//! delete here by design.

use chrono::{DateTime, NaiveDate, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use caixa_core::{Sale, SaleItem};

const SALE_COLUMNS: &str = "id, receipt_number, sale_date, subtotal_cents, discount_cents, \
                            surcharge_cents, total_cents, payment_method, customer_name, \
                            customer_tax_id, notes";

// =============================================================================
// Daily Summary
// =============================================================================

/// Aggregates for one calendar day of trading.
///
/// Mirrors the dashboard figures a store owner checks at close:
/// revenue, number of sales, average ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub sale_count: i64,
    pub revenue_cents: i64,
    pub average_ticket_cents: i64,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale queries and reporting.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale header by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(sale)
    }

    /// Gets all line items for a sale, in insertion order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT sale_id, product_id, name_snapshot, unit_price_cents, quantity \
             FROM sale_items WHERE sale_id = ?1 ORDER BY rowid",
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists the most recent sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY sale_date DESC LIMIT ?1");
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Lists sales in the half-open window `[start, end)`, oldest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Sale>> {
        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales \
             WHERE sale_date >= ?1 AND sale_date < ?2 ORDER BY sale_date"
        );
        let sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(sales)
    }

    /// Computes the trading summary for one calendar day (UTC).
    pub async fn daily_summary(&self, day: NaiveDate) -> DbResult<DailySummary> {
        let start = day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc();
        let end = start + TimeDelta::days(1);

        debug!(day = %day, "Computing daily summary");

        let (sale_count, revenue_cents): (i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), COALESCE(SUM(total_cents), 0) FROM sales \
             WHERE sale_date >= ?1 AND sale_date < ?2",
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        let average_ticket_cents = if sale_count > 0 {
            revenue_cents / sale_count
        } else {
            0
        };

        Ok(DailySummary {
            sale_count,
            revenue_cents,
            average_ticket_cents,
        })
    }
}

// =============================================================================
// Connection-Level Operations
// =============================================================================
// Used exclusively by the checkout transaction; nothing outside that unit
// of work is allowed to write sales.

/// Inserts a sale header on an explicit connection.
pub(crate) async fn insert_header_on(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, receipt_number = %sale.receipt_number, "Inserting sale header");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, receipt_number, sale_date,
            subtotal_cents, discount_cents, surcharge_cents, total_cents,
            payment_method, customer_name, customer_tax_id, notes
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.receipt_number)
    .bind(sale.sale_date)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.surcharge_cents)
    .bind(sale.total_cents)
    .bind(&sale.payment_method)
    .bind(&sale.customer_name)
    .bind(&sale.customer_tax_id)
    .bind(&sale.notes)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Inserts one line item on an explicit connection.
///
/// ## Snapshot Pattern
/// Product name and unit price are copied into the row, so later catalog
/// edits never rewrite sale history.
pub(crate) async fn insert_item_on(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    debug!(sale_id = %item.sale_id, product_id = %item.product_id, "Inserting sale item");

    sqlx::query(
        r#"
        INSERT INTO sale_items (sale_id, product_id, name_snapshot, unit_price_cents, quantity)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
