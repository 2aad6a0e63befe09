//! # Product Repository (Inventory Ledger)
//!
//! Source of truth for catalog state and the sole authority for stock
//! mutation.
//!
//! ## The Reservation Primitive
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │               Why compare-and-decrement, not read-then-write            │
//! │                                                                         │
//! │  ❌ WRONG: two terminals both read stock=1, both decide to sell,       │
//! │     both write stock=0 → one unit oversold                             │
//! │                                                                         │
//! │  ✅ CORRECT: one guarded statement                                      │
//! │     UPDATE products SET stock = stock - ?qty                           │
//! │     WHERE id = ?id AND stock >= ?qty                                   │
//! │                                                                         │
//! │  The check and the write are a single indivisible operation under      │
//! │  SQLite's writer lock; rows_affected tells us whether we won.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use caixa_core::validation::{validate_product, validate_quantity};
use caixa_core::Product;

// =============================================================================
// Reservation Outcome
// =============================================================================

/// Result of an atomic stock reservation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveOutcome {
    /// Stock was sufficient and has been decremented.
    Reserved,
    /// Stock was insufficient; nothing changed.
    Insufficient { available: i64 },
    /// No such product; nothing changed.
    NotFound,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
/// let all = repo.list(None).await?;
/// let matches = repo.list(Some("cafe")).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

const SELECT_COLUMNS: &str = "id, name, price_cents, stock, created_at, updated_at";

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its catalog id.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        fetch_on(&mut conn, id).await
    }

    /// Lists products, optionally filtered by a case-insensitive substring
    /// match on id or name. Order is stable: by name, then id.
    ///
    /// Case folding happens in Rust: SQLite's `lower()` only folds ASCII,
    /// which would make `CAFÉ` miss `café` in an accented catalog. The
    /// catalog is small enough to filter after the fetch.
    pub async fn list(&self, filter: Option<&str>) -> DbResult<Vec<Product>> {
        let filter = filter.map(str::trim).filter(|f| !f.is_empty());
        debug!(filter = filter.unwrap_or(""), "Listing products");

        let sql = format!("SELECT {SELECT_COLUMNS} FROM products ORDER BY name, id");
        let mut products = sqlx::query_as::<_, Product>(&sql)
            .fetch_all(&self.pool)
            .await?;

        if let Some(term) = filter {
            let needle = term.to_lowercase();
            products.retain(|p| {
                p.id.to_lowercase().contains(&needle) || p.name.to_lowercase().contains(&needle)
            });
        }

        Ok(products)
    }

    /// Inserts or fully replaces a product keyed by its id.
    ///
    /// ## Semantics
    /// - Insert when the id is absent, replace otherwise
    /// - `created_at` is preserved on replace
    /// - Idempotent: upserting identical data twice leaves the catalog in
    ///   the same state as doing it once
    ///
    /// ## Errors
    /// * `DbError::Validation` - empty name, `price_cents <= 0`, negative
    ///   stock, malformed id
    pub async fn upsert(&self, product: &Product) -> DbResult<()> {
        validate_product(product)?;

        debug!(id = %product.id, name = %product.name, "Upserting product");

        sqlx::query(
            r#"
            INSERT INTO products (id, name, price_cents, stock, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                price_cents = excluded.price_cents,
                stock = excluded.stock,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes a product from the catalog.
    ///
    /// Historical sale line items keep their name/price snapshots, so past
    /// receipts stay renderable after the delete.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no product with that id
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Atomically checks and decrements stock in one step.
    ///
    /// This is the standalone form of the reservation primitive; the
    /// checkout coordinator uses [`reserve_on`] against its own
    /// transaction connection instead.
    pub async fn reserve(&self, id: &str, quantity: i64) -> DbResult<ReserveOutcome> {
        validate_quantity(quantity)?;
        let mut conn = self.pool.acquire().await?;
        reserve_on(&mut conn, id, quantity).await
    }

    /// Adds stock back (delivery received, sale voided externally).
    pub async fn restock(&self, id: &str, quantity: i64) -> DbResult<()> {
        validate_quantity(quantity)?;

        debug!(id = %id, quantity = %quantity, "Restocking product");

        let now = Utc::now();
        let result =
            sqlx::query("UPDATE products SET stock = stock + ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(quantity)
                .bind(now)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts catalog entries (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Counts products at or below the given stock threshold
    /// (the daily report's "critical stock" figure).
    pub async fn count_low_stock(&self, threshold: i64) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE stock <= ?1")
            .bind(threshold)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Connection-Level Operations
// =============================================================================
// These run against a caller-supplied connection so the checkout
// transaction can use them inside its unit of work.

/// Fetches a product on an explicit connection.
pub(crate) async fn fetch_on(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {SELECT_COLUMNS} FROM products WHERE id = ?1");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

/// Atomic compare-and-decrement on an explicit connection.
///
/// The WHERE guard makes the stock check and the write indivisible; a
/// quantity larger than the remaining stock simply matches zero rows.
pub(crate) async fn reserve_on(
    conn: &mut SqliteConnection,
    id: &str,
    quantity: i64,
) -> DbResult<ReserveOutcome> {
    let now = Utc::now();

    let result = sqlx::query(
        "UPDATE products SET stock = stock - ?2, updated_at = ?3 \
         WHERE id = ?1 AND stock >= ?2",
    )
    .bind(id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 1 {
        debug!(id = %id, quantity = %quantity, "Stock reserved");
        return Ok(ReserveOutcome::Reserved);
    }

    // The guard rejected us: distinguish "not enough" from "no such row".
    let available: Option<i64> = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match available {
        Some(available) => {
            debug!(id = %id, available = %available, requested = %quantity, "Reservation refused");
            Ok(ReserveOutcome::Insufficient { available })
        }
        None => Ok(ReserveOutcome::NotFound),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn product(id: &str, name: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price_cents,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get_roundtrip() {
        let db = test_db().await;
        let repo = db.products();

        repo.upsert(&product("CAFE-500", "Café Torrado 500g", 1890, 40))
            .await
            .unwrap();

        let found = repo.get("CAFE-500").await.unwrap().unwrap();
        assert_eq!(found.name, "Café Torrado 500g");
        assert_eq!(found.price_cents, 1890);
        assert_eq!(found.stock, 40);

        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_and_preserves_created_at() {
        let db = test_db().await;
        let repo = db.products();

        let original = product("P1", "Original", 1000, 5);
        repo.upsert(&original).await.unwrap();

        let mut replacement = product("P1", "Replacement", 2000, 8);
        replacement.created_at = Utc::now();
        repo.upsert(&replacement).await.unwrap();

        let found = repo.get("P1").await.unwrap().unwrap();
        assert_eq!(found.name, "Replacement");
        assert_eq!(found.price_cents, 2000);
        assert_eq!(found.created_at, original.created_at);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let db = test_db().await;
        let repo = db.products();

        let p = product("P1", "Same", 1000, 5);
        repo.upsert(&p).await.unwrap();
        repo.upsert(&p).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 1);
        let found = repo.get("P1").await.unwrap().unwrap();
        assert_eq!(found.stock, 5);
    }

    #[tokio::test]
    async fn test_upsert_rejects_invalid_without_writing() {
        let db = test_db().await;
        let repo = db.products();

        let err = repo.upsert(&product("P1", "", 1000, 5)).await.unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = repo
            .upsert(&product("P2", "Free?", 0, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        let err = repo
            .upsert(&product("P3", "Negative", 1000, -1))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert_eq!(repo.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_rejects_padded_id() {
        let db = test_db().await;
        let repo = db.products();

        // A padded id would be stored verbatim and then never match
        // lookups for the trimmed form, so it must not get in at all.
        let err = repo
            .upsert(&product(" P1 ", "Padded", 1000, 5))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Validation(_)));

        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.get("P1").await.unwrap().is_none());
        assert!(repo.get(" P1 ").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_filter_matches_id_and_name_case_insensitive() {
        let db = test_db().await;
        let repo = db.products();

        repo.upsert(&product("CAFE-500", "Café Torrado", 1890, 40))
            .await
            .unwrap();
        repo.upsert(&product("ACUCAR-1KG", "Açúcar Cristal", 549, 60))
            .await
            .unwrap();
        repo.upsert(&product("LEITE-1L", "Leite Integral", 599, 48))
            .await
            .unwrap();

        let all = repo.list(None).await.unwrap();
        assert_eq!(all.len(), 3);
        // Stable order: by name.
        assert_eq!(all[0].id, "ACUCAR-1KG");

        let by_name = repo.list(Some("torrado")).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].id, "CAFE-500");

        let by_id = repo.list(Some("cafe")).await.unwrap();
        assert_eq!(by_id.len(), 1);

        // Folding must cover non-ASCII: CAFÉ and café are the same word.
        let accented_upper = repo.list(Some("CAFÉ")).await.unwrap();
        assert_eq!(accented_upper.len(), 1);
        assert_eq!(accented_upper[0].id, "CAFE-500");

        let accented_lower = repo.list(Some("açúcar")).await.unwrap();
        assert_eq!(accented_lower.len(), 1);
        assert_eq!(accented_lower[0].id, "ACUCAR-1KG");

        let blank = repo.list(Some("   ")).await.unwrap();
        assert_eq!(blank.len(), 3);

        assert!(repo.list(Some("zzz")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = test_db().await;
        let repo = db.products();

        repo.upsert(&product("P1", "Doomed", 100, 1)).await.unwrap();
        repo.delete("P1").await.unwrap();
        assert!(repo.get("P1").await.unwrap().is_none());

        let err = repo.delete("P1").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reserve_outcomes() {
        let db = test_db().await;
        let repo = db.products();

        repo.upsert(&product("P1", "Scarce", 100, 3)).await.unwrap();

        assert_eq!(repo.reserve("P1", 2).await.unwrap(), ReserveOutcome::Reserved);
        assert_eq!(
            repo.reserve("P1", 2).await.unwrap(),
            ReserveOutcome::Insufficient { available: 1 }
        );
        assert_eq!(repo.reserve("P1", 1).await.unwrap(), ReserveOutcome::Reserved);
        assert_eq!(
            repo.reserve("P1", 1).await.unwrap(),
            ReserveOutcome::Insufficient { available: 0 }
        );
        assert_eq!(
            repo.reserve("missing", 1).await.unwrap(),
            ReserveOutcome::NotFound
        );

        // Invalid quantities never reach the database.
        assert!(repo.reserve("P1", 0).await.is_err());
        assert!(repo.reserve("P1", -5).await.is_err());
    }

    #[tokio::test]
    async fn test_restock() {
        let db = test_db().await;
        let repo = db.products();

        repo.upsert(&product("P1", "Refill", 100, 2)).await.unwrap();
        repo.restock("P1", 10).await.unwrap();

        let found = repo.get("P1").await.unwrap().unwrap();
        assert_eq!(found.stock, 12);

        let err = repo.restock("missing", 1).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_count_low_stock() {
        let db = test_db().await;
        let repo = db.products();

        repo.upsert(&product("P1", "Plenty", 100, 50)).await.unwrap();
        repo.upsert(&product("P2", "Low", 100, 3)).await.unwrap();
        repo.upsert(&product("P3", "Out", 100, 0)).await.unwrap();

        assert_eq!(repo.count_low_stock(5).await.unwrap(), 2);
        assert_eq!(repo.count_low_stock(0).await.unwrap(), 1);
    }
}
