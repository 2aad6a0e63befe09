//! # Store Configuration Repository
//!
//! Single-row store identity record. The checkout reads it to stamp the
//! store name onto receipts; a settings screen writes it.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use caixa_core::{StoreConfig, ValidationError};

/// Repository for the store configuration row.
#[derive(Debug, Clone)]
pub struct StoreConfigRepository {
    pool: SqlitePool,
}

impl StoreConfigRepository {
    /// Creates a new StoreConfigRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StoreConfigRepository { pool }
    }

    /// Gets the store configuration, if one has been saved.
    pub async fn get(&self) -> DbResult<Option<StoreConfig>> {
        let config = sqlx::query_as::<_, StoreConfig>(
            "SELECT legal_name, trade_name, tax_id, address, phone, tax_regime \
             FROM store_config WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(config)
    }

    /// Saves (inserts or replaces) the store configuration.
    ///
    /// ## Errors
    /// * `DbError::Validation` - blank legal name or tax id
    pub async fn save(&self, config: &StoreConfig) -> DbResult<()> {
        if config.legal_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "legal_name".to_string(),
            }
            .into());
        }
        if config.tax_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "tax_id".to_string(),
            }
            .into());
        }

        debug!(legal_name = %config.legal_name, "Saving store configuration");

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO store_config
                (id, legal_name, trade_name, tax_id, address, phone, tax_regime)
            VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&config.legal_name)
        .bind(&config.trade_name)
        .bind(&config.tax_id)
        .bind(&config.address)
        .bind(&config.phone)
        .bind(&config.tax_regime)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
