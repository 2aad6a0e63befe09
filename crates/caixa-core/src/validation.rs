//! # Validation Module
//!
//! Input validation utilities for Caixa.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: THIS MODULE (pure checks, caller-correctable errors)         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Guarded SQL (stock floor via compare-and-decrement)           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database constraints (NOT NULL, CHECK stock >= 0, PKs)        │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::types::Product;
use crate::MAX_ITEM_QUANTITY;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Catalog Validators
// =============================================================================

/// Validates a catalog identifier.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 64 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// The id is validated exactly as it will be stored: whitespace fails the
/// character check, so `" P1 "` can never land in the catalog and then
/// fail to match lookups for `"P1"`.
pub fn validate_product_id(id: &str) -> ValidationResult<()> {
    if id.is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    if id.len() > 64 {
        return Err(ValidationError::TooLong {
            field: "id".to_string(),
            max: 64,
        });
    }

    if !id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "id".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a product display name.
///
/// ## Rules
/// - Must not be empty
/// - Must be at most 200 characters
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.len() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates a complete product record before an upsert.
///
/// ## Rules
/// - id and name per the validators above
/// - `price_cents` strictly positive (a zero-priced catalog entry is a
///   data-entry mistake, not a free item)
/// - `stock` non-negative
pub fn validate_product(product: &Product) -> ValidationResult<()> {
    validate_product_id(&product.id)?;
    validate_product_name(&product.name)?;

    if product.price_cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }

    if product.stock < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: "stock".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Checkout Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999): prevents accidental
///   over-ordering, e.g. typing 1000 instead of 10
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a payment method label.
///
/// Categorical free-form string ("cash", "card", "pix", ...); the only
/// hard rule is that it must not be blank.
pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    if method.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }

    if method.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "payment_method".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a monetary adjustment (discount or surcharge) in cents.
///
/// ## Rules
/// - Must be non-negative; both adjustments default to zero
pub fn validate_adjustment(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBeNonNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn product(id: &str, name: &str, price: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: name.to_string(),
            price_cents: price,
            stock,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_validate_product_id() {
        assert!(validate_product_id("CAFE-500").is_ok());
        assert!(validate_product_id("p_1").is_ok());

        assert!(validate_product_id("").is_err());
        assert!(validate_product_id("   ").is_err());
        assert!(validate_product_id("has space").is_err());
        // Padded ids are rejected, not silently trimmed.
        assert!(validate_product_id(" P1 ").is_err());
        assert!(validate_product_id("P1\t").is_err());
        assert!(validate_product_id(&"A".repeat(100)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Café Torrado 500g").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(300)).is_err());
    }

    #[test]
    fn test_validate_product_rejects_non_positive_price() {
        assert!(validate_product(&product("P1", "Coffee", 1000, 5)).is_ok());
        assert!(validate_product(&product("P1", "Coffee", 0, 5)).is_err());
        assert!(validate_product(&product("P1", "Coffee", -100, 5)).is_err());
    }

    #[test]
    fn test_validate_product_rejects_negative_stock() {
        assert!(validate_product(&product("P1", "Coffee", 1000, -1)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_payment_method() {
        assert!(validate_payment_method("cash").is_ok());
        assert!(validate_payment_method("pix").is_ok());
        assert!(validate_payment_method("").is_err());
        assert!(validate_payment_method("   ").is_err());
    }

    #[test]
    fn test_validate_adjustment() {
        assert!(validate_adjustment("discount", 0).is_ok());
        assert!(validate_adjustment("discount", 500).is_ok());
        assert!(validate_adjustment("surcharge", -1).is_err());
    }
}
