//! Validation utilities for batch quantities, prices and splits

use rust_decimal::Decimal;

use crate::error::DomainError;
use crate::models::SplitPortion;

/// Quantities and prices carry at most two decimal places
pub const MONEY_SCALE: u32 = 2;

/// Exclusive upper bound (10^10) for quantities and per-unit amounts,
/// matching the NUMERIC(12, 2) columns they are stored in
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Longest split label accepted
pub const MAX_SPLIT_LABEL_CHARS: usize = 100;

// ============================================================================
// Numeric Validations
// ============================================================================

/// True when `value` has no more than two significant decimal places
pub fn has_valid_precision(value: Decimal) -> bool {
    value.normalize().scale() <= MONEY_SCALE
}

/// Round to two decimal places (banker's rounding)
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp(MONEY_SCALE)
}

/// Validate a batch or split quantity: positive, below [`MAX_AMOUNT`], two decimals
pub fn validate_batch_quantity(quantity: Decimal) -> Result<(), DomainError> {
    if quantity <= Decimal::ZERO {
        return Err(DomainError::invalid(
            "quantity",
            "Quantity must be greater than 0",
        ));
    }
    if quantity >= MAX_AMOUNT {
        return Err(DomainError::invalid(
            "quantity",
            format!("Quantity must be less than {}", MAX_AMOUNT),
        ));
    }
    if !has_valid_precision(quantity) {
        return Err(DomainError::invalid(
            "quantity",
            "Quantity cannot have more than 2 decimal places",
        ));
    }
    Ok(())
}

/// Validate a per-unit price, fee or margin: non-negative, below [`MAX_AMOUNT`], two decimals
pub fn validate_price(field: &'static str, price: Decimal) -> Result<(), DomainError> {
    if price < Decimal::ZERO {
        return Err(DomainError::invalid(field, "Price cannot be negative"));
    }
    if price >= MAX_AMOUNT {
        return Err(DomainError::invalid(
            field,
            format!("Price must be less than {}", MAX_AMOUNT),
        ));
    }
    if !has_valid_precision(price) {
        return Err(DomainError::invalid(
            field,
            "Price cannot have more than 2 decimal places",
        ));
    }
    Ok(())
}

// ============================================================================
// Batch Validations
// ============================================================================

/// Validate crop type is present and reasonably short
pub fn validate_crop_type(crop_type: &str) -> Result<(), DomainError> {
    let trimmed = crop_type.trim();
    if trimmed.is_empty() {
        return Err(DomainError::invalid("crop_type", "Crop type is required"));
    }
    if trimmed.chars().count() > 100 {
        return Err(DomainError::invalid(
            "crop_type",
            "Crop type must be at most 100 characters",
        ));
    }
    Ok(())
}

/// Validate requested split portions against the parent quantity.
///
/// Every portion must be a valid quantity with a label of at most
/// [`MAX_SPLIT_LABEL_CHARS`] characters, and the rounded sum must equal the
/// rounded parent quantity.
pub fn validate_split_quantities(
    parent_quantity: Decimal,
    portions: &[SplitPortion],
) -> Result<(), DomainError> {
    if portions.is_empty() {
        return Err(DomainError::invalid(
            "splits",
            "At least one split portion is required",
        ));
    }

    for portion in portions {
        validate_batch_quantity(portion.quantity)?;
        if let Some(label) = &portion.label {
            if label.chars().count() > MAX_SPLIT_LABEL_CHARS {
                return Err(DomainError::invalid(
                    "label",
                    format!(
                        "Split label must be at most {} characters",
                        MAX_SPLIT_LABEL_CHARS
                    ),
                ));
            }
        }
    }

    let total: Decimal = portions.iter().map(|p| p.quantity).sum();
    if round2(total) != round2(parent_quantity) {
        return Err(DomainError::invalid(
            "splits",
            format!(
                "Split quantities must sum to parent batch quantity. Parent: {}, Total splits: {}",
                round2(parent_quantity),
                round2(total)
            ),
        ));
    }
    Ok(())
}
