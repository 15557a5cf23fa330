//! WebAssembly module for the Agri Supply Chain platform
//!
//! Provides client-side checks that mirror the backend rules:
//! - Status transition lookups for action buttons
//! - Listing price preview
//! - Split quantity validation before submit
//! - Public trace visibility
//!
//! Decimal values cross the boundary as strings to keep exact precision.

use rust_decimal::Decimal;
use std::str::FromStr;
use wasm_bindgen::prelude::*;

use shared::{
    compute_listing_price, suspendable_statuses, validate_split_quantities, BatchStatus,
    SplitPortion, StakeholderRole,
};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn parse_status(value: &str) -> Result<BatchStatus, String> {
    BatchStatus::from_str(value).map_err(|e| e.to_string())
}

fn parse_role(value: &str) -> Result<StakeholderRole, String> {
    StakeholderRole::from_str(value).map_err(|e| e.to_string())
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, String> {
    Decimal::from_str(value.trim()).map_err(|e| format!("Invalid {}: {}", field, e))
}

fn check_transition(current: &str, role: &str, proposed: &str) -> Result<(), String> {
    shared::can_transition(parse_status(current)?, parse_role(role)?, parse_status(proposed)?)
        .map_err(|e| e.to_string())
}

fn listing_price(
    farmer_base: &str,
    transport_fees: &str,
    distributor_margin: &str,
    retailer_margin: &str,
) -> Result<Decimal, String> {
    compute_listing_price(
        parse_decimal("farmer base price", farmer_base)?,
        parse_decimal("transport fees", transport_fees)?,
        parse_decimal("distributor margin", distributor_margin)?,
        parse_decimal("retailer margin", retailer_margin)?,
    )
    .map_err(|e| e.to_string())
}

fn check_split(parent_quantity: &str, portions_json: &str) -> Result<(), String> {
    let parent = parse_decimal("parent quantity", parent_quantity)?;
    let portions: Vec<SplitPortion> = serde_json::from_str(portions_json)
        .map_err(|e| format!("Invalid splits JSON: {}", e))?;
    validate_split_quantities(parent, &portions).map_err(|e| e.to_string())
}

/// Empty string when allowed, otherwise the refusal reason
#[wasm_bindgen]
pub fn can_transition(current: &str, role: &str, proposed: &str) -> String {
    match check_transition(current, role, proposed) {
        Ok(()) => String::new(),
        Err(reason) => reason,
    }
}

/// Statuses `role` may move a batch to from `current`
#[wasm_bindgen]
pub fn allowed_transitions(current: &str, role: &str) -> Result<js_sys::Array, JsValue> {
    let current = parse_status(current).map_err(|e| JsValue::from_str(&e))?;
    let role = parse_role(role).map_err(|e| JsValue::from_str(&e))?;
    Ok(shared::allowed_transitions(current, role)
        .iter()
        .map(|status| JsValue::from_str(status.as_str()))
        .collect())
}

/// Statuses from which `role` may suspend a batch
#[wasm_bindgen]
pub fn suspendable_from(role: &str) -> Result<js_sys::Array, JsValue> {
    let role = parse_role(role).map_err(|e| JsValue::from_str(&e))?;
    Ok(suspendable_statuses(role)
        .iter()
        .map(|status| JsValue::from_str(status.as_str()))
        .collect())
}

/// Per-unit selling price preview, as a decimal string
#[wasm_bindgen]
pub fn compute_listing_price_str(
    farmer_base: &str,
    transport_fees: &str,
    distributor_margin: &str,
    retailer_margin: &str,
) -> Result<String, JsValue> {
    listing_price(farmer_base, transport_fees, distributor_margin, retailer_margin)
        .map(|price| price.to_string())
        .map_err(|e| JsValue::from_str(&e))
}

/// Validate split portions (JSON array) against the parent quantity
#[wasm_bindgen]
pub fn validate_split(parent_quantity: &str, portions_json: &str) -> Result<(), JsValue> {
    check_split(parent_quantity, portions_json).map_err(|e| JsValue::from_str(&e))
}

/// Whether the public trace page shows a batch in this status
#[wasm_bindgen]
pub fn is_publicly_traceable(status: &str) -> bool {
    parse_status(status)
        .map(shared::is_publicly_traceable)
        .unwrap_or(false)
}

/// Display label for a status code
#[wasm_bindgen]
pub fn status_label(status: &str) -> String {
    parse_status(status)
        .map(|s| s.label().to_string())
        .unwrap_or_else(|_| status.to_string())
}


#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn allowed_transitions_for_farmer() {
        let next = allowed_transitions("CREATED", "farmer").unwrap();
        assert!(next.length() > 0);
        assert!(allowed_transitions("CREATED", "nobody").is_err());
    }

    #[wasm_bindgen_test]
    fn validate_split_reports_mismatch() {
        assert!(validate_split("10", r#"[{"quantity":"4"},{"quantity":"6"}]"#).is_ok());
        assert!(validate_split("10", r#"[{"quantity":"4"}]"#).is_err());
    }
}
