//! Retail price composition and lineage walking

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use uuid::Uuid;

use crate::error::DomainError;
use crate::validation::MAX_AMOUNT;

/// Default bound on how many ancestors a fee walk will visit
pub const DEFAULT_MAX_LINEAGE_DEPTH: usize = 32;

/// Per-unit price components frozen onto a retail listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub farmer_base_price: Decimal,
    pub transport_fees: Decimal,
    pub distributor_margin: Decimal,
    pub retailer_margin: Decimal,
}

impl PriceBreakdown {
    pub fn total(&self) -> Result<Decimal, DomainError> {
        compute_listing_price(
            self.farmer_base_price,
            self.transport_fees,
            self.distributor_margin,
            self.retailer_margin,
        )
    }
}

/// Selling price per unit: the plain sum of the four components.
///
/// The sum must stay below [`MAX_AMOUNT`] like any other per-unit amount.
pub fn compute_listing_price(
    farmer_base: Decimal,
    transport_fees: Decimal,
    distributor_margin: Decimal,
    retailer_margin: Decimal,
) -> Result<Decimal, DomainError> {
    let total = [transport_fees, distributor_margin, retailer_margin]
        .into_iter()
        .try_fold(farmer_base, |acc, part| acc.checked_add(part))
        .ok_or_else(|| {
            DomainError::invalid("selling_price_per_unit", "Selling price overflows")
        })?;
    if total >= MAX_AMOUNT {
        return Err(DomainError::invalid(
            "selling_price_per_unit",
            format!("Selling price per unit must be less than {}", MAX_AMOUNT),
        ));
    }
    Ok(total)
}

/// Corrupt parent chain detected while walking ancestry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LineageError {
    #[error("batch lineage revisits batch {0}")]
    Cycle(Uuid),

    #[error("batch lineage exceeds {0} generations")]
    TooDeep(usize),
}

/// Guards a child-to-parent walk against cycles and runaway depth
#[derive(Debug)]
pub struct LineageGuard {
    max_depth: usize,
    visited: HashSet<Uuid>,
}

impl LineageGuard {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            visited: HashSet::new(),
        }
    }

    /// Register the next batch on the walk
    pub fn visit(&mut self, batch_id: Uuid) -> Result<(), LineageError> {
        if self.visited.len() >= self.max_depth {
            return Err(LineageError::TooDeep(self.max_depth));
        }
        if !self.visited.insert(batch_id) {
            return Err(LineageError::Cycle(batch_id));
        }
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.visited.len()
    }
}

impl Default for LineageGuard {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LINEAGE_DEPTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn listing_price_is_sum_of_components() {
        let prices = PriceBreakdown {
            farmer_base_price: Decimal::from(10),
            transport_fees: Decimal::from(2),
            distributor_margin: Decimal::from(3),
            retailer_margin: Decimal::from(5),
        };
        assert_eq!(prices.total(), Ok(Decimal::from(20)));
    }

    #[test]
    fn listing_price_rejects_out_of_range_sum() {
        let near_max = Decimal::new(999_999_999_999, 2);
        let err = compute_listing_price(near_max, Decimal::ONE, Decimal::ZERO, Decimal::ZERO)
            .unwrap_err();
        assert!(err.to_string().starts_with("selling_price_per_unit:"));

        let err = compute_listing_price(Decimal::MAX, Decimal::MAX, Decimal::ZERO, Decimal::ZERO)
            .unwrap_err();
        assert_eq!(
            err,
            DomainError::invalid("selling_price_per_unit", "Selling price overflows")
        );
    }

    #[test]
    fn guard_detects_cycle() {
        let mut guard = LineageGuard::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        guard.visit(a).unwrap();
        guard.visit(b).unwrap();
        assert_eq!(guard.visit(a), Err(LineageError::Cycle(a)));
    }

    #[test]
    fn guard_limits_depth() {
        let mut guard = LineageGuard::new(3);
        for _ in 0..3 {
            guard.visit(Uuid::new_v4()).unwrap();
        }
        assert_eq!(guard.depth(), 3);
        assert_eq!(guard.visit(Uuid::new_v4()), Err(LineageError::TooDeep(3)));
    }

    fn price_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..10_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #[test]
        fn prop_listing_price_equals_component_sum(
            base in price_strategy(),
            transport in price_strategy(),
            distributor in price_strategy(),
            retailer in price_strategy()
        ) {
            let total = compute_listing_price(base, transport, distributor, retailer).unwrap();
            prop_assert_eq!(total, base + transport + distributor + retailer);
            prop_assert!(total >= base);
        }
    }
}
