//! Retail listing and sale bookkeeping

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;
use crate::pricing::PriceBreakdown;
use crate::validation::round2;

/// A batch offered for retail sale.
///
/// Price components are copied at listing time and never recalculated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetailListing {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub retailer_id: Uuid,
    pub farmer_base_price: Decimal,
    pub transport_fees: Decimal,
    pub distributor_margin: Decimal,
    pub retailer_margin: Decimal,
    pub selling_price_per_unit: Decimal,
    pub total_quantity: Decimal,
    pub remaining_quantity: Decimal,
    pub units_sold: Decimal,
    pub total_revenue_generated: Decimal,
    pub is_for_sale: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of one sale against a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaleOutcome {
    pub sold_quantity: Decimal,
    pub sale_revenue: Decimal,
    pub remaining_quantity: Decimal,
    pub is_fully_sold: bool,
}

impl RetailListing {
    /// Open a listing for `quantity` units at the frozen `prices`
    pub fn open(
        batch_id: Uuid,
        retailer_id: Uuid,
        prices: PriceBreakdown,
        quantity: Decimal,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            id: Uuid::new_v4(),
            batch_id,
            retailer_id,
            farmer_base_price: prices.farmer_base_price,
            transport_fees: prices.transport_fees,
            distributor_margin: prices.distributor_margin,
            retailer_margin: prices.retailer_margin,
            selling_price_per_unit: prices.total()?,
            total_quantity: quantity,
            remaining_quantity: quantity,
            units_sold: Decimal::ZERO,
            total_revenue_generated: Decimal::ZERO,
            is_for_sale: true,
            created_at: Utc::now(),
        })
    }

    /// Frozen price components
    pub fn price_breakdown(&self) -> PriceBreakdown {
        PriceBreakdown {
            farmer_base_price: self.farmer_base_price,
            transport_fees: self.transport_fees,
            distributor_margin: self.distributor_margin,
            retailer_margin: self.retailer_margin,
        }
    }

    /// Remaining plus sold always equals the listed total
    pub fn is_balanced(&self) -> bool {
        self.remaining_quantity + self.units_sold == self.total_quantity
            && self.remaining_quantity >= Decimal::ZERO
    }

    /// Apply a sale. `None` sells everything that remains.
    ///
    /// Revenue is rounded to two decimal places per sale.
    pub fn record_sale(&mut self, quantity: Option<Decimal>) -> Result<SaleOutcome, DomainError> {
        if !self.is_for_sale {
            return Err(DomainError::invalid(
                "listing",
                "This listing is not available for sale",
            ));
        }
        if self.remaining_quantity <= Decimal::ZERO {
            return Err(DomainError::invalid(
                "listing",
                "No remaining quantity available for sale",
            ));
        }

        let sold = quantity.unwrap_or(self.remaining_quantity);
        if sold <= Decimal::ZERO {
            return Err(DomainError::invalid(
                "sold_quantity",
                "Sold quantity must be greater than 0",
            ));
        }
        if sold > self.remaining_quantity {
            return Err(DomainError::invalid(
                "sold_quantity",
                format!(
                    "Cannot sell more than available. Available: {}, Requested: {}",
                    self.remaining_quantity, sold
                ),
            ));
        }

        let revenue = sold
            .checked_mul(self.selling_price_per_unit)
            .map(round2)
            .ok_or_else(|| DomainError::invalid("sale_revenue", "Sale revenue overflows"))?;
        let total_revenue = self
            .total_revenue_generated
            .checked_add(revenue)
            .ok_or_else(|| {
                DomainError::invalid("total_revenue_generated", "Total revenue overflows")
            })?;

        self.remaining_quantity -= sold;
        self.units_sold += sold;
        self.total_revenue_generated = total_revenue;

        let is_fully_sold = self.remaining_quantity.is_zero();
        if is_fully_sold {
            self.is_for_sale = false;
        }

        Ok(SaleOutcome {
            sold_quantity: sold,
            sale_revenue: revenue,
            remaining_quantity: self.remaining_quantity,
            is_fully_sold,
        })
    }
}
