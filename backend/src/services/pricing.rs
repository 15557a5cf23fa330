//! Pricing accumulator
//!
//! Transport happens to the undivided lot, so a split child carries the fees
//! paid on every ancestor before the split as well as its own.

use rust_decimal::Decimal;
use shared::{CropBatch, LineageGuard, PriceBreakdown, TransportStatus};

use crate::error::AppResult;
use crate::store::StoreTx;

/// Sum `transporter_fee_per_unit` over every delivered transport request of
/// `batch` and its ancestors.
///
/// The walk is bounded by `max_depth` generations and refuses to revisit a
/// batch; either condition means the lineage is corrupt and yields an
/// internal error.
pub async fn accumulate_transport_fees(
    tx: &mut dyn StoreTx,
    batch: &CropBatch,
    max_depth: usize,
) -> AppResult<Decimal> {
    let mut guard = LineageGuard::new(max_depth);
    let mut total = Decimal::ZERO;
    let mut node_id = Some(batch.id);

    while let Some(id) = node_id {
        guard.visit(id)?;

        let delivered: Decimal = tx
            .transports_for_batch(id)
            .await?
            .iter()
            .filter(|t| t.status == TransportStatus::Delivered)
            .map(|t| t.transporter_fee_per_unit)
            .sum();
        total += delivered;

        node_id = if id == batch.id {
            batch.parent_batch_id
        } else {
            tx.batch(id).await?.parent_batch_id
        };
    }

    tracing::debug!(
        batch_id = %batch.id,
        generations = guard.depth(),
        transport_fees = %total,
        "accumulated transport fees"
    );
    Ok(total)
}

/// Freeze the four per-unit price components for a new listing
pub async fn listing_price_breakdown(
    tx: &mut dyn StoreTx,
    batch: &CropBatch,
    retailer_margin: Decimal,
    max_depth: usize,
) -> AppResult<PriceBreakdown> {
    let transport_fees = accumulate_transport_fees(tx, batch, max_depth).await?;
    Ok(PriceBreakdown {
        farmer_base_price: batch.farmer_base_price_per_unit,
        transport_fees,
        distributor_margin: batch.distributor_margin_per_unit,
        retailer_margin,
    })
}
