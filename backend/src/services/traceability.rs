//! Batch traceability service for public QR code landing pages
//!
//! Aggregates what a consumer may see about a listed or sold batch: origin,
//! lineage, custody timeline, inspections, and the frozen price breakdown.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    is_publicly_traceable, BatchEventType, BatchStatus, InspectionResult, InspectionStage,
    LineageGuard, TransportLeg, TransportStatus, DEFAULT_MAX_LINEAGE_DEPTH,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::store::{EntityStore, StoreTx};

/// Traceability service for public batch information
#[derive(Clone)]
pub struct TraceabilityService {
    store: Arc<dyn EntityStore>,
    max_lineage_depth: usize,
}

/// Complete traceability view for a batch
#[derive(Debug, Serialize)]
pub struct TraceabilityView {
    pub batch: BatchInfo,
    pub farmer: FarmerInfo,
    /// Product ids from the immediate parent back to the undivided origin
    pub lineage: Vec<String>,
    pub timeline: Vec<TimelineEntry>,
    pub transports: Vec<TransportInfo>,
    pub inspections: Vec<InspectionInfo>,
    pub pricing: Option<PriceInfo>,
}

/// Basic batch information
#[derive(Debug, Serialize)]
pub struct BatchInfo {
    pub public_batch_id: Uuid,
    pub product_batch_id: String,
    pub crop_type: String,
    pub status: BatchStatus,
    pub status_label: &'static str,
    pub quantity: Decimal,
    pub harvest_date: NaiveDate,
    pub farm_location: String,
    pub is_child_batch: bool,
    pub qr_code_url: Option<String>,
}

/// Farmer information (limited for public view)
#[derive(Debug, Serialize)]
pub struct FarmerInfo {
    pub username: String,
    pub organization: String,
}

#[derive(Debug, Serialize)]
pub struct TimelineEntry {
    pub event_type: BatchEventType,
    pub timestamp: DateTime<Utc>,
    /// Role of the performer, taken from the event snapshot
    pub performer_role: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TransportInfo {
    pub leg: TransportLeg,
    pub status: TransportStatus,
    pub pickup_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct InspectionInfo {
    pub stage: InspectionStage,
    pub result: InspectionResult,
    pub inspected_at: DateTime<Utc>,
}

/// Frozen per-unit price components of the latest listing
#[derive(Debug, Serialize)]
pub struct PriceInfo {
    pub farmer_base_price: Decimal,
    pub transport_fees: Decimal,
    pub distributor_margin: Decimal,
    pub retailer_margin: Decimal,
    pub selling_price_per_unit: Decimal,
}

impl TraceabilityService {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        Self {
            store,
            max_lineage_depth: DEFAULT_MAX_LINEAGE_DEPTH,
        }
    }

    pub fn with_max_lineage_depth(mut self, max_lineage_depth: usize) -> Self {
        self.max_lineage_depth = max_lineage_depth;
        self
    }

    /// Get the public view of a batch by its public id.
    ///
    /// Batches that are not listed or sold answer NotFound, the same as an
    /// unknown id.
    pub async fn trace(&self, public_batch_id: Uuid) -> AppResult<TraceabilityView> {
        let mut tx = self.store.begin().await?;

        let batch = tx.batch_by_public_id(public_batch_id).await.map_err(|e| match e {
            AppError::NotFound(_) => not_traceable(public_batch_id),
            other => other,
        })?;
        if !is_publicly_traceable(batch.status) {
            return Err(not_traceable(public_batch_id));
        }

        let farmer = tx.profile(batch.farmer_id).await?;
        let lineage = self.lineage(tx.as_mut(), batch.parent_batch_id).await?;

        let timeline = tx
            .events_for_batch(batch.id)
            .await?
            .into_iter()
            .map(|e| TimelineEntry {
                performer_role: e
                    .metadata
                    .get("performer_role")
                    .and_then(|v| v.as_str())
                    .map(str::to_string),
                event_type: e.event_type,
                timestamp: e.timestamp,
            })
            .collect();

        let transports = tx
            .transports_for_batch(batch.id)
            .await?
            .into_iter()
            .map(|t| TransportInfo {
                leg: t.leg,
                status: t.status,
                pickup_at: t.pickup_at,
                delivered_at: t.delivered_at,
            })
            .collect();

        let inspections = tx
            .inspections_for_batch(batch.id)
            .await?
            .into_iter()
            .map(|r| InspectionInfo {
                stage: r.stage,
                result: r.result,
                inspected_at: r.inspected_at,
            })
            .collect();

        let pricing = tx
            .listings_for_batch(batch.id)
            .await?
            .into_iter()
            .max_by_key(|l| l.created_at)
            .map(|l| PriceInfo {
                farmer_base_price: l.farmer_base_price,
                transport_fees: l.transport_fees,
                distributor_margin: l.distributor_margin,
                retailer_margin: l.retailer_margin,
                selling_price_per_unit: l.selling_price_per_unit,
            });

        tracing::debug!(public_batch_id = %public_batch_id, "trace view served");

        Ok(TraceabilityView {
            batch: BatchInfo {
                public_batch_id: batch.public_batch_id,
                product_batch_id: batch.product_batch_id,
                crop_type: batch.crop_type,
                status: batch.status,
                status_label: batch.status.label(),
                quantity: batch.quantity,
                harvest_date: batch.harvest_date,
                farm_location: batch.farm_location,
                is_child_batch: batch.is_child_batch,
                qr_code_url: batch.qr_code_url,
            },
            farmer: FarmerInfo {
                username: farmer.username,
                organization: farmer.organization,
            },
            lineage,
            timeline,
            transports,
            inspections,
            pricing,
        })
    }

    async fn lineage(
        &self,
        tx: &mut dyn StoreTx,
        mut parent_id: Option<Uuid>,
    ) -> AppResult<Vec<String>> {
        let mut guard = LineageGuard::new(self.max_lineage_depth);
        let mut ancestors = Vec::new();
        while let Some(id) = parent_id {
            guard.visit(id)?;
            let parent = tx.batch(id).await?;
            ancestors.push(parent.product_batch_id);
            parent_id = parent.parent_batch_id;
        }
        Ok(ancestors)
    }
}

fn not_traceable(public_batch_id: Uuid) -> AppError {
    AppError::not_found(format!("Traceable batch {}", public_batch_id))
}
