//! Batch lifecycle engine
//!
//! Every state-changing operation runs in exactly one store transaction:
//! lock the rows it will change, check role, ownership and status, mutate,
//! append one or more events, commit. Any error drops the transaction, so a
//! rejected operation leaves nothing behind.
//!
//! `current_owner` is written in one place only: [`LifecycleService::deliver_batch`].

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    can_transition, generate_product_batch_id, has_valid_precision, suspendable_statuses,
    validate_batch_quantity, validate_crop_type, validate_price, validate_split_quantities,
    BatchEvent, BatchEventType, BatchSplit, BatchStatus, CropBatch, InspectionReport,
    InspectionResult, InspectionStage, RetailListing, SaleOutcome, SplitPortion,
    StakeholderProfile, StakeholderRole, TransportLeg, TransportRequest, TransportStatus,
    DEFAULT_MAX_LINEAGE_DEPTH,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{event_log, pricing};
use crate::error::{AppError, AppResult};
use crate::external::ArtifactGenerator;
use crate::store::{EntityStore, StoreTx};

// ============================================================================
// Inputs
// ============================================================================

/// Input for creating a batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBatchInput {
    #[validate(length(min = 1, max = 120))]
    pub crop_type: String,
    pub quantity: Decimal,
    pub harvest_date: NaiveDate,
    #[validate(length(max = 255))]
    #[serde(default)]
    pub farm_location: String,
    #[serde(default)]
    pub farmer_base_price_per_unit: Option<Decimal>,
}

/// Input for accepting a transport request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AcceptTransportInput {
    #[serde(default)]
    pub transporter_fee_per_unit: Option<Decimal>,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub vehicle_details: String,
    #[validate(length(max = 500))]
    #[serde(default)]
    pub driver_details: String,
}

/// Input for splitting a stored batch
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SplitBatchInput {
    #[validate(length(min = 1, max = 100))]
    pub splits: Vec<SplitPortion>,
}

/// Input for recording a quality inspection
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct InspectionInput {
    pub stage: InspectionStage,
    pub result: InspectionResult,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub notes: String,
}

// ============================================================================
// Outcomes
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct TransportOutcome {
    pub batch: CropBatch,
    pub transport: TransportRequest,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitOutcome {
    pub parent: CropBatch,
    pub children: Vec<CropBatch>,
    pub splits: Vec<BatchSplit>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingOutcome {
    pub batch: CropBatch,
    pub listing: RetailListing,
    /// Present when artifact generation failed; the listing still stands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact_error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SaleResult {
    pub batch: CropBatch,
    pub listing: RetailListing,
    pub sale: SaleOutcome,
}

// ============================================================================
// Guards
// ============================================================================

fn require_role(actor: &StakeholderProfile, role: StakeholderRole, action: &str) -> AppResult<()> {
    if actor.has_role(role) {
        Ok(())
    } else {
        Err(AppError::forbidden(format!(
            "Only {} accounts can {}",
            role, action
        )))
    }
}

fn require_owner(batch: &CropBatch, actor: &StakeholderProfile) -> AppResult<()> {
    if batch.current_owner == actor.user_id {
        Ok(())
    } else {
        Err(AppError::forbidden("You do not own this batch"))
    }
}

fn require_farmer_of(batch: &CropBatch, actor: &StakeholderProfile) -> AppResult<()> {
    if batch.farmer_id == actor.id {
        Ok(())
    } else {
        Err(AppError::forbidden("You can only act on batches you farmed"))
    }
}

fn require_active(batch: &CropBatch) -> AppResult<()> {
    if batch.status.is_terminal() {
        Err(AppError::AlreadyTerminal(format!(
            "Batch {} is {}",
            batch.product_batch_id, batch.status
        )))
    } else {
        Ok(())
    }
}

fn require_status(batch: &CropBatch, expected: BatchStatus) -> AppResult<()> {
    require_active(batch)?;
    if batch.status == expected {
        Ok(())
    } else {
        Err(AppError::invalid_transition(format!(
            "Batch must be {} but is {}",
            expected, batch.status
        )))
    }
}

fn require_request_status(request: &TransportRequest, expected: TransportStatus) -> AppResult<()> {
    if request.status == expected {
        Ok(())
    } else {
        Err(AppError::invalid_transition(format!(
            "Transport request must be {} but is {}",
            expected, request.status
        )))
    }
}

fn require_assigned(request: &TransportRequest, actor: &StakeholderProfile) -> AppResult<()> {
    if request.is_assigned_to(actor.id) {
        Ok(())
    } else {
        Err(AppError::forbidden(
            "You are not the assigned transporter for this request",
        ))
    }
}

fn touch(batch: &mut CropBatch, status: BatchStatus) {
    batch.status = status;
    batch.updated_at = Utc::now();
}

// ============================================================================
// Service
// ============================================================================

/// The batch lifecycle engine
#[derive(Clone)]
pub struct LifecycleService {
    store: Arc<dyn EntityStore>,
    artifacts: Arc<dyn ArtifactGenerator>,
    max_lineage_depth: usize,
}

impl LifecycleService {
    pub fn new(store: Arc<dyn EntityStore>, artifacts: Arc<dyn ArtifactGenerator>) -> Self {
        Self {
            store,
            artifacts,
            max_lineage_depth: DEFAULT_MAX_LINEAGE_DEPTH,
        }
    }

    pub fn with_max_lineage_depth(mut self, max_lineage_depth: usize) -> Self {
        self.max_lineage_depth = max_lineage_depth;
        self
    }

    // ------------------------------------------------------------------------
    // Farmer
    // ------------------------------------------------------------------------

    /// Register a freshly harvested batch owned by the farmer
    pub async fn create_batch(
        &self,
        actor: &StakeholderProfile,
        input: CreateBatchInput,
    ) -> AppResult<CropBatch> {
        require_role(actor, StakeholderRole::Farmer, "create batches")?;
        input.validate()?;
        validate_crop_type(&input.crop_type)?;
        validate_batch_quantity(input.quantity)?;
        let base_price = input.farmer_base_price_per_unit.unwrap_or(Decimal::ZERO);
        validate_price("farmer_base_price_per_unit", base_price)?;

        let now = Utc::now();
        let batch = CropBatch {
            id: Uuid::new_v4(),
            product_batch_id: generate_product_batch_id(now.date_naive(), Uuid::new_v4()),
            public_batch_id: Uuid::new_v4(),
            farmer_id: actor.id,
            current_owner: actor.user_id,
            status: BatchStatus::Created,
            crop_type: input.crop_type.trim().to_string(),
            quantity: input.quantity,
            harvest_date: input.harvest_date,
            farm_location: input.farm_location,
            parent_batch_id: None,
            is_child_batch: false,
            farmer_base_price_per_unit: base_price,
            distributor_margin_per_unit: Decimal::ZERO,
            qr_code_url: None,
            created_at: now,
            updated_at: now,
        };

        let mut tx = self.store.begin().await?;
        tx.insert_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            BatchEventType::Created,
            actor,
            shared::metadata! { "product_batch_id" => &batch.product_batch_id },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, product_batch_id = %batch.product_batch_id, farmer = %actor.id, "batch created");
        Ok(batch)
    }

    // ------------------------------------------------------------------------
    // Transport legs
    // ------------------------------------------------------------------------

    /// Ask a transporter to move the batch to `counterparty_id`.
    ///
    /// The leg follows the counterparty's role: a farmer ships a CREATED batch
    /// to a distributor, a distributor ships a STORED batch to a retailer.
    pub async fn request_transport(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        counterparty_id: Uuid,
    ) -> AppResult<TransportOutcome> {
        self.open_transport(actor, batch_id, counterparty_id, None)
            .await
    }

    /// Distributor to retailer leg; the batch must be STORED
    pub async fn request_transport_to_retailer(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        retailer_id: Uuid,
    ) -> AppResult<TransportOutcome> {
        self.open_transport(
            actor,
            batch_id,
            retailer_id,
            Some(TransportLeg::DistributorToRetailer),
        )
        .await
    }

    async fn open_transport(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        counterparty_id: Uuid,
        expected_leg: Option<TransportLeg>,
    ) -> AppResult<TransportOutcome> {
        let mut tx = self.store.begin().await?;
        let mut batch = tx.batch_for_update(batch_id).await?;

        if batch.status == BatchStatus::Suspended {
            return Err(AppError::validation(
                "status",
                "Cannot request transport for a suspended batch",
            ));
        }
        require_active(&batch)?;

        let counterparty = tx.profile(counterparty_id).await?;
        let leg = TransportLeg::for_destination(counterparty.role).ok_or_else(|| {
            AppError::validation(
                "to_party",
                "Transport can only be requested to a distributor or a retailer",
            )
        })?;
        if let Some(expected) = expected_leg {
            if leg != expected {
                return Err(AppError::validation(
                    "to_party",
                    format!("Counterparty must be a {}", expected.destination_role()),
                ));
            }
        }

        require_role(actor, leg.origin_role(), "request this transport leg")?;
        match leg {
            TransportLeg::FarmerToDistributor => require_farmer_of(&batch, actor)?,
            TransportLeg::DistributorToRetailer => require_owner(&batch, actor)?,
        }
        require_status(&batch, leg.rejected_status())?;
        can_transition(batch.status, actor.role, leg.requested_status())?;

        let request = TransportRequest {
            id: Uuid::new_v4(),
            batch_id: batch.id,
            leg,
            requested_by: actor.id,
            from_party: actor.id,
            to_party: counterparty.id,
            transporter_id: None,
            status: TransportStatus::Pending,
            transporter_fee_per_unit: Decimal::ZERO,
            vehicle_details: String::new(),
            driver_details: String::new(),
            pickup_at: None,
            delivered_at: None,
            created_at: Utc::now(),
        };
        touch(&mut batch, leg.requested_status());

        tx.insert_transport(&request).await?;
        tx.save_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            leg.requested_event(),
            actor,
            shared::metadata! {
                "transport_request_id" => request.id,
                "leg" => leg.as_str(),
                "to_party" => counterparty.id,
                "to_party_username" => &counterparty.username,
            },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, transport_id = %request.id, leg = leg.as_str(), "transport requested");
        Ok(TransportOutcome {
            batch,
            transport: request,
        })
    }

    /// Load a transport request and its batch, both locked
    async fn lock_leg(
        &self,
        tx: &mut dyn StoreTx,
        request_id: Uuid,
    ) -> AppResult<(TransportRequest, CropBatch)> {
        let request = tx.transport_for_update(request_id).await?;
        let batch = tx.batch_for_update(request.batch_id).await?;
        Ok((request, batch))
    }

    /// A transporter takes a pending request; the batch goes in transit
    pub async fn accept_transport(
        &self,
        actor: &StakeholderProfile,
        request_id: Uuid,
        input: AcceptTransportInput,
    ) -> AppResult<TransportOutcome> {
        require_role(actor, StakeholderRole::Transporter, "accept transport requests")?;
        input.validate()?;
        let fee = input.transporter_fee_per_unit.unwrap_or(Decimal::ZERO);
        validate_price("transporter_fee_per_unit", fee)?;

        let mut tx = self.store.begin().await?;
        let (mut request, mut batch) = self.lock_leg(tx.as_mut(), request_id).await?;

        require_request_status(&request, TransportStatus::Pending)?;
        let leg = request.leg;
        require_status(&batch, leg.requested_status())?;
        can_transition(batch.status, actor.role, leg.in_transit_status())?;

        let now = Utc::now();
        request.transporter_id = Some(actor.id);
        request.status = TransportStatus::Accepted;
        request.transporter_fee_per_unit = fee;
        request.vehicle_details = input.vehicle_details;
        request.driver_details = input.driver_details;
        request.pickup_at = Some(now);
        touch(&mut batch, leg.in_transit_status());

        tx.save_transport(&request).await?;
        tx.save_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            BatchEventType::TransportAccepted,
            actor,
            shared::metadata! {
                "transport_request_id" => request.id,
                "transporter_fee_per_unit" => fee,
                "vehicle_details" => &request.vehicle_details,
            },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, transport_id = %request.id, transporter = %actor.id, "transport accepted");
        Ok(TransportOutcome {
            batch,
            transport: request,
        })
    }

    /// The assigned transporter reports arrival at the receiver
    pub async fn mark_arrival(
        &self,
        actor: &StakeholderProfile,
        request_id: Uuid,
    ) -> AppResult<TransportOutcome> {
        let mut tx = self.store.begin().await?;
        let (mut request, mut batch) = self.lock_leg(tx.as_mut(), request_id).await?;

        require_assigned(&request, actor)?;
        require_request_status(&request, TransportStatus::Accepted)?;
        let leg = request.leg;
        require_status(&batch, leg.in_transit_status())?;

        request.status = TransportStatus::Arrived;
        touch(&mut batch, leg.arrived_status());

        tx.save_transport(&request).await?;
        tx.save_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            leg.arrived_event(),
            actor,
            shared::metadata! { "transport_request_id" => request.id },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, transport_id = %request.id, "arrival marked");
        Ok(TransportOutcome {
            batch,
            transport: request,
        })
    }

    /// The receiving party acknowledges the goods arrived
    pub async fn confirm_arrival(
        &self,
        actor: &StakeholderProfile,
        request_id: Uuid,
    ) -> AppResult<TransportOutcome> {
        let mut tx = self.store.begin().await?;
        let (mut request, mut batch) = self.lock_leg(tx.as_mut(), request_id).await?;

        if request.to_party != actor.id {
            return Err(AppError::forbidden(
                "Only the receiving party can confirm arrival",
            ));
        }
        require_request_status(&request, TransportStatus::Arrived)?;
        let leg = request.leg;
        require_status(&batch, leg.arrived_status())?;

        request.status = TransportStatus::ArrivalConfirmed;
        touch(&mut batch, leg.confirmed_status());

        tx.save_transport(&request).await?;
        tx.save_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            leg.confirmed_event(),
            actor,
            shared::metadata! { "transport_request_id" => request.id },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, transport_id = %request.id, receiver = %actor.id, "arrival confirmed");
        Ok(TransportOutcome {
            batch,
            transport: request,
        })
    }

    /// Finalize a confirmed delivery and hand custody to the receiver
    pub async fn deliver_batch(
        &self,
        actor: &StakeholderProfile,
        request_id: Uuid,
    ) -> AppResult<TransportOutcome> {
        let mut tx = self.store.begin().await?;
        let (mut request, mut batch) = self.lock_leg(tx.as_mut(), request_id).await?;

        require_assigned(&request, actor)?;
        require_request_status(&request, TransportStatus::ArrivalConfirmed)?;
        let leg = request.leg;
        require_status(&batch, leg.confirmed_status())?;

        let receiver = tx.profile(request.to_party).await?;
        let from_owner = batch.current_owner;
        let now = Utc::now();

        request.status = TransportStatus::Delivered;
        request.delivered_at = Some(now);
        batch.current_owner = receiver.user_id;
        touch(&mut batch, leg.delivered_status());

        tx.save_transport(&request).await?;
        tx.save_batch(&batch).await?;
        let reason = format!("Delivery to {} confirmed by transporter", receiver.role);
        event_log::record_ownership_transfer(
            tx.as_mut(),
            &batch,
            from_owner,
            leg.delivered_event(),
            actor,
            &reason,
        )
        .await?;
        tx.commit().await?;

        info!(
            batch_id = %batch.id,
            transport_id = %request.id,
            from_owner = %from_owner,
            to_owner = %batch.current_owner,
            "batch delivered, ownership transferred"
        );
        Ok(TransportOutcome {
            batch,
            transport: request,
        })
    }

    /// A transporter declines a pending request; the batch goes back to
    /// where the leg started
    pub async fn reject_transport(
        &self,
        actor: &StakeholderProfile,
        request_id: Uuid,
    ) -> AppResult<TransportOutcome> {
        require_role(actor, StakeholderRole::Transporter, "reject transport requests")?;

        let mut tx = self.store.begin().await?;
        let (mut request, mut batch) = self.lock_leg(tx.as_mut(), request_id).await?;

        require_request_status(&request, TransportStatus::Pending)?;
        let leg = request.leg;
        require_status(&batch, leg.requested_status())?;

        request.status = TransportStatus::Rejected;
        touch(&mut batch, leg.rejected_status());

        tx.save_transport(&request).await?;
        tx.save_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            BatchEventType::TransportRejected,
            actor,
            shared::metadata! {
                "transport_request_id" => request.id,
                "rejected_by" => actor.id,
                "reverted_to" => batch.status.as_str(),
            },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, transport_id = %request.id, reverted_to = %batch.status, "transport rejected");
        Ok(TransportOutcome {
            batch,
            transport: request,
        })
    }

    // ------------------------------------------------------------------------
    // Distributor
    // ------------------------------------------------------------------------

    /// Put a delivered batch into distributor storage
    pub async fn store_batch(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
    ) -> AppResult<CropBatch> {
        require_role(actor, StakeholderRole::Distributor, "store batches")?;

        let mut tx = self.store.begin().await?;
        let mut batch = tx.batch_for_update(batch_id).await?;
        require_owner(&batch, actor)?;
        require_status(&batch, BatchStatus::DeliveredToDistributor)?;
        can_transition(batch.status, actor.role, BatchStatus::Stored)?;

        touch(&mut batch, BatchStatus::Stored);
        tx.save_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            BatchEventType::Stored,
            actor,
            shared::metadata! {},
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, distributor = %actor.id, "batch stored");
        Ok(batch)
    }

    /// Set the distributor's per-unit margin carried into retail pricing
    pub async fn set_distributor_margin(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        margin: Decimal,
    ) -> AppResult<CropBatch> {
        require_role(actor, StakeholderRole::Distributor, "set distributor margins")?;
        validate_price("distributor_margin_per_unit", margin)?;

        let mut tx = self.store.begin().await?;
        let mut batch = tx.batch_for_update(batch_id).await?;
        require_owner(&batch, actor)?;
        require_active(&batch)?;
        if !matches!(
            batch.status,
            BatchStatus::DeliveredToDistributor | BatchStatus::Stored
        ) {
            return Err(AppError::invalid_transition(format!(
                "Distributor margin cannot be changed while batch is {}",
                batch.status
            )));
        }

        let previous = batch.distributor_margin_per_unit;
        batch.distributor_margin_per_unit = margin;
        batch.updated_at = Utc::now();
        tx.save_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            BatchEventType::PricingUpdated,
            actor,
            shared::metadata! {
                "distributor_margin_per_unit" => margin,
                "previous_distributor_margin_per_unit" => previous,
            },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, margin = %margin, "distributor margin updated");
        Ok(batch)
    }

    /// Divide a stored batch into child batches whose quantities add up to
    /// the parent's. The parent ends FULLY_SPLIT with quantity zero.
    pub async fn split_batch(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        input: SplitBatchInput,
    ) -> AppResult<SplitOutcome> {
        require_role(actor, StakeholderRole::Distributor, "split batches")?;
        input.validate()?;

        let mut tx = self.store.begin().await?;
        let mut parent = tx.batch_for_update(batch_id).await?;
        require_owner(&parent, actor)?;
        require_status(&parent, BatchStatus::Stored)?;
        validate_split_quantities(parent.quantity, &input.splits)?;

        for portion in &input.splits {
            if let Some(retailer_id) = portion.destination_retailer_id {
                let retailer = tx.profile(retailer_id).await?;
                if !retailer.has_role(StakeholderRole::Retailer) {
                    return Err(AppError::validation(
                        "destination_retailer_id",
                        format!("{} is not a retailer", retailer.username),
                    ));
                }
            }
        }

        let now = Utc::now();
        let mut children = Vec::with_capacity(input.splits.len());
        let mut splits = Vec::with_capacity(input.splits.len());

        for portion in &input.splits {
            let child = CropBatch {
                id: Uuid::new_v4(),
                product_batch_id: generate_product_batch_id(now.date_naive(), Uuid::new_v4()),
                public_batch_id: Uuid::new_v4(),
                farmer_id: parent.farmer_id,
                current_owner: actor.user_id,
                status: BatchStatus::Stored,
                crop_type: parent.crop_type.clone(),
                quantity: portion.quantity,
                harvest_date: parent.harvest_date,
                farm_location: parent.farm_location.clone(),
                parent_batch_id: Some(parent.id),
                is_child_batch: true,
                farmer_base_price_per_unit: parent.farmer_base_price_per_unit,
                distributor_margin_per_unit: parent.distributor_margin_per_unit,
                qr_code_url: None,
                created_at: now,
                updated_at: now,
            };
            let split = BatchSplit {
                id: Uuid::new_v4(),
                parent_batch_id: parent.id,
                child_batch_id: child.id,
                split_label: portion.label_or_default(&parent.product_batch_id),
                quantity: portion.quantity,
                destination_retailer_id: portion.destination_retailer_id,
                notes: portion.notes.clone(),
                created_at: now,
            };

            tx.insert_batch(&child).await?;
            tx.insert_split(&split).await?;
            event_log::record(
                tx.as_mut(),
                &child,
                BatchEventType::Created,
                actor,
                shared::metadata! {
                    "product_batch_id" => &child.product_batch_id,
                    "parent_batch_id" => parent.id,
                    "parent_product_batch_id" => &parent.product_batch_id,
                    "split_label" => &split.split_label,
                },
            )
            .await?;

            children.push(child);
            splits.push(split);
        }

        let original_quantity = parent.quantity;
        parent.quantity = Decimal::ZERO;
        touch(&mut parent, BatchStatus::FullySplit);
        tx.save_batch(&parent).await?;

        let child_ids: Vec<&str> = children
            .iter()
            .map(|c| c.product_batch_id.as_str())
            .collect();
        event_log::record(
            tx.as_mut(),
            &parent,
            BatchEventType::FullySplit,
            actor,
            shared::metadata! {
                "original_quantity" => original_quantity,
                "child_batches" => child_ids,
                "split_count" => children.len(),
            },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %parent.id, children = children.len(), "batch split");
        Ok(SplitOutcome {
            parent,
            children,
            splits,
        })
    }

    // ------------------------------------------------------------------------
    // Retailer
    // ------------------------------------------------------------------------

    /// Offer a delivered batch for sale with frozen price components.
    ///
    /// The trace artifact is generated after the listing commits. Failure
    /// there is reported in the outcome, not returned as an error.
    pub async fn list_batch(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        retailer_margin: Decimal,
    ) -> AppResult<ListingOutcome> {
        require_role(actor, StakeholderRole::Retailer, "list batches")?;
        validate_price("retailer_margin", retailer_margin)?;

        let mut tx = self.store.begin().await?;
        let mut batch = tx.batch_for_update(batch_id).await?;
        require_owner(&batch, actor)?;
        require_status(&batch, BatchStatus::DeliveredToRetailer)?;
        can_transition(batch.status, actor.role, BatchStatus::Listed)?;

        let prices = pricing::listing_price_breakdown(
            tx.as_mut(),
            &batch,
            retailer_margin,
            self.max_lineage_depth,
        )
        .await?;
        let listing = RetailListing::open(batch.id, actor.id, prices, batch.quantity)?;
        touch(&mut batch, BatchStatus::Listed);

        tx.insert_listing(&listing).await?;
        tx.save_batch(&batch).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            BatchEventType::Listed,
            actor,
            shared::metadata! {
                "listing_id" => listing.id,
                "farmer_base_price" => listing.farmer_base_price,
                "transport_fees" => listing.transport_fees,
                "distributor_margin" => listing.distributor_margin,
                "retailer_margin" => listing.retailer_margin,
                "selling_price_per_unit" => listing.selling_price_per_unit,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            batch_id = %batch.id,
            listing_id = %listing.id,
            price = %listing.selling_price_per_unit,
            "batch listed"
        );

        let artifact_error = match self.artifacts.generate_trace_artifact(&batch).await {
            Ok(url) => match self.attach_qr_code(batch.id, &url).await {
                Ok(updated) => {
                    batch = updated;
                    None
                }
                Err(e) => {
                    warn!(batch_id = %batch.id, error = %e, "failed to store trace artifact url");
                    Some(e.to_string())
                }
            },
            Err(e) => {
                warn!(batch_id = %batch.id, error = %e, "trace artifact generation failed");
                Some(e.to_string())
            }
        };

        Ok(ListingOutcome {
            batch,
            listing,
            artifact_error,
        })
    }

    /// Best-effort write of the artifact url in its own transaction
    async fn attach_qr_code(&self, batch_id: Uuid, url: &str) -> AppResult<CropBatch> {
        let mut tx = self.store.begin().await?;
        let mut batch = tx.batch_for_update(batch_id).await?;
        batch.qr_code_url = Some(url.to_string());
        batch.updated_at = Utc::now();
        tx.save_batch(&batch).await?;
        tx.commit().await?;
        Ok(batch)
    }

    /// Sell from a listing. `None` sells everything that remains; the batch
    /// becomes SOLD once nothing remains.
    pub async fn sell_batch(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        sold_quantity: Option<Decimal>,
    ) -> AppResult<SaleResult> {
        require_role(actor, StakeholderRole::Retailer, "sell batches")?;
        if let Some(quantity) = sold_quantity {
            if !has_valid_precision(quantity) {
                return Err(AppError::validation(
                    "sold_quantity",
                    "Sold quantity cannot have more than 2 decimal places",
                ));
            }
        }

        let mut tx = self.store.begin().await?;
        let mut batch = tx.batch_for_update(batch_id).await?;
        require_owner(&batch, actor)?;
        require_status(&batch, BatchStatus::Listed)?;
        can_transition(batch.status, actor.role, BatchStatus::Sold)?;

        let mut listing = tx
            .listing_for_update(batch.id, actor.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Listing for batch {}", batch.id)))?;
        let sale = listing.record_sale(sold_quantity)?;
        tx.save_listing(&listing).await?;

        if sale.is_fully_sold {
            touch(&mut batch, BatchStatus::Sold);
            tx.save_batch(&batch).await?;
        }

        event_log::record(
            tx.as_mut(),
            &batch,
            BatchEventType::Sold,
            actor,
            shared::metadata! {
                "listing_id" => listing.id,
                "sold_quantity" => sale.sold_quantity,
                "sale_revenue" => sale.sale_revenue,
                "remaining_quantity" => sale.remaining_quantity,
                "is_fully_sold" => sale.is_fully_sold,
            },
        )
        .await?;
        tx.commit().await?;

        info!(
            batch_id = %batch.id,
            sold = %sale.sold_quantity,
            remaining = %sale.remaining_quantity,
            fully_sold = sale.is_fully_sold,
            "sale recorded"
        );
        Ok(SaleResult {
            batch,
            listing,
            sale,
        })
    }

    // ------------------------------------------------------------------------
    // Any stakeholder
    // ------------------------------------------------------------------------

    /// Freeze a batch. Terminal: nothing resumes a suspended batch.
    pub async fn suspend_batch(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        reason: Option<String>,
    ) -> AppResult<CropBatch> {
        let mut tx = self.store.begin().await?;
        let mut batch = tx.batch_for_update(batch_id).await?;

        if batch.status == BatchStatus::Suspended {
            return Err(AppError::AlreadyTerminal(
                "Batch is already suspended".to_string(),
            ));
        }

        // Farmers keep suspend rights on their own batches after custody moves
        if actor.has_role(StakeholderRole::Farmer) {
            require_farmer_of(&batch, actor)?;
        } else {
            require_owner(&batch, actor)?;
        }

        let allowed = suspendable_statuses(actor.role);
        if allowed.is_empty() {
            return Err(AppError::forbidden(format!(
                "Role {} cannot suspend batches",
                actor.role
            )));
        }
        if !allowed.contains(&batch.status) {
            require_active(&batch)?;
            let allowed: Vec<&str> = allowed.iter().map(|s| s.as_str()).collect();
            return Err(AppError::invalid_transition(format!(
                "Cannot suspend batch with status {}. Allowed statuses for your role: {}",
                batch.status,
                allowed.join(", ")
            )));
        }

        let previous = batch.status;
        touch(&mut batch, BatchStatus::Suspended);
        tx.save_batch(&batch).await?;

        let mut extra = shared::metadata! {
            "suspended_by_role" => actor.role.as_str(),
            "suspended_by" => &actor.username,
            "previous_status" => previous.as_str(),
        };
        if let Some(reason) = reason.filter(|r| !r.trim().is_empty()) {
            extra.insert("reason".to_string(), reason.into());
        }
        event_log::record(tx.as_mut(), &batch, BatchEventType::Suspended, actor, extra).await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, role = %actor.role, previous = %previous, "batch suspended");
        Ok(batch)
    }

    /// Append a quality inspection. Batch status is left untouched.
    pub async fn record_inspection(
        &self,
        actor: &StakeholderProfile,
        batch_id: Uuid,
        input: InspectionInput,
    ) -> AppResult<InspectionReport> {
        input.validate()?;
        require_role(actor, input.stage.inspector_role(), "inspect at this stage")?;

        let mut tx = self.store.begin().await?;
        let batch = tx.batch_for_update(batch_id).await?;
        require_active(&batch)?;
        match input.stage {
            InspectionStage::Farmer => require_farmer_of(&batch, actor)?,
            InspectionStage::Distributor | InspectionStage::Retailer => {
                require_owner(&batch, actor)?
            }
        }

        let report = InspectionReport {
            id: Uuid::new_v4(),
            batch_id: batch.id,
            stage: input.stage,
            result: input.result,
            inspector_id: actor.id,
            notes: input.notes,
            inspected_at: Utc::now(),
        };
        tx.insert_inspection(&report).await?;
        event_log::record(
            tx.as_mut(),
            &batch,
            report.result.event_type(),
            actor,
            shared::metadata! {
                "inspection_id" => report.id,
                "stage" => report.stage.as_str(),
                "result" => report.result.as_str(),
                "notes" => &report.notes,
            },
        )
        .await?;
        tx.commit().await?;

        info!(batch_id = %batch.id, stage = report.stage.as_str(), result = report.result.as_str(), "inspection recorded");
        Ok(report)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    pub async fn get_batch(&self, batch_id: Uuid) -> AppResult<CropBatch> {
        let mut tx = self.store.begin().await?;
        tx.batch(batch_id).await
    }

    /// Batch history, newest first
    pub async fn batch_history(&self, batch_id: Uuid) -> AppResult<Vec<BatchEvent>> {
        let mut tx = self.store.begin().await?;
        tx.batch(batch_id).await?;
        let mut events = tx.events_for_batch(batch_id).await?;
        events.reverse();
        Ok(events)
    }

    pub async fn transport_requests(&self, batch_id: Uuid) -> AppResult<Vec<TransportRequest>> {
        let mut tx = self.store.begin().await?;
        tx.batch(batch_id).await?;
        tx.transports_for_batch(batch_id).await
    }

    /// The active request for a leg of `batch_id`, if one was ever opened
    pub async fn active_transport(
        &self,
        batch_id: Uuid,
        leg: TransportLeg,
    ) -> AppResult<Option<TransportRequest>> {
        let mut tx = self.store.begin().await?;
        tx.latest_transport(batch_id, leg).await
    }

    /// Accumulated per-unit transport fees across the batch's lineage
    pub async fn transport_fees(&self, batch_id: Uuid) -> AppResult<Decimal> {
        let mut tx = self.store.begin().await?;
        let batch = tx.batch(batch_id).await?;
        pricing::accumulate_transport_fees(tx.as_mut(), &batch, self.max_lineage_depth).await
    }
}
