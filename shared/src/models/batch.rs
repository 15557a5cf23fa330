//! Crop batch and lifecycle status models

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DomainError;

/// Lifecycle status of a crop batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Created,
    TransportRequested,
    InTransitToDistributor,
    ArrivedAtDistributor,
    ArrivalConfirmedByDistributor,
    DeliveredToDistributor,
    Stored,
    TransportRequestedToRetailer,
    InTransitToRetailer,
    ArrivedAtRetailer,
    ArrivalConfirmedByRetailer,
    DeliveredToRetailer,
    Listed,
    Sold,
    TransportRejected,
    Suspended,
    FullySplit,
}

impl BatchStatus {
    pub const ALL: [BatchStatus; 17] = [
        BatchStatus::Created,
        BatchStatus::TransportRequested,
        BatchStatus::InTransitToDistributor,
        BatchStatus::ArrivedAtDistributor,
        BatchStatus::ArrivalConfirmedByDistributor,
        BatchStatus::DeliveredToDistributor,
        BatchStatus::Stored,
        BatchStatus::TransportRequestedToRetailer,
        BatchStatus::InTransitToRetailer,
        BatchStatus::ArrivedAtRetailer,
        BatchStatus::ArrivalConfirmedByRetailer,
        BatchStatus::DeliveredToRetailer,
        BatchStatus::Listed,
        BatchStatus::Sold,
        BatchStatus::TransportRejected,
        BatchStatus::Suspended,
        BatchStatus::FullySplit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Created => "CREATED",
            BatchStatus::TransportRequested => "TRANSPORT_REQUESTED",
            BatchStatus::InTransitToDistributor => "IN_TRANSIT_TO_DISTRIBUTOR",
            BatchStatus::ArrivedAtDistributor => "ARRIVED_AT_DISTRIBUTOR",
            BatchStatus::ArrivalConfirmedByDistributor => "ARRIVAL_CONFIRMED_BY_DISTRIBUTOR",
            BatchStatus::DeliveredToDistributor => "DELIVERED_TO_DISTRIBUTOR",
            BatchStatus::Stored => "STORED",
            BatchStatus::TransportRequestedToRetailer => "TRANSPORT_REQUESTED_TO_RETAILER",
            BatchStatus::InTransitToRetailer => "IN_TRANSIT_TO_RETAILER",
            BatchStatus::ArrivedAtRetailer => "ARRIVED_AT_RETAILER",
            BatchStatus::ArrivalConfirmedByRetailer => "ARRIVAL_CONFIRMED_BY_RETAILER",
            BatchStatus::DeliveredToRetailer => "DELIVERED_TO_RETAILER",
            BatchStatus::Listed => "LISTED",
            BatchStatus::Sold => "SOLD",
            BatchStatus::TransportRejected => "TRANSPORT_REJECTED",
            BatchStatus::Suspended => "SUSPENDED",
            BatchStatus::FullySplit => "FULLY_SPLIT",
        }
    }

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            BatchStatus::Created => "Created",
            BatchStatus::TransportRequested => "Transport Requested",
            BatchStatus::InTransitToDistributor => "In Transit to Distributor",
            BatchStatus::ArrivedAtDistributor => "Arrived at Distributor",
            BatchStatus::ArrivalConfirmedByDistributor => "Arrival Confirmed by Distributor",
            BatchStatus::DeliveredToDistributor => "Delivered to Distributor",
            BatchStatus::Stored => "Stored",
            BatchStatus::TransportRequestedToRetailer => "Transport Requested to Retailer",
            BatchStatus::InTransitToRetailer => "In Transit to Retailer",
            BatchStatus::ArrivedAtRetailer => "Arrived at Retailer",
            BatchStatus::ArrivalConfirmedByRetailer => "Arrival Confirmed by Retailer",
            BatchStatus::DeliveredToRetailer => "Delivered to Retailer",
            BatchStatus::Listed => "Listed for Sale",
            BatchStatus::Sold => "Sold",
            BatchStatus::TransportRejected => "Transport Rejected",
            BatchStatus::Suspended => "Suspended",
            BatchStatus::FullySplit => "Fully Split",
        }
    }

    /// No lifecycle operation may move a batch out of these statuses
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Suspended | BatchStatus::FullySplit | BatchStatus::Sold
        )
    }
}

impl FromStr for BatchStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BatchStatus::ALL
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| DomainError::unknown("batch status", s))
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Only listed or sold batches are exposed through the public trace page
pub fn is_publicly_traceable(status: BatchStatus) -> bool {
    matches!(status, BatchStatus::Listed | BatchStatus::Sold)
}

/// A traceable lot of produce from a single farmer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropBatch {
    pub id: Uuid,
    /// Human readable identifier (e.g., "BATCH-20240315-1A2B3C4D")
    pub product_batch_id: String,
    /// Opaque identifier printed in QR codes
    pub public_batch_id: Uuid,
    /// Originating farmer profile. Never changes.
    pub farmer_id: Uuid,
    /// Account currently holding custody
    pub current_owner: Uuid,
    pub status: BatchStatus,
    pub crop_type: String,
    pub quantity: Decimal,
    pub harvest_date: NaiveDate,
    pub farm_location: String,
    pub parent_batch_id: Option<Uuid>,
    pub is_child_batch: bool,
    pub farmer_base_price_per_unit: Decimal,
    pub distributor_margin_per_unit: Decimal,
    pub qr_code_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CropBatch {
    /// Parent and child flags agree
    pub fn has_consistent_lineage(&self) -> bool {
        self.is_child_batch == self.parent_batch_id.is_some()
    }
}

/// Generate a product batch identifier: BATCH-YYYYMMDD-XXXXXXXX
pub fn generate_product_batch_id(date: NaiveDate, entropy: Uuid) -> String {
    let suffix: String = entropy
        .simple()
        .to_string()
        .chars()
        .take(8)
        .collect::<String>()
        .to_uppercase();
    format!("BATCH-{}-{}", date.format("%Y%m%d"), suffix)
}
