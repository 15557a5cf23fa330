//! Transport request models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::{BatchEventType, BatchStatus, StakeholderRole};
use crate::error::DomainError;

/// Status of a single transport request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportStatus {
    Pending,
    Accepted,
    Arrived,
    ArrivalConfirmed,
    Delivered,
    Rejected,
}

impl TransportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportStatus::Pending => "PENDING",
            TransportStatus::Accepted => "ACCEPTED",
            TransportStatus::Arrived => "ARRIVED",
            TransportStatus::ArrivalConfirmed => "ARRIVAL_CONFIRMED",
            TransportStatus::Delivered => "DELIVERED",
            TransportStatus::Rejected => "REJECTED",
        }
    }
}

impl FromStr for TransportStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(TransportStatus::Pending),
            "ACCEPTED" => Ok(TransportStatus::Accepted),
            "ARRIVED" => Ok(TransportStatus::Arrived),
            "ARRIVAL_CONFIRMED" => Ok(TransportStatus::ArrivalConfirmed),
            "DELIVERED" => Ok(TransportStatus::Delivered),
            "REJECTED" => Ok(TransportStatus::Rejected),
            other => Err(DomainError::unknown("transport status", other)),
        }
    }
}

impl std::fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One custody hop of a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransportLeg {
    FarmerToDistributor,
    DistributorToRetailer,
}

impl TransportLeg {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportLeg::FarmerToDistributor => "FARMER_TO_DISTRIBUTOR",
            TransportLeg::DistributorToRetailer => "DISTRIBUTOR_TO_RETAILER",
        }
    }

    /// Leg implied by the role of the receiving party
    pub fn for_destination(role: StakeholderRole) -> Option<Self> {
        match role {
            StakeholderRole::Distributor => Some(TransportLeg::FarmerToDistributor),
            StakeholderRole::Retailer => Some(TransportLeg::DistributorToRetailer),
            _ => None,
        }
    }

    /// Role the requesting party must hold
    pub fn origin_role(&self) -> StakeholderRole {
        match self {
            TransportLeg::FarmerToDistributor => StakeholderRole::Farmer,
            TransportLeg::DistributorToRetailer => StakeholderRole::Distributor,
        }
    }

    /// Role the receiving party must hold
    pub fn destination_role(&self) -> StakeholderRole {
        match self {
            TransportLeg::FarmerToDistributor => StakeholderRole::Distributor,
            TransportLeg::DistributorToRetailer => StakeholderRole::Retailer,
        }
    }

    pub fn requested_status(&self) -> BatchStatus {
        match self {
            TransportLeg::FarmerToDistributor => BatchStatus::TransportRequested,
            TransportLeg::DistributorToRetailer => BatchStatus::TransportRequestedToRetailer,
        }
    }

    pub fn in_transit_status(&self) -> BatchStatus {
        match self {
            TransportLeg::FarmerToDistributor => BatchStatus::InTransitToDistributor,
            TransportLeg::DistributorToRetailer => BatchStatus::InTransitToRetailer,
        }
    }

    pub fn arrived_status(&self) -> BatchStatus {
        match self {
            TransportLeg::FarmerToDistributor => BatchStatus::ArrivedAtDistributor,
            TransportLeg::DistributorToRetailer => BatchStatus::ArrivedAtRetailer,
        }
    }

    pub fn confirmed_status(&self) -> BatchStatus {
        match self {
            TransportLeg::FarmerToDistributor => BatchStatus::ArrivalConfirmedByDistributor,
            TransportLeg::DistributorToRetailer => BatchStatus::ArrivalConfirmedByRetailer,
        }
    }

    pub fn delivered_status(&self) -> BatchStatus {
        match self {
            TransportLeg::FarmerToDistributor => BatchStatus::DeliveredToDistributor,
            TransportLeg::DistributorToRetailer => BatchStatus::DeliveredToRetailer,
        }
    }

    /// Status a batch returns to when this leg is rejected
    pub fn rejected_status(&self) -> BatchStatus {
        match self {
            TransportLeg::FarmerToDistributor => BatchStatus::Created,
            TransportLeg::DistributorToRetailer => BatchStatus::Stored,
        }
    }

    pub fn requested_event(&self) -> BatchEventType {
        match self {
            TransportLeg::FarmerToDistributor => BatchEventType::TransportRequested,
            TransportLeg::DistributorToRetailer => BatchEventType::TransportRequestedToRetailer,
        }
    }

    pub fn arrived_event(&self) -> BatchEventType {
        match self {
            TransportLeg::FarmerToDistributor => BatchEventType::ArrivedAtDistributor,
            TransportLeg::DistributorToRetailer => BatchEventType::ArrivedAtRetailer,
        }
    }

    pub fn confirmed_event(&self) -> BatchEventType {
        match self {
            TransportLeg::FarmerToDistributor => BatchEventType::ArrivalConfirmedByDistributor,
            TransportLeg::DistributorToRetailer => BatchEventType::ArrivalConfirmedByRetailer,
        }
    }

    pub fn delivered_event(&self) -> BatchEventType {
        match self {
            TransportLeg::FarmerToDistributor => BatchEventType::DeliveredToDistributor,
            TransportLeg::DistributorToRetailer => BatchEventType::DeliveredToRetailer,
        }
    }
}

impl FromStr for TransportLeg {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FARMER_TO_DISTRIBUTOR" => Ok(TransportLeg::FarmerToDistributor),
            "DISTRIBUTOR_TO_RETAILER" => Ok(TransportLeg::DistributorToRetailer),
            other => Err(DomainError::unknown("transport leg", other)),
        }
    }
}

/// A request to move a batch from one party to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransportRequest {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub leg: TransportLeg,
    pub requested_by: Uuid,
    pub from_party: Uuid,
    pub to_party: Uuid,
    /// Assigned on acceptance
    pub transporter_id: Option<Uuid>,
    pub status: TransportStatus,
    pub transporter_fee_per_unit: Decimal,
    pub vehicle_details: String,
    pub driver_details: String,
    pub pickup_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl TransportRequest {
    pub fn is_assigned_to(&self, transporter_id: Uuid) -> bool {
        self.transporter_id == Some(transporter_id)
    }
}
