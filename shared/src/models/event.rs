//! Batch event log models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DomainError;
use crate::types::EventMetadata;

/// Kind of entry in a batch's audit trail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchEventType {
    Created,
    TransportRequested,
    TransportRequestedToRetailer,
    TransportAccepted,
    TransportRejected,
    ArrivedAtDistributor,
    ArrivalConfirmedByDistributor,
    DeliveredToDistributor,
    ArrivedAtRetailer,
    ArrivalConfirmedByRetailer,
    DeliveredToRetailer,
    Stored,
    PricingUpdated,
    Inspected,
    InspectionPassed,
    InspectionFailed,
    Listed,
    Sold,
    Suspended,
    FullySplit,
}

impl BatchEventType {
    pub const ALL: [BatchEventType; 20] = [
        BatchEventType::Created,
        BatchEventType::TransportRequested,
        BatchEventType::TransportRequestedToRetailer,
        BatchEventType::TransportAccepted,
        BatchEventType::TransportRejected,
        BatchEventType::ArrivedAtDistributor,
        BatchEventType::ArrivalConfirmedByDistributor,
        BatchEventType::DeliveredToDistributor,
        BatchEventType::ArrivedAtRetailer,
        BatchEventType::ArrivalConfirmedByRetailer,
        BatchEventType::DeliveredToRetailer,
        BatchEventType::Stored,
        BatchEventType::PricingUpdated,
        BatchEventType::Inspected,
        BatchEventType::InspectionPassed,
        BatchEventType::InspectionFailed,
        BatchEventType::Listed,
        BatchEventType::Sold,
        BatchEventType::Suspended,
        BatchEventType::FullySplit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchEventType::Created => "CREATED",
            BatchEventType::TransportRequested => "TRANSPORT_REQUESTED",
            BatchEventType::TransportRequestedToRetailer => "TRANSPORT_REQUESTED_TO_RETAILER",
            BatchEventType::TransportAccepted => "TRANSPORT_ACCEPTED",
            BatchEventType::TransportRejected => "TRANSPORT_REJECTED",
            BatchEventType::ArrivedAtDistributor => "ARRIVED_AT_DISTRIBUTOR",
            BatchEventType::ArrivalConfirmedByDistributor => "ARRIVAL_CONFIRMED_BY_DISTRIBUTOR",
            BatchEventType::DeliveredToDistributor => "DELIVERED_TO_DISTRIBUTOR",
            BatchEventType::ArrivedAtRetailer => "ARRIVED_AT_RETAILER",
            BatchEventType::ArrivalConfirmedByRetailer => "ARRIVAL_CONFIRMED_BY_RETAILER",
            BatchEventType::DeliveredToRetailer => "DELIVERED_TO_RETAILER",
            BatchEventType::Stored => "STORED",
            BatchEventType::PricingUpdated => "PRICING_UPDATED",
            BatchEventType::Inspected => "INSPECTED",
            BatchEventType::InspectionPassed => "INSPECTION_PASSED",
            BatchEventType::InspectionFailed => "INSPECTION_FAILED",
            BatchEventType::Listed => "LISTED",
            BatchEventType::Sold => "SOLD",
            BatchEventType::Suspended => "SUSPENDED",
            BatchEventType::FullySplit => "FULLY_SPLIT",
        }
    }
}

impl FromStr for BatchEventType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BatchEventType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DomainError::unknown("event type", s))
    }
}

impl std::fmt::Display for BatchEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable audit log entry. Never updated or deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchEvent {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub event_type: BatchEventType,
    /// Account that performed the action
    pub performed_by: Uuid,
    pub timestamp: DateTime<Utc>,
    pub metadata: EventMetadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_round_trips_through_str() {
        for kind in BatchEventType::ALL {
            assert_eq!(kind.as_str().parse::<BatchEventType>(), Ok(kind));
        }
    }
}
