//! Quality inspection models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::{BatchEventType, StakeholderRole};
use crate::error::DomainError;

/// Supply chain stage at which an inspection happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionStage {
    Farmer,
    Distributor,
    Retailer,
}

impl InspectionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStage::Farmer => "FARMER",
            InspectionStage::Distributor => "DISTRIBUTOR",
            InspectionStage::Retailer => "RETAILER",
        }
    }

    /// Role an inspector must hold at this stage
    pub fn inspector_role(&self) -> StakeholderRole {
        match self {
            InspectionStage::Farmer => StakeholderRole::Farmer,
            InspectionStage::Distributor => StakeholderRole::Distributor,
            InspectionStage::Retailer => StakeholderRole::Retailer,
        }
    }
}

impl FromStr for InspectionStage {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "FARMER" => Ok(InspectionStage::Farmer),
            "DISTRIBUTOR" => Ok(InspectionStage::Distributor),
            "RETAILER" => Ok(InspectionStage::Retailer),
            other => Err(DomainError::unknown("inspection stage", other)),
        }
    }
}

/// Inspection outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InspectionResult {
    Pass,
    Fail,
    Warning,
}

impl InspectionResult {
    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionResult::Pass => "PASS",
            InspectionResult::Fail => "FAIL",
            InspectionResult::Warning => "WARNING",
        }
    }

    /// Event recorded in the batch history for this outcome
    pub fn event_type(&self) -> BatchEventType {
        match self {
            InspectionResult::Pass => BatchEventType::InspectionPassed,
            InspectionResult::Fail => BatchEventType::InspectionFailed,
            InspectionResult::Warning => BatchEventType::Inspected,
        }
    }
}

impl FromStr for InspectionResult {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PASS" => Ok(InspectionResult::Pass),
            "FAIL" => Ok(InspectionResult::Fail),
            "WARNING" => Ok(InspectionResult::Warning),
            other => Err(DomainError::unknown("inspection result", other)),
        }
    }
}

/// Append-only inspection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionReport {
    pub id: Uuid,
    pub batch_id: Uuid,
    pub stage: InspectionStage,
    pub result: InspectionResult,
    pub inspector_id: Uuid,
    pub notes: String,
    pub inspected_at: DateTime<Utc>,
}
