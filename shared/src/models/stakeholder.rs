//! Stakeholder profile and role models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::DomainError;

/// Supply chain role of a stakeholder. Fixed at registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StakeholderRole {
    Farmer,
    Transporter,
    Distributor,
    Retailer,
    Consumer,
    Admin,
}

impl StakeholderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StakeholderRole::Farmer => "farmer",
            StakeholderRole::Transporter => "transporter",
            StakeholderRole::Distributor => "distributor",
            StakeholderRole::Retailer => "retailer",
            StakeholderRole::Consumer => "consumer",
            StakeholderRole::Admin => "admin",
        }
    }
}

impl FromStr for StakeholderRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "farmer" => Ok(StakeholderRole::Farmer),
            "transporter" => Ok(StakeholderRole::Transporter),
            "distributor" => Ok(StakeholderRole::Distributor),
            "retailer" => Ok(StakeholderRole::Retailer),
            "consumer" => Ok(StakeholderRole::Consumer),
            "admin" => Ok(StakeholderRole::Admin),
            other => Err(DomainError::unknown("role", other)),
        }
    }
}

impl std::fmt::Display for StakeholderRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// KYC verification state of a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KycStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl KycStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            KycStatus::Pending => "pending",
            KycStatus::Approved => "approved",
            KycStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for KycStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(KycStatus::Pending),
            "approved" => Ok(KycStatus::Approved),
            "rejected" => Ok(KycStatus::Rejected),
            other => Err(DomainError::unknown("kyc status", other)),
        }
    }
}

/// A stakeholder on the platform. One profile per user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeholderProfile {
    pub id: Uuid,
    /// The user account this profile belongs to. Batch ownership points here.
    pub user_id: Uuid,
    pub username: String,
    pub role: StakeholderRole,
    pub organization: String,
    pub kyc_status: KycStatus,
    pub created_at: DateTime<Utc>,
}

impl StakeholderProfile {
    /// Create a new profile for an account
    pub fn new(username: impl Into<String>, role: StakeholderRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            username: username.into(),
            role,
            organization: String::new(),
            kyc_status: KycStatus::Pending,
            created_at: Utc::now(),
        }
    }

    pub fn with_organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = organization.into();
        self
    }

    pub fn has_role(&self, role: StakeholderRole) -> bool {
        self.role == role
    }
}
