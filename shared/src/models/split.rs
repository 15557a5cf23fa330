//! Batch split models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Record of one child batch carved out of a parent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSplit {
    pub id: Uuid,
    pub parent_batch_id: Uuid,
    pub child_batch_id: Uuid,
    pub split_label: String,
    pub quantity: Decimal,
    pub destination_retailer_id: Option<Uuid>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// One requested portion of a split
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPortion {
    #[serde(default)]
    pub label: Option<String>,
    pub quantity: Decimal,
    #[serde(default)]
    pub destination_retailer_id: Option<Uuid>,
    #[serde(default)]
    pub notes: String,
}

impl SplitPortion {
    pub fn new(quantity: Decimal) -> Self {
        Self {
            label: None,
            quantity,
            destination_retailer_id: None,
            notes: String::new(),
        }
    }

    pub fn labelled(label: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            label: Some(label.into()),
            ..Self::new(quantity)
        }
    }

    /// Label to record, falling back to the parent's identifier
    pub fn label_or_default(&self, parent_product_id: &str) -> String {
        match &self.label {
            Some(label) if !label.trim().is_empty() => label.clone(),
            _ => format!("Split from {}", parent_product_id),
        }
    }
}
