//! In-memory entity store
//!
//! Used by tests and local runs without PostgreSQL. A transaction takes the
//! store-wide lock, works on a private copy of the state and swaps it in on
//! commit, so transactions are fully serialized and a dropped transaction
//! leaves no trace.

use async_trait::async_trait;
use shared::{
    BatchEvent, BatchSplit, CropBatch, InspectionReport, RetailListing, StakeholderProfile,
    TransportLeg, TransportRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;
use uuid::Uuid;

use super::{EntityStore, StoreTx};
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    profiles: HashMap<Uuid, StakeholderProfile>,
    batches: HashMap<Uuid, CropBatch>,
    /// Insertion order doubles as creation order
    transports: Vec<TransportRequest>,
    listings: Vec<RetailListing>,
    splits: Vec<BatchSplit>,
    inspections: Vec<InspectionReport>,
    events: Vec<BatchEvent>,
}

/// Entity store held entirely in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of events recorded across all batches
    pub async fn event_count(&self) -> usize {
        self.state.lock().await.events.len()
    }

    /// Number of batches, including split children
    pub async fn batch_count(&self) -> usize {
        self.state.lock().await.batches.len()
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let guard = self.state.clone().lock_owned().await;
        debug!("memory store transaction started");
        let working = guard.clone();
        Ok(Box::new(MemoryTx { guard, working }))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

struct MemoryTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

fn missing(what: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {}", what, id))
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn profile(&mut self, id: Uuid) -> AppResult<StakeholderProfile> {
        self.working
            .profiles
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("Stakeholder profile", id))
    }

    async fn profile_by_user(&mut self, user_id: Uuid) -> AppResult<StakeholderProfile> {
        self.working
            .profiles
            .values()
            .find(|p| p.user_id == user_id)
            .cloned()
            .ok_or_else(|| missing("Stakeholder profile for user", user_id))
    }

    async fn insert_profile(&mut self, profile: &StakeholderProfile) -> AppResult<()> {
        if self
            .working
            .profiles
            .values()
            .any(|p| p.user_id == profile.user_id)
        {
            return Err(AppError::Conflict(format!(
                "User {} already has a stakeholder profile",
                profile.user_id
            )));
        }
        self.working.profiles.insert(profile.id, profile.clone());
        Ok(())
    }

    async fn batch_for_update(&mut self, id: Uuid) -> AppResult<CropBatch> {
        self.batch(id).await
    }

    async fn batch(&mut self, id: Uuid) -> AppResult<CropBatch> {
        self.working
            .batches
            .get(&id)
            .cloned()
            .ok_or_else(|| missing("Batch", id))
    }

    async fn batch_by_public_id(&mut self, public_batch_id: Uuid) -> AppResult<CropBatch> {
        self.working
            .batches
            .values()
            .find(|b| b.public_batch_id == public_batch_id)
            .cloned()
            .ok_or_else(|| missing("Batch", public_batch_id))
    }

    async fn insert_batch(&mut self, batch: &CropBatch) -> AppResult<()> {
        self.working.batches.insert(batch.id, batch.clone());
        Ok(())
    }

    async fn save_batch(&mut self, batch: &CropBatch) -> AppResult<()> {
        match self.working.batches.get_mut(&batch.id) {
            Some(slot) => {
                *slot = batch.clone();
                Ok(())
            }
            None => Err(missing("Batch", batch.id)),
        }
    }

    async fn children_of(&mut self, parent_id: Uuid) -> AppResult<Vec<CropBatch>> {
        let mut children: Vec<CropBatch> = self
            .working
            .batches
            .values()
            .filter(|b| b.parent_batch_id == Some(parent_id))
            .cloned()
            .collect();
        children.sort_by_key(|b| b.created_at);
        Ok(children)
    }

    async fn transport_for_update(&mut self, id: Uuid) -> AppResult<TransportRequest> {
        self.working
            .transports
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| missing("Transport request", id))
    }

    async fn insert_transport(&mut self, request: &TransportRequest) -> AppResult<()> {
        self.working.transports.push(request.clone());
        Ok(())
    }

    async fn save_transport(&mut self, request: &TransportRequest) -> AppResult<()> {
        match self
            .working
            .transports
            .iter_mut()
            .find(|t| t.id == request.id)
        {
            Some(slot) => {
                *slot = request.clone();
                Ok(())
            }
            None => Err(missing("Transport request", request.id)),
        }
    }

    async fn transports_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<TransportRequest>> {
        Ok(self
            .working
            .transports
            .iter()
            .filter(|t| t.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn latest_transport(
        &mut self,
        batch_id: Uuid,
        leg: TransportLeg,
    ) -> AppResult<Option<TransportRequest>> {
        Ok(self
            .working
            .transports
            .iter()
            .rev()
            .find(|t| t.batch_id == batch_id && t.leg == leg)
            .cloned())
    }

    async fn listing_for_update(
        &mut self,
        batch_id: Uuid,
        retailer_id: Uuid,
    ) -> AppResult<Option<RetailListing>> {
        Ok(self
            .working
            .listings
            .iter()
            .rev()
            .find(|l| l.batch_id == batch_id && l.retailer_id == retailer_id)
            .cloned())
    }

    async fn listings_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<RetailListing>> {
        Ok(self
            .working
            .listings
            .iter()
            .filter(|l| l.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn insert_listing(&mut self, listing: &RetailListing) -> AppResult<()> {
        self.working.listings.push(listing.clone());
        Ok(())
    }

    async fn save_listing(&mut self, listing: &RetailListing) -> AppResult<()> {
        match self
            .working
            .listings
            .iter_mut()
            .find(|l| l.id == listing.id)
        {
            Some(slot) => {
                *slot = listing.clone();
                Ok(())
            }
            None => Err(missing("Listing", listing.id)),
        }
    }

    async fn insert_split(&mut self, split: &BatchSplit) -> AppResult<()> {
        self.working.splits.push(split.clone());
        Ok(())
    }

    async fn splits_of(&mut self, parent_id: Uuid) -> AppResult<Vec<BatchSplit>> {
        Ok(self
            .working
            .splits
            .iter()
            .filter(|s| s.parent_batch_id == parent_id)
            .cloned()
            .collect())
    }

    async fn insert_inspection(&mut self, report: &InspectionReport) -> AppResult<()> {
        self.working.inspections.push(report.clone());
        Ok(())
    }

    async fn inspections_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<InspectionReport>> {
        Ok(self
            .working
            .inspections
            .iter()
            .filter(|r| r.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn append_event(&mut self, event: &BatchEvent) -> AppResult<()> {
        self.working.events.push(event.clone());
        Ok(())
    }

    async fn events_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<BatchEvent>> {
        let mut events: Vec<BatchEvent> = self
            .working
            .events
            .iter()
            .filter(|e| e.batch_id == batch_id)
            .cloned()
            .collect();
        // Stable sort keeps append order for equal timestamps
        events.sort_by_key(|e| e.timestamp);
        Ok(events)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let MemoryTx { mut guard, working } = *self;
        *guard = working;
        debug!("memory store transaction committed");
        Ok(())
    }
}
