//! Entity store ports
//!
//! The lifecycle engine never talks to a database directly. Each operation
//! opens one [`StoreTx`], reads rows it intends to change through the
//! `*_for_update` methods (which hold an exclusive lock until the transaction
//! ends), writes, and commits. Dropping a transaction without committing rolls
//! every write back.

use async_trait::async_trait;
use shared::{
    BatchEvent, BatchSplit, CropBatch, InspectionReport, RetailListing, StakeholderProfile,
    TransportLeg, TransportRequest,
};
use uuid::Uuid;

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Opens transactions against durable storage
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Start a transaction with exclusive row-locking semantics
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>>;

    /// Cheap liveness check used by the health endpoint
    async fn ping(&self) -> AppResult<()>;
}

/// One open transaction
#[async_trait]
pub trait StoreTx: Send {
    // Profiles
    async fn profile(&mut self, id: Uuid) -> AppResult<StakeholderProfile>;
    async fn profile_by_user(&mut self, user_id: Uuid) -> AppResult<StakeholderProfile>;
    async fn insert_profile(&mut self, profile: &StakeholderProfile) -> AppResult<()>;

    // Batches
    async fn batch_for_update(&mut self, id: Uuid) -> AppResult<CropBatch>;
    async fn batch(&mut self, id: Uuid) -> AppResult<CropBatch>;
    async fn batch_by_public_id(&mut self, public_batch_id: Uuid) -> AppResult<CropBatch>;
    async fn insert_batch(&mut self, batch: &CropBatch) -> AppResult<()>;
    async fn save_batch(&mut self, batch: &CropBatch) -> AppResult<()>;
    async fn children_of(&mut self, parent_id: Uuid) -> AppResult<Vec<CropBatch>>;

    // Transport requests
    async fn transport_for_update(&mut self, id: Uuid) -> AppResult<TransportRequest>;
    async fn insert_transport(&mut self, request: &TransportRequest) -> AppResult<()>;
    async fn save_transport(&mut self, request: &TransportRequest) -> AppResult<()>;
    /// All requests for a batch, oldest first
    async fn transports_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<TransportRequest>>;
    /// The active request for a leg: the most recently created one
    async fn latest_transport(
        &mut self,
        batch_id: Uuid,
        leg: TransportLeg,
    ) -> AppResult<Option<TransportRequest>>;

    // Listings
    async fn listing_for_update(
        &mut self,
        batch_id: Uuid,
        retailer_id: Uuid,
    ) -> AppResult<Option<RetailListing>>;
    /// All listings for a batch, oldest first
    async fn listings_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<RetailListing>>;
    async fn insert_listing(&mut self, listing: &RetailListing) -> AppResult<()>;
    async fn save_listing(&mut self, listing: &RetailListing) -> AppResult<()>;

    // Splits
    async fn insert_split(&mut self, split: &BatchSplit) -> AppResult<()>;
    async fn splits_of(&mut self, parent_id: Uuid) -> AppResult<Vec<BatchSplit>>;

    // Inspections
    async fn insert_inspection(&mut self, report: &InspectionReport) -> AppResult<()>;
    async fn inspections_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<InspectionReport>>;

    // Events (append only)
    async fn append_event(&mut self, event: &BatchEvent) -> AppResult<()>;
    /// Events for a batch in ascending timestamp order
    async fn events_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<BatchEvent>>;

    async fn commit(self: Box<Self>) -> AppResult<()>;
}
