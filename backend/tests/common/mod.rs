//! Shared fixtures for backend integration tests
#![allow(dead_code)]

use agritrace::external::ArtifactGenerator;
use agritrace::services::lifecycle::{AcceptTransportInput, CreateBatchInput};
use agritrace::services::profile::RegisterProfileInput;
use agritrace::services::{LifecycleService, ProfileService, TraceabilityService};
use agritrace::store::{EntityStore, MemoryStore, StoreTx};
use agritrace::{AppError, AppResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::{
    BatchEvent, BatchSplit, CropBatch, InspectionReport, RetailListing, StakeholderProfile,
    StakeholderRole, TransportLeg, TransportRequest,
};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use uuid::Uuid;

pub fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

/// Artifact generator returning a fixed URL shape
pub struct StaticArtifacts;

#[async_trait]
impl ArtifactGenerator for StaticArtifacts {
    async fn generate_trace_artifact(&self, batch: &CropBatch) -> AppResult<String> {
        Ok(format!("https://qr.test/{}", batch.public_batch_id))
    }
}

/// Artifact generator that always fails
pub struct FailingArtifacts;

#[async_trait]
impl ArtifactGenerator for FailingArtifacts {
    async fn generate_trace_artifact(&self, _batch: &CropBatch) -> AppResult<String> {
        Err(AppError::ExternalService("QR service unavailable".to_string()))
    }
}

/// One of each stakeholder role over a fresh in-memory store
pub struct Fixture {
    pub store: MemoryStore,
    pub engine: LifecycleService,
    pub profiles: ProfileService,
    pub trace: TraceabilityService,
    pub farmer: StakeholderProfile,
    pub transporter: StakeholderProfile,
    pub distributor: StakeholderProfile,
    pub retailer: StakeholderProfile,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_artifacts(Arc::new(StaticArtifacts)).await
    }

    pub async fn with_artifacts(artifacts: Arc<dyn ArtifactGenerator>) -> Self {
        let store = MemoryStore::new();
        let shared_store: Arc<dyn EntityStore> = Arc::new(store.clone());
        let profiles = ProfileService::new(shared_store.clone());

        let farmer = register(&profiles, "farmer_somchai", StakeholderRole::Farmer).await;
        let transporter = register(&profiles, "truck_co", StakeholderRole::Transporter).await;
        let distributor = register(&profiles, "central_dc", StakeholderRole::Distributor).await;
        let retailer = register(&profiles, "fresh_mart", StakeholderRole::Retailer).await;

        Self {
            engine: LifecycleService::new(shared_store.clone(), artifacts),
            trace: TraceabilityService::new(shared_store),
            store,
            profiles,
            farmer,
            transporter,
            distributor,
            retailer,
        }
    }

    pub async fn register(&self, username: &str, role: StakeholderRole) -> StakeholderProfile {
        register(&self.profiles, username, role).await
    }

    pub async fn create_batch(&self, quantity: &str, base_price: &str) -> CropBatch {
        self.engine
            .create_batch(
                &self.farmer,
                CreateBatchInput {
                    crop_type: "Jasmine Rice".to_string(),
                    quantity: dec(quantity),
                    harvest_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
                    farm_location: "Chiang Rai".to_string(),
                    farmer_base_price_per_unit: Some(dec(base_price)),
                },
            )
            .await
            .unwrap()
    }

    /// Run a full transport leg from request to delivery
    pub async fn ship(
        &self,
        sender: &StakeholderProfile,
        batch_id: Uuid,
        receiver: &StakeholderProfile,
        fee: &str,
    ) -> (CropBatch, TransportRequest) {
        let requested = self
            .engine
            .request_transport(sender, batch_id, receiver.id)
            .await
            .unwrap();
        let request_id = requested.transport.id;
        self.engine
            .accept_transport(&self.transporter, request_id, accept_with_fee(fee))
            .await
            .unwrap();
        self.engine
            .mark_arrival(&self.transporter, request_id)
            .await
            .unwrap();
        self.engine
            .confirm_arrival(receiver, request_id)
            .await
            .unwrap();
        let delivered = self
            .engine
            .deliver_batch(&self.transporter, request_id)
            .await
            .unwrap();
        (delivered.batch, delivered.transport)
    }

    /// Farm to distributor storage
    pub async fn stored_batch(&self, quantity: &str, base_price: &str, fee: &str) -> CropBatch {
        let batch = self.create_batch(quantity, base_price).await;
        self.ship(&self.farmer, batch.id, &self.distributor, fee)
            .await;
        self.engine
            .store_batch(&self.distributor, batch.id)
            .await
            .unwrap()
    }

    /// Stored batch carried on to the retailer
    pub async fn batch_at_retailer(&self, batch_id: Uuid, fee: &str) -> CropBatch {
        let (batch, _) = self
            .ship(&self.distributor, batch_id, &self.retailer, fee)
            .await;
        batch
    }
}

pub async fn register(
    profiles: &ProfileService,
    username: &str,
    role: StakeholderRole,
) -> StakeholderProfile {
    profiles
        .register(RegisterProfileInput {
            user_id: Uuid::new_v4(),
            username: username.to_string(),
            role,
            organization: String::new(),
        })
        .await
        .unwrap()
}

pub fn accept_with_fee(fee: &str) -> AcceptTransportInput {
    AcceptTransportInput {
        transporter_fee_per_unit: Some(dec(fee)),
        vehicle_details: "6-wheel truck".to_string(),
        driver_details: "Driver A".to_string(),
    }
}

// ============================================================================
// Failure injection
// ============================================================================

/// Memory store whose `fail_at`-th batch insert (1-based, counted across
/// transactions) returns a database error
#[derive(Clone)]
pub struct FailingInsertStore {
    inner: MemoryStore,
    inserts: Arc<AtomicUsize>,
    fail_at: usize,
}

impl FailingInsertStore {
    pub fn new(inner: MemoryStore, fail_at: usize) -> Self {
        Self {
            inner,
            inserts: Arc::new(AtomicUsize::new(0)),
            fail_at,
        }
    }
}

#[async_trait]
impl EntityStore for FailingInsertStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        Ok(Box::new(FailingInsertTx {
            inner: self.inner.begin().await?,
            inserts: self.inserts.clone(),
            fail_at: self.fail_at,
        }))
    }

    async fn ping(&self) -> AppResult<()> {
        self.inner.ping().await
    }
}

struct FailingInsertTx {
    inner: Box<dyn StoreTx>,
    inserts: Arc<AtomicUsize>,
    fail_at: usize,
}

#[async_trait]
impl StoreTx for FailingInsertTx {
    async fn profile(&mut self, id: Uuid) -> AppResult<StakeholderProfile> {
        self.inner.profile(id).await
    }
    async fn profile_by_user(&mut self, user_id: Uuid) -> AppResult<StakeholderProfile> {
        self.inner.profile_by_user(user_id).await
    }
    async fn insert_profile(&mut self, profile: &StakeholderProfile) -> AppResult<()> {
        self.inner.insert_profile(profile).await
    }

    async fn batch_for_update(&mut self, id: Uuid) -> AppResult<CropBatch> {
        self.inner.batch_for_update(id).await
    }
    async fn batch(&mut self, id: Uuid) -> AppResult<CropBatch> {
        self.inner.batch(id).await
    }
    async fn batch_by_public_id(&mut self, public_batch_id: Uuid) -> AppResult<CropBatch> {
        self.inner.batch_by_public_id(public_batch_id).await
    }
    async fn insert_batch(&mut self, batch: &CropBatch) -> AppResult<()> {
        let n = self.inserts.fetch_add(1, Ordering::SeqCst) + 1;
        if n == self.fail_at {
            return Err(AppError::Internal("batch insert failed".to_string()));
        }
        self.inner.insert_batch(batch).await
    }
    async fn save_batch(&mut self, batch: &CropBatch) -> AppResult<()> {
        self.inner.save_batch(batch).await
    }
    async fn children_of(&mut self, parent_id: Uuid) -> AppResult<Vec<CropBatch>> {
        self.inner.children_of(parent_id).await
    }

    async fn transport_for_update(&mut self, id: Uuid) -> AppResult<TransportRequest> {
        self.inner.transport_for_update(id).await
    }
    async fn insert_transport(&mut self, request: &TransportRequest) -> AppResult<()> {
        self.inner.insert_transport(request).await
    }
    async fn save_transport(&mut self, request: &TransportRequest) -> AppResult<()> {
        self.inner.save_transport(request).await
    }
    async fn transports_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<TransportRequest>> {
        self.inner.transports_for_batch(batch_id).await
    }
    async fn latest_transport(
        &mut self,
        batch_id: Uuid,
        leg: TransportLeg,
    ) -> AppResult<Option<TransportRequest>> {
        self.inner.latest_transport(batch_id, leg).await
    }

    async fn listing_for_update(
        &mut self,
        batch_id: Uuid,
        retailer_id: Uuid,
    ) -> AppResult<Option<RetailListing>> {
        self.inner.listing_for_update(batch_id, retailer_id).await
    }
    async fn listings_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<RetailListing>> {
        self.inner.listings_for_batch(batch_id).await
    }
    async fn insert_listing(&mut self, listing: &RetailListing) -> AppResult<()> {
        self.inner.insert_listing(listing).await
    }
    async fn save_listing(&mut self, listing: &RetailListing) -> AppResult<()> {
        self.inner.save_listing(listing).await
    }

    async fn insert_split(&mut self, split: &BatchSplit) -> AppResult<()> {
        self.inner.insert_split(split).await
    }
    async fn splits_of(&mut self, parent_id: Uuid) -> AppResult<Vec<BatchSplit>> {
        self.inner.splits_of(parent_id).await
    }

    async fn insert_inspection(&mut self, report: &InspectionReport) -> AppResult<()> {
        self.inner.insert_inspection(report).await
    }
    async fn inspections_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<InspectionReport>> {
        self.inner.inspections_for_batch(batch_id).await
    }

    async fn append_event(&mut self, event: &BatchEvent) -> AppResult<()> {
        self.inner.append_event(event).await
    }
    async fn events_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<BatchEvent>> {
        self.inner.events_for_batch(batch_id).await
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.inner.commit().await
    }
}
