//! PostgreSQL entity store
//!
//! Every transaction runs at SERIALIZABLE with a bounded `lock_timeout`.
//! Rows read through the `*_for_update` methods are locked with
//! `SELECT ... FOR UPDATE` until commit or rollback.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use shared::{
    BatchEvent, BatchSplit, CropBatch, DomainError, EventMetadata, InspectionReport,
    RetailListing, StakeholderProfile, TransportLeg, TransportRequest,
};
use sqlx::{types::Json, PgPool, Postgres, Transaction};
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

use super::{EntityStore, StoreTx};
use crate::error::{AppError, AppResult};

const PROFILE_COLUMNS: &str =
    "id, user_id, username, role, organization, kyc_status, created_at";

const BATCH_COLUMNS: &str = "id, product_batch_id, public_batch_id, farmer_id, current_owner, \
     status, crop_type, quantity, harvest_date, farm_location, parent_batch_id, is_child_batch, \
     farmer_base_price_per_unit, distributor_margin_per_unit, qr_code_url, created_at, updated_at";

const TRANSPORT_COLUMNS: &str = "id, batch_id, leg, requested_by, from_party, to_party, \
     transporter_id, status, transporter_fee_per_unit, vehicle_details, driver_details, \
     pickup_at, delivered_at, created_at";

const LISTING_COLUMNS: &str = "id, batch_id, retailer_id, farmer_base_price, transport_fees, \
     distributor_margin, retailer_margin, selling_price_per_unit, total_quantity, \
     remaining_quantity, units_sold, total_revenue_generated, is_for_sale, created_at";

const SPLIT_COLUMNS: &str = "id, parent_batch_id, child_batch_id, split_label, quantity, \
     destination_retailer_id, notes, created_at";

const INSPECTION_COLUMNS: &str =
    "id, batch_id, stage, result, inspector_id, notes, inspected_at";

const EVENT_COLUMNS: &str = "id, batch_id, event_type, performed_by, timestamp, metadata";

/// Entity store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
    lock_timeout_ms: u64,
}

impl PgStore {
    pub fn new(db: PgPool, lock_timeout_ms: u64) -> Self {
        Self {
            db,
            lock_timeout_ms,
        }
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn begin(&self) -> AppResult<Box<dyn StoreTx>> {
        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;
        let lock_timeout = format!("SET LOCAL lock_timeout = '{}ms'", self.lock_timeout_ms);
        sqlx::query(&lock_timeout).execute(&mut *tx).await?;
        Ok(Box::new(PgTx { tx }))
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }
}

struct PgTx {
    tx: Transaction<'static, Postgres>,
}

/// Parse an enumeration column; a bad value means the row is corrupt
fn decode<T>(column: &str, value: &str) -> AppResult<T>
where
    T: FromStr<Err = DomainError>,
{
    value
        .parse()
        .map_err(|e: DomainError| AppError::Internal(format!("corrupt {} column: {}", column, e)))
}

fn found<T>(row: Option<T>, what: &str, id: Uuid) -> AppResult<T> {
    row.ok_or_else(|| AppError::NotFound(format!("{} {}", what, id)))
}

// ============================================================================
// Row types
// ============================================================================

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    user_id: Uuid,
    username: String,
    role: String,
    organization: String,
    kyc_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ProfileRow> for StakeholderProfile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> AppResult<Self> {
        Ok(StakeholderProfile {
            id: row.id,
            user_id: row.user_id,
            username: row.username,
            role: decode("role", &row.role)?,
            organization: row.organization,
            kyc_status: decode("kyc_status", &row.kyc_status)?,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BatchRow {
    id: Uuid,
    product_batch_id: String,
    public_batch_id: Uuid,
    farmer_id: Uuid,
    current_owner: Uuid,
    status: String,
    crop_type: String,
    quantity: Decimal,
    harvest_date: NaiveDate,
    farm_location: String,
    parent_batch_id: Option<Uuid>,
    is_child_batch: bool,
    farmer_base_price_per_unit: Decimal,
    distributor_margin_per_unit: Decimal,
    qr_code_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<BatchRow> for CropBatch {
    type Error = AppError;

    fn try_from(row: BatchRow) -> AppResult<Self> {
        Ok(CropBatch {
            id: row.id,
            product_batch_id: row.product_batch_id,
            public_batch_id: row.public_batch_id,
            farmer_id: row.farmer_id,
            current_owner: row.current_owner,
            status: decode("status", &row.status)?,
            crop_type: row.crop_type,
            quantity: row.quantity,
            harvest_date: row.harvest_date,
            farm_location: row.farm_location,
            parent_batch_id: row.parent_batch_id,
            is_child_batch: row.is_child_batch,
            farmer_base_price_per_unit: row.farmer_base_price_per_unit,
            distributor_margin_per_unit: row.distributor_margin_per_unit,
            qr_code_url: row.qr_code_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TransportRow {
    id: Uuid,
    batch_id: Uuid,
    leg: String,
    requested_by: Uuid,
    from_party: Uuid,
    to_party: Uuid,
    transporter_id: Option<Uuid>,
    status: String,
    transporter_fee_per_unit: Decimal,
    vehicle_details: String,
    driver_details: String,
    pickup_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<TransportRow> for TransportRequest {
    type Error = AppError;

    fn try_from(row: TransportRow) -> AppResult<Self> {
        Ok(TransportRequest {
            id: row.id,
            batch_id: row.batch_id,
            leg: decode("leg", &row.leg)?,
            requested_by: row.requested_by,
            from_party: row.from_party,
            to_party: row.to_party,
            transporter_id: row.transporter_id,
            status: decode("status", &row.status)?,
            transporter_fee_per_unit: row.transporter_fee_per_unit,
            vehicle_details: row.vehicle_details,
            driver_details: row.driver_details,
            pickup_at: row.pickup_at,
            delivered_at: row.delivered_at,
            created_at: row.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ListingRow {
    id: Uuid,
    batch_id: Uuid,
    retailer_id: Uuid,
    farmer_base_price: Decimal,
    transport_fees: Decimal,
    distributor_margin: Decimal,
    retailer_margin: Decimal,
    selling_price_per_unit: Decimal,
    total_quantity: Decimal,
    remaining_quantity: Decimal,
    units_sold: Decimal,
    total_revenue_generated: Decimal,
    is_for_sale: bool,
    created_at: DateTime<Utc>,
}

impl From<ListingRow> for RetailListing {
    fn from(row: ListingRow) -> Self {
        RetailListing {
            id: row.id,
            batch_id: row.batch_id,
            retailer_id: row.retailer_id,
            farmer_base_price: row.farmer_base_price,
            transport_fees: row.transport_fees,
            distributor_margin: row.distributor_margin,
            retailer_margin: row.retailer_margin,
            selling_price_per_unit: row.selling_price_per_unit,
            total_quantity: row.total_quantity,
            remaining_quantity: row.remaining_quantity,
            units_sold: row.units_sold,
            total_revenue_generated: row.total_revenue_generated,
            is_for_sale: row.is_for_sale,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct SplitRow {
    id: Uuid,
    parent_batch_id: Uuid,
    child_batch_id: Uuid,
    split_label: String,
    quantity: Decimal,
    destination_retailer_id: Option<Uuid>,
    notes: String,
    created_at: DateTime<Utc>,
}

impl From<SplitRow> for BatchSplit {
    fn from(row: SplitRow) -> Self {
        BatchSplit {
            id: row.id,
            parent_batch_id: row.parent_batch_id,
            child_batch_id: row.child_batch_id,
            split_label: row.split_label,
            quantity: row.quantity,
            destination_retailer_id: row.destination_retailer_id,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct InspectionRow {
    id: Uuid,
    batch_id: Uuid,
    stage: String,
    result: String,
    inspector_id: Uuid,
    notes: String,
    inspected_at: DateTime<Utc>,
}

impl TryFrom<InspectionRow> for InspectionReport {
    type Error = AppError;

    fn try_from(row: InspectionRow) -> AppResult<Self> {
        Ok(InspectionReport {
            id: row.id,
            batch_id: row.batch_id,
            stage: decode("stage", &row.stage)?,
            result: decode("result", &row.result)?,
            inspector_id: row.inspector_id,
            notes: row.notes,
            inspected_at: row.inspected_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    batch_id: Uuid,
    event_type: String,
    performed_by: Uuid,
    timestamp: DateTime<Utc>,
    metadata: Json<EventMetadata>,
}

impl TryFrom<EventRow> for BatchEvent {
    type Error = AppError;

    fn try_from(row: EventRow) -> AppResult<Self> {
        Ok(BatchEvent {
            id: row.id,
            batch_id: row.batch_id,
            event_type: decode("event_type", &row.event_type)?,
            performed_by: row.performed_by,
            timestamp: row.timestamp,
            metadata: row.metadata.0,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ============================================================================
// Transaction
// ============================================================================

#[async_trait]
impl StoreTx for PgTx {
    async fn profile(&mut self, id: Uuid) -> AppResult<StakeholderProfile> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM stakeholder_profiles WHERE id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        found(row, "Stakeholder profile", id)?.try_into()
    }

    async fn profile_by_user(&mut self, user_id: Uuid) -> AppResult<StakeholderProfile> {
        let sql = format!("SELECT {PROFILE_COLUMNS} FROM stakeholder_profiles WHERE user_id = $1");
        let row = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(user_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        found(row, "Stakeholder profile for user", user_id)?.try_into()
    }

    async fn insert_profile(&mut self, profile: &StakeholderProfile) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO stakeholder_profiles (id, user_id, username, role, organization, kyc_status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(profile.id)
        .bind(profile.user_id)
        .bind(&profile.username)
        .bind(profile.role.as_str())
        .bind(&profile.organization)
        .bind(profile.kyc_status.as_str())
        .bind(profile.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn batch_for_update(&mut self, id: Uuid) -> AppResult<CropBatch> {
        debug!(batch_id = %id, "locking batch row");
        let sql = format!("SELECT {BATCH_COLUMNS} FROM crop_batches WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        found(row, "Batch", id)?.try_into()
    }

    async fn batch(&mut self, id: Uuid) -> AppResult<CropBatch> {
        let sql = format!("SELECT {BATCH_COLUMNS} FROM crop_batches WHERE id = $1");
        let row = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        found(row, "Batch", id)?.try_into()
    }

    async fn batch_by_public_id(&mut self, public_batch_id: Uuid) -> AppResult<CropBatch> {
        let sql = format!("SELECT {BATCH_COLUMNS} FROM crop_batches WHERE public_batch_id = $1");
        let row = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(public_batch_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        found(row, "Batch", public_batch_id)?.try_into()
    }

    async fn insert_batch(&mut self, batch: &CropBatch) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO crop_batches (
                id, product_batch_id, public_batch_id, farmer_id, current_owner, status,
                crop_type, quantity, harvest_date, farm_location, parent_batch_id,
                is_child_batch, farmer_base_price_per_unit, distributor_margin_per_unit,
                qr_code_url, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            "#,
        )
        .bind(batch.id)
        .bind(&batch.product_batch_id)
        .bind(batch.public_batch_id)
        .bind(batch.farmer_id)
        .bind(batch.current_owner)
        .bind(batch.status.as_str())
        .bind(&batch.crop_type)
        .bind(batch.quantity)
        .bind(batch.harvest_date)
        .bind(&batch.farm_location)
        .bind(batch.parent_batch_id)
        .bind(batch.is_child_batch)
        .bind(batch.farmer_base_price_per_unit)
        .bind(batch.distributor_margin_per_unit)
        .bind(&batch.qr_code_url)
        .bind(batch.created_at)
        .bind(batch.updated_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn save_batch(&mut self, batch: &CropBatch) -> AppResult<()> {
        // Identity, lineage and farmer columns are immutable and never written here
        let result = sqlx::query(
            r#"
            UPDATE crop_batches
            SET current_owner = $2, status = $3, quantity = $4,
                farmer_base_price_per_unit = $5, distributor_margin_per_unit = $6,
                qr_code_url = $7, updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(batch.id)
        .bind(batch.current_owner)
        .bind(batch.status.as_str())
        .bind(batch.quantity)
        .bind(batch.farmer_base_price_per_unit)
        .bind(batch.distributor_margin_per_unit)
        .bind(&batch.qr_code_url)
        .bind(batch.updated_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Batch {}", batch.id)));
        }
        Ok(())
    }

    async fn children_of(&mut self, parent_id: Uuid) -> AppResult<Vec<CropBatch>> {
        let sql = format!(
            "SELECT {BATCH_COLUMNS} FROM crop_batches WHERE parent_batch_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, BatchRow>(&sql)
            .bind(parent_id)
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn transport_for_update(&mut self, id: Uuid) -> AppResult<TransportRequest> {
        debug!(transport_id = %id, "locking transport request row");
        let sql =
            format!("SELECT {TRANSPORT_COLUMNS} FROM transport_requests WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, TransportRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await?;
        found(row, "Transport request", id)?.try_into()
    }

    async fn insert_transport(&mut self, request: &TransportRequest) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO transport_requests (
                id, batch_id, leg, requested_by, from_party, to_party, transporter_id, status,
                transporter_fee_per_unit, vehicle_details, driver_details, pickup_at,
                delivered_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(request.id)
        .bind(request.batch_id)
        .bind(request.leg.as_str())
        .bind(request.requested_by)
        .bind(request.from_party)
        .bind(request.to_party)
        .bind(request.transporter_id)
        .bind(request.status.as_str())
        .bind(request.transporter_fee_per_unit)
        .bind(&request.vehicle_details)
        .bind(&request.driver_details)
        .bind(request.pickup_at)
        .bind(request.delivered_at)
        .bind(request.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn save_transport(&mut self, request: &TransportRequest) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE transport_requests
            SET transporter_id = $2, status = $3, transporter_fee_per_unit = $4,
                vehicle_details = $5, driver_details = $6, pickup_at = $7, delivered_at = $8
            WHERE id = $1
            "#,
        )
        .bind(request.id)
        .bind(request.transporter_id)
        .bind(request.status.as_str())
        .bind(request.transporter_fee_per_unit)
        .bind(&request.vehicle_details)
        .bind(&request.driver_details)
        .bind(request.pickup_at)
        .bind(request.delivered_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Transport request {}", request.id)));
        }
        Ok(())
    }

    async fn transports_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<TransportRequest>> {
        let sql = format!(
            "SELECT {TRANSPORT_COLUMNS} FROM transport_requests WHERE batch_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, TransportRow>(&sql)
            .bind(batch_id)
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn latest_transport(
        &mut self,
        batch_id: Uuid,
        leg: TransportLeg,
    ) -> AppResult<Option<TransportRequest>> {
        let sql = format!(
            "SELECT {TRANSPORT_COLUMNS} FROM transport_requests \
             WHERE batch_id = $1 AND leg = $2 ORDER BY created_at DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, TransportRow>(&sql)
            .bind(batch_id)
            .bind(leg.as_str())
            .fetch_optional(&mut *self.tx)
            .await?;
        row.map(TransportRequest::try_from).transpose()
    }

    async fn listing_for_update(
        &mut self,
        batch_id: Uuid,
        retailer_id: Uuid,
    ) -> AppResult<Option<RetailListing>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM retail_listings \
             WHERE batch_id = $1 AND retailer_id = $2 \
             ORDER BY created_at DESC LIMIT 1 FOR UPDATE"
        );
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(batch_id)
            .bind(retailer_id)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row.map(RetailListing::from))
    }

    async fn listings_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<RetailListing>> {
        let sql = format!(
            "SELECT {LISTING_COLUMNS} FROM retail_listings WHERE batch_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(batch_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(RetailListing::from).collect())
    }

    async fn insert_listing(&mut self, listing: &RetailListing) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO retail_listings (
                id, batch_id, retailer_id, farmer_base_price, transport_fees, distributor_margin,
                retailer_margin, selling_price_per_unit, total_quantity, remaining_quantity,
                units_sold, total_revenue_generated, is_for_sale, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(listing.id)
        .bind(listing.batch_id)
        .bind(listing.retailer_id)
        .bind(listing.farmer_base_price)
        .bind(listing.transport_fees)
        .bind(listing.distributor_margin)
        .bind(listing.retailer_margin)
        .bind(listing.selling_price_per_unit)
        .bind(listing.total_quantity)
        .bind(listing.remaining_quantity)
        .bind(listing.units_sold)
        .bind(listing.total_revenue_generated)
        .bind(listing.is_for_sale)
        .bind(listing.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn save_listing(&mut self, listing: &RetailListing) -> AppResult<()> {
        // Price components are frozen at listing time and never rewritten
        let result = sqlx::query(
            r#"
            UPDATE retail_listings
            SET remaining_quantity = $2, units_sold = $3, total_revenue_generated = $4,
                is_for_sale = $5
            WHERE id = $1
            "#,
        )
        .bind(listing.id)
        .bind(listing.remaining_quantity)
        .bind(listing.units_sold)
        .bind(listing.total_revenue_generated)
        .bind(listing.is_for_sale)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("Listing {}", listing.id)));
        }
        Ok(())
    }

    async fn insert_split(&mut self, split: &BatchSplit) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO batch_splits (
                id, parent_batch_id, child_batch_id, split_label, quantity,
                destination_retailer_id, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(split.id)
        .bind(split.parent_batch_id)
        .bind(split.child_batch_id)
        .bind(&split.split_label)
        .bind(split.quantity)
        .bind(split.destination_retailer_id)
        .bind(&split.notes)
        .bind(split.created_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn splits_of(&mut self, parent_id: Uuid) -> AppResult<Vec<BatchSplit>> {
        let sql = format!(
            "SELECT {SPLIT_COLUMNS} FROM batch_splits WHERE parent_batch_id = $1 ORDER BY created_at"
        );
        let rows = sqlx::query_as::<_, SplitRow>(&sql)
            .bind(parent_id)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows.into_iter().map(BatchSplit::from).collect())
    }

    async fn insert_inspection(&mut self, report: &InspectionReport) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO inspection_reports (id, batch_id, stage, result, inspector_id, notes, inspected_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(report.id)
        .bind(report.batch_id)
        .bind(report.stage.as_str())
        .bind(report.result.as_str())
        .bind(report.inspector_id)
        .bind(&report.notes)
        .bind(report.inspected_at)
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn inspections_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<InspectionReport>> {
        let sql = format!(
            "SELECT {INSPECTION_COLUMNS} FROM inspection_reports WHERE batch_id = $1 ORDER BY inspected_at"
        );
        let rows = sqlx::query_as::<_, InspectionRow>(&sql)
            .bind(batch_id)
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn append_event(&mut self, event: &BatchEvent) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO batch_events (id, batch_id, event_type, performed_by, timestamp, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(event.id)
        .bind(event.batch_id)
        .bind(event.event_type.as_str())
        .bind(event.performed_by)
        .bind(event.timestamp)
        .bind(Json(&event.metadata))
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn events_for_batch(&mut self, batch_id: Uuid) -> AppResult<Vec<BatchEvent>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM batch_events WHERE batch_id = $1 ORDER BY timestamp ASC"
        );
        let rows = sqlx::query_as::<_, EventRow>(&sql)
            .bind(batch_id)
            .fetch_all(&mut *self.tx)
            .await?;
        convert_all(rows)
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
