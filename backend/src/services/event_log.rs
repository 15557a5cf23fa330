//! Batch event log
//!
//! Append-only. Every event carries a snapshot of the batch and the performer
//! alongside whatever operation-specific keys the caller supplies.

use chrono::Utc;
use shared::{BatchEvent, BatchEventType, CropBatch, EventMetadata, StakeholderProfile};
use uuid::Uuid;

use crate::error::AppResult;
use crate::store::StoreTx;

/// Standard keys merged into every event's metadata
fn snapshot(batch: &CropBatch, actor: &StakeholderProfile) -> EventMetadata {
    shared::metadata! {
        "batch_status" => batch.status.as_str(),
        "batch_quantity" => batch.quantity,
        "batch_crop_type" => &batch.crop_type,
        "performer_username" => &actor.username,
        "performer_role" => actor.role.as_str(),
        "current_owner" => batch.current_owner,
    }
}

/// Append one event for `batch` inside the caller's transaction.
///
/// Operation-specific keys in `extra` win over the standard snapshot keys.
pub async fn record(
    tx: &mut dyn StoreTx,
    batch: &CropBatch,
    event_type: BatchEventType,
    actor: &StakeholderProfile,
    extra: EventMetadata,
) -> AppResult<BatchEvent> {
    let mut metadata = snapshot(batch, actor);
    metadata.extend(extra);

    let event = BatchEvent {
        id: Uuid::new_v4(),
        batch_id: batch.id,
        event_type,
        performed_by: actor.user_id,
        timestamp: Utc::now(),
        metadata,
    };
    tx.append_event(&event).await?;

    tracing::debug!(
        batch_id = %batch.id,
        event = %event_type,
        performed_by = %actor.user_id,
        "batch event recorded"
    );
    Ok(event)
}

/// Append a custody transfer event with `from_owner`, `to_owner` and `reason`
pub async fn record_ownership_transfer(
    tx: &mut dyn StoreTx,
    batch: &CropBatch,
    from_owner: Uuid,
    event_type: BatchEventType,
    actor: &StakeholderProfile,
    reason: &str,
) -> AppResult<BatchEvent> {
    let extra = shared::metadata! {
        "from_owner" => from_owner,
        "to_owner" => batch.current_owner,
        "reason" => reason,
    };
    record(tx, batch, event_type, actor, extra).await
}
