//! Batch lifecycle tests
//!
//! Drives the engine over the in-memory store:
//! - Farm to distributor custody transfer
//! - Bilateral delivery gate
//! - Transport rejection
//! - Splitting
//! - Suspension
//! - Inspections

mod common;

use agritrace::services::lifecycle::{CreateBatchInput, InspectionInput, SplitBatchInput};
use agritrace::AppError;
use chrono::NaiveDate;
use agritrace::services::LifecycleService;
use common::{accept_with_fee, dec, FailingInsertStore, Fixture, StaticArtifacts};
use std::sync::Arc;
use rust_decimal::Decimal;
use shared::{
    BatchEventType, BatchStatus, InspectionResult, InspectionStage, SplitPortion,
    StakeholderRole, TransportLeg, TransportStatus,
};

// ============================================================================
// Creation
// ============================================================================

/// New batches start CREATED and owned by the farmer's account
#[tokio::test]
async fn test_create_batch_sets_owner_and_status() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("100", "10").await;

    assert_eq!(batch.status, BatchStatus::Created);
    assert_eq!(batch.current_owner, fx.farmer.user_id);
    assert_eq!(batch.farmer_id, fx.farmer.id);
    assert!(batch.product_batch_id.starts_with("BATCH-"));
    assert!(!batch.is_child_batch);

    let history = fx.engine.batch_history(batch.id).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].event_type, BatchEventType::Created);
    assert_eq!(history[0].performed_by, fx.farmer.user_id);
}

/// Only farmers create batches
#[tokio::test]
async fn test_create_batch_requires_farmer() {
    let fx = Fixture::new().await;
    let err = fx
        .engine
        .create_batch(
            &fx.distributor,
            CreateBatchInput {
                crop_type: "Mango".to_string(),
                quantity: dec("10"),
                harvest_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                farm_location: String::new(),
                farmer_base_price_per_unit: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Forbidden(_)));
    assert_eq!(fx.store.batch_count().await, 0);
}

/// Zero quantity is rejected before anything is written
#[tokio::test]
async fn test_create_batch_rejects_non_positive_quantity() {
    let fx = Fixture::new().await;
    let err = fx
        .engine
        .create_batch(
            &fx.farmer,
            CreateBatchInput {
                crop_type: "Mango".to_string(),
                quantity: Decimal::ZERO,
                harvest_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                farm_location: String::new(),
                farmer_base_price_per_unit: None,
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(fx.store.event_count().await, 0);
}

/// Quantities and prices must fit the storage range
#[tokio::test]
async fn test_create_batch_rejects_out_of_range_amounts() {
    let fx = Fixture::new().await;
    let input = |quantity: &str, price: &str| CreateBatchInput {
        crop_type: "Mango".to_string(),
        quantity: dec(quantity),
        harvest_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        farm_location: String::new(),
        farmer_base_price_per_unit: Some(dec(price)),
    };

    let err = fx
        .engine
        .create_batch(&fx.farmer, input("100000000000000000000", "10"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "quantity"));

    let err = fx
        .engine
        .create_batch(&fx.farmer, input("1", "79228162514264337593543950335"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        AppError::Validation { ref field, .. } if field == "farmer_base_price_per_unit"
    ));

    assert_eq!(fx.store.batch_count().await, 0);
}

// ============================================================================
// Transport legs
// ============================================================================

/// Farmer to distributor, then store, then split 40/60
#[tokio::test]
async fn test_farm_to_split_scenario() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("100", "10").await;

    let (delivered, request) = fx.ship(&fx.farmer, batch.id, &fx.distributor, "2").await;
    assert_eq!(delivered.status, BatchStatus::DeliveredToDistributor);
    assert_eq!(delivered.current_owner, fx.distributor.user_id);
    assert_eq!(request.status, TransportStatus::Delivered);
    assert!(request.delivered_at.is_some());

    let stored = fx.engine.store_batch(&fx.distributor, batch.id).await.unwrap();
    assert_eq!(stored.status, BatchStatus::Stored);

    let outcome = fx
        .engine
        .split_batch(
            &fx.distributor,
            batch.id,
            SplitBatchInput {
                splits: vec![
                    SplitPortion::labelled("North", dec("40")),
                    SplitPortion::labelled("South", dec("60")),
                ],
            },
        )
        .await
        .unwrap();

    assert_eq!(outcome.parent.status, BatchStatus::FullySplit);
    assert_eq!(outcome.parent.quantity, Decimal::ZERO);
    assert_eq!(outcome.children.len(), 2);
    let quantities: Vec<Decimal> = outcome.children.iter().map(|c| c.quantity).collect();
    assert_eq!(quantities, vec![dec("40"), dec("60")]);
    for child in &outcome.children {
        assert_eq!(child.status, BatchStatus::Stored);
        assert!(child.is_child_batch);
        assert_eq!(child.parent_batch_id, Some(batch.id));
        assert_eq!(child.current_owner, fx.distributor.user_id);
        assert_eq!(child.farmer_id, fx.farmer.id);
        assert_eq!(child.farmer_base_price_per_unit, dec("10"));
    }
    assert_eq!(outcome.splits[0].split_label, "North");

    let history = fx.engine.batch_history(batch.id).await.unwrap();
    let latest = &history[0];
    assert_eq!(latest.event_type, BatchEventType::FullySplit);
    assert_eq!(
        latest.metadata.get("child_batches").and_then(|v| v.as_array()).map(|a| a.len()),
        Some(2)
    );
}

/// Ownership stays with the sender until the transporter delivers
#[tokio::test]
async fn test_ownership_unchanged_before_delivery() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;
    let request_id = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap()
        .transport
        .id;

    let accepted = fx
        .engine
        .accept_transport(&fx.transporter, request_id, accept_with_fee("1"))
        .await
        .unwrap();
    assert_eq!(accepted.batch.status, BatchStatus::InTransitToDistributor);
    assert_eq!(accepted.batch.current_owner, fx.farmer.user_id);

    let arrived = fx.engine.mark_arrival(&fx.transporter, request_id).await.unwrap();
    assert_eq!(arrived.batch.status, BatchStatus::ArrivedAtDistributor);
    assert_eq!(arrived.batch.current_owner, fx.farmer.user_id);

    let confirmed = fx
        .engine
        .confirm_arrival(&fx.distributor, request_id)
        .await
        .unwrap();
    assert_eq!(
        confirmed.batch.status,
        BatchStatus::ArrivalConfirmedByDistributor
    );
    assert_eq!(confirmed.batch.current_owner, fx.farmer.user_id);
}

/// Delivery before the receiver confirms is refused
#[tokio::test]
async fn test_deliver_requires_receiver_confirmation() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;
    let request_id = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap()
        .transport
        .id;
    fx.engine
        .accept_transport(&fx.transporter, request_id, accept_with_fee("1"))
        .await
        .unwrap();
    fx.engine.mark_arrival(&fx.transporter, request_id).await.unwrap();
    let events_before = fx.store.event_count().await;

    let err = fx
        .engine
        .deliver_batch(&fx.transporter, request_id)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidTransition(_)));
    assert_eq!(fx.store.event_count().await, events_before);
    let batch = fx.engine.get_batch(batch.id).await.unwrap();
    assert_eq!(batch.status, BatchStatus::ArrivedAtDistributor);
    assert_eq!(batch.current_owner, fx.farmer.user_id);
}

/// Only the receiving party may confirm arrival
#[tokio::test]
async fn test_confirm_arrival_by_other_party_is_forbidden() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;
    let request_id = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap()
        .transport
        .id;
    fx.engine
        .accept_transport(&fx.transporter, request_id, accept_with_fee("1"))
        .await
        .unwrap();
    fx.engine.mark_arrival(&fx.transporter, request_id).await.unwrap();

    let err = fx
        .engine
        .confirm_arrival(&fx.transporter, request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

/// Another transporter cannot report arrival on someone else's job
#[tokio::test]
async fn test_mark_arrival_requires_assigned_transporter() {
    let fx = Fixture::new().await;
    let other = fx.register("other_truck", StakeholderRole::Transporter).await;
    let batch = fx.create_batch("50", "10").await;
    let request_id = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap()
        .transport
        .id;
    fx.engine
        .accept_transport(&fx.transporter, request_id, accept_with_fee("1"))
        .await
        .unwrap();

    let err = fx.engine.mark_arrival(&other, request_id).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

/// Only the farmer who grew the batch may ship it from the farm
#[tokio::test]
async fn test_request_transport_by_other_farmer_is_forbidden() {
    let fx = Fixture::new().await;
    let other = fx.register("farmer_other", StakeholderRole::Farmer).await;
    let batch = fx.create_batch("50", "10").await;

    let err = fx
        .engine
        .request_transport(&other, batch.id, fx.distributor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

/// Transport can only go to a distributor or retailer
#[tokio::test]
async fn test_request_transport_to_transporter_is_invalid() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;

    let err = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.transporter.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

/// The retailer leg needs a STORED batch
#[tokio::test]
async fn test_request_transport_to_retailer_requires_stored() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;
    fx.ship(&fx.farmer, batch.id, &fx.distributor, "1").await;

    let err = fx
        .engine
        .request_transport_to_retailer(&fx.distributor, batch.id, fx.retailer.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    fx.engine.store_batch(&fx.distributor, batch.id).await.unwrap();
    let outcome = fx
        .engine
        .request_transport_to_retailer(&fx.distributor, batch.id, fx.retailer.id)
        .await
        .unwrap();
    assert_eq!(outcome.batch.status, BatchStatus::TransportRequestedToRetailer);
}

/// Unknown batch ids resolve to NotFound
#[tokio::test]
async fn test_request_transport_for_missing_batch() {
    let fx = Fixture::new().await;
    let err = fx
        .engine
        .request_transport(&fx.farmer, uuid::Uuid::new_v4(), fx.distributor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

// ============================================================================
// Rejection
// ============================================================================

/// A rejected farm leg returns the batch to CREATED and it can be re-requested
#[tokio::test]
async fn test_reject_farm_leg_reverts_to_created() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;
    let request_id = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap()
        .transport
        .id;

    let rejected = fx
        .engine
        .reject_transport(&fx.transporter, request_id)
        .await
        .unwrap();
    assert_eq!(rejected.transport.status, TransportStatus::Rejected);
    assert_eq!(rejected.batch.status, BatchStatus::Created);

    let history = fx.engine.batch_history(batch.id).await.unwrap();
    assert_eq!(history[0].event_type, BatchEventType::TransportRejected);
    assert_eq!(
        history[0].metadata.get("reverted_to").and_then(|v| v.as_str()),
        Some("CREATED")
    );

    let again = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap();
    assert_eq!(again.batch.status, BatchStatus::TransportRequested);
    let transports = fx.engine.transport_requests(batch.id).await.unwrap();
    assert_eq!(transports.len(), 2);

    let active = fx
        .engine
        .active_transport(batch.id, TransportLeg::FarmerToDistributor)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(active.id, again.transport.id);
    assert_eq!(active.status, TransportStatus::Pending);
    assert!(fx
        .engine
        .active_transport(batch.id, TransportLeg::DistributorToRetailer)
        .await
        .unwrap()
        .is_none());
}

/// A rejected retail leg returns the batch to STORED
#[tokio::test]
async fn test_reject_retail_leg_reverts_to_stored() {
    let fx = Fixture::new().await;
    let batch = fx.stored_batch("50", "10", "1").await;
    let request_id = fx
        .engine
        .request_transport_to_retailer(&fx.distributor, batch.id, fx.retailer.id)
        .await
        .unwrap()
        .transport
        .id;

    let rejected = fx
        .engine
        .reject_transport(&fx.transporter, request_id)
        .await
        .unwrap();
    assert_eq!(rejected.batch.status, BatchStatus::Stored);
    assert_eq!(rejected.batch.current_owner, fx.distributor.user_id);
}

/// Accepted requests can no longer be rejected
#[tokio::test]
async fn test_reject_after_accept_is_invalid() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;
    let request_id = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap()
        .transport
        .id;
    fx.engine
        .accept_transport(&fx.transporter, request_id, accept_with_fee("1"))
        .await
        .unwrap();

    let err = fx
        .engine
        .reject_transport(&fx.transporter, request_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

// ============================================================================
// Splitting
// ============================================================================

/// Portions summing to 99 of 100 are rejected and nothing changes
#[tokio::test]
async fn test_split_sum_mismatch_is_rejected() {
    let fx = Fixture::new().await;
    let batch = fx.stored_batch("100", "10", "1").await;
    let batches_before = fx.store.batch_count().await;
    let events_before = fx.store.event_count().await;

    let err = fx
        .engine
        .split_batch(
            &fx.distributor,
            batch.id,
            SplitBatchInput {
                splits: vec![SplitPortion::new(dec("40")), SplitPortion::new(dec("59"))],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(fx.store.batch_count().await, batches_before);
    assert_eq!(fx.store.event_count().await, events_before);
    let parent = fx.engine.get_batch(batch.id).await.unwrap();
    assert_eq!(parent.status, BatchStatus::Stored);
    assert_eq!(parent.quantity, dec("100"));
}

/// A non-retailer destination is refused before any child is written
#[tokio::test]
async fn test_split_with_bad_destination_is_rejected() {
    let fx = Fixture::new().await;
    let batch = fx.stored_batch("100", "10", "1").await;
    let batches_before = fx.store.batch_count().await;

    let mut bad = SplitPortion::new(dec("60"));
    bad.destination_retailer_id = Some(fx.transporter.id);
    let err = fx
        .engine
        .split_batch(
            &fx.distributor,
            batch.id,
            SplitBatchInput {
                splits: vec![SplitPortion::new(dec("40")), bad],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { .. }));
    assert_eq!(fx.store.batch_count().await, batches_before);
}

/// Overlong split labels are a validation error
#[tokio::test]
async fn test_split_rejects_overlong_label() {
    let fx = Fixture::new().await;
    let batch = fx.stored_batch("10", "10", "1").await;
    let batches_before = fx.store.batch_count().await;

    let err = fx
        .engine
        .split_batch(
            &fx.distributor,
            batch.id,
            SplitBatchInput {
                splits: vec![
                    SplitPortion::labelled("x".repeat(101), dec("4")),
                    SplitPortion::new(dec("6")),
                ],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation { ref field, .. } if field == "label"));
    assert_eq!(fx.store.batch_count().await, batches_before);
}

/// A storage failure after the first child is written leaves no trace
#[tokio::test]
async fn test_split_failure_mid_way_rolls_back_children() {
    let fx = Fixture::new().await;
    let batch = fx.stored_batch("90", "10", "1").await;
    let batches_before = fx.store.batch_count().await;
    let events_before = fx.store.event_count().await;

    let engine = LifecycleService::new(
        Arc::new(FailingInsertStore::new(fx.store.clone(), 2)),
        Arc::new(StaticArtifacts),
    );
    let err = engine
        .split_batch(
            &fx.distributor,
            batch.id,
            SplitBatchInput {
                splits: vec![
                    SplitPortion::new(dec("30")),
                    SplitPortion::new(dec("30")),
                    SplitPortion::new(dec("30")),
                ],
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Internal(_)));
    assert_eq!(fx.store.batch_count().await, batches_before);
    assert_eq!(fx.store.event_count().await, events_before);
    let parent = fx.engine.get_batch(batch.id).await.unwrap();
    assert_eq!(parent.status, BatchStatus::Stored);
    assert_eq!(parent.quantity, dec("90"));

    let retry = fx
        .engine
        .split_batch(
            &fx.distributor,
            batch.id,
            SplitBatchInput {
                splits: vec![SplitPortion::new(dec("45")), SplitPortion::new(dec("45"))],
            },
        )
        .await
        .unwrap();
    assert_eq!(retry.children.len(), 2);
}

/// A fully split parent is terminal
#[tokio::test]
async fn test_split_twice_is_terminal() {
    let fx = Fixture::new().await;
    let batch = fx.stored_batch("10", "10", "1").await;
    let input = || SplitBatchInput {
        splits: vec![SplitPortion::new(dec("5")), SplitPortion::new(dec("5"))],
    };
    fx.engine
        .split_batch(&fx.distributor, batch.id, input())
        .await
        .unwrap();

    let err = fx
        .engine
        .split_batch(&fx.distributor, batch.id, input())
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyTerminal(_)));
}

/// Split children can themselves travel on to a retailer
#[tokio::test]
async fn test_split_child_continues_lifecycle() {
    let fx = Fixture::new().await;
    let batch = fx.stored_batch("100", "10", "2").await;
    let outcome = fx
        .engine
        .split_batch(
            &fx.distributor,
            batch.id,
            SplitBatchInput {
                splits: vec![SplitPortion::new(dec("30")), SplitPortion::new(dec("70"))],
            },
        )
        .await
        .unwrap();

    let child = &outcome.children[0];
    let at_retailer = fx.batch_at_retailer(child.id, "1").await;
    assert_eq!(at_retailer.status, BatchStatus::DeliveredToRetailer);
    assert_eq!(at_retailer.current_owner, fx.retailer.user_id);
    assert_eq!(at_retailer.quantity, dec("30"));
}

// ============================================================================
// Suspension
// ============================================================================

/// The farmer may suspend a fresh batch; it is then terminal
#[tokio::test]
async fn test_farmer_suspends_created_batch() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;

    let suspended = fx
        .engine
        .suspend_batch(&fx.farmer, batch.id, Some("Pest damage".to_string()))
        .await
        .unwrap();
    assert_eq!(suspended.status, BatchStatus::Suspended);

    let history = fx.engine.batch_history(batch.id).await.unwrap();
    let event = &history[0];
    assert_eq!(event.event_type, BatchEventType::Suspended);
    assert_eq!(
        event.metadata.get("suspended_by_role").and_then(|v| v.as_str()),
        Some("farmer")
    );
    assert_eq!(
        event.metadata.get("previous_status").and_then(|v| v.as_str()),
        Some("CREATED")
    );

    let err = fx
        .engine
        .suspend_batch(&fx.farmer, batch.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AlreadyTerminal(_)));

    let err = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation { .. }));
}

/// Farmers lose suspend rights once the batch is in transit
#[tokio::test]
async fn test_farmer_cannot_suspend_in_transit() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;
    let request_id = fx
        .engine
        .request_transport(&fx.farmer, batch.id, fx.distributor.id)
        .await
        .unwrap()
        .transport
        .id;
    fx.engine
        .accept_transport(&fx.transporter, request_id, accept_with_fee("1"))
        .await
        .unwrap();

    let err = fx
        .engine
        .suspend_batch(&fx.farmer, batch.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
}

/// Distributor suspends a stored batch it owns; a stranger cannot
#[tokio::test]
async fn test_distributor_suspend_requires_ownership() {
    let fx = Fixture::new().await;
    let other = fx.register("other_dc", StakeholderRole::Distributor).await;
    let batch = fx.stored_batch("50", "10", "1").await;

    let err = fx
        .engine
        .suspend_batch(&other, batch.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    let suspended = fx
        .engine
        .suspend_batch(&fx.distributor, batch.id, None)
        .await
        .unwrap();
    assert_eq!(suspended.status, BatchStatus::Suspended);
}

/// Transporters hold no suspend rights at all
#[tokio::test]
async fn test_transporter_cannot_suspend() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;
    let err = fx
        .engine
        .suspend_batch(&fx.transporter, batch.id, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}

// ============================================================================
// Inspections
// ============================================================================

/// Inspections append an event without moving the batch
#[tokio::test]
async fn test_inspection_records_event_only() {
    let fx = Fixture::new().await;
    let batch = fx.stored_batch("50", "10", "1").await;

    let report = fx
        .engine
        .record_inspection(
            &fx.distributor,
            batch.id,
            InspectionInput {
                stage: InspectionStage::Distributor,
                result: InspectionResult::Fail,
                notes: "Moisture above threshold".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(report.inspector_id, fx.distributor.id);

    let after = fx.engine.get_batch(batch.id).await.unwrap();
    assert_eq!(after.status, BatchStatus::Stored);
    let history = fx.engine.batch_history(batch.id).await.unwrap();
    assert_eq!(history[0].event_type, InspectionResult::Fail.event_type());
}

/// Stage and role must agree
#[tokio::test]
async fn test_inspection_stage_role_mismatch() {
    let fx = Fixture::new().await;
    let batch = fx.create_batch("50", "10").await;

    let err = fx
        .engine
        .record_inspection(
            &fx.farmer,
            batch.id,
            InspectionInput {
                stage: InspectionStage::Retailer,
                result: InspectionResult::Pass,
                notes: String::new(),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
