//! Batch status transition table
//!
//! A coarse, role-gated map of which status changes a role may drive. The
//! lifecycle engine consults it alongside its own per-operation checks; the
//! finer transport sub-states (arrival and confirmation) are not listed here
//! and are gated by the transport operations directly.

use thiserror::Error;

use crate::models::{BatchStatus, StakeholderRole};

type Entry = ((BatchStatus, StakeholderRole), &'static [BatchStatus]);

/// `(current status, role) -> permitted next statuses`
pub const TRANSITION_TABLE: &[Entry] = &[
    (
        (BatchStatus::Created, StakeholderRole::Farmer),
        &[BatchStatus::TransportRequested],
    ),
    (
        (BatchStatus::TransportRequested, StakeholderRole::Transporter),
        &[BatchStatus::InTransitToDistributor],
    ),
    (
        (BatchStatus::InTransitToDistributor, StakeholderRole::Transporter),
        &[BatchStatus::DeliveredToDistributor],
    ),
    (
        (BatchStatus::DeliveredToDistributor, StakeholderRole::Distributor),
        &[BatchStatus::Stored],
    ),
    (
        (BatchStatus::Stored, StakeholderRole::Distributor),
        &[BatchStatus::TransportRequestedToRetailer],
    ),
    (
        (BatchStatus::TransportRequestedToRetailer, StakeholderRole::Transporter),
        &[BatchStatus::InTransitToRetailer],
    ),
    (
        (BatchStatus::InTransitToRetailer, StakeholderRole::Transporter),
        &[BatchStatus::DeliveredToRetailer],
    ),
    (
        (BatchStatus::DeliveredToRetailer, StakeholderRole::Retailer),
        &[BatchStatus::Listed],
    ),
    (
        (BatchStatus::Listed, StakeholderRole::Retailer),
        &[BatchStatus::Sold],
    ),
];

/// Why a transition was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("No transitions allowed from status {0}")]
    NoTransitionsFrom(BatchStatus),

    #[error("Role {role} cannot transition batch from status {from}")]
    RoleCannotTransition {
        from: BatchStatus,
        role: StakeholderRole,
    },

    #[error("Cannot transition from {from} to {to} as {role}")]
    NotAllowed {
        from: BatchStatus,
        to: BatchStatus,
        role: StakeholderRole,
    },
}

/// Decide whether `role` may move a batch from `current` to `proposed`
pub fn can_transition(
    current: BatchStatus,
    role: StakeholderRole,
    proposed: BatchStatus,
) -> Result<(), TransitionError> {
    if !TRANSITION_TABLE.iter().any(|((from, _), _)| *from == current) {
        return Err(TransitionError::NoTransitionsFrom(current));
    }

    let allowed = TRANSITION_TABLE
        .iter()
        .find(|(key, _)| *key == (current, role))
        .map(|(_, targets)| *targets)
        .ok_or(TransitionError::RoleCannotTransition {
            from: current,
            role,
        })?;

    if allowed.contains(&proposed) {
        Ok(())
    } else {
        Err(TransitionError::NotAllowed {
            from: current,
            to: proposed,
            role,
        })
    }
}

/// Statuses `role` may move a batch to from `current`; empty when none
pub fn allowed_transitions(current: BatchStatus, role: StakeholderRole) -> &'static [BatchStatus] {
    TRANSITION_TABLE
        .iter()
        .find(|(key, _)| *key == (current, role))
        .map(|(_, targets)| *targets)
        .unwrap_or(&[])
}

/// Statuses from which each role may suspend a batch
pub const SUSPEND_ALLOWED: &[(StakeholderRole, &[BatchStatus])] = &[
    (
        StakeholderRole::Farmer,
        &[
            BatchStatus::Created,
            BatchStatus::TransportRequested,
            BatchStatus::TransportRejected,
        ],
    ),
    (
        StakeholderRole::Distributor,
        &[BatchStatus::DeliveredToDistributor, BatchStatus::Stored],
    ),
    (StakeholderRole::Retailer, &[BatchStatus::Listed]),
];

/// Statuses `role` may suspend from; empty when the role cannot suspend
pub fn suspendable_statuses(role: StakeholderRole) -> &'static [BatchStatus] {
    SUSPEND_ALLOWED
        .iter()
        .find(|(r, _)| *r == role)
        .map(|(_, statuses)| *statuses)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_path_is_allowed() {
        let steps = [
            (BatchStatus::Created, StakeholderRole::Farmer, BatchStatus::TransportRequested),
            (
                BatchStatus::TransportRequested,
                StakeholderRole::Transporter,
                BatchStatus::InTransitToDistributor,
            ),
            (
                BatchStatus::DeliveredToDistributor,
                StakeholderRole::Distributor,
                BatchStatus::Stored,
            ),
            (
                BatchStatus::Stored,
                StakeholderRole::Distributor,
                BatchStatus::TransportRequestedToRetailer,
            ),
            (
                BatchStatus::DeliveredToRetailer,
                StakeholderRole::Retailer,
                BatchStatus::Listed,
            ),
            (BatchStatus::Listed, StakeholderRole::Retailer, BatchStatus::Sold),
        ];

        for (from, role, to) in steps {
            assert_eq!(can_transition(from, role, to), Ok(()), "{from} -> {to} as {role}");
        }
    }

    #[test]
    fn status_without_entry_is_rejected() {
        let err = can_transition(
            BatchStatus::Suspended,
            StakeholderRole::Farmer,
            BatchStatus::Created,
        )
        .unwrap_err();
        assert_eq!(err, TransitionError::NoTransitionsFrom(BatchStatus::Suspended));
        assert_eq!(err.to_string(), "No transitions allowed from status SUSPENDED");
    }

    #[test]
    fn wrong_role_is_rejected() {
        let err = can_transition(
            BatchStatus::Created,
            StakeholderRole::Distributor,
            BatchStatus::TransportRequested,
        )
        .unwrap_err();
        assert!(matches!(err, TransitionError::RoleCannotTransition { .. }));
    }

    #[test]
    fn wrong_target_is_rejected() {
        let err = can_transition(
            BatchStatus::Created,
            StakeholderRole::Farmer,
            BatchStatus::Stored,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Cannot transition from CREATED to STORED as farmer"
        );
    }

    #[test]
    fn transport_sub_states_are_not_in_table() {
        for status in [
            BatchStatus::ArrivedAtDistributor,
            BatchStatus::ArrivalConfirmedByDistributor,
            BatchStatus::ArrivedAtRetailer,
            BatchStatus::ArrivalConfirmedByRetailer,
        ] {
            assert!(matches!(
                can_transition(status, StakeholderRole::Transporter, BatchStatus::Sold),
                Err(TransitionError::NoTransitionsFrom(_))
            ));
        }
    }

    #[test]
    fn allowed_transitions_lookup() {
        assert_eq!(
            allowed_transitions(BatchStatus::Stored, StakeholderRole::Distributor),
            &[BatchStatus::TransportRequestedToRetailer]
        );
        assert!(allowed_transitions(BatchStatus::Stored, StakeholderRole::Farmer).is_empty());
        assert!(allowed_transitions(BatchStatus::Sold, StakeholderRole::Retailer).is_empty());
    }

    #[test]
    fn table_keys_are_unique() {
        for (i, (key, _)) in TRANSITION_TABLE.iter().enumerate() {
            assert!(TRANSITION_TABLE[i + 1..].iter().all(|(other, _)| other != key));
        }
    }

    #[test]
    fn suspend_allow_list() {
        assert!(suspendable_statuses(StakeholderRole::Farmer).contains(&BatchStatus::TransportRejected));
        assert!(suspendable_statuses(StakeholderRole::Distributor).contains(&BatchStatus::Stored));
        assert_eq!(suspendable_statuses(StakeholderRole::Retailer), &[BatchStatus::Listed]);
        assert!(suspendable_statuses(StakeholderRole::Transporter).is_empty());
        assert!(suspendable_statuses(StakeholderRole::Consumer).is_empty());
    }
}
