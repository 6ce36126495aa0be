//! The order status state machine.
//!
//! The legal edge set is a static adjacency table rather than a chain of conditionals, so it can be inspected and
//! tested on its own. Statuses only move forward; `Delivered` and `Cancelled` have no outgoing edges.

use chrono::{DateTime, Duration, Utc};

use crate::db_types::OrderStatusType::{self, *};

/// The legal transition table. An edge `(from, to)` is legal iff `to` appears in the row for `from`.
pub const TRANSITIONS: &[(OrderStatusType, &[OrderStatusType])] = &[
    (Pending, &[Confirmed, Cancelled]),
    (Confirmed, &[Preparing, Cancelled]),
    (Preparing, &[ReadyForPickup, OutForDelivery]),
    (ReadyForPickup, &[OutForDelivery, Delivered]),
    (OutForDelivery, &[Delivered]),
    (Delivered, &[]),
    (Cancelled, &[]),
];

/// The statuses reachable from `from` in a single step.
pub fn next_states(from: OrderStatusType) -> &'static [OrderStatusType] {
    TRANSITIONS.iter().find(|(s, _)| *s == from).map(|(_, next)| *next).unwrap_or(&[])
}

pub fn is_valid_transition(from: OrderStatusType, to: OrderStatusType) -> bool {
    next_states(from).contains(&to)
}

pub fn is_terminal(status: OrderStatusType) -> bool {
    next_states(status).is_empty()
}

/// Cancellation is a strict subset of the general table: customers may only cancel orders the kitchen has not
/// started on.
pub fn can_cancel(status: OrderStatusType) -> bool {
    matches!(status, Pending | Confirmed)
}

/// The delivery estimate stamped when an order enters `status` at `now`. Statuses without an estimate rule leave the
/// existing estimate untouched.
pub fn estimated_delivery_for(status: OrderStatusType, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match status {
        Pending => Some(now + Duration::minutes(45)),
        Preparing => Some(now + Duration::minutes(30)),
        OutForDelivery => Some(now + Duration::minutes(15)),
        _ => None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ALL: [OrderStatusType; 7] =
        [Pending, Confirmed, Preparing, ReadyForPickup, OutForDelivery, Delivered, Cancelled];

    #[test]
    fn legal_edges_match_the_table() {
        assert!(is_valid_transition(Pending, Confirmed));
        assert!(is_valid_transition(Pending, Cancelled));
        assert!(is_valid_transition(Confirmed, Preparing));
        assert!(is_valid_transition(Confirmed, Cancelled));
        assert!(is_valid_transition(Preparing, ReadyForPickup));
        assert!(is_valid_transition(Preparing, OutForDelivery));
        assert!(is_valid_transition(ReadyForPickup, OutForDelivery));
        assert!(is_valid_transition(ReadyForPickup, Delivered));
        assert!(is_valid_transition(OutForDelivery, Delivered));
    }

    #[test]
    fn exactly_nine_edges_exist() {
        let mut legal = 0;
        for from in ALL {
            for to in ALL {
                if is_valid_transition(from, to) {
                    legal += 1;
                }
            }
        }
        assert_eq!(legal, 9);
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for to in ALL {
            assert!(!is_valid_transition(Delivered, to), "DELIVERED -> {to} must be illegal");
            assert!(!is_valid_transition(Cancelled, to), "CANCELLED -> {to} must be illegal");
        }
        assert!(is_terminal(Delivered));
        assert!(is_terminal(Cancelled));
        assert!(!is_terminal(Pending));
    }

    #[test]
    fn no_backward_or_self_edges() {
        for s in ALL {
            assert!(!is_valid_transition(s, s), "{s} -> {s} must be illegal");
        }
        assert!(!is_valid_transition(Confirmed, Pending));
        assert!(!is_valid_transition(Delivered, OutForDelivery));
    }

    #[test]
    fn cancellation_is_limited_to_early_statuses() {
        assert!(can_cancel(Pending));
        assert!(can_cancel(Confirmed));
        for s in [Preparing, ReadyForPickup, OutForDelivery, Delivered, Cancelled] {
            assert!(!can_cancel(s), "{s} must not be cancellable");
        }
    }

    #[test]
    fn delivery_estimates_follow_the_status() {
        let now = Utc::now();
        assert_eq!(estimated_delivery_for(Pending, now), Some(now + Duration::minutes(45)));
        assert_eq!(estimated_delivery_for(Preparing, now), Some(now + Duration::minutes(30)));
        assert_eq!(estimated_delivery_for(OutForDelivery, now), Some(now + Duration::minutes(15)));
        assert_eq!(estimated_delivery_for(Confirmed, now), None);
        assert_eq!(estimated_delivery_for(Delivered, now), None);
    }
}
