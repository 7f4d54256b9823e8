//! Order state machine.
//!
//! ```text
//! Pending ──► Preparing ──► Ready ──► PickedUp
//!    │            │           │
//!    └────────────┴───────────┴──► Cancelled
//! ```

use chrono::{DateTime, Utc};
use common::OrderStatus;
use store::Order;

use crate::error::{DomainError, Result};

/// Legal transitions, keyed by current status.
pub const TRANSITIONS: &[(OrderStatus, &[OrderStatus])] = &[
    (
        OrderStatus::Pending,
        &[OrderStatus::Preparing, OrderStatus::Cancelled],
    ),
    (
        OrderStatus::Preparing,
        &[OrderStatus::Ready, OrderStatus::Cancelled],
    ),
    (
        OrderStatus::Ready,
        &[OrderStatus::PickedUp, OrderStatus::Cancelled],
    ),
    (OrderStatus::PickedUp, &[]),
    (OrderStatus::Cancelled, &[]),
];

/// Statuses from which a requester may cancel an order directly.
const CANCELLABLE: &[OrderStatus] = &[OrderStatus::Pending, OrderStatus::Preparing];

/// Returns the statuses reachable in one step from `from`.
pub fn allowed_transitions(from: OrderStatus) -> &'static [OrderStatus] {
    TRANSITIONS
        .iter()
        .find(|(status, _)| *status == from)
        .map(|(_, next)| *next)
        .unwrap_or(&[])
}

/// Returns true if `from -> to` is in the transition table.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

/// Returns true if the cancel operation accepts an order in `status`.
pub fn is_cancellable(status: OrderStatus) -> bool {
    CANCELLABLE.contains(&status)
}

/// Moves `order` to `to`, stamping the milestone timestamp for `ready` and
/// `picked_up`. Leaves the order untouched on an illegal transition.
pub fn transition(order: &mut Order, to: OrderStatus, at: DateTime<Utc>) -> Result<()> {
    if !can_transition(order.status, to) {
        return Err(DomainError::InvalidTransition {
            from: order.status,
            to,
        });
    }

    match to {
        OrderStatus::Ready => order.ready_at = Some(at),
        OrderStatus::PickedUp => order.picked_up_at = Some(at),
        _ => {}
    }
    order.status = to;
    order.updated_at = at;

    Ok(())
}
