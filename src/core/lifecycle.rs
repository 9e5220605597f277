//! Listing lifecycle state machine.
//!
//! ```text
//!   active ──deactivate──▶ unavailable ──(grace expired) hard-delete──▶ ∅
//!     │  ▲                      │
//!     │  └──reactivate (in grace)┘
//!     │
//!     └──complete──▶ completed ──reactivate (sale items only)──▶ active
//! ```
//!
//! Everything here is a pure function of its inputs; `now` is always passed in.

use crate::domain::model::{
    ItemKind, ItemStatus, LifecycleAction, ListableItem, TransitionOutcome,
};
use crate::utils::error::LifecycleError;
use crate::utils::time::{whole_days_between, GRACE_PERIOD_DAYS};
use chrono::{DateTime, Utc};

/// Days left in the grace window, always within `[0, GRACE_PERIOD_DAYS]`.
pub fn days_remaining(deactivated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i64 {
    match deactivated_at {
        None => 0,
        Some(at) => (GRACE_PERIOD_DAYS - whole_days_between(at, now)).clamp(0, GRACE_PERIOD_DAYS),
    }
}

/// The grace window is half-open: exactly five days after deactivation it is closed.
pub fn can_reactivate(deactivated_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
    days_remaining(deactivated_at, now) > 0
}

pub fn transition(
    item: &ListableItem,
    action: LifecycleAction,
    now: DateTime<Utc>,
) -> Result<TransitionOutcome, LifecycleError> {
    let invalid = || LifecycleError::InvalidTransition {
        from: item.status,
        action,
    };

    match (item.status, action) {
        (ItemStatus::Active, LifecycleAction::Deactivate) => Ok(TransitionOutcome::Updated(
            with_status(item, ItemStatus::Unavailable, Some(now), now),
        )),
        (ItemStatus::Active, LifecycleAction::Complete) => Ok(TransitionOutcome::Updated(
            with_status(item, ItemStatus::Completed, None, now),
        )),
        (ItemStatus::Unavailable, LifecycleAction::Reactivate) => {
            if !can_reactivate(item.deactivated_at, now) {
                return Err(LifecycleError::GracePeriodExpired);
            }
            Ok(TransitionOutcome::Updated(with_status(
                item,
                ItemStatus::Active,
                None,
                now,
            )))
        }
        (ItemStatus::Unavailable, LifecycleAction::HardDelete) => {
            if can_reactivate(item.deactivated_at, now) {
                return Err(LifecycleError::GracePeriodStillActive);
            }
            Ok(TransitionOutcome::Delete(item.id.clone()))
        }
        // Sold items may be relisted; rented listings may not.
        (ItemStatus::Completed, LifecycleAction::Reactivate) if item.kind == ItemKind::SaleItem => {
            Ok(TransitionOutcome::Updated(with_status(
                item,
                ItemStatus::Active,
                None,
                now,
            )))
        }
        _ => Err(invalid()),
    }
}

/// Ids of unavailable items whose grace window has closed, in input order.
pub fn sweep_expired(items: &[ListableItem], now: DateTime<Utc>) -> Vec<String> {
    items
        .iter()
        .filter(|item| is_expired(item, now))
        .map(|item| item.id.clone())
        .collect()
}

pub fn is_expired(item: &ListableItem, now: DateTime<Utc>) -> bool {
    item.status == ItemStatus::Unavailable && !can_reactivate(item.deactivated_at, now)
}

fn with_status(
    item: &ListableItem,
    status: ItemStatus,
    deactivated_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ListableItem {
    ListableItem {
        status,
        deactivated_at,
        updated_at: now,
        ..item.clone()
    }
}
