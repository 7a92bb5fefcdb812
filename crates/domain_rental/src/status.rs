//! Contract status resolution
//!
//! ```text
//!   active ──(time passes, no return)──▶ overdue
//!     │                                     │
//!     └────(return)──▶ completed ◀──(return)┘
//! ```
//!
//! `completed` is terminal. A recorded return always resolves to it.

use chrono::{DateTime, Utc};

use core_kernel::RentalPeriod;

use crate::contract::{ContractStatus, StatusMarker};

/// Derives the effective lifecycle state of a contract at `now`
///
/// A return timestamp wins over everything. Otherwise an explicit stored
/// status is returned unchanged. Otherwise the contract is `active` up to and
/// including its end instant and `overdue` after it.
pub fn resolve_status(
    marker: StatusMarker,
    period: &RentalPeriod,
    returned_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> ContractStatus {
    if returned_at.is_some() {
        return ContractStatus::Completed;
    }
    match marker {
        StatusMarker::Explicit(status) => status,
        StatusMarker::Derive if now <= period.end() => ContractStatus::Active,
        StatusMarker::Derive => ContractStatus::Overdue,
    }
}
