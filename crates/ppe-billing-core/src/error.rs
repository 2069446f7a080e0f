//! Error types for PPE billing accounting.

use crate::event::{EventKind, EventKindError};

/// Result type for PPE billing operations.
pub type Result<T> = std::result::Result<T, BillingError>;

/// Errors that can occur in PPE billing accounting.
///
/// Note that `event_not_registered` and `charge_limit_reached` are *not*
/// errors: they are expected charge outcomes and are returned as data in
/// [`crate::ChargeResult`]. This enum covers programmer errors and boundary
/// validation only.
#[derive(Debug, thiserror::Error)]
pub enum BillingError {
    /// The event kind was never registered in the price table.
    #[error("event not registered: {event}")]
    EventNotRegistered {
        /// The unregistered event kind.
        event: EventKind,
    },

    /// The event-kind identifier failed validation.
    #[error("invalid event kind: {0}")]
    InvalidEventKind(#[from] EventKindError),
}
