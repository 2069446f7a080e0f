//! Charge results and ledger entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::event::{EventKind, EventPrice};
use crate::money::Usd;

/// Outcome of a charge attempt.
///
/// All three variants are expected results of a charge call and are returned
/// as data, never raised as errors. Callers branch on this field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChargeOutcome {
    /// The event kind is not in the price table; nothing was charged and
    /// nothing ever will be (unregistered events are free).
    EventNotRegistered,

    /// The budget ceiling left no room for even one unit; nothing was
    /// charged.
    ChargeLimitReached,

    /// One or more units were charged.
    ChargeSuccessful,
}

/// Result of a charge attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeResult {
    /// How many units were actually charged (0 ≤ charged ≤ requested).
    pub charged_count: u64,

    /// What happened.
    pub outcome: ChargeOutcome,

    /// Whether the budget for this event kind is exhausted after this call.
    pub event_charge_limit_reached: bool,
}

impl ChargeResult {
    /// The event kind is unregistered; no side effects occurred.
    #[must_use]
    pub const fn not_registered() -> Self {
        Self {
            charged_count: 0,
            outcome: ChargeOutcome::EventNotRegistered,
            event_charge_limit_reached: false,
        }
    }

    /// The limit was already reached; no side effects occurred.
    #[must_use]
    pub const fn limit_reached() -> Self {
        Self {
            charged_count: 0,
            outcome: ChargeOutcome::ChargeLimitReached,
            event_charge_limit_reached: true,
        }
    }

    /// `charged_count` units were charged successfully.
    #[must_use]
    pub const fn charged(charged_count: u64, limit_reached: bool) -> Self {
        Self {
            charged_count,
            outcome: ChargeOutcome::ChargeSuccessful,
            event_charge_limit_reached: limit_reached,
        }
    }
}

/// One immutable audit record per charged unit.
///
/// Serialized in the platform's camelCase wire form when appended to the
/// backing dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// The charged event kind.
    pub event_kind: EventKind,

    /// Human-readable event title at charge time.
    pub event_title: String,

    /// Unit price at charge time.
    pub event_price_usd: Usd,

    /// When the unit was charged.
    pub timestamp: DateTime<Utc>,

    /// Caller-supplied opaque metadata for this unit.
    pub metadata: serde_json::Value,
}

impl LedgerEntry {
    /// Build an entry for one charged unit, timestamped now.
    #[must_use]
    pub fn new(event: EventKind, price: &EventPrice, metadata: serde_json::Value) -> Self {
        Self {
            event_kind: event,
            event_title: price.title.clone(),
            event_price_usd: price.price,
            timestamp: Utc::now(),
            metadata,
        }
    }
}
