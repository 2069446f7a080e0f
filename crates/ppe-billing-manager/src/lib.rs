//! Charging manager for pay-per-event billing.
//!
//! This crate orchestrates the PPE billing stack: it authorizes charges
//! against the in-memory budget state, records every charged unit in an
//! append-only ledger, and hands billing notifications to a background
//! worker that reports them to the platform with bounded retry.
//!
//! # Guarantees
//!
//! - The budget ceiling is never exceeded: the check-then-increment
//!   sequence runs under one lock, so concurrent callers cannot jointly
//!   overspend.
//! - Local counters are the source of truth. A failed remote notification
//!   or ledger append is logged and never rolls a committed charge back.
//! - A slow or unreachable billing endpoint never stalls a
//!   [`ChargingManager::charge`] call: notifications leave through a
//!   channel after the lock is released.
//!
//! # Example
//!
//! ```no_run
//! use ppe_billing_core::EventKind;
//!
//! # async fn example() -> Result<(), ppe_billing_manager::ManagerError> {
//! // Resolves the process-wide manager on first use.
//! let event = EventKind::new("extract-default").expect("valid kind");
//! let result = ppe_billing_manager::charge(&event, vec![serde_json::json!({})]).await?;
//! println!("charged {} units", result.charged_count);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod error;
mod ledger;
mod manager;
mod notifier;
mod shared;

pub use error::ManagerError;
pub use ledger::{DatasetLedger, Ledger, LedgerError, MemoryLedger, LEDGER_DATASET_RECORD_KEY};
pub use manager::ChargingManager;
pub use notifier::ChargeNotifier;
pub use shared::{charge, charged_count_for, remaining_charge_budget, shared, units_remaining_for};
