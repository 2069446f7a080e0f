//! Core types and accounting logic for pay-per-event (PPE) billing.
//!
//! This crate provides the pure, I/O-free foundation of the PPE billing
//! stack:
//!
//! - **Money**: [`Usd`], a fixed-point USD amount
//! - **Events**: [`EventKind`], [`EventPrice`], [`PriceTable`]
//! - **Accounting**: [`BudgetState`], [`RemainingBudget`], [`UnitsRemaining`]
//! - **Charges**: [`ChargeResult`], [`ChargeOutcome`], [`LedgerEntry`]
//!
//! # Money representation
//!
//! **All amounts are stored as `i64` micro-dollars (1 USD = 1,000,000).**
//!
//! - An event priced at $0.10 is stored as `100_000`
//! - A $1.00 budget ceiling is stored as `1_000_000`
//! - Remaining-budget math and the per-event unit cap use exact integer
//!   arithmetic, so no rounding ever has to compensate for float drift

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod budget;
pub mod charge;
pub mod error;
pub mod event;
pub mod money;

pub use budget::{BudgetState, RemainingBudget, UnitsRemaining};
pub use charge::{ChargeOutcome, ChargeResult, LedgerEntry};
pub use error::{BillingError, Result};
pub use event::{EventKind, EventKindError, EventPrice, PriceTable};
pub use money::Usd;
