//! Manager error types.

use ppe_billing_client::ClientError;
use ppe_billing_core::BillingError;

/// Errors surfaced by the charging manager.
///
/// Charge outcomes (`event_not_registered`, `charge_limit_reached`) are data
/// in [`ppe_billing_core::ChargeResult`], not errors. This enum covers
/// initialization failure and programmer errors only.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Initialization failed: the run snapshot could not be fetched or the
    /// ledger's backing dataset could not be resolved. Propagated to every
    /// caller waiting on the shared instance; no instance is produced.
    #[error("initialization failed: {0}")]
    Init(#[from] ClientError),

    /// Accounting error, e.g. querying the charged count of an event kind
    /// that was never registered.
    #[error(transparent)]
    Billing(#[from] BillingError),
}
