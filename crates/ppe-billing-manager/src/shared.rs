//! Process-wide shared charging manager.
//!
//! A run gets exactly one charging manager, lazily built from the
//! platform's run snapshot. [`shared`]
//! realizes that with a [`tokio::sync::OnceCell`]: the first caller runs
//! the network-bound initialization exactly once, every concurrent caller
//! waits on the cell (no polling), and an initialization failure is
//! returned to the waiters while leaving the cell empty so the process can
//! retry from scratch.
//!
//! Prefer constructing a [`ChargingManager`] explicitly and passing the
//! handle around; these free functions are the convenience path for callers
//! that cannot thread one through.

use tokio::sync::OnceCell;

use ppe_billing_client::{PlatformClient, RunContext};
use ppe_billing_core::{ChargeResult, EventKind, RemainingBudget, UnitsRemaining};

use crate::error::ManagerError;
use crate::manager::ChargingManager;

static SHARED: OnceCell<ChargingManager> = OnceCell::const_new();

/// Resolve the process-wide charging manager, initializing it on first use
/// from the environment-provided run context.
///
/// # Errors
///
/// Returns [`ManagerError::Init`] if the run context is incomplete or the
/// snapshot fetch fails; the error reaches every waiting caller and no
/// instance is stored.
pub async fn shared() -> Result<&'static ChargingManager, ManagerError> {
    SHARED
        .get_or_try_init(|| async {
            let ctx = RunContext::from_env()?;
            let client = PlatformClient::new(&ctx.api_base_url, &ctx.token);
            ChargingManager::initialize(client, &ctx).await
        })
        .await
}

/// Charge for up to `metadata.len()` units of `event` on the shared
/// manager. See [`ChargingManager::charge`].
///
/// # Errors
///
/// Returns an error only if the shared manager cannot be initialized;
/// charge outcomes are data in the returned [`ChargeResult`].
pub async fn charge(
    event: &EventKind,
    metadata: Vec<serde_json::Value>,
) -> Result<ChargeResult, ManagerError> {
    Ok(shared().await?.charge(event, metadata).await)
}

/// Remaining budget on the shared manager.
///
/// # Errors
///
/// Returns an error only if the shared manager cannot be initialized.
pub async fn remaining_charge_budget() -> Result<RemainingBudget, ManagerError> {
    Ok(shared().await?.remaining_charge_budget().await)
}

/// Units of `event` still chargeable on the shared manager.
///
/// # Errors
///
/// Returns an error only if the shared manager cannot be initialized.
pub async fn units_remaining_for(event: &EventKind) -> Result<UnitsRemaining, ManagerError> {
    Ok(shared().await?.units_remaining_for(event).await)
}

/// Units of `event` charged so far on the shared manager.
///
/// # Errors
///
/// Returns an error if the shared manager cannot be initialized or if
/// `event` was never registered.
pub async fn charged_count_for(event: &EventKind) -> Result<u64, ManagerError> {
    Ok(shared().await?.charged_count_for(event).await?)
}
