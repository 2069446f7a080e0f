//! The charging manager: the single authorize-and-commit path.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error};

use ppe_billing_client::{PlatformClient, RunContext};
use ppe_billing_core::{
    BudgetState, ChargeResult, EventKind, LedgerEntry, RemainingBudget, Result as BillingResult,
    UnitsRemaining,
};

use crate::error::ManagerError;
use crate::ledger::{DatasetLedger, Ledger};
use crate::notifier::ChargeNotifier;

/// Orchestrates pay-per-event charging for one run.
///
/// Wraps the shared [`BudgetState`] behind a lock so that the
/// check-remaining → decide → increment sequence is mutually exclusive, and
/// coordinates the ledger and the charge notifier around it. The lock is
/// held only for that accounting step; all I/O happens after release.
pub struct ChargingManager {
    state: Mutex<BudgetState>,
    ledger: Arc<dyn Ledger>,
    notifier: ChargeNotifier,
}

impl std::fmt::Debug for ChargingManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChargingManager")
            .field("state", &self.state)
            .field("notifier", &self.notifier)
            .finish_non_exhaustive()
    }
}

impl ChargingManager {
    /// Build a manager directly from its parts.
    ///
    /// Used by tests and embedders that already have budget state; platform
    /// runs go through [`ChargingManager::initialize`].
    #[must_use]
    pub fn new(state: BudgetState, ledger: Arc<dyn Ledger>, notifier: ChargeNotifier) -> Self {
        Self {
            state: Mutex::new(state),
            ledger,
            notifier,
        }
    }

    /// Initialize a manager from the platform's current-run snapshot.
    ///
    /// Fetches the price table, prior charge counts, and budget ceiling;
    /// resolves the ledger's backing dataset (reusing a persisted one after
    /// a restart); and spawns the charge notifier unless this is a local
    /// run.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::Init`] if the snapshot fetch or ledger
    /// resolution fails. No partial instance is produced.
    pub async fn initialize(
        client: PlatformClient,
        ctx: &RunContext,
    ) -> Result<Self, ManagerError> {
        let snapshot = client.fetch_run(&ctx.run_id).await?;
        let state = BudgetState::new(
            snapshot.price_table(),
            snapshot.prior_counts(),
            snapshot.options.max_total_charge_usd,
        );

        debug!(
            registered_events = state.prices().len(),
            ceiling = ?state.ceiling(),
            "charging manager initialized"
        );

        let ledger = DatasetLedger::open(client.clone(), &ctx.default_store_id).await?;

        let notifier = if ctx.billed_run {
            ChargeNotifier::spawn(client, ctx.run_id.clone())
        } else {
            ChargeNotifier::disabled()
        };

        Ok(Self::new(state, Arc::new(ledger), notifier))
    }

    /// Budget left before the ceiling is reached.
    pub async fn remaining_charge_budget(&self) -> RemainingBudget {
        self.state.lock().await.remaining_budget()
    }

    /// How many more units of `event` can be charged.
    pub async fn units_remaining_for(&self, event: &EventKind) -> UnitsRemaining {
        self.state.lock().await.units_remaining_for(event)
    }

    /// Units of `event` charged so far.
    ///
    /// # Errors
    ///
    /// Returns an error if `event` was never registered, distinguishing
    /// "registered with zero charges" from "never registered".
    pub async fn charged_count_for(&self, event: &EventKind) -> BillingResult<u64> {
        self.state.lock().await.charged_count(event)
    }

    /// Authorize and commit a charge for up to `metadata.len()` units of
    /// `event`.
    ///
    /// Each metadata item represents one unit to charge; the batch is capped
    /// by the units still affordable under the budget ceiling, never
    /// charging more than requested and never overspending. Charged units
    /// are counted immediately, then reported to the billing endpoint and
    /// appended to the ledger (one timestamped entry per unit, carrying that
    /// unit's metadata) outside the lock.
    ///
    /// Unregistered events and an exhausted budget are expected outcomes,
    /// returned as data with no side effects.
    pub async fn charge(
        &self,
        event: &EventKind,
        metadata: Vec<serde_json::Value>,
    ) -> ChargeResult {
        let requested = u64::try_from(metadata.len()).unwrap_or(u64::MAX);

        let (charged, limit_reached, price) = {
            let mut state = self.state.lock().await;

            let Some(price) = state.price(event).cloned() else {
                return ChargeResult::not_registered();
            };

            let remaining = state.units_remaining_for(event);
            if remaining.is_zero() {
                return ChargeResult::limit_reached();
            }

            let charged = remaining.cap(requested);
            state.record_charge(event, charged);
            let limit_reached = state.units_remaining_for(event).is_zero();

            (charged, limit_reached, price)
        };

        if charged > 0 {
            self.notifier.notify(event.clone(), charged);

            let entries: Vec<LedgerEntry> = metadata
                .into_iter()
                .take(usize::try_from(charged).unwrap_or(usize::MAX))
                .map(|item| LedgerEntry::new(event.clone(), &price, item))
                .collect();

            if let Err(err) = self.ledger.append(entries).await {
                // The charge is committed; a missing audit record is a
                // reconciliation gap, not a reason to re-offer the units.
                error!(
                    event = %event,
                    count = charged,
                    error = %err,
                    "ledger append failed, charged units are missing audit entries"
                );
            }
        }

        debug!(
            event = %event,
            charged,
            limit_reached,
            "charge committed"
        );

        ChargeResult::charged(charged, limit_reached)
    }

    /// Wait for queued charge notifications to drain and shut down.
    ///
    /// Optional; dropping the manager also lets the notifier finish its
    /// queue in the background.
    pub async fn close(self) {
        self.notifier.close().await;
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use futures::future::join_all;

    use ppe_billing_client::ClientError;
    use ppe_billing_core::{ChargeOutcome, EventPrice, PriceTable, Usd};

    use super::*;
    use crate::ledger::{LedgerError, MemoryLedger};

    fn kind(s: &str) -> EventKind {
        EventKind::new(s).unwrap()
    }

    fn scrape_state(ceiling_cents: Option<i64>) -> BudgetState {
        let table: PriceTable = [(
            kind("scrape"),
            EventPrice {
                title: "Page scraped".into(),
                price: Usd::from_cents(10),
            },
        )]
        .into_iter()
        .collect();
        BudgetState::new(table, HashMap::new(), ceiling_cents.map(Usd::from_cents))
    }

    fn manager(ceiling_cents: Option<i64>) -> (ChargingManager, Arc<MemoryLedger>) {
        let ledger = Arc::new(MemoryLedger::new());
        let manager = ChargingManager::new(
            scrape_state(ceiling_cents),
            ledger.clone(),
            ChargeNotifier::disabled(),
        );
        (manager, ledger)
    }

    fn batch(n: usize) -> Vec<serde_json::Value> {
        (0..n).map(|i| serde_json::json!({ "slot": i })).collect()
    }

    #[tokio::test]
    async fn unregistered_event_is_free_and_side_effect_free() {
        let (manager, ledger) = manager(Some(100));

        let result = manager.charge(&kind("unknown"), batch(50)).await;

        assert_eq!(result, ChargeResult::not_registered());
        assert!(manager.charged_count_for(&kind("unknown")).await.is_err());
        assert_eq!(
            manager.remaining_charge_budget().await,
            RemainingBudget::Limited(Usd::from_cents(100))
        );
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn charges_full_batch_under_budget() {
        let (manager, ledger) = manager(Some(100));

        let result = manager.charge(&kind("scrape"), batch(3)).await;

        assert_eq!(result.charged_count, 3);
        assert_eq!(result.outcome, ChargeOutcome::ChargeSuccessful);
        assert!(!result.event_charge_limit_reached);
        assert_eq!(manager.charged_count_for(&kind("scrape")).await.unwrap(), 3);

        let entries = ledger.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].metadata["slot"], 0);
        assert_eq!(entries[2].metadata["slot"], 2);
        assert_eq!(entries[0].event_price_usd, Usd::from_cents(10));
    }

    #[tokio::test]
    async fn caps_batch_at_remaining_units() {
        // 1 unit of budget left, batch of 3.
        let (manager, ledger) = manager(Some(10));

        let result = manager.charge(&kind("scrape"), batch(3)).await;

        assert_eq!(result.charged_count, 1);
        assert_eq!(result.outcome, ChargeOutcome::ChargeSuccessful);
        assert!(result.event_charge_limit_reached);
        assert_eq!(ledger.entries().len(), 1);
        assert_eq!(ledger.entries()[0].metadata["slot"], 0);
    }

    #[tokio::test]
    async fn limit_reached_has_no_side_effects() {
        let (manager, ledger) = manager(Some(0));

        let result = manager.charge(&kind("scrape"), batch(1)).await;

        assert_eq!(result, ChargeResult::limit_reached());
        assert_eq!(manager.charged_count_for(&kind("scrape")).await.unwrap(), 0);
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn empty_batch_charges_nothing() {
        let (manager, ledger) = manager(Some(100));

        let result = manager.charge(&kind("scrape"), vec![]).await;

        assert_eq!(result.charged_count, 0);
        assert_eq!(result.outcome, ChargeOutcome::ChargeSuccessful);
        assert!(!result.event_charge_limit_reached);
        assert!(ledger.entries().is_empty());
    }

    #[tokio::test]
    async fn ten_cent_events_into_a_dollar() {
        let (manager, ledger) = manager(Some(100));

        for _ in 0..10 {
            let result = manager.charge(&kind("scrape"), batch(1)).await;
            assert_eq!(result.charged_count, 1);
        }

        let result = manager.charge(&kind("scrape"), batch(1)).await;
        assert_eq!(result, ChargeResult::limit_reached());

        assert_eq!(
            manager.remaining_charge_budget().await,
            RemainingBudget::Limited(Usd::ZERO)
        );
        assert_eq!(manager.charged_count_for(&kind("scrape")).await.unwrap(), 10);
        assert_eq!(ledger.entries().len(), 10);
    }

    #[tokio::test]
    async fn unbounded_budget_never_limits() {
        let (manager, _ledger) = manager(None);

        assert_eq!(
            manager.remaining_charge_budget().await,
            RemainingBudget::Unlimited
        );
        assert_eq!(
            manager.units_remaining_for(&kind("scrape")).await,
            UnitsRemaining::Unlimited
        );

        let result = manager.charge(&kind("scrape"), batch(1000)).await;
        assert_eq!(result.charged_count, 1000);
        assert!(!result.event_charge_limit_reached);
    }

    #[tokio::test]
    async fn conservation_of_charged_counts() {
        let (manager, ledger) = manager(Some(75));

        let mut total = 0;
        for n in [3, 4, 2, 5] {
            total += manager.charge(&kind("scrape"), batch(n)).await.charged_count;
        }

        assert_eq!(
            manager.charged_count_for(&kind("scrape")).await.unwrap(),
            total
        );
        assert_eq!(ledger.entries().len(), usize::try_from(total).unwrap());
        // 75 cents affords exactly 7 ten-cent units.
        assert_eq!(total, 7);
    }

    #[tokio::test]
    async fn concurrent_charges_never_overspend() {
        // Budget affords exactly 10 units; 25 concurrent callers request
        // one unit each.
        let (manager, ledger) = manager(Some(100));
        let manager = Arc::new(manager);

        let calls = (0..25).map(|_| {
            let manager = Arc::clone(&manager);
            async move { manager.charge(&kind("scrape"), batch(1)).await }
        });
        let results = join_all(calls).await;

        let total: u64 = results.iter().map(|r| r.charged_count).sum();
        assert_eq!(total, 10);
        assert_eq!(manager.charged_count_for(&kind("scrape")).await.unwrap(), 10);
        assert_eq!(ledger.entries().len(), 10);
        assert!(manager.remaining_charge_budget().await.is_exhausted());
    }

    struct FailingLedger;

    #[async_trait]
    impl Ledger for FailingLedger {
        async fn append(&self, _entries: Vec<LedgerEntry>) -> Result<(), LedgerError> {
            Err(LedgerError::Backend(ClientError::Configuration(
                "backing store unavailable".into(),
            )))
        }
    }

    #[tokio::test]
    async fn ledger_failure_does_not_reverse_the_charge() {
        let manager = ChargingManager::new(
            scrape_state(Some(100)),
            Arc::new(FailingLedger),
            ChargeNotifier::disabled(),
        );

        let result = manager.charge(&kind("scrape"), batch(2)).await;

        assert_eq!(result.charged_count, 2);
        assert_eq!(result.outcome, ChargeOutcome::ChargeSuccessful);
        // The budget invariant wins over ledger completeness.
        assert_eq!(manager.charged_count_for(&kind("scrape")).await.unwrap(), 2);
        assert_eq!(
            manager.remaining_charge_budget().await,
            RemainingBudget::Limited(Usd::from_cents(80))
        );
    }
}
