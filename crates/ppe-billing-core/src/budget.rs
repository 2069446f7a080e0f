//! Budget state: pure charge accounting against an optional ceiling.

use std::collections::HashMap;

use crate::error::{BillingError, Result};
use crate::event::{EventKind, EventPrice, PriceTable};
use crate::money::Usd;

/// Budget remaining before the ceiling is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemainingBudget {
    /// No ceiling is configured; spend is unbounded.
    Unlimited,

    /// This much budget is left (floored at zero).
    Limited(Usd),
}

impl RemainingBudget {
    /// Whether no further spend fits under the ceiling.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Limited(left) if left.is_zero())
    }
}

/// How many units of one event kind can still be charged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitsRemaining {
    /// Unlimited: the kind is unregistered, priced at zero, or no ceiling
    /// is configured.
    Unlimited,

    /// At most this many units fit under the remaining budget.
    Units(u64),
}

impl UnitsRemaining {
    /// Whether not a single unit can be charged.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        matches!(self, Self::Units(0))
    }

    /// Cap a requested unit count by the remaining allowance.
    #[must_use]
    pub const fn cap(&self, requested: u64) -> u64 {
        match self {
            Self::Unlimited => requested,
            Self::Units(n) => {
                if requested < *n {
                    requested
                } else {
                    *n
                }
            }
        }
    }
}

/// In-memory charge accounting for one run.
///
/// Holds the immutable price table, the per-kind charge counters, and the
/// optional budget ceiling. Pure accounting only — no I/O. Counters are
/// monotonically increasing and their key set always equals the price
/// table's key set.
///
/// `BudgetState` itself is not synchronized; the charging manager serializes
/// its check-then-increment sequence behind a lock.
#[derive(Debug, Clone)]
pub struct BudgetState {
    prices: PriceTable,
    counts: HashMap<EventKind, u64>,
    ceiling: Option<Usd>,
}

impl BudgetState {
    /// Create budget state from a price table, previously charged counts
    /// (e.g. restored from a run snapshot after a restart), and an optional
    /// ceiling.
    ///
    /// Counts for kinds missing from the price table are dropped; registered
    /// kinds without a prior count start at zero.
    #[must_use]
    pub fn new(prices: PriceTable, prior_counts: HashMap<EventKind, u64>, ceiling: Option<Usd>) -> Self {
        let counts = prices
            .iter()
            .map(|(kind, _)| {
                let count = prior_counts.get(kind).copied().unwrap_or(0);
                (kind.clone(), count)
            })
            .collect();

        Self {
            prices,
            counts,
            ceiling,
        }
    }

    /// The immutable price table.
    #[must_use]
    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// The configured ceiling, if any.
    #[must_use]
    pub fn ceiling(&self) -> Option<Usd> {
        self.ceiling
    }

    /// Price configuration for an event kind, if registered.
    #[must_use]
    pub fn price(&self, event: &EventKind) -> Option<&EventPrice> {
        self.prices.get(event)
    }

    /// Total spend so far: `Σ count[e] * price[e]`.
    #[must_use]
    pub fn total_spent(&self) -> Usd {
        self.prices
            .iter()
            .map(|(kind, cfg)| {
                let count = self.counts.get(kind).copied().unwrap_or(0);
                cfg.price.saturating_mul_units(count)
            })
            .sum()
    }

    /// Budget left before the ceiling, floored at zero.
    #[must_use]
    pub fn remaining_budget(&self) -> RemainingBudget {
        match self.ceiling {
            None => RemainingBudget::Unlimited,
            Some(ceiling) => {
                let left = ceiling.saturating_sub(self.total_spent());
                RemainingBudget::Limited(left.max(Usd::ZERO))
            }
        }
    }

    /// How many more units of `event` fit under the remaining budget.
    ///
    /// Unregistered kinds are always free and never limited. Zero-priced
    /// kinds never consume budget either.
    #[must_use]
    pub fn units_remaining_for(&self, event: &EventKind) -> UnitsRemaining {
        let Some(cfg) = self.prices.get(event) else {
            return UnitsRemaining::Unlimited;
        };
        match self.remaining_budget() {
            RemainingBudget::Unlimited => UnitsRemaining::Unlimited,
            RemainingBudget::Limited(left) => match left.units_affordable(cfg.price) {
                None => UnitsRemaining::Unlimited,
                Some(units) => UnitsRemaining::Units(units),
            },
        }
    }

    /// Record that `units` of `event` were charged.
    ///
    /// The caller is responsible for having checked, under the same critical
    /// section, that the post-increment spend still fits under the ceiling.
    ///
    /// # Panics
    ///
    /// Panics if `event` is not registered. The charging manager rules this
    /// out by checking registration under the same lock.
    pub fn record_charge(&mut self, event: &EventKind, units: u64) {
        let count = self
            .counts
            .get_mut(event)
            .expect("charge recorded for unregistered event kind");
        *count += units;
    }

    /// Units of `event` charged so far.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::EventNotRegistered`] for unknown kinds, so a
    /// zero count is distinguishable from a kind that was never registered.
    pub fn charged_count(&self, event: &EventKind) -> Result<u64> {
        self.counts
            .get(event)
            .copied()
            .ok_or_else(|| BillingError::EventNotRegistered {
                event: event.clone(),
            })
    }
}
