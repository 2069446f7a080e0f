//! Wire types for the platform API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use ppe_billing_core::{EventKind, EventPrice, PriceTable, Usd};

/// Snapshot of the current run, fetched once at initialization.
///
/// `pricing_info` and `charged_event_counts` are both absent when the run
/// is not billed per event; the billing stack then treats every event as
/// unregistered and free.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    /// Per-event pricing, present only for pay-per-event runs.
    #[serde(default)]
    pub pricing_info: Option<PricingInfo>,

    /// Units already charged per event kind, from before a restart or
    /// migration.
    #[serde(default)]
    pub charged_event_counts: Option<HashMap<EventKind, u64>>,

    /// Run options.
    #[serde(default)]
    pub options: RunOptions,
}

impl RunSnapshot {
    /// Build the immutable price table from the snapshot's pricing info.
    #[must_use]
    pub fn price_table(&self) -> PriceTable {
        let Some(pricing) = &self.pricing_info else {
            return PriceTable::empty();
        };
        pricing
            .pricing_per_event
            .actor_charge_events
            .iter()
            .map(|(kind, cfg)| {
                (
                    kind.clone(),
                    EventPrice {
                        title: cfg.event_title.clone(),
                        price: cfg.event_price_usd,
                    },
                )
            })
            .collect()
    }

    /// Prior charge counts, defaulting to empty.
    #[must_use]
    pub fn prior_counts(&self) -> HashMap<EventKind, u64> {
        self.charged_event_counts.clone().unwrap_or_default()
    }
}

/// Pricing section of the run snapshot.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingInfo {
    /// Pricing model marker, `"PAY_PER_EVENT"` for PPE runs.
    pub pricing_model: String,

    /// Per-event price configuration.
    pub pricing_per_event: PricingPerEvent,
}

/// Container for the registered charge events.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingPerEvent {
    /// Registered billable events, keyed by event kind.
    pub actor_charge_events: HashMap<EventKind, ChargeEventConfig>,
}

/// Price configuration of one registered event, as the API ships it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeEventConfig {
    /// Human-readable title.
    pub event_title: String,

    /// Optional longer description; not used by accounting.
    #[serde(default)]
    pub event_description: Option<String>,

    /// Price per unit.
    pub event_price_usd: Usd,
}

/// Run options relevant to billing.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunOptions {
    /// The budget ceiling; absent means unbounded.
    #[serde(default)]
    pub max_total_charge_usd: Option<Usd>,
}

/// Body of a charge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeRequest {
    /// The event kind being charged.
    pub event_name: EventKind,

    /// How many units occurred.
    pub count: u64,
}

/// A dataset handle returned by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetInfo {
    /// Dataset id.
    pub id: String,

    /// Dataset name, absent for unnamed datasets.
    #[serde(default)]
    pub name: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_parses_ppe_run() {
        let snapshot: RunSnapshot = serde_json::from_value(serde_json::json!({
            "pricingInfo": {
                "pricingModel": "PAY_PER_EVENT",
                "pricingPerEvent": {
                    "actorChargeEvents": {
                        "scrape": {
                            "eventTitle": "Page scraped",
                            "eventDescription": "One page extracted",
                            "eventPriceUsd": 0.1
                        }
                    }
                }
            },
            "chargedEventCounts": { "scrape": 4 },
            "options": { "maxTotalChargeUsd": 1.0 }
        }))
        .unwrap();

        let table = snapshot.price_table();
        let kind = EventKind::new("scrape").unwrap();
        assert_eq!(table.get(&kind).unwrap().price, Usd::from_cents(10));
        assert_eq!(snapshot.prior_counts()[&kind], 4);
        assert_eq!(
            snapshot.options.max_total_charge_usd,
            Some(Usd::from_f64(1.0))
        );
    }

    #[test]
    fn snapshot_without_pricing_is_empty() {
        let snapshot: RunSnapshot = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(snapshot.price_table().is_empty());
        assert!(snapshot.prior_counts().is_empty());
        assert_eq!(snapshot.options.max_total_charge_usd, None);
    }

    #[test]
    fn charge_request_wire_form() {
        let request = ChargeRequest {
            event_name: EventKind::new("scrape").unwrap(),
            count: 3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json, serde_json::json!({ "eventName": "scrape", "count": 3 }));
    }
}
