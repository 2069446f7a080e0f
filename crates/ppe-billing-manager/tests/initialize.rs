//! End-to-end initialization and charge flow against a mock platform.

use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ppe_billing_client::{PlatformClient, RetryConfig, RunContext};
use ppe_billing_core::{ChargeOutcome, EventKind, RemainingBudget, Usd};
use ppe_billing_manager::{ChargingManager, ManagerError};

fn fast_client(base_url: &str) -> PlatformClient {
    let retry = RetryConfig::default().with_base_delay(Duration::from_millis(1));
    PlatformClient::with_retry(base_url, "test-token", retry)
}

fn run_context(base_url: &str, billed_run: bool) -> RunContext {
    RunContext {
        api_base_url: base_url.to_string(),
        token: "test-token".to_string(),
        run_id: "run-1".to_string(),
        default_store_id: "store-1".to_string(),
        billed_run,
    }
}

async fn mount_snapshot(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pricingInfo": {
                "pricingModel": "PAY_PER_EVENT",
                "pricingPerEvent": {
                    "actorChargeEvents": {
                        "scrape": {
                            "eventTitle": "Page scraped",
                            "eventPriceUsd": 0.1
                        }
                    }
                }
            },
            "chargedEventCounts": { "scrape": 0 },
            "options": { "maxTotalChargeUsd": 1.0 }
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn initialize_and_charge_billed_run() {
    let server = MockServer::start().await;
    mount_snapshot(&server).await;

    // First boot: no persisted dataset yet.
    Mock::given(method("GET"))
        .and(path("/key-value-stores/store-1/records/LEDGER_DATASET_INFO"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/datasets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": "ds-1" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/key-value-stores/store-1/records/LEDGER_DATASET_INFO"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/actor-runs/run-1/charge"))
        .and(body_json(json!({ "eventName": "scrape", "count": 2 })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/datasets/ds-1/items"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let ctx = run_context(&server.uri(), true);
    let manager = ChargingManager::initialize(fast_client(&server.uri()), &ctx)
        .await
        .unwrap();

    let event = EventKind::new("scrape").unwrap();
    let result = manager
        .charge(&event, vec![json!({ "slot": 0 }), json!({ "slot": 1 })])
        .await;

    assert_eq!(result.charged_count, 2);
    assert_eq!(result.outcome, ChargeOutcome::ChargeSuccessful);
    assert_eq!(
        manager.remaining_charge_budget().await,
        RemainingBudget::Limited(Usd::from_cents(80))
    );

    // Drain the notifier before the mock server verifies expectations.
    manager.close().await;
}

#[tokio::test]
async fn restart_reuses_persisted_dataset_and_prior_counts() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "pricingInfo": {
                "pricingModel": "PAY_PER_EVENT",
                "pricingPerEvent": {
                    "actorChargeEvents": {
                        "scrape": { "eventTitle": "Page scraped", "eventPriceUsd": 0.1 }
                    }
                }
            },
            "chargedEventCounts": { "scrape": 9 },
            "options": { "maxTotalChargeUsd": 1.0 }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/key-value-stores/store-1/records/LEDGER_DATASET_INFO"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "ds-7" })))
        .expect(1)
        .mount(&server)
        .await;

    // No dataset creation on resume.
    Mock::given(method("POST"))
        .and(path("/datasets"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/datasets/ds-7/items"))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    // Local run: the billing endpoint is never called.
    let ctx = run_context(&server.uri(), false);
    let manager = ChargingManager::initialize(fast_client(&server.uri()), &ctx)
        .await
        .unwrap();

    let event = EventKind::new("scrape").unwrap();
    assert_eq!(manager.charged_count_for(&event).await.unwrap(), 9);

    // 9 of 10 units already spent before the restart; a batch of 3 caps at 1.
    let result = manager.charge(&event, vec![json!({}), json!({}), json!({})]).await;
    assert_eq!(result.charged_count, 1);
    assert!(result.event_charge_limit_reached);

    manager.close().await;
}

#[tokio::test]
async fn initialization_failure_propagates() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/actor-runs/run-1"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad token"))
        .mount(&server)
        .await;

    let ctx = run_context(&server.uri(), true);
    let err = ChargingManager::initialize(fast_client(&server.uri()), &ctx)
        .await
        .unwrap_err();

    assert!(matches!(err, ManagerError::Init(_)));
}
