//! Platform API client implementation.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use ppe_billing_core::{EventKind, LedgerEntry};

use crate::error::ClientError;
use crate::retry::RetryConfig;
use crate::types::{ChargeRequest, DatasetInfo, RunSnapshot};

/// Client for the metering platform API.
///
/// Cloneable; the underlying connection pool is shared between clones.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryConfig,
}

impl PlatformClient {
    /// Create a new platform client with the default retry policy.
    #[must_use]
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_retry(base_url, token, RetryConfig::default())
    }

    /// Create a new platform client with a custom retry policy.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built (should not happen with
    /// default settings).
    #[must_use]
    pub fn with_retry(
        base_url: impl Into<String>,
        token: impl Into<String>,
        retry: RetryConfig,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            retry,
        }
    }

    /// Fetch the snapshot of the current run: price table, prior charge
    /// counts, and the budget ceiling.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform returns a
    /// non-success response.
    pub async fn fetch_run(&self, run_id: &str) -> Result<RunSnapshot, ClientError> {
        let url = format!("{}/actor-runs/{run_id}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("token", &self.token)])
            .send()
            .await?;

        Self::parse_json(response).await
    }

    /// Report `count` charged units of `event` to the billing endpoint.
    ///
    /// The caller supplies the idempotency key so a retried request cannot
    /// be double-applied. Transport errors, 429 and 5xx responses are
    /// retried with exponential backoff up to the configured attempt budget.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::RetriesExhausted`] once the retry budget is
    /// spent, or [`ClientError::Api`] on a terminal (non-retryable)
    /// response.
    pub async fn charge_event(
        &self,
        run_id: &str,
        event: &EventKind,
        count: u64,
        idempotency_key: &str,
    ) -> Result<(), ClientError> {
        let url = format!("{}/actor-runs/{run_id}/charge", self.base_url);
        let body = ChargeRequest {
            event_name: event.clone(),
            count,
        };

        let mut last_failure = String::new();
        for attempt in 0..self.retry.max_attempts {
            if attempt > 0 {
                tokio::time::sleep(self.retry.delay_for_attempt(attempt - 1)).await;
            }

            let result = self
                .client
                .post(&url)
                .query(&[("token", &self.token)])
                .header("idempotency-key", idempotency_key)
                .json(&body)
                .send()
                .await;

            match result {
                Ok(response) if response.status().is_success() => return Ok(()),
                Ok(response) if is_transient(response.status()) => {
                    last_failure = format!("HTTP {}", response.status());
                    warn!(
                        event = %event,
                        attempt = attempt + 1,
                        status = %response.status(),
                        "charge request failed, will retry"
                    );
                }
                Ok(response) => return Err(Self::response_error(response).await),
                Err(err) => {
                    last_failure = err.to_string();
                    warn!(
                        event = %event,
                        attempt = attempt + 1,
                        error = %err,
                        "charge request failed, will retry"
                    );
                }
            }
        }

        Err(ClientError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            message: last_failure,
        })
    }

    /// Read a JSON record from the run's key-value store.
    ///
    /// Returns `None` if the record does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform returns a
    /// non-success response other than 404.
    pub async fn get_record<T: DeserializeOwned>(
        &self,
        store_id: &str,
        key: &str,
    ) -> Result<Option<T>, ClientError> {
        let url = format!("{}/key-value-stores/{store_id}/records/{key}", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("token", &self.token)])
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Self::parse_json(response).await.map(Some)
    }

    /// Write a JSON record to the run's key-value store.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform returns a
    /// non-success response.
    pub async fn set_record<T: Serialize + Sync>(
        &self,
        store_id: &str,
        key: &str,
        value: &T,
    ) -> Result<(), ClientError> {
        let url = format!("{}/key-value-stores/{store_id}/records/{key}", self.base_url);

        let response = self
            .client
            .put(&url)
            .query(&[("token", &self.token)])
            .json(value)
            .send()
            .await?;

        Self::check_success(response).await
    }

    /// Create a new unnamed dataset.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform returns a
    /// non-success response.
    pub async fn create_dataset(&self) -> Result<DatasetInfo, ClientError> {
        let url = format!("{}/datasets", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("token", &self.token)])
            .send()
            .await?;

        Self::parse_json(response).await
    }

    /// Append ledger entries to a dataset, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform returns a
    /// non-success response.
    pub async fn push_items(
        &self,
        dataset_id: &str,
        items: &[LedgerEntry],
    ) -> Result<(), ClientError> {
        let url = format!("{}/datasets/{dataset_id}/items", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("token", &self.token)])
            .json(items)
            .send()
            .await?;

        Self::check_success(response).await
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(Self::response_error(response).await)
        }
    }

    async fn check_success(response: Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(Self::response_error(response).await)
        }
    }

    async fn response_error(response: Response) -> ClientError {
        let status = response.status();
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| status.to_string());
        ClientError::Api {
            status: status.as_u16(),
            message,
        }
    }
}

/// Whether a response status is worth retrying.
fn is_transient(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}
