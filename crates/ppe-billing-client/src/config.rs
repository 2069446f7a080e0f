//! Run context loaded from environment variables.

use crate::error::ClientError;

/// Identity and credentials of the current run, loaded from the environment
/// the platform injects into every run.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Platform API base URL, e.g. `https://api.example.com/v2`.
    pub api_base_url: String,

    /// API token authorizing calls for this run.
    pub token: String,

    /// Identifier of the current run.
    pub run_id: String,

    /// Default key-value store for this run, used to persist the ledger
    /// dataset id across restarts.
    pub default_store_id: String,

    /// Whether this is a billed (platform) run. Local/dev runs still track
    /// and ledger charges but never call the remote billing endpoint.
    pub billed_run: bool,
}

impl RunContext {
    /// Load the run context from environment variables.
    ///
    /// Reads `PPE_API_BASE_URL`, `PPE_API_TOKEN`, `PPE_RUN_ID` and
    /// `PPE_DEFAULT_STORE_ID` (all required) plus `PPE_BILLED_RUN`
    /// (`1`/`true` to enable remote billing, anything else means a local
    /// run).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] naming the first missing
    /// required variable.
    pub fn from_env() -> Result<Self, ClientError> {
        Ok(Self {
            api_base_url: required_env("PPE_API_BASE_URL")?,
            token: required_env("PPE_API_TOKEN")?,
            run_id: required_env("PPE_RUN_ID")?,
            default_store_id: required_env("PPE_DEFAULT_STORE_ID")?,
            billed_run: flag_env("PPE_BILLED_RUN"),
        })
    }
}

fn required_env(name: &str) -> Result<String, ClientError> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ClientError::Configuration(format!(
            "missing required environment variable {name}"
        ))),
    }
}

fn flag_env(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false)
}
