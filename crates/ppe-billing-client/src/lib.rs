//! HTTP client for the PPE metering platform API.
//!
//! This crate wraps the four narrow platform surfaces the billing stack
//! consumes:
//!
//! - the **run snapshot** endpoint (price table, prior charge counts,
//!   budget ceiling), fetched once at initialization
//! - the **charge** endpoint, called with an idempotency key and bounded
//!   retry
//! - **key-value records**, used to persist the ledger dataset id across
//!   restarts
//! - **datasets**, the append-only store backing the charge ledger
//!
//! # Example
//!
//! ```no_run
//! use ppe_billing_client::{PlatformClient, RunContext};
//!
//! # async fn example() -> Result<(), ppe_billing_client::ClientError> {
//! let ctx = RunContext::from_env()?;
//! let client = PlatformClient::new(&ctx.api_base_url, &ctx.token);
//!
//! let snapshot = client.fetch_run(&ctx.run_id).await?;
//! println!("ceiling: {:?}", snapshot.options.max_total_charge_usd);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod config;
mod error;
mod retry;
mod types;

pub use client::PlatformClient;
pub use config::RunContext;
pub use error::ClientError;
pub use retry::RetryConfig;
pub use types::{
    ChargeEventConfig, ChargeRequest, DatasetInfo, PricingInfo, PricingPerEvent, RunOptions,
    RunSnapshot,
};
