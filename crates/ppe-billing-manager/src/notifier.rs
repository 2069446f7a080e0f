//! Background charge notifier.
//!
//! The charging manager never waits on the billing endpoint: it hands a
//! ticket to this worker over a channel after releasing its lock. The worker
//! reports the charge with an idempotency key and the client's bounded
//! retry; a failure after the retry budget is logged and swallowed, since
//! the local counters remain the authoritative record.

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use ppe_billing_client::PlatformClient;
use ppe_billing_core::EventKind;

/// One "N units of event E occurred" notification.
#[derive(Debug)]
struct ChargeTicket {
    event: EventKind,
    count: u64,
}

/// Fire-and-forget reporter of charged units to the billing endpoint.
#[derive(Debug)]
pub struct ChargeNotifier {
    tx: Option<mpsc::UnboundedSender<ChargeTicket>>,
    worker: Option<JoinHandle<()>>,
}

impl ChargeNotifier {
    /// Spawn the notifier worker for a billed run.
    #[must_use]
    pub fn spawn(client: PlatformClient, run_id: String) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<ChargeTicket>();

        let worker = tokio::spawn(async move {
            while let Some(ticket) = rx.recv().await {
                let key = format!(
                    "{run_id}-{}-{}",
                    ticket.event,
                    Utc::now().timestamp_millis()
                );
                match client
                    .charge_event(&run_id, &ticket.event, ticket.count, &key)
                    .await
                {
                    Ok(()) => {
                        debug!(event = %ticket.event, count = ticket.count, "charge reported");
                    }
                    Err(err) => {
                        // Swallowed: billing is a downstream side effect and
                        // must never fail the caller's business logic.
                        error!(
                            event = %ticket.event,
                            count = ticket.count,
                            error = %err,
                            "charge notification failed"
                        );
                    }
                }
            }
        });

        Self {
            tx: Some(tx),
            worker: Some(worker),
        }
    }

    /// A notifier that reports nothing, for local/dev runs. Charges are
    /// still tracked and ledgered locally.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            tx: None,
            worker: None,
        }
    }

    /// Whether notifications are actually sent.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.tx.is_some()
    }

    /// Queue a notification. Never blocks and never fails the caller.
    pub fn notify(&self, event: EventKind, count: u64) {
        let Some(tx) = &self.tx else {
            debug!(event = %event, count, "local run, skipping charge notification");
            return;
        };
        if tx.send(ChargeTicket { event, count }).is_err() {
            error!("charge notifier worker is gone, notification dropped");
        }
    }

    /// Close the channel and wait for queued notifications to drain.
    pub async fn close(mut self) {
        drop(self.tx.take());
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
    }
}

impl Drop for ChargeNotifier {
    fn drop(&mut self) {
        // Dropping the sender lets the worker finish its queue and exit on
        // its own; nothing to join synchronously here.
        drop(self.tx.take());
    }
}
