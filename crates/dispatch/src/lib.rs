pub mod advisory;
pub mod telegram;

pub use advisory::AdvisoryClient;
pub use telegram::TelegramNotifier;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use common::{Result, SignalEvent};

/// An external consumer of detected signals (advisory, notification).
///
/// Consumers receive each event verbatim and their return values are only
/// logged. A consumer must never be able to break the detection/journal
/// path; the `Dispatcher` enforces that.
#[async_trait]
pub trait SignalConsumer: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Hand one event to the collaborator.
    async fn deliver(&self, event: &SignalEvent) -> Result<()>;
}

/// Best-effort fan-out to all registered consumers.
///
/// Zero consumers is a normal configuration. Each delivery runs under a
/// bounded timeout; failures and expiries are logged as warnings and
/// swallowed, so `offer` itself cannot fail and gives no ordering guarantee
/// relative to journaling.
pub struct Dispatcher {
    consumers: Vec<Arc<dyn SignalConsumer>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(timeout: Duration) -> Self {
        Self {
            consumers: Vec::new(),
            timeout,
        }
    }

    pub fn register(&mut self, consumer: Arc<dyn SignalConsumer>) {
        self.consumers.push(consumer);
    }

    pub fn is_empty(&self) -> bool {
        self.consumers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.consumers.len()
    }

    /// Offer one event to every consumer in registration order.
    pub async fn offer(&self, event: &SignalEvent) {
        for consumer in &self.consumers {
            match tokio::time::timeout(self.timeout, consumer.deliver(event)).await {
                Ok(Ok(())) => {
                    debug!(
                        consumer = consumer.name(),
                        instrument = %event.instrument_id,
                        kind = %event.kind,
                        "Signal delivered"
                    );
                }
                Ok(Err(e)) => {
                    warn!(
                        consumer = consumer.name(),
                        instrument = %event.instrument_id,
                        error = %e,
                        "Signal delivery failed"
                    );
                }
                Err(_) => {
                    warn!(
                        consumer = consumer.name(),
                        instrument = %event.instrument_id,
                        timeout_secs = self.timeout.as_secs(),
                        "Signal delivery timed out"
                    );
                }
            }
        }
    }
}
