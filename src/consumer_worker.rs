//! Per-destination fetch → invoke-with-retry → commit loop (§4.6).

use crate::broker::LogConsumer;
use crate::destination::{Destination, DestinationInvoker};
use crate::error::{FetchError, InvokeError};
use crate::retry::{RetryConfig, RetryEngine};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

/// Derives the consumer group id a destination's worker binds to (§4.6).
pub fn group_id_for(destination_name: &str) -> String {
    format!("event-delivery-kafka-{destination_name}")
}

/// Owns one destination for its lifetime: one consumer handle, one retry engine,
/// reset before every event (§3 "Consumer worker state").
pub struct ConsumerWorker<C: LogConsumer> {
    consumer: C,
    destination: Arc<dyn Destination>,
    invoker: DestinationInvoker,
    retry_config: RetryConfig,
}

impl<C: LogConsumer> ConsumerWorker<C> {
    pub fn new(
        consumer: C,
        destination: Arc<dyn Destination>,
        invoker: DestinationInvoker,
        retry_config: RetryConfig,
    ) -> Self {
        Self { consumer, destination, invoker, retry_config }
    }

    /// Runs the fetch/attempt/commit loop until `cancel` fires or the underlying
    /// fetch reports cancellation, whichever comes first (§4.8).
    pub async fn run(mut self, cancel: CancellationToken) {
        let destination_name = self.destination.name().to_string();
        let span = tracing::info_span!("consumer_worker", destination = %destination_name);
        async move {
            loop {
                let fetched = match self.consumer.fetch(&cancel).await {
                    Ok(fetched) => fetched,
                    Err(FetchError::Cancelled) => {
                        tracing::info!("fetch cancelled, shutting down worker");
                        return;
                    }
                    Err(FetchError::Broker(message)) => {
                        tracing::error!(error = %message, "fetch failed");
                        return;
                    }
                };

                let event = fetched.message.to_event();
                let engine = RetryEngine::new(self.retry_config);
                let destination = self.destination.clone();
                let invoker = self.invoker.clone();

                let outcome = engine
                    .execute(
                        || {
                            let destination = destination.clone();
                            let invoker = invoker.clone();
                            let event = event.clone();
                            async move { invoker.invoke(destination, &event).await }
                        },
                        |error, sleep_duration| {
                            tracing::warn!(
                                error = %error,
                                sleep_ms = sleep_duration.as_millis() as u64,
                                "delivery attempt failed, retrying"
                            );
                        },
                    )
                    .await;

                match outcome {
                    Ok(()) => tracing::info!(partition = fetched.partition, offset = fetched.offset, "delivered"),
                    Err(exhausted) => {
                        let kind = match &exhausted.last_error {
                            InvokeError::Timeout { .. } => "timeout",
                            InvokeError::Destination(_) => "failed",
                        };
                        tracing::warn!(
                            partition = fetched.partition,
                            offset = fetched.offset,
                            attempts = exhausted.attempts,
                            status = kind,
                            error = %exhausted.last_error,
                            "retries exhausted, dropping event for this destination"
                        );
                    }
                }

                if let Err(error) = self.consumer.commit(&fetched).await {
                    tracing::error!(
                        partition = fetched.partition,
                        offset = fetched.offset,
                        error = %error,
                        "commit failed"
                    );
                }
            }
        }
        .instrument(span)
        .await
    }
}
