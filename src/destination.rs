//! Destination capability and the per-attempt timeout invoker (§4.5).

use crate::error::InvokeError;
use crate::model::Event;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// An external sink with a `Receive(event)` capability and a globally unique name
/// (§3 "Destination descriptor"). Concrete destinations (warehouses, lakes, DBs)
/// are external collaborators; this crate only depends on the capability.
#[async_trait]
pub trait Destination: Send + Sync + std::fmt::Debug {
    async fn receive(&self, event: Event) -> Result<(), String>;
    fn name(&self) -> &str;
}

/// Wraps one `Receive` attempt in a cooperative per-attempt timeout.
///
/// The `Receive` future is spawned onto its own task and raced against a timer.
/// If the timer wins, the spawned task is *not* aborted — it is left to run to
/// completion and its eventual result is simply never observed. This is the
/// "discarded, not cancelled" semantic §4.5 and §9 call for, and is why
/// [`Destination`] implementations must tolerate a late or redundant call.
#[derive(Debug, Clone)]
pub struct DestinationInvoker {
    timeout: Duration,
}

impl DestinationInvoker {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub async fn invoke(
        &self,
        destination: Arc<dyn Destination>,
        event: &Event,
    ) -> Result<(), InvokeError> {
        let name = destination.name().to_string();
        let event = event.clone();
        let handle = tokio::spawn(async move { destination.receive(event).await });

        tokio::select! {
            biased;
            result = handle => match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(message)) => Err(InvokeError::Destination(message)),
                Err(join_error) => {
                    Err(InvokeError::Destination(format!("destination task failed: {join_error}")))
                }
            },
            _ = tokio::time::sleep(self.timeout) => Err(InvokeError::Timeout { destination: name }),
        }
    }
}
