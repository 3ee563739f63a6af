use event_delivery_gateway::config::{Config, DestinationConfig};
use event_delivery_gateway::destination::Destination;
use event_delivery_gateway::shutdown::listen_for_shutdown;
use event_delivery_gateway::supervisor;
use event_delivery_gateway::Event;
use std::sync::Arc;

/// Destination names come from the process environment so a deployment can name
/// its fan-out targets without a code change, while the `Receive` implementation
/// itself stays an in-process collaborator (§6: no dynamic registration).
fn configured_destination_names() -> Vec<String> {
    std::env::var("DESTINATIONS")
        .unwrap_or_else(|_| "stdout".to_string())
        .split(',')
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .collect()
}

/// A destination that logs every event it receives; stands in for a real
/// warehouse/lake/database sink until one is wired in (§1: concrete destinations
/// are out of scope for this design).
#[derive(Debug)]
struct LoggingDestination {
    name: String,
}

#[async_trait::async_trait]
impl Destination for LoggingDestination {
    async fn receive(&self, event: Event) -> Result<(), String> {
        tracing::info!(destination = %self.name, user_id = %event.user_id, "received event");
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let names = configured_destination_names();
    let destination_configs: Vec<DestinationConfig> =
        names.iter().map(|name| DestinationConfig { name: name.clone() }).collect();

    let config = Config::from_env(destination_configs).unwrap_or_else(|error| {
        tracing::error!(error = %error, "invalid configuration");
        std::process::exit(1);
    });

    let destinations: Vec<Arc<dyn Destination>> = names
        .into_iter()
        .map(|name| Arc::new(LoggingDestination { name }) as Arc<dyn Destination>)
        .collect();

    let cancel = listen_for_shutdown();

    if let Err(error) = supervisor::run(config, destinations, cancel).await {
        tracing::error!(error = %error, "fatal startup failure");
        std::process::exit(1);
    }
}
