//! Fan-out supervisor: startup sequencing and teardown (§4.7).

use crate::broker::{InMemoryBroker, TopicAdministrator, TopicSpec};
use crate::config::Config;
use crate::consumer_worker::{group_id_for, ConsumerWorker};
use crate::destination::{Destination, DestinationInvoker};
use crate::error::TopicError;
use crate::http::{router, IngressState};
use crate::kafka::{KafkaConsumer, KafkaProducer, KafkaTopicAdministrator};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Brings up the topic, one consumer worker per destination, the producer, and the
/// HTTP server, in the order §4.7 mandates. Returns once the HTTP server has shut
/// down (after `cancel` fires); worker tasks are detached and observe the same token.
pub async fn run(
    config: Config,
    destinations: Vec<Arc<dyn Destination>>,
    cancel: CancellationToken,
) -> Result<(), TopicError> {
    let administrator = KafkaTopicAdministrator::new(&config.broker_address)?;
    administrator
        .ensure_topic(&TopicSpec {
            name: config.topic.clone(),
            partitions: config.partitions,
            replication_factor: config.replication_factor,
            retention_hours: config.retention_hours,
        })
        .await?;

    let mut worker_handles: Vec<JoinHandle<()>> = Vec::with_capacity(destinations.len());
    for destination in destinations {
        let group_id = group_id_for(destination.name());
        let consumer = KafkaConsumer::new(&config.broker_address, &config.topic, &group_id)
            .map_err(|error| TopicError::Unreachable { topic: config.topic.clone(), source: error.to_string() })?;
        let worker = ConsumerWorker::new(
            consumer,
            destination,
            DestinationInvoker::new(config.destination_timeout),
            config.retry,
        );
        let worker_cancel = cancel.clone();
        worker_handles.push(tokio::spawn(worker.run(worker_cancel)));
    }

    let producer = KafkaProducer::new(&config.broker_address, &config.topic, config.required_acks)
        .map_err(|error| TopicError::Unreachable { topic: config.topic.clone(), source: error.to_string() })?;
    let state = IngressState { producer: Arc::new(producer) };

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", config.port))
        .await
        .unwrap_or_else(|error| panic!("failed to bind port {}: {error}", config.port));

    let shutdown_signal = cancel.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown_signal.cancelled().await })
        .await
        .expect("HTTP server failed");

    for handle in worker_handles {
        let _ = handle.await;
    }
    Ok(())
}

/// Same sequencing as [`run`], but against the in-memory broker double, for
/// integration tests that exercise the fan-out supervisor end-to-end (§8).
pub async fn run_in_memory(
    config: Config,
    destinations: Vec<Arc<dyn Destination>>,
    broker: &InMemoryBroker,
    cancel: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let administrator = broker.topic_administrator();
    administrator
        .ensure_topic(&TopicSpec {
            name: config.topic.clone(),
            partitions: config.partitions,
            replication_factor: config.replication_factor,
            retention_hours: config.retention_hours,
        })
        .await
        .expect("in-memory topic administrator never fails on a matching partition count");

    let mut handles = Vec::with_capacity(destinations.len());
    for destination in destinations {
        let worker = ConsumerWorker::new(
            broker.consumer(),
            destination,
            DestinationInvoker::new(config.destination_timeout),
            config.retry,
        );
        handles.push(tokio::spawn(worker.run(cancel.clone())));
    }
    handles
}
