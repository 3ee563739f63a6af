//! The partitioned-log boundary (§2b): narrow traits the rest of the gateway is
//! written against, plus an in-memory double used by tests so the six end-to-end
//! scenarios in the testable-properties section run without a live broker.
//!
//! The production implementation lives in [`crate::kafka`].

use crate::error::{CommitError, FetchError, ProducerError, TopicError};
use crate::model::LogMessage;
use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Parameters for idempotent topic creation (§4.3).
#[derive(Debug, Clone)]
pub struct TopicSpec {
    pub name: String,
    pub partitions: u32,
    pub replication_factor: u16,
    pub retention_hours: u32,
}

#[async_trait]
pub trait TopicAdministrator: Send + Sync {
    async fn ensure_topic(&self, spec: &TopicSpec) -> Result<(), TopicError>;
}

#[async_trait]
pub trait LogProducer: Send + Sync {
    /// Publish all messages as one batch; a single error if any fails (§4.2).
    async fn send(&self, messages: Vec<LogMessage>) -> Result<(), ProducerError>;
    async fn close(&self) -> Result<(), ProducerError>;
}

/// A fetched record together with the cursor needed to commit it.
#[derive(Debug, Clone)]
pub struct FetchedMessage {
    pub partition: i32,
    pub offset: i64,
    pub message: LogMessage,
}

#[async_trait]
pub trait LogConsumer: Send + Sync {
    /// Fetch the next message; cancel-aware so shutdown can unblock an in-flight fetch.
    async fn fetch(&mut self, cancel: &CancellationToken) -> Result<FetchedMessage, FetchError>;
    /// Commit past the fetched message's offset.
    async fn commit(&mut self, message: &FetchedMessage) -> Result<(), CommitError>;
}

fn partition_for_key(key: &[u8], partition_count: u32) -> i32 {
    if partition_count == 0 {
        return 0;
    }
    let mut hasher = DefaultHasher::new();
    key.hash(&mut hasher);
    (hasher.finish() % partition_count as u64) as i32
}

#[derive(Debug, Default)]
struct PartitionLog {
    messages: Vec<LogMessage>,
}

/// In-memory stand-in for a partitioned log, shared between a producer handle and
/// any number of independent per-group consumer handles. Each consumer keeps its
/// own offsets, exactly like independent consumer groups against a real broker.
#[derive(Clone)]
pub struct InMemoryBroker {
    partitions: Arc<Mutex<Vec<PartitionLog>>>,
    partition_count: u32,
}

impl InMemoryBroker {
    pub fn new(partition_count: u32) -> Self {
        let mut partitions = Vec::with_capacity(partition_count as usize);
        partitions.resize_with(partition_count as usize, PartitionLog::default);
        Self { partitions: Arc::new(Mutex::new(partitions)), partition_count }
    }

    pub fn producer(&self) -> InMemoryProducer {
        InMemoryProducer {
            partitions: self.partitions.clone(),
            partition_count: self.partition_count,
        }
    }

    pub fn consumer(&self) -> InMemoryConsumer {
        InMemoryConsumer {
            partitions: self.partitions.clone(),
            offsets: vec![0usize; self.partition_count as usize],
        }
    }

    pub fn topic_administrator(&self) -> InMemoryTopicAdministrator {
        InMemoryTopicAdministrator { partition_count: self.partition_count }
    }
}

#[derive(Clone)]
pub struct InMemoryProducer {
    partitions: Arc<Mutex<Vec<PartitionLog>>>,
    partition_count: u32,
}

#[async_trait]
impl LogProducer for InMemoryProducer {
    async fn send(&self, messages: Vec<LogMessage>) -> Result<(), ProducerError> {
        let mut partitions = self.partitions.lock().expect("broker mutex poisoned");
        for message in messages {
            let partition = partition_for_key(&message.key, self.partition_count) as usize;
            partitions[partition].messages.push(message);
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), ProducerError> {
        Ok(())
    }
}

pub struct InMemoryConsumer {
    partitions: Arc<Mutex<Vec<PartitionLog>>>,
    offsets: Vec<usize>,
}

#[async_trait]
impl LogConsumer for InMemoryConsumer {
    async fn fetch(&mut self, cancel: &CancellationToken) -> Result<FetchedMessage, FetchError> {
        loop {
            {
                let partitions = self.partitions.lock().expect("broker mutex poisoned");
                for (partition, log) in partitions.iter().enumerate() {
                    let next_offset = self.offsets[partition];
                    if next_offset < log.messages.len() {
                        let message = log.messages[next_offset].clone();
                        return Ok(FetchedMessage {
                            partition: partition as i32,
                            offset: next_offset as i64,
                            message,
                        });
                    }
                }
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(std::time::Duration::from_millis(2)) => {}
            }
        }
    }

    async fn commit(&mut self, message: &FetchedMessage) -> Result<(), CommitError> {
        let partition = message.partition as usize;
        if self.offsets[partition] == message.offset as usize {
            self.offsets[partition] += 1;
        }
        Ok(())
    }
}

/// No-op topic administrator: the in-memory broker's partition count is fixed at
/// construction, so "ensuring" a topic is just checking the caller agrees with it.
pub struct InMemoryTopicAdministrator {
    partition_count: u32,
}

#[async_trait]
impl TopicAdministrator for InMemoryTopicAdministrator {
    async fn ensure_topic(&self, spec: &TopicSpec) -> Result<(), TopicError> {
        if spec.partitions != self.partition_count {
            return Err(TopicError::CreateFailed {
                topic: spec.name.clone(),
                source: format!(
                    "in-memory broker fixed at {} partitions, requested {}",
                    self.partition_count, spec.partitions
                ),
            });
        }
        Ok(())
    }
}
