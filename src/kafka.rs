//! Production `rdkafka`-backed implementations of the [`crate::broker`] traits.

use crate::broker::{FetchedMessage, LogConsumer, LogProducer, TopicAdministrator, TopicSpec};
use crate::config::RequiredAcks;
use crate::error::{CommitError, FetchError, ProducerError, TopicError};
use crate::model::LogMessage;
use async_trait::async_trait;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::client::DefaultClientContext;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{CommitMode, Consumer, StreamConsumer};
use rdkafka::error::RDKafkaErrorCode;
use rdkafka::message::Message;
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::topic_partition_list::{Offset, TopicPartitionList};
use rdkafka::util::Timeout;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub struct KafkaProducer {
    producer: FutureProducer,
    topic: String,
}

impl KafkaProducer {
    pub fn new(broker_address: &str, topic: &str, required_acks: RequiredAcks) -> Result<Self, ProducerError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", broker_address)
            .set("acks", required_acks.as_librdkafka_str())
            .set("allow.auto.create.topics", "false")
            .create()
            .map_err(|e| ProducerError::Unreachable(e.to_string()))?;
        Ok(Self { producer, topic: topic.to_string() })
    }
}

#[async_trait]
impl LogProducer for KafkaProducer {
    async fn send(&self, messages: Vec<LogMessage>) -> Result<(), ProducerError> {
        for message in messages {
            let record = FutureRecord::to(&self.topic)
                .key(&message.key)
                .payload(&message.value)
                .timestamp(message.timestamp_millis);
            self.producer
                .send(record, Timeout::After(Duration::from_secs(5)))
                .await
                .map_err(|(kafka_error, _owned_message)| {
                    ProducerError::WriteRejected(kafka_error.to_string())
                })?;
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), ProducerError> {
        self.producer
            .flush(Duration::from_secs(5))
            .map_err(|e| ProducerError::WriteRejected(e.to_string()))
    }
}

pub struct KafkaConsumer {
    consumer: StreamConsumer,
    topic: String,
}

impl KafkaConsumer {
    pub fn new(broker_address: &str, topic: &str, group_id: &str) -> Result<Self, FetchError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", broker_address)
            .set("group.id", group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "earliest")
            .set("fetch.min.bytes", "10240")
            .set("fetch.message.max.bytes", "10485760")
            .create()
            .map_err(|e| FetchError::Broker(e.to_string()))?;
        consumer.subscribe(&[topic]).map_err(|e| FetchError::Broker(e.to_string()))?;
        Ok(Self { consumer, topic: topic.to_string() })
    }
}

#[async_trait]
impl LogConsumer for KafkaConsumer {
    async fn fetch(&mut self, cancel: &CancellationToken) -> Result<FetchedMessage, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            result = self.consumer.recv() => {
                let borrowed = result.map_err(|e| FetchError::Broker(e.to_string()))?;
                let key = borrowed.key().unwrap_or_default().to_vec();
                let value = borrowed.payload().unwrap_or_default().to_vec();
                let timestamp_millis = borrowed.timestamp().to_millis().unwrap_or(0);
                Ok(FetchedMessage {
                    partition: borrowed.partition(),
                    offset: borrowed.offset(),
                    message: LogMessage { key, value, timestamp_millis },
                })
            }
        }
    }

    async fn commit(&mut self, message: &FetchedMessage) -> Result<(), CommitError> {
        let mut tpl = TopicPartitionList::new();
        tpl.add_partition_offset(&self.topic, message.partition, Offset::Offset(message.offset + 1))
            .map_err(|e| CommitError::Broker(e.to_string()))?;
        self.consumer.commit(&tpl, CommitMode::Async).map_err(|e| CommitError::Broker(e.to_string()))
    }
}

pub struct KafkaTopicAdministrator {
    admin: AdminClient<DefaultClientContext>,
}

impl KafkaTopicAdministrator {
    pub fn new(broker_address: &str) -> Result<Self, TopicError> {
        let admin: AdminClient<_> = ClientConfig::new()
            .set("bootstrap.servers", broker_address)
            .create()
            .map_err(|e| TopicError::Unreachable { topic: String::new(), source: e.to_string() })?;
        Ok(Self { admin })
    }
}

#[async_trait]
impl TopicAdministrator for KafkaTopicAdministrator {
    async fn ensure_topic(&self, spec: &TopicSpec) -> Result<(), TopicError> {
        let retention_ms = (spec.retention_hours as i64) * 60 * 60 * 1000;
        let retention_ms = retention_ms.to_string();
        let new_topic = NewTopic::new(
            &spec.name,
            spec.partitions as i32,
            TopicReplication::Fixed(spec.replication_factor as i32),
        )
        .set("retention.ms", &retention_ms);

        let results = self
            .admin
            .create_topics(&[new_topic], &AdminOptions::new())
            .await
            .map_err(|e| TopicError::CreateFailed { topic: spec.name.clone(), source: e.to_string() })?;

        for result in results {
            match result {
                Ok(_) => {}
                Err((topic, RDKafkaErrorCode::TopicAlreadyExists)) => {
                    tracing::info!(topic = %topic, "topic already exists, reusing it");
                }
                Err((topic, code)) => {
                    return Err(TopicError::CreateFailed { topic, source: code.to_string() });
                }
            }
        }
        Ok(())
    }
}
