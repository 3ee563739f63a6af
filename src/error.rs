//! Error types at each component boundary.
//!
//! HTTP-facing variants carry exactly the literal text the ingress contract promises;
//! everything else is a plain [`thiserror`] error meant for logs, never for a wire body.

use thiserror::Error;

/// Errors surfaced by `PUT /events` validation and publication.
#[derive(Debug, Error)]
pub enum IngressError {
    #[error("need content-type 'application/json', but got '{actual}'")]
    WrongContentType { actual: String },

    #[error("{0}")]
    MalformedBody(String),

    #[error("UserID should be provided")]
    MissingUserId,

    #[error("{0}")]
    Publish(#[from] ProducerError),
}

/// Errors from publishing a batch of messages to the log.
#[derive(Debug, Error)]
pub enum ProducerError {
    #[error("broker unreachable: {0}")]
    Unreachable(String),

    #[error("write rejected: {0}")]
    WriteRejected(String),
}

/// Errors from the topic administrator's idempotent topic creation.
#[derive(Debug, Error)]
pub enum TopicError {
    #[error("broker unreachable while ensuring topic '{topic}': {source}")]
    Unreachable { topic: String, source: String },

    #[error("failed to create topic '{topic}': {source}")]
    CreateFailed { topic: String, source: String },
}

/// A single destination invocation's outcome (§4.5): either the destination
/// returned an error, or the per-attempt timeout elapsed first.
#[derive(Debug, Error, Clone)]
pub enum InvokeError {
    #[error("{destination} : timed out")]
    Timeout { destination: String },

    #[error("{0}")]
    Destination(String),
}

/// Errors fetching from or committing to the partitioned log.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch cancelled")]
    Cancelled,

    #[error("fetch failed: {0}")]
    Broker(String),
}

#[derive(Debug, Error)]
pub enum CommitError {
    #[error("commit failed: {0}")]
    Broker(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable '{0}'")]
    Missing(String),

    #[error("invalid value for environment variable '{name}': {value}")]
    Invalid { name: String, value: String },
}
