#![forbid(unsafe_code)]

//! # event-delivery-gateway
//!
//! An HTTP-to-log event ingestion gateway with per-destination fan-out delivery,
//! bounded randomised retry, and per-attempt timeouts.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use event_delivery_gateway::config::{Config, DestinationConfig};
//! use event_delivery_gateway::destination::Destination;
//! use event_delivery_gateway::shutdown::listen_for_shutdown;
//! use event_delivery_gateway::supervisor;
//! use std::sync::Arc;
//!
//! # async fn docs_only(destinations: Vec<Arc<dyn Destination>>) {
//! let config = Config::from_env(vec![DestinationConfig { name: "warehouse".into() }])
//!     .expect("valid configuration");
//! let cancel = listen_for_shutdown();
//! supervisor::run(config, destinations, cancel).await.expect("fatal startup failure");
//! # }
//! ```

pub mod backoff;
pub mod broker;
pub mod clock;
pub mod config;
pub mod consumer_worker;
pub mod destination;
pub mod error;
pub mod http;
pub mod jitter;
pub mod kafka;
pub mod model;
pub mod retry;
pub mod shutdown;
pub mod sleeper;
pub mod supervisor;

pub use broker::{FetchedMessage, LogConsumer, LogProducer, TopicAdministrator, TopicSpec};
pub use clock::{Clock, MonotonicClock};
pub use config::{Config, DestinationConfig, RequiredAcks};
pub use consumer_worker::ConsumerWorker;
pub use destination::{Destination, DestinationInvoker};
pub use error::{
    CommitError, ConfigError, FetchError, IngressError, InvokeError, ProducerError, TopicError,
};
pub use model::{Event, LogMessage};
pub use retry::{RetryConfig, RetryEngine, RetryExhausted};
pub use sleeper::{InstantSleeper, Sleeper, TokioSleeper, TrackingSleeper};
