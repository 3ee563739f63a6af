//! Environment-driven configuration, loaded once at startup (§2a, §6).

use crate::error::ConfigError;
use crate::retry::RetryConfig;
use std::time::Duration;

/// One destination as named in the environment-adjacent, in-process destination list
/// (§6: destinations are compiled-in, not loaded from the environment themselves).
#[derive(Debug, Clone)]
pub struct DestinationConfig {
    pub name: String,
}

/// Producer acknowledgement level (§4.2): `all` waits for every in-sync replica,
/// `leader-only` waits only for the partition leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredAcks {
    All,
    LeaderOnly,
}

impl RequiredAcks {
    /// The value librdkafka's `acks` client config expects.
    pub fn as_librdkafka_str(&self) -> &'static str {
        match self {
            RequiredAcks::All => "all",
            RequiredAcks::LeaderOnly => "1",
        }
    }
}

impl std::str::FromStr for RequiredAcks {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "all" => Ok(RequiredAcks::All),
            "leader-only" => Ok(RequiredAcks::LeaderOnly),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub topic: String,
    pub broker_address: String,
    pub partitions: u32,
    pub replication_factor: u16,
    pub retention_hours: u32,
    pub destination_timeout: Duration,
    pub required_acks: RequiredAcks,
    pub retry: RetryConfig,
    pub destinations: Vec<DestinationConfig>,
}

impl Config {
    /// Loads configuration from the process environment. Missing required variables
    /// or unparseable values abort with a descriptive [`ConfigError`] rather than
    /// silently falling back, matching the topic administrator's "refuse to run
    /// rather than run wrong" posture (§2a).
    pub fn from_env(destinations: Vec<DestinationConfig>) -> Result<Self, ConfigError> {
        Ok(Self {
            port: parse_optional("PORT", 8080)?,
            topic: optional("TOPIC", "events"),
            broker_address: required("BROKER_ADDRESS")?,
            partitions: parse_optional("TOPIC_PARTITIONS", 10)?,
            replication_factor: parse_optional("TOPIC_REPLICATION_FACTOR", 1)?,
            retention_hours: parse_optional("TOPIC_RETENTION_HOURS", 24)?,
            destination_timeout: Duration::from_millis(parse_optional("DESTINATION_TIMEOUT_MS", 2_000)?),
            required_acks: parse_optional("REQUIRED_ACKS", RequiredAcks::All)?,
            retry: RetryConfig {
                initial_interval: Duration::from_millis(parse_optional("RETRY_INITIAL_INTERVAL_MS", 250)?),
                multiplier: parse_optional("RETRY_MULTIPLIER", 1.5)?,
                randomization_factor: parse_optional("RETRY_RANDOMIZATION_FACTOR", 0.5)?,
                max_interval: Duration::from_millis(parse_optional("RETRY_MAX_INTERVAL_MS", 900)?),
                max_elapsed_time: Duration::from_millis(parse_optional(
                    "RETRY_MAX_ELAPSED_TIME_MS",
                    15_000,
                )?),
                max_retries: parse_optional("RETRY_MAX_RETRIES", 3)?,
            },
            destinations,
        })
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::Missing(name.to_string()))
}

fn optional(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_optional<T: std::str::FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name: name.to_string(), value }),
        Err(_) => Ok(default),
    }
}
