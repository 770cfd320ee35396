//! Kafka client backed by `librdkafka`.

use std::{collections::HashMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use futures::future::join_all;
use rdkafka::{
    producer::{FutureProducer, FutureRecord, Producer as _},
    ClientConfig,
};
use satellite_config::GenericConfiguration;
use satellite_core::connection::{Connection, KafkaClient, KafkaConnection, ProducerMessage, SyncProducer};
use satellite_error::{ErrorContext as _, GenericError};
use serde::Deserialize;
use tracing::debug;

fn default_brokers() -> Vec<String> {
    vec!["127.0.0.1:9092".to_string()]
}

fn default_client_id() -> String {
    "skywalking-satellite".to_string()
}

const fn default_delivery_timeout_secs() -> u64 {
    30
}

const fn default_queue_timeout_secs() -> u64 {
    5
}

const fn default_metadata_timeout_secs() -> u64 {
    10
}

/// Acknowledgement level required from the broker before a message counts as delivered.
///
/// There is no level without acknowledgement: a send only completes once the broker has confirmed it.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RequiredAcks {
    /// Wait for the partition leader only.
    #[default]
    Leader,

    /// Wait for all in-sync replicas.
    All,
}

impl RequiredAcks {
    fn as_rdkafka_str(&self) -> &'static str {
        match self {
            Self::Leader => "1",
            Self::All => "all",
        }
    }
}

/// Compression codec applied to produced messages.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// No compression.
    #[default]
    None,

    /// Gzip.
    Gzip,

    /// Snappy.
    Snappy,

    /// LZ4.
    Lz4,

    /// Zstandard.
    Zstd,
}

impl Compression {
    fn as_rdkafka_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Snappy => "snappy",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }
}

/// Kafka client configuration.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct KafkaClientConfiguration {
    /// Bootstrap brokers, as `host:port` pairs.
    ///
    /// Defaults to `127.0.0.1:9092`.
    #[serde(default = "default_brokers")]
    brokers: Vec<String>,

    /// Client identifier reported to the brokers.
    ///
    /// Defaults to `skywalking-satellite`.
    #[serde(default = "default_client_id")]
    client_id: String,

    /// Acknowledgement level required for a message to be considered delivered.
    ///
    /// Defaults to `leader`.
    #[serde(default)]
    required_acks: RequiredAcks,

    /// Compression codec.
    ///
    /// Defaults to `none`.
    #[serde(default)]
    compression: Compression,

    /// Upper bound on the time a message may take to be delivered, retries included, in seconds.
    ///
    /// Defaults to 30 seconds.
    #[serde(default = "default_delivery_timeout_secs")]
    delivery_timeout_secs: u64,

    /// How long to wait for room in the producer's local queue before failing a send, in seconds.
    ///
    /// Defaults to 5 seconds.
    #[serde(default = "default_queue_timeout_secs")]
    queue_timeout_secs: u64,

    /// How long to wait for cluster metadata when creating producers, in seconds.
    ///
    /// Defaults to 10 seconds.
    #[serde(default = "default_metadata_timeout_secs")]
    metadata_timeout_secs: u64,

    /// Additional `librdkafka` properties, applied last.
    #[serde(default)]
    properties: HashMap<String, String>,
}

impl KafkaClientConfiguration {
    /// Creates a new `KafkaClientConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized, or lists no brokers, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        let client_config: Self = config.as_typed()?;
        if client_config.brokers.is_empty() {
            return Err(GenericError::msg("At least one Kafka broker must be configured."));
        }

        Ok(client_config)
    }

    /// Converts this configuration into the equivalent `librdkafka` client configuration.
    pub fn to_rdkafka_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.brokers.join(","))
            .set("client.id", &self.client_id)
            .set("acks", self.required_acks.as_rdkafka_str())
            .set("compression.type", self.compression.as_rdkafka_str())
            .set("message.timeout.ms", self.delivery_timeout_secs.saturating_mul(1000).to_string());

        for (key, value) in &self.properties {
            config.set(key, value);
        }

        config
    }

    /// Establishes a Kafka connection from this configuration.
    ///
    /// # Errors
    ///
    /// If the underlying producer cannot be created, an error is returned.
    pub fn connect(&self) -> Result<Connection, GenericError> {
        let producer: FutureProducer = self
            .to_rdkafka_config()
            .create()
            .error_context("Failed to create Kafka producer.")?;

        debug!(brokers = %self.brokers.join(","), client_id = %self.client_id, "Created Kafka client.");

        let client = RdKafkaClient {
            producer,
            queue_timeout: Duration::from_secs(self.queue_timeout_secs),
            metadata_timeout: Duration::from_secs(self.metadata_timeout_secs),
        };
        Ok(Connection::Kafka(KafkaConnection::new(client)))
    }
}

impl Default for KafkaClientConfiguration {
    fn default() -> Self {
        Self {
            brokers: default_brokers(),
            client_id: default_client_id(),
            required_acks: RequiredAcks::default(),
            compression: Compression::default(),
            delivery_timeout_secs: default_delivery_timeout_secs(),
            queue_timeout_secs: default_queue_timeout_secs(),
            metadata_timeout_secs: default_metadata_timeout_secs(),
            properties: HashMap::new(),
        }
    }
}

struct RdKafkaClient {
    producer: FutureProducer,
    queue_timeout: Duration,
    metadata_timeout: Duration,
}

impl KafkaClient for RdKafkaClient {
    fn sync_producer(&self) -> Result<Arc<dyn SyncProducer>, GenericError> {
        // Blocks until the cluster answers or the metadata timeout elapses.
        let metadata = self.producer.client().fetch_metadata(None, self.metadata_timeout)?;
        debug!(brokers = metadata.brokers().len(), "Fetched Kafka cluster metadata.");

        Ok(Arc::new(RdKafkaSyncProducer {
            producer: self.producer.clone(),
            queue_timeout: self.queue_timeout,
        }))
    }
}

struct RdKafkaSyncProducer {
    producer: FutureProducer,
    queue_timeout: Duration,
}

#[async_trait]
impl SyncProducer for RdKafkaSyncProducer {
    async fn send_messages(&self, messages: &[ProducerMessage]) -> Result<(), GenericError> {
        let deliveries = messages.iter().map(|message| {
            let record = FutureRecord::<(), [u8]>::to(message.topic()).payload(message.value().as_ref());
            self.producer.send(record, self.queue_timeout)
        });

        for delivery in join_all(deliveries).await {
            if let Err((e, _)) = delivery {
                return Err(e.into());
            }
        }

        Ok(())
    }
}
