//! Broker connections.
//!
//! Client components establish connections to external systems and lend them to forwarders during setup. Since a
//! forwarder only works with one kind of broker, connections are modeled as a tagged enum: the forwarder matches on the
//! variant it supports once, in `prepare`, and rejects everything else with a typed error.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use bytes::Bytes;
use satellite_error::GenericError;

/// The kind of a [`Connection`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ConnectionKind {
    /// Kafka client.
    Kafka,

    /// gRPC channel.
    Grpc,
}

impl ConnectionKind {
    /// Returns a stable, human-readable name for this kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConnectionKind::Kafka => "kafka client",
            ConnectionKind::Grpc => "grpc channel",
        }
    }
}

impl fmt::Display for ConnectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An established connection to an external system.
#[derive(Clone, Debug)]
pub enum Connection {
    /// A Kafka client.
    Kafka(KafkaConnection),

    /// A gRPC channel.
    Grpc(GrpcConnection),
}

impl Connection {
    /// Gets the kind of this connection.
    pub fn kind(&self) -> ConnectionKind {
        match self {
            Connection::Kafka(_) => ConnectionKind::Kafka,
            Connection::Grpc(_) => ConnectionKind::Grpc,
        }
    }
}

impl From<KafkaConnection> for Connection {
    fn from(connection: KafkaConnection) -> Self {
        Connection::Kafka(connection)
    }
}

impl From<GrpcConnection> for Connection {
    fn from(connection: GrpcConnection) -> Self {
        Connection::Grpc(connection)
    }
}

/// A message to publish to a Kafka topic.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProducerMessage {
    topic: Arc<str>,
    value: Bytes,
}

impl ProducerMessage {
    /// Creates a new `ProducerMessage` for the given topic and value.
    pub fn new(topic: Arc<str>, value: Bytes) -> Self {
        Self { topic, value }
    }

    /// Returns the destination topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the message value.
    pub fn value(&self) -> &Bytes {
        &self.value
    }
}

/// A producer that publishes messages synchronously.
///
/// "Synchronous" here means that a send does not complete until the broker has acknowledged every message in it, or
/// until delivery has terminally failed. Retries, partitioning, batching on the wire, and compression are all the
/// producer's own concern.
#[async_trait]
pub trait SyncProducer: Send + Sync {
    /// Sends the given messages, waiting until all of them are acknowledged.
    ///
    /// # Errors
    ///
    /// If any message is rejected, or is not acknowledged before the producer's own delivery timeout, an error is
    /// returned. Whether other messages in the same call were delivered is unspecified.
    async fn send_messages(&self, messages: &[ProducerMessage]) -> Result<(), GenericError>;
}

/// A Kafka client capable of creating producers.
pub trait KafkaClient: Send + Sync {
    /// Creates a synchronous producer that shares this client's connection.
    ///
    /// # Errors
    ///
    /// If the producer cannot be created, such as when negotiation with the broker fails, an error is returned.
    fn sync_producer(&self) -> Result<Arc<dyn SyncProducer>, GenericError>;
}

/// A shared handle to an established Kafka client.
#[derive(Clone)]
pub struct KafkaConnection {
    client: Arc<dyn KafkaClient>,
}

impl KafkaConnection {
    /// Creates a new `KafkaConnection` from the given client.
    pub fn new<C>(client: C) -> Self
    where
        C: KafkaClient + 'static,
    {
        Self {
            client: Arc::new(client),
        }
    }

    /// Creates a new `KafkaConnection` from an already-shared client.
    pub fn from_shared(client: Arc<dyn KafkaClient>) -> Self {
        Self { client }
    }

    /// Creates a synchronous producer bound to this connection.
    ///
    /// # Errors
    ///
    /// If the producer cannot be created, an error is returned.
    pub fn sync_producer(&self) -> Result<Arc<dyn SyncProducer>, GenericError> {
        self.client.sync_producer()
    }
}

impl fmt::Debug for KafkaConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KafkaConnection").finish_non_exhaustive()
    }
}

/// A handle to an established gRPC channel.
#[derive(Clone, Debug)]
pub struct GrpcConnection {
    target: String,
}

impl GrpcConnection {
    /// Creates a new `GrpcConnection` for the given target address.
    pub fn new<S: Into<String>>(target: S) -> Self {
        Self { target: target.into() }
    }

    /// Returns the target address of the channel.
    pub fn target(&self) -> &str {
        &self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoopProducer;

    #[async_trait]
    impl SyncProducer for NoopProducer {
        async fn send_messages(&self, _: &[ProducerMessage]) -> Result<(), GenericError> {
            Ok(())
        }
    }

    struct NoopClient;

    impl KafkaClient for NoopClient {
        fn sync_producer(&self) -> Result<Arc<dyn SyncProducer>, GenericError> {
            Ok(Arc::new(NoopProducer))
        }
    }

    #[test]
    fn connection_kind() {
        let kafka = Connection::from(KafkaConnection::new(NoopClient));
        assert_eq!(kafka.kind(), ConnectionKind::Kafka);
        assert_eq!(kafka.kind().to_string(), "kafka client");

        let grpc = Connection::from(GrpcConnection::new("127.0.0.1:11800"));
        assert_eq!(grpc.kind(), ConnectionKind::Grpc);
        assert_eq!(grpc.kind().to_string(), "grpc channel");
    }

    #[tokio::test]
    async fn producer_from_connection() {
        let connection = KafkaConnection::new(NoopClient);
        let producer = connection.sync_producer().unwrap();

        let message = ProducerMessage::new(Arc::from("skywalking-meters"), Bytes::from_static(&[0x01]));
        producer.send_messages(&[message]).await.unwrap();
    }
}
