use std::sync::Arc;

use satellite_core::connection::{KafkaConnection, ProducerMessage, SyncProducer};
use satellite_error::GenericError;
use tracing::trace;

/// Publishes message batches to Kafka, waiting for every message to be acknowledged.
///
/// The publisher holds its own producer handle derived from a lent [`KafkaConnection`], and can be cloned and used from
/// multiple tasks concurrently.
#[derive(Clone)]
pub struct SyncPublisher {
    producer: Arc<dyn SyncProducer>,
}

impl SyncPublisher {
    /// Creates a new `SyncPublisher` from the given connection.
    ///
    /// # Errors
    ///
    /// If the connection cannot create a producer, the client's error is returned unchanged.
    pub fn from_connection(connection: &KafkaConnection) -> Result<Self, GenericError> {
        let producer = connection.sync_producer()?;
        Ok(Self { producer })
    }

    /// Sends the given messages, returning once all of them have been acknowledged.
    ///
    /// Sending an empty batch never reaches the broker.
    ///
    /// # Errors
    ///
    /// If delivery fails, the producer's error is returned unchanged.
    pub async fn send_sync(&self, messages: &[ProducerMessage]) -> Result<(), GenericError> {
        if messages.is_empty() {
            return Ok(());
        }

        trace!(messages = messages.len(), "Sending batch to broker.");
        self.producer.send_messages(messages).await
    }
}
