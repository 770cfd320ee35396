use std::{
    num::{NonZeroU64, NonZeroUsize},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use satellite_common::cache::{Cache, CacheBuilder};
use satellite_config::GenericConfiguration;
use satellite_core::{
    components::forwarders::*,
    connection::{Connection, ConnectionKind, ProducerMessage},
    data_model::event::{meter::MeterData, Event, EventData, EventType},
};
use satellite_error::{generic_error, GenericError};
use serde::Deserialize;
use snafu::{OptionExt as _, ResultExt as _};
use tracing::{debug, trace};

use crate::{
    common::{kafka::SyncPublisher, telemetry::ComponentTelemetry},
    encoders::{PayloadEncoder, ProtobufEncoder},
};

mod routing;
pub use self::routing::{RoutingDecision, ServiceInstanceKey};

const NAME: &str = "nativemeter-kafka-forwarder";
const ROUTING_CACHE_ID: &str = "nativemeter-kafka-forwarder/routing_rules";
const SHOW_NAME: &str = "Native Meter Kafka Forwarder";
const DESCRIPTION: &str = "This is a synchronization Kafka forwarder with the SkyWalking native meter protocol.";
const DEFAULT_CONFIGURATION: &str = r#"
# The remote topic.
topic: "skywalking-meters"
"#;

const fn default_routing_rule_lru_cache_size() -> NonZeroUsize {
    match NonZeroUsize::new(5000) {
        Some(size) => size,
        None => NonZeroUsize::MIN,
    }
}

const fn default_routing_rule_lru_cache_ttl() -> NonZeroU64 {
    match NonZeroU64::new(180) {
        Some(ttl) => ttl,
        None => NonZeroU64::MIN,
    }
}

fn default_topic() -> String {
    "skywalking-meters".to_string()
}

/// Native meter Kafka forwarder configuration.
///
/// Publishes native meter samples to a Kafka topic, one message per sample, encoded with the native meter Protocol
/// Buffers schema.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NativeMeterKafkaForwarderConfiguration {
    /// Maximum number of entries held by the per-service-instance routing cache.
    ///
    /// Defaults to 5000.
    #[serde(default = "default_routing_rule_lru_cache_size")]
    routing_rule_lru_cache_size: NonZeroUsize,

    /// How long a routing cache entry stays valid, in seconds.
    ///
    /// Defaults to 180 seconds.
    #[serde(default = "default_routing_rule_lru_cache_ttl")]
    routing_rule_lru_cache_ttl: NonZeroU64,

    /// The topic that meter samples are published to.
    ///
    /// Defaults to `skywalking-meters`.
    #[serde(default = "default_topic")]
    topic: String,
}

impl NativeMeterKafkaForwarderConfiguration {
    /// Creates a new `NativeMeterKafkaForwarderConfiguration` from the given configuration.
    ///
    /// # Errors
    ///
    /// If the configuration cannot be deserialized, or holds an empty topic, an error is returned.
    pub fn from_configuration(config: &GenericConfiguration) -> Result<Self, GenericError> {
        let forwarder_config: Self = config.as_typed()?;
        if forwarder_config.topic.is_empty() {
            return Err(generic_error!("Forwarder topic must not be empty."));
        }

        Ok(forwarder_config)
    }

    /// Returns the topic that meter samples are published to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the maximum number of entries held by the routing cache.
    pub fn routing_rule_lru_cache_size(&self) -> NonZeroUsize {
        self.routing_rule_lru_cache_size
    }

    /// Returns how long a routing cache entry stays valid.
    pub fn routing_rule_lru_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.routing_rule_lru_cache_ttl.get())
    }

    /// Builds a forwarder that encodes meter samples with their Protocol Buffers schema.
    pub fn build(&self) -> NativeMeterKafkaForwarder {
        self.build_with_encoder(ProtobufEncoder)
    }

    /// Builds a forwarder that encodes meter samples with the given encoder.
    pub fn build_with_encoder<E>(&self, encoder: E) -> NativeMeterKafkaForwarder<E>
    where
        E: PayloadEncoder<MeterData>,
    {
        NativeMeterKafkaForwarder {
            topic: Arc::from(self.topic.as_str()),
            config: self.clone(),
            encoder,
            telemetry: ComponentTelemetry::from_component_id(NAME),
            prepared: None,
        }
    }
}

impl Default for NativeMeterKafkaForwarderConfiguration {
    fn default() -> Self {
        Self {
            routing_rule_lru_cache_size: default_routing_rule_lru_cache_size(),
            routing_rule_lru_cache_ttl: default_routing_rule_lru_cache_ttl(),
            topic: default_topic(),
        }
    }
}

struct Prepared {
    publisher: SyncPublisher,
    routing_cache: Cache<ServiceInstanceKey, RoutingDecision>,
}

/// Native meter Kafka forwarder.
///
/// Each meter event in a batch becomes one Kafka message on the configured topic, and a batch is only considered
/// forwarded once the broker has acknowledged every message in it.
pub struct NativeMeterKafkaForwarder<E = ProtobufEncoder> {
    config: NativeMeterKafkaForwarderConfiguration,
    topic: Arc<str>,
    encoder: E,
    telemetry: ComponentTelemetry,
    prepared: Option<Prepared>,
}

impl<E> NativeMeterKafkaForwarder<E> {
    /// Returns the per-service-instance routing cache.
    ///
    /// The cache is created during preparation, sized and expired according to the configuration, and is not consulted
    /// when forwarding: every message goes to the configured topic. If the forwarder has not been prepared, `None` is
    /// returned.
    pub fn routing_cache(&self) -> Option<&Cache<ServiceInstanceKey, RoutingDecision>> {
        self.prepared.as_ref().map(|prepared| &prepared.routing_cache)
    }

    /// Returns `true` if the forwarder has been successfully prepared.
    pub fn is_prepared(&self) -> bool {
        self.prepared.is_some()
    }
}

impl<E> NativeMeterKafkaForwarder<E>
where
    E: PayloadEncoder<MeterData>,
{
    fn build_messages(&self, batch: &[Event]) -> Result<Vec<ProducerMessage>, ForwarderError> {
        let mut messages = Vec::with_capacity(batch.len());
        for (index, event) in batch.iter().enumerate() {
            let meter = match event.data() {
                EventData::Meter(meter) => meter,
                other => {
                    return UnsupportedPayloadKind {
                        index,
                        expected: EventType::Meter,
                        actual: other.event_type(),
                    }
                    .fail()
                }
            };

            let value = self.encoder.encode(meter).context(Encoding { index })?;
            messages.push(ProducerMessage::new(Arc::clone(&self.topic), value));
        }

        Ok(messages)
    }
}

#[async_trait]
impl<E> Forwarder for NativeMeterKafkaForwarder<E>
where
    E: PayloadEncoder<MeterData>,
{
    fn identity(&self) -> Identity {
        Identity {
            name: NAME,
            show_name: SHOW_NAME,
        }
    }

    fn description(&self) -> &'static str {
        DESCRIPTION
    }

    fn default_configuration(&self) -> &'static str {
        DEFAULT_CONFIGURATION
    }

    fn prepare(&mut self, connection: &Connection) -> Result<(), ForwarderError> {
        let kafka = match connection {
            Connection::Kafka(kafka) => kafka,
            other => {
                return UnsupportedConnectionKind {
                    forwarder: NAME,
                    expected: ConnectionKind::Kafka,
                    actual: other.kind(),
                }
                .fail()
            }
        };

        let publisher = SyncPublisher::from_connection(kafka).context(PublisherInitialization)?;
        let routing_cache = CacheBuilder::from_identifier(ROUTING_CACHE_ID)
            .context(RoutingCacheInitialization)?
            .with_capacity(self.config.routing_rule_lru_cache_size())
            .with_time_to_live(Some(self.config.routing_rule_lru_cache_ttl()))
            .build();

        debug!(
            topic = %self.topic,
            routing_cache_size = self.config.routing_rule_lru_cache_size().get(),
            routing_cache_ttl_secs = self.config.routing_rule_lru_cache_ttl().as_secs(),
            "Prepared forwarder."
        );

        self.prepared = Some(Prepared {
            publisher,
            routing_cache,
        });
        Ok(())
    }

    async fn forward(&self, batch: &[Event]) -> Result<(), ForwarderError> {
        let prepared = self.prepared.as_ref().context(NotPrepared)?;
        if batch.is_empty() {
            return Ok(());
        }

        let messages = self.build_messages(batch).inspect_err(|_| self.telemetry.track_failed_batch())?;

        prepared
            .publisher
            .send_sync(&messages)
            .await
            .inspect_err(|_| self.telemetry.track_failed_batch())
            .context(DeliverySyncFailure)?;

        trace!(events = batch.len(), topic = %self.topic, "Forwarded batch.");
        self.telemetry.track_forwarded_batch(batch.len());
        Ok(())
    }

    fn forwarded_type(&self) -> EventType {
        EventType::Meter
    }

    async fn sync_forward(&self, _event: &Event) -> Result<Event, ForwarderError> {
        UnsupportedOperation {
            operation: "synchronous forwarding",
        }
        .fail()
    }

    fn supports_sync_forward(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bytes::Bytes;
    use metrics::{SharedString, Unit};
    use metrics_util::{
        debugging::{DebugValue, DebuggingRecorder},
        CompositeKey,
    };
    use prost::Message as _;
    use satellite_config::ConfigurationLoader;
    use satellite_core::{
        connection::{GrpcConnection, KafkaClient, KafkaConnection, SyncProducer},
        data_model::event::meter::{meter_data::Metric, MeterSingleValue},
    };

    use super::*;

    #[derive(Default)]
    struct RecordingProducer {
        batches: Mutex<Vec<Vec<ProducerMessage>>>,
    }

    impl RecordingProducer {
        fn batches(&self) -> Vec<Vec<ProducerMessage>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SyncProducer for RecordingProducer {
        async fn send_messages(&self, messages: &[ProducerMessage]) -> Result<(), GenericError> {
            self.batches.lock().unwrap().push(messages.to_vec());
            Ok(())
        }
    }

    struct RejectingProducer;

    #[async_trait]
    impl SyncProducer for RejectingProducer {
        async fn send_messages(&self, _: &[ProducerMessage]) -> Result<(), GenericError> {
            Err(generic_error!("Broker: Not enough in-sync replicas"))
        }
    }

    struct StaticClient(Arc<dyn SyncProducer>);

    impl KafkaClient for StaticClient {
        fn sync_producer(&self) -> Result<Arc<dyn SyncProducer>, GenericError> {
            Ok(Arc::clone(&self.0))
        }
    }

    struct BrokenClient;

    impl KafkaClient for BrokenClient {
        fn sync_producer(&self) -> Result<Arc<dyn SyncProducer>, GenericError> {
            Err(generic_error!("Broker: Unsupported version"))
        }
    }

    /// Encodes a meter as the raw bytes of its service name.
    struct ServiceBytesEncoder;

    impl PayloadEncoder<MeterData> for ServiceBytesEncoder {
        fn encode(&self, payload: &MeterData) -> Result<Bytes, GenericError> {
            Ok(Bytes::copy_from_slice(payload.service.as_bytes()))
        }
    }

    /// Refuses to encode meters without a service instance.
    struct StrictEncoder;

    impl PayloadEncoder<MeterData> for StrictEncoder {
        fn encode(&self, payload: &MeterData) -> Result<Bytes, GenericError> {
            if payload.service_instance.is_empty() {
                return Err(generic_error!("missing service instance"));
            }
            Ok(Bytes::from(payload.encode_to_vec()))
        }
    }

    fn recording_connection() -> (Connection, Arc<RecordingProducer>) {
        let producer = Arc::new(RecordingProducer::default());
        let connection = Connection::from(KafkaConnection::new(StaticClient(producer.clone())));
        (connection, producer)
    }

    fn meter(service: &str, service_instance: &str) -> MeterData {
        MeterData {
            metric: Some(Metric::SingleValue(MeterSingleValue {
                name: "instance_jvm_thread_live_count".to_string(),
                labels: vec![],
                value: 42.0,
            })),
            service: service.to_string(),
            service_instance: service_instance.to_string(),
            timestamp: 1_700_000_000_000,
        }
    }

    fn meter_event(service: &str, service_instance: &str) -> Event {
        Event::from_meter(meter(service, service_instance))
    }

    type MetricEntry = (CompositeKey, Option<Unit>, Option<SharedString>, DebugValue);
    type Snapshot = [MetricEntry];

    fn find_metric<'a>(metrics: &'a Snapshot, key: &str) -> &'a MetricEntry {
        metrics
            .iter()
            .find(|(k, _, _, _)| k.key().name() == key)
            .unwrap_or_else(|| panic!("no metric found with key: {}", key))
    }

    fn get_counter_value(metrics: &Snapshot, key: &str) -> u64 {
        match &find_metric(metrics, key).3 {
            DebugValue::Counter(value) => *value,
            other => panic!("expected a counter, got: {:?}", other),
        }
    }

    fn get_label_value(metrics: &Snapshot, key: &str, label: &str) -> String {
        find_metric(metrics, key)
            .0
            .key()
            .labels()
            .find(|l| l.key() == label)
            .map(|l| l.value().to_string())
            .unwrap_or_else(|| panic!("metric {} has no label {}", key, label))
    }

    fn log_event() -> Event {
        Event::from_data(EventData::Log(Bytes::from_static(b"log line")))
    }

    #[test]
    fn configuration_defaults() {
        let config =
            NativeMeterKafkaForwarderConfiguration::from_configuration(&GenericConfiguration::empty()).unwrap();

        assert_eq!(config, NativeMeterKafkaForwarderConfiguration::default());
        assert_eq!(config.topic(), "skywalking-meters");
        assert_eq!(config.routing_rule_lru_cache_size().get(), 5000);
        assert_eq!(config.routing_rule_lru_cache_ttl(), Duration::from_secs(180));
    }

    #[test]
    fn configuration_from_yaml() {
        let generic = ConfigurationLoader::default()
            .from_yaml_str(
                "forwarder.yaml",
                "topic: meters-eu\nrouting_rule_lru_cache_size: 10\nrouting_rule_lru_cache_ttl: 30\n",
            )
            .unwrap()
            .into_generic();

        let config = NativeMeterKafkaForwarderConfiguration::from_configuration(&generic).unwrap();
        assert_eq!(config.topic(), "meters-eu");
        assert_eq!(config.routing_rule_lru_cache_size().get(), 10);
        assert_eq!(config.routing_rule_lru_cache_ttl(), Duration::from_secs(30));
    }

    #[test]
    fn configuration_rejects_invalid_values() {
        for contents in [
            "topic: \"\"\n",
            "routing_rule_lru_cache_size: 0\n",
            "routing_rule_lru_cache_ttl: 0\n",
        ] {
            let generic = ConfigurationLoader::default()
                .from_yaml_str("forwarder.yaml", contents)
                .unwrap()
                .into_generic();

            assert!(
                NativeMeterKafkaForwarderConfiguration::from_configuration(&generic).is_err(),
                "accepted: {}",
                contents
            );
        }
    }

    #[test]
    fn default_configuration_parses_to_defaults() {
        let forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let generic = ConfigurationLoader::default()
            .from_yaml_str("default.yaml", forwarder.default_configuration())
            .unwrap()
            .into_generic();

        let config = NativeMeterKafkaForwarderConfiguration::from_configuration(&generic).unwrap();
        assert_eq!(config, NativeMeterKafkaForwarderConfiguration::default());
    }

    #[test]
    fn metadata() {
        let forwarder = NativeMeterKafkaForwarderConfiguration::default().build();

        assert_eq!(forwarder.identity().name, "nativemeter-kafka-forwarder");
        assert_eq!(forwarder.identity().show_name, "Native Meter Kafka Forwarder");
        assert_eq!(
            forwarder.description(),
            "This is a synchronization Kafka forwarder with the SkyWalking native meter protocol."
        );
        assert_eq!(forwarder.forwarded_type(), EventType::Meter);
        assert!(!forwarder.supports_sync_forward());
    }

    #[test]
    fn prepare_builds_routing_cache() {
        let generic = ConfigurationLoader::default()
            .from_yaml_str("forwarder.yaml", "routing_rule_lru_cache_size: 2\nrouting_rule_lru_cache_ttl: 60\n")
            .unwrap()
            .into_generic();
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::from_configuration(&generic)
            .unwrap()
            .build();
        assert!(forwarder.routing_cache().is_none());

        let (connection, _) = recording_connection();
        forwarder.prepare(&connection).unwrap();
        assert!(forwarder.is_prepared());

        let cache = forwarder.routing_cache().unwrap();
        assert_eq!(cache.capacity(), 2);
        assert_eq!(cache.time_to_live(), Some(Duration::from_secs(60)));
        assert!(cache.is_empty());

        let decision = RoutingDecision::for_topic(Arc::from("skywalking-meters"));
        cache.insert(ServiceInstanceKey::new("a", "a-1"), decision.clone());
        cache.insert(ServiceInstanceKey::new("b", "b-1"), decision.clone());
        cache.insert(ServiceInstanceKey::new("c", "c-1"), decision);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(&ServiceInstanceKey::new("a", "a-1")).is_none());
    }

    #[test]
    fn prepare_rejects_grpc_connection() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let connection = Connection::from(GrpcConnection::new("127.0.0.1:11800"));

        let error = forwarder.prepare(&connection).unwrap_err();
        assert!(matches!(
            error,
            ForwarderError::UnsupportedConnectionKind {
                expected: ConnectionKind::Kafka,
                actual: ConnectionKind::Grpc,
                ..
            }
        ));
        assert!(!forwarder.is_prepared());
    }

    #[test]
    fn prepare_surfaces_producer_creation_failure() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let connection = Connection::from(KafkaConnection::new(BrokenClient));

        let error = forwarder.prepare(&connection).unwrap_err();
        assert!(matches!(error, ForwarderError::PublisherInitialization { .. }));
        assert_eq!(error.to_string(), "Failed to initialize publisher: Broker: Unsupported version");
        assert!(!forwarder.is_prepared());
        assert!(forwarder.routing_cache().is_none());
    }

    #[tokio::test]
    async fn forward_before_prepare_fails() {
        let forwarder = NativeMeterKafkaForwarderConfiguration::default().build();

        let error = forwarder.forward(&[meter_event("orders", "orders-1")]).await.unwrap_err();
        assert!(matches!(error, ForwarderError::NotPrepared));
    }

    #[tokio::test]
    async fn forward_sends_one_message_per_event_in_order() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build_with_encoder(ServiceBytesEncoder);
        let (connection, producer) = recording_connection();
        forwarder.prepare(&connection).unwrap();

        let batch = [meter_event("\x01\x02", "a"), meter_event("\x03", "b")];
        forwarder.forward(&batch).await.unwrap();

        let batches = producer.batches();
        assert_eq!(batches.len(), 1);

        let sent = &batches[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].topic(), "skywalking-meters");
        assert_eq!(sent[0].value().as_ref(), &[0x01, 0x02]);
        assert_eq!(sent[1].topic(), "skywalking-meters");
        assert_eq!(sent[1].value().as_ref(), &[0x03]);
    }

    #[tokio::test]
    async fn forward_uses_protobuf_encoding() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let (connection, producer) = recording_connection();
        forwarder.prepare(&connection).unwrap();

        let sample = MeterData {
            service: "a".to_string(),
            ..Default::default()
        };
        forwarder.forward(&[Event::from_meter(sample)]).await.unwrap();

        let batches = producer.batches();
        similar_asserts::assert_eq!(batches[0][0].value().as_ref(), &[0x1a, 0x01, b'a']);
    }

    #[tokio::test]
    async fn forward_empty_batch_skips_broker() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let (connection, producer) = recording_connection();
        forwarder.prepare(&connection).unwrap();

        forwarder.forward(&[]).await.unwrap();
        assert!(producer.batches().is_empty());
    }

    #[tokio::test]
    async fn forward_rejects_non_meter_payload_without_sending() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let (connection, producer) = recording_connection();
        forwarder.prepare(&connection).unwrap();

        let batch = [meter_event("orders", "orders-1"), log_event(), meter_event("orders", "orders-2")];
        let error = forwarder.forward(&batch).await.unwrap_err();

        match error {
            ForwarderError::UnsupportedPayloadKind {
                index,
                expected,
                actual,
            } => {
                assert_eq!(index, 1);
                assert_eq!(expected, EventType::Meter);
                assert_eq!(actual, EventType::Log);
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(producer.batches().is_empty());
    }

    #[tokio::test]
    async fn forward_reports_first_encoding_failure() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build_with_encoder(StrictEncoder);
        let (connection, producer) = recording_connection();
        forwarder.prepare(&connection).unwrap();

        let batch = [
            meter_event("orders", "orders-1"),
            meter_event("orders", ""),
            meter_event("orders", ""),
        ];
        let error = forwarder.forward(&batch).await.unwrap_err();

        assert!(matches!(error, ForwarderError::Encoding { index: 1, .. }));
        assert_eq!(
            error.to_string(),
            "Failed to encode payload of event at index 1: missing service instance"
        );
        assert!(producer.batches().is_empty());
    }

    #[tokio::test]
    async fn forward_surfaces_broker_error() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let connection = Connection::from(KafkaConnection::new(StaticClient(Arc::new(RejectingProducer))));
        forwarder.prepare(&connection).unwrap();

        let error = forwarder.forward(&[meter_event("orders", "orders-1")]).await.unwrap_err();
        assert!(matches!(error, ForwarderError::DeliverySyncFailure { .. }));
        assert_eq!(
            error.to_string(),
            "Failed to synchronously deliver batch: Broker: Not enough in-sync replicas"
        );
    }

    #[tokio::test]
    async fn reprepare_replaces_publisher() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let (first, first_producer) = recording_connection();
        let (second, second_producer) = recording_connection();

        forwarder.prepare(&first).unwrap();
        forwarder.prepare(&second).unwrap();
        forwarder.forward(&[meter_event("orders", "orders-1")]).await.unwrap();

        assert!(first_producer.batches().is_empty());
        assert_eq!(second_producer.batches().len(), 1);
    }

    #[tokio::test]
    async fn sync_forward_is_unsupported() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let (connection, producer) = recording_connection();
        forwarder.prepare(&connection).unwrap();

        let error = forwarder.sync_forward(&meter_event("orders", "orders-1")).await.unwrap_err();
        assert!(matches!(error, ForwarderError::UnsupportedOperation { .. }));
        assert_eq!(error.to_string(), "Forwarder does not support synchronous forwarding.");
        assert!(producer.batches().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_forwarding() {
        let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
        let (connection, producer) = recording_connection();
        forwarder.prepare(&connection).unwrap();
        let forwarder = Arc::new(forwarder);

        let mut handles = Vec::new();
        for worker in 0..8 {
            let forwarder = Arc::clone(&forwarder);
            handles.push(tokio::spawn(async move {
                let batch = (0..16)
                    .map(|i| meter_event("orders", &format!("orders-{}-{}", worker, i)))
                    .collect::<Vec<_>>();
                forwarder.forward(&batch).await
            }));
        }

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let batches = producer.batches();
        assert_eq!(batches.len(), 8);
        assert!(batches.iter().all(|batch| batch.len() == 16));
    }

    #[tokio::test]
    async fn telemetry() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let (connection, _) = recording_connection();

        let forwarder = metrics::with_local_recorder(&recorder, || {
            let mut forwarder = NativeMeterKafkaForwarderConfiguration::default().build();
            forwarder.prepare(&connection).unwrap();
            forwarder
        });

        let batch = [meter_event("orders", "orders-1"), meter_event("orders", "orders-2")];
        forwarder.forward(&batch).await.unwrap();
        forwarder.forward(&[meter_event("orders", "orders-3"), log_event()]).await.unwrap_err();

        let metrics = snapshotter.snapshot().into_vec();
        assert_eq!(get_counter_value(&metrics, "forwarder_events_forwarded_total"), 2);
        assert_eq!(get_counter_value(&metrics, "forwarder_batches_forwarded_total"), 1);
        assert_eq!(get_counter_value(&metrics, "forwarder_batches_failed_total"), 1);
        assert_eq!(
            get_label_value(&metrics, "forwarder_batches_forwarded_total", "component_id"),
            "nativemeter-kafka-forwarder"
        );
        assert_eq!(
            get_label_value(&metrics, "cache_capacity", "cache_id"),
            "nativemeter-kafka-forwarder/routing_rules"
        );
    }
}
