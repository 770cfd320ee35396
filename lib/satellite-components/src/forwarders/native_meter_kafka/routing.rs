use std::sync::Arc;

use satellite_core::data_model::event::meter::MeterData;

/// Identifies the service instance a meter sample was reported by.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct ServiceInstanceKey {
    service: String,
    service_instance: String,
}

impl ServiceInstanceKey {
    /// Creates a new `ServiceInstanceKey`.
    pub fn new<S: Into<String>, I: Into<String>>(service: S, service_instance: I) -> Self {
        Self {
            service: service.into(),
            service_instance: service_instance.into(),
        }
    }

    /// Creates a new `ServiceInstanceKey` from the service fields of a meter sample.
    ///
    /// Samples after the first in an agent stream may leave the service name empty, in which case the key has an empty
    /// service name as well.
    pub fn from_meter(meter: &MeterData) -> Self {
        Self::new(meter.service.as_str(), meter.service_instance.as_str())
    }

    /// Returns the service name.
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the service instance name.
    pub fn service_instance(&self) -> &str {
        &self.service_instance
    }
}

/// Where messages for a given service instance should be published.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoutingDecision {
    topic: Arc<str>,
    partition: Option<i32>,
}

impl RoutingDecision {
    /// Creates a new `RoutingDecision` targeting the given topic, leaving partition selection to the producer.
    pub fn for_topic(topic: Arc<str>) -> Self {
        Self { topic, partition: None }
    }

    /// Pins the decision to a specific partition.
    pub fn with_partition(mut self, partition: i32) -> Self {
        self.partition = Some(partition);
        self
    }

    /// Returns the destination topic.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Returns the destination partition, if pinned.
    pub fn partition(&self) -> Option<i32> {
        self.partition
    }
}
