//! Telemetry events.

use std::{collections::HashMap, fmt};

use bitmask_enum::bitmask;
use bytes::Bytes;

pub mod meter;
use self::meter::MeterData;

/// Telemetry event type.
///
/// This type is a bitmask, which means different event types can be combined together. This makes `EventType` mainly
/// useful for describing the kinds of events a component accepts.
#[bitmask(u8)]
#[bitmask_config(vec_debug)]
pub enum EventType {
    /// Native meters.
    Meter,

    /// Logs.
    Log,

    /// Trace segments.
    Segment,
}

impl Default for EventType {
    fn default() -> Self {
        Self::none()
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut types = Vec::new();

        if self.contains(Self::Meter) {
            types.push("Meter");
        }

        if self.contains(Self::Log) {
            types.push("Log");
        }

        if self.contains(Self::Segment) {
            types.push("Segment");
        }

        write!(f, "{}", types.join("|"))
    }
}

/// The typed payload of an event.
#[derive(Clone, Debug, PartialEq)]
pub enum EventData {
    /// A native meter sample.
    Meter(MeterData),

    /// A log record, already serialized by its producer.
    Log(Bytes),

    /// A trace segment, already serialized by its producer.
    Segment(Bytes),
}

impl EventData {
    /// Gets the type of this payload.
    pub fn event_type(&self) -> EventType {
        match self {
            EventData::Meter(_) => EventType::Meter,
            EventData::Log(_) => EventType::Log,
            EventData::Segment(_) => EventType::Segment,
        }
    }
}

/// A telemetry event.
///
/// Events wrap a typed payload with the envelope the pipeline attaches when data is received: a name, a receive
/// timestamp, free-form metadata, and whether the event arrived from a remote peer.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    name: String,
    timestamp: i64,
    meta: HashMap<String, String>,
    remote: bool,
    data: EventData,
}

impl Event {
    /// Creates a new `Event` wrapping the given payload.
    pub fn from_data(data: EventData) -> Self {
        Self {
            name: String::new(),
            timestamp: 0,
            meta: HashMap::new(),
            remote: false,
            data,
        }
    }

    /// Creates a new `Event` wrapping the given meter sample.
    pub fn from_meter(meter: MeterData) -> Self {
        Self::from_data(EventData::Meter(meter))
    }

    /// Sets the event name.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the event timestamp, in milliseconds since the Unix epoch.
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Adds a metadata entry.
    pub fn with_meta<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }

    /// Marks whether the event was received from a remote peer.
    pub fn with_remote(mut self, remote: bool) -> Self {
        self.remote = remote;
        self
    }

    /// Returns the event name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the event timestamp, in milliseconds since the Unix epoch.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Returns the metadata value for the given key, if present.
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Returns `true` if the event was received from a remote peer.
    pub fn is_remote(&self) -> bool {
        self.remote
    }

    /// Gets the type of this event.
    pub fn event_type(&self) -> EventType {
        self.data.event_type()
    }

    /// Returns a reference to the payload.
    pub fn data(&self) -> &EventData {
        &self.data
    }

    /// Returns a reference to the inner meter sample, if this event is a meter.
    ///
    /// Otherwise, `None` is returned.
    pub fn try_as_meter(&self) -> Option<&MeterData> {
        match &self.data {
            EventData::Meter(meter) => Some(meter),
            _ => None,
        }
    }

    /// Consumes the event, returning the payload.
    pub fn into_data(self) -> EventData {
        self.data
    }
}
