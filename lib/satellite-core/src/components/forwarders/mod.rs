//! Forwarder component basics.

use async_trait::async_trait;
use satellite_error::GenericError;
use snafu::Snafu;

use crate::{
    connection::{Connection, ConnectionKind},
    data_model::event::{Event, EventType},
};

/// The names a forwarder is known by.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Identity {
    /// Stable machine name, used to refer to the forwarder in configuration.
    pub name: &'static str,

    /// Human-readable display name.
    pub show_name: &'static str,
}

/// A forwarder error.
#[derive(Debug, Snafu)]
#[snafu(context(suffix(false)), visibility(pub))]
pub enum ForwarderError {
    /// The connection lent during setup is not the kind this forwarder works with.
    #[snafu(display(
        "Forwarder '{}' only accepts a {} connection, but received a {} connection.",
        forwarder,
        expected,
        actual
    ))]
    UnsupportedConnectionKind {
        /// Name of the forwarder.
        forwarder: &'static str,

        /// Connection kind the forwarder supports.
        expected: ConnectionKind,

        /// Connection kind that was received.
        actual: ConnectionKind,
    },

    /// The publisher could not be created from the lent connection.
    #[snafu(display("Failed to initialize publisher: {}", source))]
    PublisherInitialization {
        /// Error source.
        source: GenericError,
    },

    /// The routing cache could not be created.
    #[snafu(display("Failed to initialize routing cache: {}", source))]
    RoutingCacheInitialization {
        /// Error source.
        source: GenericError,
    },

    /// The forwarder was used before it was successfully prepared.
    #[snafu(display("Forwarder has not been prepared."))]
    NotPrepared,

    /// An event in the batch carries a payload kind this forwarder does not handle.
    #[snafu(display(
        "Event at index {} carries a {} payload, but only {} payloads are supported.",
        index,
        actual,
        expected
    ))]
    UnsupportedPayloadKind {
        /// Position of the offending event in its batch.
        index: usize,

        /// Payload kinds the forwarder supports.
        expected: EventType,

        /// Payload kind that was received.
        actual: EventType,
    },

    /// An event payload could not be encoded.
    #[snafu(display("Failed to encode payload of event at index {}: {}", index, source))]
    Encoding {
        /// Position of the offending event in its batch.
        index: usize,

        /// Error source.
        source: GenericError,
    },

    /// The broker rejected the batch, or did not acknowledge it.
    #[snafu(display("Failed to synchronously deliver batch: {}", source))]
    DeliverySyncFailure {
        /// Error source, as reported by the broker client.
        source: GenericError,
    },

    /// The requested operation is not supported by this forwarder.
    #[snafu(display("Forwarder does not support {}.", operation))]
    UnsupportedOperation {
        /// Name of the unsupported operation.
        operation: &'static str,
    },
}

/// A forwarder.
///
/// Forwarders are the final step in the pipeline, where batches of events are converted into the wire format of an
/// external system and sent to it. The host pipeline calls [`prepare`][Forwarder::prepare] once with the connection it
/// established for the forwarder, and from then on may call [`forward`][Forwarder::forward] concurrently from multiple
/// workers, each with an independent batch.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Returns the names this forwarder is known by.
    fn identity(&self) -> Identity;

    /// Returns a human-readable description of the forwarder.
    fn description(&self) -> &'static str;

    /// Returns the default configuration document, in YAML.
    fn default_configuration(&self) -> &'static str;

    /// Prepares the forwarder using the given connection.
    ///
    /// The connection is lent, not owned: the forwarder may derive its own handles from it but must not close it.
    ///
    /// # Errors
    ///
    /// If the connection is not of a supported kind, or the forwarder cannot initialize its publishing resources, an
    /// error is returned and the forwarder must not be used.
    fn prepare(&mut self, connection: &Connection) -> Result<(), ForwarderError>;

    /// Forwards a batch of events, returning once the external system has acknowledged all of them.
    ///
    /// # Errors
    ///
    /// If any event cannot be converted, nothing from the batch is sent and an error is returned. If the external
    /// system fails to acknowledge the batch, its error is returned as-is.
    async fn forward(&self, batch: &[Event]) -> Result<(), ForwarderError>;

    /// Returns the event types this forwarder accepts.
    fn forwarded_type(&self) -> EventType;

    /// Forwards a single event and waits for the external system's response.
    ///
    /// # Errors
    ///
    /// If the forwarder does not support request/response forwarding, or forwarding fails, an error is returned.
    async fn sync_forward(&self, event: &Event) -> Result<Event, ForwarderError>;

    /// Returns `true` if this forwarder supports [`sync_forward`][Forwarder::sync_forward].
    fn supports_sync_forward(&self) -> bool;
}
