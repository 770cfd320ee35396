//! Broker clients.
//!
//! Clients own the long-lived connection to an external system and lend it to forwarders as a
//! [`Connection`][satellite_core::connection::Connection].

pub mod kafka;
