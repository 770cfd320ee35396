//! Component implementations.
//!
//! This crate contains the payload encoders, broker clients, and forwarders that make up the forwarding plane.

#![deny(warnings)]
#![deny(missing_docs)]

#[cfg(feature = "kafka")]
pub mod clients;
mod common;
pub mod encoders;
pub mod forwarders;
