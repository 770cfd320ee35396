//! Component contracts.

pub mod forwarders;
