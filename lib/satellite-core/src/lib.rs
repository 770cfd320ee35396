//! Core primitives for the forwarding plane: the event data model, broker connection capabilities, and the
//! component contracts that forwarders implement.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod components;
pub mod connection;
pub mod data_model;
