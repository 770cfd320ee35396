//! Common primitives shared by the forwarding components.
#![deny(warnings)]
#![deny(missing_docs)]

pub mod cache;
pub mod hash;
