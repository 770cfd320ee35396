//! Data model.

pub mod event;
