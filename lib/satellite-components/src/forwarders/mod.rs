//! Forwarder implementations.

mod native_meter_kafka;
pub use self::native_meter_kafka::{
    NativeMeterKafkaForwarder, NativeMeterKafkaForwarderConfiguration, RoutingDecision, ServiceInstanceKey,
};
