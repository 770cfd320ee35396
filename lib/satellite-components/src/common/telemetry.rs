use metrics::{counter, Counter};

/// Component-specific telemetry.
///
/// Covers what a forwarder has handed off to its destination, labeled by the forwarder's name.
#[derive(Clone)]
pub struct ComponentTelemetry {
    events_forwarded: Counter,
    batches_forwarded: Counter,
    batches_failed: Counter,
}

impl ComponentTelemetry {
    /// Creates a new `ComponentTelemetry` for the given component.
    pub fn from_component_id(component_id: &'static str) -> Self {
        Self {
            events_forwarded: counter!("forwarder_events_forwarded_total", "component_id" => component_id),
            batches_forwarded: counter!("forwarder_batches_forwarded_total", "component_id" => component_id),
            batches_failed: counter!("forwarder_batches_failed_total", "component_id" => component_id),
        }
    }

    /// Tracks a batch that was acknowledged by the destination.
    pub fn track_forwarded_batch(&self, event_count: usize) {
        self.events_forwarded.increment(event_count as u64);
        self.batches_forwarded.increment(1);
    }

    /// Tracks a batch that could not be forwarded.
    pub fn track_failed_batch(&self) {
        self.batches_failed.increment(1);
    }
}
