use metrics::{Counter, Gauge};

#[derive(Clone)]
pub(super) struct Telemetry {
    capacity: Gauge,
    current_items: Gauge,
    hits_total: Counter,
    misses_total: Counter,
    items_inserted_total: Counter,
    items_removed_total: Counter,
    items_evicted_total: Counter,
    items_expired_total: Counter,
}

impl Telemetry {
    pub fn new(cache_id: &str) -> Self {
        let cache_id = cache_id.to_string();

        Self {
            capacity: metrics::gauge!("cache_capacity", "cache_id" => cache_id.clone()),
            current_items: metrics::gauge!("cache_current_items", "cache_id" => cache_id.clone()),
            hits_total: metrics::counter!("cache_hits_total", "cache_id" => cache_id.clone()),
            misses_total: metrics::counter!("cache_misses_total", "cache_id" => cache_id.clone()),
            items_inserted_total: metrics::counter!("cache_items_inserted_total", "cache_id" => cache_id.clone()),
            items_removed_total: metrics::counter!("cache_items_removed_total", "cache_id" => cache_id.clone()),
            items_evicted_total: metrics::counter!("cache_items_evicted_total", "cache_id" => cache_id.clone()),
            items_expired_total: metrics::counter!("cache_items_expired_total", "cache_id" => cache_id),
        }
    }

    pub fn noop() -> Self {
        Self {
            capacity: Gauge::noop(),
            current_items: Gauge::noop(),
            hits_total: Counter::noop(),
            misses_total: Counter::noop(),
            items_inserted_total: Counter::noop(),
            items_removed_total: Counter::noop(),
            items_evicted_total: Counter::noop(),
            items_expired_total: Counter::noop(),
        }
    }

    pub fn capacity(&self) -> &Gauge {
        &self.capacity
    }

    pub fn current_items(&self) -> &Gauge {
        &self.current_items
    }

    pub fn hits_total(&self) -> &Counter {
        &self.hits_total
    }

    pub fn misses_total(&self) -> &Counter {
        &self.misses_total
    }

    pub fn items_inserted_total(&self) -> &Counter {
        &self.items_inserted_total
    }

    pub fn items_removed_total(&self) -> &Counter {
        &self.items_removed_total
    }

    pub fn items_evicted_total(&self) -> &Counter {
        &self.items_evicted_total
    }

    pub fn items_expired_total(&self) -> &Counter {
        &self.items_expired_total
    }
}
