//! Native meter protocol messages.
//!
//! These mirror the agent-side `Meter.proto` schema field-for-field, including tag numbers, so that payloads encoded
//! here are byte-compatible with what downstream consumers of the meter topic expect.

/// A single meter sample reported by a service instance.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeterData {
    /// The meter value itself.
    #[prost(oneof = "meter_data::Metric", tags = "1, 2")]
    pub metric: ::core::option::Option<meter_data::Metric>,

    /// Service name.
    ///
    /// Only required on the first element of a stream; subsequent elements may leave it empty.
    #[prost(string, tag = "3")]
    pub service: ::prost::alloc::string::String,

    /// Service instance name.
    #[prost(string, tag = "4")]
    pub service_instance: ::prost::alloc::string::String,

    /// Collection time, in milliseconds since the Unix epoch.
    #[prost(int64, tag = "5")]
    pub timestamp: i64,
}

/// Nested types for [`MeterData`].
pub mod meter_data {
    /// The kind of meter being reported.
    #[derive(Clone, PartialEq, ::prost::Oneof)]
    pub enum Metric {
        /// A single value.
        #[prost(message, tag = "1")]
        SingleValue(super::MeterSingleValue),

        /// A histogram.
        #[prost(message, tag = "2")]
        Histogram(super::MeterHistogram),
    }
}

/// A name/value label attached to a meter.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Label {
    /// Label name.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,

    /// Label value.
    #[prost(string, tag = "2")]
    pub value: ::prost::alloc::string::String,
}

/// A single-value meter, such as a counter or gauge.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeterSingleValue {
    /// Meter name.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,

    /// Meter labels.
    #[prost(message, repeated, tag = "2")]
    pub labels: ::prost::alloc::vec::Vec<Label>,

    /// Meter value.
    #[prost(double, tag = "3")]
    pub value: f64,
}

/// A single histogram bucket.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeterBucketValue {
    /// Lower boundary of the bucket.
    #[prost(double, tag = "1")]
    pub bucket: f64,

    /// Number of samples in the bucket.
    #[prost(int64, tag = "2")]
    pub count: i64,

    /// Whether the lower boundary is negative infinity.
    #[prost(bool, tag = "3")]
    pub is_negative_infinity: bool,
}

/// A histogram meter.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MeterHistogram {
    /// Meter name.
    #[prost(string, tag = "1")]
    pub name: ::prost::alloc::string::String,

    /// Meter labels.
    #[prost(message, repeated, tag = "2")]
    pub labels: ::prost::alloc::vec::Vec<Label>,

    /// Histogram buckets.
    #[prost(message, repeated, tag = "3")]
    pub values: ::prost::alloc::vec::Vec<MeterBucketValue>,
}
