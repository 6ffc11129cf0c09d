//! Emitted sample record type.
//!
//! This module provides the `SampleRecord` type produced by the stream driver and consumed
//! by the sink collaborators (CSV writer, in-memory collector, anything downstream).

use chrono::{DateTime, TimeZone, Utc};

/// A single timestamped, channel-scaled voltage sample.
///
/// # Fields
/// * `timestamp` - Seconds since the UNIX epoch
/// * `channel` - Zero-based channel index within the packet
/// * `voltage` - Sample value in volts
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SampleRecord {
    /// Seconds since the UNIX epoch
    pub timestamp: f64,
    /// Channel index
    pub channel: usize,
    /// Sample value in volts
    pub voltage: f64,
}

impl SampleRecord {
    /// Timestamp as a UTC datetime, rounded to the nearest nanosecond.
    pub fn timestamp_utc(&self) -> DateTime<Utc> {
        Utc.timestamp_nanos((self.timestamp * 1e9).round() as i64)
    }
}
