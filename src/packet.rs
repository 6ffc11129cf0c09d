//! Telemetry packet and device settings types.
//!
//! These are the shapes handed over by the upstream decoder collaborator. The timing core
//! assumes a packet has passed [`Packet::validate`] before it reaches the stream driver.
use crate::error::{AppResult, DaqError};
use crate::validation::is_valid_timezone_offset;
use serde::{Deserialize, Serialize};

/// One time-domain telemetry packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Packet {
    /// Declared voltage unit tag, resolved by the unit scaler.
    pub unit: String,
    /// Device-specific sample-rate code (`250 * 2^code` Hz).
    pub rate_code: u32,
    /// Monotonically incrementing packet sequence number.
    pub sequence: u32,
    /// Coarse device clock, seconds since the device epoch.
    pub device_timestamp: f64,
    /// 16-bit hardware tick at the end of the packet's acquisition window.
    pub tick: u16,
    /// Raw samples per channel; all channels hold the same number of samples.
    pub channels: Vec<Vec<f64>>,
}

impl Packet {
    /// Samples per channel, taken from the first channel.
    pub fn sample_count(&self) -> usize {
        self.channels.first().map_or(0, Vec::len)
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Rejects packets whose channels disagree on sample count.
    pub fn validate(&self) -> AppResult<()> {
        let expected = self.sample_count();
        for (channel, samples) in self.channels.iter().enumerate().skip(1) {
            if samples.len() != expected {
                return Err(DaqError::ChannelLengthMismatch {
                    channel,
                    expected,
                    found: samples.len(),
                });
            }
        }
        Ok(())
    }
}

/// Device settings fetched once before stream processing begins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceSettings {
    /// Offset subtracted from the coarse device clock, in seconds.
    #[serde(default)]
    pub timezone_offset_secs: f64,
}

impl DeviceSettings {
    /// Settings with the given time-zone offset.
    pub fn new(timezone_offset_secs: f64) -> Self {
        Self {
            timezone_offset_secs,
        }
    }

    /// Checks the time-zone offset is finite and within +/-14 hours.
    pub fn validate(&self) -> AppResult<()> {
        is_valid_timezone_offset(self.timezone_offset_secs).map_err(|e| {
            DaqError::Configuration(format!(
                "Invalid timezone_offset_secs {}: {}",
                self.timezone_offset_secs, e
            ))
        })
    }
}
