//! Custom error types for the application.
//!
//! This module defines the primary error type, `DaqError`, for the whole crate. Using the
//! `thiserror` crate, it provides a centralized and consistent way to report failures from
//! packet decoding, timestamp reconstruction, configuration and output.
//!
//! ## Error Hierarchy
//!
//! - **`UnknownUnit`**: a packet declared a voltage unit outside the known set. There is no
//!   safe default conversion, so the packet is rejected before any clock state is touched.
//! - **`UnsupportedRateCode`**: the sample-rate code implies more than one sample per tick,
//!   so consecutive samples could not be told apart.
//! - **`ChannelLengthMismatch`**: channels inside one packet report different sample counts.
//!   Raised by the packet decoders, never by the timing core.
//! - **`SequenceDiscontinuity`**: the packet sequence number did not advance by one. Only
//!   produced when the stream is configured with `SequencePolicy::Reject`.
//! - **`Decode`**: a packet record could not be parsed by a decoder.
//! - **`Config`** / **`Configuration`**: figment extraction errors and semantic validation
//!   errors respectively.
//! - **`Io`**, **`Csv`**, **`Json`**: wrapped errors from the I/O collaborators.
//!
//! By using `#[from]`, `DaqError` can be created from the underlying error types with `?`.

use thiserror::Error;

/// Convenience alias for results using the application error type.
pub type AppResult<T> = std::result::Result<T, DaqError>;

/// Errors produced while decoding, timestamping or writing telemetry.
#[derive(Error, Debug)]
pub enum DaqError {
    #[error("Unknown quantity unit '{0}'")]
    UnknownUnit(String),

    #[error("Unsupported rate code {code} (maximum {max})")]
    UnsupportedRateCode { code: u32, max: u32 },

    #[error("Channel {channel} has {found} samples, expected {expected}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        found: usize,
    },

    #[error("Sequence discontinuity: expected packet {expected}, got {found}")]
    SequenceDiscontinuity { expected: u32, found: u32 },

    #[error("Failed to decode packet at line {line}: {message}")]
    Decode { line: usize, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error("Configuration validation error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl DaqError {
    /// Returns true when the error only invalidates a single packet.
    ///
    /// Packet-scoped errors leave the stream state untouched, so a caller may skip the
    /// offending packet and keep pulling. Everything else should abort the stream.
    pub fn is_packet_scoped(&self) -> bool {
        matches!(
            self,
            DaqError::UnknownUnit(_)
                | DaqError::UnsupportedRateCode { .. }
                | DaqError::ChannelLengthMismatch { .. }
                | DaqError::SequenceDiscontinuity { .. }
                | DaqError::Decode { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_unit_is_packet_scoped() {
        let err = DaqError::UnknownUnit("furlongs".into());
        assert!(err.is_packet_scoped());
        assert_eq!(err.to_string(), "Unknown quantity unit 'furlongs'");
    }

    #[test]
    fn unsupported_rate_code_is_packet_scoped() {
        let err = DaqError::UnsupportedRateCode { code: 9, max: 5 };
        assert!(err.is_packet_scoped());
        assert_eq!(err.to_string(), "Unsupported rate code 9 (maximum 5)");
    }

    #[test]
    fn io_error_is_not_packet_scoped() {
        let err: DaqError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert!(!err.is_packet_scoped());
    }

    #[test]
    fn formats_channel_mismatch() {
        let err = DaqError::ChannelLengthMismatch {
            channel: 1,
            expected: 62,
            found: 61,
        };
        assert_eq!(err.to_string(), "Channel 1 has 61 samples, expected 62");
    }
}
