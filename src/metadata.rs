//! Session metadata written alongside emitted samples.

use crate::error::{AppResult, DaqError};
use crate::packet::DeviceSettings;
use crate::timing::SequencePolicy;
use crate::validation::is_positive_finite;
use serde::{Deserialize, Serialize};

/// Describes how a batch of records was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionMetadata {
    /// Where the packets came from (file name, device id, ...).
    pub source: String,
    /// Time-zone offset applied to the device clock, in seconds.
    pub timezone_offset_secs: f64,
    /// Drift threshold used for re-syncs, in seconds.
    pub resync_threshold_secs: f64,
    /// Sequence contiguity policy in effect.
    pub sequence_policy: SequencePolicy,
    /// Version of this software.
    pub software_version: String,
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self {
            source: "unknown".to_string(),
            timezone_offset_secs: 0.0,
            resync_threshold_secs: crate::timing::DEFAULT_RESYNC_THRESHOLD_SECS,
            sequence_policy: SequencePolicy::default(),
            software_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// A builder for constructing `SessionMetadata` instances.
#[derive(Default)]
pub struct SessionMetadataBuilder {
    inner: SessionMetadata,
}

impl SessionMetadataBuilder {
    /// Starts from the defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the packet source description.
    pub fn source(mut self, source: &str) -> Self {
        self.inner.source = source.to_string();
        self
    }

    /// Sets the time-zone offset.
    pub fn timezone_offset_secs(mut self, offset: f64) -> Self {
        self.inner.timezone_offset_secs = offset;
        self
    }

    /// Sets the re-sync threshold.
    pub fn resync_threshold_secs(mut self, threshold: f64) -> Self {
        self.inner.resync_threshold_secs = threshold;
        self
    }

    /// Sets the sequence policy.
    pub fn sequence_policy(mut self, policy: SequencePolicy) -> Self {
        self.inner.sequence_policy = policy;
        self
    }

    /// Finishes the builder.
    pub fn build(self) -> SessionMetadata {
        self.inner
    }
}

impl SessionMetadata {
    /// Validates the metadata before it is written out.
    pub fn validate(&self) -> AppResult<()> {
        if self.source.is_empty() {
            return Err(DaqError::Configuration(
                "Session source cannot be empty.".to_string(),
            ));
        }
        is_positive_finite(self.resync_threshold_secs).map_err(|e| {
            DaqError::Configuration(format!(
                "Invalid resync_threshold_secs {}: {}",
                self.resync_threshold_secs, e
            ))
        })?;
        DeviceSettings::new(self.timezone_offset_secs).validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let metadata = SessionMetadataBuilder::new()
            .source("left_stn.jsonl")
            .timezone_offset_secs(-18000.0)
            .sequence_policy(SequencePolicy::Reject)
            .build();
        assert_eq!(metadata.source, "left_stn.jsonl");
        assert_eq!(metadata.timezone_offset_secs, -18000.0);
        assert_eq!(metadata.resync_threshold_secs, 5.0);
        assert_eq!(metadata.sequence_policy, SequencePolicy::Reject);
        assert!(metadata.validate().is_ok());
    }

    #[test]
    fn test_empty_source_invalid() {
        let metadata = SessionMetadataBuilder::new().source("").build();
        assert!(matches!(
            metadata.validate(),
            Err(DaqError::Configuration(_))
        ));
    }

    #[test]
    fn test_out_of_range_offset_invalid() {
        let metadata = SessionMetadataBuilder::new()
            .source("capture.jsonl")
            .timezone_offset_secs(20.0 * 3600.0)
            .build();
        assert!(metadata.validate().is_err());
    }
}
