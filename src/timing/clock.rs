//! Hardware tick clock tracking.
//!
//! The tick counter is stitched across packets into an accumulator anchored at a
//! wall-clock origin. The coarse device clock is only used to pick that origin, and to
//! detect when the tick timeline can no longer be trusted (a gap, a device reset), at
//! which point the tracker re-syncs: a fresh origin and an empty accumulator.
//!
//! ```text
//! UNINITIALIZED --first packet--> SYNCED --drift >= threshold--> SYNCED (new chunk)
//! ```
use super::{DEFAULT_RESYNC_THRESHOLD_SECS, MEDTRONIC_EPOCH};
use tracing::debug;

/// Ticks elapsed from `last` to `current` on the 16-bit wraparound counter.
///
/// Equal to `(current - last) mod 65536`, so a rollover between packets is transparent.
pub fn ticks_between(last: u16, current: u16) -> u64 {
    u64::from(current.wrapping_sub(last))
}

/// Converts a coarse device timestamp to seconds since the UNIX epoch.
pub fn device_epoch_offset(device_timestamp: f64, timezone_offset_secs: f64) -> f64 {
    MEDTRONIC_EPOCH + device_timestamp - timezone_offset_secs
}

/// Timeline anchor for one packet, read after the tracker consumed it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockAnchor {
    /// Wall-clock time of tick 0 in the current chunk.
    pub chunk_origin_time: f64,
    /// Ticks from the chunk origin to the end of this packet.
    pub accumulated_ticks: u64,
    /// Whether this packet started a new chunk.
    pub resynced: bool,
    /// Zero-based chunk counter.
    pub chunk: u64,
}

#[derive(Debug, Clone)]
struct SyncState {
    chunk_origin_time: f64,
    accumulated_ticks: u64,
    last_tick: u16,
    last_device_timestamp: f64,
    chunk: u64,
}

impl SyncState {
    fn anchored_at(device_timestamp: f64, tick: u16, timezone_offset_secs: f64, chunk: u64) -> Self {
        Self {
            chunk_origin_time: device_epoch_offset(device_timestamp, timezone_offset_secs),
            accumulated_ticks: 0,
            last_tick: tick,
            last_device_timestamp: device_timestamp,
            chunk,
        }
    }
}

/// Owns the tick accumulator for one continuous telemetry session.
#[derive(Debug, Clone)]
pub struct ClockTracker {
    timezone_offset_secs: f64,
    resync_threshold_secs: f64,
    state: Option<SyncState>,
}

impl ClockTracker {
    /// Creates an unsynced tracker with the default 5 s re-sync threshold.
    pub fn new(timezone_offset_secs: f64) -> Self {
        Self::with_resync_threshold(timezone_offset_secs, DEFAULT_RESYNC_THRESHOLD_SECS)
    }

    /// Creates an unsynced tracker with a custom re-sync threshold, in seconds.
    pub fn with_resync_threshold(timezone_offset_secs: f64, resync_threshold_secs: f64) -> Self {
        Self {
            timezone_offset_secs,
            resync_threshold_secs,
            state: None,
        }
    }

    /// Feeds one packet's coarse timestamp and hardware tick.
    ///
    /// Re-syncs on the first packet and whenever the coarse clock moved by at least the
    /// threshold since the previous packet (boundary inclusive), then accumulates the
    /// wraparound tick delta.
    pub fn update(&mut self, device_timestamp: f64, tick: u16) -> ClockAnchor {
        let tz = self.timezone_offset_secs;
        let (mut state, resynced) = match self.state.take() {
            None => {
                let state = SyncState::anchored_at(device_timestamp, tick, tz, 0);
                debug!(
                    chunk_origin_time = state.chunk_origin_time,
                    "tick clock synced on first packet"
                );
                (state, true)
            }
            Some(previous) => {
                let drift = (device_timestamp - previous.last_device_timestamp).abs();
                if drift >= self.resync_threshold_secs {
                    let state =
                        SyncState::anchored_at(device_timestamp, tick, tz, previous.chunk + 1);
                    debug!(
                        drift,
                        chunk = state.chunk,
                        chunk_origin_time = state.chunk_origin_time,
                        "device clock drifted, re-syncing tick clock"
                    );
                    (state, true)
                } else {
                    (previous, false)
                }
            }
        };

        state.accumulated_ticks += ticks_between(state.last_tick, tick);
        state.last_tick = tick;
        state.last_device_timestamp = device_timestamp;

        let anchor = ClockAnchor {
            chunk_origin_time: state.chunk_origin_time,
            accumulated_ticks: state.accumulated_ticks,
            resynced,
            chunk: state.chunk,
        };
        self.state = Some(state);
        anchor
    }

    /// Whether at least one packet has been consumed.
    pub fn is_synced(&self) -> bool {
        self.state.is_some()
    }

    /// Wall-clock origin of the current chunk.
    pub fn chunk_origin_time(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.chunk_origin_time)
    }

    /// Ticks accumulated since the current chunk origin.
    pub fn accumulated_ticks(&self) -> Option<u64> {
        self.state.as_ref().map(|s| s.accumulated_ticks)
    }

    /// Hardware tick of the previous packet.
    pub fn last_tick(&self) -> Option<u16> {
        self.state.as_ref().map(|s| s.last_tick)
    }

    /// Coarse device timestamp of the previous packet.
    pub fn last_device_timestamp(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.last_device_timestamp)
    }

    /// Time-zone offset applied to the coarse clock, in seconds.
    pub fn timezone_offset_secs(&self) -> f64 {
        self.timezone_offset_secs
    }

    /// Re-sync threshold, in seconds.
    pub fn resync_threshold_secs(&self) -> f64 {
        self.resync_threshold_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_between_wraps() {
        assert_eq!(ticks_between(65500, 10), 46);
        assert_eq!(ticks_between(100, 140), 40);
        assert_eq!(ticks_between(7, 7), 0);
        assert_eq!(ticks_between(0, 65535), 65535);
        assert_eq!(ticks_between(65535, 0), 1);
    }

    #[test]
    fn test_device_epoch_offset() {
        assert_eq!(device_epoch_offset(1000.0, 0.0), 951_869_800.0);
        assert_eq!(device_epoch_offset(1000.0, 3600.0), 951_866_200.0);
        assert_eq!(device_epoch_offset(0.0, -3600.0), 951_872_400.0);
    }

    #[test]
    fn test_first_packet_syncs() {
        let mut clock = ClockTracker::new(0.0);
        assert!(!clock.is_synced());

        let anchor = clock.update(1000.0, 100);
        assert!(anchor.resynced);
        assert_eq!(anchor.chunk, 0);
        assert_eq!(anchor.chunk_origin_time, 951_869_800.0);
        assert_eq!(anchor.accumulated_ticks, 0);
        assert_eq!(clock.last_tick(), Some(100));
        assert_eq!(clock.last_device_timestamp(), Some(1000.0));
    }

    #[test]
    fn test_accumulates_within_chunk() {
        let mut clock = ClockTracker::new(0.0);
        clock.update(1000.0, 100);
        let anchor = clock.update(1000.5, 140);
        assert!(!anchor.resynced);
        assert_eq!(anchor.accumulated_ticks, 40);
        assert_eq!(anchor.chunk_origin_time, 951_869_800.0);

        let anchor = clock.update(1001.0, 65530);
        assert_eq!(anchor.accumulated_ticks, 40 + 65390);
    }

    #[test]
    fn test_accumulates_across_wraparound() {
        let mut clock = ClockTracker::new(0.0);
        clock.update(50.0, 65500);
        let anchor = clock.update(50.0, 10);
        assert!(!anchor.resynced);
        assert_eq!(anchor.accumulated_ticks, 46);
    }

    #[test]
    fn test_resync_boundary_is_inclusive() {
        let mut clock = ClockTracker::new(0.0);
        clock.update(1000.0, 100);
        clock.update(1001.0, 10100);
        let anchor = clock.update(1006.0, 20100);
        assert!(anchor.resynced);
        assert_eq!(anchor.chunk, 1);
        assert_eq!(anchor.accumulated_ticks, 0);
        assert_eq!(anchor.chunk_origin_time, device_epoch_offset(1006.0, 0.0));
    }

    #[test]
    fn test_drift_just_below_threshold_keeps_chunk() {
        let mut clock = ClockTracker::new(0.0);
        clock.update(1000.0, 100);
        let anchor = clock.update(1004.999999, 200);
        assert!(!anchor.resynced);
        assert_eq!(anchor.chunk, 0);
        assert_eq!(anchor.accumulated_ticks, 100);
    }

    #[test]
    fn test_backwards_clock_jump_resyncs() {
        let mut clock = ClockTracker::new(0.0);
        clock.update(2000.0, 0);
        let anchor = clock.update(1990.0, 400);
        assert!(anchor.resynced);
        assert_eq!(anchor.chunk_origin_time, device_epoch_offset(1990.0, 0.0));
    }

    #[test]
    fn test_custom_threshold() {
        let mut clock = ClockTracker::with_resync_threshold(0.0, 1.0);
        clock.update(10.0, 0);
        assert!(clock.update(11.0, 100).resynced);
        assert!(!clock.update(11.5, 200).resynced);
    }
}
