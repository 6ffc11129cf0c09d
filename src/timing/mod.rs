//! Per-sample timestamp reconstruction.
//!
//! Packets carry a coarse device clock (whole seconds since the device epoch) and a
//! free-running 16-bit tick counter. The tick counter is precise but wraps every 6.5536 s,
//! so it is stitched packet-to-packet and re-anchored to the coarse clock whenever the two
//! drift apart. The submodules are layered leaf-first:
//!
//! - [`units`]: voltage unit tag to volts multiplier.
//! - [`rate`]: sample-rate code to ticks-per-sample.
//! - [`clock`]: tick accumulator and re-sync policy.
//! - [`timestamper`]: per-sample timestamps for one packet.
//! - [`stream`]: the driver that feeds packets through all of the above.

pub mod clock;
pub mod rate;
pub mod stream;
pub mod timestamper;
pub mod units;

/// Duration of one hardware tick, in seconds.
pub const TICK_DURATION: f64 = 0.0001;

/// 2000-03-01T00:00:00 UTC as seconds since the UNIX epoch.
pub const MEDTRONIC_EPOCH: f64 = 951_868_800.0;

/// Default coarse-clock drift, in seconds, that forces a re-sync.
pub const DEFAULT_RESYNC_THRESHOLD_SECS: f64 = 5.0;

pub use clock::{device_epoch_offset, ticks_between, ClockAnchor, ClockTracker};
pub use rate::{check_rate_code, RateState, MAX_RATE_CODE};
pub use stream::{SequencePolicy, StreamDriver, StreamOptions, StreamStats, TimestampStream};
pub use timestamper::{timestamp_packet, TimedPacket};
pub use units::QuantityUnit;
