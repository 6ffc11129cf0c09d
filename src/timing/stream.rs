//! Stream driver: packets in, timestamped samples out.
//!
//! The driver exclusively owns the [`ClockTracker`] and [`RateState`] for one telemetry
//! session and mutates them once per packet, strictly in arrival order. A packet that
//! fails (unknown unit, unsupported rate code, rejected sequence number) is refused before any of that state is
//! touched, so the caller can skip it and keep pulling, or stop.
use super::clock::ClockTracker;
use super::rate::{check_rate_code, RateState};
use super::timestamper::{timestamp_packet, TimedPacket, TimedPacketIter};
use super::units::unit_multiplier;
use super::DEFAULT_RESYNC_THRESHOLD_SECS;
use crate::error::{AppResult, DaqError};
use crate::measurement_types::SampleRecord;
use crate::packet::{DeviceSettings, Packet};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

/// Sequence distances below this count as forward gaps, anything else as a step back.
const SEQUENCE_HALF_RANGE: u32 = 1 << 31;

/// What to do when a packet's sequence number does not follow its predecessor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SequencePolicy {
    /// Do not look at sequence numbers.
    Ignore,
    /// Log and count the gap, then timestamp the packet from tick continuity alone.
    #[default]
    Warn,
    /// Refuse the packet with [`DaqError::SequenceDiscontinuity`]. Each gap is reported
    /// once; the packets that follow a forward gap are accepted again.
    Reject,
}

/// Tunables for a [`StreamDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StreamOptions {
    /// Coarse-clock drift, in seconds, that forces a re-sync.
    pub resync_threshold_secs: f64,
    /// Sequence contiguity policy.
    pub sequence_policy: SequencePolicy,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            resync_threshold_secs: DEFAULT_RESYNC_THRESHOLD_SECS,
            sequence_policy: SequencePolicy::default(),
        }
    }
}

/// Counters collected over one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StreamStats {
    /// Packets accepted and timestamped.
    pub packets_processed: u64,
    /// Packets refused by the decoder or the driver.
    pub packets_rejected: u64,
    /// Re-sync events, including the initial sync.
    pub resyncs: u64,
    /// Rate-code changes, including the initial rate.
    pub rate_changes: u64,
    /// Sequence gaps seen under `Warn` or `Reject`.
    pub sequence_discontinuities: u64,
    /// Records yielded by a [`TimestampStream`].
    pub records_emitted: u64,
}

/// Per-session timestamping state machine.
#[derive(Debug, Clone)]
pub struct StreamDriver {
    clock: ClockTracker,
    rate: RateState,
    options: StreamOptions,
    last_sequence: Option<u32>,
    stats: StreamStats,
}

impl StreamDriver {
    /// Creates a driver for a fresh session.
    pub fn new(settings: DeviceSettings, options: StreamOptions) -> Self {
        Self {
            clock: ClockTracker::with_resync_threshold(
                settings.timezone_offset_secs,
                options.resync_threshold_secs,
            ),
            rate: RateState::new(),
            options,
            last_sequence: None,
            stats: StreamStats::default(),
        }
    }

    /// Updates rate and clock state from one packet and resolves its sample timeline.
    pub fn process_packet(&mut self, packet: Packet) -> AppResult<TimedPacket> {
        trace!(
            sequence = packet.sequence,
            tick = packet.tick,
            device_timestamp = packet.device_timestamp,
            samples = packet.sample_count(),
            "processing packet"
        );

        let multiplier = match unit_multiplier(&packet.unit) {
            Ok(multiplier) => multiplier,
            Err(err) => {
                self.stats.packets_rejected += 1;
                return Err(err);
            }
        };
        if let Err(err) = check_rate_code(packet.rate_code) {
            self.stats.packets_rejected += 1;
            return Err(err);
        }
        if let Err(err) = self.check_sequence(packet.sequence) {
            self.stats.packets_rejected += 1;
            return Err(err);
        }

        if self.rate.update(packet.rate_code)? {
            self.stats.rate_changes += 1;
            debug!(
                rate_code = packet.rate_code,
                sampling_frequency = self.rate.sampling_frequency(),
                ticks_per_sample = self.rate.ticks_per_sample(),
                "sample rate changed"
            );
        }

        let anchor = self.clock.update(packet.device_timestamp, packet.tick);
        if anchor.resynced {
            self.stats.resyncs += 1;
        }

        self.last_sequence = Some(packet.sequence);
        self.stats.packets_processed += 1;
        Ok(timestamp_packet(
            &anchor,
            &self.rate,
            multiplier,
            packet.channels,
        ))
    }

    fn check_sequence(&mut self, sequence: u32) -> AppResult<()> {
        let Some(previous) = self.last_sequence else {
            return Ok(());
        };
        let expected = previous.wrapping_add(1);
        if sequence == expected {
            return Ok(());
        }
        match self.options.sequence_policy {
            SequencePolicy::Ignore => Ok(()),
            SequencePolicy::Warn => {
                self.stats.sequence_discontinuities += 1;
                warn!(expected, found = sequence, "packet sequence discontinuity");
                Ok(())
            }
            SequencePolicy::Reject => {
                self.stats.sequence_discontinuities += 1;
                // Forward gaps move the baseline to the refused packet.
                // Repeats and backward jumps keep it.
                if sequence.wrapping_sub(expected) < SEQUENCE_HALF_RANGE {
                    self.last_sequence = Some(sequence);
                }
                Err(DaqError::SequenceDiscontinuity {
                    expected,
                    found: sequence,
                })
            }
        }
    }

    /// Turns the driver into a lazy record stream over `packets`.
    pub fn stream<I>(self, packets: I) -> TimestampStream<I::IntoIter>
    where
        I: IntoIterator<Item = AppResult<Packet>>,
    {
        TimestampStream {
            driver: self,
            packets: packets.into_iter(),
            current: None,
        }
    }

    /// Tick clock state.
    pub fn clock(&self) -> &ClockTracker {
        &self.clock
    }

    /// Sample-rate state.
    pub fn rate(&self) -> &RateState {
        &self.rate
    }

    /// Options the driver was built with.
    pub fn options(&self) -> &StreamOptions {
        &self.options
    }

    /// Counters so far.
    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }
}

/// Lazy, forward-only sequence of [`SampleRecord`]s.
///
/// Only the packet currently being emitted is held. A failing packet yields one `Err`
/// and the stream stays usable; pulling again continues with the next packet.
#[derive(Debug)]
pub struct TimestampStream<I> {
    driver: StreamDriver,
    packets: I,
    current: Option<TimedPacketIter>,
}

impl<I> TimestampStream<I> {
    /// The driver behind this stream.
    pub fn driver(&self) -> &StreamDriver {
        &self.driver
    }

    /// Counters so far.
    pub fn stats(&self) -> &StreamStats {
        &self.driver.stats
    }

    /// Stops the stream and hands back the driver.
    pub fn into_driver(self) -> StreamDriver {
        self.driver
    }
}

impl<I> Iterator for TimestampStream<I>
where
    I: Iterator<Item = AppResult<Packet>>,
{
    type Item = AppResult<SampleRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(current) = self.current.as_mut() {
                if let Some(record) = current.next() {
                    self.driver.stats.records_emitted += 1;
                    return Some(Ok(record));
                }
                self.current = None;
            }

            match self.packets.next()? {
                Ok(packet) => match self.driver.process_packet(packet) {
                    Ok(timed) => self.current = Some(timed.into_iter()),
                    Err(err) => return Some(Err(err)),
                },
                Err(err) => {
                    self.driver.stats.packets_rejected += 1;
                    return Some(Err(err));
                }
            }
        }
    }
}
