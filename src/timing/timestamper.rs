//! Per-sample timestamp derivation for a single packet.
use super::clock::ClockAnchor;
use super::rate::RateState;
use super::TICK_DURATION;
use crate::measurement_types::SampleRecord;

/// One packet with its sample timeline resolved.
///
/// Holds the packet's raw channel data; timestamps and voltages are derived on demand, so
/// iterating the packet costs no allocation beyond what the packet already owns.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedPacket {
    chunk_origin_time: f64,
    first_tick: f64,
    ticks_per_sample: f64,
    multiplier: f64,
    sample_count: usize,
    channels: Vec<Vec<f64>>,
}

/// Resolves the timeline of one packet.
///
/// The header tick marks the end of the acquisition window, so the first sample sits
/// `(n - 1)` sample periods before `anchor.accumulated_ticks`. `n` is taken from the
/// first channel.
pub fn timestamp_packet(
    anchor: &ClockAnchor,
    rate: &RateState,
    multiplier: f64,
    channels: Vec<Vec<f64>>,
) -> TimedPacket {
    let sample_count = channels.first().map_or(0, Vec::len);
    let ticks_per_sample = rate.ticks_per_sample();
    let tick_at_packet_end = anchor.accumulated_ticks as f64;
    let first_tick = tick_at_packet_end - sample_count.saturating_sub(1) as f64 * ticks_per_sample;

    TimedPacket {
        chunk_origin_time: anchor.chunk_origin_time,
        first_tick,
        ticks_per_sample,
        multiplier,
        sample_count,
        channels,
    }
}

impl TimedPacket {
    /// Samples per channel.
    pub fn sample_count(&self) -> usize {
        self.sample_count
    }

    /// Number of channels.
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Tick offset of sample `index` from the chunk origin.
    pub fn tick(&self, index: usize) -> f64 {
        self.first_tick + index as f64 * self.ticks_per_sample
    }

    /// Wall-clock time of sample `index`, in seconds since the UNIX epoch.
    pub fn timestamp(&self, index: usize) -> f64 {
        self.chunk_origin_time + self.tick(index) * TICK_DURATION
    }

    /// Scaled voltage of sample `index` on `channel`.
    pub fn voltage(&self, index: usize, channel: usize) -> Option<f64> {
        self.channels
            .get(channel)?
            .get(index)
            .map(|raw| raw * self.multiplier)
    }

    /// All sample timestamps in order.
    pub fn timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.sample_count).map(|i| self.timestamp(i))
    }
}

impl IntoIterator for TimedPacket {
    type Item = SampleRecord;
    type IntoIter = TimedPacketIter;

    fn into_iter(self) -> Self::IntoIter {
        TimedPacketIter {
            packet: self,
            sample: 0,
            channel: 0,
        }
    }
}

/// Owning iterator over a packet's records: sample-major, then channel.
#[derive(Debug, Clone)]
pub struct TimedPacketIter {
    packet: TimedPacket,
    sample: usize,
    channel: usize,
}

impl Iterator for TimedPacketIter {
    type Item = SampleRecord;

    fn next(&mut self) -> Option<Self::Item> {
        while self.sample < self.packet.sample_count {
            if self.channel >= self.packet.channel_count() {
                self.channel = 0;
                self.sample += 1;
                continue;
            }
            let channel = self.channel;
            self.channel += 1;
            if let Some(voltage) = self.packet.voltage(self.sample, channel) {
                return Some(SampleRecord {
                    timestamp: self.packet.timestamp(self.sample),
                    channel,
                    voltage,
                });
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let channels = self.packet.channel_count();
        let remaining = self
            .packet
            .sample_count
            .saturating_sub(self.sample)
            .saturating_mul(channels)
            .saturating_sub(self.channel.min(channels));
        (0, Some(remaining))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchor(accumulated_ticks: u64) -> ClockAnchor {
        ClockAnchor {
            chunk_origin_time: 951_869_800.0,
            accumulated_ticks,
            resynced: false,
            chunk: 0,
        }
    }

    fn rate(code: u32) -> RateState {
        let mut rate = RateState::new();
        rate.update(code).unwrap();
        rate
    }

    #[test]
    fn test_back_computes_first_sample() {
        let packet = timestamp_packet(&anchor(200), &rate(0), 1.0, vec![vec![0.0; 3]]);
        assert!((packet.tick(0) - 120.0).abs() < 1e-9);
        assert!((packet.tick(2) - 200.0).abs() < 1e-9);
        assert!((packet.timestamp(0) - 951_869_800.012).abs() < 1e-6);
        assert!((packet.timestamp(2) - 951_869_800.020).abs() < 1e-6);
    }

    #[test]
    fn test_spacing_at_rate_zero() {
        let packet = timestamp_packet(&anchor(1000), &rate(0), 1.0, vec![vec![0.0; 10]]);
        let stamps: Vec<f64> = packet.timestamps().collect();
        for pair in stamps.windows(2) {
            assert!((pair[1] - pair[0] - 0.004).abs() < 1e-6);
        }
    }

    #[test]
    fn test_first_sample_may_precede_origin() {
        let packet = timestamp_packet(&anchor(0), &rate(0), 1.0, vec![vec![1.0, 2.0]]);
        assert!((packet.timestamp(0) - 951_869_799.996).abs() < 1e-6);
        assert!((packet.timestamp(1) - 951_869_800.0).abs() < 1e-6);
    }

    #[test]
    fn test_fractional_ticks_per_sample() {
        let packet = timestamp_packet(&anchor(10), &rate(5), 1.0, vec![vec![0.0; 5]]);
        assert!((packet.tick(0) - 5.0).abs() < 1e-9);
        assert!((packet.tick(1) - 6.25).abs() < 1e-9);
    }

    #[test]
    fn test_emission_order_and_scaling() {
        let channels = vec![vec![1.0, 2.0], vec![10.0, 20.0]];
        let packet = timestamp_packet(&anchor(40), &rate(0), 1e3, channels);
        let records: Vec<SampleRecord> = packet.into_iter().collect();
        let order: Vec<(usize, f64)> = records.iter().map(|r| (r.channel, r.voltage)).collect();
        assert_eq!(
            order,
            vec![(0, 1_000.0), (1, 10_000.0), (0, 2_000.0), (1, 20_000.0)]
        );
        assert_eq!(records[0].timestamp, records[1].timestamp);
        assert!(records[2].timestamp > records[1].timestamp);
    }

    #[test]
    fn test_empty_packet_yields_nothing() {
        let packet = timestamp_packet(&anchor(40), &rate(0), 1.0, vec![]);
        assert_eq!(packet.sample_count(), 0);
        assert_eq!(packet.into_iter().count(), 0);

        let packet = timestamp_packet(&anchor(40), &rate(0), 1.0, vec![vec![], vec![]]);
        assert_eq!(packet.into_iter().count(), 0);
    }
}
