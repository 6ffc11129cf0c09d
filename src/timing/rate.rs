//! Sample-rate tracking.
use super::TICK_DURATION;
use crate::error::{AppResult, DaqError};

/// Base sampling frequency for rate code 0, in Hz.
pub const BASE_SAMPLING_FREQUENCY: f64 = 250.0;

/// Highest rate code that keeps at least one tick between samples (8000 Hz, 1.25 ticks).
pub const MAX_RATE_CODE: u32 = 5;

/// Refuses rate codes whose samples would be closer together than one tick.
pub fn check_rate_code(rate_code: u32) -> AppResult<()> {
    if rate_code > MAX_RATE_CODE {
        return Err(DaqError::UnsupportedRateCode {
            code: rate_code,
            max: MAX_RATE_CODE,
        });
    }
    Ok(())
}

/// Declared sample rate and the quantities derived from it.
///
/// Starts empty; the first packet's `update` establishes the initial rate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RateState {
    rate_code: Option<u32>,
    sampling_frequency: f64,
    sampling_period: f64,
    ticks_per_sample: f64,
}

impl RateState {
    /// Creates an empty rate state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the packet's rate code, recomputing derived values only when it changed.
    ///
    /// Returns `Ok(true)` when a recompute happened. Codes above [`MAX_RATE_CODE`] are
    /// refused and leave the state as it was.
    pub fn update(&mut self, rate_code: u32) -> AppResult<bool> {
        if self.rate_code == Some(rate_code) {
            return Ok(false);
        }
        check_rate_code(rate_code)?;
        self.sampling_frequency = BASE_SAMPLING_FREQUENCY * f64::from(1u32 << rate_code);
        self.sampling_period = 1.0 / self.sampling_frequency;
        self.ticks_per_sample = self.sampling_period / TICK_DURATION;
        self.rate_code = Some(rate_code);
        Ok(true)
    }

    /// Current rate code, if any packet has been seen.
    pub fn rate_code(&self) -> Option<u32> {
        self.rate_code
    }

    /// Sampling frequency in Hz.
    pub fn sampling_frequency(&self) -> f64 {
        self.sampling_frequency
    }

    /// Sampling period in seconds.
    pub fn sampling_period(&self) -> f64 {
        self.sampling_period
    }

    /// Real-valued tick count between consecutive samples.
    pub fn ticks_per_sample(&self) -> f64 {
        self.ticks_per_sample
    }
}
