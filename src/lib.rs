//! # Percept DAQ Core Library
//!
//! This crate reconstructs per-sample wall-clock timestamps for time-domain telemetry
//! streamed from an implanted neurostimulator. Each packet carries a coarse device clock,
//! a 16-bit wraparound hardware tick counter and a batch of multi-channel samples; the
//! library stitches the ticks into a continuous timeline, re-anchors it when the coarse
//! clock drifts, and emits `(timestamp, channel, voltage)` records.
//!
//! ## Crate Structure
//!
//! - **`timing`**: The timestamping core: unit scaling, sample-rate state, the tick clock
//!   tracker, the per-packet timestamper and the stream driver.
//! - **`packet`**: `Packet` and `DeviceSettings`, the shapes handed over by decoders.
//! - **`source`**: JSON-lines and whole-document packet decoders.
//! - **`sink`**: The `SampleSink` trait with in-memory and CSV implementations.
//! - **`measurement_types`**: The emitted `SampleRecord`.
//! - **`metadata`**: Session metadata written alongside output.
//! - **`config`**: Figment-based configuration loading and validation.
//! - **`logging`**: `tracing-subscriber` initialization.
//! - **`error`**: The `DaqError` enum used across the crate.
//! - **`validation`**: Small helpers used by configuration checks.
//!
//! ## Example
//!
//! ```
//! use percept_daq::packet::{DeviceSettings, Packet};
//! use percept_daq::timing::{StreamDriver, StreamOptions};
//!
//! let packets = vec![Packet {
//!     unit: "microvolts".to_string(),
//!     rate_code: 0,
//!     sequence: 1,
//!     device_timestamp: 1000.0,
//!     tick: 100,
//!     channels: vec![vec![12.0, 14.0]],
//! }];
//!
//! let driver = StreamDriver::new(DeviceSettings::new(0.0), StreamOptions::default());
//! for record in driver.stream(packets.into_iter().map(Ok)) {
//!     let record = record?;
//!     println!("{:.4} ch{} {:e} V", record.timestamp, record.channel, record.voltage);
//! }
//! # Ok::<(), percept_daq::error::DaqError>(())
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod measurement_types;
pub mod metadata;
pub mod packet;
pub mod sink;
pub mod source;
pub mod timing;
pub mod validation;

pub use error::{AppResult, DaqError};
pub use measurement_types::SampleRecord;
pub use packet::{DeviceSettings, Packet};
