//! Packet decoders.
//!
//! Two input shapes are understood:
//!
//! - **JSON lines**: one [`Packet`] object per line, read lazily by [`JsonLinesSource`].
//!   Device settings come from configuration.
//! - **Packet log**: a single JSON document carrying both the device settings and the
//!   packet list, see [`PacketLog`].
//!
//! Every decoded packet is validated before it is handed on, so channel length mismatches
//! never reach the timing core.
use crate::error::{AppResult, DaqError};
use crate::packet::{DeviceSettings, Packet};
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::path::Path;
use tracing::warn;

/// Lazy JSON-lines packet decoder.
#[derive(Debug)]
pub struct JsonLinesSource<R> {
    reader: R,
    line: usize,
    buffer: String,
}

impl<R: BufRead> JsonLinesSource<R> {
    /// Wraps a buffered reader.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: 0,
            buffer: String::new(),
        }
    }

    fn decode(&self, text: &str) -> AppResult<Packet> {
        let packet: Packet = serde_json::from_str(text).map_err(|e| DaqError::Decode {
            line: self.line,
            message: e.to_string(),
        })?;
        packet.validate()?;
        Ok(packet)
    }
}

impl<R: BufRead> Iterator for JsonLinesSource<R> {
    type Item = AppResult<Packet>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.buffer.clear();
            match self.reader.read_line(&mut self.buffer) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line += 1;
                    let text = self.buffer.trim();
                    if text.is_empty() {
                        continue;
                    }
                    return Some(self.decode(text));
                }
                Err(err) => return Some(Err(err.into())),
            }
        }
    }
}

/// A recorded session: device settings plus packets in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PacketLog {
    /// Settings fetched from the device before streaming.
    #[serde(default)]
    pub device_settings: DeviceSettings,
    /// Packets in arrival order.
    pub packets: Vec<Packet>,
}

impl PacketLog {
    /// Parses a packet log document and validates its settings and every packet.
    ///
    /// A malformed packet fails with the same error the JSON-lines decoder reports; its
    /// position in the log is logged alongside.
    pub fn from_json(text: &str) -> AppResult<Self> {
        let log: PacketLog = serde_json::from_str(text)?;
        log.device_settings.validate()?;
        for (index, packet) in log.packets.iter().enumerate() {
            if let Err(err) = packet.validate() {
                warn!(packet_index = index, sequence = packet.sequence, error = %err, "invalid packet in log");
                return Err(err);
            }
        }
        Ok(log)
    }

    /// Reads and parses a packet log file.
    pub fn load<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Splits into the settings and a packet iterator suited to the stream driver.
    pub fn into_parts(self) -> (DeviceSettings, impl Iterator<Item = AppResult<Packet>>) {
        (self.device_settings, self.packets.into_iter().map(Ok))
    }
}
