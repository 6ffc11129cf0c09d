//! Voltage unit scaling.
use crate::error::{AppResult, DaqError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Quantity unit a packet declares for its raw sample values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityUnit {
    /// Volts.
    Volts,
    /// Millivolts.
    Millivolts,
    /// Microvolts.
    Microvolts,
    /// Kilovolts.
    Kilovolts,
    /// Megavolts.
    Megavolts,
}

impl QuantityUnit {
    /// Factor that converts a raw value in this unit to volts.
    pub fn multiplier(self) -> f64 {
        match self {
            QuantityUnit::Volts => 1.0,
            QuantityUnit::Millivolts => 1e-3,
            QuantityUnit::Microvolts => 1e-6,
            QuantityUnit::Kilovolts => 1e3,
            QuantityUnit::Megavolts => 1e6,
        }
    }

    /// Canonical lowercase tag.
    pub fn as_str(self) -> &'static str {
        match self {
            QuantityUnit::Volts => "volts",
            QuantityUnit::Millivolts => "millivolts",
            QuantityUnit::Microvolts => "microvolts",
            QuantityUnit::Kilovolts => "kilovolts",
            QuantityUnit::Megavolts => "megavolts",
        }
    }
}

impl FromStr for QuantityUnit {
    type Err = DaqError;

    /// Accepts the full unit name in any case, or the SI symbol (case sensitive, since
    /// `mV` and `MV` differ by six orders of magnitude).
    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let tag = tag.trim();
        match tag {
            "V" => return Ok(QuantityUnit::Volts),
            "mV" => return Ok(QuantityUnit::Millivolts),
            "uV" | "µV" | "μV" => return Ok(QuantityUnit::Microvolts),
            "kV" => return Ok(QuantityUnit::Kilovolts),
            "MV" => return Ok(QuantityUnit::Megavolts),
            _ => {}
        }
        match tag.to_ascii_lowercase().as_str() {
            "volts" => Ok(QuantityUnit::Volts),
            "millivolts" => Ok(QuantityUnit::Millivolts),
            "microvolts" => Ok(QuantityUnit::Microvolts),
            "kilovolts" => Ok(QuantityUnit::Kilovolts),
            "megavolts" => Ok(QuantityUnit::Megavolts),
            _ => Err(DaqError::UnknownUnit(tag.to_string())),
        }
    }
}

impl fmt::Display for QuantityUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves a raw unit tag straight to its volts multiplier.
pub fn unit_multiplier(tag: &str) -> AppResult<f64> {
    tag.parse::<QuantityUnit>().map(QuantityUnit::multiplier)
}
