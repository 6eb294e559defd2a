use crate::hw_def::*;

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// All possible errors in this crate
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Debug, Eq, PartialEq)]
pub enum Error<E> {
    /// I²C communication error
    I2c(E),
    /// A measurement frame had an unexpected length
    InvalidFrame,
    /// Failure of a checksum from the device was detected
    CrcMismatch,
    /// The device would not confirm its calibration during init
    InitFailed,
    /// The device stayed busy for every allowed status poll of a
    /// measurement cycle
    Timeout,
}

/// Raw (still in 20-bit integer format) humidity and temperature from the
/// device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RawMeasurement {
    /// unprocessed relative humidity
    pub humidity: u32,
    /// unprocessed temperature
    pub temperature: u32,
}
impl RawMeasurement {
    /// Unpack a measurement frame of [`FRAME_LEN`] or [`FRAME_LEN_CRC`]
    /// bytes.
    ///
    /// Byte 0 is a status byte and byte 6, when present, is the frame
    /// checksum; neither contributes to the readings. Humidity is the 20
    /// most significant bits of bytes 1..=3, temperature the 20 least
    /// significant bits of bytes 3..=5. Returns `None` for any other slice
    /// length.
    pub fn from_frame(frame: &[u8]) -> Option<Self> {
        if frame.len() != FRAME_LEN && frame.len() != FRAME_LEN_CRC {
            return None;
        }
        let humidity = ((frame[1] as u32) << 16 | (frame[2] as u32) << 8 | frame[3] as u32) >> 4;
        let temperature =
            ((frame[3] as u32) << 16 | (frame[4] as u32) << 8 | frame[5] as u32) & 0xFFFFF;
        Some(Self {
            humidity,
            temperature,
        })
    }

    /// Get relative humidity in percent
    pub fn humidity_percent(&self) -> f32 {
        raw_rel_humid_to_percent(self.humidity)
    }
    /// Get temperature in Centigrade
    pub fn centigrade(&self) -> f32 {
        raw_temp_to_centigrade(self.temperature)
    }
    /// Get temperature in Fahrenheit
    pub fn fahrenheit(&self) -> f32 {
        raw_temp_to_fahrenheit(self.temperature)
    }
}

/// Humidity and temperature from the device after conversion
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// relative humidity in percent; not clamped, a sensor drifting out of
    /// spec may report outside [0, 100]
    pub humidity_percent: f32,
    /// degrees centigrade
    pub centigrade: f32,
    /// degrees fahrenheit
    pub fahrenheit: f32,
}
impl From<&RawMeasurement> for Measurement {
    fn from(raw: &RawMeasurement) -> Self {
        Self {
            humidity_percent: raw.humidity_percent(),
            centigrade: raw.centigrade(),
            fahrenheit: raw.fahrenheit(),
        }
    }
}

/// Status bits from the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusBits {
    raw: u8,
    /// a measurement conversion is in progress
    pub busy: bool,
    /// factory calibration is loaded
    pub calibrated: bool,
}
impl From<u8> for StatusBits {
    fn from(raw: u8) -> Self {
        Self {
            raw,
            busy: (raw >> STATUS_FIELD_LSBIT_BUSY) & 1 != 0,
            calibrated: (raw >> STATUS_FIELD_LSBIT_CALIBRATED) & 1 != 0,
        }
    }
}
impl StatusBits {
    /// Get the raw status byte
    pub fn raw(&self) -> u8 {
        self.raw
    }
}
impl fmt::Display for StatusBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatusBits {{ 0x{:02x}; ", self.raw)?;
        if self.busy {
            write!(f, "busy ")?;
        }
        if self.calibrated {
            write!(f, "calibrated ")?;
        }
        write!(f, "}}")
    }
}

/// Busy-poll behavior of one measurement cycle.
///
/// The AHT20 has no interrupt line; completion is observed by re-reading the
/// status byte. The defaults follow the datasheet's typical conversion time.
/// A cycle that exhausts `max_polls` fails with [`Error::Timeout`] rather
/// than waiting forever.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PollPolicy {
    /// wait after the trigger command before the first status read, ms
    pub initial_delay_ms: u32,
    /// wait between consecutive status reads, ms
    pub poll_interval_ms: u32,
    /// status reads allowed before the cycle fails with [`Error::Timeout`]
    pub max_polls: u32,
}
impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: MEASUREMENT_DELAY_MS,
            poll_interval_ms: 1,
            max_polls: 100,
        }
    }
}
