//! Hardware definitions for the AHT20: bus addresses, command frames, status
//! fields, timing, and the transfer functions from the datasheet.

use crc::{CRC_8_NRSC_5, Crc};

#[cfg(feature = "defmt")]
use defmt::Format;

/// chip name
pub const CHIP_NAME: &str = "ASAIR AHT20";
/// chip min supply voltage, volts
pub const SUPPLY_VOLTAGE_MIN: f32 = 2.2;
/// chip max supply voltage, volts
pub const SUPPLY_VOLTAGE_MAX: f32 = 5.5;
/// chip min operating temperature, degrees centigrade
pub const TEMPERATURE_MIN: f32 = -40.0;
/// chip max operating temperature, degrees centigrade
pub const TEMPERATURE_MAX: f32 = 125.0;

/// I²C address of the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum I2cAddr {
    /// 0x38, the address of every stock AHT20
    #[default]
    AddrLow,
    /// 0x39, reachable behind an address translator
    AddrHigh,
}
impl I2cAddr {
    /// Get the 7-bit bus address
    pub const fn as_u8(self) -> u8 {
        match self {
            I2cAddr::AddrLow => 0x38,
            I2cAddr::AddrHigh => 0x39,
        }
    }
}

/// Commands understood by the device.
///
/// Each command is a fixed three-byte frame: an opcode and two parameter
/// bytes the datasheet provides no interpretation for.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Command {
    /// 0xBE: initialize and calibrate, sent once after power-up
    Initialize,
    /// 0xAC: start one humidity/temperature conversion
    TriggerMeasurement,
}
impl Command {
    /// The full three-byte command frame
    pub const fn frame(self) -> [u8; 3] {
        match self {
            Command::Initialize => [0xBE, 0x08, 0x00],
            Command::TriggerMeasurement => [0xAC, 0x33, 0x00],
        }
    }
}

/// status field: a measurement conversion is in progress
pub const STATUS_FIELD_LSBIT_BUSY: u8 = 7;
/// status field: factory calibration is loaded
pub const STATUS_FIELD_LSBIT_CALIBRATED: u8 = 3;
/// Expected power-up status bits; any other value means the calibration
/// registers need the patch sequence before the device is usable
pub const STATUS_POWER_ON_CALIBRATED: u8 = 0x18;

/// Registers rewritten by the power-on calibration recovery, in issue order.
/// Undocumented in the datasheet.
pub const CALIBRATION_PATCH_REGISTERS: [u8; 3] = [0x1B, 0x1C, 0x1E];
/// High nibble OR'd onto a patched register address for the write-back
pub const CALIBRATION_PATCH_WRITE_BASE: u8 = 0xB0;

/// Settle time after power-up before the first status read, milliseconds
pub const POWER_ON_DELAY_MS: u32 = 20;
/// Settle time inside the register patch sequence and after init, milliseconds
pub const SETTLE_DELAY_MS: u32 = 10;
/// Typical conversion time of a triggered measurement, milliseconds
pub const MEASUREMENT_DELAY_MS: u32 = 80;

/// Measurement frame length without the trailing checksum byte
pub const FRAME_LEN: usize = 6;
/// Measurement frame length with the trailing checksum byte
pub const FRAME_LEN_CRC: usize = 7;

const CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_NRSC_5);

/// CRC-8 over a measurement frame.
///
/// Polynomial 0x31, initial value 0xFF, no reflection, no final xor: the
/// parameters from section 5.4.4 of the datasheet. The checksum byte the
/// device appends covers the status byte and the five data bytes.
pub fn frame_crc(bytes: &[u8]) -> u8 {
    CRC.checksum(bytes)
}

/// Relative humidity transfer function, section 6.1 of the datasheet
pub fn raw_rel_humid_to_percent(raw: u32) -> f32 {
    raw as f32 * 100.0 / (1 << 20) as f32
}

/// Temperature transfer function, section 6.2 of the datasheet
pub fn raw_temp_to_centigrade(raw: u32) -> f32 {
    raw as f32 * 200.0 / (1 << 20) as f32 - 50.0
}

/// Temperature transfer function scaled to Fahrenheit
pub fn raw_temp_to_fahrenheit(raw: u32) -> f32 {
    raw_temp_to_centigrade(raw) * 1.8 + 32.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_frames_match_the_datasheet() {
        assert_eq!(Command::Initialize.frame(), [0xBE, 0x08, 0x00]);
        assert_eq!(Command::TriggerMeasurement.frame(), [0xAC, 0x33, 0x00]);
    }

    #[test]
    fn addresses() {
        assert_eq!(I2cAddr::AddrLow.as_u8(), 0x38);
        assert_eq!(I2cAddr::AddrHigh.as_u8(), 0x39);
        assert_eq!(I2cAddr::default(), I2cAddr::AddrLow);
    }

    #[test]
    fn crc_known_vector() {
        // From the interface specification; the same check vector the SHT3x
        // family documents for this polynomial.
        assert_eq!(frame_crc(&[0xBE, 0xEF]), 0x92);
    }

    #[test]
    fn crc_is_deterministic() {
        let frame = [0x1C, 0x65, 0xB4, 0x25, 0xCD, 0x26];
        assert_eq!(frame_crc(&frame), frame_crc(&frame));
    }

    #[test]
    fn crc_catches_every_single_bit_flip() {
        let original = [0xBE, 0xEF];
        let crc = frame_crc(&original);
        for byte in 0..original.len() {
            for bit in 0..8 {
                let mut corrupted = original;
                corrupted[byte] ^= 1 << bit;
                assert_ne!(
                    frame_crc(&corrupted),
                    crc,
                    "flip of byte {byte} bit {bit} went undetected"
                );
            }
        }
    }

    #[test]
    fn humidity_transfer_endpoints() {
        assert_eq!(raw_rel_humid_to_percent(0), 0.0);
        assert_eq!(raw_rel_humid_to_percent(1 << 20), 100.0);
    }

    #[test]
    fn temperature_transfer_endpoints() {
        assert_eq!(raw_temp_to_centigrade(0), -50.0);
        assert_eq!(raw_temp_to_centigrade(1 << 20), 150.0);
        assert!((raw_temp_to_fahrenheit(0) - -58.0).abs() < 1e-4);
        assert!((raw_temp_to_fahrenheit(1 << 20) - 302.0).abs() < 1e-4);
    }
}
