//! Blocking driver, for use with [`embedded_hal`] I²C and delay
//! implementations.

use crate::fmt::{info, trace, warn};
use crate::hw_def::*;
use crate::types::*;

use embedded_hal::{delay::DelayNs, i2c::I2c};

/// AHT20 device driver
#[derive(Debug)]
pub struct Aht20<I2C, Delay> {
    i2c: I2C,
    delay: Delay,
    addr: I2cAddr,
    validate_crc: bool,
    last_reading: Option<Measurement>,
}

impl<I2C, Delay, E> Aht20<I2C, Delay>
where
    I2C: I2c<Error = E>,
    Delay: DelayNs,
{
    /// Create a new AHT20 driver instance.
    ///
    /// Checksum validation of measurement frames starts enabled; see
    /// [`Self::with_crc_validation`]. Call [`Self::init`] before the first
    /// measurement.
    pub fn new(i2c: I2C, delay: Delay, addr: I2cAddr) -> Self {
        Self {
            i2c,
            delay,
            addr,
            validate_crc: true,
            last_reading: None,
        }
    }

    /// Enable or disable checksum validation of measurement frames.
    ///
    /// With validation off the driver reads the six-byte frame and accepts
    /// it as-is.
    pub fn with_crc_validation(mut self, validate: bool) -> Self {
        self.validate_crc = validate;
        self
    }

    /// Release the I²C bus and delay handles.
    ///
    /// Consumes the driver, so the released device cannot be addressed
    /// through it afterwards; construct a new instance from the returned
    /// handles to re-attach.
    pub fn destroy(self) -> (I2C, Delay) {
        (self.i2c, self.delay)
    }

    /// The most recent successful measurement.
    ///
    /// `None` before the first completed cycle, and again after any failed
    /// one, so a stale value can never be mistaken for a fresh reading.
    pub fn last_reading(&self) -> Option<Measurement> {
        self.last_reading
    }

    /// Read the one-byte status word.
    pub fn read_status(&mut self) -> Result<StatusBits, Error<E>> {
        let mut status = [0u8; 1];
        self.i2c
            .read(self.addr.as_u8(), &mut status)
            .map_err(Error::I2c)?;
        Ok(StatusBits::from(status[0]))
    }

    /// Initialize the device, recovering its calibration state if needed.
    ///
    /// A cold power-up can leave the AHT20 without its factory calibration
    /// loaded; in that case three undocumented registers are patched before
    /// the init command goes out. One pass either confirms the calibrated
    /// bit or fails with [`Error::InitFailed`]; re-running the whole call is
    /// safe and any retry/backoff loop belongs to the caller.
    pub fn init(&mut self) -> Result<(), Error<E>> {
        self.delay.delay_ms(POWER_ON_DELAY_MS);

        let status = self.read_status()?;
        if status.raw() & STATUS_POWER_ON_CALIBRATED != STATUS_POWER_ON_CALIBRATED {
            trace!("aht20 uncalibrated at power-up, patching registers");
            for reg in CALIBRATION_PATCH_REGISTERS {
                self.patch_register(reg)?;
            }
            self.delay.delay_ms(SETTLE_DELAY_MS);
        }

        self.i2c
            .write(self.addr.as_u8(), &Command::Initialize.frame())
            .map_err(Error::I2c)?;
        self.delay.delay_ms(SETTLE_DELAY_MS);

        if !self.read_status()?.calibrated {
            return Err(Error::InitFailed);
        }
        info!("{} initialized", CHIP_NAME);
        Ok(())
    }

    /// One step of the calibration recovery: read a register's two payload
    /// bytes back and rewrite them at `0xB0 | reg`. A failure part-way
    /// through the three-register sequence is not rolled back; the retry
    /// strategy is to run the whole sequence again.
    fn patch_register(&mut self, reg: u8) -> Result<(), Error<E>> {
        let mut response = [0u8; 3];
        self.i2c
            .write_read(self.addr.as_u8(), &[reg, 0x00, 0x00], &mut response)
            .map_err(Error::I2c)?;
        self.delay.delay_ms(SETTLE_DELAY_MS);
        self.i2c
            .write(
                self.addr.as_u8(),
                &[CALIBRATION_PATCH_WRITE_BASE | reg, response[1], response[2]],
            )
            .map_err(Error::I2c)?;
        Ok(())
    }

    /// Run one full measurement cycle.
    ///
    /// Triggers a conversion, polls the busy bit as `policy` allows, reads
    /// and (optionally) CRC-checks the frame, converts, and caches the
    /// result for [`Self::last_reading`]. Any failure clears the cache and
    /// is returned as-is; nothing of a failed cycle is observable.
    pub fn measure(&mut self, policy: PollPolicy) -> Result<Measurement, Error<E>> {
        match self.measure_cycle(policy) {
            Ok(reading) => {
                self.last_reading = Some(reading);
                Ok(reading)
            }
            Err(e) => {
                self.last_reading = None;
                Err(e)
            }
        }
    }

    fn measure_cycle(&mut self, policy: PollPolicy) -> Result<Measurement, Error<E>> {
        self.i2c
            .write(self.addr.as_u8(), &Command::TriggerMeasurement.frame())
            .map_err(Error::I2c)?;
        self.delay.delay_ms(policy.initial_delay_ms);

        // The trigger must not be reissued while the device reports busy;
        // from here on the cycle only polls and reads.
        let mut polls = 0;
        loop {
            if !self.read_status()?.busy {
                break;
            }
            polls += 1;
            if polls >= policy.max_polls {
                return Err(Error::Timeout);
            }
            self.delay.delay_ms(policy.poll_interval_ms);
        }

        let mut buf = [0u8; FRAME_LEN_CRC];
        let len = if self.validate_crc {
            FRAME_LEN_CRC
        } else {
            FRAME_LEN
        };
        self.i2c
            .read(self.addr.as_u8(), &mut buf[..len])
            .map_err(Error::I2c)?;
        let frame = &buf[..len];

        if self.validate_crc {
            let computed = frame_crc(&frame[..FRAME_LEN]);
            let received = frame[FRAME_LEN];
            if computed != received {
                warn!(
                    "aht20 crc mismatch: computed {} received {}",
                    computed, received
                );
                return Err(Error::CrcMismatch);
            }
        }

        let raw = RawMeasurement::from_frame(frame).ok_or(Error::InvalidFrame)?;
        trace!(
            "aht20 raw humidity {} temperature {}",
            raw.humidity, raw.temperature
        );
        Ok(Measurement::from(&raw))
    }

    /// Measure and return relative humidity in percent.
    ///
    /// Runs a full cycle; the temperature half of the same frame is decoded
    /// too and lands in [`Self::last_reading`].
    pub fn read_humidity(&mut self, policy: PollPolicy) -> Result<f32, Error<E>> {
        Ok(self.measure(policy)?.humidity_percent)
    }

    /// Measure and return the temperature in Centigrade.
    ///
    /// Runs a full cycle; the humidity half of the same frame is decoded too
    /// and lands in [`Self::last_reading`].
    pub fn read_temperature(&mut self, policy: PollPolicy) -> Result<f32, Error<E>> {
        Ok(self.measure(policy)?.centigrade)
    }
}
