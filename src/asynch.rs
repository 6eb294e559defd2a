//! Async driver, for use with [`embedded_hal_async`] I²C and delay
//! implementations.
//!
//! Mirrors the blocking API; see [`crate::blocking`] for the richer method
//! documentation.

use crate::fmt::{info, trace, warn};
use crate::hw_def::*;
use crate::types::*;

use embedded_hal_async::{delay::DelayNs, i2c::I2c};

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
    pub fn with_crc_validation(mut self, validate: bool) -> Self {
        self.validate_crc = validate;
        self
    }

    /// Release the I²C bus and delay handles.
    pub fn destroy(self) -> (I2C, Delay) {
        (self.i2c, self.delay)
    }

    /// The most recent successful measurement; cleared by a failed cycle.
    pub fn last_reading(&self) -> Option<Measurement> {
        self.last_reading
    }

    /// Read the one-byte status word.
    pub async fn read_status(&mut self) -> Result<StatusBits, Error<E>> {
        let mut status = [0u8; 1];
        self.i2c
            .read(self.addr.as_u8(), &mut status)
            .await
            .map_err(Error::I2c)?;
        Ok(StatusBits::from(status[0]))
    }

    /// Initialize the device, recovering its calibration state if needed.
    pub async fn init(&mut self) -> Result<(), Error<E>> {
        self.delay.delay_ms(POWER_ON_DELAY_MS).await;

        let status = self.read_status().await?;
        if status.raw() & STATUS_POWER_ON_CALIBRATED != STATUS_POWER_ON_CALIBRATED {
            trace!("aht20 uncalibrated at power-up, patching registers");
            for reg in CALIBRATION_PATCH_REGISTERS {
                self.patch_register(reg).await?;
            }
            self.delay.delay_ms(SETTLE_DELAY_MS).await;
        }

        self.i2c
            .write(self.addr.as_u8(), &Command::Initialize.frame())
            .await
            .map_err(Error::I2c)?;
        self.delay.delay_ms(SETTLE_DELAY_MS).await;

        if !self.read_status().await?.calibrated {
            return Err(Error::InitFailed);
        }
        info!("{} initialized", CHIP_NAME);
        Ok(())
    }

    async fn patch_register(&mut self, reg: u8) -> Result<(), Error<E>> {
        let mut response = [0u8; 3];
        self.i2c
            .write_read(self.addr.as_u8(), &[reg, 0x00, 0x00], &mut response)
            .await
            .map_err(Error::I2c)?;
        self.delay.delay_ms(SETTLE_DELAY_MS).await;
        self.i2c
            .write(
                self.addr.as_u8(),
                &[CALIBRATION_PATCH_WRITE_BASE | reg, response[1], response[2]],
            )
            .await
            .map_err(Error::I2c)?;
        Ok(())
    }

    /// Run one full measurement cycle; any failure clears the cached
    /// reading.
    pub async fn measure(&mut self, policy: PollPolicy) -> Result<Measurement, Error<E>> {
        match self.measure_cycle(policy).await {
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

    async fn measure_cycle(&mut self, policy: PollPolicy) -> Result<Measurement, Error<E>> {
        self.i2c
            .write(self.addr.as_u8(), &Command::TriggerMeasurement.frame())
            .await
            .map_err(Error::I2c)?;
        self.delay.delay_ms(policy.initial_delay_ms).await;

        // The trigger must not be reissued while the device reports busy;
        // from here on the cycle only polls and reads.
        let mut polls = 0;
        loop {
            if !self.read_status().await?.busy {
                break;
            }
            polls += 1;
            if polls >= policy.max_polls {
                return Err(Error::Timeout);
            }
            self.delay.delay_ms(policy.poll_interval_ms).await;
        }

        let mut buf = [0u8; FRAME_LEN_CRC];
        let len = if self.validate_crc {
            FRAME_LEN_CRC
        } else {
            FRAME_LEN
        };
        self.i2c
            .read(self.addr.as_u8(), &mut buf[..len])
            .await
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
    pub async fn read_humidity(&mut self, policy: PollPolicy) -> Result<f32, Error<E>> {
        Ok(self.measure(policy).await?.humidity_percent)
    }

    /// Measure and return the temperature in Centigrade.
    pub async fn read_temperature(&mut self, policy: PollPolicy) -> Result<f32, Error<E>> {
        Ok(self.measure(policy).await?.centigrade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};

    const ADDR: u8 = 0x38;

    #[tokio::test]
    async fn init_skips_recovery_when_calibrated() {
        let expectations = [
            Transaction::read(ADDR, vec![0x18]),
            Transaction::write(ADDR, vec![0xBE, 0x08, 0x00]),
            Transaction::read(ADDR, vec![0x18]),
        ];
        let mut aht20 = Aht20::new(
            I2cMock::new(&expectations),
            NoopDelay::new(),
            I2cAddr::AddrLow,
        );
        aht20.init().await.unwrap();
        let (mut i2c, _delay) = aht20.destroy();
        i2c.done();
    }

    #[tokio::test]
    async fn init_patches_registers_when_uncalibrated() {
        let expectations = [
            Transaction::read(ADDR, vec![0x00]),
            Transaction::write_read(ADDR, vec![0x1B, 0x00, 0x00], vec![0x00, 0xA1, 0xB2]),
            Transaction::write(ADDR, vec![0xB0 | 0x1B, 0xA1, 0xB2]),
            Transaction::write_read(ADDR, vec![0x1C, 0x00, 0x00], vec![0x00, 0xC3, 0xD4]),
            Transaction::write(ADDR, vec![0xB0 | 0x1C, 0xC3, 0xD4]),
            Transaction::write_read(ADDR, vec![0x1E, 0x00, 0x00], vec![0x00, 0xE5, 0xF6]),
            Transaction::write(ADDR, vec![0xB0 | 0x1E, 0xE5, 0xF6]),
            Transaction::write(ADDR, vec![0xBE, 0x08, 0x00]),
            Transaction::read(ADDR, vec![0x08]),
        ];
        let mut aht20 = Aht20::new(
            I2cMock::new(&expectations),
            NoopDelay::new(),
            I2cAddr::AddrLow,
        );
        aht20.init().await.unwrap();
        let (mut i2c, _delay) = aht20.destroy();
        i2c.done();
    }

    #[tokio::test]
    async fn measure_converts_a_crc_checked_frame() {
        let expectations = [
            Transaction::write(ADDR, vec![0xAC, 0x33, 0x00]),
            Transaction::read(ADDR, vec![0x18]),
            Transaction::read(ADDR, vec![0x1C, 0x65, 0xB4, 0x25, 0xCD, 0x26, 0xC6]),
        ];
        let mut aht20 = Aht20::new(
            I2cMock::new(&expectations),
            NoopDelay::new(),
            I2cAddr::AddrLow,
        );
        let reading = aht20.measure(PollPolicy::default()).await.unwrap();
        assert!(reading.humidity_percent > 39.0 && reading.humidity_percent < 41.0);
        assert!(reading.centigrade > 22.0 && reading.centigrade < 23.0);
        assert_eq!(aht20.last_reading(), Some(reading));
        let (mut i2c, _delay) = aht20.destroy();
        i2c.done();
    }

    #[tokio::test]
    async fn measure_times_out_when_the_device_stays_busy() {
        let expectations = [
            Transaction::write(ADDR, vec![0xAC, 0x33, 0x00]),
            Transaction::read(ADDR, vec![0x98]),
            Transaction::read(ADDR, vec![0x98]),
        ];
        let mut aht20 = Aht20::new(
            I2cMock::new(&expectations),
            NoopDelay::new(),
            I2cAddr::AddrLow,
        );
        let policy = PollPolicy {
            max_polls: 2,
            ..PollPolicy::default()
        };
        assert_eq!(aht20.measure(policy).await, Err(Error::Timeout));
        assert_eq!(aht20.last_reading(), None);
        let (mut i2c, _delay) = aht20.destroy();
        i2c.done();
    }
}
