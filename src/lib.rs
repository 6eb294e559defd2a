//! This is a platform-agnostic Rust driver for the ASAIR AHT20 humidity and
//! temperature digital sensor using the [`embedded-hal`] or
//! [`embedded-hal-async`] traits.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal
//! [`embedded-hal-async`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal-async
//!
//! This driver allows you to:
//! - Initialize the sensor, including the undocumented register patch that
//!   restores factory calibration after a cold power-up.
//! - Trigger a measurement and read it back as relative humidity and
//!   temperature, with the busy-wait bounded by a caller-supplied poll
//!   policy.
//! - Validate measurement frames against the device's CRC, or opt out and
//!   read the shorter frame.
//! - Read the raw status byte (busy and calibrated flags).
//! - blocking API support.
//! - async API support.
//!
//! This driver does not support the following device features:
//! - The soft-reset command.
//! - Multi-device bus arbitration (share the bus with `embedded-hal-bus` or
//!   similar).
//!
//! ## Features
//!
//! - `async`: Enables async API.
//! - `blocking`: Enables blocking API.
//! - `defmt`: Enables logging using the `defmt` framework.
//! - `log`: Enables logging using the `log` framework.
//!
//! ## The sensor
//!
//! The AHT20 is a capacitive relative humidity (RH) and temperature sensor
//! with a factory-calibrated digital I²C interface. Each measurement is
//! returned as a pair of 20-bit readings packed into a 6-byte frame, with an
//! optional trailing CRC byte. A conversion takes around 80 ms, during which
//! the device reports itself busy via bit 7 of its status byte; bit 3
//! indicates whether the factory calibration is loaded.
//!
//! Datasheet:
//!   [AHT20](https://cdn-learn.adafruit.com/assets/assets/000/091/676/original/AHT20-datasheet-2020-4-16.pdf)
//!
//! To use this driver, import this crate and an `embedded_hal` or
//! `embedded_hal_async` implementation, then instantiate the device.
//!
//! ## Blocking example:
//!
//! ```
//! use aht20::{Aht20, I2cAddr, PollPolicy};
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! # use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
//! # let expectations = [
//! #     // init: already calibrated, no register patch needed
//! #     Transaction::read(0x38, vec![0x18]),
//! #     Transaction::write(0x38, vec![0xBE, 0x08, 0x00]),
//! #     Transaction::read(0x38, vec![0x18]),
//! #     // measure: trigger, one status poll, 7-byte frame
//! #     Transaction::write(0x38, vec![0xAC, 0x33, 0x00]),
//! #     Transaction::read(0x38, vec![0x18]),
//! #     Transaction::read(0x38, vec![0x1C, 0x65, 0xB4, 0x25, 0xCD, 0x26, 0xC6]),
//! # ];
//!
//! // Platform-specific
//! let i2c = /* embedded_hal::i2c::I2c instance */
//! # I2cMock::new(&expectations);
//! let delay = /* embedded_hal::delay::DelayNs instance */
//! # NoopDelay::new();
//!
//! let mut aht20 = Aht20::new(i2c, delay, I2cAddr::AddrLow);
//! aht20.init().unwrap();
//!
//! let reading = aht20.measure(PollPolicy::default()).unwrap();
//! println!("{:3.1} %RH, {:0.1} °C", reading.humidity_percent, reading.centigrade);
//! # let (mut i2c, _delay) = aht20.destroy();
//! # i2c.done();
//! ```
//!
//! ## Async example:
//!
//! ```no_run
//! use aht20::{I2cAddr, PollPolicy, asynch::Aht20};
//!
//! async fn sample(
//!     i2c: impl embedded_hal_async::i2c::I2c,
//!     delay: impl embedded_hal_async::delay::DelayNs,
//! ) -> f32 {
//!     let mut aht20 = Aht20::new(i2c, delay, I2cAddr::AddrLow);
//!     aht20.init().await.unwrap();
//!     aht20.measure(PollPolicy::default()).await.unwrap().centigrade
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

#[cfg(not(any(feature = "async", feature = "blocking")))]
compile_error!("At least one of \"async\" and \"blocking\" features must be enabled");

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

#[cfg(feature = "async")]
pub mod asynch;
#[cfg(feature = "blocking")]
pub mod blocking;
mod fmt;
mod hw_def;
mod types;

pub use crate::{hw_def::*, types::*};

#[cfg(feature = "blocking")]
pub use crate::blocking::Aht20;
