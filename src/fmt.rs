//! Routes the driver's log statements to `defmt` or `log`; with neither
//! feature enabled they expand to nothing.

#[cfg(feature = "defmt")]
pub(crate) use defmt::{info, trace, warn};

#[cfg(feature = "log")]
pub(crate) use log::{info, trace, warn};

#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! info {
    ($($arg:tt)*) => {};
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! warn_noop {
    ($($arg:tt)*) => {};
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
pub(crate) use {info, trace};
#[cfg(not(any(feature = "defmt", feature = "log")))]
pub(crate) use warn_noop as warn;
