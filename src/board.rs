//! Board collaborators.
//!
//! The metering core never touches registers. Everything board specific is reached
//! through the traits below (plus `embedded-hal`'s `OutputPin` and `DelayNs`), so the
//! same scheduler runs on an ATtiny, a Cortex-M part, or a host test harness.

use core::fmt::Debug;

use crate::measure::Channel;

/// Analog sampling of the metering channels.
pub trait AnalogSource {
    /// Error reported by the ADC.
    type Error: Debug;

    /// Starts or polls a conversion of `channel`.
    ///
    /// Returns `Err(nb::Error::WouldBlock)` while the conversion is running.
    fn read(&mut self, channel: Channel) -> nb::Result<u16, Self::Error>;
}

/// Byte-addressed non-volatile storage (EEPROM, emulated EEPROM in flash, FRAM).
pub trait NvStorage {
    /// Error reported by the storage.
    type Error: Debug;

    /// Fills `buf` with the bytes stored at `offset`.
    fn read(&mut self, offset: u16, buf: &mut [u8]) -> Result<(), Self::Error>;

    /// Stores `bytes` at `offset`.
    fn write(&mut self, offset: u16, bytes: &[u8]) -> Result<(), Self::Error>;
}

/// Low-power halt until the next watchdog interrupt.
///
/// Implementations enter the deepest sleep mode that keeps the watchdog running and
/// return once the CPU has woken up. The wake flag is handled by the caller.
pub trait LowPower {
    /// Halts the CPU until an interrupt wakes it.
    fn halt(&mut self);
}

/// Monotonic millisecond time base.
///
/// The counter may wrap; the scheduler only ever looks at wrapping differences. It must
/// keep counting across deep sleep (for example by adding the watchdog period on each
/// wake), otherwise slept time is missing from the energy total.
pub trait Clock {
    /// Milliseconds since an arbitrary epoch.
    fn now_ms(&mut self) -> u32;
}

/// Diagnostic events reported through the indicator LED.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum BlinkCode {
    /// The energy total has been loaded and the node is about to start cycling.
    Boot,
    /// A new measurement cycle has started.
    Alive,
    /// Battery below the floor; transmission skipped.
    Undervoltage,
    /// The analog source failed; the cycle was skipped.
    MeasureFailed,
    /// The frame could not be put on air.
    TransmitFailed,
    /// The energy total could not be written.
    PersistFailed,
}

/// Diagnostic indicator, typically an LED blink pattern.
pub trait Indicator {
    /// Shows `code`.
    fn signal(&mut self, code: BlinkCode);
}

/// No indicator fitted.
impl Indicator for () {
    fn signal(&mut self, _code: BlinkCode) {}
}
