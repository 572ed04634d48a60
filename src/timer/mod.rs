//! Timer, wake-flag and bit-timing utilities.
//!
//! The node has exactly one asynchronous source: the watchdog timer interrupt. Its
//! handler only sets the [`WakeFlag`]; everything else runs in the main flow.
//! This employs two approaches: a real watchdog interrupt (`timer-isr` feature, see
//! [`declare_wake_flag!`](crate::declare_wake_flag) and [`wake_isr!`](crate::wake_isr)),
//! or a blocking-delay stand-in for boards without one (`delay-loop` feature).
//!
//! Contains:
//! - [`WakeFlag`]: the ISR → main-flow signal
//! - [`WatchdogInterval`]: the hardware watchdog periods and their AVR prescaler bits
//! - [`bit_period_us`] / [`const_bit_period_us`]: nominal cell length from the bit rate
//! - [`Compensation`]: transmitter turn-on compensation
//!
//! Watchdog prescalers: (For use with [`WatchdogInterval::prescaler_bits`])
//!
//! | WDP3..0 | Interval |
//! |---------|----------|
//! |  0b0000 |    16 ms |
//! |  0b0011 |   125 ms |
//! |  0b0110 |     1 s  |
//! |  0b0111 |     2 s  |
//! |  0b1000 |     4 s  |
//! |  0b1001 |     8 s  |

use core::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg_attr(feature = "delay-loop", allow(unused_imports))]
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;
#[cfg_attr(feature = "timer-isr", allow(unused_imports))]
#[cfg(feature = "timer-isr")]
pub use macros::*;

/// Runs `f` directly; without `timer-isr` there is no interrupt to mask.
#[cfg(not(feature = "timer-isr"))]
pub fn without_interrupts<R>(f: impl FnOnce() -> R) -> R {
    f()
}

/// Microseconds per second.
pub const MICROSECONDS_PER_SECOND: u32 = 1_000_000;

/// Signal from the watchdog interrupt to the sleeping main flow.
///
/// Set with `Release` from interrupt context, observed with `Acquire` in the wake
/// loop, cleared with `Release` before the CPU halts. Only single-byte loads and
/// stores are used, so this works on targets without compare-and-swap (AVR).
#[derive(Debug, Default)]
pub struct WakeFlag(AtomicBool);

impl WakeFlag {
    /// A cleared flag, usable in a `static`.
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Marks the wake event. The only thing an ISR should call.
    #[inline(always)]
    pub fn set(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Clears the flag. Must happen before the CPU is halted.
    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether the wake event has been observed.
    #[inline]
    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Spins until the flag is set.
    ///
    /// Only meant for the short window between a wake-up and the ISR having run.
    pub fn wait(&self) {
        while !self.is_set() {
            core::hint::spin_loop();
        }
    }
}

/// Hardware watchdog periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum WatchdogInterval {
    /// ~16 ms
    Ms16,
    /// ~125 ms
    Ms125,
    /// ~1 s
    S1,
    /// ~2 s
    S2,
    /// ~4 s
    S4,
    /// ~8 s, the longest period the watchdog supports.
    #[default]
    S8,
}

impl WatchdogInterval {
    /// Nominal length of the interval in milliseconds.
    pub const fn as_millis(self) -> u32 {
        match self {
            Self::Ms16 => 16,
            Self::Ms125 => 125,
            Self::S1 => 1_000,
            Self::S2 => 2_000,
            Self::S4 => 4_000,
            Self::S8 => 8_000,
        }
    }

    /// WDP3..WDP0 bits for an AVR `WDTCR`/`WDTCSR` register, WDP3 at bit 5.
    pub const fn prescaler_bits(self) -> u8 {
        let wdp: u8 = match self {
            Self::Ms16 => 0b0000,
            Self::Ms125 => 0b0011,
            Self::S1 => 0b0110,
            Self::S2 => 0b0111,
            Self::S4 => 0b1000,
            Self::S8 => 0b1001,
        };
        ((wdp & 0b1000) << 2) | (wdp & 0b0111)
    }
}

/// Nominal length of one bit on air, in microseconds.
///
/// # Arguments
/// - `bit_rate`: bits per second (e.g. 1200). Zero is treated as 1.
pub fn bit_period_us(bit_rate: u32) -> u32 {
    MICROSECONDS_PER_SECOND / bit_rate.max(1)
}

/// Compile-time [`bit_period_us`].
pub const fn const_bit_period_us(bit_rate: u32) -> u32 {
    let rate = if bit_rate == 0 { 1 } else { bit_rate };
    MICROSECONDS_PER_SECOND / rate
}

/// Transmitter timing compensation.
///
/// Cheap OOK transmitters take a measurable time to reach full carrier after the data
/// line goes high. To keep the received edges on the nominal grid, the wait of each
/// cell is placed *before* its level change, and for an off→on change part of that wait
/// (`on_delay_us`) is moved after the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct Compensation {
    /// Signed correction of every cell period, for clock inaccuracy.
    pub baud_adjust_us: i32,
    /// Measured carrier turn-on latency of the transmitter.
    pub on_delay_us: u32,
}

/// The two waits making up one cell, see [`Compensation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct CellTiming {
    /// Wait before the level change.
    pub main_us: u32,
    /// Wait after an off→on change, or appended to `main_us` otherwise.
    pub advance_us: u32,
}

impl CellTiming {
    /// Splits a nominal cell period according to `compensation`.
    pub fn new(period_us: u32, compensation: Compensation) -> Self {
        let adjusted = i64::from(period_us) + i64::from(compensation.baud_adjust_us);
        let main = adjusted - i64::from(compensation.on_delay_us);
        Self {
            main_us: main.clamp(0, i64::from(u32::MAX)) as u32,
            advance_us: compensation.on_delay_us,
        }
    }

    /// Total length of one cell.
    pub fn period_us(&self) -> u32 {
        self.main_us.saturating_add(self.advance_us)
    }
}
