use embedded_hal::delay::DelayNs;

use super::{WakeFlag, WatchdogInterval};
use crate::board::LowPower;

/// A [`LowPower`] stand-in that blocks on a delay instead of halting the CPU.
///
/// This is for environments where a watchdog interrupt is unavailable or undesired
/// (bring-up, host simulation). Each `halt()` blocks for one watchdog interval using a
/// delay provider implementing `embedded_hal::delay::DelayNs`, then sets the wake flag
/// itself, exactly as the watchdog ISR would.
///
/// # Example
/// ```rust
/// use embedded_hal::delay::DelayNs;
/// use wattnode433::board::LowPower;
/// use wattnode433::timer::{DelaySleep, WakeFlag, WatchdogInterval};
///
/// struct NoDelay;
/// impl DelayNs for NoDelay {
///     fn delay_ns(&mut self, _ns: u32) {}
/// }
///
/// let flag = WakeFlag::new();
/// let mut sleeper = DelaySleep::new(NoDelay, WatchdogInterval::S8, &flag);
/// sleeper.halt();
/// assert!(flag.is_set());
/// ```
///
/// # Notes
/// - Burns power for the whole interval; never use it on a battery-powered build.
#[derive(Debug)]
pub struct DelaySleep<'a, D: DelayNs> {
    delay: D,
    interval: WatchdogInterval,
    flag: &'a WakeFlag,
}

impl<'a, D: DelayNs> DelaySleep<'a, D> {
    /// Creates a sleeper that blocks for `interval` and then sets `flag`.
    pub fn new(delay: D, interval: WatchdogInterval, flag: &'a WakeFlag) -> Self {
        Self {
            delay,
            interval,
            flag,
        }
    }

    /// Releases the delay provider.
    pub fn release(self) -> D {
        self.delay
    }
}

impl<D: DelayNs> LowPower for DelaySleep<'_, D> {
    fn halt(&mut self) {
        self.delay.delay_ms(self.interval.as_millis());
        self.flag.set();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct TotalDelay(u64);

    impl DelayNs for TotalDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0 += u64::from(ns);
        }
    }

    #[test]
    fn test_halt_blocks_one_interval_then_wakes() {
        let flag = WakeFlag::new();
        let mut sleeper = DelaySleep::new(TotalDelay::default(), WatchdogInterval::S1, &flag);
        sleeper.halt();
        assert!(flag.is_set());
        assert_eq!(sleeper.release().0, 1_000_000_000);
    }
}
