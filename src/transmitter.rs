//! Bit-banged OOK transmitter.
//!
//! [`Transmitter`] drives a single data line (the `DATA` pin of an FS1000A-style module)
//! through a sequence of line levels, holding each one for one cell period. It knows
//! nothing about framing: the transports hand it an iterator of levels and a cell length.
//!
//! ## Timing
//!
//! Every cell waits *before* its level change. For an off→on change the wait is split
//! around the pin write so the carrier's turn-on latency is absorbed, see
//! [`Compensation`]. After the last cell one more cell period elapses and the line is
//! driven low.
//!
//! With the `timer-isr` feature each copy of a frame is emitted inside
//! `critical_section::with`; guard delays between copies run with interrupts enabled.
//!
//! ## Example
//!
//! ```rust
//! # use embedded_hal_mock::eh1::digital::{Mock as Pin, State as PinState, Transaction as PinTransaction};
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! use wattnode433::timer::Compensation;
//! use wattnode433::transmitter::Transmitter;
//!
//! # let pin = Pin::new(&[
//! #     PinTransaction::set(PinState::Low),
//! #     PinTransaction::set(PinState::High),
//! #     PinTransaction::set(PinState::Low),
//! #     PinTransaction::set(PinState::Low),
//! # ]);
//! let mut transmitter = Transmitter::new(pin, Compensation::default());
//! transmitter.transmit([true, false], 833, &mut NoopDelay::new()).unwrap();
//! # transmitter.release().done();
//! ```

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{Error as _, OutputPin};

use crate::consts::{DEFAULT_REPEAT_COUNT, DEFAULT_REPEAT_GUARD_MS};
use crate::error::Error;
use crate::timer::{CellTiming, Compensation, without_interrupts};

/// How often a frame is put on air and the silence between copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub struct RepeatPolicy {
    /// Number of copies. Zero is treated as one.
    pub count: u8,
    /// Guard delay between two copies in milliseconds. Not applied after the last copy.
    pub guard_ms: u32,
}

impl Default for RepeatPolicy {
    fn default() -> Self {
        Self {
            count: DEFAULT_REPEAT_COUNT,
            guard_ms: DEFAULT_REPEAT_GUARD_MS,
        }
    }
}

impl RepeatPolicy {
    /// Number of copies actually sent.
    pub fn copies(&self) -> u8 {
        self.count.max(1)
    }
}

/// Drives the radio data line.
///
/// ## Type Parameters
///
/// - `TX`: A type implementing [`embedded_hal::digital::OutputPin`], high = carrier on
#[derive(Debug)]
pub struct Transmitter<TX>
where
    TX: OutputPin,
{
    tx: TX,
    compensation: Compensation,
    level: bool,
}

impl<TX> Transmitter<TX>
where
    TX: OutputPin,
{
    /// Creates a transmitter over `tx`.
    ///
    /// # Arguments
    /// - `tx`: The output pin keying the transmitter
    /// - `compensation`: Turn-on compensation, `Compensation::default()` for none
    ///
    /// # Notes
    /// TX is driven `LOW` initially (carrier off).
    pub fn new(tx: TX, compensation: Compensation) -> Self {
        let mut tx = tx;
        let _ = tx.set_low(); // Ensure idle
        Self {
            tx,
            compensation,
            level: false,
        }
    }

    /// Active turn-on compensation.
    pub fn compensation(&self) -> Compensation {
        self.compensation
    }

    /// Replaces the turn-on compensation.
    pub fn set_compensation(&mut self, compensation: Compensation) {
        self.compensation = compensation;
    }

    /// Whether the carrier is currently keyed.
    pub fn is_on(&self) -> bool {
        self.level
    }

    /// Releases the data pin.
    pub fn release(self) -> TX {
        self.tx
    }

    fn write(&mut self, level: bool) -> Result<(), Error> {
        let result = if level {
            self.tx.set_high()
        } else {
            self.tx.set_low()
        };
        result.map_err(|e| {
            let kind = e.kind();
            error!("radio pin write failed: {:?}", kind);
            Error::Pin(kind)
        })?;
        self.level = level;
        Ok(())
    }

    fn emit<I, D>(&mut self, cells: I, timing: CellTiming, delay: &mut D) -> Result<(), Error>
    where
        I: IntoIterator<Item = bool>,
        D: DelayNs,
    {
        for level in cells {
            if level && !self.level {
                delay.delay_us(timing.main_us);
                self.write(true)?;
                if timing.advance_us > 0 {
                    delay.delay_us(timing.advance_us);
                }
            } else {
                delay.delay_us(timing.period_us());
                self.write(level)?;
            }
        }
        // The last level is held for a full cell before the carrier goes off.
        delay.delay_us(timing.period_us());
        self.write(false)
    }

    /// Sends one sequence of line levels.
    ///
    /// # Arguments
    /// - `cells`: Line levels, one per cell, `true` = carrier on
    /// - `cell_period_us`: Nominal cell length in microseconds
    /// - `delay`: The blocking delay timing the cells
    ///
    /// # Errors
    /// [`Error::Pin`] if the data pin rejects a write. The line is then driven low on a
    /// best-effort basis.
    pub fn transmit<I, D>(
        &mut self,
        cells: I,
        cell_period_us: u32,
        delay: &mut D,
    ) -> Result<(), Error>
    where
        I: IntoIterator<Item = bool>,
        D: DelayNs,
    {
        let timing = CellTiming::new(cell_period_us, self.compensation);
        let result = without_interrupts(|| self.emit(cells, timing, delay));
        if result.is_err() {
            let _ = self.tx.set_low();
            self.level = false;
        }
        result
    }

    /// Sends the sequence produced by `cells` as often as `policy` asks.
    ///
    /// `cells` is called once per copy. The guard delay runs between copies only, outside
    /// the critical section.
    pub fn transmit_repeated<F, I, D>(
        &mut self,
        policy: RepeatPolicy,
        cell_period_us: u32,
        mut cells: F,
        delay: &mut D,
    ) -> Result<(), Error>
    where
        F: FnMut() -> I,
        I: IntoIterator<Item = bool>,
        D: DelayNs,
    {
        for copy in 0..policy.copies() {
            if copy != 0 {
                delay.delay_ms(policy.guard_ms);
            }
            trace!("frame copy {}", copy);
            self.transmit(cells(), cell_period_us, delay)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::RefCell;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };
    use std::rc::Rc;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Wait(u64),
        Line(bool),
    }

    type Log = Rc<RefCell<Vec<Event>>>;

    /// Pin and delay writing into one shared log, so their interleaving can be checked.
    struct LoggedPin(Log);
    struct LoggedDelay(Log);

    impl ErrorType for LoggedPin {
        type Error = Infallible;
    }

    impl OutputPin for LoggedPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().push(Event::Line(false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().push(Event::Line(true));
            Ok(())
        }
    }

    impl DelayNs for LoggedDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().push(Event::Wait(u64::from(ns) / 1_000));
        }

        fn delay_us(&mut self, us: u32) {
            self.0.borrow_mut().push(Event::Wait(u64::from(us)));
        }

        fn delay_ms(&mut self, ms: u32) {
            self.0.borrow_mut().push(Event::Wait(u64::from(ms) * 1_000));
        }
    }

    fn logged(compensation: Compensation) -> (Transmitter<LoggedPin>, LoggedDelay, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let transmitter = Transmitter::new(LoggedPin(log.clone()), compensation);
        log.borrow_mut().clear();
        (transmitter, LoggedDelay(log.clone()), log)
    }

    /// Fails every write after the first `ok` ones.
    struct FlakyPin {
        ok: usize,
    }

    impl ErrorType for FlakyPin {
        type Error = ErrorKind;
    }

    impl OutputPin for FlakyPin {
        fn set_low(&mut self) -> Result<(), ErrorKind> {
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), ErrorKind> {
            if self.ok == 0 {
                return Err(ErrorKind::Other);
            }
            self.ok -= 1;
            Ok(())
        }
    }

    fn sets(levels: &[bool]) -> Vec<PinTransaction> {
        levels
            .iter()
            .map(|&on| PinTransaction::set(if on { PinState::High } else { PinState::Low }))
            .collect()
    }

    #[test]
    fn test_transmitter_initialization() {
        let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
        let transmitter = Transmitter::new(tx, Compensation::default());
        assert!(!transmitter.is_on());
        transmitter.release().done();
    }

    #[test]
    fn test_every_cell_writes_the_line_then_goes_low() {
        let cells = [true, false, false, true, true];
        // idle low, one write per cell, final low
        let mut expected = sets(&[false]);
        expected.extend(sets(&cells));
        expected.extend(sets(&[false]));
        let tx = PinMock::new(&expected);

        let mut transmitter = Transmitter::new(tx, Compensation::default());
        transmitter.transmit(cells, 417, &mut NoopDelay::new()).unwrap();
        assert!(!transmitter.is_on());
        transmitter.release().done();
    }

    #[test]
    fn test_plain_cells_wait_one_period_before_each_change() {
        let (mut transmitter, mut delay, log) = logged(Compensation::default());
        transmitter.transmit([true, false], 833, &mut delay).unwrap();
        assert_eq!(
            *log.borrow(),
            [
                Event::Wait(833),
                Event::Line(true),
                Event::Wait(833),
                Event::Line(false),
                Event::Wait(833),
                Event::Line(false),
            ]
        );
    }

    #[test]
    fn test_turn_on_compensation_splits_off_to_on_cells() {
        let compensation = Compensation {
            baud_adjust_us: -15,
            on_delay_us: 100,
        };
        let (mut transmitter, mut delay, log) = logged(compensation);
        transmitter
            .transmit([true, true, false, true], 833, &mut delay)
            .unwrap();
        assert_eq!(
            *log.borrow(),
            [
                // off -> on: main, key, advance
                Event::Wait(718),
                Event::Line(true),
                Event::Wait(100),
                // on -> on
                Event::Wait(818),
                Event::Line(true),
                // on -> off
                Event::Wait(818),
                Event::Line(false),
                // off -> on again
                Event::Wait(718),
                Event::Line(true),
                Event::Wait(100),
                // trailing cell, carrier off
                Event::Wait(818),
                Event::Line(false),
            ]
        );
    }

    #[test]
    fn test_repeat_count_and_guard() {
        let (mut transmitter, mut delay, log) = logged(Compensation::default());
        let policy = RepeatPolicy {
            count: 3,
            guard_ms: 100,
        };
        transmitter
            .transmit_repeated(policy, 500, || [true], &mut delay)
            .unwrap();
        let copy = [
            Event::Wait(500),
            Event::Line(true),
            Event::Wait(500),
            Event::Line(false),
        ];
        let guard = Event::Wait(100_000);
        let mut expected = Vec::new();
        expected.extend(copy);
        expected.push(guard);
        expected.extend(copy);
        expected.push(guard);
        expected.extend(copy);
        assert_eq!(*log.borrow(), expected);
    }

    #[test]
    fn test_zero_repeat_count_still_sends_once() {
        let (mut transmitter, mut delay, log) = logged(Compensation::default());
        let policy = RepeatPolicy {
            count: 0,
            guard_ms: 100,
        };
        transmitter
            .transmit_repeated(policy, 500, || [false], &mut delay)
            .unwrap();
        assert_eq!(log.borrow().len(), 4);
        assert!(!log.borrow().contains(&Event::Wait(100_000)));
    }

    #[test]
    fn test_pin_error_is_reported_and_line_released() {
        let mut transmitter = Transmitter::new(FlakyPin { ok: 1 }, Compensation::default());
        let result = transmitter.transmit([true, false, true], 100, &mut NoopDelay::new());
        assert_eq!(result, Err(Error::Pin(ErrorKind::Other)));
        assert!(!transmitter.is_on());
    }

    #[test]
    fn test_default_repeat_policy() {
        let policy = RepeatPolicy::default();
        assert_eq!(policy.copies(), 2);
        assert_eq!(policy.guard_ms, 100);
    }
}
