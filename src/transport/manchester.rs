//! Manchester-coded, CRC-framed transport.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use super::FrameTransport;
use crate::error::Error;
use crate::frame::Frame;
use crate::timer::bit_period_us;
use crate::transmitter::{RepeatPolicy, Transmitter};

/// Sends payloads as Manchester-coded [`Frame`]s.
///
/// Each bit occupies two cells of half the bit period.
#[derive(Debug)]
pub struct ManchesterTransport<TX>
where
    TX: OutputPin,
{
    transmitter: Transmitter<TX>,
    bit_rate: u32,
    repeat: RepeatPolicy,
}

impl<TX> ManchesterTransport<TX>
where
    TX: OutputPin,
{
    /// Creates the transport.
    pub fn new(transmitter: Transmitter<TX>, bit_rate: u32, repeat: RepeatPolicy) -> Self {
        Self {
            transmitter,
            bit_rate,
            repeat,
        }
    }

    /// Length of one half-bit cell in microseconds.
    pub fn cell_period_us(&self) -> u32 {
        bit_period_us(self.bit_rate) / 2
    }

    /// Releases the transmitter.
    pub fn release(self) -> Transmitter<TX> {
        self.transmitter
    }
}

impl<TX> FrameTransport for ManchesterTransport<TX>
where
    TX: OutputPin,
{
    fn send<D: DelayNs>(&mut self, payload: &[u8], delay: &mut D) -> Result<(), Error> {
        let frame = Frame::build(payload)?;
        trace!("manchester frame of {} bytes", frame.len());
        let period = self.cell_period_us();
        self.transmitter
            .transmit_repeated(self.repeat, period, || frame.cells(), delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::FRAME_OVERHEAD;
    use crate::timer::Compensation;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use std::vec::Vec;

    /// Records every level written after construction.
    #[derive(Default)]
    struct TracePin(Vec<bool>);

    impl ErrorType for TracePin {
        type Error = Infallible;
    }

    impl OutputPin for TracePin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.push(true);
            Ok(())
        }
    }

    #[test]
    fn test_sends_frame_cells_per_copy() {
        let transmitter = Transmitter::new(TracePin::default(), Compensation::default());
        let policy = RepeatPolicy {
            count: 2,
            guard_ms: 100,
        };
        let mut transport = ManchesterTransport::new(transmitter, 1_200, policy);
        transport.send(b"hi", &mut NoopDelay::new()).unwrap();

        let written = transport.release().release().0;
        let frame = Frame::build(b"hi").unwrap();
        let copy: Vec<bool> = frame.cells().chain([false]).collect();
        assert_eq!(copy.len(), (2 + FRAME_OVERHEAD) * 16 + 1);

        // idle low, then two identical copies each ending low
        assert!(!written[0]);
        assert_eq!(&written[1..=copy.len()], &copy[..]);
        assert_eq!(&written[copy.len() + 1..], &copy[..]);
    }

    #[test]
    fn test_half_bit_cells() {
        let transmitter = Transmitter::new(TracePin::default(), Compensation::default());
        let transport = ManchesterTransport::new(transmitter, 1_200, RepeatPolicy::default());
        assert_eq!(transport.cell_period_us(), 416);
    }
}
