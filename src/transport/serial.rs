//! UART-style bit-serial transport with a trailing CRC-16.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use super::FrameTransport;
use crate::consts::MAX_PAYLOAD_LEN;
use crate::crc::crc16_ccitt_false;
use crate::encoding::serial_levels;
use crate::error::Error;
use crate::timer::bit_period_us;
use crate::transmitter::{RepeatPolicy, Transmitter};

/// Buffer holding a payload and its trailing CRC.
pub type SerialBuf = Vec<u8, { MAX_PAYLOAD_LEN + 2 }>;

/// Payload followed by its CRC-16/CCITT-FALSE, high byte first.
///
/// # Errors
/// [`Error::PayloadTooLong`] above [`MAX_PAYLOAD_LEN`] bytes.
pub fn serial_bytes(payload: &[u8]) -> Result<SerialBuf, Error> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLong {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }
    let mut bytes = Vec::new();
    let _ = bytes.extend_from_slice(payload);
    let _ = bytes.extend_from_slice(&crc16_ccitt_false(payload).to_be_bytes());
    Ok(bytes)
}

/// Sends payloads as UART-like bit-serial bytes with a trailing CRC.
///
/// There is no preamble and no start-of-frame marker, so this profile is only suitable
/// where the receiver is synchronised by other means.
#[derive(Debug)]
pub struct SerialTransport<TX>
where
    TX: OutputPin,
{
    transmitter: Transmitter<TX>,
    bit_rate: u32,
    repeat: RepeatPolicy,
}

impl<TX> SerialTransport<TX>
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

    /// Releases the transmitter.
    pub fn release(self) -> Transmitter<TX> {
        self.transmitter
    }
}

impl<TX> FrameTransport for SerialTransport<TX>
where
    TX: OutputPin,
{
    fn send<D: DelayNs>(&mut self, payload: &[u8], delay: &mut D) -> Result<(), Error> {
        let bytes = serial_bytes(payload)?;
        let period = bit_period_us(self.bit_rate);
        self.transmitter
            .transmit_repeated(self.repeat, period, || serial_levels(&bytes), delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::Compensation;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn test_crc_trails_payload_high_byte_first() {
        let bytes = serial_bytes(b"123456789").unwrap();
        assert_eq!(&bytes[..9], b"123456789");
        assert_eq!(&bytes[9..], &[0x29, 0xb1]);
    }

    #[test]
    fn test_empty_payload_carries_init_crc() {
        assert_eq!(serial_bytes(&[]).unwrap().as_slice(), &[0xff, 0xff]);
    }

    #[test]
    fn test_line_levels_on_air() {
        let bytes = serial_bytes(&[0x01]).unwrap();
        let levels: std::vec::Vec<bool> = serial_levels(&bytes).collect();
        assert_eq!(levels.len(), 3 * 10);
        // start bit, data bit 0 set, seven clear data bits, stop bit
        assert_eq!(
            &levels[..10],
            &[true, true, false, false, false, false, false, false, false, false]
        );

        let mut expected = std::vec![PinTransaction::set(PinState::Low)];
        for level in levels {
            expected.push(PinTransaction::set(if level {
                PinState::High
            } else {
                PinState::Low
            }));
        }
        expected.push(PinTransaction::set(PinState::Low));

        let tx = PinMock::new(&expected);
        let policy = RepeatPolicy {
            count: 1,
            guard_ms: 0,
        };
        let mut transport =
            SerialTransport::new(Transmitter::new(tx, Compensation::default()), 1_200, policy);
        transport.send(&[0x01], &mut NoopDelay::new()).unwrap();
        transport.release().release().done();
    }
}
