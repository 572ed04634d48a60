//! RadioHead `RH_ASK` compatible 4b6b transport.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use heapless::Vec;

use super::FrameTransport;
use crate::consts::{MAX_PAYLOAD_LEN, RH_MAX_BUF_LEN, RH_OVERHEAD, RH_PREAMBLE};
use crate::crc::{CRC16_INIT, crc_ccitt_update};
use crate::encoding::{SYMBOLS, encode_4b6b, symbol_levels};
use crate::error::Error;
use crate::timer::bit_period_us;
use crate::transmitter::{RepeatPolicy, Transmitter};

/// 6-bit symbols of one RadioHead transmission, preamble included.
pub type SymbolBuf = Vec<u8, RH_MAX_BUF_LEN>;

/// Encodes `payload` into the symbols an `RH_ASK`/VirtualWire receiver expects.
///
/// ```text
/// [training preamble (8 symbols)][count][payload...][fcs lo][fcs hi]
/// ```
///
/// `count` is `payload.len() + 3`; the FCS is the ones-complement of the CCITT CRC over
/// count and payload. Every byte after the preamble becomes two 4b6b symbols, high
/// nibble first.
///
/// # Errors
/// [`Error::PayloadTooLong`] above [`MAX_PAYLOAD_LEN`] bytes.
pub fn encode_symbols(payload: &[u8]) -> Result<SymbolBuf, Error> {
    if payload.len() > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLong {
            len: payload.len(),
            max: MAX_PAYLOAD_LEN,
        });
    }

    let mut symbols = Vec::new();
    let _ = symbols.extend_from_slice(&RH_PREAMBLE);

    // Byte count, counting itself and the two FCS bytes
    let count = (payload.len() + RH_OVERHEAD) as u8;
    let mut crc = crc_ccitt_update(CRC16_INIT, count);
    let _ = symbols.extend_from_slice(&encode_4b6b(count));

    for &b in payload {
        crc = crc_ccitt_update(crc, b);
        let _ = symbols.extend_from_slice(&encode_4b6b(b));
    }

    // VirtualWire expects the ones-complement of the CRC, low byte then high byte
    let crc = !crc;
    let _ = symbols.push(SYMBOLS[usize::from((crc >> 4) & 0xf)]);
    let _ = symbols.push(SYMBOLS[usize::from(crc & 0xf)]);
    let _ = symbols.push(SYMBOLS[usize::from((crc >> 12) & 0xf)]);
    let _ = symbols.push(SYMBOLS[usize::from((crc >> 8) & 0xf)]);

    Ok(symbols)
}

/// Sends payloads in the RadioHead `RH_ASK` / VirtualWire on-air format.
///
/// One cell per bit, so the bit rate must match the receiver's configured speed.
#[derive(Debug)]
pub struct RadioHeadTransport<TX>
where
    TX: OutputPin,
{
    transmitter: Transmitter<TX>,
    bit_rate: u32,
    repeat: RepeatPolicy,
}

impl<TX> RadioHeadTransport<TX>
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

impl<TX> FrameTransport for RadioHeadTransport<TX>
where
    TX: OutputPin,
{
    fn send<D: DelayNs>(&mut self, payload: &[u8], delay: &mut D) -> Result<(), Error> {
        let symbols = encode_symbols(payload)?;
        trace!("radiohead buffer of {} symbols", symbols.len());
        let period = bit_period_us(self.bit_rate);
        self.transmitter
            .transmit_repeated(self.repeat, period, || symbol_levels(&symbols), delay)
    }
}
