//! Interchangeable on-air profiles behind one "send this payload" interface.
//!
//! The scheduler only ever calls [`FrameTransport::send`]. Which line code and framing
//! end up on air is a runtime choice, see [`TransportProfile`] and
//! [`Transport::from_config`].
//!
//! | Profile       | Framing                                     | Cell          |
//! |---------------|---------------------------------------------|---------------|
//! | `Manchester`  | preamble, SOF, length, payload, CRC, stop   | half a bit    |
//! | `BitSerial`   | payload, CRC (start/stop bit per byte)      | one bit       |
//! | `RadioHead`   | training preamble, count, payload, FCS      | one bit       |

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::Config;
use crate::error::Error;
use crate::transmitter::Transmitter;

mod manchester;
mod radiohead;
mod serial;

pub use manchester::ManchesterTransport;
pub use radiohead::{RadioHeadTransport, SymbolBuf, encode_symbols};
pub use serial::{SerialBuf, SerialTransport, serial_bytes};

/// Something that can put a payload on air.
pub trait FrameTransport {
    /// Frames, line-codes and transmits `payload`, including repetitions.
    ///
    /// # Errors
    /// - [`Error::PayloadTooLong`] if the profile cannot carry `payload`
    /// - [`Error::Pin`] if the data line rejects a write
    fn send<D: DelayNs>(&mut self, payload: &[u8], delay: &mut D) -> Result<(), Error>;
}

/// Selects the on-air profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum TransportProfile {
    /// Manchester-coded, CRC-protected frames.
    #[default]
    Manchester,
    /// UART-like bytes with a trailing CRC, no preamble.
    BitSerial,
    /// RadioHead/VirtualWire `RH_ASK` compatible 4b6b frames.
    RadioHead,
}

/// Runtime-selected transport over one data pin.
#[derive(Debug)]
pub enum Transport<TX>
where
    TX: OutputPin,
{
    /// See [`ManchesterTransport`].
    Manchester(ManchesterTransport<TX>),
    /// See [`SerialTransport`].
    BitSerial(SerialTransport<TX>),
    /// See [`RadioHeadTransport`].
    RadioHead(RadioHeadTransport<TX>),
}

impl<TX> Transport<TX>
where
    TX: OutputPin,
{
    /// Builds the transport `config.profile` names, keyed through `tx`.
    pub fn from_config(tx: TX, config: &Config) -> Self {
        let transmitter = Transmitter::new(tx, config.compensation);
        debug!("transport {:?} at {} bit/s", config.profile, config.bit_rate);
        match config.profile {
            TransportProfile::Manchester => Self::Manchester(ManchesterTransport::new(
                transmitter,
                config.bit_rate,
                config.repeat,
            )),
            TransportProfile::BitSerial => Self::BitSerial(SerialTransport::new(
                transmitter,
                config.bit_rate,
                config.repeat,
            )),
            TransportProfile::RadioHead => Self::RadioHead(RadioHeadTransport::new(
                transmitter,
                config.bit_rate,
                config.repeat,
            )),
        }
    }

    /// The active profile.
    pub fn profile(&self) -> TransportProfile {
        match self {
            Self::Manchester(_) => TransportProfile::Manchester,
            Self::BitSerial(_) => TransportProfile::BitSerial,
            Self::RadioHead(_) => TransportProfile::RadioHead,
        }
    }

    /// Releases the data pin.
    pub fn release(self) -> TX {
        match self {
            Self::Manchester(t) => t.release().release(),
            Self::BitSerial(t) => t.release().release(),
            Self::RadioHead(t) => t.release().release(),
        }
    }
}

impl<TX> FrameTransport for Transport<TX>
where
    TX: OutputPin,
{
    fn send<D: DelayNs>(&mut self, payload: &[u8], delay: &mut D) -> Result<(), Error> {
        match self {
            Self::Manchester(t) => t.send(payload, delay),
            Self::BitSerial(t) => t.send(payload, delay),
            Self::RadioHead(t) => t.send(payload, delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::MAX_PAYLOAD_LEN;
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    #[test]
    fn test_profile_follows_config() {
        for profile in [
            TransportProfile::Manchester,
            TransportProfile::BitSerial,
            TransportProfile::RadioHead,
        ] {
            let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
            let config = Config::default().with_profile(profile);
            let transport = Transport::from_config(tx, &config);
            assert_eq!(transport.profile(), profile);
            transport.release().done();
        }
    }

    #[test]
    fn test_oversized_payload_rejected_before_keying() {
        let payload = [0u8; MAX_PAYLOAD_LEN + 1];
        for profile in [
            TransportProfile::Manchester,
            TransportProfile::BitSerial,
            TransportProfile::RadioHead,
        ] {
            // only the idle write from construction, nothing is keyed
            let tx = PinMock::new(&[PinTransaction::set(PinState::Low)]);
            let config = Config::default().with_profile(profile);
            let mut transport = Transport::from_config(tx, &config);
            assert!(matches!(
                transport.send(&payload, &mut NoopDelay::new()),
                Err(Error::PayloadTooLong { .. })
            ));
            transport.release().done();
        }
    }
}
