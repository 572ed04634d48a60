//! Crate error type.
//!
//! Nothing here is fatal to the node: the scheduler logs the error, signals the
//! indicator and carries on with the next state.

use embedded_hal::digital::ErrorKind;

use crate::measure::Channel;

/// Errors surfaced by the metering, transmit and persistence paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// Driving the radio data line failed.
    #[error("radio output pin error: {0:?}")]
    Pin(ErrorKind),

    /// The analog source could not be read.
    #[error("analog read failed on {0:?} channel")]
    Analog(Channel),

    /// The non-volatile storage rejected a read or a write.
    #[error("non-volatile storage access failed")]
    Storage,

    /// The payload does not fit into a single frame.
    #[error("payload of {len} bytes exceeds the {max} byte frame capacity")]
    PayloadTooLong {
        /// Length of the rejected payload.
        len: usize,
        /// Largest payload the frame can carry.
        max: usize,
    },

    /// The text payload did not fit its buffer.
    #[error("text payload overflowed its buffer")]
    Format,
}
