//! Self-delimited, CRC-protected frames for the Manchester profile.
//!
//! ## Layout
//!
//! ```text
//! ┌────────────────┬────────┬─────┬──────────────┬──────────┬──────┐
//! │ preamble (4)   │ SOF(2) │ len │ payload (len)│ CRC16 BE │ stop │
//! │ AA AA AA AA    │ 2D D4  │     │              │          │ 7E   │
//! └────────────────┴────────┴─────┴──────────────┴──────────┴──────┘
//! ```
//!
//! The CRC is CRC-16/CCITT-FALSE over the payload bytes only. The length byte lets the
//! receiver stop collecting payload bytes without scanning for a terminator.

use heapless::Vec;

use crate::consts::{
    FRAME_OVERHEAD, MAX_FRAME_LEN, MAX_PAYLOAD_LEN, PREAMBLE_BYTE, PREAMBLE_LEN, START_OF_FRAME,
    STOP_BYTE,
};
use crate::crc::crc16_ccitt_false;
use crate::encoding::manchester_levels;
use crate::error::Error;

/// Offset of the length byte inside a frame.
pub const LENGTH_OFFSET: usize = PREAMBLE_LEN + START_OF_FRAME.len();

/// Offset of the first payload byte inside a frame.
pub const PAYLOAD_OFFSET: usize = LENGTH_OFFSET + 1;

/// A fully framed transmission, ready for line coding.
///
/// Built fresh for every transmission and dropped once it has been sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    bytes: Vec<u8, MAX_FRAME_LEN>,
}

impl Frame {
    /// Frames `payload`.
    ///
    /// # Errors
    /// [`Error::PayloadTooLong`] if the payload exceeds [`MAX_PAYLOAD_LEN`].
    pub fn build(payload: &[u8]) -> Result<Self, Error> {
        if payload.len() > MAX_PAYLOAD_LEN {
            return Err(Error::PayloadTooLong {
                len: payload.len(),
                max: MAX_PAYLOAD_LEN,
            });
        }

        let crc = crc16_ccitt_false(payload);
        let mut bytes = Vec::new();
        // Capacity is MAX_PAYLOAD_LEN + FRAME_OVERHEAD, checked above.
        let _ = bytes.extend_from_slice(&[PREAMBLE_BYTE; PREAMBLE_LEN]);
        let _ = bytes.extend_from_slice(&START_OF_FRAME);
        let _ = bytes.push(payload.len() as u8);
        let _ = bytes.extend_from_slice(payload);
        let _ = bytes.extend_from_slice(&crc.to_be_bytes());
        let _ = bytes.push(STOP_BYTE);
        debug_assert_eq!(bytes.len(), payload.len() + FRAME_OVERHEAD);

        Ok(Self { bytes })
    }

    /// The raw frame bytes, preamble to stop byte.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The payload carried by this frame.
    pub fn payload(&self) -> &[u8] {
        &self.bytes[PAYLOAD_OFFSET..PAYLOAD_OFFSET + self.payload_len()]
    }

    /// Value of the length byte.
    pub fn payload_len(&self) -> usize {
        usize::from(self.bytes[LENGTH_OFFSET])
    }

    /// The CRC carried by this frame.
    pub fn crc(&self) -> u16 {
        let at = PAYLOAD_OFFSET + self.payload_len();
        u16::from_be_bytes([self.bytes[at], self.bytes[at + 1]])
    }

    /// Total number of bytes on air for one copy of this frame.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; a frame carries at least its framing bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Manchester line levels for this frame, one entry per half-bit cell.
    pub fn cells(&self) -> impl Iterator<Item = bool> + '_ {
        manchester_levels(&self.bytes)
    }
}
