//! CRC-16 routines for the two on-air profiles.
//!
//! - [`crc16_ccitt_false`]: polynomial 0x1021, init 0xFFFF, MSB-first, no final XOR.
//!   Protects the Manchester and bit-serial frames.
//! - [`crc_ccitt_update`]: the reflected CCITT update used by RadioHead/VirtualWire
//!   (avr-libc `_crc_ccitt_update`). The RadioHead frame carries its ones-complement.

/// Initial register value shared by both CRCs.
pub const CRC16_INIT: u16 = 0xffff;

const CRC16_POLY: u16 = 0x1021;

/// Feeds one byte into a CRC-16/CCITT-FALSE register.
pub fn crc16_update(crc: u16, byte: u8) -> u16 {
    let mut crc = crc ^ (u16::from(byte) << 8);
    for _ in 0..8 {
        crc = if crc & 0x8000 != 0 {
            (crc << 1) ^ CRC16_POLY
        } else {
            crc << 1
        };
    }
    crc
}

/// CRC-16/CCITT-FALSE over `data`.
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    data.iter().fold(CRC16_INIT, |crc, &b| crc16_update(crc, b))
}

/// Feeds one byte into a RadioHead (reflected CCITT) CRC register.
pub fn crc_ccitt_update(crc: u16, data: u8) -> u16 {
    let mut d = data ^ lo8(crc);
    d ^= d << 4;
    let d = u16::from(d);

    ((d << 8) | u16::from(hi8(crc))) ^ (d >> 4) ^ (d << 3)
}

fn lo8(x: u16) -> u8 {
    (x & 0xff) as u8
}

fn hi8(x: u16) -> u8 {
    (x >> 8) as u8
}
