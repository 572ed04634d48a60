//! Line codes for the ASK/OOK data line.
//!
//! Every transport turns its bytes into a sequence of line levels, one level per
//! timing cell, which the [`Transmitter`](crate::transmitter::Transmitter) then
//! holds for one cell period each. `true` means carrier on.
//!
//! ## Codes
//!
//! - **Manchester**: each bit becomes two half-bit cells, `1 → (on, off)` and
//!   `0 → (off, on)`, bytes MSB-first. Self-clocking and DC-balanced.
//! - **Bit-serial**: UART-like start bit (on), 8 data bits LSB-first, stop bit (off).
//!   One cell per bit.
//! - **4b6b**: the RadioHead DC-balanced symbol code. Each byte becomes two 6-bit
//!   symbols (high nibble first), each symbol sent LSB-first, one cell per bit.
//!
//! ## Symbol Table
//!
//! The 4b6b encoder maps each 4-bit nibble to a 6-bit symbol with three ones and three
//! zeroes, taken from a fixed lookup table. Only 16 of the 64 possible 6-bit values are
//! valid, which is what lets the receiver find the start symbol.

/// The 4b6b symbol for each nibble value.
pub static SYMBOLS: [u8; 16] = [
    0xd, 0xe, 0x13, 0x15, 0x16, 0x19, 0x1a, 0x1c, 0x23, 0x25, 0x26, 0x29, 0x2a, 0x2c, 0x32, 0x34,
];

/// Number of line cells a single byte occupies in Manchester code.
pub const MANCHESTER_CELLS_PER_BYTE: usize = 16;

/// Number of line cells a single byte occupies in bit-serial code.
pub const SERIAL_CELLS_PER_BYTE: usize = 10;

/// Number of line cells in one 4b6b symbol.
pub const SYMBOL_BITS: usize = 6;

/// Encodes an 8-bit byte into two 6-bit symbols using 4b6b encoding.
pub fn encode_4b6b(byte: u8) -> [u8; 2] {
    let high = (byte >> 4) & 0x0F;
    let low = byte & 0x0F;
    [SYMBOLS[high as usize], SYMBOLS[low as usize]]
}

/// Manchester-encodes one byte into 16 half-bit cells.
///
/// The returned word is read from bit 15 down to bit 0; each data bit occupies two
/// adjacent positions, first half in the higher one.
pub fn manchester_encode_byte(byte: u8) -> u16 {
    (0..8).rev().fold(0u16, |word, bit| {
        let pair = if byte & (1 << bit) != 0 { 0b10 } else { 0b01 };
        (word << 2) | pair
    })
}

/// Bit-serial frame of one byte: start bit, 8 data bits LSB-first, stop bit.
///
/// The returned word is read from bit 0 upwards, 10 cells in total.
pub fn serial_encode_byte(byte: u8) -> u16 {
    // bit 0 = start (on), bits 1..=8 = data, bit 9 = stop (off)
    1 | (u16::from(byte) << 1)
}

/// Line levels for a byte slice in Manchester code.
pub fn manchester_levels(bytes: &[u8]) -> impl Iterator<Item = bool> + '_ {
    bytes.iter().flat_map(|&byte| {
        let word = manchester_encode_byte(byte);
        (0..MANCHESTER_CELLS_PER_BYTE)
            .rev()
            .map(move |cell| word & (1 << cell) != 0)
    })
}

/// Line levels for a byte slice in bit-serial code.
pub fn serial_levels(bytes: &[u8]) -> impl Iterator<Item = bool> + '_ {
    bytes.iter().flat_map(|&byte| {
        let word = serial_encode_byte(byte);
        (0..SERIAL_CELLS_PER_BYTE).map(move |cell| word & (1 << cell) != 0)
    })
}

/// Line levels for a slice of 6-bit symbols, each symbol LSB-first.
pub fn symbol_levels(symbols: &[u8]) -> impl Iterator<Item = bool> + '_ {
    symbols
        .iter()
        .flat_map(|&symbol| (0..SYMBOL_BITS).map(move |bit| symbol & (1 << bit) != 0))
}
