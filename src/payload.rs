//! Status report payloads.
//!
//! ## Binary profile (21 bytes)
//!
//! ```text
//! [device_id: u8][vrms: i32][irms: i32][power: i32][energy_wh: i32][battery_v: i32]
//! ```
//!
//! Each `i32` is little-endian two's complement, fixed-point scaled by
//! [`VRMS_SCALE`], [`IRMS_SCALE`], [`POWER_SCALE`], [`ENERGY_SCALE`] and
//! [`BATTERY_SCALE`]. Scaling truncates toward zero; values are clamped so the scaled
//! result fits an `i32`, and NaN encodes as 0.
//!
//! ## Text profile
//!
//! `ID:<id> V:<%.0f> I:<%.3f> P:<%.1f> E:<%.1f> B:<%.2f>` with the id as two
//! upper-case hex digits.

use core::fmt::Write;

use heapless::{String, Vec};
use libm::truncf;

use crate::consts::{BINARY_PAYLOAD_LEN, MAX_PAYLOAD_LEN};
use crate::error::Error;
use crate::measure::MeasurementCycle;

/// Fixed-point scale of the RMS voltage field.
pub const VRMS_SCALE: f32 = 100.0;
/// Fixed-point scale of the RMS current field.
pub const IRMS_SCALE: f32 = 1000.0;
/// Fixed-point scale of the power field.
pub const POWER_SCALE: f32 = 100.0;
/// Fixed-point scale of the energy field.
pub const ENERGY_SCALE: f32 = 100.0;
/// Fixed-point scale of the battery voltage field.
pub const BATTERY_SCALE: f32 = 100.0;

/// Buffer holding an encoded payload of either profile.
pub type PayloadBuf = Vec<u8, MAX_PAYLOAD_LEN>;

/// How a [`Report`] is rendered into payload bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum PayloadFormat {
    /// Fixed 21-byte little-endian fixed-point layout.
    #[default]
    Binary,
    /// Human-readable ASCII line.
    Text,
}

/// One status report, assembled at the end of the measuring state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Report {
    /// Device identifier byte.
    pub device_id: u8,
    /// RMS voltage in volts.
    pub vrms: f32,
    /// RMS current in amperes.
    pub irms: f32,
    /// Real power estimate in watts, may be negative.
    pub power: f32,
    /// Cumulative energy in watt-hours.
    pub energy_wh: f32,
    /// Battery voltage in volts.
    pub battery_v: f32,
}

impl Report {
    /// Assembles a report from a measurement cycle and the current energy total.
    pub fn new(device_id: u8, cycle: &MeasurementCycle, energy_wh: f32) -> Self {
        Self {
            device_id,
            vrms: cycle.vrms,
            irms: cycle.irms,
            power: cycle.power,
            energy_wh,
            battery_v: cycle.battery_v,
        }
    }

    /// Encodes the report in the requested profile.
    pub fn encode(&self, format: PayloadFormat) -> Result<PayloadBuf, Error> {
        match format {
            PayloadFormat::Binary => {
                Vec::from_slice(&self.to_binary()).map_err(|_| Error::PayloadTooLong {
                    len: BINARY_PAYLOAD_LEN,
                    max: MAX_PAYLOAD_LEN,
                })
            }
            PayloadFormat::Text => {
                let text = self.to_text()?;
                Vec::from_slice(text.as_bytes()).map_err(|_| Error::Format)
            }
        }
    }

    /// The 21-byte binary payload.
    pub fn to_binary(&self) -> [u8; BINARY_PAYLOAD_LEN] {
        let mut out = [0u8; BINARY_PAYLOAD_LEN];
        out[0] = self.device_id;
        let fields = [
            to_fixed(self.vrms, VRMS_SCALE),
            to_fixed(self.irms, IRMS_SCALE),
            to_fixed(self.power, POWER_SCALE),
            to_fixed(self.energy_wh, ENERGY_SCALE),
            to_fixed(self.battery_v, BATTERY_SCALE),
        ];
        for (chunk, value) in out[1..].chunks_exact_mut(4).zip(fields) {
            chunk.copy_from_slice(&value.to_le_bytes());
        }
        out
    }

    /// The ASCII payload.
    ///
    /// # Errors
    /// [`Error::Format`] if the rendered line does not fit [`MAX_PAYLOAD_LEN`] bytes.
    pub fn to_text(&self) -> Result<String<MAX_PAYLOAD_LEN>, Error> {
        let mut line = String::new();
        write!(
            line,
            "ID:{:02X} V:{:.0} I:{:.3} P:{:.1} E:{:.1} B:{:.2}",
            self.device_id, self.vrms, self.irms, self.power, self.energy_wh, self.battery_v
        )
        .map_err(|_| Error::Format)?;
        Ok(line)
    }
}

/// Scales `value` into the fixed-point wire representation.
///
/// The value is clamped to the range the scaled `i32` can hold, then truncated toward
/// zero. NaN encodes as 0.
pub fn to_fixed(value: f32, scale: f32) -> i32 {
    if value.is_nan() {
        return 0;
    }
    let limit = i32::MAX as f32 / scale;
    let clamped = value.clamp(-limit, limit);
    // `as` saturates, which also absorbs the one-ulp overshoot of `limit * scale`.
    truncf(clamped * scale) as i32
}

/// Inverse of [`to_fixed`], for receivers and tests.
pub fn from_fixed(raw: i32, scale: f32) -> f32 {
    raw as f32 / scale
}
