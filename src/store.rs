//! Wear-aware persistence of the cumulative energy total.
//!
//! The total is one little-endian `f32` at a fixed offset of an [`NvStorage`]. It is only
//! rewritten once it has drifted at least `threshold` Wh away from the last written value
//! (the watermark), which bounds the number of EEPROM writes over the node's lifetime at
//! the cost of losing up to `threshold` Wh on a power failure.

use libm::fabsf;

use crate::board::NvStorage;
use crate::consts::{DEFAULT_PERSIST_THRESHOLD_WH, ENERGY_MAX_WH, ENERGY_STORE_OFFSET};
use crate::error::Error;

/// Returns `value` if it is a plausible energy total: finite and within `[0, 1e6]` Wh.
pub fn validate_energy(value: f32) -> Option<f32> {
    (value.is_finite() && (0.0..=ENERGY_MAX_WH).contains(&value)).then_some(value)
}

/// Hysteresis decision: whether `current` should be written, and the resulting watermark.
///
/// A write is due when `|current - watermark| >= threshold`. The returned watermark is
/// `current` on a write and `watermark` otherwise.
pub fn persist_decision(current: f32, watermark: f32, threshold: f32) -> (bool, f32) {
    if fabsf(current - watermark) >= threshold {
        (true, current)
    } else {
        (false, watermark)
    }
}

/// The persisted energy register.
#[derive(Debug)]
pub struct EnergyStore<S>
where
    S: NvStorage,
{
    storage: S,
    offset: u16,
    threshold: f32,
    watermark: f32,
}

impl<S> EnergyStore<S>
where
    S: NvStorage,
{
    /// Creates a store at the default offset and threshold.
    pub fn new(storage: S) -> Self {
        Self::with_params(storage, ENERGY_STORE_OFFSET, DEFAULT_PERSIST_THRESHOLD_WH)
    }

    /// Creates a store at `offset` with a persistence `threshold` in Wh.
    pub fn with_params(storage: S, offset: u16, threshold: f32) -> Self {
        Self {
            storage,
            offset,
            threshold,
            watermark: 0.0,
        }
    }

    /// Reads the persisted total.
    ///
    /// Unreadable storage and implausible values (NaN, infinite, negative, above 1e6 Wh)
    /// yield 0.0. The returned value also becomes the watermark.
    pub fn load(&mut self) -> f32 {
        let mut raw = [0u8; 4];
        let value = match self.storage.read(self.offset, &mut raw) {
            Ok(()) => {
                let stored = f32::from_le_bytes(raw);
                validate_energy(stored).unwrap_or_else(|| {
                    warn!("persisted energy {} rejected, starting from zero", stored);
                    0.0
                })
            }
            Err(e) => {
                warn!("energy store unreadable: {:?}", debug2format!(e));
                0.0
            }
        };
        self.watermark = value;
        info!("energy total loaded: {} Wh", value);
        value
    }

    /// Writes `current` if it has drifted at least the threshold from the watermark.
    ///
    /// Returns whether a write happened. A value [`load`](Self::load) would reject
    /// (non-finite, negative, above the ceiling) is never written.
    ///
    /// # Errors
    /// [`Error::Storage`] if the write fails; the watermark is then left unchanged so the
    /// write is retried on the next call.
    pub fn maybe_persist(&mut self, current: f32) -> Result<bool, Error> {
        if validate_energy(current).is_none() {
            warn!("refusing to persist implausible energy total {}", current);
            return Ok(false);
        }
        let (due, _) = persist_decision(current, self.watermark, self.threshold);
        if !due {
            return Ok(false);
        }
        self.write(current)?;
        Ok(true)
    }

    /// Writes `current` regardless of the threshold.
    ///
    /// # Errors
    /// [`Error::Storage`] if the write fails or `current` is not a plausible total.
    pub fn force_persist(&mut self, current: f32) -> Result<(), Error> {
        if validate_energy(current).is_none() {
            return Err(Error::Storage);
        }
        self.write(current)
    }

    fn write(&mut self, current: f32) -> Result<(), Error> {
        self.storage
            .write(self.offset, &current.to_le_bytes())
            .map_err(|e| {
                error!("energy store write failed: {:?}", debug2format!(e));
                Error::Storage
            })?;
        debug!("energy total persisted: {} Wh", current);
        self.watermark = current;
        Ok(())
    }

    /// The last value read from or written to storage.
    pub fn watermark(&self) -> f32 {
        self.watermark
    }

    /// The underlying storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// The persistence threshold in Wh.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Releases the storage.
    pub fn release(self) -> S {
        self.storage
    }
}
