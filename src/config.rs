//! Runtime configuration of a node.
//!
//! Every field defaults to the matching constant in [`consts`](crate::consts), so
//! `Config::default()` describes the reference hardware. Boards override individual
//! values with the `with_*` builders:
//!
//! ```rust
//! use wattnode433::config::Config;
//! use wattnode433::transport::TransportProfile;
//!
//! let config = Config::default()
//!     .with_device_id(0x42)
//!     .with_profile(TransportProfile::RadioHead)
//!     .with_bit_rate(2_000);
//! assert_eq!(config.sleep_intervals, 2);
//! ```

use crate::consts::{
    DEFAULT_BATTERY_FLOOR_V, DEFAULT_BIT_RATE, DEFAULT_DEVICE_ID, DEFAULT_PERSIST_THRESHOLD_WH,
    DEFAULT_SLEEP_INTERVALS, ENERGY_STORE_OFFSET,
};
use crate::measure::MeterConfig;
use crate::payload::PayloadFormat;
use crate::timer::{Compensation, WatchdogInterval};
use crate::transmitter::RepeatPolicy;
use crate::transport::TransportProfile;

/// Node configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Identifier carried in every report.
    pub device_id: u8,
    /// Sampling window and channel calibrations.
    pub meter: MeterConfig,
    /// On-air bit rate in bits per second.
    pub bit_rate: u32,
    /// Frame repetition.
    pub repeat: RepeatPolicy,
    /// Transmitter turn-on compensation.
    pub compensation: Compensation,
    /// On-air profile.
    pub profile: TransportProfile,
    /// Report encoding.
    pub payload_format: PayloadFormat,
    /// Watchdog intervals slept per cycle. Zero is treated as one.
    pub sleep_intervals: u8,
    /// Watchdog period the board arms; informational for the scheduler.
    pub watchdog: WatchdogInterval,
    /// Battery voltage strictly below which nothing is transmitted.
    pub battery_floor_v: f32,
    /// Drift in Wh before the energy total is written again.
    pub persist_threshold_wh: f32,
    /// Storage offset of the energy total.
    pub store_offset: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device_id: DEFAULT_DEVICE_ID,
            meter: MeterConfig::default(),
            bit_rate: DEFAULT_BIT_RATE,
            repeat: RepeatPolicy::default(),
            compensation: Compensation::default(),
            profile: TransportProfile::default(),
            payload_format: PayloadFormat::default(),
            sleep_intervals: DEFAULT_SLEEP_INTERVALS,
            watchdog: WatchdogInterval::default(),
            battery_floor_v: DEFAULT_BATTERY_FLOOR_V,
            persist_threshold_wh: DEFAULT_PERSIST_THRESHOLD_WH,
            store_offset: ENERGY_STORE_OFFSET,
        }
    }
}

impl Config {
    /// Sets the device identifier.
    pub fn with_device_id(mut self, device_id: u8) -> Self {
        self.device_id = device_id;
        self
    }

    /// Sets the sampling window and calibrations.
    pub fn with_meter(mut self, meter: MeterConfig) -> Self {
        self.meter = meter;
        self
    }

    /// Sets the on-air bit rate.
    pub fn with_bit_rate(mut self, bit_rate: u32) -> Self {
        self.bit_rate = bit_rate;
        self
    }

    /// Sets the repetition policy.
    pub fn with_repeat(mut self, repeat: RepeatPolicy) -> Self {
        self.repeat = repeat;
        self
    }

    /// Sets the transmitter turn-on compensation.
    pub fn with_compensation(mut self, compensation: Compensation) -> Self {
        self.compensation = compensation;
        self
    }

    /// Selects the on-air profile.
    pub fn with_profile(mut self, profile: TransportProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Selects the report encoding.
    pub fn with_payload_format(mut self, payload_format: PayloadFormat) -> Self {
        self.payload_format = payload_format;
        self
    }

    /// Sets the number of watchdog intervals slept per cycle.
    pub fn with_sleep(mut self, intervals: u8, watchdog: WatchdogInterval) -> Self {
        self.sleep_intervals = intervals;
        self.watchdog = watchdog;
        self
    }

    /// Sets the undervoltage floor.
    pub fn with_battery_floor(mut self, volts: f32) -> Self {
        self.battery_floor_v = volts;
        self
    }

    /// Sets where and how eagerly the energy total is persisted.
    pub fn with_persistence(mut self, offset: u16, threshold_wh: f32) -> Self {
        self.store_offset = offset;
        self.persist_threshold_wh = threshold_wh;
        self
    }

    /// Nominal time between two measurement cycles, excluding the awake time.
    pub fn sleep_period_ms(&self) -> u32 {
        u32::from(self.sleep_intervals.max(1)) * self.watchdog.as_millis()
    }
}
