//! Constants used across the metering node.
//!
//! This module defines the compile-time defaults for framing, line timing,
//! metering calibration, persistence and the duty cycle. Runtime overrides live
//! in [`Config`](crate::config::Config); every field there defaults to a value
//! defined here.
//!
//! ## Key Concepts
//!
//! - **Frame layout**: preamble, two start-of-frame bytes, length, payload,
//!   big-endian CRC-16 and a stop byte.
//! - **Payload Limits**: the length byte and the RadioHead count byte both have to
//!   fit in a `u8`, so payloads are capped well below 255 bytes.
//! - **RadioHead preamble**: the 4b6b training symbols understood by RH_ASK receivers.
//! - **Energy bounds**: the plausible range used to reject corrupt persisted totals.

/// Largest raw value produced by the 10-bit ADC.
pub const ADC_MAX: u16 = 1023;

/// Number of ADC codes spanning the reference voltage.
pub const ADC_FULL_SCALE: f32 = 1024.0;

/// ADC reference voltage in volts.
pub const ADC_REFERENCE_V: f32 = 5.0;

/// Mid-rail bias of the voltage and current sensor outputs, in volts.
pub const SENSOR_BIAS_V: f32 = 2.5;

/// Volts on the mains side per volt at the ADC pin.
pub const VOLTAGE_SENSOR_GAIN: f32 = 1000.0 / 2.5;

/// Volts at the ADC pin per ampere of load current.
pub const CURRENT_SENSOR_V_PER_A: f32 = 1.5;

/// Ratio of the battery sense divider (battery volts per pin volt).
pub const BATTERY_DIVIDER_RATIO: f32 = 2.0;

/// Samples taken per RMS computation.
pub const DEFAULT_SAMPLES: u16 = 128;

/// Delay between two RMS samples, in microseconds.
///
/// 128 samples at 200 µs cover 25.6 ms, more than one full mains period at 50 Hz and 60 Hz.
pub const DEFAULT_SAMPLE_INTERVAL_US: u32 = 200;

/// Byte repeated in the Manchester preamble. Alternating bits give the receiver
/// a clean clock to lock onto.
pub const PREAMBLE_BYTE: u8 = 0xAA;

/// Number of preamble bytes in front of each Manchester frame.
pub const PREAMBLE_LEN: usize = 4;

/// The two start-of-frame bytes following the preamble.
pub const START_OF_FRAME: [u8; 2] = [0x2D, 0xD4];

/// Trailing stop byte of a Manchester frame.
pub const STOP_BYTE: u8 = 0x7E;

/// Maximum number of payload bytes in a single frame.
pub const MAX_PAYLOAD_LEN: usize = 100;

/// Bytes added around the payload by the Manchester framing:
/// preamble, start-of-frame, length, CRC and stop byte.
pub const FRAME_OVERHEAD: usize = PREAMBLE_LEN + START_OF_FRAME.len() + 1 + 2 + 1;

/// Size of the buffer holding a complete Manchester frame.
pub const MAX_FRAME_LEN: usize = MAX_PAYLOAD_LEN + FRAME_OVERHEAD;

/// Length (in symbols) of the RadioHead training preamble.
pub const RH_PREAMBLE_LEN: usize = 8;

/// The RadioHead training preamble. The last two symbols form the 12-bit start
/// symbol `0xb38` the receiver's PLL looks for.
pub const RH_PREAMBLE: [u8; RH_PREAMBLE_LEN] = [0x2a, 0x2a, 0x2a, 0x2a, 0x2a, 0x2a, 0x38, 0x2c];

/// Bytes added around the payload by the RadioHead framing: count byte and FCS.
pub const RH_OVERHEAD: usize = 3;

/// Maximum size (in symbols) of a RadioHead transmission buffer.
///
/// Each byte becomes two 6-bit symbols, hence the `* 2`.
pub const RH_MAX_BUF_LEN: usize = (MAX_PAYLOAD_LEN + RH_OVERHEAD) * 2 + RH_PREAMBLE_LEN;

/// Nominal on-air bit rate in bits per second.
pub const DEFAULT_BIT_RATE: u32 = 1_200;

/// Number of copies of every frame put on air.
pub const DEFAULT_REPEAT_COUNT: u8 = 2;

/// Silence between two copies of a frame, in milliseconds.
pub const DEFAULT_REPEAT_GUARD_MS: u32 = 100;

/// Device identifier carried as the first payload byte.
pub const DEFAULT_DEVICE_ID: u8 = 0xA1;

/// Length of the binary status payload.
pub const BINARY_PAYLOAD_LEN: usize = 1 + 5 * 4;

/// Upper bound of a plausible persisted energy total, in Wh.
pub const ENERGY_MAX_WH: f32 = 1.0e6;

/// EEPROM offset of the persisted energy total.
pub const ENERGY_STORE_OFFSET: u16 = 0;

/// Energy drift (Wh) that has to accumulate before the total is written again.
pub const DEFAULT_PERSIST_THRESHOLD_WH: f32 = 0.1;

/// Battery voltage below which the radio is not keyed.
pub const DEFAULT_BATTERY_FLOOR_V: f32 = 2.0;

/// Watchdog intervals slept between two measurement cycles.
pub const DEFAULT_SLEEP_INTERVALS: u8 = 2;

/// Milliseconds per hour, used to convert elapsed time for energy integration.
pub const MS_PER_HOUR: f32 = 3_600_000.0;
