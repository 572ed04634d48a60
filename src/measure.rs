//! RMS metering and energy integration.
//!
//! Voltage and current are sampled [`DEFAULT_SAMPLES`] times at a fixed interval,
//! each sample converted through its channel's linear [`Calibration`], and the
//! root-mean-square of the converted values is reported. With 128 samples 200 µs apart
//! the window spans more than one mains period, which is enough to estimate true RMS
//! without zero-cross detection.
//!
//! The battery is read once through its divider, no RMS.

use embedded_hal::delay::DelayNs;
use libm::sqrtf;

use crate::board::AnalogSource;
use crate::consts::{
    ADC_FULL_SCALE, ADC_MAX, ADC_REFERENCE_V, BATTERY_DIVIDER_RATIO, CURRENT_SENSOR_V_PER_A,
    DEFAULT_SAMPLE_INTERVAL_US, DEFAULT_SAMPLES, ENERGY_MAX_WH, MS_PER_HOUR, SENSOR_BIAS_V,
    VOLTAGE_SENSOR_GAIN,
};
use crate::error::Error;

/// Volts per ADC code.
const VOLTS_PER_CODE: f32 = ADC_REFERENCE_V / ADC_FULL_SCALE;

/// Analog channels read by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Channel {
    /// Mains voltage sensor output.
    Voltage,
    /// Load current sensor output.
    Current,
    /// Battery sense divider.
    Battery,
}

/// Linear transform from a raw sample to a physical quantity: `raw * scale + offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Units per ADC code.
    pub scale: f32,
    /// Value at code 0.
    pub offset: f32,
}

impl Calibration {
    /// Mains voltage: `(raw * 5 / 1024 - 2.5) * 400`.
    pub const VOLTAGE: Self = Self::new(
        VOLTS_PER_CODE * VOLTAGE_SENSOR_GAIN,
        -SENSOR_BIAS_V * VOLTAGE_SENSOR_GAIN,
    );

    /// Load current: `(raw * 5 / 1024 - 2.5) / 1.5`.
    pub const CURRENT: Self = Self::new(
        VOLTS_PER_CODE / CURRENT_SENSOR_V_PER_A,
        -SENSOR_BIAS_V / CURRENT_SENSOR_V_PER_A,
    );

    /// Battery: `raw * 5 / 1024 * 2`.
    pub const BATTERY: Self = Self::new(VOLTS_PER_CODE * BATTERY_DIVIDER_RATIO, 0.0);

    /// Creates a calibration.
    pub const fn new(scale: f32, offset: f32) -> Self {
        Self { scale, offset }
    }

    /// Converts a raw sample, clamped to the ADC range first.
    pub fn apply(&self, raw: u16) -> f32 {
        f32::from(raw.min(ADC_MAX)) * self.scale + self.offset
    }
}

/// Sampling parameters and per-channel calibrations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterConfig {
    /// Samples per RMS computation.
    pub samples: u16,
    /// Delay between two samples in microseconds.
    pub sample_interval_us: u32,
    /// Voltage channel calibration.
    pub voltage: Calibration,
    /// Current channel calibration.
    pub current: Calibration,
    /// Battery channel calibration.
    pub battery: Calibration,
}

impl Default for MeterConfig {
    fn default() -> Self {
        Self {
            samples: DEFAULT_SAMPLES,
            sample_interval_us: DEFAULT_SAMPLE_INTERVAL_US,
            voltage: Calibration::VOLTAGE,
            current: Calibration::CURRENT,
            battery: Calibration::BATTERY,
        }
    }
}

impl MeterConfig {
    /// Calibration for `channel`.
    pub fn calibration(&self, channel: Channel) -> &Calibration {
        match channel {
            Channel::Voltage => &self.voltage,
            Channel::Current => &self.current,
            Channel::Battery => &self.battery,
        }
    }
}

/// Everything measured in one wake cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementCycle {
    /// RMS voltage in volts.
    pub vrms: f32,
    /// RMS current in amperes.
    pub irms: f32,
    /// `vrms * irms` in watts. Not clamped; may be negative on bidirectional setups.
    pub power: f32,
    /// Battery voltage in volts.
    pub battery_v: f32,
}

/// Root-mean-square of calibrated samples. Returns 0 for an empty sequence.
pub fn compute_rms<I>(samples: I, calibration: &Calibration) -> f32
where
    I: IntoIterator<Item = u16>,
{
    let (sum_sq, count) = samples.into_iter().fold((0.0f32, 0u32), |(sum, n), raw| {
        let value = calibration.apply(raw);
        (sum + value * value, n + 1)
    });
    if count == 0 {
        return 0.0;
    }
    sqrtf(sum_sq / count as f32)
}

/// Adds `power_w * elapsed` (in hours) to `energy_wh`.
///
/// - Zero elapsed time adds nothing.
/// - A non-finite power, or a sum that would be non-finite, leaves the total unchanged.
/// - The total never drops below zero and saturates at [`ENERGY_MAX_WH`].
pub fn integrate_energy(energy_wh: f32, power_w: f32, elapsed_ms: u32) -> f32 {
    if elapsed_ms == 0 || !power_w.is_finite() {
        return energy_wh;
    }
    let next = energy_wh + power_w * (elapsed_ms as f32 / MS_PER_HOUR);
    if !next.is_finite() {
        energy_wh
    } else {
        next.clamp(0.0, ENERGY_MAX_WH)
    }
}

/// Samples the metering channels of an [`AnalogSource`].
#[derive(Debug)]
pub struct Meter<A: AnalogSource> {
    adc: A,
    config: MeterConfig,
}

impl<A: AnalogSource> Meter<A> {
    /// Creates a meter over `adc`.
    pub fn new(adc: A, config: MeterConfig) -> Self {
        Self { adc, config }
    }

    /// Active sampling configuration.
    pub fn config(&self) -> &MeterConfig {
        &self.config
    }

    /// Releases the analog source.
    pub fn release(self) -> A {
        self.adc
    }

    fn sample(&mut self, channel: Channel) -> Result<u16, Error> {
        nb::block!(self.adc.read(channel)).map_err(|e| {
            error!("adc read on {:?} failed: {:?}", channel, debug2format!(e));
            Error::Analog(channel)
        })
    }

    /// RMS value of `channel` over the configured sample window.
    ///
    /// # Arguments
    /// - `channel`: The channel to sample
    /// - `delay`: Provides the inter-sample delay
    pub fn measure<D: DelayNs>(&mut self, channel: Channel, delay: &mut D) -> Result<f32, Error> {
        let calibration = *self.config.calibration(channel);
        let mut sum_sq = 0.0f32;
        for _ in 0..self.config.samples {
            let value = calibration.apply(self.sample(channel)?);
            sum_sq += value * value;
            delay.delay_us(self.config.sample_interval_us);
        }
        if self.config.samples == 0 {
            return Ok(0.0);
        }
        Ok(sqrtf(sum_sq / f32::from(self.config.samples)))
    }

    /// Battery voltage from a single sample.
    pub fn read_battery(&mut self) -> Result<f32, Error> {
        let raw = self.sample(Channel::Battery)?;
        Ok(self.config.battery.apply(raw))
    }

    /// Voltage, current, power and battery for one cycle.
    pub fn measure_cycle<D: DelayNs>(&mut self, delay: &mut D) -> Result<MeasurementCycle, Error> {
        let vrms = self.measure(Channel::Voltage, delay)?;
        let irms = self.measure(Channel::Current, delay)?;
        let battery_v = self.read_battery()?;
        trace!("measured vrms={} irms={} battery={}", vrms, irms, battery_v);
        Ok(MeasurementCycle {
            vrms,
            irms,
            power: vrms * irms,
            battery_v,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::f32::consts::PI;
    use std::vec::Vec;

    /// Serves canned samples per channel, with one `WouldBlock` before every sample.
    struct FakeAdc {
        voltage: Vec<u16>,
        current: Vec<u16>,
        battery: u16,
        pending: bool,
        reads: usize,
        fail: Option<Channel>,
    }

    impl FakeAdc {
        fn constant(voltage: u16, current: u16, battery: u16) -> Self {
            Self {
                voltage: std::vec![voltage],
                current: std::vec![current],
                battery,
                pending: false,
                reads: 0,
                fail: None,
            }
        }
    }

    impl AnalogSource for FakeAdc {
        type Error = ();

        fn read(&mut self, channel: Channel) -> nb::Result<u16, ()> {
            if self.fail == Some(channel) {
                return Err(nb::Error::Other(()));
            }
            if !self.pending {
                self.pending = true;
                return Err(nb::Error::WouldBlock);
            }
            self.pending = false;
            let value = match channel {
                Channel::Voltage => self.voltage[self.reads % self.voltage.len()],
                Channel::Current => self.current[self.reads % self.current.len()],
                Channel::Battery => self.battery,
            };
            self.reads += 1;
            Ok(value)
        }
    }

    #[derive(Default)]
    struct CountingDelay {
        calls: usize,
        total_us: u64,
    }

    impl DelayNs for CountingDelay {
        fn delay_ns(&mut self, ns: u32) {
            self.calls += 1;
            self.total_us += u64::from(ns) / 1_000;
        }
    }

    /// Raw codes for a sinusoid of `peak` units around the calibration's zero point.
    fn sine_codes(peak: f32, calibration: &Calibration, n: usize) -> Vec<u16> {
        let zero = -calibration.offset / calibration.scale;
        (0..n)
            .map(|i| {
                let phase = 2.0 * PI * i as f32 / n as f32;
                (zero + peak * phase.sin() / calibration.scale).round() as u16
            })
            .collect()
    }

    #[test]
    fn test_calibration_matches_sensor_formulas() {
        assert!((Calibration::VOLTAGE.apply(512) - 0.0).abs() < 1e-3);
        assert!((Calibration::VOLTAGE.apply(1023) - 998.05).abs() < 0.01);
        assert!((Calibration::CURRENT.apply(0) + 2.5 / 1.5).abs() < 1e-6);
        assert!((Calibration::BATTERY.apply(1023) - 9.990).abs() < 0.001);
    }

    #[test]
    fn test_calibration_clamps_out_of_range_samples() {
        assert_eq!(Calibration::BATTERY.apply(4095), Calibration::BATTERY.apply(ADC_MAX));
    }

    #[test]
    fn test_rms_of_sine_is_peak_over_sqrt2() {
        let peak = 325.0;
        let codes = sine_codes(peak, &Calibration::VOLTAGE, 128);
        let rms = compute_rms(codes, &Calibration::VOLTAGE);
        // one code is ~1.95 V of quantisation on the voltage channel
        assert!((rms - peak / 2.0f32.sqrt()).abs() < 2.0, "rms = {rms}");
    }

    #[test]
    fn test_rms_of_current_sine() {
        let peak = 1.2;
        let codes = sine_codes(peak, &Calibration::CURRENT, 256);
        let rms = compute_rms(codes, &Calibration::CURRENT);
        assert!((rms - peak / 2.0f32.sqrt()).abs() < 0.01, "rms = {rms}");
    }

    #[test]
    fn test_rms_of_empty_sequence_is_zero() {
        assert_eq!(compute_rms(core::iter::empty(), &Calibration::VOLTAGE), 0.0);
    }

    #[test]
    fn test_measure_takes_configured_samples_and_delays() {
        let mut meter = Meter::new(FakeAdc::constant(1023, 512, 400), MeterConfig::default());
        let mut delay = CountingDelay::default();
        let vrms = meter.measure(Channel::Voltage, &mut delay).unwrap();
        assert!((vrms - Calibration::VOLTAGE.apply(1023)).abs() < 0.01);
        assert_eq!(delay.calls, usize::from(DEFAULT_SAMPLES));
        assert_eq!(delay.total_us, u64::from(DEFAULT_SAMPLES) * 200);
        assert_eq!(meter.release().reads, usize::from(DEFAULT_SAMPLES));
    }

    #[test]
    fn test_measure_matches_compute_rms() {
        let codes = sine_codes(300.0, &Calibration::VOLTAGE, 128);
        let mut adc = FakeAdc::constant(0, 512, 400);
        adc.voltage = codes.clone();
        let mut meter = Meter::new(adc, MeterConfig::default());
        let measured = meter.measure(Channel::Voltage, &mut CountingDelay::default()).unwrap();
        let expected = compute_rms(codes, &Calibration::VOLTAGE);
        assert!((measured - expected).abs() < 1e-3);
    }

    #[test]
    fn test_measure_cycle_derives_power() {
        let mut meter = Meter::new(FakeAdc::constant(1023, 1023, 400), MeterConfig::default());
        let cycle = meter.measure_cycle(&mut CountingDelay::default()).unwrap();
        assert!((cycle.power - cycle.vrms * cycle.irms).abs() < 1e-3);
        assert!((cycle.battery_v - 400.0 * 5.0 / 1024.0 * 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_zero_samples_reads_nothing() {
        let config = MeterConfig {
            samples: 0,
            ..MeterConfig::default()
        };
        let mut meter = Meter::new(FakeAdc::constant(1023, 512, 400), config);
        assert_eq!(meter.measure(Channel::Current, &mut CountingDelay::default()), Ok(0.0));
        assert_eq!(meter.release().reads, 0);
    }

    #[test]
    fn test_adc_failure_reports_channel() {
        let mut adc = FakeAdc::constant(1023, 512, 400);
        adc.fail = Some(Channel::Current);
        let mut meter = Meter::new(adc, MeterConfig::default());
        assert_eq!(
            meter.measure_cycle(&mut CountingDelay::default()),
            Err(Error::Analog(Channel::Current))
        );
    }

    #[test]
    fn test_integrate_energy() {
        assert!((integrate_energy(10.0, 100.0, 3_600_000) - 110.0).abs() < 1e-3);
        assert!((integrate_energy(0.0, 1000.0, 16_000) - 4.444_444).abs() < 1e-4);
    }

    #[test]
    fn test_integrate_energy_zero_elapsed_adds_nothing() {
        assert_eq!(integrate_energy(5.0, 2_000.0, 0), 5.0);
    }

    #[test]
    fn test_integrate_energy_rejects_non_finite() {
        assert_eq!(integrate_energy(5.0, f32::NAN, 1_000), 5.0);
        assert_eq!(integrate_energy(5.0, f32::INFINITY, 1_000), 5.0);
        assert_eq!(
            integrate_energy(ENERGY_MAX_WH, f32::MAX, u32::MAX),
            ENERGY_MAX_WH
        );
    }

    #[test]
    fn test_integrate_energy_never_negative() {
        assert_eq!(integrate_energy(0.001, -500.0, 60_000), 0.0);
        assert!((integrate_energy(10.0, -360.0, 10_000) - 9.0).abs() < 1e-4);
    }

    #[test]
    fn test_integrate_energy_saturates_at_ceiling() {
        assert_eq!(integrate_energy(999_999.9, 1_000.0, 3_600_000), ENERGY_MAX_WH);
        assert_eq!(integrate_energy(ENERGY_MAX_WH, 5.0, 60_000), ENERGY_MAX_WH);
    }
}
