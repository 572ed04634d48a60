//! The wake → measure → transmit → persist → sleep duty cycle.
//!
//! [`DutyCycleScheduler`] owns every collaborator and runs the node forever with
//! [`run`](DutyCycleScheduler::run). For tests and for boards that need to interleave
//! other work, [`step`](DutyCycleScheduler::step) advances one state and
//! [`run_cycle`](DutyCycleScheduler::run_cycle) one complete cycle.
//!
//! ```text
//!            ┌──────────────────────── undervoltage / ADC failure ─────────┐
//!            │                                                              ▼
//! Measuring ─┴─▶ Transmitting ──▶ Persisting ──▶ Sleeping (N × watchdog) ──▶ Measuring
//! ```
//!
//! Nothing here halts the node: collaborator errors are logged, reported through the
//! [`Indicator`] and the cycle carries on.
//!
//! ## Sleeping
//!
//! Each watchdog interval: clear the [`WakeFlag`], halt through [`LowPower`], then spin
//! until the watchdog ISR has set the flag. Clearing before halting is what keeps a
//! wake-up from being lost.

use embedded_hal::delay::DelayNs;

use crate::board::{AnalogSource, BlinkCode, Clock, Indicator, LowPower, NvStorage};
use crate::config::Config;
use crate::measure::{MeasurementCycle, Meter, integrate_energy};
use crate::payload::Report;
use crate::store::EnergyStore;
use crate::timer::WakeFlag;
use crate::transport::FrameTransport;

/// States of the duty cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum CycleState {
    /// Sample voltage, current and battery, integrate energy.
    #[default]
    Measuring,
    /// Encode and send the report.
    Transmitting,
    /// Write the energy total if it drifted far enough.
    Persisting,
    /// Halt for the configured number of watchdog intervals.
    Sleeping,
}

/// The board-level collaborators the scheduler drives.
#[derive(Debug)]
pub struct Board<A, L, C, I, D> {
    /// Analog inputs of the metering front end.
    pub adc: A,
    /// CPU halt.
    pub low_power: L,
    /// Millisecond time base, running through sleep.
    pub clock: C,
    /// Diagnostic LED.
    pub indicator: I,
    /// Blocking delay for sampling and bit timing.
    pub delay: D,
}

/// State carried from one cycle into the next.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleContext {
    /// Cumulative energy in Wh.
    pub energy_wh: f32,
    /// Clock reading at the previous successful measurement.
    pub last_cycle_ms: Option<u32>,
    /// Measurement of the cycle in progress.
    pub measurement: Option<MeasurementCycle>,
}

/// What happened during one complete cycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CycleReport {
    /// The measurement, `None` if the analog source failed.
    pub measurement: Option<MeasurementCycle>,
    /// Energy total at the end of the measuring state.
    pub energy_wh: f32,
    /// A report went on air.
    pub transmitted: bool,
    /// The energy total was written to storage.
    pub persisted: bool,
    /// The battery was below the floor; transmission and persistence were skipped.
    pub undervoltage: bool,
    /// Watchdog wake-ups observed while sleeping.
    pub wake_count: u8,
}

/// Runs the node.
///
/// ## Type Parameters
///
/// - `A`: [`AnalogSource`] of the voltage, current and battery channels
/// - `L`: [`LowPower`] halt
/// - `C`: [`Clock`]
/// - `I`: [`Indicator`]
/// - `D`: [`DelayNs`] used for sampling and transmission
/// - `T`: [`FrameTransport`] putting reports on air
/// - `S`: [`NvStorage`] holding the energy total
#[derive(Debug)]
pub struct DutyCycleScheduler<'a, A, L, C, I, D, T, S>
where
    A: AnalogSource,
    L: LowPower,
    C: Clock,
    I: Indicator,
    D: DelayNs,
    T: FrameTransport,
    S: NvStorage,
{
    meter: Meter<A>,
    low_power: L,
    clock: C,
    indicator: I,
    delay: D,
    transport: T,
    store: EnergyStore<S>,
    wake: &'a WakeFlag,
    config: Config,
    state: CycleState,
    context: CycleContext,
    report: CycleReport,
}

impl<'a, A, L, C, I, D, T, S> DutyCycleScheduler<'a, A, L, C, I, D, T, S>
where
    A: AnalogSource,
    L: LowPower,
    C: Clock,
    I: Indicator,
    D: DelayNs,
    T: FrameTransport,
    S: NvStorage,
{
    /// Loads the energy total and prepares the first cycle.
    ///
    /// # Arguments
    /// - `board`: The board collaborators
    /// - `transport`: The on-air profile
    /// - `storage`: Non-volatile storage holding the energy total
    /// - `wake`: The flag the watchdog ISR sets
    /// - `config`: Node configuration
    pub fn boot(
        board: Board<A, L, C, I, D>,
        transport: T,
        storage: S,
        wake: &'a WakeFlag,
        config: Config,
    ) -> Self {
        let Board {
            adc,
            low_power,
            clock,
            mut indicator,
            delay,
        } = board;
        let mut store =
            EnergyStore::with_params(storage, config.store_offset, config.persist_threshold_wh);
        let energy_wh = store.load();
        indicator.signal(BlinkCode::Boot);
        info!(
            "node {} booted, sleeping {} ms per cycle",
            config.device_id,
            config.sleep_period_ms()
        );

        Self {
            meter: Meter::new(adc, config.meter),
            low_power,
            clock,
            indicator,
            delay,
            transport,
            store,
            wake,
            config,
            state: CycleState::Measuring,
            context: CycleContext {
                energy_wh,
                ..CycleContext::default()
            },
            report: CycleReport::default(),
        }
    }

    /// The state the next [`step`](Self::step) will run.
    pub fn state(&self) -> CycleState {
        self.state
    }

    /// Cumulative energy in Wh.
    pub fn energy_wh(&self) -> f32 {
        self.context.energy_wh
    }

    /// State carried between cycles.
    pub fn context(&self) -> &CycleContext {
        &self.context
    }

    /// Active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The energy store.
    pub fn store(&self) -> &EnergyStore<S> {
        &self.store
    }

    /// The diagnostic indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// The low-power collaborator.
    pub fn low_power(&self) -> &L {
        &self.low_power
    }

    /// Runs the current state and returns the next one.
    pub fn step(&mut self) -> CycleState {
        let next = match self.state {
            CycleState::Measuring => self.measuring(),
            CycleState::Transmitting => self.transmitting(),
            CycleState::Persisting => self.persisting(),
            CycleState::Sleeping => self.sleeping(),
        };
        trace!("{:?} -> {:?}", self.state, next);
        self.state = next;
        next
    }

    /// Runs until the next cycle is about to start and reports what happened.
    pub fn run_cycle(&mut self) -> CycleReport {
        loop {
            if self.step() == CycleState::Measuring {
                return self.report;
            }
        }
    }

    /// Cycles forever.
    pub fn run(&mut self) -> ! {
        loop {
            let report = self.run_cycle();
            debug!(
                "cycle done: energy {} Wh, sent {}, persisted {}",
                report.energy_wh, report.transmitted, report.persisted
            );
        }
    }

    fn measuring(&mut self) -> CycleState {
        self.report = CycleReport::default();
        self.indicator.signal(BlinkCode::Alive);

        let measurement = match self.meter.measure_cycle(&mut self.delay) {
            Ok(m) => m,
            Err(e) => {
                warn!("measurement skipped: {}", e);
                self.context.measurement = None;
                self.indicator.signal(BlinkCode::MeasureFailed);
                return CycleState::Sleeping;
            }
        };

        let now = self.clock.now_ms();
        let elapsed_ms = self
            .context
            .last_cycle_ms
            .map_or(0, |last| now.wrapping_sub(last));
        self.context.last_cycle_ms = Some(now);
        self.context.energy_wh =
            integrate_energy(self.context.energy_wh, measurement.power, elapsed_ms);
        self.context.measurement = Some(measurement);

        self.report.measurement = Some(measurement);
        self.report.energy_wh = self.context.energy_wh;

        if measurement.battery_v < self.config.battery_floor_v {
            warn!(
                "battery at {} V, below the {} V floor; radio stays off",
                measurement.battery_v, self.config.battery_floor_v
            );
            self.report.undervoltage = true;
            self.indicator.signal(BlinkCode::Undervoltage);
            return CycleState::Sleeping;
        }
        CycleState::Transmitting
    }

    fn transmitting(&mut self) -> CycleState {
        let Some(measurement) = self.context.measurement else {
            return CycleState::Sleeping;
        };
        let report = Report::new(self.config.device_id, &measurement, self.context.energy_wh);
        let sent = report
            .encode(self.config.payload_format)
            .and_then(|payload| self.transport.send(&payload, &mut self.delay));
        match sent {
            Ok(()) => self.report.transmitted = true,
            Err(e) => {
                warn!("transmission failed: {}", e);
                self.indicator.signal(BlinkCode::TransmitFailed);
            }
        }
        CycleState::Persisting
    }

    fn persisting(&mut self) -> CycleState {
        match self.store.maybe_persist(self.context.energy_wh) {
            Ok(written) => self.report.persisted = written,
            Err(e) => {
                warn!("energy total not persisted: {}", e);
                self.indicator.signal(BlinkCode::PersistFailed);
            }
        }
        CycleState::Sleeping
    }

    fn sleeping(&mut self) -> CycleState {
        for _ in 0..self.config.sleep_intervals.max(1) {
            self.wake.clear();
            self.low_power.halt();
            self.wake.wait();
            self.report.wake_count = self.report.wake_count.saturating_add(1);
        }
        self.context.measurement = None;
        CycleState::Measuring
    }
}
