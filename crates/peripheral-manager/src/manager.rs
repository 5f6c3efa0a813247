use bus_scheduler::BusClient;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Ticker, Timer};
use embedded_hal::digital::{OutputPin, PinState};

use crate::config::{BoardConfig, ManagerConfig, SelectLine, NUM_TEMPERATURE_SENSORS};
use crate::descriptor::DeviceDescriptor;
use crate::devices::{Hdc1050, Mcp9808, Measurement, Tca9554a};
use crate::error::PeripheralError;
use crate::health::HealthState;
use crate::mux::{MuxArbiter, MuxGuard, MuxRegister};
use crate::telemetry::{Channel, TelemetrySink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceId {
    Temperature(usize),
    Humidity,
    Expander,
}

/// Health of every managed device at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HealthReport {
    pub temperature: [HealthState; NUM_TEMPERATURE_SENSORS],
    pub humidity: HealthState,
    pub expander: HealthState,
}

/// Periodic power, configure, read and power-down cycle over the sensors.
///
/// Every bus access goes through the scheduler queue and waits on this
/// task's completion signal, so the manager only ever has one transaction
/// outstanding. Devices that keep failing are dropped from later cycles.
pub struct PeripheralManager<'q, 'a, M, P, R, T, const N: usize>
where
    M: RawMutex,
    P: OutputPin,
    R: MuxRegister,
    T: TelemetrySink,
{
    bus: BusClient<'q, 'a, M, N>,
    mux: &'q MuxArbiter<M, R>,
    power: P,
    telemetry: T,
    config: ManagerConfig,
    board: BoardConfig,
    expander: Tca9554a,
    temperature: [Mcp9808; NUM_TEMPERATURE_SENSORS],
    humidity: Hdc1050,
}

impl<'q, 'a, M, P, R, T, const N: usize> PeripheralManager<'q, 'a, M, P, R, T, N>
where
    M: RawMutex,
    P: OutputPin,
    R: MuxRegister,
    T: TelemetrySink,
{
    pub fn new(
        bus: BusClient<'q, 'a, M, N>,
        mux: &'q MuxArbiter<M, R>,
        power: P,
        telemetry: T,
        config: ManagerConfig,
        board: BoardConfig,
    ) -> Self {
        let max_failures = config.max_failures;
        Self {
            bus: bus.with_enqueue_timeout(config.enqueue_timeout),
            mux,
            power,
            telemetry,
            config,
            board,
            expander: Tca9554a::new(board.expander_address, max_failures),
            temperature: board
                .temperature_addresses
                .map(|address| Mcp9808::new(address, max_failures)),
            humidity: Hdc1050::new(board.humidity_address, max_failures),
        }
    }

    pub async fn run(&mut self) -> ! {
        #[cfg(feature = "defmt")]
        defmt::info!("Peripheral manager started");
        let mut ticker = Ticker::every(self.config.cycle_period);
        loop {
            self.cycle().await;
            ticker.next().await;
        }
    }

    /// One full pass: power on, configure, read, power off.
    pub async fn cycle(&mut self) {
        self.set_power(true);
        self.configure().await;
        self.read().await;
        self.set_power(false);
    }

    pub fn health(&self, id: DeviceId) -> Option<HealthState> {
        self.descriptor(id).map(|d| d.health.state())
    }

    pub fn health_report(&self) -> HealthReport {
        HealthReport {
            temperature: core::array::from_fn(|i| self.temperature[i].descriptor.health.state()),
            humidity: self.humidity.descriptor.health.state(),
            expander: self.expander.descriptor.health.state(),
        }
    }

    pub fn descriptor(&self, id: DeviceId) -> Option<&DeviceDescriptor> {
        match id {
            DeviceId::Temperature(i) => self.temperature.get(i).map(|s| &s.descriptor),
            DeviceId::Humidity => Some(&self.humidity.descriptor),
            DeviceId::Expander => Some(&self.expander.descriptor),
        }
    }

    fn set_power(&mut self, on: bool) {
        if self.power.set_state(PinState::from(on)).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Failed to switch peripheral power");
        }
    }

    async fn configure(&mut self) {
        if self.config.status_lines && self.expander.descriptor.health.is_active() {
            let result = self.expander.configure(&self.bus).await;
            self.expander.descriptor.record(result);
        }

        for sensor in self.temperature.iter_mut() {
            if !sensor.descriptor.health.is_active() {
                continue;
            }
            let result = sensor.configure(&self.bus).await;
            sensor.descriptor.record(result);
        }

        if self.humidity.descriptor.health.is_active() {
            let result = match self.humidity.configure(&self.bus).await {
                Ok(()) => {
                    self.humidity
                        .start_conversion(&self.bus, self.config.conversion_wait)
                        .await
                }
                Err(e) => Err(e),
            };
            self.humidity.descriptor.record(result);
        }
    }

    async fn read(&mut self) {
        for index in 0..NUM_TEMPERATURE_SENSORS {
            if !self.temperature[index].descriptor.health.is_active() {
                continue;
            }
            let line = self.board.temperature_select[index];
            let result = self.read_temperature(index, line).await;
            if let Some(value) = self.temperature[index].descriptor.record(result) {
                #[cfg(feature = "defmt")]
                defmt::debug!("Temperature {=usize}: {=u16:#x}", index, value);
                self.telemetry.publish(Channel::Temperature, value, index as u8);
            }
        }

        if !self.humidity.descriptor.health.is_active() {
            return;
        }
        // Nothing to fetch if the conversion was never started.
        let Some(ready_at) = self.humidity.ready_at() else {
            return;
        };
        Timer::at(ready_at).await;
        let line = self.board.humidity_select;
        let result = self.read_humidity(line).await;
        if let Some(measurement) = self.humidity.descriptor.record(result) {
            #[cfg(feature = "defmt")]
            defmt::debug!(
                "Humidity {=u16:#x}, temperature {=u16:#x}",
                measurement.humidity,
                measurement.temperature
            );
            self.telemetry.publish(Channel::Humidity, measurement.humidity, 0);
            self.telemetry.publish(
                Channel::Temperature,
                measurement.temperature,
                NUM_TEMPERATURE_SENSORS as u8,
            );
        }
    }

    async fn read_temperature(
        &mut self,
        index: usize,
        line: SelectLine,
    ) -> Result<u16, PeripheralError> {
        let guard = self.select(line).await?;
        let result = self.temperature[index].read(&self.bus).await;
        self.deselect(line, guard).await;
        result
    }

    async fn read_humidity(
        &mut self,
        line: SelectLine,
    ) -> Result<Measurement, PeripheralError> {
        let guard = self.select(line).await?;
        let result = self.humidity.read(&self.bus).await;
        self.deselect(line, guard).await;
        result
    }

    async fn select(
        &mut self,
        line: SelectLine,
    ) -> Result<Option<MuxGuard<'q, M, R>>, PeripheralError> {
        match line {
            SelectLine::None => Ok(None),
            SelectLine::Expander(pin) => {
                self.set_status_line(pin, true).await;
                Ok(None)
            }
            SelectLine::Mux(state) => {
                let mux = self.mux;
                let mut guard = mux.acquire(self.config.mux_timeout).await?;
                guard.apply(state)?;
                Ok(Some(guard))
            }
        }
    }

    async fn deselect(&mut self, line: SelectLine, guard: Option<MuxGuard<'q, M, R>>) {
        if let SelectLine::Expander(pin) = line {
            self.set_status_line(pin, false).await;
        }
        if let Some(guard) = guard {
            guard.release();
        }
    }

    async fn set_status_line(&mut self, pin: u8, high: bool) {
        if !self.config.status_lines || !self.expander.descriptor.health.is_active() {
            return;
        }
        let result = self.expander.set_pin(&self.bus, pin, high).await;
        // Bad wiring in the board config is not the expander's fault.
        if let Err(PeripheralError::InvalidPin(_pin)) = result {
            #[cfg(feature = "defmt")]
            defmt::warn!("Status line {=u8} is not an expander output", _pin);
            return;
        }
        self.expander.descriptor.record(result);
    }
}
