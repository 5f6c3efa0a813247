//! Periodic sensor management on top of `bus-scheduler`.
//!
//! [`PeripheralManager`] powers the sensor board, configures and reads the
//! temperature and humidity sensors through the shared bus queue, tracks
//! per-device health and publishes readings to a [`TelemetrySink`].
//! [`MuxArbiter`] serialises access to the analog and power multiplexers.
#![no_std]

mod config;
mod descriptor;
pub mod devices;
mod error;
mod health;
mod manager;
mod mux;
mod telemetry;

pub use config::{
    BoardConfig, ManagerConfig, SelectLine, DEFAULT_CONVERSION_WAIT, DEFAULT_CYCLE_PERIOD,
    DEFAULT_MAX_FAILURES, DEFAULT_SETTLE_PERIOD, NUM_TEMPERATURE_SENSORS,
};
pub use descriptor::DeviceDescriptor;
pub use error::{MuxError, PeripheralError};
pub use health::{HealthState, HealthTracker};
pub use manager::{DeviceId, HealthReport, PeripheralManager};
pub use mux::{IoMuxOutput, MuxArbiter, MuxGuard, MuxRegister, MuxState, PowerMuxOutput};
pub use telemetry::{Channel, Reading, ReadingQueue, TelemetrySink};
