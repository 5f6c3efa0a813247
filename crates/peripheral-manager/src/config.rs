use embassy_time::Duration;

use crate::devices::{hdc1050, mcp9808, tca9554a};
use crate::mux::MuxState;

pub const NUM_TEMPERATURE_SENSORS: usize = 3;

pub const DEFAULT_CYCLE_PERIOD: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_FAILURES: u8 = 3;
/// HDC1050 14-bit temperature plus humidity conversion, with margin.
pub const DEFAULT_CONVERSION_WAIT: Duration = Duration::from_millis(20);
pub const DEFAULT_SETTLE_PERIOD: Duration = Duration::from_millis(50);

/// How a sensor is selected around its read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SelectLine {
    None,
    /// Drive an expander output high for the duration of the read.
    Expander(u8),
    /// Hold the multiplexer in this state for the duration of the read.
    Mux(MuxState),
}

#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ManagerConfig {
    pub cycle_period: Duration,
    /// Consecutive failures before a device is dropped from the cycle.
    pub max_failures: u8,
    pub enqueue_timeout: Option<Duration>,
    pub mux_timeout: Option<Duration>,
    pub conversion_wait: Duration,
    /// Drive the expander status lines around reads.
    pub status_lines: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            cycle_period: DEFAULT_CYCLE_PERIOD,
            max_failures: DEFAULT_MAX_FAILURES,
            enqueue_timeout: Some(Duration::from_millis(10)),
            mux_timeout: Some(Duration::from_millis(100)),
            conversion_wait: DEFAULT_CONVERSION_WAIT,
            status_lines: true,
        }
    }
}

/// Addresses and select wiring of the sensor board.
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BoardConfig {
    pub temperature_addresses: [u8; NUM_TEMPERATURE_SENSORS],
    pub humidity_address: u8,
    pub expander_address: u8,
    pub temperature_select: [SelectLine; NUM_TEMPERATURE_SENSORS],
    pub humidity_select: SelectLine,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            temperature_addresses: mcp9808::ADDRESSES,
            humidity_address: hdc1050::ADDRESS,
            expander_address: tca9554a::ADDRESS,
            temperature_select: [
                SelectLine::Expander(2),
                SelectLine::Expander(3),
                SelectLine::Expander(4),
            ],
            humidity_select: SelectLine::Expander(5),
        }
    }
}
