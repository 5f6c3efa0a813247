use crate::error::PeripheralError;
use crate::health::{HealthState, HealthTracker};

/// Mutable record kept for each physical peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// 7-bit bus address.
    pub address: u8,
    /// Configuration register value last written to the device.
    pub configuration: u16,
    /// Last decoded reading.
    pub last_reading: Option<u16>,
    /// Outcome of the last operation; `None` after a success.
    pub last_error: Option<PeripheralError>,
    pub health: HealthTracker,
}

impl DeviceDescriptor {
    pub const fn new(address: u8, max_failures: u8) -> Self {
        Self {
            address,
            configuration: 0,
            last_reading: None,
            last_error: None,
            health: HealthTracker::new(max_failures),
        }
    }

    /// Feed an operation's outcome into the health state.
    pub fn record<T>(&mut self, result: Result<T, PeripheralError>) -> Option<T> {
        match result {
            Ok(value) => {
                self.last_error = None;
                self.health.record_success();
                Some(value)
            }
            Err(e) => {
                self.last_error = Some(e);
                let before = self.health.state();
                let after = self.health.record_failure();
                if after == HealthState::Failed && before != HealthState::Failed {
                    #[cfg(feature = "defmt")]
                    defmt::error!("Device {=u8:#x} failed permanently", self.address);
                } else {
                    #[cfg(feature = "defmt")]
                    defmt::warn!(
                        "Device {=u8:#x} operation failed ({=u8} attempts)",
                        self.address,
                        self.health.attempts()
                    );
                }
                None
            }
        }
    }
}
