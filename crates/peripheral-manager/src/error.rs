use bus_scheduler::BusError;
use derive_more::From;

/// Errors from the multiplexer arbiter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MuxError {
    /// The arbiter lock was not obtained in time.
    Timeout,
    /// The selector register write failed.
    Register,
}

impl core::fmt::Display for MuxError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            MuxError::Timeout => write!(f, "Multiplexer lock timed out"),
            MuxError::Register => write!(f, "Multiplexer register write failed"),
        }
    }
}

/// Errors from talking to a peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, From)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PeripheralError {
    Bus(BusError),
    Mux(MuxError),
    /// Expander pin that is not a status output.
    #[from(ignore)]
    InvalidPin(u8),
}

impl core::fmt::Display for PeripheralError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PeripheralError::Bus(err) => write!(f, "Bus error: {}", err),
            PeripheralError::Mux(err) => write!(f, "Mux error: {}", err),
            PeripheralError::InvalidPin(pin) => write!(f, "Invalid expander pin {}", pin),
        }
    }
}
