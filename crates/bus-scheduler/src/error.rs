/// Errors reported by the transaction scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusError {
    /// The transaction has no completion handle or nothing to transfer.
    InvalidParameter,
    /// No driver task is attached to the queue yet.
    NotInitialized,
    /// The queue has no free entries.
    OutOfMemory,
    /// The queue lock was not obtained in time, or the bus watchdog fired.
    Timeout,
    /// The bus driver reported a failed transfer.
    TransferFailed,
}

impl core::fmt::Display for BusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            BusError::InvalidParameter => write!(f, "Invalid transaction"),
            BusError::NotInitialized => {
                write!(f, "Bus scheduler not initialized")
            }
            BusError::OutOfMemory => write!(f, "Transaction queue full"),
            BusError::Timeout => write!(f, "Bus operation timed out"),
            BusError::TransferFailed => write!(f, "Bus transfer failed"),
        }
    }
}
