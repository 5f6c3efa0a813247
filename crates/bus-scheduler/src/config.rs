use embassy_time::Duration;

/// Largest write payload a single transaction can carry.
pub const MAX_WRITE_LEN: usize = 8;
/// Largest number of bytes a single transaction can read back.
pub const MAX_READ_LEN: usize = 8;

/// Default watchdog window for one transfer.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_millis(100);

/// Runtime settings for the [`BusDriver`](crate::BusDriver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// How long a transfer may stay on the bus before it is aborted.
    /// `None` disables the watchdog.
    pub transfer_timeout: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { transfer_timeout: Some(DEFAULT_TRANSFER_TIMEOUT) }
    }
}
