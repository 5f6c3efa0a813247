/// Degradation classification of one peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HealthState {
    #[default]
    Ok,
    /// Recent operations failed, but fewer than the escalation threshold.
    Intermittent,
    /// Excluded from all further cycles until restart.
    Failed,
}

/// Per-device failure counter with escalation to [`HealthState::Failed`].
///
/// Every failure increments the attempt counter. Reaching the threshold
/// marks the device failed; any success before that resets the counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HealthTracker {
    state: HealthState,
    attempts: u8,
    threshold: u8,
}

impl HealthTracker {
    /// A healthy tracker that fails after `threshold` consecutive failures.
    pub const fn new(threshold: u8) -> Self {
        let threshold = if threshold == 0 { 1 } else { threshold };
        Self { state: HealthState::Ok, attempts: 0, threshold }
    }

    pub fn state(&self) -> HealthState {
        self.state
    }

    /// Consecutive failures since the last success.
    pub fn attempts(&self) -> u8 {
        self.attempts
    }

    /// Returns `true` unless the device has failed for good.
    pub fn is_active(&self) -> bool {
        self.state != HealthState::Failed
    }

    pub fn record_success(&mut self) -> HealthState {
        if self.state != HealthState::Failed {
            self.state = HealthState::Ok;
            self.attempts = 0;
        }
        self.state
    }

    pub fn record_failure(&mut self) -> HealthState {
        if self.state == HealthState::Failed {
            return self.state;
        }
        self.attempts = self.attempts.saturating_add(1);
        self.state = if self.attempts >= self.threshold {
            HealthState::Failed
        } else {
            HealthState::Intermittent
        };
        self.state
    }
}
