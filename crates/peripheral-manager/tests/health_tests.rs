use bus_scheduler::BusError;
use peripheral_manager::{DeviceDescriptor, HealthState, HealthTracker, PeripheralError};

#[test]
fn new_tracker_is_ok() {
    let tracker = HealthTracker::new(3);
    assert_eq!(tracker.state(), HealthState::Ok);
    assert_eq!(tracker.attempts(), 0);
    assert!(tracker.is_active());
}

#[test]
fn failures_escalate_to_failed_at_threshold() {
    let mut tracker = HealthTracker::new(3);
    assert_eq!(tracker.record_failure(), HealthState::Intermittent);
    assert_eq!(tracker.record_failure(), HealthState::Intermittent);
    assert!(tracker.is_active());
    assert_eq!(tracker.record_failure(), HealthState::Failed);
    assert!(!tracker.is_active());
    assert_eq!(tracker.attempts(), 3);
}

#[test]
fn success_resets_attempts() {
    let mut tracker = HealthTracker::new(3);
    tracker.record_failure();
    tracker.record_failure();
    assert_eq!(tracker.record_success(), HealthState::Ok);
    assert_eq!(tracker.attempts(), 0);

    // The counter starts over, so two more failures are not enough.
    tracker.record_failure();
    assert_eq!(tracker.record_failure(), HealthState::Intermittent);
}

#[test]
fn failed_is_sticky() {
    let mut tracker = HealthTracker::new(1);
    assert_eq!(tracker.record_failure(), HealthState::Failed);
    assert_eq!(tracker.record_success(), HealthState::Failed);
    assert_eq!(tracker.record_failure(), HealthState::Failed);
    assert_eq!(tracker.attempts(), 1);
}

#[test]
fn zero_threshold_fails_on_first_error() {
    let mut tracker = HealthTracker::new(0);
    assert_eq!(tracker.record_failure(), HealthState::Failed);
}

#[test]
fn descriptor_records_outcomes() {
    let mut descriptor = DeviceDescriptor::new(0x18, 3);

    let err = PeripheralError::from(BusError::TransferFailed);
    assert_eq!(descriptor.record::<u16>(Err(err)), None);
    assert_eq!(descriptor.last_error, Some(err));
    assert_eq!(descriptor.health.state(), HealthState::Intermittent);

    assert_eq!(descriptor.record(Ok(0x0B90u16)), Some(0x0B90));
    assert_eq!(descriptor.last_error, None);
    assert_eq!(descriptor.health.state(), HealthState::Ok);
}
