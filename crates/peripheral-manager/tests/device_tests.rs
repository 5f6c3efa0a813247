use bus_scheduler::{BusClient, BusError, CompletionSignal, TransactionQueue};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use peripheral_manager::devices::{hdc1050, mcp9808, Measurement, Tca9554a};
use peripheral_manager::{IoMuxOutput, MuxState, PeripheralError, PowerMuxOutput};

#[test]
fn mcp9808_keeps_twelve_temperature_bits() {
    assert_eq!(mcp9808::decode_temperature(&[0x0B, 0x90]), Ok(0x0B90));
    // Alert flags and sign bit live in the top nibble.
    assert_eq!(mcp9808::decode_temperature(&[0xE1, 0x94]), Ok(0x0194));
}

#[test]
fn mcp9808_short_read_is_an_error() {
    assert_eq!(
        mcp9808::decode_temperature(&[0x0B]),
        Err(BusError::TransferFailed)
    );
}

#[test]
fn hdc1050_masks_status_bits() {
    assert_eq!(
        hdc1050::decode_measurement(&[0x66, 0x67, 0x80, 0x03]),
        Ok(Measurement { temperature: 0x6664, humidity: 0x8000 })
    );
    assert_eq!(
        hdc1050::decode_measurement(&[0x66, 0x67, 0x80]),
        Err(BusError::TransferFailed)
    );
}

#[test]
fn sequential_mode_configuration() {
    assert_eq!(hdc1050::Config::SEQUENTIAL.bits(), 0x1000);
    assert_eq!(mcp9808::Config::ALERT_ACTIVE_HIGH.bits(), 0x0002);
}

#[test]
fn mux_state_register_layout() {
    assert_eq!(MuxState::REFRESH.register_value(), 0b0000_0000);
    assert_eq!(MuxState::SHUTDOWN.register_value(), 0b0001_0000);

    let state = MuxState {
        io_output: IoMuxOutput::new(5).unwrap(),
        power_output: PowerMuxOutput::Bandage,
        power_enabled: true,
    };
    assert_eq!(state.register_value(), 0b0000_1101);
}

#[test]
fn io_mux_has_eight_channels() {
    assert_eq!(IoMuxOutput::new(7).map(|o| o.channel()), Some(7));
    assert_eq!(IoMuxOutput::new(8), None);
}

#[futures_test::test]
async fn expander_rejects_pins_that_are_not_outputs() {
    // No driver is attached, so anything reaching the bus fails.
    let done = CompletionSignal::new();
    let queue: TransactionQueue<'_, NoopRawMutex, 2> = TransactionQueue::new();
    let bus = BusClient::new(&queue, &done);
    let mut expander = Tca9554a::new(0x38, 3);

    for pin in [0, 1, 8, 255] {
        assert_eq!(
            expander.set_pin(&bus, pin, true).await,
            Err(PeripheralError::InvalidPin(pin))
        );
    }
    assert_eq!(
        expander.set_pin(&bus, 2, true).await,
        Err(PeripheralError::Bus(BusError::NotInitialized))
    );
    // The cached output only changes once a write succeeds.
    assert_eq!(expander.output(), 0);
}
