//! TCA9554A 8-bit I/O expander driving the status lines.

use bus_scheduler::BusClient;
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::descriptor::DeviceDescriptor;
use crate::error::PeripheralError;

pub const ADDRESS: u8 = 0x38;

pub mod reg {
    pub const INPUT: u8 = 0x00;
    pub const OUTPUT: u8 = 0x01;
    pub const POLARITY: u8 = 0x02;
    pub const CONFIG: u8 = 0x03;
}

/// Pins 0 and 1 are inputs, the rest drive status lines.
pub const DIRECTION: u8 = 0b0000_0011;

/// Pins that may be driven as status lines.
pub const OUTPUT_PINS: core::ops::RangeInclusive<u8> = 2..=7;

pub struct Tca9554a {
    pub descriptor: DeviceDescriptor,
    output: u8,
}

impl Tca9554a {
    pub const fn new(address: u8, max_failures: u8) -> Self {
        Self { descriptor: DeviceDescriptor::new(address, max_failures), output: 0 }
    }

    /// Drive every output low and set the pin directions.
    pub async fn configure<M: RawMutex, const N: usize>(
        &mut self,
        bus: &BusClient<'_, '_, M, N>,
    ) -> Result<(), PeripheralError> {
        self.output = 0;
        bus.write(self.descriptor.address, &[reg::OUTPUT, self.output]).await?;
        bus.write(self.descriptor.address, &[reg::CONFIG, DIRECTION]).await?;
        self.descriptor.configuration = u16::from(DIRECTION);
        Ok(())
    }

    /// Set one output pin, leaving the others as last written.
    ///
    /// Input pins and pins past 7 are rejected without touching the bus.
    pub async fn set_pin<M: RawMutex, const N: usize>(
        &mut self,
        bus: &BusClient<'_, '_, M, N>,
        pin: u8,
        high: bool,
    ) -> Result<(), PeripheralError> {
        if !OUTPUT_PINS.contains(&pin) {
            return Err(PeripheralError::InvalidPin(pin));
        }
        let mask = 1u8 << pin;
        let output = if high { self.output | mask } else { self.output & !mask };
        bus.write(self.descriptor.address, &[reg::OUTPUT, output]).await?;
        self.output = output;
        Ok(())
    }

    /// Output register value as last written.
    pub fn output(&self) -> u8 {
        self.output
    }
}
