//! MCP9808 digital temperature sensor.

use bitflags::bitflags;
use bus_scheduler::{BusClient, BusError};
use byteorder::{BigEndian, ByteOrder};
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::descriptor::DeviceDescriptor;
use crate::error::PeripheralError;

/// Bus addresses of the three on-board sensors.
pub const ADDRESSES: [u8; 3] = [0x18, 0x19, 0x1A];

/// Only the 12 temperature bits of the ambient register are kept.
pub const TEMPERATURE_MASK: u16 = 0x0FFF;

pub mod reg {
    pub const CONFIG: u8 = 0x01;
    pub const ALERT_UPPER: u8 = 0x02;
    pub const ALERT_LOWER: u8 = 0x03;
    pub const CRITICAL: u8 = 0x04;
    pub const AMBIENT: u8 = 0x05;
    pub const MANUFACTURER_ID: u8 = 0x06;
    pub const DEVICE_ID: u8 = 0x07;
    pub const RESOLUTION: u8 = 0x08;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Config: u16 {
        const ALERT_INTERRUPT = 1 << 0;
        const ALERT_ACTIVE_HIGH = 1 << 1;
        const ALERT_CRITICAL_ONLY = 1 << 2;
        const ALERT_ENABLE = 1 << 3;
        const ALERT_STATUS = 1 << 4;
        const INTERRUPT_CLEAR = 1 << 5;
        const WINDOW_LOCK = 1 << 6;
        const CRITICAL_LOCK = 1 << 7;
        const SHUTDOWN = 1 << 8;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Resolution {
    /// 0.5 °C
    Half = 0x00,
    /// 0.25 °C
    Quarter = 0x01,
    /// 0.125 °C
    Eighth = 0x02,
    /// 0.0625 °C
    Sixteenth = 0x03,
}

/// Extract the ambient temperature field from a two-byte register read.
pub fn decode_temperature(raw: &[u8]) -> Result<u16, BusError> {
    if raw.len() < 2 {
        return Err(BusError::TransferFailed);
    }
    Ok(BigEndian::read_u16(raw) & TEMPERATURE_MASK)
}

pub struct Mcp9808 {
    pub descriptor: DeviceDescriptor,
    pub resolution: Resolution,
}

impl Mcp9808 {
    pub const fn new(address: u8, max_failures: u8) -> Self {
        Self {
            descriptor: DeviceDescriptor::new(address, max_failures),
            resolution: Resolution::Sixteenth,
        }
    }

    /// Write the alert configuration and the conversion resolution.
    pub async fn configure<M: RawMutex, const N: usize>(
        &mut self,
        bus: &BusClient<'_, '_, M, N>,
    ) -> Result<(), PeripheralError> {
        let config = Config::ALERT_ACTIVE_HIGH;
        let mut frame = [reg::CONFIG, 0, 0];
        BigEndian::write_u16(&mut frame[1..], config.bits());
        bus.write(self.descriptor.address, &frame).await?;
        self.descriptor.configuration = config.bits();

        bus.write(self.descriptor.address, &[reg::RESOLUTION, self.resolution as u8])
            .await?;
        Ok(())
    }

    /// Read the ambient temperature register.
    pub async fn read<M: RawMutex, const N: usize>(
        &mut self,
        bus: &BusClient<'_, '_, M, N>,
    ) -> Result<u16, PeripheralError> {
        let raw = bus.write_read(self.descriptor.address, &[reg::AMBIENT], 2).await?;
        let value = decode_temperature(&raw)?;
        self.descriptor.last_reading = Some(value);
        Ok(value)
    }
}
