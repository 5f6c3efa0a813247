//! HDC1050 humidity and temperature sensor.

use bitflags::bitflags;
use bus_scheduler::{BusClient, BusError};
use byteorder::{BigEndian, ByteOrder};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant};

use crate::descriptor::DeviceDescriptor;
use crate::error::PeripheralError;

pub const ADDRESS: u8 = 0x40;

/// The two low bits of each measurement are reserved.
pub const MEASUREMENT_MASK: u16 = 0xFFFC;

pub mod reg {
    pub const TEMPERATURE: u8 = 0x00;
    pub const HUMIDITY: u8 = 0x01;
    pub const CONFIGURATION: u8 = 0x02;
    pub const MANUFACTURER_ID: u8 = 0xFE;
    pub const DEVICE_ID: u8 = 0xFF;
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Config: u16 {
        const HUMIDITY_11BIT = 1 << 8;
        const HUMIDITY_8BIT = 1 << 9;
        const TEMPERATURE_11BIT = 1 << 10;
        const BATTERY_LOW = 1 << 11;
        /// Temperature then humidity from a single trigger.
        const SEQUENTIAL = 1 << 12;
        const HEATER = 1 << 13;
        const SOFT_RESET = 1 << 15;
    }
}

/// Raw temperature and humidity codes from one sequential conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    pub temperature: u16,
    pub humidity: u16,
}

pub fn decode_measurement(raw: &[u8]) -> Result<Measurement, BusError> {
    if raw.len() < 4 {
        return Err(BusError::TransferFailed);
    }
    Ok(Measurement {
        temperature: BigEndian::read_u16(&raw[0..2]) & MEASUREMENT_MASK,
        humidity: BigEndian::read_u16(&raw[2..4]) & MEASUREMENT_MASK,
    })
}

pub struct Hdc1050 {
    pub descriptor: DeviceDescriptor,
    ready_at: Option<Instant>,
}

impl Hdc1050 {
    pub const fn new(address: u8, max_failures: u8) -> Self {
        Self {
            descriptor: DeviceDescriptor::new(address, max_failures),
            ready_at: None,
        }
    }

    /// Sequential mode, heater off, 14-bit resolution on both channels.
    pub async fn configure<M: RawMutex, const N: usize>(
        &mut self,
        bus: &BusClient<'_, '_, M, N>,
    ) -> Result<(), PeripheralError> {
        // A conversion left over from an earlier cycle is never read.
        self.ready_at = None;
        let config = Config::SEQUENTIAL;
        let mut frame = [reg::CONFIGURATION, 0, 0];
        BigEndian::write_u16(&mut frame[1..], config.bits());
        bus.write(self.descriptor.address, &frame).await?;
        self.descriptor.configuration = config.bits();
        Ok(())
    }

    /// Trigger a conversion whose result is ready after `wait`.
    pub async fn start_conversion<M: RawMutex, const N: usize>(
        &mut self,
        bus: &BusClient<'_, '_, M, N>,
        wait: Duration,
    ) -> Result<(), PeripheralError> {
        self.ready_at = None;
        bus.write(self.descriptor.address, &[reg::TEMPERATURE]).await?;
        self.ready_at = Some(Instant::now() + wait);
        Ok(())
    }

    /// When the pending conversion finishes, if one was started.
    pub fn ready_at(&self) -> Option<Instant> {
        self.ready_at
    }

    /// Fetch the finished conversion. The caller waits for [`Self::ready_at`].
    pub async fn read<M: RawMutex, const N: usize>(
        &mut self,
        bus: &BusClient<'_, '_, M, N>,
    ) -> Result<Measurement, PeripheralError> {
        self.ready_at = None;
        let raw = bus.read(self.descriptor.address, 4).await?;
        let measurement = decode_measurement(&raw)?;
        self.descriptor.last_reading = Some(measurement.humidity);
        Ok(measurement)
    }
}
