use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel;

/// Kind of value published to telemetry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Temperature,
    Humidity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Reading {
    pub channel: Channel,
    /// Raw sensor code.
    pub value: u16,
    pub device_index: u8,
}

/// Consumer of decoded readings. Publishing must not block.
pub trait TelemetrySink {
    fn publish(&self, channel: Channel, value: u16, device_index: u8);
}

impl<T: TelemetrySink + ?Sized> TelemetrySink for &T {
    fn publish(&self, channel: Channel, value: u16, device_index: u8) {
        (**self).publish(channel, value, device_index)
    }
}

/// Bounded queue of readings for another task to drain.
pub struct ReadingQueue<M: RawMutex, const N: usize> {
    inner: channel::Channel<M, Reading, N>,
}

impl<M: RawMutex, const N: usize> ReadingQueue<M, N> {
    pub const fn new() -> Self {
        Self { inner: channel::Channel::new() }
    }

    pub fn receiver(&self) -> channel::Receiver<'_, M, Reading, N> {
        self.inner.receiver()
    }

    pub async fn receive(&self) -> Reading {
        self.inner.receive().await
    }

    pub fn try_receive(&self) -> Option<Reading> {
        self.inner.try_receive().ok()
    }
}

impl<M: RawMutex, const N: usize> Default for ReadingQueue<M, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, const N: usize> TelemetrySink for ReadingQueue<M, N> {
    fn publish(&self, channel: Channel, value: u16, device_index: u8) {
        let reading = Reading { channel, value, device_index };
        if self.inner.try_send(reading).is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Telemetry queue full, dropping reading");
        }
    }
}
