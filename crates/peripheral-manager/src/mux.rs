//! Arbitration of the shared analog and power multiplexers.
//!
//! One selector register drives both multiplexers. A caller takes the
//! arbiter lock, writes the selection it needs and keeps the lock for as
//! long as it depends on that selection. After a power refresh the lock is
//! held back for a settle period so rails can stabilise before anyone
//! measures through the mux.

use core::cell::Cell;
use core::convert::Infallible;
use core::future::pending;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::{Mutex, MutexGuard};
use embassy_time::{with_timeout, Duration, Instant, Timer};

use crate::error::MuxError;

/// Selector of the 8-way analog multiplexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IoMuxOutput(u8);

impl IoMuxOutput {
    /// Active-low system disable line.
    pub const SYSDISBL_N: Self = Self(0);

    pub const fn new(channel: u8) -> Option<Self> {
        if channel < 8 {
            Some(Self(channel))
        } else {
            None
        }
    }

    pub fn channel(&self) -> u8 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum PowerMuxOutput {
    PeripheralVcc = 0,
    Bandage = 1,
}

/// Full selection written to the mux register in one go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxState {
    pub io_output: IoMuxOutput,
    pub power_output: PowerMuxOutput,
    pub power_enabled: bool,
}

impl MuxState {
    const IO_MASK: u8 = 0b0000_0111;
    const POWER_SELECT: u8 = 1 << 3;
    const POWER_DISABLE: u8 = 1 << 4;

    /// Peripheral rail switched on through the power mux.
    pub const REFRESH: Self = Self {
        io_output: IoMuxOutput::SYSDISBL_N,
        power_output: PowerMuxOutput::PeripheralVcc,
        power_enabled: true,
    };

    /// Power mux off, analog mux parked on the system disable line.
    pub const SHUTDOWN: Self = Self {
        io_output: IoMuxOutput::SYSDISBL_N,
        power_output: PowerMuxOutput::PeripheralVcc,
        power_enabled: false,
    };

    /// Register encoding. The power mux enable is active low.
    pub fn register_value(&self) -> u8 {
        let mut value = self.io_output.channel() & Self::IO_MASK;
        if self.power_output == PowerMuxOutput::Bandage {
            value |= Self::POWER_SELECT;
        }
        if !self.power_enabled {
            value |= Self::POWER_DISABLE;
        }
        value
    }
}

/// Hardware behind the arbiter.
pub trait MuxRegister {
    type Error: core::fmt::Debug;

    /// Latch a new selection.
    fn write(&mut self, value: u8) -> Result<(), Self::Error>;

    /// Turn the connector-sense pin into a current sink. Only used on shutdown.
    fn sink_connector_sense(&mut self) -> Result<(), Self::Error>;
}

pub struct MuxArbiter<M: RawMutex, R: MuxRegister> {
    register: Mutex<M, R>,
    settle_until: BlockingMutex<M, Cell<Option<Instant>>>,
    settle_period: Duration,
}

/// Exclusive use of the multiplexers. Dropping it releases the lock.
pub struct MuxGuard<'a, M: RawMutex, R: MuxRegister> {
    register: MutexGuard<'a, M, R>,
}

impl<M: RawMutex, R: MuxRegister> MuxGuard<'_, M, R> {
    /// Write `state` to the selector register.
    pub fn apply(&mut self, state: MuxState) -> Result<(), MuxError> {
        self.register.write(state.register_value()).map_err(|_e| {
            #[cfg(feature = "defmt")]
            defmt::warn!("Mux register write failed");
            MuxError::Register
        })
    }

    pub fn release(self) {}
}

impl<M: RawMutex, R: MuxRegister> MuxArbiter<M, R> {
    pub const fn new(register: R, settle_period: Duration) -> Self {
        Self {
            register: Mutex::new(register),
            settle_until: BlockingMutex::new(Cell::new(None)),
            settle_period,
        }
    }

    /// Take the lock, waiting out any settle period in progress.
    ///
    /// `None` waits indefinitely. The timeout covers the settle wait too.
    pub async fn acquire(
        &self,
        timeout: Option<Duration>,
    ) -> Result<MuxGuard<'_, M, R>, MuxError> {
        let fut = async {
            let register = self.register.lock().await;
            if let Some(until) = self.settle_until.lock(|c| c.get()) {
                Timer::at(until).await;
                self.settle_until.lock(|c| c.set(None));
            }
            MuxGuard { register }
        };
        match timeout {
            Some(timeout) => with_timeout(timeout, fut).await.map_err(|_| {
                #[cfg(feature = "defmt")]
                defmt::warn!("Mux lock timed out");
                MuxError::Timeout
            }),
            None => Ok(fut.await),
        }
    }

    /// Take the lock only if it is free and not settling.
    pub fn try_acquire(&self) -> Option<MuxGuard<'_, M, R>> {
        if self.is_settling() {
            return None;
        }
        self.register.try_lock().ok().map(|register| MuxGuard { register })
    }

    /// Apply `state` and release the lock straight away.
    pub async fn apply(
        &self,
        state: MuxState,
        timeout: Option<Duration>,
    ) -> Result<(), MuxError> {
        let mut guard = self.acquire(timeout).await?;
        guard.apply(state)
    }

    /// Power up the peripheral rail and hold the lock for the settle period.
    ///
    /// Returns once the rail is switched; later callers of [`Self::acquire`]
    /// wait until the settle period has passed.
    pub async fn refresh(&self, timeout: Option<Duration>) -> Result<(), MuxError> {
        let mut guard = self.acquire(timeout).await?;
        guard.apply(MuxState::REFRESH)?;
        let until = Instant::now() + self.settle_period;
        self.settle_until.lock(|c| c.set(Some(until)));
        #[cfg(feature = "defmt")]
        defmt::debug!("Mux refreshed, settling for {=u64} ms", self.settle_period.as_millis());
        guard.release();
        Ok(())
    }

    /// Cut power and keep the lock forever. Only an error returns.
    pub async fn shutdown(&self) -> Result<Infallible, MuxError> {
        let mut guard = self.acquire(None).await?;
        guard.apply(MuxState::SHUTDOWN)?;
        if guard.register.sink_connector_sense().is_err() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Failed to sink connector sense pin");
        }
        #[cfg(feature = "defmt")]
        defmt::warn!("Power mux disabled, waiting for power loss");
        let never = pending::<Infallible>().await;
        match never {}
    }

    /// Returns `true` while the post-refresh settle period is running.
    pub fn is_settling(&self) -> bool {
        self.settle_until
            .lock(|c| c.get())
            .is_some_and(|until| Instant::now() < until)
    }

    pub fn settle_period(&self) -> Duration {
        self.settle_period
    }
}
