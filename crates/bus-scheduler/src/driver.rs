use core::future::pending;

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Instant, Timer};

use crate::config::SchedulerConfig;
use crate::hardware::BusHardwareDriver;
use crate::port::{Ticket, TransferPort};
use crate::queue::TransactionQueue;

/// Single consumer of a [`TransactionQueue`].
///
/// Executes one transaction at a time against the bus hardware. Before the
/// next entry is taken off the queue, the processing permit must come back
/// from the completion path, or the watchdog must expire and abort the bus.
///
/// Firmware runs it from a dedicated task:
///
/// ```ignore
/// #[embassy_executor::task]
/// async fn bus_task(mut driver: I2cDriver) -> ! {
///     driver.run().await
/// }
/// ```
pub struct BusDriver<'d, 'a, M, D, const N: usize>
where
    M: RawMutex,
    D: BusHardwareDriver,
{
    queue: &'d TransactionQueue<'a, M, N>,
    port: &'d TransferPort<'a, M>,
    hardware: D,
    config: SchedulerConfig,
    watchdog: Option<(Ticket, Instant)>,
}

impl<'d, 'a, M, D, const N: usize> BusDriver<'d, 'a, M, D, N>
where
    M: RawMutex,
    D: BusHardwareDriver,
{
    /// Attach a driver to `queue`. From here on, producers may enqueue.
    pub fn new(
        queue: &'d TransactionQueue<'a, M, N>,
        port: &'d TransferPort<'a, M>,
        hardware: D,
        config: SchedulerConfig,
    ) -> Self {
        if queue.attach() {
            port.release_permit();
        }
        Self { queue, port, hardware, config, watchdog: None }
    }

    /// Process transactions forever.
    pub async fn run(&mut self) -> ! {
        #[cfg(feature = "defmt")]
        defmt::info!("Bus driver started");
        loop {
            self.process_next().await;
        }
    }

    /// Wait for the bus to become free, then start the oldest queued
    /// transaction. Returns once the transfer has been handed to the hardware
    /// (or the entry was dropped as malformed).
    pub async fn process_next(&mut self) {
        self.wait_for_permit().await;

        let Some(transaction) = self.queue.dequeue().await else {
            self.port.release_permit();
            return;
        };

        let completion = match transaction.validate() {
            Ok(completion) => completion,
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Dropping malformed transaction for {=u8:#x}",
                    transaction.address
                );
                if let Some(completion) = transaction.completion {
                    completion.complete(Err(e));
                }
                self.port.release_permit();
                return;
            }
        };

        let ticket = self.port.arm(completion, transaction.read_len);
        self.watchdog = self
            .config
            .transfer_timeout
            .map(|window| (ticket, Instant::now() + window));

        #[cfg(feature = "defmt")]
        defmt::trace!("Starting transfer to {=u8:#x}", transaction.address);
        self.hardware.start(
            ticket,
            transaction.address,
            &transaction.write,
            transaction.read_len,
        );
    }

    async fn wait_for_permit(&mut self) {
        loop {
            let port = self.port;
            let deadline = self.watchdog.map(|(_, at)| at);
            let watchdog = async move {
                match deadline {
                    Some(at) => Timer::at(at).await,
                    None => pending::<()>().await,
                }
            };

            match select(port.acquire_permit(), watchdog).await {
                Either::First(()) => {
                    self.watchdog = None;
                    return;
                }
                Either::Second(()) => self.on_watchdog(),
            }
        }
    }

    fn on_watchdog(&mut self) {
        let Some((ticket, _)) = self.watchdog.take() else {
            return;
        };
        #[cfg(feature = "defmt")]
        defmt::warn!("Bus transfer timed out, forcing stop");
        self.hardware.abort();
        if !self.port.expire(ticket) {
            #[cfg(feature = "defmt")]
            defmt::debug!("Transfer completed while the watchdog fired");
        }
    }
}
