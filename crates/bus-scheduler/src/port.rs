use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::semaphore::{GreedySemaphore, Semaphore};
use heapless::Vec;

use crate::completion::{CompletionSignal, TransferResult};
use crate::error::BusError;

/// Identifies one transfer handed to the hardware.
///
/// A completion is only accepted for the ticket of the transfer currently in
/// flight, so a report that arrives after its transfer was timed out is
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Ticket(u32);

struct InFlight<'a, M: RawMutex> {
    ticket: Ticket,
    completion: &'a CompletionSignal<M>,
    read_len: usize,
}

struct Slot<'a, M: RawMutex> {
    generation: u32,
    current: Option<InFlight<'a, M>>,
}

/// Meeting point between the driver task and the hardware completion handler.
///
/// Holds the single in-flight slot and the processing permit. Both
/// [`complete`](Self::complete) and the watchdog path take the slot under a
/// short blocking lock; whichever gets there first finishes the transaction
/// and hands the permit back, the other becomes a no-op.
pub struct TransferPort<'a, M: RawMutex> {
    slot: Mutex<M, RefCell<Slot<'a, M>>>,
    permit: GreedySemaphore<M>,
}

impl<'a, M: RawMutex> TransferPort<'a, M> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(RefCell::new(Slot { generation: 0, current: None })),
            permit: GreedySemaphore::new(0),
        }
    }

    /// Report the outcome of the transfer identified by `ticket`.
    ///
    /// Called by the hardware driver, possibly from interrupt context. Never
    /// blocks. `read` holds the bytes received; extra bytes beyond the
    /// requested length are ignored. Returns `false` if the ticket is stale
    /// and nothing was done.
    pub fn complete(&self, ticket: Ticket, ok: bool, read: &[u8]) -> bool {
        let Some(in_flight) = self.take(ticket, false) else {
            return false;
        };

        let result = if ok {
            let len = in_flight.read_len.min(read.len());
            Vec::from_slice(&read[..len])
                .map_err(|_| BusError::TransferFailed)
        } else {
            Err(BusError::TransferFailed)
        };
        self.finish(in_flight, result);
        true
    }

    /// Returns `true` while a transfer is on the bus.
    pub fn is_busy(&self) -> bool {
        self.slot.lock(|slot| slot.borrow().current.is_some())
    }

    /// Record a new in-flight transfer and return its ticket.
    pub(crate) fn arm(
        &self,
        completion: &'a CompletionSignal<M>,
        read_len: usize,
    ) -> Ticket {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            debug_assert!(slot.current.is_none());
            slot.generation = slot.generation.wrapping_add(1);
            let ticket = Ticket(slot.generation);
            slot.current = Some(InFlight { ticket, completion, read_len });
            ticket
        })
    }

    /// Watchdog path: fail the transfer identified by `ticket`.
    ///
    /// The generation moves on before the caller is signalled, so a genuine
    /// completion for the same ticket arriving later is ignored.
    pub(crate) fn expire(&self, ticket: Ticket) -> bool {
        let Some(in_flight) = self.take(ticket, true) else {
            return false;
        };
        self.finish(in_flight, Err(BusError::Timeout));
        true
    }

    /// Wait for the processing permit.
    pub(crate) async fn acquire_permit(&self) {
        match self.permit.acquire(1).await {
            Ok(permit) => {
                permit.disarm();
            }
            Err(never) => match never {},
        }
    }

    pub(crate) fn release_permit(&self) {
        self.permit.release(1);
    }

    fn take(&self, ticket: Ticket, bump: bool) -> Option<InFlight<'a, M>> {
        self.slot.lock(|slot| {
            let mut slot = slot.borrow_mut();
            let matches = slot
                .current
                .as_ref()
                .is_some_and(|current| current.ticket == ticket);
            if !matches {
                return None;
            }
            if bump {
                slot.generation = slot.generation.wrapping_add(1);
            }
            slot.current.take()
        })
    }

    fn finish(&self, in_flight: InFlight<'a, M>, result: TransferResult) {
        in_flight.completion.complete(result);
        self.release_permit();
    }
}

impl<M: RawMutex> Default for TransferPort<'_, M> {
    fn default() -> Self {
        Self::new()
    }
}
