use crate::port::Ticket;

/// The physical bus controller, as seen by the driver task.
///
/// Implementors wrap the chip's bus peripheral in callback mode. At most one
/// transfer is outstanding at any time.
pub trait BusHardwareDriver {
    /// Begin a transfer and return without waiting for it.
    ///
    /// The outcome must later be reported with
    /// [`TransferPort::complete`](crate::TransferPort::complete), passing the
    /// same `ticket`. Reporting from inside this call is allowed.
    fn start(&mut self, ticket: Ticket, address: u8, write: &[u8], read_len: usize);

    /// Force a stop condition on the bus, abandoning the current transfer.
    fn abort(&mut self);
}

impl<T: BusHardwareDriver + ?Sized> BusHardwareDriver for &mut T {
    fn start(&mut self, ticket: Ticket, address: u8, write: &[u8], read_len: usize) {
        T::start(self, ticket, address, write, read_len)
    }

    fn abort(&mut self) {
        T::abort(self)
    }
}
