use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::Mutex;

use bus_scheduler::{
    BusDriver, BusError, BusHardwareDriver, CompletionSignal, SchedulerConfig,
    Ticket, Transaction, TransactionQueue, TransferPort,
};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_time::{Duration, MockDriver};
use futures_executor::LocalPool;
use futures_task::LocalSpawn;

type Port = TransferPort<'static, CriticalSectionRawMutex>;
type Queue = TransactionQueue<'static, CriticalSectionRawMutex, 4>;
type Done = CompletionSignal<CriticalSectionRawMutex>;

const TIMEOUT: Duration = Duration::from_millis(50);

// The mock time driver is global; tests that advance it take turns.
static TIME: Mutex<()> = Mutex::new(());

fn leak<T>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

/// Bus that only answers when `respond` is set; otherwise the transfer
/// stays on the bus until the watchdog aborts it.
struct WedgedBus {
    port: &'static Port,
    respond: Rc<Cell<bool>>,
    pending: Rc<Cell<Option<Ticket>>>,
    aborts: Rc<Cell<usize>>,
    started: Rc<RefCell<Vec<u8>>>,
}

impl BusHardwareDriver for WedgedBus {
    fn start(&mut self, ticket: Ticket, address: u8, _write: &[u8], read_len: usize) {
        self.started.borrow_mut().push(address);
        if self.respond.get() {
            let response = vec![0x5A; read_len];
            self.port.complete(ticket, true, &response);
        } else {
            self.pending.set(Some(ticket));
        }
    }

    fn abort(&mut self) {
        self.aborts.set(self.aborts.get() + 1);
    }
}

struct Rig {
    pool: LocalPool,
    queue: &'static Queue,
    port: &'static Port,
    respond: Rc<Cell<bool>>,
    pending: Rc<Cell<Option<Ticket>>>,
    aborts: Rc<Cell<usize>>,
    started: Rc<RefCell<Vec<u8>>>,
}

fn rig(respond: bool) -> Rig {
    let pool = LocalPool::new();
    let queue: &'static Queue = leak(TransactionQueue::new());
    let port: &'static Port = leak(TransferPort::new());
    let respond = Rc::new(Cell::new(respond));
    let pending = Rc::new(Cell::new(None));
    let aborts = Rc::new(Cell::new(0));
    let started = Rc::new(RefCell::new(Vec::new()));

    let hardware = WedgedBus {
        port,
        respond: respond.clone(),
        pending: pending.clone(),
        aborts: aborts.clone(),
        started: started.clone(),
    };
    let config = SchedulerConfig { transfer_timeout: Some(TIMEOUT) };
    let mut driver = BusDriver::new(queue, port, hardware, config);

    pool.spawner()
        .spawn_local_obj(
            Box::new(async move {
                driver.run().await;
            })
            .into(),
        )
        .unwrap();

    Rig { pool, queue, port, respond, pending, aborts, started }
}

#[test]
fn watchdog_fails_wedged_transfer_exactly_once() {
    let _time = TIME.lock().unwrap_or_else(|e| e.into_inner());
    let time = MockDriver::get();
    let mut rig = rig(false);
    let done: &'static Done = leak(CompletionSignal::new());

    let transaction = Transaction::read(0x18, 2, done).unwrap();
    rig.pool.run_until(rig.queue.enqueue(transaction, None)).unwrap();
    rig.pool.run_until_stalled();

    assert_eq!(rig.started.borrow().as_slice(), &[0x18]);
    assert!(rig.port.is_busy());
    let stale = rig.pending.take().unwrap();

    time.advance(Duration::from_ticks(TIMEOUT.as_ticks() - 1));
    rig.pool.run_until_stalled();
    assert!(!done.is_complete());
    assert_eq!(rig.aborts.get(), 0);

    time.advance(Duration::from_ticks(1));
    rig.pool.run_until_stalled();
    assert_eq!(rig.aborts.get(), 1);
    assert!(!rig.port.is_busy());
    assert_eq!(done.try_take(), Some(Err(BusError::Timeout)));

    // The hardware finally answers for the abandoned transfer.
    assert!(!rig.port.complete(stale, true, &[0x01, 0x02]));
    rig.pool.run_until_stalled();
    assert_eq!(done.try_take(), None);

    // The driver is still alive and serves the next transaction.
    rig.respond.set(true);
    let next: &'static Done = leak(CompletionSignal::new());
    let transaction = Transaction::read(0x19, 2, next).unwrap();
    rig.pool.run_until(rig.queue.enqueue(transaction, None)).unwrap();
    rig.pool.run_until_stalled();

    assert_eq!(next.try_take().unwrap().unwrap().as_slice(), &[0x5A, 0x5A]);
    assert_eq!(rig.aborts.get(), 1);
}

#[test]
fn completed_transfer_disarms_watchdog() {
    let _time = TIME.lock().unwrap_or_else(|e| e.into_inner());
    let time = MockDriver::get();
    let mut rig = rig(true);
    let done: &'static Done = leak(CompletionSignal::new());

    let transaction = Transaction::write(0x40, &[0x00], done).unwrap();
    rig.pool.run_until(rig.queue.enqueue(transaction, None)).unwrap();
    rig.pool.run_until_stalled();
    assert_eq!(done.try_take(), Some(Ok(Default::default())));

    time.advance(TIMEOUT * 4);
    rig.pool.run_until_stalled();

    assert_eq!(rig.aborts.get(), 0);
    assert_eq!(done.try_take(), None);
    assert!(!rig.port.is_busy());
}

#[test]
fn late_completion_after_timeout_does_not_touch_next_transfer() {
    let _time = TIME.lock().unwrap_or_else(|e| e.into_inner());
    let time = MockDriver::get();
    let mut rig = rig(false);
    let first: &'static Done = leak(CompletionSignal::new());
    let second: &'static Done = leak(CompletionSignal::new());

    let transaction = Transaction::read(0x18, 1, first).unwrap();
    rig.pool.run_until(rig.queue.enqueue(transaction, None)).unwrap();
    let transaction = Transaction::read(0x19, 1, second).unwrap();
    rig.pool.run_until(rig.queue.enqueue(transaction, None)).unwrap();
    rig.pool.run_until_stalled();
    let stale = rig.pending.take().unwrap();

    time.advance(TIMEOUT);
    rig.pool.run_until_stalled();

    // The first transfer timed out and the second one is now on the bus.
    assert_eq!(first.try_take(), Some(Err(BusError::Timeout)));
    assert_eq!(rig.started.borrow().as_slice(), &[0x18, 0x19]);
    let current = rig.pending.take().unwrap();
    assert_ne!(stale, current);

    assert!(!rig.port.complete(stale, true, &[0xEE]));
    assert!(!second.is_complete());
    assert!(rig.port.is_busy());

    assert!(rig.port.complete(current, true, &[0x77]));
    rig.pool.run_until_stalled();
    assert_eq!(second.try_take().unwrap().unwrap().as_slice(), &[0x77]);
}
