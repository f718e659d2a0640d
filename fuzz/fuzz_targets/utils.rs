use std::marker::PhantomData;
use std::panic::Location;
use std::sync::mpsc;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Input cap for the harness. Generation cost is linear in the stream
/// length, so anything past this only slows exploration down.
pub const MAX_INPUT_SIZE: usize = 64 * 1024;

/// Wall-clock timeout per fuzz input.
pub const TIMEOUT: Duration = Duration::from_secs(1);

#[track_caller]
fn lock<'a, T>(mutex: &'a Mutex<T>, context: &'static str) -> MutexGuard<'a, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(err) => {
            let loc = Location::caller();
            eprintln!(
                "mutex poisoned; continuing with recovered guard: context={context} file={} line={} column={} error={err}",
                loc.file(),
                loc.line(),
                loc.column(),
            );
            err.into_inner()
        }
    }
}

/// Runs each input on a dedicated worker thread so a hung generation
/// turns into a reported timeout instead of a silent stall.
pub struct FuzzRunner<State> {
    name: &'static str,
    input_tx: mpsc::SyncSender<Vec<u8>>,
    output_rx: Mutex<mpsc::Receiver<()>>,
    _state: PhantomData<fn() -> State>,
}

impl<State: 'static> FuzzRunner<State> {
    pub fn new(name: &'static str, init: fn() -> State, run_one: fn(&mut State, &[u8])) -> Self {
        // Single-slot channels in both directions: the fuzz thread can
        // always time out instead of blocking on a wedged worker.
        let (input_tx, input_rx) = mpsc::sync_channel::<Vec<u8>>(1);
        let (output_tx, output_rx) = mpsc::sync_channel::<()>(1);

        std::thread::spawn(move || {
            let mut state = init();
            for input in input_rx {
                run_one(&mut state, &input);
                let _ = output_tx.send(());
            }
        });

        Self {
            name,
            input_tx,
            output_rx: Mutex::new(output_rx),
            _state: PhantomData,
        }
    }

    pub fn run(&self, data: &[u8]) {
        let cap = data.len().min(MAX_INPUT_SIZE);
        let deadline = Instant::now() + TIMEOUT;

        let mut payload = data[..cap].to_vec();
        loop {
            match self.input_tx.try_send(payload) {
                Ok(()) => break,
                Err(mpsc::TrySendError::Full(value)) => {
                    payload = value;
                    if Instant::now() >= deadline {
                        panic!("{} fuzz target timed out", self.name);
                    }
                    std::thread::yield_now();
                }
                Err(mpsc::TrySendError::Disconnected(_value)) => {
                    panic!("{} worker thread exited", self.name);
                }
            }
        }

        let remaining = deadline
            .checked_duration_since(Instant::now())
            .unwrap_or(Duration::ZERO);

        // Take the receiver in a narrow scope so a failing assertion in
        // the caller never poisons it.
        let recv = {
            let rx = lock(&self.output_rx, "FuzzRunner.output_rx");
            rx.recv_timeout(remaining)
        };

        match recv {
            Ok(()) => {}
            Err(mpsc::RecvTimeoutError::Timeout) => panic!("{} fuzz target timed out", self.name),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                panic!("{} worker thread panicked", self.name)
            }
        }
    }
}
