//! One-shot debounce timer running on a dedicated worker thread.
//!
//! At most one deadline is armed at a time. Arming replaces the previous
//! deadline; the worker hands the captured generation to the fire callback so
//! the callback can detect that it was superseded while waiting for a lock.

use crate::error::Result;
use parking_lot::{Condvar, Mutex, MutexGuard};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

#[derive(Default)]
struct SlotState {
    armed: Option<(u64, Instant)>,
    shutdown: bool,
}

struct Shared {
    slot: Mutex<SlotState>,
    wake: Condvar,
}

pub struct Scheduler {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl Scheduler {
    /// Spawn the timer worker. `on_fire` runs on the worker thread with no
    /// scheduler lock held.
    pub fn new<F>(on_fire: F) -> Result<Self>
    where
        F: Fn(u64) + Send + 'static,
    {
        let shared = Arc::new(Shared {
            slot: Mutex::new(SlotState::default()),
            wake: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("texpand-scheduler".to_string())
            .spawn(move || run_worker(&worker_shared, on_fire))?;

        Ok(Self {
            shared,
            worker: Some(worker),
        })
    }

    /// Arm the timer, replacing any pending deadline
    pub fn arm(&self, generation: u64, delay: Duration) {
        let mut slot = self.shared.slot.lock();
        slot.armed = Some((generation, Instant::now() + delay));
        self.shared.wake.notify_one();
    }

    pub fn cancel(&self) {
        let mut slot = self.shared.slot.lock();
        if slot.armed.take().is_some() {
            self.shared.wake.notify_one();
        }
    }

    pub fn is_armed(&self) -> bool {
        self.shared.slot.lock().armed.is_some()
    }

    /// Stop the worker; a pending deadline is discarded
    pub fn shutdown(&mut self) {
        {
            let mut slot = self.shared.slot.lock();
            slot.shutdown = true;
            slot.armed = None;
            self.shared.wake.notify_one();
        }

        if let Some(worker) = self.worker.take() {
            if worker.thread().id() == thread::current().id() {
                // Dropped from inside the fire callback; the loop exits on its own
                return;
            }
            if worker.join().is_err() {
                error!("Scheduler worker panicked during shutdown");
            }
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run_worker<F: Fn(u64)>(shared: &Shared, on_fire: F) {
    let mut slot = shared.slot.lock();

    loop {
        if slot.shutdown {
            debug!("Scheduler worker exiting");
            return;
        }

        match slot.armed {
            None => shared.wake.wait(&mut slot),
            Some((generation, deadline)) => {
                if Instant::now() >= deadline {
                    slot.armed = None;
                    MutexGuard::unlocked(&mut slot, || fire(&on_fire, generation));
                } else {
                    let _ = shared.wake.wait_until(&mut slot, deadline);
                }
            }
        }
    }
}

fn fire<F: Fn(u64)>(on_fire: &F, generation: u64) {
    if panic::catch_unwind(AssertUnwindSafe(|| on_fire(generation))).is_err() {
        error!(generation, "Expansion callback panicked");
    }
}

#[cfg(test)]
#[path = "scheduler_test.rs"]
mod tests;
