//! Observable state cell and one-shot initialization gate.
//!
//! Both stateful services are built from these two pieces: an
//! [`Observable`] holds the component's whole state as one unit and
//! broadcasts snapshots to readers, and an [`InitGate`] lets any number
//! of callers await a one-time event that only the first caller starts.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;

/// Single-writer, multi-reader state cell.
pub struct Observable<T> {
    tx: watch::Sender<T>,
}

impl<T: Clone> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    /// Snapshot of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Read a projection without cloning the whole value.
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.tx.borrow())
    }

    /// Mutate in place and notify readers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.tx.send_modify(f);
    }

    pub fn set(&self, value: T) {
        self.tx.send_replace(value);
    }

    /// Receiver that observes every subsequent change.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }
}

impl<T: Clone + Default> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

/// Guard flag plus a shared "ready" signal.
///
/// `begin` returns true exactly once; `open` releases every current and
/// future waiter; `wait` returns immediately once open.
pub struct InitGate {
    started: AtomicBool,
    ready: watch::Sender<bool>,
}

impl InitGate {
    pub fn new() -> Self {
        let (ready, _rx) = watch::channel(false);
        Self {
            started: AtomicBool::new(false),
            ready,
        }
    }

    /// Claim the initialization work. Only the first caller gets `true`.
    pub fn begin(&self) -> bool {
        !self.started.swap(true, Ordering::AcqRel)
    }

    pub fn has_started(&self) -> bool {
        self.started.load(Ordering::Acquire)
    }

    /// Mark initialization complete. Later calls are no-ops.
    pub fn open(&self) {
        self.ready.send_if_modified(|ready| !std::mem::replace(ready, true));
    }

    pub fn is_open(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until [`InitGate::open`] has been called.
    pub async fn wait(&self) {
        let mut rx = self.ready.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|ready| *ready).await;
    }
}

impl Default for InitGate {
    fn default() -> Self {
        Self::new()
    }
}
