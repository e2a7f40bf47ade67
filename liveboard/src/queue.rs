//! Mutex-guarded event queue with a swap-drain consumer side.
//!
//! Producers append through [`Publisher`] handles; each handle carries a
//! revocation flag stored *inside the queue's own mutex*, so "stop this
//! producer" and "append an event" are serialized by the same lock. A late
//! message from a reader that was stopped mid-block can therefore never
//! reanimate a torn-down session: the publish observes the flag and drops.
//!
//! The consumer drains by swapping the buffer for an empty one under the
//! lock and iterating outside it; producers never wait on consumer
//! processing time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

pub struct EventQueue<T> {
    shared: Arc<Mutex<QueueState<T>>>,
}

struct QueueState<T> {
    buffer: Vec<T>,
    revoked: Vec<bool>,
}

impl<T> EventQueue<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(QueueState {
                buffer: Vec::new(),
                revoked: Vec::new(),
            })),
        }
    }

    /// Create a new producer handle with its own stop flag.
    pub fn publisher(&self) -> Publisher<T> {
        let mut state = lock(&self.shared);
        state.revoked.push(false);
        Publisher {
            shared: Arc::clone(&self.shared),
            slot: state.revoked.len() - 1,
        }
    }

    /// Take everything buffered so far, atomically.
    pub fn drain(&self) -> Vec<T> {
        std::mem::take(&mut lock(&self.shared).buffer)
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.shared).buffer.is_empty()
    }
}

impl<T> Default for EventQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventQueue<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

/// Producer handle. Cheap to clone; all clones share one stop flag.
pub struct Publisher<T> {
    shared: Arc<Mutex<QueueState<T>>>,
    slot: usize,
}

impl<T> Publisher<T> {
    /// Append an event unless this publisher has been revoked.
    /// Returns `false` (dropping the event) once revoked.
    pub fn publish(&self, event: T) -> bool {
        let mut state = lock(&self.shared);
        if state.revoked[self.slot] {
            return false;
        }
        state.buffer.push(event);
        true
    }

    /// Handle that can revoke this publisher from another thread.
    pub fn stop_handle(&self) -> StopHandle<T> {
        StopHandle {
            shared: Arc::clone(&self.shared),
            slot: self.slot,
        }
    }
}

impl<T> Clone for Publisher<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            slot: self.slot,
        }
    }
}

/// Revokes one publisher. Taken under the queue lock, so a publish racing
/// with `stop()` either lands before the flag flips or is dropped.
pub struct StopHandle<T> {
    shared: Arc<Mutex<QueueState<T>>>,
    slot: usize,
}

impl<T> StopHandle<T> {
    pub fn stop(&self) {
        lock(&self.shared).revoked[self.slot] = true;
    }
}

fn lock<T>(shared: &Arc<Mutex<QueueState<T>>>) -> MutexGuard<'_, QueueState<T>> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}
