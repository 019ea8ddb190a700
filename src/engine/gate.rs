//! At-most-one in-flight operation per key

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;

/// Set of keys with an operation currently running.
///
/// [`try_enter`](Self::try_enter) turns a second caller away;
/// [`enter`](Self::enter) waits its turn. Either way the slot is released
/// when the [`GateGuard`] drops, on every exit path.
#[derive(Clone, Default)]
pub struct KeyedGate {
    in_flight: Arc<Mutex<HashSet<String>>>,
    released: Arc<Notify>,
}

impl KeyedGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `key`, or `None` if another operation holds it
    pub fn try_enter(&self, key: impl Into<String>) -> Option<GateGuard> {
        let key = key.into();
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if !in_flight.insert(key.clone()) {
            return None;
        }
        Some(GateGuard {
            in_flight: Arc::clone(&self.in_flight),
            released: Arc::clone(&self.released),
            key,
        })
    }

    /// Claim `key`, waiting until the current holder releases it
    pub async fn enter(&self, key: impl Into<String>) -> GateGuard {
        let key = key.into();
        loop {
            let released = self.released.notified();
            tokio::pin!(released);
            // Register before checking so a release in between is not missed
            released.as_mut().enable();
            if let Some(guard) = self.try_enter(key.clone()) {
                return guard;
            }
            released.await;
        }
    }

    pub fn is_held(&self, key: &str) -> bool {
        self.in_flight
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(key)
    }
}

/// Releases the gate slot on drop
pub struct GateGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    released: Arc<Notify>,
    key: String,
}

impl Drop for GateGuard {
    fn drop(&mut self) {
        let mut in_flight = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        in_flight.remove(&self.key);
        drop(in_flight);
        self.released.notify_waiters();
    }
}
