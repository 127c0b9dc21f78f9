//! Debounced persistence writes
//!
//! Every [`DebouncedWriter::schedule`] call (re)starts a quiet period; the
//! pending values are written once [`DebouncedWriter::poll`] observes the
//! deadline has passed. Nothing is flushed on drop, so at most one quiet
//! period of edits can be lost on shutdown.

use super::store::KeyValueStore;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Quiet period before pending writes are flushed
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(2);

/// Time source for the debouncer
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually advanced clock; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Batches store writes behind a quiet period
pub struct DebouncedWriter<S: KeyValueStore> {
    store: S,
    delay: Duration,
    clock: Box<dyn Clock>,
    pending: BTreeMap<String, String>,
    deadline: Option<Instant>,
}

impl<S: KeyValueStore> DebouncedWriter<S> {
    /// Create a writer on the wall clock
    pub fn new(store: S, delay: Duration) -> Self {
        Self::with_clock(store, delay, SystemClock)
    }

    pub fn with_clock(store: S, delay: Duration, clock: impl Clock + 'static) -> Self {
        Self {
            store,
            delay,
            clock: Box::new(clock),
            pending: BTreeMap::new(),
            deadline: None,
        }
    }

    /// Queue a write and restart the quiet period
    pub fn schedule(&mut self, key: &str, value: String) {
        self.pending.insert(key.to_string(), value);
        self.deadline = Some(self.clock.now() + self.delay);
        log::debug!("DebouncedWriter: scheduled {} ({} pending)", key, self.pending.len());
    }

    /// Drop any queued writes
    pub fn cancel(&mut self) {
        self.pending.clear();
        self.deadline = None;
    }

    /// Whether writes are waiting for the quiet period to end
    pub fn has_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Flush if the quiet period has elapsed; returns the number of keys written
    pub fn poll(&mut self) -> usize {
        match self.deadline {
            Some(deadline) if self.clock.now() >= deadline => self.flush(),
            _ => 0,
        }
    }

    /// Write every pending value now
    ///
    /// A failed write is logged and dropped; the in-memory model stays authoritative.
    pub fn flush(&mut self) -> usize {
        self.deadline = None;
        let mut written = 0;
        for (key, value) in std::mem::take(&mut self.pending) {
            match self.store.set(&key, &value) {
                Ok(()) => written += 1,
                Err(e) => log::warn!("DebouncedWriter: failed to persist {}: {}", key, e),
            }
        }
        if written > 0 {
            log::info!("DebouncedWriter: persisted {} key(s)", written);
        }
        written
    }

    /// Read a value, preferring a pending write over the stored one
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.pending.get(key) {
            return Some(value.clone());
        }
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("DebouncedWriter: failed to read {}: {}", key, e);
                None
            }
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}
