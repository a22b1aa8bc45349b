// Request-keyed cache with superseding fetch tickets
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// A pending fetch older than this is treated as abandoned (its future was dropped).
const ABANDONED_AFTER: Duration = Duration::from_secs(300);

/// Proof that a fetch for `key` was started; only the newest ticket may fill the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    key: String,
    generation: u64,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    pending_since: Option<Instant>,
    value: Option<(Instant, T)>,
}

impl<T> Slot<T> {
    fn is_live(&self, ttl: Duration) -> bool {
        let pending = self
            .pending_since
            .is_some_and(|since| since.elapsed() < ABANDONED_AFTER);
        let fresh = self
            .value
            .as_ref()
            .is_some_and(|(stored_at, _)| stored_at.elapsed() < ttl);
        pending || fresh
    }
}

#[derive(Debug)]
pub struct RequestCache<T> {
    ttl: Duration,
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T: Clone> RequestCache<T> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// A value stored less than `ttl` ago, if any.
    pub fn get(&self, key: &str) -> Option<T> {
        let slots = self.lock();
        let (stored_at, value) = slots.get(key)?.value.as_ref()?;
        if stored_at.elapsed() < self.ttl {
            Some(value.clone())
        } else {
            None
        }
    }

    /// Start a fetch for `key`, superseding any fetch already in flight.
    ///
    /// Slots holding only expired values and no pending fetch are dropped here,
    /// so the map stays bounded by the keys in active use.
    pub fn begin(&self, key: &str) -> FetchTicket {
        let ttl = self.ttl;
        let mut slots = self.lock();
        slots.retain(|k, slot| k == key || slot.is_live(ttl));

        let slot = slots.entry(key.to_string()).or_insert(Slot {
            generation: 0,
            pending_since: None,
            value: None,
        });
        slot.generation += 1;
        slot.pending_since = Some(Instant::now());
        FetchTicket {
            key: key.to_string(),
            generation: slot.generation,
        }
    }

    /// Store the result of a fetch. Returns false when a newer fetch superseded it.
    pub fn complete(&self, ticket: FetchTicket, value: T) -> bool {
        let mut slots = self.lock();
        match slots.get_mut(&ticket.key) {
            Some(slot) if slot.generation == ticket.generation => {
                slot.pending_since = None;
                slot.value = Some((Instant::now(), value));
                true
            }
            _ => false,
        }
    }

    /// Record a failed fetch. The key's cached value is dropped only when the
    /// ticket is still current; a newer fetch in flight keeps its slot.
    pub fn fail(&self, ticket: FetchTicket) -> bool {
        let mut slots = self.lock();
        let current = slots
            .get(&ticket.key)
            .is_some_and(|slot| slot.generation == ticket.generation);
        if current {
            slots.remove(&ticket.key);
        }
        current
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
        // A poisoned map only ever holds fully written slots
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
