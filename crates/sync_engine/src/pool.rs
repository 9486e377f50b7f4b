//! Event buffer pool with return-on-drop handles.
//!
//! Steady-state synchronization reuses a fixed set of large event
//! vectors instead of allocating per frame. The pool never blocks: under
//! exhaustion it allocates a fresh buffer and grows.

use std::sync::{Arc, Mutex};

use contracts::{BufferReclaim, Event, PoolConfig, PooledEventBuffer};
use tracing::debug;

/// Free-list pool of `Vec<Event>` storage.
pub struct EventBufferPool {
    free: Mutex<Vec<Vec<Event>>>,
    capacity_hint: usize,
}

impl EventBufferPool {
    pub fn new(config: &PoolConfig) -> Arc<Self> {
        let free = (0..config.preallocated)
            .map(|_| Vec::with_capacity(config.capacity_hint))
            .collect();
        Arc::new(Self {
            free: Mutex::new(free),
            capacity_hint: config.capacity_hint.max(1),
        })
    }

    /// Take a buffer from the pool, allocating fresh when empty.
    pub fn acquire(self: &Arc<Self>) -> PooledEventBuffer {
        let storage = {
            let mut free = self.free.lock().unwrap();
            free.pop()
        };
        let storage = match storage {
            Some(v) => v,
            None => {
                debug!(capacity_hint = self.capacity_hint, "event pool exhausted, allocating");
                metrics::counter!("evrgb_sync_pool_fresh_allocations_total").increment(1);
                Vec::with_capacity(self.capacity_hint)
            }
        };
        PooledEventBuffer::new(storage, self.clone() as Arc<dyn BufferReclaim>)
    }

    /// Buffers currently available for reuse
    pub fn available(&self) -> usize {
        self.free.lock().unwrap().len()
    }
}

impl BufferReclaim for EventBufferPool {
    fn reclaim(&self, mut storage: Vec<Event>) {
        storage.clear();
        // a consumer may have shrunk the vec; restore the working capacity
        if storage.capacity() < self.capacity_hint {
            storage.reserve(self.capacity_hint - storage.len());
        }
        let mut free = self.free.lock().unwrap();
        free.push(storage);
        metrics::gauge!("evrgb_sync_pool_available").set(free.len() as f64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_pool(preallocated: usize) -> Arc<EventBufferPool> {
        EventBufferPool::new(&PoolConfig {
            preallocated,
            capacity_hint: 128,
        })
    }

    #[test]
    fn acquire_release_cycle_reuses_storage() {
        let pool = small_pool(1);
        assert_eq!(pool.available(), 1);

        let mut buf = pool.acquire();
        assert_eq!(pool.available(), 0);
        for i in 0..200u64 {
            buf.events_mut().push(Event {
                timestamp_us: i,
                ..Default::default()
            });
        }
        drop(buf);

        assert_eq!(pool.available(), 1);
        let reused = pool.acquire();
        assert!(reused.is_empty());
        // capacity from the previous high-water mark survives
        assert!(reused.events().is_empty());
    }

    #[test]
    fn exhausted_pool_grows_instead_of_blocking() {
        let pool = small_pool(1);

        let a = pool.acquire();
        let b = pool.acquire(); // fresh allocation
        drop(a);
        drop(b);

        assert_eq!(pool.available(), 2);
    }

    #[test]
    fn reclaim_restores_capacity_hint() {
        let pool = small_pool(0);
        let buf = pool.acquire();
        drop(buf);

        let free = pool.free.lock().unwrap();
        assert!(free[0].capacity() >= 128);
    }
}
