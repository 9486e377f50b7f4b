//! Event + PooledEventBuffer - Event camera primitives
//!
//! Events arrive in timestamp-sorted batches from the driver callback.
//! Synced outputs carry their events in a pooled buffer that returns its
//! storage to the owning pool on drop.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// A single DVS event.
///
/// `#[repr(C)]` + `Pod` so event buffers can be dumped to disk as raw
/// bytes without per-event serialization. 16 bytes per event.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Event {
    /// Hardware timestamp (microseconds)
    pub timestamp_us: u64,

    /// Pixel column
    pub x: u16,

    /// Pixel row
    pub y: u16,

    /// Contrast polarity (+1 / -1, driver convention)
    pub polarity: i16,

    /// Padding, keeps the struct at 16 bytes
    pub reserved: u16,
}

/// Reclaims event storage when a `PooledEventBuffer` is dropped.
///
/// Implemented by the event buffer pool. Must never block: delivery
/// threads drop buffers on their hot path.
pub trait BufferReclaim: Send + Sync {
    /// Take back the storage of a dropped buffer
    fn reclaim(&self, storage: Vec<Event>);
}

/// Owned event buffer with return-on-drop semantics.
///
/// Exactly one live consumer holds the handle at a time; when it goes out
/// of scope the underlying `Vec<Event>` goes back to the pool it came
/// from. Buffers created with [`PooledEventBuffer::detached`] simply free
/// their storage.
pub struct PooledEventBuffer {
    events: Option<Vec<Event>>,
    reclaim: Option<Arc<dyn BufferReclaim>>,
}

impl PooledEventBuffer {
    /// Wrap pool-owned storage
    pub fn new(events: Vec<Event>, reclaim: Arc<dyn BufferReclaim>) -> Self {
        Self {
            events: Some(events),
            reclaim: Some(reclaim),
        }
    }

    /// Standalone buffer with no backing pool (tests, one-off use)
    pub fn detached(events: Vec<Event>) -> Self {
        Self {
            events: Some(events),
            reclaim: None,
        }
    }

    /// Events in this buffer, timestamp-sorted
    #[inline]
    pub fn events(&self) -> &[Event] {
        self.events.as_deref().unwrap_or(&[])
    }

    /// Mutable access for the synchronizer's window drain
    #[inline]
    pub fn events_mut(&mut self) -> &mut Vec<Event> {
        self.events.get_or_insert_with(Vec::new)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.events().len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.events().is_empty()
    }
}

impl Deref for PooledEventBuffer {
    type Target = [Event];

    #[inline]
    fn deref(&self) -> &Self::Target {
        self.events()
    }
}

impl Drop for PooledEventBuffer {
    fn drop(&mut self) {
        if let (Some(storage), Some(reclaim)) = (self.events.take(), self.reclaim.as_ref()) {
            reclaim.reclaim(storage);
        }
    }
}

impl fmt::Debug for PooledEventBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledEventBuffer")
            .field("len", &self.len())
            .field("pooled", &self.reclaim.is_some())
            .finish()
    }
}
