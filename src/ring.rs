use std::sync::atomic::Ordering::{Acquire, Relaxed, Release};
use std::sync::atomic::{AtomicU64, AtomicUsize};

use parking_lot::Mutex;

/// A fixed-capacity FIFO of integers that evicts its oldest value when full.
///
/// [RingBuffer::push] and [RingBuffer::drain] can be called concurrently from different tasks or
/// threads; their critical sections are serialized by an internal mutex. Draining an empty buffer
/// never touches the mutex.
///
/// # Examples
///
/// ```
/// use ring_pipes::RingBuffer;
///
/// let buffer = RingBuffer::new(3);
/// for value in 1..=5 {
///     buffer.push(value);
/// }
///
/// // 1 and 2 were evicted to make room for 4 and 5
/// assert_eq!(buffer.drain(), Some(vec![3, 4, 5]));
/// assert_eq!(buffer.drain(), None);
/// assert_eq!(buffer.evicted(), 2);
/// ```
#[derive(Debug)]
pub struct RingBuffer {
    slots: Mutex<Slots>,
    /// Number of occupied slots, only written while `slots` is locked.
    len: AtomicUsize,
    evicted: AtomicU64,
    capacity: usize,
}

#[derive(Debug)]
struct Slots {
    values: Box<[i32]>,
    /// Index of the oldest value.
    head: usize,
}

impl RingBuffer {
    /// Create an empty buffer holding at most `capacity` values.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer capacity must be non-zero");
        Self {
            slots: Mutex::new(Slots {
                values: vec![0; capacity].into_boxed_slice(),
                head: 0,
            }),
            len: AtomicUsize::new(0),
            evicted: AtomicU64::new(0),
            capacity,
        }
    }

    /// Append a value as the newest element, evicting the oldest one if the buffer is full.
    pub fn push(&self, value: i32) {
        let mut slots = self.slots.lock();
        let len = self.len.load(Relaxed);

        if len == self.capacity {
            // The slot holding the oldest value becomes the newest.
            let head = slots.head;
            slots.values[head] = value;
            slots.head = (head + 1) % self.capacity;
            self.evicted.fetch_add(1, Relaxed);
        } else {
            let tail = (slots.head + len) % self.capacity;
            slots.values[tail] = value;
            self.len.store(len + 1, Release);
        }
    }

    /// Take every buffered value, oldest first, leaving the buffer empty.
    ///
    /// Returns [None] if there is nothing buffered.
    pub fn drain(&self) -> Option<Vec<i32>> {
        if self.len.load(Acquire) == 0 {
            return None;
        }

        let mut slots = self.slots.lock();
        // Another drain may have emptied the buffer between the check above and the lock.
        let len = self.len.load(Relaxed);
        if len == 0 {
            return None;
        }

        let drained = (0..len)
            .map(|i| slots.values[(slots.head + i) % self.capacity])
            .collect();

        slots.head = 0;
        self.len.store(0, Release);
        Some(drained)
    }

    /// Number of values currently buffered.
    pub fn len(&self) -> usize {
        self.len.load(Acquire)
    }

    /// Check if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of values held before eviction starts.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total number of values evicted by pushes into a full buffer.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Relaxed)
    }
}
