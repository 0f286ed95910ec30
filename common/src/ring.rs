//! Ring slot allocation for the telemetry store
//!
//! The shared counter holds the number of tickets handed out so far. Each
//! allocation is one atomic fetch-and-add, and the slot is the ticket modulo
//! the ring capacity, so concurrent collectors on different CPUs never get
//! the same slot within one lap and no increment is lost. The counter is
//! 64 bits wide so it cannot wrap during a run.

use core::num::NonZeroU32;
use core::sync::atomic::{AtomicU64, Ordering};

/// Source of ring slots for the collector
///
/// Consulted only after a frame has been validated, so an implementation
/// that has to look up its counter cell does so for accepted replies only.
pub trait SlotAllocator {
    /// Claim the next slot, or `None` if the counter cannot be reached
    fn allocate(&self) -> Option<u32>;
}

/// Wrapping slot allocator over a shared counter cell
#[derive(Clone, Copy, Debug)]
pub struct RingIndexAllocator<'a> {
    counter: &'a AtomicU64,
    capacity: NonZeroU32,
}

impl<'a> RingIndexAllocator<'a> {
    pub fn new(counter: &'a AtomicU64, capacity: NonZeroU32) -> Self {
        Self { counter, capacity }
    }

    /// Claim the next slot
    #[inline(always)]
    pub fn next_slot(&self) -> u32 {
        let ticket = self.counter.fetch_add(1, Ordering::Relaxed);
        slot_for_ticket(ticket, self.capacity)
    }
}

impl SlotAllocator for RingIndexAllocator<'_> {
    #[inline(always)]
    fn allocate(&self) -> Option<u32> {
        Some(self.next_slot())
    }
}

/// Ring slot for a ticket
#[inline(always)]
pub fn slot_for_ticket(ticket: u64, capacity: NonZeroU32) -> u32 {
    // Remainder is below capacity, which fits in u32
    (ticket % u64::from(capacity.get())) as u32
}
