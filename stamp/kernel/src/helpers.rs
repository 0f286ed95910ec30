//! Helper functions for the XDP programs
//!
//! Map-backed implementations of the collector's injected state and the
//! statistics counters.

use core::sync::atomic::{AtomicU64, Ordering};

use aya_ebpf::helpers::bpf_ktime_get_ns;
use stamp_common::{
    collector::{MonotonicClock, TelemetryStore},
    constants::*,
    ring::{RingIndexAllocator, SlotAllocator},
    types::TelemetryRecord,
};

use crate::maps::{COUNTER, STAMP_DATA, STATS};

/// Get current timestamp in nanoseconds
#[inline(always)]
pub fn get_timestamp() -> u64 {
    unsafe { bpf_ktime_get_ns() }
}

/// View an array map slot as an atomic cell
///
/// # Safety
///
/// `ptr` must come from a successful map lookup. Map values are 8-byte
/// aligned and live as long as the program.
#[inline(always)]
unsafe fn atomic_cell(ptr: *mut u64) -> &'static AtomicU64 {
    AtomicU64::from_ptr(ptr)
}

/// Increment a statistics counter
///
/// Lock-free; safe against the same program running on other CPUs.
#[inline(always)]
pub fn increment_stat(stat_id: u32) {
    if let Some(ptr) = STATS.get_ptr_mut(stat_id) {
        unsafe { atomic_cell(ptr) }.fetch_add(1, Ordering::Relaxed);
    }
}

/// Shared allocation counter cell
#[inline(always)]
fn counter_cell() -> Option<&'static AtomicU64> {
    let ptr = COUNTER.get_ptr_mut(COUNTER_KEY)?;
    Some(unsafe { atomic_cell(ptr) })
}

/// `COUNTER` as the collector's slot allocator
///
/// The counter cell is looked up on each call, i.e. only for validated replies.
pub struct MapSlotAllocator;

impl SlotAllocator for MapSlotAllocator {
    #[inline(always)]
    fn allocate(&self) -> Option<u32> {
        match counter_cell() {
            Some(counter) => Some(RingIndexAllocator::new(counter, STAMP_RING_CAPACITY).next_slot()),
            None => {
                increment_stat(STAT_MAP_LOOKUP_FAILURES);
                None
            }
        }
    }
}

/// Kernel monotonic clock (`CLOCK_MONOTONIC` domain)
pub struct KtimeClock;

impl MonotonicClock for KtimeClock {
    #[inline(always)]
    fn now_ns(&self) -> u64 {
        get_timestamp()
    }
}

/// `STAMP_DATA` as the collector's record store
pub struct RingStore;

impl TelemetryStore for RingStore {
    #[inline(always)]
    fn store(&self, index: u32, record: TelemetryRecord) -> bool {
        match STAMP_DATA.get_ptr_mut(index) {
            Some(slot) => {
                // Slot is exclusive to this invocation until the ring wraps
                unsafe { slot.write(record) };
                true
            }
            None => {
                increment_stat(STAT_MAP_LOOKUP_FAILURES);
                false
            }
        }
    }
}
