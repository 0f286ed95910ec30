//! BPF map definitions shared with the userspace loader
//!
//! All three maps are plain arrays: every slot exists from load time on,
//! so lookups only fail for out-of-range indices.

use aya_ebpf::{macros::map, maps::Array};
use stamp_common::{constants::*, types::TelemetryRecord};

/// Telemetry ring written by the collector
///
/// Index: slot from the ring allocator
/// Value: one record per accepted reply
#[map]
pub static STAMP_DATA: Array<TelemetryRecord> = Array::with_max_entries(STAMP_MAP_SIZE, 0);

/// Allocation counter
///
/// Single u64 at COUNTER_KEY holding the number of slots handed out.
/// Reset by userspace before each run.
#[map]
pub static COUNTER: Array<u64> = Array::with_max_entries(COUNTER_MAP_SIZE, 0);

/// Statistics counter map
///
/// Key: stat_id (see STAT_* constants)
/// Value: u64 counter
#[map]
pub static STATS: Array<u64> = Array::with_max_entries(MAX_STATS, 0);
