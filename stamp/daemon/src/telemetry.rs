//! Telemetry ring drain
//!
//! Runs after the collector has been detached. Reads the allocation counter,
//! walks the ring oldest-first and reconciles every slot.

use anyhow::{bail, Context, Result};
use aya::maps::{Array, Map, MapData};
use log::{debug, info};
use stamp_common::constants::COUNTER_KEY;

use crate::{
    clock::ClockReconciler,
    types::{DrainStats, ExportRow, TelemetryRecord},
};

/// Read access to the telemetry ring and its counter
pub trait TelemetrySource {
    /// Number of slots in the ring
    fn capacity(&self) -> u32;

    /// Slots handed out since the counter was last reset
    fn allocated(&self) -> Result<u64>;

    /// Record stored in slot `index`
    fn record(&self, index: u32) -> Result<TelemetryRecord>;
}

/// Telemetry ring backed by the loaded BPF maps
pub struct MapTelemetrySource<'a> {
    ring: Array<&'a MapData, TelemetryRecord>,
    counter: Array<&'a MapData, u64>,
}

impl<'a> MapTelemetrySource<'a> {
    pub fn new(ring: &'a Map, counter: &'a Map) -> Result<Self> {
        Ok(Self {
            ring: Array::try_from(ring).context("STAMP_DATA is not an array map")?,
            counter: Array::try_from(counter).context("COUNTER is not an array map")?,
        })
    }
}

impl TelemetrySource for MapTelemetrySource<'_> {
    fn capacity(&self) -> u32 {
        self.ring.len()
    }

    fn allocated(&self) -> Result<u64> {
        self.counter
            .get(&COUNTER_KEY, 0)
            .context("Failed to read COUNTER map")
    }

    fn record(&self, index: u32) -> Result<TelemetryRecord> {
        self.ring
            .get(&index, 0)
            .with_context(|| format!("Failed to read STAMP_DATA slot {}", index))
    }
}

/// Rows recovered from one drain pass
#[derive(Debug, Default, Clone)]
pub struct DrainReport {
    pub rows: Vec<ExportRow>,
    pub stats: DrainStats,
}

/// Slot range to visit: (first slot, slot count, overwritten records)
fn drain_window(allocated: u64, capacity: u64) -> (u64, u64, u64) {
    if allocated <= capacity {
        (0, allocated, 0)
    } else {
        (allocated % capacity, capacity, allocated - capacity)
    }
}

/// Read every live slot oldest-first and reconcile it
///
/// Rejected records are counted and skipped. A map read failure aborts the
/// drain.
pub fn drain<S: TelemetrySource + ?Sized>(
    source: &S,
    reconciler: &ClockReconciler,
) -> Result<DrainReport> {
    let capacity = u64::from(source.capacity());
    if capacity == 0 {
        bail!("Telemetry ring has zero capacity");
    }

    let allocated = source.allocated()?;
    let (first, count, overwritten) = drain_window(allocated, capacity);

    info!("Draining {} telemetry records...", count);
    if overwritten > 0 {
        info!("  {} older records were overwritten by ring wraparound", overwritten);
    }

    let mut report = DrainReport {
        rows: Vec::with_capacity(count as usize),
        stats: DrainStats {
            allocated,
            overwritten,
            ..Default::default()
        },
    };

    for i in 0..count {
        // Remainder is below capacity, which came from a u32
        let index = ((first + i) % capacity) as u32;
        let record = source.record(index)?;
        report.stats.drained += 1;

        match reconciler.reconcile(&record) {
            Ok(row) => {
                report.rows.push(row);
                report.stats.exported += 1;
            }
            Err(rejected) => {
                debug!("Skipping slot {}: {}", index, rejected);
                report.stats.rejected += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Ntp64;

    /// In-memory ring
    struct VecSource {
        slots: Vec<TelemetryRecord>,
        allocated: u64,
    }

    impl TelemetrySource for VecSource {
        fn capacity(&self) -> u32 {
            self.slots.len() as u32
        }

        fn allocated(&self) -> Result<u64> {
            Ok(self.allocated)
        }

        fn record(&self, index: u32) -> Result<TelemetryRecord> {
            self.slots
                .get(index as usize)
                .copied()
                .context("slot out of range")
        }
    }

    fn record(sequence: u32) -> TelemetryRecord {
        let ts = Ntp64::new(2_208_988_800 + sequence, 0);
        TelemetryRecord {
            session_id: 1,
            sequence,
            test_tx: ts,
            test_rx: ts,
            reply_tx: ts,
            reply_rx: u64::from(sequence) * 1_000_000_000,
            ..Default::default()
        }
    }

    fn reconciler() -> ClockReconciler {
        ClockReconciler::with_offset(0.0)
    }

    #[test]
    fn test_drain_partial_ring() {
        let source = VecSource {
            slots: vec![record(1), record(2), TelemetryRecord::default(), TelemetryRecord::default()],
            allocated: 2,
        };

        let report = drain(&source, &reconciler()).unwrap();
        let seqs: Vec<u32> = report.rows.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
        assert_eq!(
            report.stats,
            DrainStats {
                allocated: 2,
                drained: 2,
                exported: 2,
                rejected: 0,
                overwritten: 0,
            }
        );
    }

    #[test]
    fn test_drain_wrapped_ring_oldest_first() {
        // Five allocations into three slots: 3 and 4 overwrote 0 and 1
        let source = VecSource {
            slots: vec![record(3), record(4), record(2)],
            allocated: 5,
        };

        let report = drain(&source, &reconciler()).unwrap();
        let seqs: Vec<u32> = report.rows.iter().map(|r| r.seq).collect();
        assert_eq!(seqs, vec![2, 3, 4]);
        assert_eq!(report.stats.drained, 3);
        assert_eq!(report.stats.overwritten, 2);
    }

    #[test]
    fn test_drain_counts_rejected_slots() {
        let source = VecSource {
            slots: vec![record(1), TelemetryRecord::default(), record(3)],
            allocated: 3,
        };

        let report = drain(&source, &reconciler()).unwrap();
        assert_eq!(report.rows.len(), 2);
        assert_eq!(report.stats.exported, 2);
        assert_eq!(report.stats.rejected, 1);
    }

    #[test]
    fn test_drain_empty_ring() {
        let source = VecSource {
            slots: vec![TelemetryRecord::default(); 8],
            allocated: 0,
        };

        let report = drain(&source, &reconciler()).unwrap();
        assert!(report.rows.is_empty());
        assert_eq!(report.stats, DrainStats::default());
    }

    #[test]
    fn test_drain_rejects_zero_capacity() {
        let source = VecSource {
            slots: Vec::new(),
            allocated: 0,
        };
        assert!(drain(&source, &reconciler()).is_err());
    }

    #[test]
    fn test_drain_window() {
        assert_eq!(drain_window(0, 10), (0, 0, 0));
        assert_eq!(drain_window(10, 10), (0, 10, 0));
        assert_eq!(drain_window(11, 10), (1, 10, 1));
        assert_eq!(drain_window(25, 10), (5, 10, 15));
    }
}
