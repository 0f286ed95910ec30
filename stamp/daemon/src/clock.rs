//! Clock domain reconciliation
//!
//! Records carry three NTP64 timestamps stamped by the Session-Sender and
//! one `CLOCK_MONOTONIC` reading taken by the collector. Both are converted
//! to Unix seconds before export. The monotonic → wall offset is sampled
//! once per export pass so every row of a table shares it.

use std::{
    fmt,
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use nix::time::{clock_gettime, ClockId};
use stamp_common::constants::{NANOSEC_PER_SEC, NTP_UNIX_OFFSET};

use crate::types::{ExportRow, Ntp64, TelemetryRecord};

/// NTP64 timestamp → Unix seconds
pub fn ntp64_to_unix(ts: Ntp64) -> f64 {
    f64::from(ts.seconds) + f64::from(ts.fraction) / 4_294_967_296.0 - f64::from(NTP_UNIX_OFFSET)
}

/// Monotonic nanoseconds → Unix seconds, given a wall − monotonic offset
pub fn monotonic_to_unix(ns: u64, offset: f64) -> f64 {
    ns as f64 / NANOSEC_PER_SEC as f64 + offset
}

/// Sample wall clock and `CLOCK_MONOTONIC` back to back
///
/// Returns wall − monotonic in seconds.
pub fn compute_offset() -> Result<f64> {
    let wall = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock is before the Unix epoch")?;
    let mono = clock_gettime(ClockId::CLOCK_MONOTONIC).context("Failed to read CLOCK_MONOTONIC")?;

    let mono_secs = mono.tv_sec() as f64 + mono.tv_nsec() as f64 / NANOSEC_PER_SEC as f64;
    Ok(wall.as_secs_f64() - mono_secs)
}

/// Record that cannot be placed on the Unix timeline
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rejected {
    /// First field that converted to a negative time
    pub field: &'static str,
    pub value: f64,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} converts to negative time {:.6}", self.field, self.value)
    }
}

impl std::error::Error for Rejected {}

/// Converts telemetry records to export rows
#[derive(Debug, Clone, Copy)]
pub struct ClockReconciler {
    offset: f64,
}

impl ClockReconciler {
    /// Capture the current monotonic offset
    pub fn new() -> Result<Self> {
        let offset = compute_offset()?;
        log::debug!("Monotonic clock offset: {:.6} s", offset);
        Ok(Self { offset })
    }

    pub fn with_offset(offset: f64) -> Self {
        Self { offset }
    }

    /// Convert one record
    ///
    /// Never-written slots (all zero) and corrupt records land before the
    /// Unix epoch and are rejected.
    pub fn reconcile(&self, record: &TelemetryRecord) -> Result<ExportRow, Rejected> {
        let row = ExportRow {
            ssid: record.session_id,
            seq: record.sequence,
            test_tx: ntp64_to_unix(record.test_tx),
            test_rx: ntp64_to_unix(record.test_rx),
            reply_tx: ntp64_to_unix(record.reply_tx),
            reply_rx: monotonic_to_unix(record.reply_rx, self.offset),
        };

        for (field, value) in [
            ("test_tx", row.test_tx),
            ("test_rx", row.test_rx),
            ("reply_tx", row.reply_tx),
            ("reply_rx", row.reply_rx),
        ] {
            if value < 0.0 {
                return Err(Rejected { field, value });
            }
        }

        Ok(row)
    }
}
