//! Userspace type definitions
//!
//! ## Organization
//!
//! - **Kernel Types**: map value types and constants shared with the XDP
//!   programs (from stamp_common)
//! - **Userspace Types**: run configuration, exported rows and run summary

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

// ============================================================================
// Kernel Types (from eBPF programs)
// ============================================================================

pub mod kernel {
    //! Types shared between the XDP programs and userspace
    //!
    //! These are re-exported from the stamp-common crate and must
    //! maintain binary compatibility with the eBPF programs.

    pub use stamp_common::constants;
    pub use stamp_common::types::{Ntp64, TelemetryRecord};
}

pub use kernel::{Ntp64, TelemetryRecord};

// ============================================================================
// Userspace Types
// ============================================================================

/// Which XDP program to run
#[derive(ValueEnum, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Turn test packets into replies
    Reflector,
    /// Record replies into the telemetry ring
    Collector,
}

impl Role {
    /// XDP program name in the object file
    pub fn program_name(self) -> &'static str {
        match self {
            Role::Reflector => "stamp_reflector",
            Role::Collector => "stamp_collector",
        }
    }
}

/// XDP attach mode
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum XdpMode {
    /// Generic (skb) mode, works on any interface
    Skb,
    /// Driver (native) mode
    Native,
    /// Let the kernel pick
    Auto,
}

/// One reconciled measurement, all timestamps in Unix seconds
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ExportRow {
    pub ssid: u16,
    pub seq: u32,
    /// Sender transmit time
    pub test_tx: f64,
    /// Reflector receive time
    pub test_rx: f64,
    /// Reflector transmit time
    pub reply_tx: f64,
    /// Collector receive time
    pub reply_rx: f64,
}

/// Bookkeeping for one pass over the telemetry ring
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    /// Slots handed out by the collector during the run
    pub allocated: u64,
    /// Slots read back
    pub drained: u64,
    /// Records that passed reconciliation
    pub exported: u64,
    /// Never-written or corrupt records
    pub rejected: u64,
    /// Records lost to ring wraparound
    pub overwritten: u64,
}

/// Snapshot of the kernel STATS map
#[derive(Serialize, Deserialize, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct KernelStats {
    pub reflected: u64,
    pub collected: u64,
    pub map_lookup_failures: u64,
}

/// Run summary for JSON export
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RunSummary {
    /// ISO 8601 timestamp of the start of the run
    pub timestamp: String,
    pub role: Role,
    pub interface: String,
    /// Length of the measurement window in seconds
    pub duration_seconds: u64,
    /// Collector only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drain: Option<DrainStats>,
    pub kernel: KernelStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_program_names() {
        assert_eq!(Role::Reflector.program_name(), "stamp_reflector");
        assert_eq!(Role::Collector.program_name(), "stamp_collector");
    }

    #[test]
    fn test_summary_serialization() {
        let summary = RunSummary {
            timestamp: "2025-01-01T00:00:00Z".to_string(),
            role: Role::Reflector,
            interface: "eth0".to_string(),
            duration_seconds: 30,
            drain: None,
            kernel: KernelStats {
                reflected: 150,
                ..Default::default()
            },
        };

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["role"], "reflector");
        assert_eq!(value["kernel"]["reflected"], 150);
        assert!(value.get("drain").is_none());
    }
}
