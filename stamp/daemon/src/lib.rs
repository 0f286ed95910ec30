//! STAMP Probe Userspace Library
//!
//! Provides reusable components for loading the STAMP XDP programs,
//! draining the telemetry ring and exporting measurements.

pub mod clock;
pub mod exporter;
pub mod loader;
pub mod progress;
pub mod telemetry;
pub mod types;

pub use clock::ClockReconciler;
pub use exporter::{CsvExporter, JsonExporter, TelemetryExporter};
pub use loader::ProbeLoader;
pub use progress::{RunWindow, WindowEnd};
pub use telemetry::{drain, DrainReport, TelemetrySource};
pub use types::*;
