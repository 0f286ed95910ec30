//! Telemetry exporters
//!
//! CSV for the per-packet table, JSON for the run summary.

use crate::{telemetry::DrainReport, types::RunSummary};
use anyhow::{Context, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};

/// Column header of the CSV table
pub const CSV_HEADER: &str = "ssid,seq,test_tx,test_rx,reply_tx,reply_rx";

/// Trait for telemetry exporters
pub trait TelemetryExporter {
    /// Export the rows of one drain pass
    fn export(&self, report: &DrainReport) -> Result<()>;
}

/// Write the CSV table to any sink
///
/// Timestamps are Unix seconds with six decimal places.
pub fn write_csv<W: Write>(mut writer: W, report: &DrainReport) -> Result<()> {
    writeln!(writer, "{}", CSV_HEADER)?;
    for row in &report.rows {
        writeln!(
            writer,
            "{},{},{:.6},{:.6},{:.6},{:.6}",
            row.ssid, row.seq, row.test_tx, row.test_rx, row.reply_tx, row.reply_rx
        )?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV exporter
pub struct CsvExporter {
    output_path: PathBuf,
}

impl CsvExporter {
    pub fn new(output_path: PathBuf) -> Self {
        Self { output_path }
    }
}

impl TelemetryExporter for CsvExporter {
    fn export(&self, report: &DrainReport) -> Result<()> {
        let file = File::create(&self.output_path)
            .with_context(|| format!("Failed to create output file: {:?}", self.output_path))?;

        write_csv(BufWriter::new(file), report)
            .with_context(|| format!("Failed to write to output file: {:?}", self.output_path))
    }
}

/// JSON run summary exporter
pub struct JsonExporter {
    output_path: PathBuf,
    pretty: bool,
}

impl JsonExporter {
    /// Create a new JSON exporter
    ///
    /// # Arguments
    ///
    /// * `output_path` - Path to output file
    /// * `pretty` - Enable pretty-printing
    pub fn new(output_path: PathBuf, pretty: bool) -> Self {
        Self {
            output_path,
            pretty,
        }
    }

    pub fn export_summary(&self, summary: &RunSummary) -> Result<()> {
        let json = if self.pretty {
            serde_json::to_string_pretty(summary)?
        } else {
            serde_json::to_string(summary)?
        };

        let mut file = File::create(&self.output_path)
            .with_context(|| format!("Failed to create output file: {:?}", self.output_path))?;

        file.write_all(json.as_bytes())
            .with_context(|| format!("Failed to write to output file: {:?}", self.output_path))?;

        Ok(())
    }
}
