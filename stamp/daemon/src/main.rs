//! STAMP Probe - Userspace Program
//!
//! Loads the STAMP XDP programs, attaches the reflector or the collector to
//! an interface, runs the measurement window and exports the results.
//!
//! ## Usage
//!
//! ```bash
//! # Reflect test packets on eth0 until Ctrl-C
//! sudo ./stamp-probe --iface eth0 --role reflector --duration 0 --ebpf-object stamp-probe.o
//!
//! # Collect replies for 60 seconds and write the CSV table
//! sudo ./stamp-probe --iface eth0 --role collector --duration 60 --output stamp.csv
//!
//! # Generic mode on interfaces without native XDP, plus a JSON summary
//! sudo ./stamp-probe --iface veth0 --role collector --mode skb --summary run.json
//! ```

use anyhow::Result;
use clap::Parser;
use log::{error, info, warn};
use stamp_probe_userspace::{
    clock::ClockReconciler,
    exporter::{CsvExporter, JsonExporter, TelemetryExporter},
    loader::ProbeLoader,
    progress::{RunWindow, WindowEnd},
    telemetry::drain,
    types::{Role, RunSummary, XdpMode},
};
use std::{num::NonZeroU64, path::PathBuf, time::Instant};
use tokio::signal;

/// STAMP reflector and collector running in XDP
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Network interface to attach to
    #[clap(short, long)]
    iface: String,

    /// XDP program to run
    #[clap(short, long, value_enum, default_value_t = Role::Collector)]
    role: Role,

    /// Duration of the measurement window (in seconds, 0 = until Ctrl-C)
    #[clap(short, long, default_value_t = 60)]
    duration: u64,

    /// Output CSV file for collected measurements
    #[clap(short, long, default_value = "stamp.csv")]
    output: PathBuf,

    /// Optional JSON run summary
    #[clap(long)]
    summary: Option<PathBuf>,

    /// XDP attach mode
    #[clap(short, long, value_enum, default_value_t = XdpMode::Auto)]
    mode: XdpMode,

    /// Path to eBPF object file (if not embedded)
    #[clap(long)]
    ebpf_object: Option<PathBuf>,

    /// Progress reporting interval in seconds (must be at least 1)
    #[clap(long, default_value = "10")]
    progress_interval: NonZeroU64,

    /// Verbose logging
    #[clap(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::from_default_env()
        .filter_level(if args.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        })
        .init();

    if let Err(e) = run(args).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    print_banner();

    info!("Starting STAMP probe...");
    info!("   Interface: {}", args.iface);
    info!("   Role: {:?}", args.role);
    info!(
        "   Duration: {} seconds",
        if args.duration == 0 {
            "infinite".to_string()
        } else {
            args.duration.to_string()
        }
    );
    if args.role == Role::Collector {
        info!("   Output: {:?}", args.output);
    }

    // Load eBPF program and verify the shared maps
    let mut loader = ProbeLoader::load(args.ebpf_object.clone())?;
    loader.check_maps()?;

    if args.role == Role::Collector {
        loader.reset_counter()?;
    }

    let started_at = chrono::Utc::now();
    loader.attach(args.role, &args.iface, args.mode)?;

    let start_time = Instant::now();
    let window = RunWindow::new(args.duration, args.progress_interval);
    let end = window
        .wait(signal::ctrl_c(), |elapsed| report_progress(&loader, args.role, elapsed.as_secs()))
        .await?;

    match end {
        WindowEnd::Elapsed => info!("Duration reached, shutting down..."),
        WindowEnd::Interrupted => info!("Interrupted, shutting down..."),
    }

    loader.detach()?;
    let elapsed = start_time.elapsed().as_secs();

    let kernel = loader.kernel_stats()?;
    if kernel.map_lookup_failures > 0 {
        warn!(
            "{} shared map lookups failed during the run; affected packets were passed to the stack",
            kernel.map_lookup_failures
        );
    }

    let drain_stats = if args.role == Role::Collector {
        info!("Reconciling clocks and exporting telemetry...");
        let reconciler = ClockReconciler::new()?;
        let report = drain(&loader.telemetry()?, &reconciler)?;

        CsvExporter::new(args.output.clone()).export(&report)?;
        info!("Measurements written to {:?}", args.output);
        Some(report.stats)
    } else {
        None
    };

    let summary = RunSummary {
        timestamp: started_at.to_rfc3339(),
        role: args.role,
        interface: args.iface.clone(),
        duration_seconds: elapsed,
        drain: drain_stats,
        kernel,
    };

    if let Some(path) = &args.summary {
        JsonExporter::new(path.clone(), true).export_summary(&summary)?;
        info!("Summary written to {:?}", path);
    }

    print_summary(&summary);

    Ok(())
}

fn report_progress(loader: &ProbeLoader, role: Role, elapsed_secs: u64) {
    let progress = match role {
        Role::Collector => loader
            .allocated()
            .map(|n| format!("{} replies collected", n)),
        Role::Reflector => loader
            .kernel_stats()
            .map(|s| format!("{} test packets reflected", s.reflected)),
    };

    match progress {
        Ok(msg) => info!("📈 Progress [{}s]: {}", elapsed_secs, msg),
        Err(e) => warn!("Progress unavailable: {:#}", e),
    }
}

fn print_banner() {
    println!(
        r#"
╔═══════════════════════════════════════════════════╗
║        STAMP Probe - XDP Reflector/Collector      ║
║                   RFC 8762                        ║
╚═══════════════════════════════════════════════════╝
    "#
    );
}

fn print_summary(summary: &RunSummary) {
    info!("");
    info!("============================================");
    info!("             Summary Report");
    info!("============================================");
    info!("");
    info!("  Role:               {:?}", summary.role);
    info!("  Interface:          {}", summary.interface);
    info!("  Duration:           {} seconds", summary.duration_seconds);
    info!("");
    info!("  Kernel Counters:");
    info!("    reflected:           {:>10}", summary.kernel.reflected);
    info!("    collected:           {:>10}", summary.kernel.collected);
    info!("    map lookup failures: {:>10}", summary.kernel.map_lookup_failures);
    if let Some(drain) = &summary.drain {
        info!("");
        info!("  Telemetry Ring:");
        info!("    allocated:   {:>10}", drain.allocated);
        info!("    drained:     {:>10}", drain.drained);
        info!("    exported:    {:>10}", drain.exported);
        info!("    rejected:    {:>10}", drain.rejected);
        info!("    overwritten: {:>10}", drain.overwritten);
    }
    info!("");
    info!("============================================");
}
