//! eBPF program loader
//!
//! Loads the STAMP object file, attaches one of its XDP programs and hands
//! out typed views of the shared maps.

use anyhow::{bail, Context, Result};
use aya::{
    maps::{Array, MapData},
    programs::{xdp::XdpLinkId, Xdp, XdpFlags},
    Bpf,
};
use log::info;
use stamp_common::constants::*;
use std::path::PathBuf;

use crate::{
    telemetry::MapTelemetrySource,
    types::{KernelStats, Role, TelemetryRecord, XdpMode},
};

/// Map names in the object file
pub const STAMP_DATA_MAP: &str = "STAMP_DATA";
pub const COUNTER_MAP: &str = "COUNTER";
pub const STATS_MAP: &str = "STATS";

impl XdpMode {
    pub fn flags(self) -> XdpFlags {
        match self {
            XdpMode::Skb => XdpFlags::SKB_MODE,
            XdpMode::Native => XdpFlags::DRV_MODE,
            XdpMode::Auto => XdpFlags::default(),
        }
    }
}

/// Verify a map's entry count against what the XDP programs were built with
pub fn check_geometry(name: &str, actual: u32, expected: u32) -> Result<()> {
    if actual != expected {
        bail!(
            "{} map has {} entries, expected {} - object file and loader disagree",
            name,
            actual,
            expected
        );
    }
    Ok(())
}

/// eBPF program loader and manager
pub struct ProbeLoader {
    ebpf: Bpf,
    attached: Option<(Role, XdpLinkId)>,
}

impl ProbeLoader {
    /// Load eBPF program from file or embedded bytecode
    ///
    /// # Arguments
    ///
    /// * `path` - Optional path to eBPF object file. If None, uses embedded bytecode.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        info!("Loading eBPF program...");

        let ebpf = if let Some(obj_path) = path {
            info!("Loading eBPF object from: {:?}", obj_path);
            let data = std::fs::read(&obj_path)
                .with_context(|| format!("Failed to read eBPF object file: {:?}", obj_path))?;
            Bpf::load(&data).context("Failed to load eBPF program")?
        } else {
            #[cfg(feature = "embedded")]
            {
                info!("Loading embedded eBPF program...");
                let data = include_bytes!(concat!(
                    env!("CARGO_MANIFEST_DIR"),
                    "/../kernel/target/bpfel-unknown-none/release/stamp-probe"
                ));
                Bpf::load(data).context("Failed to load embedded eBPF program")?
            }
            #[cfg(not(feature = "embedded"))]
            {
                bail!(
                    "No eBPF object file provided. Use --ebpf-object or compile with 'embedded' feature"
                );
            }
        };

        info!("eBPF program loaded successfully");

        Ok(Self {
            ebpf,
            attached: None,
        })
    }

    /// Check that the telemetry maps have the expected sizes
    pub fn check_maps(&self) -> Result<()> {
        let ring = self.array::<TelemetryRecord>(STAMP_DATA_MAP)?;
        check_geometry(STAMP_DATA_MAP, ring.len(), STAMP_MAP_SIZE)?;

        let counter = self.array::<u64>(COUNTER_MAP)?;
        check_geometry(COUNTER_MAP, counter.len(), COUNTER_MAP_SIZE)?;

        let stats = self.array::<u64>(STATS_MAP)?;
        check_geometry(STATS_MAP, stats.len(), MAX_STATS)?;

        Ok(())
    }

    /// Zero the allocation counter so the run starts at slot 0
    pub fn reset_counter(&mut self) -> Result<()> {
        let map = self
            .ebpf
            .map_mut(COUNTER_MAP)
            .with_context(|| format!("{} map not found in eBPF object", COUNTER_MAP))?;
        let mut counter: Array<&mut MapData, u64> =
            Array::try_from(map).with_context(|| format!("{} is not an array map", COUNTER_MAP))?;

        counter
            .set(COUNTER_KEY, 0u64, 0)
            .context("Failed to reset allocation counter")?;
        Ok(())
    }

    /// Load and attach the XDP program for `role` to `interface`
    pub fn attach(&mut self, role: Role, interface: &str, mode: XdpMode) -> Result<()> {
        if let Some((current, _)) = self.attached {
            bail!("{} is already attached", current.program_name());
        }

        let name = role.program_name();
        info!("Attaching XDP program {}...", name);

        let program: &mut Xdp = self
            .ebpf
            .program_mut(name)
            .with_context(|| format!("{} program not found in eBPF object", name))?
            .try_into()
            .with_context(|| format!("Failed to get {} as XDP", name))?;
        program
            .load()
            .with_context(|| format!("Failed to load {}", name))?;
        let link = program.attach(interface, mode.flags()).with_context(|| {
            format!(
                "Failed to attach XDP to interface '{}' - check permissions and interface exists",
                interface
            )
        })?;

        info!("  ✓ Attached {} to {} ({:?} mode)", name, interface, mode);
        self.attached = Some((role, link));
        Ok(())
    }

    /// Detach the running XDP program, if any
    pub fn detach(&mut self) -> Result<()> {
        let Some((role, link)) = self.attached.take() else {
            return Ok(());
        };

        let name = role.program_name();
        let program: &mut Xdp = self
            .ebpf
            .program_mut(name)
            .with_context(|| format!("{} program not found in eBPF object", name))?
            .try_into()
            .with_context(|| format!("Failed to get {} as XDP", name))?;
        program
            .detach(link)
            .with_context(|| format!("Failed to detach {}", name))?;

        info!("  ✓ Detached {}", name);
        Ok(())
    }

    /// Telemetry ring and counter for the drain
    pub fn telemetry(&self) -> Result<MapTelemetrySource<'_>> {
        MapTelemetrySource::new(self.map(STAMP_DATA_MAP)?, self.map(COUNTER_MAP)?)
    }

    /// Current allocation counter value
    pub fn allocated(&self) -> Result<u64> {
        self.array::<u64>(COUNTER_MAP)?
            .get(&COUNTER_KEY, 0)
            .context("Failed to read COUNTER map")
    }

    /// Snapshot of the STATS map
    pub fn kernel_stats(&self) -> Result<KernelStats> {
        let stats = self.array::<u64>(STATS_MAP)?;
        let read = |id: u32| {
            stats
                .get(&id, 0)
                .with_context(|| format!("Failed to read {} entry {}", STATS_MAP, id))
        };

        Ok(KernelStats {
            reflected: read(STAT_REFLECTED)?,
            collected: read(STAT_COLLECTED)?,
            map_lookup_failures: read(STAT_MAP_LOOKUP_FAILURES)?,
        })
    }

    fn map(&self, name: &str) -> Result<&aya::maps::Map> {
        self.ebpf
            .map(name)
            .with_context(|| format!("{} map not found in eBPF object", name))
    }

    fn array<V: aya::Pod>(&self, name: &str) -> Result<Array<&MapData, V>> {
        Array::try_from(self.map(name)?).with_context(|| format!("{} is not an array map", name))
    }
}

impl Drop for ProbeLoader {
    fn drop(&mut self) {
        if let Err(e) = self.detach() {
            log::warn!("{:#}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_check() {
        assert!(check_geometry(STAMP_DATA_MAP, STAMP_MAP_SIZE, STAMP_MAP_SIZE).is_ok());

        let err = check_geometry(STAMP_DATA_MAP, 1024, STAMP_MAP_SIZE).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("STAMP_DATA"));
        assert!(msg.contains("1024"));
        assert!(msg.contains("1800000"));
    }

    #[test]
    fn test_mode_flags() {
        assert_eq!(XdpMode::Skb.flags().bits(), XdpFlags::SKB_MODE.bits());
        assert_eq!(XdpMode::Native.flags().bits(), XdpFlags::DRV_MODE.bits());
        assert_eq!(XdpMode::Auto.flags().bits(), XdpFlags::default().bits());
    }

    #[test]
    fn test_missing_object_file() {
        let err = ProbeLoader::load(Some(PathBuf::from("/nonexistent/stamp-probe.o")))
            .err()
            .unwrap();
        assert!(err.to_string().contains("Failed to read eBPF object file"));
    }
}
