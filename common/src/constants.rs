//! Shared constants for the STAMP XDP programs
//!
//! These constants are used by both kernel and userspace programs
//! to ensure consistency in wire layout and map geometry.

use core::num::NonZeroU32;

// ============================================================================
// BPF Map Sizes
// ============================================================================

/// Capacity of the telemetry ring (100 flows at 5 pps for one hour)
pub const STAMP_MAP_SIZE: u32 = 1_800_000;

/// [`STAMP_MAP_SIZE`] as a ring capacity
pub const STAMP_RING_CAPACITY: NonZeroU32 = match NonZeroU32::new(STAMP_MAP_SIZE) {
    Some(capacity) => capacity,
    None => panic!("telemetry ring capacity must be non-zero"),
};

/// Key of the single allocation counter cell
pub const COUNTER_KEY: u32 = 0;

/// Number of entries in the counter map
pub const COUNTER_MAP_SIZE: u32 = 1;

// ============================================================================
// Statistics Counter Indices (for STATS map)
// ============================================================================

/// Number of test packets turned around by the reflector
pub const STAT_REFLECTED: u32 = 0;

/// Number of reply packets stored by the collector
pub const STAT_COLLECTED: u32 = 1;

/// Number of failed shared-map lookups (counter or telemetry slot)
pub const STAT_MAP_LOOKUP_FAILURES: u32 = 2;

/// Total number of statistics counters
pub const MAX_STATS: u32 = 3;

// ============================================================================
// Protocol Numbers and Ports
// ============================================================================

/// Well-known STAMP UDP port (RFC 8762)
pub const STAMP_PORT: u16 = 862;

/// EtherType for IPv4
pub const ETH_P_IP: u16 = 0x0800;

/// UDP protocol number
pub const IPPROTO_UDP: u8 = 17;

// ============================================================================
// Header Sizes
// ============================================================================

/// Ethernet MAC address length
pub const ETH_ALEN: usize = 6;

/// Ethernet header length (no VLAN tags)
pub const ETH_HDR_LEN: usize = 14;

/// Minimum IPv4 header length (IHL = 5)
pub const IPV4_MIN_HDR_LEN: usize = 20;

/// UDP header length
pub const UDP_HDR_LEN: usize = 8;

/// Base length of an unauthenticated STAMP test or reply packet
pub const STAMP_BASE_LEN: usize = 44;

/// Number of MBZ octets in an unauthenticated test packet
pub const TEST_MBZ_LEN: usize = 28;

// ============================================================================
// Clock Conversion
// ============================================================================

/// Seconds between the NTP epoch (1900-01-01) and the Unix epoch (1970-01-01)
pub const NTP_UNIX_OFFSET: u32 = 2_208_988_800;

/// Nanoseconds per second
pub const NANOSEC_PER_SEC: u64 = 1_000_000_000;
