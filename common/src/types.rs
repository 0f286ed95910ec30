//! Shared data structures between kernel and userspace
//!
//! Map values must be repr(C) to ensure consistent memory layout
//! between eBPF programs and userspace code.

/// 64-bit NTP timestamp
///
/// Whole seconds since 1900-01-01 in the upper word, fractional seconds
/// (units of 2^-32 s) in the lower word. Held in host byte order once decoded.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ntp64 {
    /// Seconds since the NTP epoch
    pub seconds: u32,
    /// Fractional seconds
    pub fraction: u32,
}

impl Ntp64 {
    /// Wire length in bytes
    pub const LEN: usize = 8;

    pub const fn new(seconds: u32, fraction: u32) -> Self {
        Self { seconds, fraction }
    }

    /// Decode from network byte order
    #[inline(always)]
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self {
            seconds: u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            fraction: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }

    /// Encode to network byte order
    #[inline(always)]
    pub fn to_be_bytes(self) -> [u8; 8] {
        let s = self.seconds.to_be_bytes();
        let f = self.fraction.to_be_bytes();
        [s[0], s[1], s[2], s[3], f[0], f[1], f[2], f[3]]
    }
}

/// Round-trip sample extracted by the collector
///
/// One record is written per accepted reply packet into the telemetry ring.
/// Never mutated after creation; overwritten when the ring wraps.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TelemetryRecord {
    /// Session-Sender identifier
    pub session_id: u16,
    /// Padding for alignment
    pub _padding: [u8; 2],
    /// Reflector sequence number
    pub sequence: u32,
    /// Sender's original transmit time
    pub test_tx: Ntp64,
    /// Reflector's receive time
    pub test_rx: Ntp64,
    /// Reflector's send time
    pub reply_tx: Ntp64,
    /// Collector arrival time (monotonic nanoseconds)
    pub reply_rx: u64,
}

/// Terminal action for one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Send the rewritten frame back out of the receiving interface
    Transmit,
    /// Absorb the frame; it is not forwarded
    Consume,
    /// Hand the frame to the rest of the network path unchanged
    PassThrough,
}

// Compile-time layout checks
// These will fail to compile if the map value layout drifts
const _: () = {
    assert!(core::mem::size_of::<Ntp64>() == 8);
    assert!(core::mem::size_of::<TelemetryRecord>() == 40);
    assert!(core::mem::align_of::<TelemetryRecord>() == 8);
    assert!(
        core::mem::size_of::<TelemetryRecord>() % core::mem::align_of::<TelemetryRecord>() == 0
    );
};

// Implement Aya's Pod trait for userspace usage
#[cfg(feature = "userspace")]
mod userspace_impls {
    use super::*;

    // Pod trait implementations for reading map values in userspace
    unsafe impl aya::Pod for Ntp64 {}
    unsafe impl aya::Pod for TelemetryRecord {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::mem;

    #[test]
    fn telemetry_record_field_offsets() {
        assert_eq!(mem::offset_of!(TelemetryRecord, session_id), 0);
        assert_eq!(mem::offset_of!(TelemetryRecord, sequence), 4);
        assert_eq!(mem::offset_of!(TelemetryRecord, test_tx), 8);
        assert_eq!(mem::offset_of!(TelemetryRecord, test_rx), 16);
        assert_eq!(mem::offset_of!(TelemetryRecord, reply_tx), 24);
        assert_eq!(mem::offset_of!(TelemetryRecord, reply_rx), 32);
    }

    #[test]
    fn ntp64_wire_order() {
        let ts = Ntp64::new(0x0102_0304, 0x0506_0708);
        assert_eq!(ts.to_be_bytes(), [1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(Ntp64::from_be_bytes(ts.to_be_bytes()), ts);
    }
}
