//! Internet checksum helpers
//!
//! The reflector never recomputes the UDP checksum over the whole datagram.
//! It patches the existing value word by word (RFC 1624, eqn. 3):
//! `HC' = ~(~HC + ~m + m')` for every 16-bit word `m` replaced by `m'`.

use crate::constants::IPPROTO_UDP;

/// Fold carries above bit 16 back into the low word, then complement
///
/// Four folds cover any accumulator this crate can produce.
#[inline(always)]
pub fn csum_fold(mut csum: u64) -> u16 {
    let mut i = 0;
    while i < 4 {
        if csum >> 16 != 0 {
            csum = (csum & 0xffff) + (csum >> 16);
        }
        i += 1;
    }
    !(csum as u16)
}

/// Running RFC 1624 update of an existing checksum
#[derive(Clone, Copy, Debug)]
pub struct IncrementalChecksum {
    acc: u64,
}

impl IncrementalChecksum {
    /// Seed from the checksum currently on the wire
    #[inline(always)]
    pub fn new(checksum: u16) -> Self {
        Self {
            acc: u64::from(!checksum),
        }
    }

    /// Account for one 16-bit word changing from `old` to `new`
    #[inline(always)]
    pub fn replace(&mut self, old: u16, new: u16) {
        if old != new {
            self.acc += u64::from(!old) + u64::from(new);
        }
    }

    /// Account for every differing word of two equally sized regions
    #[inline(always)]
    pub fn replace_region<const N: usize>(&mut self, old: &[u8; N], new: &[u8; N]) {
        let mut i = 0;
        while i + 1 < N {
            self.replace(
                u16::from_be_bytes([old[i], old[i + 1]]),
                u16::from_be_bytes([new[i], new[i + 1]]),
            );
            i += 2;
        }
    }

    /// Final UDP checksum; a computed zero goes on the wire as `0xffff`
    #[inline(always)]
    pub fn finish(self) -> u16 {
        match csum_fold(self.acc) {
            0 => 0xffff,
            csum => csum,
        }
    }
}

/// Full UDP-over-IPv4 checksum of `datagram` (header + payload)
///
/// The checksum field inside `datagram` is skipped. Used to verify the
/// incremental path and to build well-formed frames.
pub fn udp_ipv4_checksum(src: [u8; 4], dst: [u8; 4], datagram: &[u8]) -> u16 {
    let mut acc: u64 = 0;

    // Pseudo-header
    acc += u64::from(u16::from_be_bytes([src[0], src[1]]));
    acc += u64::from(u16::from_be_bytes([src[2], src[3]]));
    acc += u64::from(u16::from_be_bytes([dst[0], dst[1]]));
    acc += u64::from(u16::from_be_bytes([dst[2], dst[3]]));
    acc += u64::from(IPPROTO_UDP);
    acc += datagram.len() as u64;

    let mut chunks = datagram.chunks_exact(2);
    for (i, word) in chunks.by_ref().enumerate() {
        if i == 3 {
            continue;
        }
        acc += u64::from(u16::from_be_bytes([word[0], word[1]]));
    }
    if let [last] = chunks.remainder() {
        acc += u64::from(u16::from_be_bytes([*last, 0]));
    }

    // Wide enough for any datagram length, unlike the bounded fold
    while acc >> 16 != 0 {
        acc = (acc & 0xffff) + (acc >> 16);
    }
    match !(acc as u16) {
        0 => 0xffff,
        csum => csum,
    }
}
