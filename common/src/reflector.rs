//! Session-Reflector fast path
//!
//! Turns a STAMP test packet into a reply in place and hands it back to the
//! interface it arrived on. All reads (and therefore all bounds checks)
//! happen before the first write, so a rejected frame is never modified.

use crate::{
    checksum::IncrementalChecksum,
    codec::{parse_test, ReplyPacket, TestPacket},
    constants::*,
    cursor::{parse_headers, FrameBuf, HeaderCursor},
    types::Verdict,
};

/// Build the reply for a test packet
///
/// The reflector's own receive and transmit timestamps are copied from the
/// sender's timestamp instead of being sampled, so reflector-side one-way
/// delay cannot be derived from the reply.
#[inline(always)]
pub fn build_reply(test: &TestPacket) -> ReplyPacket {
    ReplyPacket {
        sequence: test.sequence,
        tx_timestamp: test.sender_tx_timestamp,
        error_estimate: test.error_estimate,
        session_id: test.session_id,
        rx_timestamp: test.sender_tx_timestamp,
        sender_sequence: test.sequence,
        sender_tx_timestamp: test.sender_tx_timestamp,
        sender_error_estimate: test.error_estimate,
        sender_ttl: 0,
    }
}

/// XDP reflector engine
pub struct ReflectorEngine;

impl ReflectorEngine {
    /// Reflect one frame
    ///
    /// Returns [`Verdict::Transmit`] after rewriting a valid test packet,
    /// [`Verdict::PassThrough`] otherwise.
    #[inline(always)]
    pub fn process<F: FrameBuf + ?Sized>(frame: &mut F) -> Verdict {
        match Self::try_reflect(frame) {
            Some(()) => Verdict::Transmit,
            None => Verdict::PassThrough,
        }
    }

    #[inline(always)]
    fn try_reflect<F: FrameBuf + ?Sized>(frame: &mut F) -> Option<()> {
        let mut cursor = HeaderCursor::new(frame);
        let udp = parse_headers(frame, &mut cursor)?;
        let test = parse_test(frame, &cursor)?;

        let macs: [u8; 2 * ETH_ALEN] = frame.read(0)?;
        let addrs: [u8; 8] = frame.read(udp.ip_offset + 12)?;
        let old_payload: [u8; STAMP_BASE_LEN] = frame.read(udp.payload_offset)?;

        // Swap MAC addresses
        let mut new_macs = [0u8; 2 * ETH_ALEN];
        let mut i = 0;
        while i < ETH_ALEN {
            new_macs[i] = macs[ETH_ALEN + i];
            new_macs[ETH_ALEN + i] = macs[i];
            i += 1;
        }

        // Swap IPv4 addresses; the header checksum is order independent
        let new_addrs = [
            addrs[4], addrs[5], addrs[6], addrs[7], addrs[0], addrs[1], addrs[2], addrs[3],
        ];

        let new_payload = build_reply(&test).encode();

        // Ports are swapped; a zero checksum means "not computed" and stays zero
        let checksum = if udp.checksum != 0 {
            let mut csum = IncrementalChecksum::new(udp.checksum);
            csum.replace_region(&addrs, &new_addrs);
            csum.replace(udp.source_port, udp.dest_port);
            csum.replace(udp.dest_port, udp.source_port);
            csum.replace_region(&old_payload, &new_payload);
            csum.finish()
        } else {
            0
        };

        let sport = udp.dest_port.to_be_bytes();
        let dport = udp.source_port.to_be_bytes();
        let len = udp.udp_len.to_be_bytes();
        let check = checksum.to_be_bytes();
        let udp_hdr = [
            sport[0], sport[1], dport[0], dport[1], len[0], len[1], check[0], check[1],
        ];

        frame.write(0, new_macs)?;
        frame.write(udp.ip_offset + 12, new_addrs)?;
        frame.write(udp.udp_offset, udp_hdr)?;
        frame.write(udp.payload_offset, new_payload)?;

        Some(())
    }
}
