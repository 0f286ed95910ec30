//! Frame builders shared by the unit tests

use crate::{
    checksum::udp_ipv4_checksum,
    codec::{ReplyPacket, TestPacket},
    constants::*,
    types::Ntp64,
};

/// Session-Sender's ephemeral port
pub const PEER_PORT: u16 = 50_862;

/// Offset of the STAMP payload in a frame without IP options
pub const PAYLOAD_OFFSET: usize = ETH_HDR_LEN + IPV4_MIN_HDR_LEN + UDP_HDR_LEN;

const SRC_MAC: [u8; ETH_ALEN] = [0x02, 0, 0, 0, 0, 0x01];
const DST_MAC: [u8; ETH_ALEN] = [0x02, 0, 0, 0, 0, 0x02];
const SRC_IP: [u8; 4] = [10, 0, 0, 1];
const DST_IP: [u8; 4] = [10, 0, 0, 2];

pub fn sample_test_packet() -> TestPacket {
    TestPacket {
        sequence: 42,
        sender_tx_timestamp: Ntp64::new(2_208_988_900, 0),
        error_estimate: 1,
        session_id: 7,
    }
}

fn ipv4_header_checksum(header: &[u8]) -> u16 {
    let mut acc: u32 = header
        .chunks_exact(2)
        .enumerate()
        .filter(|(i, _)| *i != 5)
        .map(|(_, w)| u32::from(u16::from_be_bytes([w[0], w[1]])))
        .sum();
    while acc >> 16 != 0 {
        acc = (acc & 0xffff) + (acc >> 16);
    }
    !(acc as u16)
}

/// Ethernet/IPv4/UDP frame carrying `payload` between the given ports
pub fn stamp_frame_with_ports(payload: &[u8], sport: u16, dport: u16, with_checksum: bool) -> Vec<u8> {
    let udp_len = (UDP_HDR_LEN + payload.len()) as u16;
    let total_len = IPV4_MIN_HDR_LEN as u16 + udp_len;

    let mut frame = Vec::with_capacity(ETH_HDR_LEN + usize::from(total_len));
    frame.extend_from_slice(&DST_MAC);
    frame.extend_from_slice(&SRC_MAC);
    frame.extend_from_slice(&ETH_P_IP.to_be_bytes());

    let mut ip = [0u8; IPV4_MIN_HDR_LEN];
    ip[0] = 0x45;
    ip[2..4].copy_from_slice(&total_len.to_be_bytes());
    ip[8] = 64;
    ip[9] = IPPROTO_UDP;
    ip[12..16].copy_from_slice(&SRC_IP);
    ip[16..20].copy_from_slice(&DST_IP);
    let ip_csum = ipv4_header_checksum(&ip);
    ip[10..12].copy_from_slice(&ip_csum.to_be_bytes());
    frame.extend_from_slice(&ip);

    let mut udp = Vec::with_capacity(usize::from(udp_len));
    udp.extend_from_slice(&sport.to_be_bytes());
    udp.extend_from_slice(&dport.to_be_bytes());
    udp.extend_from_slice(&udp_len.to_be_bytes());
    udp.extend_from_slice(&[0, 0]);
    udp.extend_from_slice(payload);
    if with_checksum {
        let csum = udp_ipv4_checksum(SRC_IP, DST_IP, &udp);
        udp[6..8].copy_from_slice(&csum.to_be_bytes());
    }
    frame.extend_from_slice(&udp);

    frame
}

/// Frame from the STAMP port to [`PEER_PORT`]
pub fn stamp_frame(payload: &[u8], with_checksum: bool) -> Vec<u8> {
    stamp_frame_with_ports(payload, STAMP_PORT, PEER_PORT, with_checksum)
}

pub fn test_frame(test: &TestPacket, with_checksum: bool) -> Vec<u8> {
    stamp_frame(&test.encode(), with_checksum)
}

pub fn reply_frame(reply: &ReplyPacket, with_checksum: bool) -> Vec<u8> {
    stamp_frame(&reply.encode(), with_checksum)
}

/// UDP checksum as carried in a frame without IP options
pub fn udp_checksum_field(frame: &[u8]) -> u16 {
    let at = ETH_HDR_LEN + IPV4_MIN_HDR_LEN + 6;
    u16::from_be_bytes([frame[at], frame[at + 1]])
}

/// Full UDP checksum over the addresses and datagram currently in `frame`
pub fn recompute_udp_checksum(frame: &[u8]) -> u16 {
    let ip = ETH_HDR_LEN;
    let src = [frame[ip + 12], frame[ip + 13], frame[ip + 14], frame[ip + 15]];
    let dst = [frame[ip + 16], frame[ip + 17], frame[ip + 18], frame[ip + 19]];
    udp_ipv4_checksum(src, dst, &frame[ip + IPV4_MIN_HDR_LEN..])
}
