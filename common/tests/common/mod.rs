//! Frame construction helpers for integration tests

use stamp_common::{checksum::udp_ipv4_checksum, constants::*};

pub const SENDER_IP: [u8; 4] = [192, 0, 2, 10];
pub const REFLECTOR_IP: [u8; 4] = [192, 0, 2, 20];

/// Build an Ethernet/IPv4/UDP frame with a valid UDP checksum
pub fn udp_frame(src: [u8; 4], dst: [u8; 4], sport: u16, dport: u16, payload: &[u8]) -> Vec<u8> {
    let udp_len = (UDP_HDR_LEN + payload.len()) as u16;

    let mut frame = vec![0u8; ETH_HDR_LEN];
    frame[..ETH_ALEN].copy_from_slice(&[0x02, 0xaa, 0, 0, 0, 0x20]);
    frame[ETH_ALEN..2 * ETH_ALEN].copy_from_slice(&[0x02, 0xaa, 0, 0, 0, 0x10]);
    frame[12..14].copy_from_slice(&ETH_P_IP.to_be_bytes());

    let mut ip = [0u8; IPV4_MIN_HDR_LEN];
    ip[0] = 0x45;
    ip[2..4].copy_from_slice(&(IPV4_MIN_HDR_LEN as u16 + udp_len).to_be_bytes());
    ip[8] = 64;
    ip[9] = IPPROTO_UDP;
    ip[12..16].copy_from_slice(&src);
    ip[16..20].copy_from_slice(&dst);
    frame.extend_from_slice(&ip);

    let mut udp = Vec::new();
    udp.extend_from_slice(&sport.to_be_bytes());
    udp.extend_from_slice(&dport.to_be_bytes());
    udp.extend_from_slice(&udp_len.to_be_bytes());
    udp.extend_from_slice(&[0, 0]);
    udp.extend_from_slice(payload);
    let csum = udp_ipv4_checksum(src, dst, &udp);
    udp[6..8].copy_from_slice(&csum.to_be_bytes());
    frame.extend_from_slice(&udp);

    frame
}
