//! Bounds-checked frame access
//!
//! Every read or write goes through [`FrameBuf`], which compares the end of
//! the accessed range against the end of the frame before touching memory.
//! [`HeaderCursor`] walks Ethernet → IPv4 → UDP on top of it and refuses to
//! move past the end of the buffer. Declared length fields are never used as
//! a bounds source.

use crate::constants::*;

/// Raw frame buffer with checked fixed-size access
///
/// Implemented for `[u8]` on the host and for the XDP packet window in the
/// kernel program, so the engines run unchanged in both places.
pub trait FrameBuf {
    /// Number of bytes between the start and the end of the frame
    fn frame_len(&self) -> usize;

    /// Copy `N` bytes starting at `offset`, or `None` if the range leaves the frame
    fn read<const N: usize>(&self, offset: usize) -> Option<[u8; N]>;

    /// Overwrite `N` bytes starting at `offset`, or `None` if the range leaves the frame
    fn write<const N: usize>(&mut self, offset: usize, bytes: [u8; N]) -> Option<()>;
}

impl FrameBuf for [u8] {
    #[inline(always)]
    fn frame_len(&self) -> usize {
        <[u8]>::len(self)
    }

    #[inline(always)]
    fn read<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let end = offset.checked_add(N)?;
        if end > self.frame_len() {
            return None;
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self[offset..end]);
        Some(out)
    }

    #[inline(always)]
    fn write<const N: usize>(&mut self, offset: usize, bytes: [u8; N]) -> Option<()> {
        let end = offset.checked_add(N)?;
        if end > self.frame_len() {
            return None;
        }
        self[offset..end].copy_from_slice(&bytes);
        Some(())
    }
}

/// Incremental position over a frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeaderCursor {
    pos: usize,
    end: usize,
}

impl HeaderCursor {
    /// Start a walk at offset 0 of `frame`
    pub fn new<F: FrameBuf + ?Sized>(frame: &F) -> Self {
        Self {
            pos: 0,
            end: frame.frame_len(),
        }
    }

    /// Current offset
    #[inline(always)]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left before the end of the frame
    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.end - self.pos
    }

    /// Check that `len` bytes are available at the current position
    ///
    /// Returns the current offset without moving.
    #[inline(always)]
    pub fn ensure(&self, len: usize) -> Option<usize> {
        let next = self.pos.checked_add(len)?;
        if next > self.end {
            return None;
        }
        Some(self.pos)
    }

    /// Claim the next `len` bytes
    ///
    /// Returns the start offset of the claimed region. The cursor does not
    /// move if the region would pass the end of the frame.
    #[inline(always)]
    pub fn advance(&mut self, len: usize) -> Option<usize> {
        let start = self.ensure(len)?;
        self.pos = start + len;
        Some(start)
    }
}

/// Header offsets of a validated Ethernet/IPv4/UDP frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UdpFrame {
    /// Offset of the IPv4 header
    pub ip_offset: usize,
    /// Offset of the UDP header
    pub udp_offset: usize,
    /// Offset of the first byte after the UDP header
    pub payload_offset: usize,
    /// UDP source port (host byte order)
    pub source_port: u16,
    /// UDP destination port (host byte order)
    pub dest_port: u16,
    /// Declared UDP length (host byte order)
    pub udp_len: u16,
    /// UDP checksum as found on the wire (0 = not computed)
    pub checksum: u16,
}

/// Walk Ethernet, IPv4 and UDP headers of a candidate STAMP frame
///
/// Fails on any bounds violation, a non-IPv4 ethertype, an IHL below the
/// fixed header size, a non-UDP protocol, a declared UDP length too short to
/// carry a STAMP base packet, or a source port other than [`STAMP_PORT`].
/// On success the cursor sits on the UDP payload.
#[inline(always)]
pub fn parse_headers<F: FrameBuf + ?Sized>(
    frame: &F,
    cursor: &mut HeaderCursor,
) -> Option<UdpFrame> {
    // Ethernet
    let eth_offset = cursor.advance(ETH_HDR_LEN)?;
    let proto: [u8; 2] = frame.read(eth_offset + 2 * ETH_ALEN)?;
    if u16::from_be_bytes(proto) != ETH_P_IP {
        return None;
    }

    // IPv4, fixed part first so IHL and protocol can be read
    let ip_offset = cursor.ensure(IPV4_MIN_HDR_LEN)?;
    let ip_fixed: [u8; IPV4_MIN_HDR_LEN] = frame.read(ip_offset)?;
    if ip_fixed[0] >> 4 != 4 {
        return None;
    }
    let ip_hdr_len = usize::from(ip_fixed[0] & 0x0f) * 4;
    if ip_hdr_len < IPV4_MIN_HDR_LEN {
        return None;
    }
    if ip_fixed[9] != IPPROTO_UDP {
        return None;
    }
    cursor.advance(ip_hdr_len)?;

    // UDP
    let udp_offset = cursor.advance(UDP_HDR_LEN)?;
    let udp: [u8; UDP_HDR_LEN] = frame.read(udp_offset)?;
    let source_port = u16::from_be_bytes([udp[0], udp[1]]);
    let dest_port = u16::from_be_bytes([udp[2], udp[3]]);
    let udp_len = u16::from_be_bytes([udp[4], udp[5]]);
    let checksum = u16::from_be_bytes([udp[6], udp[7]]);

    if usize::from(udp_len) < UDP_HDR_LEN + STAMP_BASE_LEN {
        return None;
    }
    if source_port != STAMP_PORT {
        return None;
    }

    Some(UdpFrame {
        ip_offset,
        udp_offset,
        payload_offset: cursor.position(),
        source_port,
        dest_port,
        udp_len,
        checksum,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    #[test]
    fn test_cursor_refuses_to_pass_end() {
        let buf = [0u8; 10];
        let mut cursor = HeaderCursor::new(&buf[..]);

        assert_eq!(cursor.advance(4), Some(0));
        assert_eq!(cursor.advance(7), None);
        assert_eq!(cursor.position(), 4);
        assert_eq!(cursor.advance(6), Some(4));
        assert_eq!(cursor.remaining(), 0);
        assert_eq!(cursor.advance(1), None);
    }

    #[test]
    fn test_cursor_overflow_is_rejected() {
        let buf = [0u8; 4];
        let mut cursor = HeaderCursor::new(&buf[..]);
        let _ = cursor.advance(2);
        assert_eq!(cursor.advance(usize::MAX), None);
    }

    #[test]
    fn test_slice_access_is_bounds_checked() {
        let mut buf = [1u8, 2, 3, 4];
        assert_eq!(buf[..].read::<2>(2), Some([3, 4]));
        assert_eq!(buf[..].read::<2>(3), None);
        assert_eq!(buf[..].write(3, [9u8, 9]), None);
        assert_eq!(buf, [1, 2, 3, 4]);
        assert_eq!(buf[..].write(0, [9u8]), Some(()));
        assert_eq!(buf[0], 9);
    }

    #[test]
    fn test_parse_headers_accepts_stamp_frame() {
        let frame = test_frame(&sample_test_packet(), true);
        let mut cursor = HeaderCursor::new(&frame[..]);
        let udp = parse_headers(&frame[..], &mut cursor).expect("valid frame");

        assert_eq!(udp.ip_offset, ETH_HDR_LEN);
        assert_eq!(udp.udp_offset, ETH_HDR_LEN + IPV4_MIN_HDR_LEN);
        assert_eq!(udp.payload_offset, ETH_HDR_LEN + IPV4_MIN_HDR_LEN + UDP_HDR_LEN);
        assert_eq!(udp.source_port, STAMP_PORT);
        assert_eq!(udp.dest_port, PEER_PORT);
        assert_eq!(cursor.position(), udp.payload_offset);
    }

    #[test]
    fn test_parse_headers_honours_ip_options() {
        let mut frame = test_frame(&sample_test_packet(), false);
        // Grow the IPv4 header by one 4-byte option word
        for (i, byte) in [1u8, 1, 1, 0].into_iter().enumerate() {
            frame.insert(ETH_HDR_LEN + IPV4_MIN_HDR_LEN + i, byte);
        }
        frame[ETH_HDR_LEN] = 0x46;

        let mut cursor = HeaderCursor::new(&frame[..]);
        let udp = parse_headers(&frame[..], &mut cursor).expect("valid frame");
        assert_eq!(udp.udp_offset, ETH_HDR_LEN + 24);
    }

    #[test]
    fn test_parse_headers_rejects() {
        let good = test_frame(&sample_test_packet(), true);

        let mut vlan = good.clone();
        vlan[12..14].copy_from_slice(&0x8100u16.to_be_bytes());

        let mut short_ihl = good.clone();
        short_ihl[ETH_HDR_LEN] = 0x44;

        let mut tcp = good.clone();
        tcp[ETH_HDR_LEN + 9] = 6;

        let mut wrong_port = good.clone();
        wrong_port[ETH_HDR_LEN + IPV4_MIN_HDR_LEN..][..2].copy_from_slice(&4000u16.to_be_bytes());

        let mut short_udp_len = good.clone();
        short_udp_len[ETH_HDR_LEN + IPV4_MIN_HDR_LEN + 4..][..2].copy_from_slice(&8u16.to_be_bytes());

        let mut huge_ihl = good[..ETH_HDR_LEN + IPV4_MIN_HDR_LEN + 4].to_vec();
        huge_ihl[ETH_HDR_LEN] = 0x4f;

        for frame in [
            vlan,
            short_ihl,
            tcp,
            wrong_port,
            short_udp_len,
            huge_ihl,
            good[..ETH_HDR_LEN - 1].to_vec(),
            good[..ETH_HDR_LEN + 10].to_vec(),
            good[..ETH_HDR_LEN + IPV4_MIN_HDR_LEN + 7].to_vec(),
        ] {
            let mut cursor = HeaderCursor::new(&frame[..]);
            assert_eq!(parse_headers(&frame[..], &mut cursor), None);
        }
    }
}
