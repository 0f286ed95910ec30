//! STAMP wire format (RFC 8762, unauthenticated mode)
//!
//! ```text
//! Session-Sender Test Packet            Session-Reflector Reply Packet
//!  0  Sequence Number                    0  Sequence Number
//!  4  Timestamp (NTP64)                  4  Timestamp (NTP64)
//! 12  Error Estimate | 14 SSID          12  Error Estimate | 14 SSID
//! 16  MBZ (28 octets)                   16  Receive Timestamp (NTP64)
//! 44  TLVs ...                          24  Session-Sender Sequence Number
//!                                       28  Session-Sender Timestamp (NTP64)
//!                                       36  Session-Sender Error Estimate | 38 MBZ
//!                                       40  Session-Sender TTL | 41 MBZ (3 octets)
//!                                       44  TLVs ...
//! ```
//!
//! All fields are big-endian. TLVs are left in place and never inspected.

use crate::{
    constants::{STAMP_BASE_LEN, TEST_MBZ_LEN},
    cursor::{FrameBuf, HeaderCursor},
    types::Ntp64,
};

type Wire = [u8; STAMP_BASE_LEN];

#[inline(always)]
fn get_u16(b: &Wire, off: usize) -> u16 {
    u16::from_be_bytes([b[off], b[off + 1]])
}

#[inline(always)]
fn get_u32(b: &Wire, off: usize) -> u32 {
    u32::from_be_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}

#[inline(always)]
fn get_ntp(b: &Wire, off: usize) -> Ntp64 {
    Ntp64::new(get_u32(b, off), get_u32(b, off + 4))
}

#[inline(always)]
fn put<const N: usize>(b: &mut Wire, off: usize, bytes: [u8; N]) {
    let mut i = 0;
    while i < N {
        b[off + i] = bytes[i];
        i += 1;
    }
}

/// Session-Sender test packet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TestPacket {
    pub sequence: u32,
    pub sender_tx_timestamp: Ntp64,
    pub error_estimate: u16,
    pub session_id: u16,
}

impl TestPacket {
    /// Decode a base packet, rejecting it if any MBZ octet is set
    #[inline(always)]
    pub fn decode(bytes: &Wire) -> Option<Self> {
        let mut i = 0;
        while i < TEST_MBZ_LEN {
            if bytes[16 + i] != 0 {
                return None;
            }
            i += 1;
        }

        Some(Self {
            sequence: get_u32(bytes, 0),
            sender_tx_timestamp: get_ntp(bytes, 4),
            error_estimate: get_u16(bytes, 12),
            session_id: get_u16(bytes, 14),
        })
    }

    pub fn encode(&self) -> Wire {
        let mut b = [0u8; STAMP_BASE_LEN];
        put(&mut b, 0, self.sequence.to_be_bytes());
        put(&mut b, 4, self.sender_tx_timestamp.to_be_bytes());
        put(&mut b, 12, self.error_estimate.to_be_bytes());
        put(&mut b, 14, self.session_id.to_be_bytes());
        b
    }
}

/// Session-Reflector reply packet
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReplyPacket {
    pub sequence: u32,
    /// Reflector send time
    pub tx_timestamp: Ntp64,
    pub error_estimate: u16,
    pub session_id: u16,
    /// Reflector receive time of the matching test packet
    pub rx_timestamp: Ntp64,
    pub sender_sequence: u32,
    pub sender_tx_timestamp: Ntp64,
    pub sender_error_estimate: u16,
    pub sender_ttl: u8,
}

impl ReplyPacket {
    /// Decode a base packet, rejecting it if any MBZ field is set
    #[inline(always)]
    pub fn decode(bytes: &Wire) -> Option<Self> {
        if bytes[38] != 0 || bytes[39] != 0 || bytes[41] != 0 || bytes[42] != 0 || bytes[43] != 0 {
            return None;
        }

        Some(Self {
            sequence: get_u32(bytes, 0),
            tx_timestamp: get_ntp(bytes, 4),
            error_estimate: get_u16(bytes, 12),
            session_id: get_u16(bytes, 14),
            rx_timestamp: get_ntp(bytes, 16),
            sender_sequence: get_u32(bytes, 24),
            sender_tx_timestamp: get_ntp(bytes, 28),
            sender_error_estimate: get_u16(bytes, 36),
            sender_ttl: bytes[40],
        })
    }

    #[inline(always)]
    pub fn encode(&self) -> Wire {
        let mut b = [0u8; STAMP_BASE_LEN];
        put(&mut b, 0, self.sequence.to_be_bytes());
        put(&mut b, 4, self.tx_timestamp.to_be_bytes());
        put(&mut b, 12, self.error_estimate.to_be_bytes());
        put(&mut b, 14, self.session_id.to_be_bytes());
        put(&mut b, 16, self.rx_timestamp.to_be_bytes());
        put(&mut b, 24, self.sender_sequence.to_be_bytes());
        put(&mut b, 28, self.sender_tx_timestamp.to_be_bytes());
        put(&mut b, 36, self.sender_error_estimate.to_be_bytes());
        b[40] = self.sender_ttl;
        b
    }
}

/// Read a test packet at the cursor position
///
/// The caller is expected to have walked the headers with
/// [`parse_headers`](crate::cursor::parse_headers), which enforces the STAMP
/// source port. The cursor is not moved.
#[inline(always)]
pub fn parse_test<F: FrameBuf + ?Sized>(frame: &F, cursor: &HeaderCursor) -> Option<TestPacket> {
    let offset = cursor.ensure(STAMP_BASE_LEN)?;
    let bytes: Wire = frame.read(offset)?;
    TestPacket::decode(&bytes)
}

/// Read a reply packet at the cursor position
///
/// Same contract as [`parse_test`].
#[inline(always)]
pub fn parse_reply<F: FrameBuf + ?Sized>(frame: &F, cursor: &HeaderCursor) -> Option<ReplyPacket> {
    let offset = cursor.ensure(STAMP_BASE_LEN)?;
    let bytes: Wire = frame.read(offset)?;
    ReplyPacket::decode(&bytes)
}
