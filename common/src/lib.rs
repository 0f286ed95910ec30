//! Shared packet pipeline for the STAMP XDP programs
//!
//! Everything in this crate is target independent: the same header walk,
//! codec, reflector and collector run inside the XDP programs and in host
//! tests. Map value types and constants are shared with the userspace loader.

#![cfg_attr(not(test), no_std)]

pub mod checksum;
pub mod codec;
pub mod collector;
pub mod constants;
pub mod cursor;
pub mod reflector;
pub mod ring;
pub mod types;

#[cfg(test)]
mod testutil;

// Re-export commonly used types
pub use codec::{parse_reply, parse_test, ReplyPacket, TestPacket};
pub use collector::{CollectorEngine, MonotonicClock, TelemetryStore};
pub use constants::*;
pub use cursor::{parse_headers, FrameBuf, HeaderCursor, UdpFrame};
pub use reflector::ReflectorEngine;
pub use ring::{RingIndexAllocator, SlotAllocator};
pub use types::{Ntp64, TelemetryRecord, Verdict};
