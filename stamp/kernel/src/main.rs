//! STAMP XDP programs - Kernel Space
//!
//! Two XDP entry points share one object file:
//!
//! - `stamp_reflector` turns Session-Sender test packets into replies and
//!   transmits them back out of the receiving interface.
//! - `stamp_collector` consumes reflected replies and records their
//!   timestamps in the `STAMP_DATA` ring for the userspace drain.
//!
//! ## Architecture
//!
//! ```text
//! frame -> XdpFrame (bounds-checked) -> HeaderCursor -> StampCodec
//!                                                        |
//!               +----------------------------------------+
//!               v                                        v
//!        ReflectorEngine -> XDP_TX            CollectorEngine -> XDP_DROP
//!                                                  |
//!                                    COUNTER (fetch-add) + STAMP_DATA
//! ```
//!
//! Anything that is not a well-formed STAMP packet gets XDP_PASS.
//!
//! ## Usage
//!
//! This program must be compiled for the bpfel-unknown-none target:
//!
//! ```bash
//! cargo build --release --target=bpfel-unknown-none
//! ```
//!
//! The compiled bytecode is then loaded by the userspace program.

#![no_std]
#![no_main]

mod frame;
mod handlers;
mod helpers;
mod maps;

// Re-export XDP entry points so they're visible to the loader
pub use handlers::{stamp_collector, stamp_reflector};

// Re-export maps for verification
pub use maps::{COUNTER, STAMP_DATA, STATS};

#[cfg(not(test))]
#[panic_handler]
fn panic(_info: &core::panic::PanicInfo) -> ! {
    // The engines have no panicking paths; the verifier rejects any that remain
    loop {}
}
