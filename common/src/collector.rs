//! Session-Sender collector fast path
//!
//! Accepts reflected STAMP replies, stores one [`TelemetryRecord`] per reply
//! in the telemetry ring and consumes the frame.

use crate::{
    codec::{parse_reply, ReplyPacket},
    cursor::{parse_headers, FrameBuf, HeaderCursor},
    ring::SlotAllocator,
    types::{TelemetryRecord, Verdict},
};

/// Monotonic time source sampled on reply arrival
pub trait MonotonicClock {
    /// Nanoseconds since an arbitrary fixed point (boot on Linux)
    fn now_ns(&self) -> u64;
}

/// Fixed-capacity record storage indexed by ring slot
pub trait TelemetryStore {
    /// Write `record` into slot `index`
    ///
    /// Returns `false` if the slot cannot be reached.
    fn store(&self, index: u32, record: TelemetryRecord) -> bool;
}

/// Build the telemetry record for a reply received at `arrival_ns`
#[inline(always)]
pub fn record_from_reply(reply: &ReplyPacket, arrival_ns: u64) -> TelemetryRecord {
    TelemetryRecord {
        session_id: reply.session_id,
        _padding: [0; 2],
        sequence: reply.sequence,
        test_tx: reply.sender_tx_timestamp,
        test_rx: reply.rx_timestamp,
        reply_tx: reply.tx_timestamp,
        reply_rx: arrival_ns,
    }
}

/// XDP collector engine
pub struct CollectorEngine<'a, A, S: ?Sized, C: ?Sized> {
    allocator: A,
    store: &'a S,
    clock: &'a C,
}

impl<'a, A, S, C> CollectorEngine<'a, A, S, C>
where
    A: SlotAllocator,
    S: TelemetryStore + ?Sized,
    C: MonotonicClock + ?Sized,
{
    pub fn new(allocator: A, store: &'a S, clock: &'a C) -> Self {
        Self {
            allocator,
            store,
            clock,
        }
    }

    /// Collect one frame
    ///
    /// The allocator is consulted only once the frame has been validated as
    /// a reply, so rejected frames never advance the ring or touch the
    /// counter cell.
    #[inline(always)]
    pub fn process<F: FrameBuf + ?Sized>(&self, frame: &F) -> Verdict {
        let mut cursor = HeaderCursor::new(frame);
        let reply = match parse_headers(frame, &mut cursor).and_then(|_| parse_reply(frame, &cursor)) {
            Some(reply) => reply,
            None => return Verdict::PassThrough,
        };

        let index = match self.allocator.allocate() {
            Some(index) => index,
            None => return Verdict::PassThrough,
        };
        let record = record_from_reply(&reply, self.clock.now_ns());

        if self.store.store(index, record) {
            Verdict::Consume
        } else {
            Verdict::PassThrough
        }
    }
}
