//! XDP handlers for the STAMP reflector and collector
//!
//! The engines return a [`Verdict`]; this module maps it to an XDP action
//! and keeps the statistics counters.

use aya_ebpf::{bindings::xdp_action, macros::xdp, programs::XdpContext};
use stamp_common::{
    collector::CollectorEngine, constants::*, reflector::ReflectorEngine, types::Verdict,
};

use crate::{frame::XdpFrame, helpers::*};

#[inline(always)]
fn verdict_to_action(verdict: Verdict) -> u32 {
    match verdict {
        Verdict::Transmit => xdp_action::XDP_TX,
        Verdict::Consume => xdp_action::XDP_DROP,
        Verdict::PassThrough => xdp_action::XDP_PASS,
    }
}

/// Session-Reflector
///
/// Rewrites STAMP test packets into replies and bounces them back out of
/// the receiving interface.
#[xdp]
pub fn stamp_reflector(ctx: XdpContext) -> u32 {
    match try_stamp_reflector(&ctx) {
        Ok(ret) => ret,
        Err(_) => xdp_action::XDP_PASS,
    }
}

fn try_stamp_reflector(ctx: &XdpContext) -> Result<u32, ()> {
    let mut frame = XdpFrame::new(ctx);

    let verdict = ReflectorEngine::process(&mut frame);
    if verdict == Verdict::Transmit {
        increment_stat(STAT_REFLECTED);
    }

    Ok(verdict_to_action(verdict))
}

/// Session-Sender collector
///
/// Stores the timestamps of each STAMP reply in the telemetry ring and
/// drops the reply.
#[xdp]
pub fn stamp_collector(ctx: XdpContext) -> u32 {
    match try_stamp_collector(&ctx) {
        Ok(ret) => ret,
        Err(_) => xdp_action::XDP_PASS,
    }
}

fn try_stamp_collector(ctx: &XdpContext) -> Result<u32, ()> {
    let engine = CollectorEngine::new(MapSlotAllocator, &RingStore, &KtimeClock);
    let frame = XdpFrame::new(ctx);

    let verdict = engine.process(&frame);
    if verdict == Verdict::Consume {
        increment_stat(STAT_COLLECTED);
    }

    Ok(verdict_to_action(verdict))
}
