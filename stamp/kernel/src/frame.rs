//! [`FrameBuf`] over the XDP packet window
//!
//! Each access checks `data + offset + N <= data_end` before the pointer is
//! formed, which is the shape the verifier needs to accept the load or store.

use core::ptr;

use aya_ebpf::programs::XdpContext;
use stamp_common::cursor::FrameBuf;

pub struct XdpFrame<'a> {
    ctx: &'a XdpContext,
}

impl<'a> XdpFrame<'a> {
    #[inline(always)]
    pub fn new(ctx: &'a XdpContext) -> Self {
        Self { ctx }
    }

    /// Address of `len` bytes at `offset`, if they lie inside the packet
    #[inline(always)]
    fn ptr_at(&self, offset: usize, len: usize) -> Option<usize> {
        let start = self.ctx.data();
        let end = self.ctx.data_end();

        let at = start.checked_add(offset)?;
        if at.checked_add(len)? > end {
            return None;
        }
        Some(at)
    }
}

impl FrameBuf for XdpFrame<'_> {
    #[inline(always)]
    fn frame_len(&self) -> usize {
        self.ctx.data_end().saturating_sub(self.ctx.data())
    }

    #[inline(always)]
    fn read<const N: usize>(&self, offset: usize) -> Option<[u8; N]> {
        let at = self.ptr_at(offset, N)?;
        Some(unsafe { ptr::read_unaligned(at as *const [u8; N]) })
    }

    #[inline(always)]
    fn write<const N: usize>(&mut self, offset: usize, bytes: [u8; N]) -> Option<()> {
        let at = self.ptr_at(offset, N)?;
        unsafe { ptr::write_unaligned(at as *mut [u8; N], bytes) };
        Some(())
    }
}
