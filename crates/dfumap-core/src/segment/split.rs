//! Splitting address ranges across segments
//!
//! A firmware image rarely lines up with a single segment. Before
//! downloading, the image range is cut into [`Chunk`]s that each lie within
//! one segment, so every piece can be checked against that segment's
//! permissions and erased page by page.

use alloc::vec::Vec;

use super::{MemSegment, SegmentList};
use crate::error::{Error, Result};

/// The part of an address range that falls within one segment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// First address of the chunk
    pub address: u32,
    /// Length of the chunk in bytes
    pub length: u32,
    /// The segment holding the chunk
    pub segment: MemSegment,
}

impl Chunk {
    /// Last address of the chunk (inclusive)
    pub fn end(&self) -> u32 {
        self.address + (self.length - 1)
    }

    /// Start addresses of every page the chunk touches
    pub fn pages(&self) -> impl Iterator<Item = u32> + '_ {
        let first = self.segment.page_start(self.address);
        let last = self.segment.page_start(self.end());
        let step = self.segment.page_size.max(1) as usize;
        (u64::from(first)..=u64::from(last))
            .step_by(step)
            .map(|page| page as u32)
    }
}

impl SegmentList {
    /// Split `[address, address + length)` into per-segment chunks
    ///
    /// At each position the segment found by
    /// [`find_segment`](SegmentList::find_segment) is used, so overlapping
    /// segments resolve to the first inserted one. Fails on the first
    /// address not covered by any segment.
    pub fn split_range(&self, address: u32, length: u32) -> Result<Vec<Chunk>> {
        if length == 0 {
            return Err(Error::EmptyRange);
        }
        let last = address
            .checked_add(length - 1)
            .ok_or(Error::RangeOverflow)?;

        let mut chunks = Vec::new();
        let mut cursor = address;
        loop {
            let segment = self
                .find_segment(cursor)
                .ok_or(Error::AddressNotMapped(cursor))?;
            let chunk_end = segment.end.min(last);

            log::trace!(
                "Chunk 0x{:08x}-0x{:08x} in segment at 0x{:08x}",
                cursor,
                chunk_end,
                segment.start
            );
            chunks.push(Chunk {
                address: cursor,
                length: chunk_end - cursor + 1,
                segment: *segment,
            });

            if chunk_end == last {
                return Ok(chunks);
            }
            cursor = chunk_end + 1;
        }
    }
}
