//! Segment types
//!
//! Core types for DfuSe memory segments.

use alloc::vec::Vec;
use core::fmt;

use bitflags::bitflags;

use crate::error::{Error, Result};

bitflags! {
    /// Access permissions of a memory segment
    ///
    /// The bit values are those of the DfuSe type character: the low three
    /// bits of `'a'`..`'g'` select the permissions.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MemType: u8 {
        /// Segment can be read (uploaded)
        const READABLE = 1 << 0;
        /// Segment can be erased
        const ERASABLE = 1 << 1;
        /// Segment can be written (downloaded)
        const WRITABLE = 1 << 2;
    }
}

impl MemType {
    /// Decode the permissions encoded by a DfuSe type character
    ///
    /// Only the low three bits of the character code are significant, so
    /// `'g'` (0x67) is readable, erasable and writable, while `'h'` (0x68)
    /// carries no permissions at all.
    pub fn from_type_char(c: char) -> Self {
        Self::from_bits_truncate((u32::from(c) & 0x7) as u8)
    }
}

impl Default for MemType {
    fn default() -> Self {
        MemType::empty()
    }
}

impl fmt::Display for MemType {
    /// Compact `rew` rendering, `-` for missing permissions
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = |set: bool, c: char| if set { c } else { '-' };
        write!(
            f,
            "{}{}{}",
            flag(self.contains(Self::READABLE), 'r'),
            flag(self.contains(Self::ERASABLE), 'e'),
            flag(self.contains(Self::WRITABLE), 'w')
        )
    }
}

/// A contiguous flash region with uniform page size and permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemSegment {
    /// Start address (inclusive)
    pub start: u32,
    /// End address (inclusive)
    pub end: u32,
    /// Erase/write granularity in bytes
    pub page_size: u32,
    /// Access permissions
    pub memtype: MemType,
}

impl MemSegment {
    /// Size of this segment in bytes
    ///
    /// Returned as `u64` since a segment may cover the whole 32-bit space.
    pub fn size(&self) -> u64 {
        u64::from(self.end.saturating_sub(self.start)) + 1
    }

    /// Number of pages in this segment
    pub fn sectors(&self) -> u64 {
        self.size()
            .checked_div(u64::from(self.page_size))
            .unwrap_or(0)
    }

    /// Check if an address is within this segment
    pub fn contains(&self, addr: u32) -> bool {
        addr >= self.start && addr <= self.end
    }

    /// Start address of the page holding `addr`
    ///
    /// Pages are aligned to `page_size` relative to address 0, so the first
    /// page of a segment with an unaligned start begins below `start`.
    pub fn page_start(&self, addr: u32) -> u32 {
        addr - addr.checked_rem(self.page_size).unwrap_or(0)
    }

    /// Whether the segment satisfies `start <= end`, has a page size and
    /// grants at least one permission
    pub fn is_valid(&self) -> bool {
        self.start <= self.end && self.page_size > 0 && !self.memtype.is_empty()
    }

    /// Whether the segment can be read
    pub fn is_readable(&self) -> bool {
        self.memtype.contains(MemType::READABLE)
    }

    /// Whether the segment can be erased
    pub fn is_erasable(&self) -> bool {
        self.memtype.contains(MemType::ERASABLE)
    }

    /// Whether the segment can be written
    pub fn is_writable(&self) -> bool {
        self.memtype.contains(MemType::WRITABLE)
    }
}

impl fmt::Display for MemSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:08x}-0x{:08x} {} x {} ({})",
            self.start,
            self.end,
            self.sectors(),
            self.page_size,
            self.memtype
        )
    }
}

/// An ordered collection of memory segments
///
/// Segments keep their insertion order and may overlap; lookups return the
/// first inserted match. Segments cannot be modified once added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentList {
    segments: Vec<MemSegment>,
}

impl SegmentList {
    /// Create a new empty list
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Append a segment at the tail
    ///
    /// Fails with [`Error::InvalidSegment`] if the segment is not
    /// [valid](MemSegment::is_valid), and with [`Error::OutOfMemory`] if
    /// storage cannot be grown. The list is unchanged on failure.
    pub fn push(&mut self, segment: MemSegment) -> Result<()> {
        if !segment.is_valid() {
            return Err(Error::InvalidSegment);
        }
        self.segments
            .try_reserve(1)
            .map_err(|_| Error::OutOfMemory)?;
        self.segments.push(segment);
        Ok(())
    }

    /// Find the first segment containing `addr`
    pub fn find_segment(&self, addr: u32) -> Option<&MemSegment> {
        self.segments.iter().find(|s| s.contains(addr))
    }

    /// Get a segment by insertion index
    pub fn get(&self, index: usize) -> Option<&MemSegment> {
        self.segments.get(index)
    }

    /// Iterate over the segments in insertion order
    pub fn iter(&self) -> core::slice::Iter<'_, MemSegment> {
        self.segments.iter()
    }

    /// Get the number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the list is empty
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Release all segments at once
    ///
    /// Consumes the list, so a released list cannot be used or released
    /// again. Dropping the list has the same effect.
    pub fn release(self) {
        drop(self);
    }
}

impl<'a> IntoIterator for &'a SegmentList {
    type Item = &'a MemSegment;
    type IntoIter = core::slice::Iter<'a, MemSegment>;

    fn into_iter(self) -> Self::IntoIter {
        self.segments.iter()
    }
}
