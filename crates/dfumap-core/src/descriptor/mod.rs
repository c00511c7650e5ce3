//! DfuSe descriptor parsing
//!
//! DfuSe devices expose one alternate setting per memory target, and the
//! string descriptor of each alternate setting encodes that target's
//! memory map:
//!
//! ```text
//! @Internal Flash  /0x08000000/04*016Kg,01*064Kg,07*128Kg
//! ```
//!
//! [`parse_memory_layout`] turns such a string into a [`MemoryLayout`].
//! Only a missing interface name is fatal; malformed entries are skipped
//! and reported as [`Diagnostic`]s.

mod cursor;
mod diag;
mod parser;

use alloc::string::String;
use alloc::vec::Vec;

use crate::error::Result;
use crate::segment::{MemSegment, SegmentList};

pub use diag::Diagnostic;
pub use parser::parse_memory_layout;

/// Options for [`parse_memory_layout`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Log a summary line for every accepted segment at info level
    pub verbose: bool,
}

impl ParseOptions {
    /// Default options (quiet)
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable per-segment summaries
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

/// The memory map of one DfuSe alternate setting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryLayout {
    /// Interface name, everything between `@` and the first `/`
    pub name: String,
    /// Segments in descriptor order
    pub segments: SegmentList,
    /// Problems found in individual entries, in descriptor order
    pub diagnostics: Vec<Diagnostic>,
    /// Number of entries that were parsed, including skipped ones
    pub entries: usize,
}

impl MemoryLayout {
    /// Create an empty layout for the named interface
    pub fn new(name: String) -> Self {
        Self {
            name,
            segments: SegmentList::new(),
            diagnostics: Vec::new(),
            entries: 0,
        }
    }

    /// Parse a layout from a descriptor string
    pub fn from_descriptor(descriptor: &str, options: &ParseOptions) -> Result<Self> {
        parse_memory_layout(descriptor, options)
    }

    /// Find the first segment containing `addr`
    pub fn find_segment(&self, addr: u32) -> Option<&MemSegment> {
        self.segments.find_segment(addr)
    }

    /// Number of entries that were dropped
    pub fn skipped(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.skips_entry()).count()
    }
}
