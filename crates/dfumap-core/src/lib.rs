//! dfumap-core - DfuSe memory layout parsing
//!
//! DfuSe devices describe their flash memory in the string descriptor of
//! each alternate setting, for example:
//!
//! ```text
//! @Internal Flash  /0x08000000/04*016Kg,01*064Kg,07*128Kg
//! ```
//!
//! This crate parses such descriptors into a [`SegmentList`] of
//! [`MemSegment`]s (address range, page size and permissions) that callers
//! can query before downloading or uploading firmware. It is `no_std`
//! compatible but requires an allocator.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for [`Error`]
//!
//! # Example
//!
//! ```
//! use dfumap_core::{parse_memory_layout, ParseOptions};
//!
//! let layout = parse_memory_layout(
//!     "@Internal Flash  /0x08000000/04*016Kg,01*064Kg",
//!     &ParseOptions::new(),
//! )
//! .unwrap();
//!
//! let segment = layout.segments.find_segment(0x0801_0000).unwrap();
//! assert_eq!(segment.page_size, 64 * 1024);
//! assert!(segment.is_writable());
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod descriptor;
pub mod error;
pub mod segment;

pub use descriptor::{parse_memory_layout, Diagnostic, MemoryLayout, ParseOptions};
pub use error::{Error, Result};
pub use segment::{Chunk, MemSegment, MemType, SegmentList};
