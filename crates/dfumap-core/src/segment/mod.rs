//! DfuSe memory segments
//!
//! A [`SegmentList`] is the catalogue of memory segments a device declares.
//! It is filled once by the descriptor parser and only read afterwards:
//!
//! ```ignore
//! let layout = parse_memory_layout(descriptor, &ParseOptions::new())?;
//! if let Some(segment) = layout.segments.find_segment(address) {
//!     println!("{} bytes per page", segment.page_size);
//! }
//! ```

mod split;
mod types;

pub use split::Chunk;
pub use types::*;
