//! Error types for dfumap-core
//!
//! Only structural failures are errors. Problems with individual entries of
//! a descriptor are reported as [`Diagnostic`](crate::Diagnostic)s and do
//! not abort parsing.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Descriptor errors
    /// The descriptor does not start with `@` followed by an interface name
    InvalidHeader,

    // Catalogue errors
    /// Storage for another segment could not be allocated
    OutOfMemory,
    /// The segment has `start > end`, a zero page size or no permissions
    InvalidSegment,

    // Address errors
    /// No segment covers the given address
    AddressNotMapped(u32),
    /// A zero-length range was requested
    EmptyRange,
    /// The requested range runs past the end of the 32-bit address space
    RangeOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHeader => write!(f, "could not read interface name from descriptor"),
            Self::OutOfMemory => write!(f, "cannot allocate memory for segment"),
            Self::InvalidSegment => write!(f, "invalid memory segment"),
            Self::AddressNotMapped(addr) => {
                write!(f, "address 0x{:08x} is not in any memory segment", addr)
            }
            Self::EmptyRange => write!(f, "empty address range"),
            Self::RangeOverflow => write!(f, "address range exceeds 32-bit address space"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
