//! Parse diagnostics
//!
//! Problems with single entries never abort a parse. Each one is recorded
//! as a [`Diagnostic`] on the resulting layout and logged as a warning.

use alloc::string::String;
use core::fmt;

/// A non-fatal problem found while parsing a descriptor entry
///
/// `entry` is the 1-based index of the entry across the whole descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The type token after the multiplier is not a single character
    InvalidTypeToken {
        /// Entry index
        entry: usize,
        /// The rejected token
        token: String,
    },
    /// A type letter stood in the multiplier position and was used as type
    MultiplierAsType {
        /// Entry index
        entry: usize,
        /// The letter found
        multiplier: char,
    },
    /// Unknown multiplier, the unit size is taken as bytes
    InvalidMultiplier {
        /// Entry index
        entry: usize,
        /// The character found
        multiplier: char,
    },
    /// No type character could be determined
    MissingType {
        /// Entry index
        entry: usize,
    },
    /// The type character grants no permissions
    NoPermissions {
        /// Entry index
        entry: usize,
        /// The type character
        type_char: char,
    },
    /// The entry declares zero bytes
    EmptySegment {
        /// Entry index
        entry: usize,
    },
    /// The entry does not fit in the 32-bit address space
    OutOfAddressSpace {
        /// Entry index
        entry: usize,
    },
}

impl Diagnostic {
    /// Index of the entry this diagnostic refers to
    pub fn entry(&self) -> usize {
        match self {
            Self::InvalidTypeToken { entry, .. }
            | Self::MultiplierAsType { entry, .. }
            | Self::InvalidMultiplier { entry, .. }
            | Self::MissingType { entry }
            | Self::NoPermissions { entry, .. }
            | Self::EmptySegment { entry }
            | Self::OutOfAddressSpace { entry } => *entry,
        }
    }

    /// Whether the entry was dropped from the segment list
    pub fn skips_entry(&self) -> bool {
        !matches!(
            self,
            Self::MultiplierAsType { .. } | Self::InvalidMultiplier { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTypeToken { entry, token } => {
                write!(f, "segment {}: invalid type identifier '{}'", entry, token)
            }
            Self::MultiplierAsType { entry, multiplier } => write!(
                f,
                "segment {}: multiplier '{}' is not valid, using it as type identifier",
                entry, multiplier
            ),
            Self::InvalidMultiplier { entry, multiplier } => write!(
                f,
                "segment {}: multiplier '{}' is not valid, assuming bytes",
                entry, multiplier
            ),
            Self::MissingType { entry } => write!(f, "segment {}: no valid type", entry),
            Self::NoPermissions { entry, type_char } => write!(
                f,
                "segment {}: type '{}' grants no permissions",
                entry, type_char
            ),
            Self::EmptySegment { entry } => write!(f, "segment {}: zero size", entry),
            Self::OutOfAddressSpace { entry } => write!(
                f,
                "segment {}: exceeds 32-bit address space",
                entry
            ),
        }
    }
}
