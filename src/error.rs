//! Error types for the dfumap CLI

use thiserror::Error;

/// Errors reported by dfumap commands
#[derive(Debug, Error)]
pub enum CliError {
    /// Descriptor could not be parsed at all
    #[error("Failed to parse descriptor \"{descriptor}\": {source}")]
    Descriptor {
        descriptor: String,
        #[source]
        source: dfumap_core::Error,
    },

    /// Failed to read a descriptor file
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Neither descriptor strings nor a file were given
    #[error("No descriptor given. Pass descriptor strings or --file")]
    NoDescriptor,

    /// Address lookup found nothing
    #[error("Address 0x{0:08x} is not in any memory segment")]
    NotMapped(u32),

    /// A chunk lies in a segment without the required permission
    #[error("Segment at 0x{address:08x} is not {needed}")]
    Permission { address: u32, needed: &'static str },

    /// Range planning failed
    #[error(transparent)]
    Layout(#[from] dfumap_core::Error),
}

/// Result type for dfumap commands
pub type Result<T> = std::result::Result<T, CliError>;
