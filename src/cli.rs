//! CLI argument parsing

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

#[derive(Parser)]
#[command(name = "dfumap")]
#[command(author, version, about = "DfuSe memory layout inspector", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv); -v also prints every parsed segment
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where descriptor strings come from
#[derive(clap::Args, Debug, Clone, Default)]
pub struct DescriptorArgs {
    /// Descriptor strings, e.g. "@Internal Flash  /0x08000000/04*016Kg"
    pub descriptors: Vec<String>,

    /// Read descriptors from a file, one per line
    #[arg(short, long)]
    pub file: Option<PathBuf>,
}

/// Direction of a planned transfer
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    /// Host to device; segments must be writable
    #[default]
    Download,
    /// Device to host; segments must be readable
    Upload,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse descriptors and show their memory segments
    Show {
        #[command(flatten)]
        input: DescriptorArgs,
    },

    /// Find the segment holding an address
    Find {
        /// Descriptor string
        descriptor: String,

        /// Address to look up (hex, e.g., 0x08004000)
        #[arg(value_parser = parse_hex_u32)]
        address: u32,
    },

    /// Split an address range across the segments of a descriptor
    Split {
        /// Descriptor string
        descriptor: String,

        /// Start address of the range (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        address: u32,

        /// Length of the range in bytes (hex or decimal)
        #[arg(short, long, value_parser = parse_hex_u32)]
        length: u32,

        /// Permission every chunk must have
        #[arg(short, long, value_enum, default_value_t = TransferMode::Download)]
        mode: TransferMode,

        /// List the pages each chunk touches
        #[arg(long)]
        pages: bool,
    },
}
