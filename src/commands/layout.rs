//! Layout command implementations

use dfumap_core::{Chunk, MemSegment, MemoryLayout, ParseOptions};
use std::fs;
use std::path::Path;

use crate::cli::{DescriptorArgs, TransferMode};
use crate::error::{CliError, Result};

/// Show the segments of every given descriptor
pub fn cmd_show(input: &DescriptorArgs, options: &ParseOptions) -> Result<()> {
    let descriptors = load_descriptors(&input.descriptors, input.file.as_deref())?;

    for (alt, descriptor) in descriptors.iter().enumerate() {
        if alt > 0 {
            println!();
        }
        let layout = parse(descriptor, options)?;
        print_layout(alt, &layout);
    }

    Ok(())
}

/// Look up the segment holding `address`
pub fn cmd_find(descriptor: &str, address: u32, options: &ParseOptions) -> Result<()> {
    let layout = parse(descriptor, options)?;
    let segment = layout
        .find_segment(address)
        .ok_or(CliError::NotMapped(address))?;

    println!("Address:  0x{:08x}", address);
    println!("Segment:  0x{:08x} - 0x{:08x}", segment.start, segment.end);
    println!(
        "Page:     0x{:08x} ({})",
        segment.page_start(address),
        format_size(u64::from(segment.page_size))
    );
    println!("Access:   {}", segment.memtype);

    Ok(())
}

/// Split a range across segments and check each chunk's permissions
pub fn cmd_split(
    descriptor: &str,
    address: u32,
    length: u32,
    mode: TransferMode,
    show_pages: bool,
    options: &ParseOptions,
) -> Result<()> {
    let layout = parse(descriptor, options)?;
    let chunks = layout.segments.split_range(address, length)?;

    println!(
        "{:>10} {:>10} {:>10} {:>10} {:>6}",
        "Start", "End", "Size", "Page", "Access"
    );
    println!("{:-<50}", "");
    for chunk in &chunks {
        println!(
            "{:#010x} {:#010x} {:>10} {:>10} {:>6}",
            chunk.address,
            chunk.end(),
            format_size(u64::from(chunk.length)),
            format_size(u64::from(chunk.segment.page_size)),
            chunk.segment.memtype.to_string()
        );
        if show_pages {
            for page in chunk.pages() {
                println!("    page 0x{:08x}", page);
            }
        }
    }

    check_permissions(&chunks, mode)
}

/// Fail on the first chunk whose segment lacks the permission `mode` needs
fn check_permissions(chunks: &[Chunk], mode: TransferMode) -> Result<()> {
    let (allowed, needed): (fn(&MemSegment) -> bool, _) = match mode {
        TransferMode::Download => (MemSegment::is_writable, "writable"),
        TransferMode::Upload => (MemSegment::is_readable, "readable"),
    };

    for chunk in chunks {
        if !allowed(&chunk.segment) {
            return Err(CliError::Permission {
                address: chunk.segment.start,
                needed,
            });
        }
        if mode == TransferMode::Download && !chunk.segment.is_erasable() {
            log::warn!(
                "Segment at 0x{:08x} is not erasable, writing without erase",
                chunk.segment.start
            );
        }
    }
    Ok(())
}

fn parse(descriptor: &str, options: &ParseOptions) -> Result<MemoryLayout> {
    let layout = MemoryLayout::from_descriptor(descriptor, options).map_err(|source| {
        CliError::Descriptor {
            descriptor: descriptor.to_string(),
            source,
        }
    })?;

    if layout.skipped() > 0 {
        log::warn!(
            "Skipped {} of {} entries in \"{}\"",
            layout.skipped(),
            layout.entries,
            layout.name
        );
    }
    Ok(layout)
}

/// Collect descriptors from the command line and an optional file
fn load_descriptors(descriptors: &[String], file: Option<&Path>) -> Result<Vec<String>> {
    let mut all = descriptors.to_vec();

    if let Some(path) = file {
        let content = fs::read_to_string(path).map_err(|source| CliError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        all.extend(
            content
                .lines()
                .filter(|line| !line.trim().is_empty())
                .map(str::to_string),
        );
        log::debug!("Read descriptors from {}", path.display());
    }

    if all.is_empty() {
        return Err(CliError::NoDescriptor);
    }
    Ok(all)
}

/// Print layout information
pub fn print_layout(alt: usize, layout: &MemoryLayout) {
    println!("Alternate setting {}: \"{}\"", alt, layout.name);
    println!("Segments ({}):", layout.segments.len());
    println!(
        "{:>10} {:>10} {:>8} {:>10} {:>10} {:>6}",
        "Start", "End", "Pages", "Page", "Size", "Access"
    );
    println!("{:-<59}", "");

    for segment in &layout.segments {
        println!(
            "{:#010x} {:#010x} {:>8} {:>10} {:>10} {:>6}",
            segment.start,
            segment.end,
            segment.sectors(),
            format_size(u64::from(segment.page_size)),
            format_size(segment.size()),
            segment.memtype.to_string()
        );
    }

    let skipped = skipped_entries(layout);
    if !skipped.is_empty() {
        println!("Skipped entries: {}", skipped.join(", "));
    }
}

/// Indices of the entries dropped from the layout
///
/// The diagnostics themselves were already logged while parsing.
fn skipped_entries(layout: &MemoryLayout) -> Vec<String> {
    layout
        .diagnostics
        .iter()
        .filter(|d| d.skips_entry())
        .map(|d| d.entry().to_string())
        .collect()
}

/// Format a size as human-readable string
fn format_size(bytes: u64) -> String {
    if bytes >= 1024 * 1024 && bytes % (1024 * 1024) == 0 {
        format!("{} MiB", bytes / (1024 * 1024))
    } else if bytes >= 1024 && bytes % 1024 == 0 {
        format!("{} KiB", bytes / 1024)
    } else {
        format!("{} B", bytes)
    }
}
