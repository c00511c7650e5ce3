//! DfuSe descriptor parser
//!
//! Grammar of an alternate-setting descriptor:
//!
//! ```text
//! descriptor := '@' name block*
//! name       := one or more characters up to the next '/'
//! block      := '/' '0x' hexaddress '/' entry (',' entry)*
//! entry      := count '*' size multiplier [type]
//! ```
//!
//! Entries in a block are contiguous: each one starts where the previous
//! one ended. `count` pages of `size` bytes (scaled by the `B`, `K` or `M`
//! multiplier) make up a segment, and the type character selects its
//! permissions.

use alloc::borrow::ToOwned;
use alloc::string::ToString;
use alloc::vec::Vec;

use super::cursor::Cursor;
use super::{Diagnostic, MemoryLayout, ParseOptions};
use crate::error::{Error, Result};
use crate::segment::{MemSegment, MemType};

/// Tokens of one `count*size multiplier [type]` entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct EntryTokens<'a> {
    count: u32,
    size: u32,
    multiplier: char,
    type_token: Option<&'a str>,
}

/// Unit size multiplier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Multiplier {
    Bytes,
    Kilo,
    Mega,
}

impl Multiplier {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'B' => Some(Self::Bytes),
            'K' => Some(Self::Kilo),
            'M' => Some(Self::Mega),
            _ => None,
        }
    }

    fn scale(self) -> u64 {
        match self {
            Self::Bytes => 1,
            Self::Kilo => 1024,
            Self::Mega => 1024 * 1024,
        }
    }
}

/// Multiplier and type of an entry after disambiguation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Resolution {
    scale: u64,
    /// `None` if the entry has no usable type and must be skipped
    type_char: Option<char>,
}

/// Letters that name a memory type, `'a'` (readable) to `'g'` (all)
fn is_type_letter(c: char) -> bool {
    ('a'..='g').contains(&c)
}

/// Parse a DfuSe descriptor into a memory layout
///
/// Fails with [`Error::InvalidHeader`] if the descriptor does not start with
/// `@` and an interface name, and with [`Error::OutOfMemory`] if the segment
/// list cannot grow. Invalid entries are skipped and reported in
/// [`MemoryLayout::diagnostics`].
pub fn parse_memory_layout(descriptor: &str, options: &ParseOptions) -> Result<MemoryLayout> {
    let mut cursor = Cursor::new(descriptor);

    let name = lex_name(&mut cursor).ok_or_else(|| {
        log::debug!("No interface name in descriptor \"{}\"", descriptor);
        Error::InvalidHeader
    })?;
    log::info!("DfuSe interface name: \"{}\"", name);

    let mut parser = Parser {
        options,
        layout: MemoryLayout::new(name.to_owned()),
    };
    while let Some(address) = lex_block_address(&mut cursor) {
        parser.parse_block(&mut cursor, address)?;
    }

    Ok(parser.layout)
}

/// `'@' name`
fn lex_name<'a>(cursor: &mut Cursor<'a>) -> Option<&'a str> {
    cursor.attempt(|c| {
        if !c.eat('@') {
            return None;
        }
        let name = c.take_until(&['/']);
        (!name.is_empty()).then_some(name)
    })
}

/// `'/' '0x' hexaddress '/'`
fn lex_block_address(cursor: &mut Cursor<'_>) -> Option<u32> {
    cursor.attempt(|c| {
        if !(c.eat('/') && c.eat('0') && c.eat('x')) {
            return None;
        }
        let address = c.hex()?;
        c.eat('/').then_some(address)
    })
}

/// `count '*' size multiplier [type]`
///
/// The multiplier is any single character, and the type token is whatever
/// follows it up to the next `,` or `/`.
fn lex_entry<'a>(cursor: &mut Cursor<'a>) -> Option<EntryTokens<'a>> {
    cursor.attempt(|c| {
        let count = c.decimal()?;
        if !c.eat('*') {
            return None;
        }
        let size = c.decimal()?;
        let multiplier = c.bump()?;
        let type_token = c.take_until(&[',', '/']);
        Some(EntryTokens {
            count,
            size,
            multiplier,
            type_token: (!type_token.is_empty()).then_some(type_token),
        })
    })
}

/// Decide what the multiplier character and type token of an entry mean
///
/// An explicit type token must be exactly one byte. A type letter in
/// multiplier position is taken as the type when no explicit type follows;
/// otherwise an unknown multiplier leaves the size in bytes.
fn resolve_entry(
    entry: usize,
    multiplier: char,
    type_token: Option<&str>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Resolution {
    let mut type_char = None;

    if let Some(token) = type_token {
        // One byte, so a multi-byte character is rejected too
        match token.as_bytes() {
            &[b] => type_char = Some(char::from(b)),
            _ => {
                diagnostics.push(Diagnostic::InvalidTypeToken {
                    entry,
                    token: token.to_string(),
                });
                return Resolution {
                    scale: Multiplier::from_char(multiplier).map_or(1, Multiplier::scale),
                    type_char: None,
                };
            }
        }
    }

    let scale = match Multiplier::from_char(multiplier) {
        Some(m) => m.scale(),
        None if is_type_letter(multiplier) && type_char.is_none() => {
            diagnostics.push(Diagnostic::MultiplierAsType { entry, multiplier });
            type_char = Some(multiplier);
            1
        }
        None => {
            diagnostics.push(Diagnostic::InvalidMultiplier { entry, multiplier });
            1
        }
    };

    if type_char.is_none() {
        diagnostics.push(Diagnostic::MissingType { entry });
    }

    Resolution { scale, type_char }
}

/// Build the segment for a resolved entry
///
/// `address`, `unit` and `total` are 64-bit; anything past the 32-bit
/// address space is rejected.
fn make_segment(
    entry: usize,
    type_char: char,
    address: u64,
    unit: u64,
    total: u64,
) -> core::result::Result<MemSegment, Diagnostic> {
    let memtype = MemType::from_type_char(type_char);
    if memtype.is_empty() {
        return Err(Diagnostic::NoPermissions { entry, type_char });
    }
    if total == 0 {
        return Err(Diagnostic::EmptySegment { entry });
    }

    let end = address.saturating_add(total - 1);
    match (u32::try_from(address), u32::try_from(end), u32::try_from(unit)) {
        (Ok(start), Ok(end), Ok(page_size)) => Ok(MemSegment {
            start,
            end,
            page_size,
            memtype,
        }),
        _ => Err(Diagnostic::OutOfAddressSpace { entry }),
    }
}

struct Parser<'o> {
    options: &'o ParseOptions,
    layout: MemoryLayout,
}

impl Parser<'_> {
    fn parse_block(&mut self, cursor: &mut Cursor<'_>, address: u32) -> Result<()> {
        // Entries may run past 4 GiB
        let mut address = u64::from(address);

        while let Some(tokens) = lex_entry(cursor) {
            self.layout.entries += 1;
            address = self.add_entry(self.layout.entries, address, &tokens)?;

            if !cursor.eat(',') {
                break;
            }
        }
        Ok(())
    }

    /// Turn one entry into a segment, returning the address of the next entry
    fn add_entry(&mut self, entry: usize, address: u64, tokens: &EntryTokens<'_>) -> Result<u64> {
        let first_diag = self.layout.diagnostics.len();
        let resolution = resolve_entry(
            entry,
            tokens.multiplier,
            tokens.type_token,
            &mut self.layout.diagnostics,
        );

        let unit = u64::from(tokens.size) * resolution.scale;
        let total = u64::from(tokens.count).saturating_mul(unit);
        let next = address.saturating_add(total);

        for diagnostic in &self.layout.diagnostics[first_diag..] {
            log::warn!("{}", diagnostic);
        }

        if let Some(type_char) = resolution.type_char {
            match make_segment(entry, type_char, address, unit, total) {
                Ok(segment) => {
                    self.layout.segments.push(segment)?;
                    self.report_segment(&segment, tokens.count, total);
                }
                Err(diagnostic) => {
                    log::warn!("{}", diagnostic);
                    self.layout.diagnostics.push(diagnostic);
                }
            }
        }

        Ok(next)
    }

    fn report_segment(&self, segment: &MemSegment, count: u32, total: u64) {
        if self.options.verbose {
            log::info!(
                "Memory segment at 0x{:08x} {:3} x {:4} = {:5} ({})",
                segment.start,
                count,
                segment.page_size,
                total,
                segment.memtype
            );
        } else {
            log::trace!("Memory segment {}", segment);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::SegmentList;
    use alloc::vec;

    fn parse(descriptor: &str) -> MemoryLayout {
        parse_memory_layout(descriptor, &ParseOptions::new()).unwrap()
    }

    fn starts(segments: &SegmentList) -> Vec<u32> {
        segments.iter().map(|s| s.start).collect()
    }

    #[test]
    fn test_fake_descriptor() {
        let layout = parse("@fake /0x08000000/12*001Ka,11*001Kg,9*2Ka,24*4Kg");
        assert_eq!(layout.name, "fake ");
        assert_eq!(layout.segments.len(), 4);
        assert!(layout.diagnostics.is_empty());

        let base = 0x0800_0000u32;
        let s1_start = base;
        let s2_start = s1_start + 12 * 1024;
        let s3_start = s2_start + 11 * 1024;
        let s4_start = s3_start + 9 * 2 * 1024;
        let expected = [
            (s1_start, 12, 1024, MemType::READABLE),
            (s2_start, 11, 1024, MemType::all()),
            (s3_start, 9, 2 * 1024, MemType::READABLE),
            (s4_start, 24, 4 * 1024, MemType::all()),
        ];

        for (segment, (start, count, unit, memtype)) in layout.segments.iter().zip(expected) {
            assert_eq!(segment.start, start);
            assert_eq!(segment.end, start + count * unit - 1);
            assert_eq!(segment.page_size, unit);
            assert_eq!(segment.memtype, memtype);
            assert_eq!(segment.sectors(), u64::from(count));
        }
    }

    #[test]
    fn test_stm32f4_internal_flash() {
        let layout = parse("@Internal Flash  /0x08000000/04*016Kg,01*064Kg,07*128Kg");
        assert_eq!(layout.name, "Internal Flash  ");
        assert_eq!(layout.entries, 3);
        assert_eq!(
            starts(&layout.segments),
            vec![0x0800_0000, 0x0801_0000, 0x0802_0000]
        );
        let last = layout.segments.get(2).unwrap();
        assert_eq!(last.end, 0x080F_FFFF);
        assert_eq!(last.page_size, 128 * 1024);
    }

    #[test]
    fn test_multiple_blocks() {
        let layout = parse("@Option Bytes  /0x1FFFC000/01*016 e/0x1FFEC000/01*016 e");
        assert_eq!(starts(&layout.segments), vec![0x1FFF_C000, 0x1FFE_C000]);
        for segment in &layout.segments {
            // ' ' is not a multiplier, so the size stays in bytes
            assert_eq!(segment.page_size, 16);
            assert_eq!(segment.memtype, MemType::READABLE | MemType::WRITABLE);
        }
        assert_eq!(
            layout.diagnostics,
            vec![
                Diagnostic::InvalidMultiplier {
                    entry: 1,
                    multiplier: ' '
                },
                Diagnostic::InvalidMultiplier {
                    entry: 2,
                    multiplier: ' '
                },
            ]
        );
    }

    #[test]
    fn test_multiplier_used_as_type() {
        let layout = parse("@Flash /0x08000000/2*256a,4*1Kg");
        assert_eq!(layout.segments.len(), 2);
        let first = layout.segments.get(0).unwrap();
        assert_eq!(first.page_size, 256);
        assert_eq!(first.end, 0x0800_01FF);
        assert_eq!(first.memtype, MemType::READABLE);
        assert_eq!(layout.segments.get(1).unwrap().start, 0x0800_0200);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::MultiplierAsType {
                entry: 1,
                multiplier: 'a'
            }]
        );
    }

    #[test]
    fn test_type_letter_multiplier_with_explicit_type() {
        let layout = parse("@Flash /0x1000/2*16ag");
        let segment = layout.segments.get(0).unwrap();
        assert_eq!(segment.page_size, 16);
        assert_eq!(segment.memtype, MemType::all());
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::InvalidMultiplier {
                entry: 1,
                multiplier: 'a'
            }]
        );
    }

    #[test]
    fn test_unknown_multiplier_without_type_is_skipped() {
        let layout = parse("@Flash /0x1000/4*1X,2*1Kg");
        assert_eq!(layout.entries, 2);
        assert_eq!(layout.segments.len(), 1);
        // The skipped entry still occupies its 4 bytes
        assert_eq!(layout.segments.get(0).unwrap().start, 0x1004);
        assert_eq!(
            layout.diagnostics,
            vec![
                Diagnostic::InvalidMultiplier {
                    entry: 1,
                    multiplier: 'X'
                },
                Diagnostic::MissingType { entry: 1 },
            ]
        );
        assert_eq!(layout.skipped(), 1);
    }

    #[test]
    fn test_invalid_type_token_is_skipped() {
        let layout = parse("@Flash /0x1000/1*1Kgg,1*1Ka");
        assert_eq!(layout.segments.len(), 1);
        let segment = layout.segments.get(0).unwrap();
        assert_eq!(segment.start, 0x1400);
        assert_eq!(segment.memtype, MemType::READABLE);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::InvalidTypeToken {
                entry: 1,
                token: "gg".to_string()
            }]
        );
    }

    #[test]
    fn test_type_without_permissions_is_skipped() {
        let layout = parse("@Flash /0x1000/1*1Kh,1*1Kb");
        assert_eq!(layout.segments.len(), 1);
        assert_eq!(layout.segments.get(0).unwrap().memtype, MemType::ERASABLE);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::NoPermissions {
                entry: 1,
                type_char: 'h'
            }]
        );
    }

    #[test]
    fn test_zero_size_is_skipped() {
        let layout = parse("@Flash /0x1000/0*1Kg,1*0Kg,1*1Kg");
        assert_eq!(layout.entries, 3);
        assert_eq!(layout.segments.len(), 1);
        assert_eq!(layout.segments.get(0).unwrap().start, 0x1000);
        assert_eq!(layout.skipped(), 2);
    }

    #[test]
    fn test_address_space_overflow() {
        let layout = parse("@Flash /0xFFFFF000/1*4Kg,1*4Kg");
        assert_eq!(layout.segments.len(), 1);
        assert_eq!(layout.segments.get(0).unwrap().end, u32::MAX);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::OutOfAddressSpace { entry: 2 }]
        );

        let layout = parse("@Flash /0x0/1*8192Mg");
        assert!(layout.segments.is_empty());
        assert_eq!(layout.skipped(), 1);
    }

    #[test]
    fn test_whitespace_before_numbers() {
        let layout = parse("@Flash /0x 8000/ 2* 4Kg, 1*8Ka");
        assert_eq!(starts(&layout.segments), vec![0x8000, 0xA000]);
    }

    #[test]
    fn test_block_ends_on_garbage() {
        let layout = parse("@Flash /0x1000/1*1Kg;1*1Kg/0x2000/1*1Ka");
        // Everything up to the next '/' is taken as the first type token
        assert_eq!(layout.entries, 2);
        assert_eq!(starts(&layout.segments), vec![0x2000]);

        let layout = parse("@Flash /0x1000/1*1Kg,junk/0x2000/1*1Ka");
        assert_eq!(starts(&layout.segments), vec![0x1000]);
    }

    #[test]
    fn test_block_marker_requires_closing_slash() {
        let layout = parse("@Flash /0x1000");
        assert!(layout.segments.is_empty());
        assert_eq!(layout.entries, 0);
    }

    #[test]
    fn test_name_only() {
        let layout = parse("@Bootloader");
        assert_eq!(layout.name, "Bootloader");
        assert!(layout.segments.is_empty());
    }

    #[test]
    fn test_invalid_header() {
        let opts = ParseOptions::new();
        assert_eq!(
            parse_memory_layout("fake /0x08000000/12*001Ka", &opts),
            Err(Error::InvalidHeader)
        );
        assert_eq!(parse_memory_layout("", &opts), Err(Error::InvalidHeader));
        assert_eq!(
            parse_memory_layout("@/0x08000000/12*001Ka", &opts),
            Err(Error::InvalidHeader)
        );
    }

    #[test]
    fn test_entries_minus_skipped_equals_segments() {
        for descriptor in [
            "@fake /0x08000000/12*001Ka,11*001Kg,9*2Ka,24*4Kg",
            "@Flash /0x1000/4*1X,2*1Kg,1*1Kgg,3*2Bz,1*1Kh",
            "@Flash /0x1000/1*1Ka/0x2000/0*1Kg,1*1 e/0x3000/2*2Kab",
        ] {
            let layout = parse(descriptor);
            assert_eq!(
                layout.entries - layout.skipped(),
                layout.segments.len(),
                "{}",
                descriptor
            );
        }
    }

    #[test]
    fn test_verbose_does_not_change_result() {
        let descriptor = "@Internal Flash  /0x08000000/04*016Kg,01*064Kg,07*128Kg";
        let quiet = parse_memory_layout(descriptor, &ParseOptions::new()).unwrap();
        let verbose = parse_memory_layout(descriptor, &ParseOptions::new().verbose(true)).unwrap();
        assert_eq!(quiet, verbose);
    }

    #[test]
    fn test_resolve_entry_rules() {
        let mut diags = Vec::new();

        let r = resolve_entry(1, 'K', Some("g"), &mut diags);
        assert_eq!(r, Resolution { scale: 1024, type_char: Some('g') });

        let r = resolve_entry(1, 'M', Some("a"), &mut diags);
        assert_eq!(r.scale, 1024 * 1024);

        let r = resolve_entry(1, 'B', Some("e"), &mut diags);
        assert_eq!(r.scale, 1);
        assert!(diags.is_empty());

        for letter in 'a'..='g' {
            let r = resolve_entry(2, letter, None, &mut diags);
            assert_eq!(r, Resolution { scale: 1, type_char: Some(letter) });
        }
        assert_eq!(diags.len(), 7);
        diags.clear();

        let r = resolve_entry(3, 'h', None, &mut diags);
        assert_eq!(r.type_char, None);
        assert_eq!(
            diags,
            vec![
                Diagnostic::InvalidMultiplier {
                    entry: 3,
                    multiplier: 'h'
                },
                Diagnostic::MissingType { entry: 3 },
            ]
        );
        diags.clear();

        let r = resolve_entry(4, 'K', Some("ab"), &mut diags);
        assert_eq!(r, Resolution { scale: 1024, type_char: None });
        assert_eq!(diags.len(), 1);
        assert!(diags[0].skips_entry());
        assert_eq!(diags[0].entry(), 4);
    }

    #[test]
    fn test_multibyte_type_token_is_skipped() {
        let layout = parse("@Flash /0x1000/1*1K\u{e9},1*1Ka");
        assert_eq!(starts(&layout.segments), vec![0x1400]);
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::InvalidTypeToken {
                entry: 1,
                token: "\u{e9}".to_string()
            }]
        );
        assert_eq!(layout.diagnostics[0].entry(), 1);
    }

    #[test]
    fn test_lex_entry_rewinds_on_mismatch() {
        let mut cursor = Cursor::new("12*");
        assert_eq!(lex_entry(&mut cursor), None);
        assert_eq!(cursor.rest(), "12*");

        let mut cursor = Cursor::new("12*4K/0x1");
        assert_eq!(
            lex_entry(&mut cursor),
            Some(EntryTokens {
                count: 12,
                size: 4,
                multiplier: 'K',
                type_token: None
            })
        );
        assert_eq!(cursor.rest(), "/0x1");
    }
}
