//! Fat/universal container structures.
//!
//! The fat header and its arch descriptors are always big-endian regardless
//! of the byte order of the embedded slices. Descriptors are 20 bytes in
//! 32-bit containers and 32 bytes (64-bit offset/size plus a reserved word)
//! in 64-bit ones.

use crate::error::{Result, Warning};
use crate::reader::{ByteOrder, SourceReader};

/// One arch descriptor from a fat header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FatArch {
    /// CPU type word.
    pub cputype: u32,
    /// CPU subtype word.
    pub cpusubtype: u32,
    /// Absolute offset of the slice within the container.
    pub offset: u64,
    /// Byte length of the slice.
    pub size: u64,
    /// Slice alignment as a power of two.
    pub align: u32,
}

/// Read the two-word fat header, returning `nfat_arch`. The reader must be
/// at offset 0; it is left at the first arch descriptor.
pub(crate) fn parse_fat_header(r: &mut SourceReader<'_>) -> Result<u32> {
    r.seek_abs(0);
    let _magic = r.read_u32(ByteOrder::Big)?;
    r.read_u32(ByteOrder::Big)
}

/// Read one arch descriptor at the reader's position.
pub(crate) fn parse_fat_arch(r: &mut SourceReader<'_>, is_64: bool) -> Result<FatArch> {
    let cputype = r.read_u32(ByteOrder::Big)?;
    let cpusubtype = r.read_u32(ByteOrder::Big)?;
    let (offset, size) = if is_64 {
        (r.read_u64(ByteOrder::Big)?, r.read_u64(ByteOrder::Big)?)
    } else {
        (
            r.read_u32(ByteOrder::Big)? as u64,
            r.read_u32(ByteOrder::Big)? as u64,
        )
    };
    let align = r.read_u32(ByteOrder::Big)?;
    if is_64 {
        let _reserved = r.read_u32(ByteOrder::Big)?;
    }
    Ok(FatArch {
        cputype,
        cpusubtype,
        offset,
        size,
        align,
    })
}

/// Report every pair of arch slices whose byte ranges overlap. Overlap is
/// not a decode failure; the container is still walked slice by slice.
pub(crate) fn detect_overlaps(arches: &[FatArch]) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for (i, a) in arches.iter().enumerate() {
        for (j, b) in arches.iter().enumerate().skip(i + 1) {
            let a_end = a.offset.saturating_add(a.size);
            let b_end = b.offset.saturating_add(b.size);
            if a.offset < b_end && b.offset < a_end && a.size > 0 && b.size > 0 {
                tracing::warn!(first = i, second = j, "fat slices overlap");
                warnings.push(Warning::OverlappingFatSlices {
                    first: i as u32,
                    second: j as u32,
                });
            }
        }
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_arch_32(out: &mut Vec<u8>, cputype: u32, offset: u32, size: u32, align: u32) {
        for word in [cputype, 3, offset, size, align] {
            out.extend(word.to_be_bytes());
        }
    }

    #[test]
    fn parses_fat_header_and_32_bit_arch() {
        let mut bytes = Vec::new();
        bytes.extend(0xcafebabeu32.to_be_bytes());
        bytes.extend(2u32.to_be_bytes());
        push_arch_32(&mut bytes, 0x0100_0007, 128, 256, 12);
        push_arch_32(&mut bytes, 0x0100_000c, 384, 256, 14);

        let mut r = SourceReader::new(&bytes);
        let nfat = parse_fat_header(&mut r).unwrap();
        assert_eq!(nfat, 2);

        let first = parse_fat_arch(&mut r, false).unwrap();
        assert_eq!(first.cputype, 0x0100_0007);
        assert_eq!(first.offset, 128);
        assert_eq!(first.size, 256);
        assert_eq!(first.align, 12);
        assert_eq!(r.tell(), 28);

        let second = parse_fat_arch(&mut r, false).unwrap();
        assert_eq!(second.offset, 384);
    }

    #[test]
    fn parses_64_bit_arch_with_reserved_word() {
        let mut bytes = Vec::new();
        bytes.extend(0x0100_000cu32.to_be_bytes());
        bytes.extend(0u32.to_be_bytes());
        bytes.extend(0x1_0000_0000u64.to_be_bytes());
        bytes.extend(0x4000u64.to_be_bytes());
        bytes.extend(14u32.to_be_bytes());
        bytes.extend(0u32.to_be_bytes()); // reserved

        let mut r = SourceReader::new(&bytes);
        let arch = parse_fat_arch(&mut r, true).unwrap();
        assert_eq!(arch.offset, 0x1_0000_0000);
        assert_eq!(arch.size, 0x4000);
        assert_eq!(r.tell(), 32);
    }

    #[test]
    fn disjoint_slices_produce_no_warning() {
        let arches = [
            FatArch {
                cputype: 7,
                cpusubtype: 3,
                offset: 128,
                size: 256,
                align: 12,
            },
            FatArch {
                cputype: 12,
                cpusubtype: 0,
                offset: 384,
                size: 256,
                align: 12,
            },
        ];
        assert!(detect_overlaps(&arches).is_empty());
    }

    #[test]
    fn overlapping_slices_are_reported_once_per_pair() {
        let arches = [
            FatArch {
                cputype: 7,
                cpusubtype: 3,
                offset: 128,
                size: 512,
                align: 12,
            },
            FatArch {
                cputype: 12,
                cpusubtype: 0,
                offset: 384,
                size: 256,
                align: 12,
            },
        ];
        assert_eq!(
            detect_overlaps(&arches),
            vec![Warning::OverlappingFatSlices {
                first: 0,
                second: 1,
            }]
        );
    }

    #[test]
    fn zero_sized_slices_never_overlap() {
        let arches = [
            FatArch {
                cputype: 7,
                cpusubtype: 3,
                offset: 128,
                size: 0,
                align: 12,
            },
            FatArch {
                cputype: 12,
                cpusubtype: 0,
                offset: 128,
                size: 256,
                align: 12,
            },
        ];
        assert!(detect_overlaps(&arches).is_empty());
    }
}
