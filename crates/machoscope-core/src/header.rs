//! Thin Mach-O header parsing.

use crate::error::{DecodeError, Result};
use crate::magic::MagicKind;
use crate::model::Header;
use crate::reader::{ByteOrder, SourceReader};

/// Byte size of a 32-bit mach_header.
pub const HEADER_SIZE_32: u64 = 28;
/// Byte size of a 64-bit mach_header_64.
pub const HEADER_SIZE_64: u64 = 32;

/// Everything fixed about a slice once its magic has been classified.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SliceSpec {
    /// Absolute offset of the slice within the source.
    pub base: u64,
    /// Byte order of every scalar in the slice.
    pub order: ByteOrder,
    /// Whether 64-bit layouts apply.
    pub is_64_bit: bool,
    /// Magic value to retain in the model.
    pub magic_raw: u32,
}

impl SliceSpec {
    pub(crate) fn new(base: u64, kind: MagicKind) -> Option<Self> {
        Some(Self {
            base,
            order: kind.byte_order()?,
            is_64_bit: kind.is_64_bit(),
            magic_raw: kind.raw(),
        })
    }
}

/// Parse the seven-word header (plus the reserved word in 64-bit mode),
/// leaving the reader positioned at the first load command.
///
/// `ncmds`/`sizeofcmds` values that cannot fit in the slice remainder are
/// rejected as [`DecodeError::InvalidEndianness`]: a byte-swapped read of a
/// sane header produces exactly this kind of absurdity.
pub(crate) fn parse_thin_header(r: &mut SourceReader<'_>, spec: &SliceSpec) -> Result<Header> {
    r.seek_abs(spec.base);
    let _magic = r.read_u32(spec.order)?;
    let cpu_type = r.read_u32(spec.order)?;
    let cpu_subtype = r.read_u32(spec.order)?;
    let file_type = r.read_u32(spec.order)?;
    let ncmds = r.read_u32(spec.order)?;
    let sizeofcmds = r.read_u32(spec.order)?;
    let flags = r.read_u32(spec.order)?;
    let reserved = if spec.is_64_bit {
        Some(r.read_u32(spec.order)?)
    } else {
        None
    };

    // Every load command is at least 8 bytes, and the command area must fit
    // between the header and the end of the source.
    let remaining = r.len().saturating_sub(r.tell());
    if (ncmds as u64).saturating_mul(8) > sizeofcmds as u64 {
        return Err(DecodeError::InvalidEndianness {
            slice_base: spec.base,
            field: "ncmds",
            value: ncmds as u64,
        });
    }
    if sizeofcmds as u64 > remaining {
        return Err(DecodeError::InvalidEndianness {
            slice_base: spec.base,
            field: "sizeofcmds",
            value: sizeofcmds as u64,
        });
    }

    Ok(Header {
        magic: spec.magic_raw,
        cpu_type,
        cpu_subtype,
        file_type,
        ncmds,
        sizeofcmds,
        flags,
        reserved,
        is_64_bit: spec.is_64_bit,
        endianness: spec.order,
        arch_offset: None,
        arch_size: None,
        load_commands: Vec::new(),
    })
}
