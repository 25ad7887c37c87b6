//! Segment and section decoding.
//!
//! Operates on a load command's retained bytes, so the global source reader
//! is never disturbed. `LC_SEGMENT` and `LC_SEGMENT_64` differ only in the
//! width of the address/size scalars and the number of trailing reserved
//! words per section.

use crate::commands::LC_SEGMENT_64;
use crate::error::{DecodeError, Result, Warning};
use crate::model::{IdAllocator, LoadCommand, Section, Segment};
use crate::reader::{name_from_bytes, ByteOrder, SourceReader};

/// Fixed part of a 32-bit segment command, preamble included.
const SEGMENT_FIXED_32: u64 = 56;
/// Fixed part of a 64-bit segment command, preamble included.
const SEGMENT_FIXED_64: u64 = 72;
/// On-disk size of a 32-bit section entry.
const SECTION_SIZE_32: u64 = 68;
/// On-disk size of a 64-bit section entry.
const SECTION_SIZE_64: u64 = 80;

/// Section type codes that describe zero-fill memory; their addresses have
/// no backing bytes and are exempt from the containment check.
const S_ZEROFILL: u8 = 0x01;
const S_GB_ZEROFILL: u8 = 0x0c;
const S_THREAD_LOCAL_ZEROFILL: u8 = 0x12;

/// Decode a segment command and its trailing section entries.
///
/// Warnings for sections whose address range escapes the segment are pushed
/// onto `warnings`; they do not fail the decode.
pub(crate) fn decode_segment(
    cmd: &LoadCommand,
    order: ByteOrder,
    ids: &mut IdAllocator,
    warnings: &mut Vec<Warning>,
) -> Result<Segment> {
    let is_64 = cmd.cmd_type == LC_SEGMENT_64;
    let mut r = SourceReader::new(&cmd.data);
    r.seek_abs(8);

    let segname = name_from_bytes(r.read(16)?);
    let (vmaddr, vmsize, fileoff, filesize) = if is_64 {
        (
            r.read_u64(order)?,
            r.read_u64(order)?,
            r.read_u64(order)?,
            r.read_u64(order)?,
        )
    } else {
        (
            r.read_u32(order)? as u64,
            r.read_u32(order)? as u64,
            r.read_u32(order)? as u64,
            r.read_u32(order)? as u64,
        )
    };
    let maxprot = r.read_u32(order)?;
    let initprot = r.read_u32(order)?;
    let nsects = r.read_u32(order)?;
    let flags = r.read_u32(order)?;

    let (fixed, section_size) = if is_64 {
        (SEGMENT_FIXED_64, SECTION_SIZE_64)
    } else {
        (SEGMENT_FIXED_32, SECTION_SIZE_32)
    };
    let required = fixed + nsects as u64 * section_size;
    if required > cmd.cmd_size as u64 {
        return Err(DecodeError::MalformedSegment {
            segname,
            nsects,
            required,
            cmd_size: cmd.cmd_size,
        });
    }

    let mut segment = Segment {
        id: ids.segment(),
        segname,
        vmaddr,
        vmsize,
        fileoff,
        filesize,
        maxprot,
        initprot,
        nsects,
        flags,
        sections: Vec::with_capacity(nsects as usize),
    };

    for _ in 0..nsects {
        let section = decode_section(&mut r, order, is_64, segment.id, ids)?;
        check_containment(&segment, &section, warnings);
        segment.sections.push(section);
    }

    Ok(segment)
}

/// Decode one section entry at the reader's position. `reloff`, `nreloc`
/// and the trailing reserved words are consumed for position advancement
/// but not retained.
fn decode_section(
    r: &mut SourceReader<'_>,
    order: ByteOrder,
    is_64: bool,
    segment_id: crate::model::SegmentId,
    ids: &mut IdAllocator,
) -> Result<Section> {
    let sectname = name_from_bytes(r.read(16)?);
    let segname = name_from_bytes(r.read(16)?);
    let (addr, size) = if is_64 {
        (r.read_u64(order)?, r.read_u64(order)?)
    } else {
        (r.read_u32(order)? as u64, r.read_u32(order)? as u64)
    };
    let offset = r.read_u32(order)?;
    let align = r.read_u32(order)?;
    let _reloff = r.read_u32(order)?;
    let _nreloc = r.read_u32(order)?;
    let flags = r.read_u32(order)?;
    let reserved_words: i64 = if is_64 { 3 } else { 2 };
    r.seek_rel(reserved_words * 4)?;

    Ok(Section {
        id: ids.section(),
        segment_id,
        sectname,
        segname,
        addr,
        size,
        offset,
        align,
        flags,
    })
}

/// Warn when a section's address range escapes its parent segment.
/// Zero-fill sections and `__PAGEZERO` are exempt.
fn check_containment(segment: &Segment, section: &Section, warnings: &mut Vec<Warning>) {
    if segment.vmsize == 0 || section.size == 0 || segment.segname == "__PAGEZERO" {
        return;
    }
    if matches!(
        section.section_type(),
        S_ZEROFILL | S_GB_ZEROFILL | S_THREAD_LOCAL_ZEROFILL
    ) {
        return;
    }
    let seg_end = segment.vmaddr.checked_add(segment.vmsize);
    let sect_end = section.addr.checked_add(section.size);
    let inside = match (seg_end, sect_end) {
        (Some(seg_end), Some(sect_end)) => {
            section.addr >= segment.vmaddr && sect_end <= seg_end
        }
        _ => false,
    };
    if !inside {
        tracing::warn!(
            segment = %segment.segname,
            section = %section.sectname,
            addr = section.addr,
            size = section.size,
            "section escapes its segment"
        );
        warnings.push(Warning::SectionOutsideSegment {
            segname: segment.segname.clone(),
            sectname: section.sectname.clone(),
        });
    }
}
