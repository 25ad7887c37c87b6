//! The sealed in-memory model of a decoded Mach-O file.
//!
//! Ownership is a strict tree: a [`MachoFile`] owns its headers (which own
//! their load commands), its segments (which own their sections), and its
//! symbols. Back-edges — a section's parent segment, a cross-reference's
//! endpoints — are file-scoped numeric ids assigned in insertion order
//! during decode. Identities are not stable across re-decodes.
//!
//! Iteration order is part of the contract: headers in slice order, load
//! commands in file order, segments in load-command order, sections in
//! declared order, symbols in symbol-table order.

use serde::{Deserialize, Serialize};

use crate::error::{SliceFailure, Warning};
use crate::reader::ByteOrder;

/// File-scoped identifier of a [`Segment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SegmentId(pub u32);

/// File-scoped identifier of a [`Section`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionId(pub u32);

/// File-scoped identifier of a [`Symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub u32);

/// A decoded Mach-O file: one header for thin images, one per arch slice
/// for fat containers, plus every child entity the decode produced.
///
/// The value is sealed on decode success and treated as read-only. The one
/// sanctioned mutation is clearing and rebuilding cross-references (see
/// [`crate::xref::build_cross_references`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachoFile {
    /// File name without directories.
    pub filename: String,
    /// Path the bytes were read from (empty for in-memory sources).
    pub filepath: String,
    /// Total length of the byte stream.
    pub file_size: u64,
    /// MD5 digest of the full byte stream, lowercase hex.
    pub md5_digest: String,
    /// Whether the source was a fat/universal container.
    pub is_fat: bool,
    /// Headers in slice-index order.
    pub headers: Vec<Header>,
    /// Segments in load-command order, across all slices.
    pub segments: Vec<Segment>,
    /// Symbol-table command metadata, from the first slice that carried one.
    pub symtab: Option<SymbolTable>,
    /// Dynamic symbol-table metadata, from the first slice that carried one.
    pub dysymtab: Option<DynamicSymbolTable>,
    /// Symbols in symbol-table order.
    pub symbols: Vec<Symbol>,
    /// Edges produced by the cross-reference builder.
    pub cross_references: Vec<CrossReference>,
    /// Non-fatal findings collected during decode.
    pub warnings: Vec<Warning>,
    /// Fat slices that failed to decode (empty for thin files).
    pub slice_failures: Vec<SliceFailure>,
}

impl MachoFile {
    /// All sections across all segments, in insertion order.
    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.segments.iter().flat_map(|seg| seg.sections.iter())
    }

    /// Look up a segment by id.
    pub fn segment_by_id(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// Look up a section by id.
    pub fn section_by_id(&self, id: SectionId) -> Option<&Section> {
        self.sections().find(|s| s.id == id)
    }

    /// Look up a symbol by id.
    pub fn symbol_by_id(&self, id: SymbolId) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.id == id)
    }

    /// Drop all cross-reference edges.
    ///
    /// The builder does not dedupe, so callers re-running it on an already
    /// populated file should clear first.
    pub fn clear_cross_references(&mut self) {
        self.cross_references.clear();
    }
}

/// A thin Mach-O header, or one arch slice of a fat container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Header {
    /// Magic as retained by the classifier (canonical or byte-swapped).
    pub magic: u32,
    /// CPU type word.
    pub cpu_type: u32,
    /// CPU subtype word.
    pub cpu_subtype: u32,
    /// File type word (`MH_EXECUTE`, `MH_DYLIB`, ...).
    pub file_type: u32,
    /// Number of load commands.
    pub ncmds: u32,
    /// Total byte size of the load-command area.
    pub sizeofcmds: u32,
    /// Header flags.
    pub flags: u32,
    /// Reserved word, present only in 64-bit headers.
    pub reserved: Option<u32>,
    /// Whether the slice uses 64-bit layouts.
    pub is_64_bit: bool,
    /// Byte order of the slice.
    pub endianness: ByteOrder,
    /// Absolute offset of the slice within a fat container.
    pub arch_offset: Option<u64>,
    /// Byte length of the slice within a fat container.
    pub arch_size: Option<u64>,
    /// Load commands in file order.
    pub load_commands: Vec<LoadCommand>,
}

/// One load command with its raw bytes retained.
///
/// Retaining the bytes lets per-type decoders re-parse without re-reading
/// the source, and lets unrecognized command types pass through losslessly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadCommand {
    /// Command type word.
    pub cmd_type: u32,
    /// Declared size including the 8-byte preamble.
    pub cmd_size: u32,
    /// Offset of the command within its slice.
    pub cmd_offset: u64,
    /// The command's bytes, preamble included, exactly `cmd_size` long.
    pub data: Vec<u8>,
}

/// A segment described by `LC_SEGMENT` or `LC_SEGMENT_64`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    /// File-scoped id.
    pub id: SegmentId,
    /// Segment name from the 16-byte field.
    pub segname: String,
    /// Virtual memory address.
    pub vmaddr: u64,
    /// Virtual memory size.
    pub vmsize: u64,
    /// File offset of the mapped region.
    pub fileoff: u64,
    /// File size of the mapped region.
    pub filesize: u64,
    /// Maximum protection.
    pub maxprot: u32,
    /// Initial protection.
    pub initprot: u32,
    /// Declared section count.
    pub nsects: u32,
    /// Segment flags.
    pub flags: u32,
    /// Sections in declared order; length always equals `nsects`.
    pub sections: Vec<Section>,
}

/// A named subrange of a segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// File-scoped id.
    pub id: SectionId,
    /// Owning segment.
    pub segment_id: SegmentId,
    /// Section name from the 16-byte field.
    pub sectname: String,
    /// Segment name as declared in the section entry.
    pub segname: String,
    /// Virtual memory address.
    pub addr: u64,
    /// Byte size.
    pub size: u64,
    /// File offset of the section contents.
    pub offset: u32,
    /// Alignment as a power of two.
    pub align: u32,
    /// Section flags: type in the low byte, attributes above.
    pub flags: u32,
}

impl Section {
    /// The section type code (low 8 bits of flags).
    pub fn section_type(&self) -> u8 {
        (self.flags & 0xff) as u8
    }

    /// The attribute bits (upper 24 bits of flags).
    pub fn attributes(&self) -> u32 {
        self.flags & 0xffff_ff00
    }
}

/// `LC_SYMTAB` metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SymbolTable {
    /// Slice-relative offset of the nlist array.
    pub symoff: u32,
    /// Number of nlist entries.
    pub nsyms: u32,
    /// Slice-relative offset of the string table.
    pub stroff: u32,
    /// Byte size of the string table.
    pub strsize: u32,
}

/// `LC_DYSYMTAB` index/count pairs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DynamicSymbolTable {
    /// Index of the first local symbol.
    pub ilocalsym: u32,
    /// Number of local symbols.
    pub nlocalsym: u32,
    /// Index of the first externally defined symbol.
    pub iextdefsym: u32,
    /// Number of externally defined symbols.
    pub nextdefsym: u32,
    /// Index of the first undefined symbol.
    pub iundefsym: u32,
    /// Number of undefined symbols.
    pub nundefsym: u32,
    /// Offset of the indirect symbol table, when the command carries one.
    pub indirectsymoff: Option<u32>,
    /// Number of indirect symbol table entries.
    pub nindirectsyms: Option<u32>,
}

/// One decoded nlist entry plus its derived classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    /// File-scoped id.
    pub id: SymbolId,
    /// Name resolved through the string table, or a sentinel for
    /// out-of-range string offsets.
    pub name: String,
    /// Raw `n_type` byte.
    pub n_type: u8,
    /// Section number (`n_sect`), 0 for NO_SECT.
    pub n_sect: u8,
    /// Descriptor field (`n_desc`), signed.
    pub n_desc: i16,
    /// Symbol value, zero-extended to 64 bits in 32-bit images.
    pub n_value: u64,
    /// `n_type & N_EXT` is set.
    pub is_external: bool,
    /// Any `N_STAB` bit is set.
    pub is_debug: bool,
    /// Neither external nor debug.
    pub is_local: bool,
    /// `n_type & N_TYPE` is `N_SECT` or `N_ABS`.
    pub is_defined: bool,
}

/// Endpoint kind of a cross-reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// A [`Section`].
    Section,
    /// A [`Symbol`].
    Symbol,
}

/// Kind of relationship a cross-reference asserts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    /// The source section's address range contains the target symbol.
    Contains,
    /// The source symbol shares its value with the target symbol.
    References,
}

/// An edge between two entities of the same file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossReference {
    /// Kind of the source endpoint.
    pub source_kind: EntityKind,
    /// Id of the source endpoint (a [`SectionId`] or [`SymbolId`] value
    /// according to `source_kind`).
    pub source_id: u32,
    /// Kind of the target endpoint.
    pub target_kind: EntityKind,
    /// Id of the target endpoint.
    pub target_id: u32,
    /// Source-relative byte offset, for containment edges.
    pub offset: Option<u64>,
    /// Relationship kind.
    pub kind: ReferenceKind,
}

/// Allocates file-scoped ids during decode. Ids are unique per file but may
/// have gaps when a fat slice fails partway and its entities are discarded.
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    segment: u32,
    section: u32,
    symbol: u32,
}

impl IdAllocator {
    pub(crate) fn segment(&mut self) -> SegmentId {
        let id = SegmentId(self.segment);
        self.segment += 1;
        id
    }

    pub(crate) fn section(&mut self) -> SectionId {
        let id = SectionId(self.section);
        self.section += 1;
        id
    }

    pub(crate) fn symbol(&mut self) -> SymbolId {
        let id = SymbolId(self.symbol);
        self.symbol += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_file() -> MachoFile {
        MachoFile {
            filename: "a.out".into(),
            filepath: "/tmp/a.out".into(),
            file_size: 0,
            md5_digest: String::new(),
            is_fat: false,
            headers: vec![],
            segments: vec![],
            symtab: None,
            dysymtab: None,
            symbols: vec![],
            cross_references: vec![],
            warnings: vec![],
            slice_failures: vec![],
        }
    }

    #[test]
    fn section_type_is_low_byte_of_flags() {
        let section = Section {
            id: SectionId(0),
            segment_id: SegmentId(0),
            sectname: "__text".into(),
            segname: "__TEXT".into(),
            addr: 0x1000,
            size: 0x3000,
            offset: 0x1000,
            align: 4,
            flags: 0x8000_0400,
        };
        assert_eq!(section.section_type(), 0x00);
        assert_eq!(section.attributes(), 0x8000_0400);
    }

    #[test]
    fn lookup_by_id_walks_the_tree() {
        let mut file = empty_file();
        file.segments.push(Segment {
            id: SegmentId(0),
            segname: "__TEXT".into(),
            vmaddr: 0x1000,
            vmsize: 0x1000,
            fileoff: 0,
            filesize: 0x1000,
            maxprot: 7,
            initprot: 5,
            nsects: 1,
            flags: 0,
            sections: vec![Section {
                id: SectionId(0),
                segment_id: SegmentId(0),
                sectname: "__text".into(),
                segname: "__TEXT".into(),
                addr: 0x1000,
                size: 0x100,
                offset: 0,
                align: 2,
                flags: 0,
            }],
        });
        assert!(file.segment_by_id(SegmentId(0)).is_some());
        assert_eq!(
            file.section_by_id(SectionId(0)).map(|s| s.sectname.as_str()),
            Some("__text")
        );
        assert!(file.section_by_id(SectionId(9)).is_none());
    }

    #[test]
    fn clear_cross_references_empties_edges() {
        let mut file = empty_file();
        file.cross_references.push(CrossReference {
            source_kind: EntityKind::Section,
            source_id: 0,
            target_kind: EntityKind::Symbol,
            target_id: 0,
            offset: Some(0),
            kind: ReferenceKind::Contains,
        });
        file.clear_cross_references();
        assert!(file.cross_references.is_empty());
    }

    #[test]
    fn id_allocator_is_monotonic_per_kind() {
        let mut ids = IdAllocator::default();
        assert_eq!(ids.segment(), SegmentId(0));
        assert_eq!(ids.segment(), SegmentId(1));
        assert_eq!(ids.section(), SectionId(0));
        assert_eq!(ids.symbol(), SymbolId(0));
        assert_eq!(ids.symbol(), SymbolId(1));
    }
}
