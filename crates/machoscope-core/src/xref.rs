//! Cross-reference builder.
//!
//! Runs over a fully decoded file in two phases. Phase A links each defined
//! symbol to the first section whose address range contains its value.
//! Phase B links every ordered pair of distinct defined symbols that share
//! a value — a deliberate over-approximation of data references; no
//! instruction streams are analyzed.
//!
//! The builder never fails: rows it cannot make sense of are skipped with a
//! logged warning. It also does not dedupe, so re-running it on a file that
//! already has edges requires [`MachoFile::clear_cross_references`] first.

use crate::model::{CrossReference, EntityKind, MachoFile, ReferenceKind};

/// Build containment and value-equality edges, returning how many were
/// appended.
pub fn build_cross_references(file: &mut MachoFile) -> usize {
    let mut edges = Vec::new();

    // Phase A: section contains symbol. Sections are scanned in insertion
    // order and the first match wins.
    for symbol in &file.symbols {
        if !symbol.is_defined {
            continue;
        }
        for section in file.segments.iter().flat_map(|seg| seg.sections.iter()) {
            let Some(end) = section.addr.checked_add(section.size) else {
                tracing::warn!(
                    section = %section.sectname,
                    addr = section.addr,
                    size = section.size,
                    "skipping section with overflowing address range"
                );
                continue;
            };
            if section.addr <= symbol.n_value && symbol.n_value < end {
                edges.push(CrossReference {
                    source_kind: EntityKind::Section,
                    source_id: section.id.0,
                    target_kind: EntityKind::Symbol,
                    target_id: symbol.id.0,
                    offset: Some(symbol.n_value - section.addr),
                    kind: ReferenceKind::Contains,
                });
                break;
            }
        }
    }

    // Phase B: symbols sharing a value. The source must sit in a section;
    // both endpoints must be defined.
    for a in &file.symbols {
        if !a.is_defined || a.n_sect == 0 {
            continue;
        }
        for b in &file.symbols {
            if a.id == b.id || !b.is_defined {
                continue;
            }
            if a.n_value == b.n_value {
                edges.push(CrossReference {
                    source_kind: EntityKind::Symbol,
                    source_id: a.id.0,
                    target_kind: EntityKind::Symbol,
                    target_id: b.id.0,
                    offset: None,
                    kind: ReferenceKind::References,
                });
            }
        }
    }

    let count = edges.len();
    tracing::debug!(edges = count, "cross-reference pass complete");
    file.cross_references.extend(edges);
    count
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Section, SectionId, Segment, SegmentId, Symbol, SymbolId,
    };

    fn file_with(segments: Vec<Segment>, symbols: Vec<Symbol>) -> MachoFile {
        MachoFile {
            filename: "fixture".into(),
            filepath: String::new(),
            file_size: 0,
            md5_digest: String::new(),
            is_fat: false,
            headers: vec![],
            segments,
            symtab: None,
            dysymtab: None,
            symbols,
            cross_references: vec![],
            warnings: vec![],
            slice_failures: vec![],
        }
    }

    fn text_segment(addr: u64, size: u64) -> Segment {
        Segment {
            id: SegmentId(0),
            segname: "__TEXT".into(),
            vmaddr: addr,
            vmsize: size,
            fileoff: 0,
            filesize: size,
            maxprot: 7,
            initprot: 5,
            nsects: 1,
            flags: 0,
            sections: vec![Section {
                id: SectionId(0),
                segment_id: SegmentId(0),
                sectname: "__text".into(),
                segname: "__TEXT".into(),
                addr,
                size,
                offset: 0,
                align: 4,
                flags: 0x8000_0400,
            }],
        }
    }

    fn symbol(id: u32, name: &str, n_type: u8, n_sect: u8, value: u64) -> Symbol {
        let external = n_type & 0x01 != 0;
        let debug = n_type & 0xe0 != 0;
        let masked = n_type & 0x0e;
        Symbol {
            id: SymbolId(id),
            name: name.into(),
            n_type,
            n_sect,
            n_desc: 0,
            n_value: value,
            is_external: external,
            is_debug: debug,
            is_local: !external && !debug,
            is_defined: masked == 0x0e || masked == 0x02,
        }
    }

    #[test]
    fn emits_containment_and_reference_edges() {
        // __text spans [0x100000100, 0x100000600); _helper and _data_ref
        // share a value, producing both ordered reference edges.
        let mut file = file_with(
            vec![text_segment(0x1_0000_0100, 0x500)],
            vec![
                symbol(0, "_main", 0x0f, 1, 0x1_0000_0100),
                symbol(1, "_helper", 0x0f, 1, 0x1_0000_0200),
                symbol(2, "_undef", 0x01, 0, 0),
                symbol(3, "_data_ref", 0x0e, 1, 0x1_0000_0200),
            ],
        );

        let count = build_cross_references(&mut file);
        assert_eq!(count, 5);
        assert_eq!(file.cross_references.len(), 5);

        let contains: Vec<_> = file
            .cross_references
            .iter()
            .filter(|x| x.kind == ReferenceKind::Contains)
            .collect();
        assert_eq!(contains.len(), 3);
        for edge in &contains {
            assert_eq!(edge.source_kind, EntityKind::Section);
            assert_eq!(edge.target_kind, EntityKind::Symbol);
        }
        assert_eq!(contains[0].offset, Some(0));
        assert_eq!(contains[1].offset, Some(0x100));

        let references: Vec<_> = file
            .cross_references
            .iter()
            .filter(|x| x.kind == ReferenceKind::References)
            .collect();
        assert_eq!(references.len(), 2);
        let pairs: Vec<(u32, u32)> = references
            .iter()
            .map(|x| (x.source_id, x.target_id))
            .collect();
        assert!(pairs.contains(&(1, 3)));
        assert!(pairs.contains(&(3, 1)));
    }

    #[test]
    fn undefined_symbols_get_no_edges() {
        let mut file = file_with(
            vec![text_segment(0x1000, 0x1000)],
            vec![symbol(0, "_undef", 0x01, 0, 0x1000)],
        );
        assert_eq!(build_cross_references(&mut file), 0);
    }

    #[test]
    fn first_matching_section_wins() {
        let mut segment = text_segment(0x1000, 0x1000);
        segment.sections.push(Section {
            id: SectionId(1),
            segment_id: SegmentId(0),
            sectname: "__shadow".into(),
            segname: "__TEXT".into(),
            addr: 0x1000,
            size: 0x1000,
            offset: 0,
            align: 4,
            flags: 0,
        });
        let mut file = file_with(
            vec![segment],
            vec![symbol(0, "_sym", 0x0e, 1, 0x1800)],
        );

        build_cross_references(&mut file);
        let edge = &file.cross_references[0];
        assert_eq!(edge.source_id, 0, "the earlier section takes the edge");
    }

    #[test]
    fn containment_boundaries_are_half_open() {
        let mut file = file_with(
            vec![text_segment(0x1000, 0x100)],
            vec![
                symbol(0, "_start", 0x0e, 1, 0x1000),
                symbol(1, "_end", 0x0e, 1, 0x1100),
            ],
        );
        build_cross_references(&mut file);
        let targets: Vec<u32> = file
            .cross_references
            .iter()
            .filter(|x| x.kind == ReferenceKind::Contains)
            .map(|x| x.target_id)
            .collect();
        assert_eq!(targets, vec![0], "end address is exclusive");
    }

    #[test]
    fn absolute_source_symbols_do_not_reference() {
        // n_sect == 0 on the source side suppresses the edge; as a target
        // the absolute symbol is still reachable.
        let mut file = file_with(
            vec![],
            vec![
                symbol(0, "_abs", 0x03, 0, 0x2000),
                symbol(1, "_sect", 0x0f, 1, 0x2000),
            ],
        );
        build_cross_references(&mut file);
        let pairs: Vec<(u32, u32)> = file
            .cross_references
            .iter()
            .map(|x| (x.source_id, x.target_id))
            .collect();
        assert_eq!(pairs, vec![(1, 0)]);
    }

    #[test]
    fn rerun_without_clear_duplicates_rerun_with_clear_does_not() {
        let mut file = file_with(
            vec![text_segment(0x1000, 0x1000)],
            vec![symbol(0, "_sym", 0x0e, 1, 0x1000)],
        );
        assert_eq!(build_cross_references(&mut file), 1);
        assert_eq!(build_cross_references(&mut file), 1);
        assert_eq!(file.cross_references.len(), 2, "builder does not dedupe");

        file.clear_cross_references();
        assert_eq!(build_cross_references(&mut file), 1);
        assert_eq!(file.cross_references.len(), 1);
    }
}
