//! Mach-O decoder core.
//!
//! Takes a seekable byte source and produces a sealed, queryable model of
//! the binary's layout: headers, load commands, segments, sections, symbol
//! tables, and cross-references between symbols and sections.
//!
//! The decode is a pipeline over the source:
//!
//! 1. [`reader`] — positioned, bounds-checked byte access with explicit
//!    byte order on every scalar read.
//! 2. [`magic`] — classifies the first four bytes into thin or fat
//!    variants, fixing word size and byte order.
//! 3. [`fat`] — big-endian container structures; each arch slice is handed
//!    back to the thin pipeline.
//! 4. [`header`] + [`commands`] — the thin header and its load commands,
//!    raw bytes retained.
//! 5. [`segment`] + [`symtab`] — structural decoding of the recognized
//!    command types.
//! 6. [`xref`] — containment and value-equality edges over the finished
//!    model.
//!
//! A decode owns its reader and its in-flight file: there is no shared
//! mutable state, and callers may run decodes concurrently in separate
//! tasks. On any failure the partial model is discarded; in fat mode,
//! per-slice failures are recorded on the file and siblings decode anyway.
//! The source is never mutated.

pub mod cancel;
pub mod commands;
pub mod error;
pub mod fat;
pub mod header;
pub mod magic;
pub mod model;
pub mod reader;
pub mod segment;
pub mod symtab;
pub mod xref;

use std::path::Path;

use md5::{Digest, Md5};

use fat::FatArch;
use header::SliceSpec;
use magic::MagicKind;
use model::IdAllocator;
use reader::SourceReader;

pub use cancel::CancelToken;
pub use commands::CommandKind;
pub use error::{DecodeError, Result, SliceFailure, Warning};
pub use model::{
    CrossReference, DynamicSymbolTable, EntityKind, Header, LoadCommand, MachoFile,
    ReferenceKind, Section, SectionId, Segment, SegmentId, Symbol, SymbolId, SymbolTable,
};
pub use reader::ByteOrder;
pub use xref::build_cross_references;

/// Options controlling a decode.
#[derive(Debug, Clone)]
pub struct DecodeOptions {
    /// Run the cross-reference builder after the structural decode.
    pub build_cross_references: bool,
    /// Cancellation token polled between load commands and symbol batches.
    pub cancel: CancelToken,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            build_cross_references: true,
            cancel: CancelToken::new(),
        }
    }
}

/// Decode the file at `path`.
pub fn decode_path(path: impl AsRef<Path>, options: &DecodeOptions) -> Result<MachoFile> {
    let path = path.as_ref();
    let data = std::fs::read(path)?;
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let filepath = path.to_string_lossy().into_owned();
    decode_bytes(&data, &filename, &filepath, options)
}

/// Decode an in-memory byte source.
///
/// On success the returned file is sealed: every child entity is attached
/// in its contractual order and the value should be treated as read-only.
/// On error nothing of the in-flight model survives.
pub fn decode_bytes(
    data: &[u8],
    filename: &str,
    filepath: &str,
    options: &DecodeOptions,
) -> Result<MachoFile> {
    let mut r = SourceReader::new(data);
    let magic_bytes = r.read_array::<4>()?;
    let kind = MagicKind::classify(magic_bytes);

    tracing::debug!(
        file = filename,
        size = data.len(),
        fat = kind.is_fat(),
        "starting decode"
    );

    let mut file = MachoFile {
        filename: filename.to_string(),
        filepath: filepath.to_string(),
        file_size: data.len() as u64,
        md5_digest: md5_hex(data),
        is_fat: kind.is_fat(),
        headers: Vec::new(),
        segments: Vec::new(),
        symtab: None,
        dysymtab: None,
        symbols: Vec::new(),
        cross_references: Vec::new(),
        warnings: Vec::new(),
        slice_failures: Vec::new(),
    };
    let mut ids = IdAllocator::default();

    match kind {
        MagicKind::Unknown => {
            return Err(DecodeError::NotMachO {
                magic: u32::from_le_bytes(magic_bytes),
            });
        }
        MagicKind::Fat32 | MagicKind::Fat64 => {
            decode_fat_container(&mut r, kind, &mut file, &mut ids, options)?;
        }
        _ => {
            let slice = decode_slice(&mut r, 0, None, &mut ids, &options.cancel)?;
            slice.merge_into(&mut file);
        }
    }

    if options.build_cross_references {
        xref::build_cross_references(&mut file);
    }

    tracing::debug!(
        headers = file.headers.len(),
        segments = file.segments.len(),
        symbols = file.symbols.len(),
        warnings = file.warnings.len(),
        "decode complete"
    );
    Ok(file)
}

/// Walk a fat container, isolating per-slice failures. Cancellation is the
/// one error that aborts the whole container.
fn decode_fat_container(
    r: &mut SourceReader<'_>,
    kind: MagicKind,
    file: &mut MachoFile,
    ids: &mut IdAllocator,
    options: &DecodeOptions,
) -> Result<()> {
    let nfat_arch = fat::parse_fat_header(r)?;
    let mut arches = Vec::with_capacity(nfat_arch.min(64) as usize);

    for index in 0..nfat_arch {
        options.cancel.check()?;
        let arch = fat::parse_fat_arch(r, kind.is_64_bit())?;
        let descriptor_pos = r.tell();

        match decode_slice(r, arch.offset, Some(&arch), ids, &options.cancel) {
            Ok(slice) => slice.merge_into(file),
            Err(DecodeError::Cancelled) => return Err(DecodeError::Cancelled),
            Err(err) => {
                tracing::warn!(
                    slice = index,
                    offset = arch.offset,
                    error = %err,
                    "fat slice failed to decode"
                );
                file.slice_failures.push(SliceFailure {
                    index,
                    offset: arch.offset,
                    error: err.to_string(),
                });
            }
        }

        r.seek_abs(descriptor_pos);
        arches.push(arch);
    }

    file.warnings.extend(fat::detect_overlaps(&arches));
    Ok(())
}

/// Everything one thin slice contributes to the file. Accumulated locally
/// and merged only on success, so a failing slice leaves no partial
/// entities behind.
struct SliceOutput {
    header: Header,
    segments: Vec<Segment>,
    symtab: Option<SymbolTable>,
    dysymtab: Option<DynamicSymbolTable>,
    symbols: Vec<Symbol>,
    warnings: Vec<Warning>,
}

impl SliceOutput {
    fn merge_into(self, file: &mut MachoFile) {
        file.headers.push(self.header);
        file.segments.extend(self.segments);
        file.warnings.extend(self.warnings);
        // Symbol interpretation follows the first slice that carries a
        // symbol table; later slices keep theirs as opaque load commands.
        if file.symtab.is_none() {
            if let Some(symtab) = self.symtab {
                file.symtab = Some(symtab);
                file.symbols.extend(self.symbols);
            }
        }
        if file.dysymtab.is_none() {
            file.dysymtab = self.dysymtab;
        }
    }
}

/// Decode one thin slice starting at `base`.
fn decode_slice(
    r: &mut SourceReader<'_>,
    base: u64,
    arch: Option<&FatArch>,
    ids: &mut IdAllocator,
    cancel: &CancelToken,
) -> Result<SliceOutput> {
    r.seek_abs(base);
    let magic_bytes = r.read_array::<4>()?;
    let kind = MagicKind::classify(magic_bytes);
    let Some(spec) = SliceSpec::new(base, kind) else {
        return Err(DecodeError::NotMachO {
            magic: u32::from_le_bytes(magic_bytes),
        });
    };

    let mut header = header::parse_thin_header(r, &spec)?;
    if let Some(arch) = arch {
        header.arch_offset = Some(arch.offset);
        header.arch_size = Some(arch.size);
    }

    let load_commands =
        commands::walk_load_commands(r, &spec, header.ncmds, header.sizeofcmds, cancel)?;

    let mut output = SliceOutput {
        header,
        segments: Vec::new(),
        symtab: None,
        dysymtab: None,
        symbols: Vec::new(),
        warnings: Vec::new(),
    };

    for cmd in &load_commands {
        match cmd.kind() {
            CommandKind::Segment32 | CommandKind::Segment64 => {
                let seg = segment::decode_segment(cmd, spec.order, ids, &mut output.warnings)?;
                output.segments.push(seg);
            }
            CommandKind::Symtab if output.symtab.is_none() => {
                let table = symtab::decode_symtab_command(cmd, spec.order)?;
                output.symbols = symtab::decode_symbols(
                    r,
                    base,
                    &table,
                    spec.order,
                    spec.is_64_bit,
                    ids,
                    &mut output.warnings,
                    cancel,
                )?;
                output.symtab = Some(table);
            }
            CommandKind::Dysymtab if output.dysymtab.is_none() => {
                output.dysymtab = Some(symtab::decode_dysymtab_command(cmd, spec.order)?);
            }
            _ => {}
        }
    }

    output.header.load_commands = load_commands;
    Ok(output)
}

/// Lowercase hex MD5 of the full byte stream.
fn md5_hex(data: &[u8]) -> String {
    use std::fmt::Write;

    let mut hasher = Md5::new();
    hasher.update(data);
    let mut out = String::with_capacity(32);
    for byte in hasher.finalize() {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}
