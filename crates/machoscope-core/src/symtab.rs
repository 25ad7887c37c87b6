//! Symbol-table decoding and nlist classification.
//!
//! `LC_SYMTAB` gives the offsets of the string table and the nlist array;
//! both are slice-relative. Each nlist entry is 12 bytes (32-bit) or 16
//! bytes (64-bit). A bad string offset never aborts the decode: the symbol
//! is produced with a sentinel name and a counted warning.

use crate::cancel::CancelToken;
use crate::error::{DecodeError, Result, Warning};
use crate::model::{DynamicSymbolTable, IdAllocator, LoadCommand, Symbol, SymbolTable};
use crate::reader::{ByteOrder, SourceReader};

/// Any of these bits set marks a symbolic debugging entry.
pub const N_STAB: u8 = 0xe0;
/// Private external symbol.
pub const N_PEXT: u8 = 0x10;
/// Mask for the type field.
pub const N_TYPE: u8 = 0x0e;
/// External symbol.
pub const N_EXT: u8 = 0x01;

/// Undefined symbol.
pub const N_UNDF: u8 = 0x0;
/// Absolute symbol.
pub const N_ABS: u8 = 0x2;
/// Indirect symbol.
pub const N_INDR: u8 = 0xa;
/// Prebound undefined symbol.
pub const N_PBUD: u8 = 0xc;
/// Symbol defined in the section numbered by `n_sect`.
pub const N_SECT: u8 = 0xe;

/// Size of a 32-bit nlist entry.
const NLIST_SIZE_32: u64 = 12;
/// Size of a 64-bit nlist_64 entry.
const NLIST_SIZE_64: u64 = 16;

/// Cancellation is polled once per this many nlist rows.
const CANCEL_BATCH: u32 = 1024;

/// Decode the body of an `LC_SYMTAB` command.
pub(crate) fn decode_symtab_command(cmd: &LoadCommand, order: ByteOrder) -> Result<SymbolTable> {
    if cmd.data.len() < 24 {
        return Err(DecodeError::MalformedSymbolTable {
            field: "cmd_size",
            value: cmd.data.len() as u64,
            limit: 24,
        });
    }
    let mut r = SourceReader::new(&cmd.data);
    r.seek_abs(8);
    Ok(SymbolTable {
        symoff: r.read_u32(order)?,
        nsyms: r.read_u32(order)?,
        stroff: r.read_u32(order)?,
        strsize: r.read_u32(order)?,
    })
}

/// Decode the body of an `LC_DYSYMTAB` command. The indirect-table fields
/// are only present when the command is long enough to carry them.
pub(crate) fn decode_dysymtab_command(
    cmd: &LoadCommand,
    order: ByteOrder,
) -> Result<DynamicSymbolTable> {
    if cmd.data.len() < 32 {
        return Err(DecodeError::MalformedSymbolTable {
            field: "cmd_size",
            value: cmd.data.len() as u64,
            limit: 32,
        });
    }
    let mut r = SourceReader::new(&cmd.data);
    r.seek_abs(8);
    let ilocalsym = r.read_u32(order)?;
    let nlocalsym = r.read_u32(order)?;
    let iextdefsym = r.read_u32(order)?;
    let nextdefsym = r.read_u32(order)?;
    let iundefsym = r.read_u32(order)?;
    let nundefsym = r.read_u32(order)?;

    // indirectsymoff sits after toc/modtab/extrefsym pairs, at byte 56.
    let (indirectsymoff, nindirectsyms) = if cmd.data.len() >= 64 {
        r.seek_abs(56);
        (Some(r.read_u32(order)?), Some(r.read_u32(order)?))
    } else {
        (None, None)
    };

    Ok(DynamicSymbolTable {
        ilocalsym,
        nlocalsym,
        iextdefsym,
        nextdefsym,
        iundefsym,
        nundefsym,
        indirectsymoff,
        nindirectsyms,
    })
}

/// Read the string table and walk all nlist entries.
///
/// `slice_base` anchors the table's slice-relative offsets within the
/// source; for thin files it is 0.
pub(crate) fn decode_symbols(
    r: &mut SourceReader<'_>,
    slice_base: u64,
    symtab: &SymbolTable,
    order: ByteOrder,
    is_64: bool,
    ids: &mut IdAllocator,
    warnings: &mut Vec<Warning>,
    cancel: &CancelToken,
) -> Result<Vec<Symbol>> {
    let stroff = slice_base + symtab.stroff as u64;
    let in_bounds = stroff
        .checked_add(symtab.strsize as u64)
        .is_some_and(|end| end <= r.len());
    if !in_bounds {
        return Err(DecodeError::MalformedSymbolTable {
            field: "stroff",
            value: stroff,
            limit: r.len(),
        });
    }
    r.seek_abs(stroff);
    let string_table = r.read(symtab.strsize as usize)?;

    let symoff = slice_base + symtab.symoff as u64;
    let entry_size = if is_64 { NLIST_SIZE_64 } else { NLIST_SIZE_32 };
    let table_len = (symtab.nsyms as u64).saturating_mul(entry_size);
    match symoff.checked_add(table_len) {
        Some(end) if end <= r.len() => {}
        _ => {
            return Err(DecodeError::MalformedSymbolTable {
                field: "nsyms",
                value: symtab.nsyms as u64,
                limit: r.len().saturating_sub(symoff) / entry_size,
            });
        }
    }

    r.seek_abs(symoff);
    let mut symbols = Vec::with_capacity(symtab.nsyms.min(1 << 20) as usize);
    for index in 0..symtab.nsyms {
        if index % CANCEL_BATCH == 0 {
            cancel.check()?;
        }

        let n_strx = r.read_u32(order)?;
        let n_type = r.read_u8()?;
        let n_sect = r.read_u8()?;
        let n_desc = r.read_i16(order)?;
        let n_value = if is_64 {
            r.read_u64(order)?
        } else {
            r.read_u32(order)? as u64
        };

        let name = match lookup_name(string_table, n_strx) {
            Some(name) => name,
            None => {
                warnings.push(Warning::InvalidStringOffset {
                    symbol_index: index,
                    strx: n_strx,
                });
                format!("INVALID_STRING_OFFSET_{}", n_strx)
            }
        };

        let class = classify(n_type);
        symbols.push(Symbol {
            id: ids.symbol(),
            name,
            n_type,
            n_sect,
            n_desc,
            n_value,
            is_external: class.external,
            is_debug: class.debug,
            is_local: class.local,
            is_defined: class.defined,
        });
    }

    Ok(symbols)
}

/// Resolve a string-table offset to the NUL-terminated name starting there.
/// Returns `None` when the offset is outside the table.
fn lookup_name(string_table: &[u8], strx: u32) -> Option<String> {
    let start = strx as usize;
    if start >= string_table.len() {
        return None;
    }
    let tail = &string_table[start..];
    let end = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
    Some(String::from_utf8_lossy(&tail[..end]).into_owned())
}

struct Classification {
    external: bool,
    debug: bool,
    local: bool,
    defined: bool,
}

/// Derive the classification bits from `n_type` alone.
fn classify(n_type: u8) -> Classification {
    let external = n_type & N_EXT != 0;
    let debug = n_type & N_STAB != 0;
    let masked = n_type & N_TYPE;
    Classification {
        external,
        debug,
        local: !external && !debug,
        defined: masked == N_SECT || masked == N_ABS,
    }
}
