//! Human-readable names for the raw words the decoder retains.
//!
//! The decoder keeps header fields, flags, and type codes exactly as they
//! appear on disk; everything here is display-only derivation.

use machoscope_core::symtab::{N_ABS, N_INDR, N_PBUD, N_SECT, N_TYPE, N_UNDF};
use machoscope_core::{Section, Symbol};

/// Intel x86.
pub const CPU_TYPE_X86: u32 = 7;
/// Intel x86-64.
pub const CPU_TYPE_X86_64: u32 = 0x0100_0007;
/// ARM.
pub const CPU_TYPE_ARM: u32 = 12;
/// ARM64.
pub const CPU_TYPE_ARM64: u32 = 0x0100_000c;

/// Convert a CPU type word to a human-readable name.
pub fn cpu_type_name(cpu_type: u32) -> String {
    match cpu_type {
        CPU_TYPE_X86 => "x86".into(),
        CPU_TYPE_X86_64 => "x86_64".into(),
        CPU_TYPE_ARM => "ARM".into(),
        CPU_TYPE_ARM64 => "ARM64".into(),
        other => format!("Unknown (0x{:x})", other),
    }
}

/// Convert a file type word to its `MH_*` name.
pub fn file_type_name(file_type: u32) -> String {
    match file_type {
        0x1 => "MH_OBJECT".into(),
        0x2 => "MH_EXECUTE".into(),
        0x3 => "MH_FVMLIB".into(),
        0x4 => "MH_CORE".into(),
        0x5 => "MH_PRELOAD".into(),
        0x6 => "MH_DYLIB".into(),
        0x7 => "MH_DYLINKER".into(),
        0x8 => "MH_BUNDLE".into(),
        0x9 => "MH_DYLIB_STUB".into(),
        0xa => "MH_DSYM".into(),
        0xb => "MH_KEXT_BUNDLE".into(),
        other => format!("Unknown (0x{:x})", other),
    }
}

/// Convert a load command type word to its `LC_*` name.
pub fn load_command_name(cmd_type: u32) -> String {
    match cmd_type {
        0x1 => "LC_SEGMENT".into(),
        0x2 => "LC_SYMTAB".into(),
        0x4 => "LC_THREAD".into(),
        0x5 => "LC_UNIXTHREAD".into(),
        0xb => "LC_DYSYMTAB".into(),
        0xc => "LC_LOAD_DYLIB".into(),
        0xd => "LC_ID_DYLIB".into(),
        0xe => "LC_LOAD_DYLINKER".into(),
        0x19 => "LC_SEGMENT_64".into(),
        0x1b => "LC_UUID".into(),
        0x1d => "LC_CODE_SIGNATURE".into(),
        0x26 => "LC_FUNCTION_STARTS".into(),
        0x29 => "LC_DATA_IN_CODE".into(),
        0x8000_0028 => "LC_MAIN".into(),
        other => format!("Unknown command (0x{:x})", other),
    }
}

/// Convert a section's type code (low byte of flags) to a readable name.
pub fn section_type_name(section: &Section) -> String {
    match section.section_type() {
        0x00 => "Regular".into(),
        0x01 => "ZeroFill".into(),
        0x02 => "CStringLiterals".into(),
        0x03 => "4ByteLiterals".into(),
        0x04 => "8ByteLiterals".into(),
        0x05 => "LiteralPointers".into(),
        0x06 => "NonLazySymbolPointers".into(),
        0x07 => "LazySymbolPointers".into(),
        0x08 => "SymbolStubs".into(),
        0x09 => "ModInitFuncs".into(),
        0x0a => "ModTermFuncs".into(),
        0x0b => "Coalesced".into(),
        0x0c => "GBZeroFill".into(),
        0x0d => "Interposing".into(),
        0x0e => "16ByteLiterals".into(),
        0x0f => "DtraceDOF".into(),
        0x10 => "LazyDylibSymbolPointers".into(),
        0x11 => "ThreadLocalRegular".into(),
        0x12 => "ThreadLocalZerofill".into(),
        0x13 => "ThreadLocalVariables".into(),
        0x14 => "ThreadLocalVariablePointers".into(),
        0x15 => "ThreadLocalInitFunctionPointers".into(),
        other => format!("Unknown ({:x})", other),
    }
}

/// Convert a symbol's masked type to a readable name.
pub fn symbol_type_name(n_type: u8) -> String {
    match n_type & N_TYPE {
        N_UNDF => "Undefined".into(),
        N_ABS => "Absolute".into(),
        N_SECT => "Defined in Section".into(),
        N_PBUD => "Prebound Undefined".into(),
        N_INDR => "Indirect".into(),
        other => format!("Unknown ({})", other),
    }
}

/// Render protection bits as an `rwx` triple.
pub fn protection_string(prot: u32) -> String {
    let mut out = String::with_capacity(3);
    out.push(if prot & 0x01 != 0 { 'r' } else { '-' });
    out.push(if prot & 0x02 != 0 { 'w' } else { '-' });
    out.push(if prot & 0x04 != 0 { 'x' } else { '-' });
    out
}

/// Symbol counts by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct SymbolCensus {
    /// All symbols.
    pub total: usize,
    /// Neither external nor debug.
    pub local: usize,
    /// External and defined.
    pub external_defined: usize,
    /// Not defined.
    pub undefined: usize,
    /// Debug (stab) entries.
    pub debug: usize,
}

/// Count symbols per classification bucket.
pub fn symbol_census(symbols: &[Symbol]) -> SymbolCensus {
    SymbolCensus {
        total: symbols.len(),
        local: symbols.iter().filter(|s| s.is_local).count(),
        external_defined: symbols
            .iter()
            .filter(|s| s.is_external && s.is_defined)
            .count(),
        undefined: symbols.iter().filter(|s| !s.is_defined).count(),
        debug: symbols.iter().filter(|s| s.is_debug).count(),
    }
}
