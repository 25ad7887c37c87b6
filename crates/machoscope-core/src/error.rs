//! Error and warning types for the decoder core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using the decoder's error type.
pub type Result<T> = std::result::Result<T, DecodeError>;

/// Errors that abort a decode.
///
/// Structural errors carry positional context so a caller can point at the
/// offending bytes. In fat mode these are captured per slice as
/// [`SliceFailure`] instead of aborting sibling slices.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The magic at the slice root matched no recognized variant.
    #[error("not a Mach-O file: unrecognized magic 0x{magic:08x}")]
    NotMachO {
        /// The first four bytes, read little-endian.
        magic: u32,
    },

    /// A read ran past the end of the source.
    #[error("truncated read at offset 0x{position:x}: requested {requested} bytes, {available} available")]
    Truncated {
        /// Absolute position of the failed read.
        position: u64,
        /// Bytes requested.
        requested: usize,
        /// Bytes actually available at that position.
        available: u64,
    },

    /// A load command preamble was inconsistent with the header.
    #[error("malformed load command #{index} at offset 0x{offset:x}: type 0x{cmd_type:x}, size {cmd_size}")]
    MalformedLoadCommand {
        /// Zero-based command index.
        index: u32,
        /// Offset of the command within its slice.
        offset: u64,
        /// Raw command type.
        cmd_type: u32,
        /// Declared command size.
        cmd_size: u32,
    },

    /// A segment command declared more sections than its bytes can hold.
    #[error("malformed segment {segname:?}: {nsects} sections need {required} bytes, command has {cmd_size}")]
    MalformedSegment {
        /// Segment name as decoded from the command.
        segname: String,
        /// Declared section count.
        nsects: u32,
        /// Bytes required for the declared layout.
        required: u64,
        /// Declared command size.
        cmd_size: u32,
    },

    /// A symbol table command pointed outside the file.
    #[error("malformed symbol table: {field} = 0x{value:x} outside valid range (limit 0x{limit:x})")]
    MalformedSymbolTable {
        /// The offending field.
        field: &'static str,
        /// The field's value (absolute where applicable).
        value: u64,
        /// The bound it violated.
        limit: u64,
    },

    /// Header fields are implausible for the detected byte order.
    #[error("implausible {field} = 0x{value:x} in slice at 0x{slice_base:x}: byte order mismatch?")]
    InvalidEndianness {
        /// Base offset of the slice being decoded.
        slice_base: u64,
        /// The implausible field.
        field: &'static str,
        /// The value as read.
        value: u64,
    },

    /// The caller cancelled the decode.
    #[error("decode cancelled")]
    Cancelled,

    /// IO error wrapper.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Non-fatal findings collected during a decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// Two fat arch slices cover overlapping byte ranges.
    OverlappingFatSlices {
        /// Index of the earlier slice.
        first: u32,
        /// Index of the later slice.
        second: u32,
    },

    /// A section's address range escapes its parent segment.
    SectionOutsideSegment {
        /// Parent segment name.
        segname: String,
        /// Section name.
        sectname: String,
    },

    /// An nlist entry's string offset fell outside the string table.
    InvalidStringOffset {
        /// Index of the symbol in symbol-table order.
        symbol_index: u32,
        /// The out-of-range `n_strx` value.
        strx: u32,
    },
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::OverlappingFatSlices { first, second } => {
                write!(f, "fat slices {} and {} overlap", first, second)
            }
            Warning::SectionOutsideSegment { segname, sectname } => {
                write!(f, "section {},{} escapes its segment", segname, sectname)
            }
            Warning::InvalidStringOffset { symbol_index, strx } => {
                write!(
                    f,
                    "symbol #{} has string offset 0x{:x} outside the string table",
                    symbol_index, strx
                )
            }
        }
    }
}

/// A fat slice that failed to decode.
///
/// One corrupt slice does not invalidate its siblings; the failure is
/// recorded here and decoding continues with the next arch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SliceFailure {
    /// Index of the slice in fat-arch order.
    pub index: u32,
    /// Absolute offset of the slice within the container.
    pub offset: u64,
    /// Rendered decode error.
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncated_includes_position_and_sizes() {
        let err = DecodeError::Truncated {
            position: 0x40,
            requested: 8,
            available: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("0x40"), "message should include the offset");
        assert!(msg.contains("8"), "message should include the request size");
        assert!(msg.contains("3"), "message should include the available size");
    }

    #[test]
    fn malformed_load_command_includes_index_and_type() {
        let err = DecodeError::MalformedLoadCommand {
            index: 4,
            offset: 0x98,
            cmd_type: 0x19,
            cmd_size: 7,
        };
        let msg = err.to_string();
        assert!(msg.contains("#4"));
        assert!(msg.contains("0x19"));
        assert!(msg.contains("7"));
    }

    #[test]
    fn warning_display_names_the_section() {
        let warning = Warning::SectionOutsideSegment {
            segname: "__TEXT".into(),
            sectname: "__text".into(),
        };
        assert!(warning.to_string().contains("__TEXT,__text"));
    }

    #[test]
    fn slice_failure_roundtrips_through_json() {
        let failure = SliceFailure {
            index: 1,
            offset: 0x4000,
            error: "truncated read at offset 0x4000: requested 4 bytes, 0 available".into(),
        };
        let json = serde_json::to_string(&failure).unwrap();
        let back: SliceFailure = serde_json::from_str(&json).unwrap();
        assert_eq!(back, failure);
    }
}
