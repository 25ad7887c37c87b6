//! Load-command walker.
//!
//! Walks exactly `ncmds` commands, retaining each command's raw bytes so
//! per-type decoders can re-parse without touching the source again and
//! unrecognized command types pass through losslessly.

use crate::cancel::CancelToken;
use crate::error::{DecodeError, Result};
use crate::header::SliceSpec;
use crate::model::LoadCommand;
use crate::reader::SourceReader;

/// 32-bit segment command.
pub const LC_SEGMENT: u32 = 0x1;
/// Symbol table command.
pub const LC_SYMTAB: u32 = 0x2;
/// Dynamic symbol table command.
pub const LC_DYSYMTAB: u32 = 0xb;
/// 64-bit segment command.
pub const LC_SEGMENT_64: u32 = 0x19;

/// Minimum load command size: the `(cmd, cmdsize)` preamble itself.
pub const LC_PREAMBLE_SIZE: u32 = 8;

/// Structural interpretation of a load command's type word.
///
/// Only the recognized set is decoded further; everything else stays an
/// opaque byte buffer on the [`LoadCommand`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// `LC_SEGMENT`: 32-bit segment with trailing sections.
    Segment32,
    /// `LC_SEGMENT_64`: 64-bit segment with trailing sections.
    Segment64,
    /// `LC_SYMTAB`: symbol and string table locations.
    Symtab,
    /// `LC_DYSYMTAB`: dynamic symbol table index ranges.
    Dysymtab,
    /// Any other command; retained but not structurally decoded.
    Other,
}

impl LoadCommand {
    /// Classify this command's type word.
    pub fn kind(&self) -> CommandKind {
        match self.cmd_type {
            LC_SEGMENT => CommandKind::Segment32,
            LC_SEGMENT_64 => CommandKind::Segment64,
            LC_SYMTAB => CommandKind::Symtab,
            LC_DYSYMTAB => CommandKind::Dysymtab,
            _ => CommandKind::Other,
        }
    }
}

/// Walk the load-command area. The reader must be positioned at the first
/// command (immediately after the header).
///
/// A command whose size is under 8 bytes or would run past `sizeofcmds`
/// fails the whole walk; partially walked commands are discarded by the
/// caller.
pub(crate) fn walk_load_commands(
    r: &mut SourceReader<'_>,
    spec: &SliceSpec,
    ncmds: u32,
    sizeofcmds: u32,
    cancel: &CancelToken,
) -> Result<Vec<LoadCommand>> {
    let mut commands = Vec::with_capacity(ncmds.min(1024) as usize);
    let mut consumed: u64 = 0;

    for index in 0..ncmds {
        cancel.check()?;

        let cmd_offset = r.tell() - spec.base;
        let cmd_type = r.read_u32(spec.order)?;
        let cmd_size = r.read_u32(spec.order)?;

        if cmd_size < LC_PREAMBLE_SIZE || consumed + cmd_size as u64 > sizeofcmds as u64 {
            return Err(DecodeError::MalformedLoadCommand {
                index,
                offset: cmd_offset,
                cmd_type,
                cmd_size,
            });
        }

        // Back to the preamble, then take the whole command verbatim. The
        // read leaves the cursor at the next command.
        r.seek_rel(-(LC_PREAMBLE_SIZE as i64))?;
        let data = r.read(cmd_size as usize)?.to_vec();

        commands.push(LoadCommand {
            cmd_type,
            cmd_size,
            cmd_offset,
            data,
        });
        consumed += cmd_size as u64;
    }

    Ok(commands)
}
