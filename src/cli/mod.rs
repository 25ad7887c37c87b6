//! CLI command implementations.

pub mod headers;
pub mod inspect;
pub mod segments;
pub mod symbols;
pub mod xrefs;

use machoscope_core::{DecodeOptions, MachoFile};
use std::path::Path;

/// Decode a file for a CLI command, printing collected warnings and slice
/// failures to stderr in table mode.
pub fn decode_for_display(
    path: &Path,
    options: &DecodeOptions,
    json: bool,
) -> machoscope::Result<MachoFile> {
    let file = machoscope_core::decode_path(path, options)?;

    if !json {
        for failure in &file.slice_failures {
            eprintln!(
                "warning: slice {} at 0x{:x} failed: {}",
                failure.index, failure.offset, failure.error
            );
        }
        for warning in &file.warnings {
            eprintln!("warning: {}", warning);
        }
    }

    Ok(file)
}

/// Clip a value to `max` columns for table output, marking elision with
/// a trailing `...`. Symbol and segment names are ASCII in practice, so
/// byte indexing is safe here.
pub fn clip(s: &str, max: usize) -> String {
    if s.len() > max {
        let keep = max.saturating_sub(3);
        format!("{}...", &s[..keep])
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_keeps_short_strings() {
        assert_eq!(clip("_main", 18), "_main");
        assert_eq!(clip("exactly_eighteen__", 18), "exactly_eighteen__");
    }

    #[test]
    fn clip_elides_long_strings() {
        let long = "_a_very_long_symbol_name_indeed";
        let out = clip(long, 18);
        assert_eq!(out.len(), 18);
        assert!(out.ends_with("..."));
        assert!(long.starts_with(&out[..15]));
    }

    #[test]
    fn decode_for_display_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.bin");
        // Minimal 64-bit LE header: magic + six words + reserved.
        let mut bytes = Vec::new();
        for word in [0xfeedfacfu32, 0x0100_0007, 3, 2, 0, 0, 0x85, 0] {
            bytes.extend(word.to_le_bytes());
        }
        std::fs::write(&path, &bytes).unwrap();

        let file = decode_for_display(&path, &DecodeOptions::default(), false).unwrap();
        assert_eq!(file.headers.len(), 1);
        assert_eq!(file.filename, "tiny.bin");
        assert_eq!(file.file_size, 32);
    }

    #[test]
    fn decode_for_display_propagates_not_macho() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("not_macho.bin");
        std::fs::write(&path, b"\x7fELF____").unwrap();
        assert!(decode_for_display(&path, &DecodeOptions::default(), false).is_err());
    }
}
