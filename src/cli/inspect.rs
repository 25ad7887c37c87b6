//! Inspect command implementation.

use clap::Args;
use machoscope::config::MachoscopeConfig;
use machoscope::report;
use machoscope_core::DecodeOptions;
use std::path::PathBuf;

/// Show a file overview.
#[derive(Args, Debug)]
pub struct InspectCmd {
    /// Path to the Mach-O binary.
    pub path: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl InspectCmd {
    /// Execute the inspect command.
    pub fn run(&self, config: &mut MachoscopeConfig) -> machoscope::Result<()> {
        let options = DecodeOptions {
            build_cross_references: config.xrefs_on_inspect,
            ..Default::default()
        };
        let file = super::decode_for_display(&self.path, &options, self.json)?;
        config.record_recent(&file);

        if self.json {
            let summary = serde_json::json!({
                "filename": file.filename,
                "filepath": file.filepath,
                "file_size": file.file_size,
                "md5": file.md5_digest,
                "is_fat": file.is_fat,
                "headers": file.headers.iter().map(|h| serde_json::json!({
                    "cpu_type": report::cpu_type_name(h.cpu_type),
                    "file_type": report::file_type_name(h.file_type),
                    "is_64_bit": h.is_64_bit,
                    "endianness": h.endianness,
                    "ncmds": h.ncmds,
                    "arch_offset": h.arch_offset,
                    "arch_size": h.arch_size,
                })).collect::<Vec<_>>(),
                "segment_count": file.segments.len(),
                "symbol_count": file.symbols.len(),
                "cross_reference_count": file.cross_references.len(),
                "warnings": file.warnings,
                "slice_failures": file.slice_failures,
            });
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        println!("{} ({} bytes)", file.filename, file.file_size);
        println!("  path:   {}", file.filepath);
        println!("  md5:    {}", file.md5_digest);
        println!(
            "  format: {}",
            if file.is_fat {
                "fat/universal"
            } else {
                "thin"
            }
        );
        println!();

        for (i, header) in file.headers.iter().enumerate() {
            let arch = report::cpu_type_name(header.cpu_type);
            let kind = report::file_type_name(header.file_type);
            let width = if header.is_64_bit { "64-bit" } else { "32-bit" };
            match header.arch_offset {
                Some(offset) => println!(
                    "slice {}: {} {} {} at 0x{:x}, {} load commands",
                    i, arch, width, kind, offset, header.ncmds
                ),
                None => println!(
                    "slice {}: {} {} {}, {} load commands",
                    i, arch, width, kind, header.ncmds
                ),
            }
        }

        if !file.segments.is_empty() {
            println!();
            println!(
                "{:<18} {:>14} {:>12} {:<6} {:>8}",
                "SEGMENT", "VMADDR", "VMSIZE", "PROT", "SECTIONS"
            );
            for segment in &file.segments {
                println!(
                    "{:<18} {:>14} {:>12} {:<6} {:>8}",
                    super::clip(&segment.segname, 16),
                    format!("0x{:x}", segment.vmaddr),
                    format!("0x{:x}", segment.vmsize),
                    report::protection_string(segment.initprot),
                    segment.sections.len(),
                );
            }
        }

        println!();
        println!(
            "{} symbols, {} cross-references",
            file.symbols.len(),
            file.cross_references.len()
        );

        Ok(())
    }
}
