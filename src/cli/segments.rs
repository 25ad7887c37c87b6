//! Segments command implementation.

use clap::Args;
use machoscope::config::MachoscopeConfig;
use machoscope::report;
use machoscope_core::DecodeOptions;
use std::path::PathBuf;

/// Show segments and their sections.
#[derive(Args, Debug)]
pub struct SegmentsCmd {
    /// Path to the Mach-O binary.
    pub path: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SegmentsCmd {
    /// Execute the segments command.
    pub fn run(&self, config: &mut MachoscopeConfig) -> machoscope::Result<()> {
        let options = DecodeOptions {
            build_cross_references: false,
            ..Default::default()
        };
        let file = super::decode_for_display(&self.path, &options, self.json)?;
        config.record_recent(&file);

        if self.json {
            let segments: Vec<_> = file
                .segments
                .iter()
                .map(|seg| {
                    serde_json::json!({
                        "segname": seg.segname,
                        "vmaddr": seg.vmaddr,
                        "vmsize": seg.vmsize,
                        "fileoff": seg.fileoff,
                        "filesize": seg.filesize,
                        "initprot": report::protection_string(seg.initprot),
                        "maxprot": report::protection_string(seg.maxprot),
                        "flags": seg.flags,
                        "sections": seg.sections.iter().map(|s| serde_json::json!({
                            "sectname": s.sectname,
                            "segname": s.segname,
                            "addr": s.addr,
                            "size": s.size,
                            "offset": s.offset,
                            "align": s.align,
                            "type": report::section_type_name(s),
                            "flags": format!("0x{:x}", s.flags),
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&segments)?);
            return Ok(());
        }

        if file.segments.is_empty() {
            println!("No segments");
            return Ok(());
        }

        for segment in &file.segments {
            println!(
                "{} [0x{:x}, 0x{:x}) {}/{}",
                segment.segname,
                segment.vmaddr,
                segment.vmaddr.saturating_add(segment.vmsize),
                report::protection_string(segment.initprot),
                report::protection_string(segment.maxprot),
            );
            for section in &segment.sections {
                println!(
                    "  {:<18} {:>14} {:>12} {:>6} {}",
                    super::clip(&section.sectname, 16),
                    format!("0x{:x}", section.addr),
                    format!("0x{:x}", section.size),
                    format!("2^{}", section.align),
                    report::section_type_name(section),
                );
            }
        }

        Ok(())
    }
}
