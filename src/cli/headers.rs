//! Headers command implementation.

use clap::Args;
use machoscope::config::MachoscopeConfig;
use machoscope::report;
use machoscope_core::DecodeOptions;
use std::path::PathBuf;

/// Show headers and their load commands.
#[derive(Args, Debug)]
pub struct HeadersCmd {
    /// Path to the Mach-O binary.
    pub path: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl HeadersCmd {
    /// Execute the headers command.
    pub fn run(&self, config: &mut MachoscopeConfig) -> machoscope::Result<()> {
        let options = DecodeOptions {
            build_cross_references: false,
            ..Default::default()
        };
        let file = super::decode_for_display(&self.path, &options, self.json)?;
        config.record_recent(&file);

        if self.json {
            let headers: Vec<_> = file
                .headers
                .iter()
                .map(|h| {
                    serde_json::json!({
                        "magic": format!("0x{:08x}", h.magic),
                        "cpu_type": h.cpu_type,
                        "cpu_type_name": report::cpu_type_name(h.cpu_type),
                        "cpu_subtype": h.cpu_subtype,
                        "file_type": h.file_type,
                        "file_type_name": report::file_type_name(h.file_type),
                        "ncmds": h.ncmds,
                        "sizeofcmds": h.sizeofcmds,
                        "flags": format!("0x{:x}", h.flags),
                        "reserved": h.reserved,
                        "is_64_bit": h.is_64_bit,
                        "endianness": h.endianness,
                        "arch_offset": h.arch_offset,
                        "arch_size": h.arch_size,
                        "load_commands": h.load_commands.iter().map(|c| serde_json::json!({
                            "type": format!("0x{:x}", c.cmd_type),
                            "name": report::load_command_name(c.cmd_type),
                            "size": c.cmd_size,
                            "offset": c.cmd_offset,
                        })).collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&headers)?);
            return Ok(());
        }

        for (i, header) in file.headers.iter().enumerate() {
            println!("header {} (magic 0x{:08x})", i, header.magic);
            println!(
                "  cpu:        {} (subtype 0x{:x})",
                report::cpu_type_name(header.cpu_type),
                header.cpu_subtype
            );
            println!(
                "  file type:  {}",
                report::file_type_name(header.file_type)
            );
            println!("  flags:      0x{:x}", header.flags);
            println!(
                "  commands:   {} ({} bytes)",
                header.ncmds, header.sizeofcmds
            );
            if let (Some(offset), Some(size)) = (header.arch_offset, header.arch_size) {
                println!("  slice:      0x{:x} (+{} bytes)", offset, size);
            }

            if !header.load_commands.is_empty() {
                println!();
                println!("  {:<6} {:<26} {:>8} {:>10}", "#", "COMMAND", "SIZE", "OFFSET");
                for (j, cmd) in header.load_commands.iter().enumerate() {
                    println!(
                        "  {:<6} {:<26} {:>8} {:>10}",
                        j,
                        report::load_command_name(cmd.cmd_type),
                        cmd.cmd_size,
                        format!("0x{:x}", cmd.cmd_offset),
                    );
                }
            }
            println!();
        }

        Ok(())
    }
}
