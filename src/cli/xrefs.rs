//! Xrefs command implementation.

use clap::Args;
use machoscope::config::MachoscopeConfig;
use machoscope_core::{DecodeOptions, EntityKind, MachoFile, ReferenceKind, SectionId, SymbolId};
use std::path::PathBuf;

/// Build and show cross-references between sections and symbols.
#[derive(Args, Debug)]
pub struct XrefsCmd {
    /// Path to the Mach-O binary.
    pub path: PathBuf,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl XrefsCmd {
    /// Execute the xrefs command.
    pub fn run(&self, config: &mut MachoscopeConfig) -> machoscope::Result<()> {
        let options = DecodeOptions::default();
        let file = super::decode_for_display(&self.path, &options, self.json)?;
        config.record_recent(&file);

        if self.json {
            let edges: Vec<_> = file
                .cross_references
                .iter()
                .map(|x| {
                    serde_json::json!({
                        "source": endpoint_name(&file, x.source_kind, x.source_id),
                        "source_kind": x.source_kind,
                        "target": endpoint_name(&file, x.target_kind, x.target_id),
                        "target_kind": x.target_kind,
                        "offset": x.offset,
                        "kind": x.kind,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&edges)?);
            return Ok(());
        }

        if file.cross_references.is_empty() {
            println!("No cross-references");
            return Ok(());
        }

        println!(
            "{:<32} {:<12} {:<32} {:>10}",
            "SOURCE", "KIND", "TARGET", "OFFSET"
        );
        for xref in &file.cross_references {
            let kind = match xref.kind {
                ReferenceKind::Contains => "contains",
                ReferenceKind::References => "references",
            };
            let offset = xref
                .offset
                .map(|o| format!("+0x{:x}", o))
                .unwrap_or_else(|| "-".to_string());
            println!(
                "{:<32} {:<12} {:<32} {:>10}",
                super::clip(&endpoint_name(&file, xref.source_kind, xref.source_id), 30),
                kind,
                super::clip(&endpoint_name(&file, xref.target_kind, xref.target_id), 30),
                offset,
            );
        }
        println!();
        println!("{} cross-references", file.cross_references.len());

        Ok(())
    }
}

/// Resolve an edge endpoint to a display name.
fn endpoint_name(file: &MachoFile, kind: EntityKind, id: u32) -> String {
    match kind {
        EntityKind::Section => file
            .section_by_id(SectionId(id))
            .map(|s| format!("{},{}", s.segname, s.sectname))
            .unwrap_or_else(|| format!("section #{}", id)),
        EntityKind::Symbol => file
            .symbol_by_id(SymbolId(id))
            .map(|s| s.name.clone())
            .unwrap_or_else(|| format!("symbol #{}", id)),
    }
}
