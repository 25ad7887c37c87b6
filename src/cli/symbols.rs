//! Symbols command implementation.

use clap::{Args, ValueEnum};
use machoscope::config::MachoscopeConfig;
use machoscope::report;
use machoscope_core::{DecodeOptions, Symbol};
use std::path::PathBuf;

/// Classification filter for symbol listings.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SymbolFilter {
    /// Neither external nor debug.
    Local,
    /// External and defined.
    External,
    /// Not defined.
    Undefined,
    /// Debug (stab) entries.
    Debug,
}

impl SymbolFilter {
    fn matches(self, symbol: &Symbol) -> bool {
        match self {
            SymbolFilter::Local => symbol.is_local,
            SymbolFilter::External => symbol.is_external && symbol.is_defined,
            SymbolFilter::Undefined => !symbol.is_defined,
            SymbolFilter::Debug => symbol.is_debug,
        }
    }
}

/// Show the symbol table with classifications.
#[derive(Args, Debug)]
pub struct SymbolsCmd {
    /// Path to the Mach-O binary.
    pub path: PathBuf,

    /// Only show symbols in one classification bucket.
    #[arg(long, value_enum)]
    pub filter: Option<SymbolFilter>,

    /// Show every symbol instead of the configured page.
    #[arg(long)]
    pub all: bool,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

impl SymbolsCmd {
    /// Execute the symbols command.
    pub fn run(&self, config: &mut MachoscopeConfig) -> machoscope::Result<()> {
        let options = DecodeOptions {
            build_cross_references: false,
            ..Default::default()
        };
        let file = super::decode_for_display(&self.path, &options, self.json)?;
        config.record_recent(&file);

        let census = report::symbol_census(&file.symbols);
        let selected: Vec<&Symbol> = file
            .symbols
            .iter()
            .filter(|s| self.filter.map_or(true, |f| f.matches(s)))
            .collect();

        if self.json {
            let output = serde_json::json!({
                "symtab": file.symtab,
                "dysymtab": file.dysymtab,
                "census": census,
                "symbols": selected.iter().map(|s| serde_json::json!({
                    "name": s.name,
                    "type": format!("0x{:02x}", s.n_type),
                    "type_name": report::symbol_type_name(s.n_type),
                    "sect": s.n_sect,
                    "desc": s.n_desc,
                    "value": s.n_value,
                    "external": s.is_external,
                    "debug": s.is_debug,
                    "local": s.is_local,
                    "defined": s.is_defined,
                })).collect::<Vec<_>>(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
            return Ok(());
        }

        match &file.symtab {
            Some(symtab) => println!(
                "symbol table: {} symbols at 0x{:x}, strings {} bytes at 0x{:x}",
                symtab.nsyms, symtab.symoff, symtab.strsize, symtab.stroff
            ),
            None => {
                println!("No symbol table");
                return Ok(());
            }
        }
        if let Some(dysym) = &file.dysymtab {
            println!(
                "dynamic: {} local / {} external / {} undefined",
                dysym.nlocalsym, dysym.nextdefsym, dysym.nundefsym
            );
        }
        println!(
            "census: {} total, {} local, {} external, {} undefined, {} debug",
            census.total, census.local, census.external_defined, census.undefined, census.debug
        );
        println!();

        let page = if self.all {
            selected.len()
        } else {
            config.symbol_page_size
        };
        println!(
            "{:<40} {:>18} {:<20} {:<6}",
            "NAME", "VALUE", "TYPE", "SECT"
        );
        for symbol in selected.iter().take(page) {
            println!(
                "{:<40} {:>18} {:<20} {:<6}",
                super::clip(&symbol.name, 38),
                format!("0x{:x}", symbol.n_value),
                report::symbol_type_name(symbol.n_type),
                symbol.n_sect,
            );
        }
        if selected.len() > page {
            println!("... {} more (use --all)", selected.len() - page);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use machoscope_core::SymbolId;

    fn symbol(n_type: u8) -> Symbol {
        let external = n_type & 0x01 != 0;
        let debug = n_type & 0xe0 != 0;
        let masked = n_type & 0x0e;
        Symbol {
            id: SymbolId(0),
            name: "_s".into(),
            n_type,
            n_sect: 1,
            n_desc: 0,
            n_value: 0,
            is_external: external,
            is_debug: debug,
            is_local: !external && !debug,
            is_defined: masked == 0x0e || masked == 0x02,
        }
    }

    #[test]
    fn filters_select_disjoint_buckets() {
        let local = symbol(0x0e);
        let external = symbol(0x0f);
        let undefined = symbol(0x01);
        let debug = symbol(0x2e);

        assert!(SymbolFilter::Local.matches(&local));
        assert!(!SymbolFilter::Local.matches(&external));
        assert!(SymbolFilter::External.matches(&external));
        assert!(!SymbolFilter::External.matches(&undefined));
        assert!(SymbolFilter::Undefined.matches(&undefined));
        assert!(SymbolFilter::Debug.matches(&debug));
        assert!(!SymbolFilter::Debug.matches(&local));
    }
}
