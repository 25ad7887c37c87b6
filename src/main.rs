//! Binary entry point for the machoscope CLI.

use clap::{Parser, Subcommand};
use machoscope::config::MachoscopeConfig;
use tracing_subscriber::EnvFilter;

mod cli;

/// machoscope - structural analyzer for Mach-O binaries
#[derive(Parser, Debug)]
#[command(name = "machoscope")]
#[command(about = "Structural analyzer for Mach-O binaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show a file overview: identity, headers, segment census.
    Inspect(cli::inspect::InspectCmd),

    /// Show headers and their load commands.
    Headers(cli::headers::HeadersCmd),

    /// Show segments and their sections.
    Segments(cli::segments::SegmentsCmd),

    /// Show the symbol table with classifications.
    #[command(alias = "syms")]
    Symbols(cli::symbols::SymbolsCmd),

    /// Build and show cross-references between sections and symbols.
    Xrefs(cli::xrefs::XrefsCmd),
}

impl Commands {
    fn dispatch(self, config: &mut MachoscopeConfig) -> machoscope::Result<()> {
        match self {
            Commands::Inspect(cmd) => cmd.run(config),
            Commands::Headers(cmd) => cmd.run(config),
            Commands::Segments(cmd) => cmd.run(config),
            Commands::Symbols(cmd) => cmd.run(config),
            Commands::Xrefs(cmd) => cmd.run(config),
        }
    }
}

fn main() {
    // RUST_LOG overrides the default filter; decode warnings reach stderr
    // through the CLI layer either way.
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("machoscope=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    tracing::debug!(version = machoscope::VERSION, "machoscope starting");

    // An unreadable config file should not block analysis.
    let mut config = MachoscopeConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unreadable, starting from defaults");
        MachoscopeConfig::default()
    });

    if let Err(e) = cli.command.dispatch(&mut config) {
        tracing::error!(error = %e, "command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Best effort: losing the recent-file registry is not worth failing a
    // command that already printed its output.
    if let Err(e) = config.save() {
        tracing::warn!(error = %e, "could not persist config");
    }
}
