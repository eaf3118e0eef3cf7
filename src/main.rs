//! Cassette CLI - Glyph Composition Compiler
//!
//! Command-line interface for the Cassette glyph toolchain.

use std::time::Duration;

use clap::Parser;
use env_logger::Env;
use log::debug;

use cassette::cli::{commands, Cli, Commands};
use cassette::{CassetteConfig, CassetteError, Result};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    debug!("Cassette v{}", env!("CARGO_PKG_VERSION"));

    let Some(command) = cli.command else {
        println!("Cassette v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for available commands");
        return Ok(());
    };

    let config = CassetteConfig::from_env();
    handle_command(&config, command).map_err(|e: CassetteError| {
        if let Some(suggestion) = e.recovery_suggestion() {
            eprintln!("hint: {}", suggestion);
        }
        let code = e.error_code();
        anyhow::Error::new(e).context(code)
    })
}

fn handle_command(config: &CassetteConfig, command: Commands) -> Result<()> {
    match command {
        Commands::Compile {
            labels,
            output,
            watermark,
        } => commands::compile(&labels, &output, watermark.as_deref()),
        Commands::Tag {
            audio,
            cassette,
            output,
            title,
        } => commands::tag(config, &audio, &cassette, &output, &title),
        Commands::Export {
            composition,
            audio,
            output,
            watermark,
        } => commands::export(config, &composition, &audio, &output, watermark.as_deref()),
        Commands::Port {
            composition,
            audio,
            to,
            output,
            watermark,
        } => commands::port_composition(
            config,
            &composition,
            &audio,
            &to,
            &output,
            watermark.as_deref(),
        ),
        Commands::Inspect { cassette } => commands::inspect(&cassette),
        Commands::Effects { model, track } => {
            commands::effects(model.as_deref(), track.as_deref())
        }
        Commands::Preview {
            composition,
            from_ms,
            wait,
        } => commands::preview(config, &composition, from_ms, Duration::from_secs(wait)),
    }
}
