//! usbreplay command line entry point

mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use usbreplay::cli::{Cli, Commands, ConfigCommands};

/// Environment variable holding a tracing filter, e.g. `usbreplay=debug`.
const LOG_ENV: &str = "USBREPLAY_LOG";

/// Log to stderr so stdout carries only the generated script.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Convert {
            file,
            output,
            format,
            device,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::convert::handle(&file, output.as_deref(), format, device, config)
        }
        Commands::Inspect { file, relevant } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::inspect::handle(&file, relevant, &config)
        }
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show => commands::config::handle_show(cli.config.as_deref()),
            ConfigCommands::Path => commands::config::handle_path(cli.config.as_deref()),
        },
        Commands::Completions { shell } => commands::completions::handle(shell),
    }
}
