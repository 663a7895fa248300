//! CLI definitions for usbreplay.
//!
//! Lives in the library so `xtask` can generate man pages from it.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::render::OutputFormat;

#[cfg(not(feature = "release"))]
const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("VERGEN_GIT_SHA"),
    ", built ",
    env!("USBREPLAY_BUILD_DATE"),
    ")"
);

#[cfg(feature = "release")]
const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("USBREPLAY_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "usbreplay")]
#[command(version = VERSION)]
#[command(about = "Convert usbmon captures into WebUSB replay scripts")]
#[command(long_about = "Convert usbmon captures into WebUSB replay scripts.

Reads a pcapng or pcap capture of Linux usbmon traffic and prints one WebUSB
call per control or bulk transfer, in capture order, as a promise chain.

Capture with e.g.: tshark -i usbmon1 -w capture.pcapng")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Use this config file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert a capture into a replay script
    #[command(long_about = "Convert a capture into a replay script.

OUT transfers are taken from their submission record, IN transfers from their
completion record. Interrupt and isochronous transfers are ignored.

Conversion stops at the first record that cannot be decoded; the error names
the record's index and file offset. Use `usbreplay inspect` to look around it.")]
    Convert {
        /// Capture file (pcapng or pcap), or - for stdin
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Write the script here instead of stdout
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,

        /// JavaScript variable holding the USBDevice
        #[arg(long, value_name = "NAME")]
        device: Option<String>,
    },

    /// List every USB record and what conversion would do with it
    Inspect {
        /// Capture file (pcapng or pcap), or - for stdin
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only show records that would emit a call or fail to decode
        #[arg(long)]
        relevant: bool,
    },

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration as TOML
    Show,
    /// Print the config file location
    Path,
}
