//! Convert command handler

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::Path;

use anyhow::{Context, Result};

use usbreplay::render::OutputFormat;
use usbreplay::{Config, Converter};

use super::open_input;

/// Convert `file` into a replay script.
///
/// Command line flags override the config file.
#[cfg(not(tarpaulin_include))]
pub fn handle(
    file: &Path,
    output: Option<&Path>,
    format: Option<OutputFormat>,
    device: Option<String>,
    mut config: Config,
) -> Result<()> {
    if let Some(format) = format {
        config.output.format = format;
    }
    if let Some(device) = device {
        config.output.device = device;
    }

    let input = open_input(file)?;
    let converter = Converter::new(&config);

    match output {
        Some(path) => {
            let out = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            let mut writer = BufWriter::new(out);
            let stats = converter
                .run(input, &mut writer)
                .with_context(|| format!("Failed to convert {}", file.display()))?;
            eprintln!("Wrote {} calls to {}", stats.emitted, path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = BufWriter::new(stdout.lock());
            converter
                .run(input, &mut writer)
                .with_context(|| format!("Failed to convert {}", file.display()))?;
        }
    }

    Ok(())
}
