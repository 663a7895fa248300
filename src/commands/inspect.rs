//! Inspect command handler

use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use usbreplay::convert::{inspect, Action, RecordSummary};
use usbreplay::transfer::TransferEvent;
use usbreplay::urb::{Direction, Phase, TransferKind};
use usbreplay::Config;

use super::open_input;

/// Print one row per USB record.
#[cfg(not(tarpaulin_include))]
pub fn handle(file: &Path, relevant: bool, config: &Config) -> Result<()> {
    let input = open_input(file)?;
    let rows = inspect(input, &config.capture)
        .with_context(|| format!("Failed to read capture: {}", file.display()))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    writeln!(
        out,
        "{:>6} {:>10} {:>16} {:<2} {:<7} {:<3} {:>3} {:>7} {:<11} DETAIL",
        "#", "OFFSET", "URB", "PH", "TYPE", "DIR", "EP", "LEN", "ACTION"
    )?;

    let mut counts = [0usize; 4];
    for row in rows {
        let row = row.with_context(|| format!("Failed to read capture: {}", file.display()))?;
        counts[slot(&row.action)] += 1;

        if relevant && !matches!(row.action, Action::Emit(_) | Action::Invalid(_)) {
            continue;
        }
        writeln!(out, "{}", format_row(&row))?;
    }

    writeln!(
        out,
        "\n{} emit, {} skip, {} unsupported, {} error",
        counts[0], counts[1], counts[2], counts[3]
    )?;
    out.flush()?;
    Ok(())
}

fn slot(action: &Action) -> usize {
    match action {
        Action::Emit(_) => 0,
        Action::SkipPhase => 1,
        Action::Unsupported { .. } => 2,
        Action::Invalid(_) => 3,
    }
}

fn format_row(row: &RecordSummary) -> String {
    let (urb, phase, kind, dir, ep) = match &row.header {
        Some(h) => (
            format!("{:016x}", h.id),
            match h.phase {
                Phase::Submit => "S",
                Phase::Complete => "C",
            },
            match h.kind {
                TransferKind::Control => "control",
                TransferKind::Bulk => "bulk",
            },
            match h.direction {
                Direction::Out => "out",
                Direction::In => "in",
            },
            h.endpoint.to_string(),
        ),
        None => ("-".to_string(), "-", "-", "-", "-".to_string()),
    };

    format!(
        "{:>6} {:>10} {:>16} {:<2} {:<7} {:<3} {:>3} {:>7} {:<11} {}",
        row.index,
        row.offset,
        urb,
        phase,
        kind,
        dir,
        ep,
        row.length,
        row.action.label(),
        detail(&row.action)
    )
}

fn detail(action: &Action) -> String {
    match action {
        Action::Emit(event) => describe(event),
        Action::SkipPhase => String::new(),
        Action::Unsupported { transfer_type } => format!("transfer type {:#04x}", transfer_type),
        Action::Invalid(e) => e.to_string(),
    }
}

fn describe(event: &TransferEvent) -> String {
    match event {
        TransferEvent::ControlTransferOut { setup, data, .. } => format!(
            "controlTransferOut request 0x{:02X} value 0x{:04X} index 0x{:04X}, {} bytes",
            setup.request,
            setup.value,
            setup.index,
            data.len()
        ),
        TransferEvent::ControlTransferIn { setup, length, .. } => format!(
            "controlTransferIn request 0x{:02X} value 0x{:04X} index 0x{:04X}, {} bytes",
            setup.request, setup.value, setup.index, length
        ),
        TransferEvent::TransferOut { endpoint, data } => {
            format!("transferOut 0x{:02X}, {} bytes", endpoint, data.len())
        }
        TransferEvent::TransferIn { endpoint, length } => {
            format!("transferIn 0x{:02X}, {} bytes", endpoint, length)
        }
    }
}
