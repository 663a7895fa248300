//! Integration tests for the usbreplay binary

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

use crate::helpers::{sample_session, temp_capture, urb, CaptureBuilder, BULK, CONTROL, SUBMIT};

/// usbreplay with the user's config directory pointed somewhere empty.
fn usbreplay() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_usbreplay"));
    cmd.env("XDG_CONFIG_HOME", "/nonexistent-usbreplay-config")
        .env_remove("USBREPLAY_LOG");
    cmd
}

// ============================================================================
// Help and usage
// ============================================================================

#[test]
fn no_arguments_exits_2() {
    usbreplay()
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn version_names_the_crate_version() {
    usbreplay()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with(concat!(
            "usbreplay ",
            env!("CARGO_PKG_VERSION")
        )));
}

#[test]
fn convert_help_mentions_phase_rule() {
    usbreplay()
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("<FILE>"))
        .stdout(predicate::str::contains("completion record"));
}

#[test]
fn completions_for_bash() {
    usbreplay()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("usbreplay"));
}

// ============================================================================
// convert
// ============================================================================

#[test]
fn convert_prints_script_to_stdout() {
    let (_dir, path) = temp_capture(&sample_session());

    usbreplay()
        .arg("convert")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::starts_with(
            ".then(() => device.controlTransferOut({\n    requestType: 'standard',",
        ))
        .stdout(predicate::str::contains(
            ".then(() => device.transferOut(0x02, Uint8Array.from([0xDE, 0xAD, 0xBE, 0xEF])))\n",
        ))
        .stdout(predicate::str::ends_with(
            ".then(() => device.transferIn(0x01, 6))\n.then(resp => console.log(resp))\n",
        ));
}

#[test]
fn convert_reads_stdin() {
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, BULK, 0x01, [0; 8], &[0x7F]))
        .build();

    usbreplay()
        .args(["convert", "-"])
        .write_stdin(capture)
        .assert()
        .success()
        .stdout(".then(() => device.transferOut(0x01, Uint8Array.from([0x7F])))\n");
}

#[test]
fn convert_writes_output_file() {
    let (dir, path) = temp_capture(&sample_session());
    let script = dir.path().join("replay.js");

    usbreplay()
        .arg("convert")
        .arg(&path)
        .arg("-o")
        .arg(&script)
        .assert()
        .success()
        .stdout("")
        .stderr(predicate::str::contains("Wrote 5 calls"));

    let text = std::fs::read_to_string(&script).unwrap();
    assert_eq!(text.matches(".then(() => device.").count(), 5);
}

#[test]
fn convert_json_format_and_device_flag() {
    let (_dir, path) = temp_capture(&sample_session());

    let output = usbreplay()
        .arg("convert")
        .arg(&path)
        .args(["-f", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 5);
    assert!(stdout.starts_with("{\"call\":\"controlTransferOut\""));

    usbreplay()
        .arg("convert")
        .arg(&path)
        .args(["--device", "usb"])
        .assert()
        .success()
        .stdout(predicate::str::contains("usb.transferIn(0x01, 6)"));
}

#[test]
fn verbose_convert_logs_summary_once() {
    let (_dir, path) = temp_capture(&sample_session());

    let output = usbreplay()
        .arg("-v")
        .arg("convert")
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(stderr.matches("5 transfers from 12 records").count(), 1, "{}", stderr);
}

#[test]
fn convert_missing_file_fails() {
    usbreplay()
        .args(["convert", "/nonexistent/capture.pcapng"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to open capture"));
}

#[test]
fn convert_not_a_capture_fails() {
    let (_dir, path) = temp_capture(b"hello, world");

    usbreplay()
        .arg("convert")
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Unrecognized capture format"));
}

#[test]
fn convert_bad_record_keeps_earlier_calls() {
    let vendor_setup = [0x41, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, BULK, 0x02, [0; 8], &[0x01]))
        .packet(0, &urb(SUBMIT, CONTROL, 0x00, vendor_setup, &[]))
        .build();
    let (_dir, path) = temp_capture(&capture);

    usbreplay()
        .arg("convert")
        .arg(&path)
        .assert()
        .code(1)
        .stdout(".then(() => device.transferOut(0x02, Uint8Array.from([0x01])))\n")
        .stderr(predicate::str::contains("Record #1"))
        .stderr(predicate::str::contains("unmapped field"))
        .stderr(predicate::str::contains("bmRequestType 0x41"));
}

// ============================================================================
// inspect
// ============================================================================

#[test]
fn inspect_lists_every_record() {
    let (_dir, path) = temp_capture(&sample_session());

    let output = usbreplay().arg("inspect").arg(&path).output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.starts_with("     #"));
    assert!(stdout.contains("transferIn 0x01, 6 bytes"));
    assert!(stdout.contains("transfer type 0x01"));
    assert!(stdout.contains("5 emit, 5 skip, 2 unsupported, 0 error"));
}

#[test]
fn inspect_relevant_hides_skipped_records() {
    let (_dir, path) = temp_capture(&sample_session());

    let output = usbreplay()
        .arg("inspect")
        .arg(&path)
        .arg("--relevant")
        .output()
        .unwrap();
    let stdout = String::from_utf8(output.stdout).unwrap();

    assert_eq!(stdout.lines().filter(|l| l.contains(" emit ")).count(), 5);
    assert!(!stdout.contains(" skip "));
    assert!(!stdout.contains(" unsupported "));
    // Totals still cover every record
    assert!(stdout.contains("5 emit, 5 skip, 2 unsupported, 0 error"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn config_show_prints_defaults() {
    usbreplay()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("device = \"device\""))
        .stdout(predicate::str::contains("skip_foreign_link_types = true"));
}

#[test]
fn config_file_sets_device_and_preamble() {
    let dir = TempDir::new().unwrap();
    let config = dir.path().join("config.toml");
    std::fs::write(
        &config,
        "[output]\ndevice = \"dev\"\npreamble = \"// replay\"\n",
    )
    .unwrap();
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, BULK, 0x02, [0; 8], &[0x10]))
        .build();
    let (_capture_dir, path) = temp_capture(&capture);

    usbreplay()
        .arg("--config")
        .arg(&config)
        .arg("convert")
        .arg(&path)
        .assert()
        .success()
        .stdout("// replay\n.then(() => dev.transferOut(0x02, Uint8Array.from([0x10])))\n");
}

#[test]
fn config_path_honours_flag() {
    usbreplay()
        .args(["config", "path", "--config", "/tmp/usbreplay-test.toml"])
        .assert()
        .success()
        .stdout("/tmp/usbreplay-test.toml\n");
}

#[test]
fn explicit_missing_config_is_an_error() {
    usbreplay()
        .args(["config", "show", "--config", "/nonexistent/usbreplay.toml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Config file not found"));
}
