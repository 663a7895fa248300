//! End-to-end conversion of synthetic pcapng captures

use usbreplay::config::Config;
use usbreplay::convert::{inspect, Action, ConvertError, Converter};
use usbreplay::render::OutputFormat;
use usbreplay::urb::{DecodeError, ErrorKind};

use crate::helpers::{
    sample_session, urb, CaptureBuilder, BULK, COMPLETE, CONTROL, INTERRUPT, SUBMIT,
};

const SET_CONFIGURATION: [u8; 8] = [0x00, 0x09, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];

fn convert(capture: &[u8]) -> String {
    let mut out = Vec::new();
    Converter::default()
        .run(capture, &mut out)
        .expect("conversion should succeed");
    String::from_utf8(out).unwrap()
}

// ============================================================================
// Single-record scenarios
// ============================================================================

#[test]
fn control_out_submit_becomes_control_transfer_out() {
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, CONTROL, 0x00, SET_CONFIGURATION, &[0xAA, 0xBB]))
        .build();

    insta::assert_snapshot!(convert(&capture), @r###"
    .then(() => device.controlTransferOut({
        requestType: 'standard',
        recipient: 'device',
        request: 0x09,
        value: 0x0001,
        index: 0x0000}, Uint8Array.from([0xAA, 0xBB])))
    "###);
}

#[test]
fn control_out_complete_produces_nothing() {
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(COMPLETE, CONTROL, 0x00, SET_CONFIGURATION, &[]))
        .build();

    assert_eq!(convert(&capture), "");
}

#[test]
fn bulk_in_complete_becomes_transfer_in_with_log() {
    let record = urb(COMPLETE, BULK, 0x81, [0; 8], &[0u8; 6]);
    assert_eq!(record.len(), 70);
    let capture = CaptureBuilder::usbmon().packet(0, &record).build();

    assert_eq!(
        convert(&capture),
        ".then(() => device.transferIn(0x01, 6))\n.then(resp => console.log(resp))\n"
    );
}

#[test]
fn bulk_in_submit_produces_nothing() {
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, BULK, 0x81, [0; 8], &[]))
        .build();

    assert_eq!(convert(&capture), "");
}

#[test]
fn unmapped_recipient_is_reported_with_record_index() {
    let bad_setup = [0x1F, 0x09, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00];
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, BULK, 0x81, [0; 8], &[]))
        .packet(0, &urb(SUBMIT, CONTROL, 0x00, bad_setup, &[0xAA]))
        .build();

    let mut out = Vec::new();
    let err = Converter::default().run(&capture[..], &mut out).unwrap_err();

    assert!(out.is_empty(), "no event may be emitted for the bad record");
    match err {
        ConvertError::Record { index, source, .. } => {
            assert_eq!(index, 1);
            assert_eq!(source.kind(), ErrorKind::UnmappedField);
            assert_eq!(
                source,
                DecodeError::UnmappedRecipient {
                    raw: 0x1F,
                    bits: 0x1F
                }
            );
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn invalid_phase_is_malformed() {
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(b'E', BULK, 0x02, [0; 8], &[]))
        .build();

    let err = Converter::default()
        .run(&capture[..], &mut Vec::new())
        .unwrap_err();
    match err {
        ConvertError::Record { source, .. } => {
            assert_eq!(source, DecodeError::InvalidPhase(b'E'));
            assert_eq!(source.kind(), ErrorKind::MalformedRecord);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn interrupt_transfers_never_emit_or_fail() {
    // Garbage phase byte and a short record: still not an error
    let mut noisy = urb(b'?', INTERRUPT, 0x83, [0; 8], &[]);
    noisy.truncate(16);
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, INTERRUPT, 0x83, [0; 8], &[]))
        .packet(0, &urb(COMPLETE, INTERRUPT, 0x83, [0; 8], &[1, 2, 3, 4]))
        .packet(0, &noisy)
        .build();

    let mut out = Vec::new();
    let stats = Converter::default().run(&capture[..], &mut out).unwrap();
    assert!(out.is_empty());
    assert_eq!(stats.unsupported, 3);
}

// ============================================================================
// Whole sessions
// ============================================================================

#[test]
fn sample_session_script() {
    insta::assert_snapshot!(convert(&sample_session()), @r###"
    .then(() => device.controlTransferOut({
        requestType: 'standard',
        recipient: 'device',
        request: 0x09,
        value: 0x0001,
        index: 0x0000}, Uint8Array.from([])))
    .then(() => device.controlTransferOut({
        requestType: 'class',
        recipient: 'interface',
        request: 0x09,
        value: 0x0200,
        index: 0x0001}, Uint8Array.from([0x02, 0x10, 0x20])))
    .then(() => device.controlTransferIn({
        requestType: 'standard',
        recipient: 'device',
        request: 0x06,
        value: 0x0100,
        index: 0x0000}, 18))
    .then(resp => console.log(resp))
    .then(() => device.transferOut(0x02, Uint8Array.from([0xDE, 0xAD, 0xBE, 0xEF])))
    .then(() => device.transferIn(0x01, 6))
    .then(resp => console.log(resp))
    "###);
}

#[test]
fn sample_session_stats() {
    let mut out = Vec::new();
    let stats = Converter::default()
        .run(&sample_session()[..], &mut out)
        .unwrap();

    assert_eq!(stats.blocks, 15);
    assert_eq!(stats.records, 12);
    assert_eq!(stats.emitted, 5);
    assert_eq!(stats.skipped_phase, 5);
    assert_eq!(stats.unsupported, 2);
    assert_eq!(stats.bytes_out, 3 + 4);
    assert_eq!(stats.bytes_in, 18 + 6);
}

#[test]
fn converting_twice_gives_identical_output() {
    let capture = sample_session();
    assert_eq!(convert(&capture), convert(&capture));
}

#[test]
fn json_lines_output() {
    let mut out = Vec::new();
    Converter::default()
        .with_format(OutputFormat::Json)
        .run(&sample_session()[..], &mut out)
        .unwrap();

    let text = String::from_utf8(out).unwrap();
    let calls: Vec<String> = text
        .lines()
        .map(|line| {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            value["call"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(
        calls,
        vec![
            "controlTransferOut",
            "controlTransferOut",
            "controlTransferIn",
            "transferOut",
            "transferIn",
        ]
    );
}

#[test]
fn configured_preamble_and_device_name() {
    let config = Config::parse(
        r#"
[output]
device = "dev"
preamble = "dev.open()"
postamble = ".catch(console.error);"
"#,
    )
    .unwrap();

    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, BULK, 0x01, [0; 8], &[0x05]))
        .build();
    let mut out = Vec::new();
    Converter::new(&config).run(&capture[..], &mut out).unwrap();

    assert_eq!(
        String::from_utf8(out).unwrap(),
        "dev.open()\n.then(() => dev.transferOut(0x01, Uint8Array.from([0x05])))\n.catch(console.error);\n"
    );
}

#[test]
fn packets_on_non_usbmon_interfaces_are_skipped() {
    // Interface 0 is Ethernet, interface 1 is usbmon
    let capture = CaptureBuilder::new()
        .interface(1)
        .interface(usbreplay::capture::LINKTYPE_USB_LINUX_MMAPPED)
        .packet(0, &[0xFF; 60])
        .packet(1, &urb(SUBMIT, BULK, 0x02, [0; 8], &[0x01]))
        .build();

    let mut out = Vec::new();
    let stats = Converter::default().run(&capture[..], &mut out).unwrap();
    assert_eq!(stats.foreign, 1);
    assert_eq!(stats.emitted, 1);
}

// ============================================================================
// Inspection
// ============================================================================

#[test]
fn inspection_continues_past_bad_records() {
    let bad_setup = [0x40, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
    let capture = CaptureBuilder::usbmon()
        .packet(0, &urb(SUBMIT, CONTROL, 0x00, bad_setup, &[]))
        .packet(0, &urb(COMPLETE, BULK, 0x81, [0; 8], &[0u8; 2]))
        .build();

    let rows: Vec<_> = inspect(&capture[..], &Config::default().capture)
        .unwrap()
        .map(|row| row.unwrap())
        .collect();

    assert_eq!(rows.len(), 2);
    assert!(matches!(
        rows[0].action,
        Action::Invalid(DecodeError::UnmappedRequestType { raw: 0x40, bits: 2 })
    ));
    assert_eq!(rows[1].index, 1);
    assert_eq!(rows[1].action.label(), "emit");
}
