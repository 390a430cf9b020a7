//! Unit tests for HID report serialization and LED parsing.
//!
//! These tests run on the host (not embedded) and verify the byte
//! layouts handed to the USB endpoints.

use super::keyboard::{KeyboardLeds, KeyboardReport, KEYBOARD_REPORT_SIZE};
use super::mouse::{MouseReport, MOUSE_REPORT_SIZE};

// ═══════════════════════════════════════════════════════════════════════════
// Keyboard Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn keyboard_report_empty() {
    let mut buf = [0xAAu8; 8];
    assert_eq!(KeyboardReport::empty().serialize(&mut buf), KEYBOARD_REPORT_SIZE);
    assert_eq!(buf, [0x00; KEYBOARD_REPORT_SIZE]);
}

#[test]
fn keyboard_report_single_key_layout() {
    let report = KeyboardReport::key(0x4F);

    let mut buf = [0xAAu8; 8];
    let written = report.serialize(&mut buf);

    assert_eq!(written, KEYBOARD_REPORT_SIZE);
    assert_eq!(buf, [0x00, 0x00, 0x4F, 0x00, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn keyboard_report_serialize_buffer_too_small() {
    let report = KeyboardReport::empty();
    let mut small_buf = [0u8; 4];
    let written = report.serialize(&mut small_buf);
    assert_eq!(written, 0); // Should fail gracefully
}

#[test]
fn keyboard_report_modifier_is_byte_zero() {
    let mut report = KeyboardReport::empty();
    report.modifier = 0x01; // Left Ctrl
    let mut buf = [0u8; 8];
    report.serialize(&mut buf);
    assert_eq!(buf[0], 0x01);
    assert_eq!(buf[1], 0x00);
}

// ═══════════════════════════════════════════════════════════════════════════
// LED Output Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn leds_empty_payload_is_ignored() {
    assert!(KeyboardLeds::from_output_report(&[]).is_none());
}

#[test]
fn leds_caps_lock_only() {
    let leds = KeyboardLeds::from_output_report(&[0x02]).unwrap();
    assert!(leds.caps_lock());
    assert!(!leds.num_lock());
    assert!(!leds.scroll_lock());
}

#[test]
fn leds_extra_bytes_are_ignored() {
    let leds = KeyboardLeds::from_output_report(&[0x05, 0xFF]).unwrap();
    assert!(leds.num_lock());
    assert!(!leds.caps_lock());
    assert!(leds.scroll_lock());
}

// ═══════════════════════════════════════════════════════════════════════════
// Mouse Report Tests
// ═══════════════════════════════════════════════════════════════════════════

#[test]
fn mouse_report_default_is_all_zero() {
    let mut buf = [0xAAu8; MOUSE_REPORT_SIZE];
    assert_eq!(MouseReport::default().serialize(&mut buf), MOUSE_REPORT_SIZE);
    assert_eq!(buf, [0x00; MOUSE_REPORT_SIZE]);
}

#[test]
fn mouse_report_layout_is_buttons_x_y_wheel_pan() {
    let report = MouseReport {
        buttons: 0x03,
        x: -18,
        y: 7,
        wheel: -1,
        pan: 2,
    };
    let mut buf = [0u8; 8];
    let written = report.serialize(&mut buf);

    assert_eq!(written, MOUSE_REPORT_SIZE);
    assert_eq!(&buf[..MOUSE_REPORT_SIZE], &[0x03, 0xEE, 0x07, 0xFF, 0x02]);
}

#[test]
fn mouse_report_serialize_buffer_too_small() {
    let report = MouseReport::default();
    let mut buf = [0u8; 4];
    assert_eq!(report.serialize(&mut buf), 0);
}
