//! Application-wide constants and compile-time configuration.
//!
//! All hardware pin assignments, timing parameters, and protocol
//! constants live here so they can be tuned in one place.

use crate::motion::AxisMapping;
use crate::sensor::{Resolution, Timing};

// Report cadence

/// Minimum spacing between two HID report emissions (ms).
pub const REPORT_INTERVAL_MS: u32 = 10;

/// Keycode sent on the keyboard interface while the trigger button is held
/// (USB HID usage 0x4F, Keyboard Right Arrow).
pub const TRIGGER_KEYCODE: u8 = 0x4F;

// Optical sensor

/// Bit-bang timing for the sensor at the RP2040's default 125 MHz clock.
pub const SENSOR_TIMING: Timing = Timing::ADNS5050;

/// Resolution written to the sensor once at boot.
pub const SENSOR_RESOLUTION: Resolution = Resolution::Cpi1000;

/// How raw sensor deltas map onto report axes for this board's mounting.
pub const SENSOR_AXES: AxisMapping = AxisMapping::MOUNTED;

/// Settle time after powering the sensor module, before the first sync (ms).
pub const SENSOR_POWER_SETTLE_MS: u64 = 1;

// USB

/// USB VID/PID - use the "pid.codes" open-source test VID.
/// Replace with your own allocated VID/PID for production.
pub const USB_VID: u16 = 0x1209;
pub const USB_PID: u16 = 0x0002;

/// USB device strings.
pub const USB_MANUFACTURER: &str = "adns-mouse";
pub const USB_PRODUCT: &str = "ADNS-5050 Mouse";
pub const USB_SERIAL_NUMBER: &str = "000001";

/// USB HID polling interval (ms).
pub const USB_HID_POLL_MS: u8 = 10;

// GPIO pin assignments (Raspberry Pi Pico)
//
// These are logical names; actual `embassy_rp::peripherals::*` types are
// selected in `main.rs`.  Adjust for your custom PCB.
//
//   Sensor SDIO        → GP16
//   Sensor SCLK        → GP14
//   Sensor nCS         → GP9
//   Sensor power       → GP12
//   Encoder phase A    → GP18
//   Encoder phase B    → GP10
//   Left button        → GP20
//   Right button       → GP11
//   Trigger button     → GP15
//   Status LED         → GP25 (on-board)
