//! USB device subsystem - presents a composite HID device to the host.
//!
//! The RP2040's USB 1.1 full-speed controller is driven by `embassy-usb`.
//! Two HID interfaces, both with boot-compatible `usbd-hid` descriptors:
//!
//! - Interface 0: Keyboard (trigger button side channel, LED output report)
//! - Interface 1: Mouse    (buttons, X/Y, wheel, pan)
//!
//! The polling loop hands reports over through [`hid_device::UsbReportSink`];
//! one writer task per interface forwards them to the endpoint.

pub mod hid_device;
