//! HID report types exchanged with the USB HID channel.
//!
//! Only the byte layout lives here; descriptors come from `usbd-hid` on the
//! embedded side so the two interfaces stay boot-protocol compatible.

pub mod keyboard;
pub mod mouse;

#[cfg(test)]
mod tests;

pub use keyboard::{KeyboardLeds, KeyboardReport};
pub use mouse::MouseReport;
