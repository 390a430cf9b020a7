//! Unified error type for adns-mouse.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! The sensor transport itself has no error channel: a mis-timed or
//! mis-wired bus yields wrong data, not an `Error`.

/// Top-level error type used across the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Sensor
    /// The product-ID probe read something other than an ADNS-5050.
    UnexpectedProductId(u8),

    // USB
    /// USB stack returned an error while writing a report.
    Usb,

    /// The host did not accept a remote wakeup request.
    RemoteWakeup,

    // Generic
    /// Buffer too small for the requested operation.
    BufferOverflow,
}
