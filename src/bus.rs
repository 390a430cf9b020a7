//! USB bus flags shared between the device callbacks, the HID writer tasks
//! and the polling loop.
//!
//! Only plain loads and stores are used, which the Cortex-M0+ supports
//! without compare-and-swap.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::status::BusState;

/// Configured and suspended flags, fed by the USB device handler.
pub struct BusFlags {
    configured: AtomicBool,
    suspended: AtomicBool,
}

impl BusFlags {
    pub const fn new() -> Self {
        Self {
            configured: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
        }
    }

    /// Bus reset. The device is unconfigured and no longer suspended; a host
    /// may resume a suspended bus with a reset instead of a resume event.
    pub fn reset(&self) {
        self.configured.store(false, Ordering::Release);
        self.suspended.store(false, Ordering::Release);
    }

    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::Release);
    }

    pub fn set_suspended(&self, suspended: bool) {
        self.suspended.store(suspended, Ordering::Release);
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Acquire)
    }

    pub fn state(&self) -> BusState {
        BusState::from_flags(
            self.configured.load(Ordering::Acquire),
            self.is_suspended(),
        )
    }

    /// An interface may take a report: bus mounted and no transfer in flight.
    pub fn accepts(&self, interface: &InFlight) -> bool {
        self.state() == BusState::Mounted && !interface.is_busy()
    }
}

impl Default for BusFlags {
    fn default() -> Self {
        Self::new()
    }
}

/// Transfer state of one HID interface.
///
/// Claimed when a report is handed to the writer task, released once the
/// endpoint write has completed, so at most one report per interface is
/// ever outstanding.
pub struct InFlight {
    busy: AtomicBool,
}

impl InFlight {
    pub const fn new() -> Self {
        Self {
            busy: AtomicBool::new(false),
        }
    }

    pub fn claim(&self) {
        self.busy.store(true, Ordering::Release);
    }

    pub fn release(&self) {
        self.busy.store(false, Ordering::Release);
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}
