//! Status LED policy: blink rate follows the USB bus state, Caps Lock
//! from the host holds the LED on.

use crate::hid::KeyboardLeds;

/// Blink half-period while no host has configured the device (ms).
pub const BLINK_NOT_MOUNTED_MS: u32 = 250;
/// Blink half-period while configured and running (ms).
pub const BLINK_MOUNTED_MS: u32 = 1000;
/// Blink half-period while the host has suspended the bus (ms).
pub const BLINK_SUSPENDED_MS: u32 = 2500;

/// USB bus state as seen by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusState {
    NotMounted,
    Mounted,
    Suspended,
}

impl BusState {
    pub fn from_flags(configured: bool, suspended: bool) -> Self {
        if suspended {
            BusState::Suspended
        } else if configured {
            BusState::Mounted
        } else {
            BusState::NotMounted
        }
    }
}

/// What the status LED should do.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LedMode {
    /// Toggle every `half_period_ms`.
    Blink { half_period_ms: u32 },
    Solid,
}

pub fn led_mode(bus: BusState, leds: KeyboardLeds) -> LedMode {
    if bus == BusState::Mounted && leds.caps_lock() {
        return LedMode::Solid;
    }
    let half_period_ms = match bus {
        BusState::NotMounted => BLINK_NOT_MOUNTED_MS,
        BusState::Mounted => BLINK_MOUNTED_MS,
        BusState::Suspended => BLINK_SUSPENDED_MS,
    };
    LedMode::Blink { half_period_ms }
}
