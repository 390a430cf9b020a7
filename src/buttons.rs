//! Button sampling. All buttons are wired active-low against pull-ups.

use core::ops::BitOr;

/// Mouse button bitfield, bit-compatible with byte 0 of the mouse report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonMask(u8);

impl ButtonMask {
    pub const NONE: Self = Self(0);
    pub const LEFT: Self = Self(1 << 0);
    pub const RIGHT: Self = Self(1 << 1);
    pub const MIDDLE: Self = Self(1 << 2);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear the bits of `button`.
    pub fn set(&mut self, button: Self, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }
}

impl BitOr for ButtonMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Instantaneous line levels, `true` where the line reads low.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonLevels {
    pub left_low: bool,
    pub right_low: bool,
    /// Board button driving the keyboard side channel and remote wakeup.
    pub trigger_low: bool,
}

impl ButtonLevels {
    /// Mouse buttons pressed in this snapshot.
    pub fn mask(&self) -> ButtonMask {
        let mut mask = ButtonMask::NONE;
        mask.set(ButtonMask::LEFT, self.left_low);
        mask.set(ButtonMask::RIGHT, self.right_low);
        mask
    }

    pub fn trigger_pressed(&self) -> bool {
        self.trigger_low
    }
}
