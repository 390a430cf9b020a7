//! Motion decoding: raw sensor counts to signed deltas, accumulated between
//! reports.
//!
//! The accumulator is as narrow as the report fields and wraps on
//! overflow. A host that stops polling for long enough to collect more
//! than 127 counts on one axis sees the motion fold over.

/// Source of relative motion, one signed count per axis and read.
pub trait MotionSensor {
    fn delta_x(&mut self) -> i8;

    fn delta_y(&mut self) -> i8;
}

/// Interpret an 8-bit register value as two's complement.
pub fn twos_complement(raw: u8) -> i8 {
    if raw & 0x80 != 0 {
        -128 + (raw & 0x7F) as i8
    } else {
        raw as i8
    }
}

/// Orientation of the sensor relative to the report axes.
///
/// Swapping happens before inversion: with `swap_xy` set, `invert_x`
/// negates what was the sensor's Y axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMapping {
    pub swap_xy: bool,
    pub invert_x: bool,
    pub invert_y: bool,
}

impl AxisMapping {
    /// Sensor counts passed through unchanged.
    pub const IDENTITY: Self = Self {
        swap_xy: false,
        invert_x: false,
        invert_y: false,
    };

    /// Reference board: the X axis runs against the sensor's.
    pub const MOUNTED: Self = Self {
        swap_xy: false,
        invert_x: true,
        invert_y: false,
    };

    /// Map a raw sensor pair onto report axes.
    pub fn apply(&self, dx: i8, dy: i8) -> (i8, i8) {
        let (x, y) = if self.swap_xy { (dy, dx) } else { (dx, dy) };
        let x = if self.invert_x { x.wrapping_neg() } else { x };
        let y = if self.invert_y { y.wrapping_neg() } else { y };
        (x, y)
    }
}

/// X/Y counts collected since the last emitted report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MotionAccumulator {
    x: i8,
    y: i8,
}

impl MotionAccumulator {
    pub const fn new() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Add one sensor reading after mapping it onto report axes.
    pub fn accumulate(&mut self, mapping: &AxisMapping, dx: i8, dy: i8) {
        let (x, y) = mapping.apply(dx, dy);
        self.x = self.x.wrapping_add(x);
        self.y = self.y.wrapping_add(y);
    }

    pub fn x(&self) -> i8 {
        self.x
    }

    pub fn y(&self) -> i8 {
        self.y
    }

    /// Return the collected counts and start over from zero.
    pub fn take(&mut self) -> (i8, i8) {
        let xy = (self.x, self.y);
        *self = Self::new();
        xy
    }
}
