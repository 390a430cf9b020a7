//! Quadrature decoding for the scroll wheel, driven by edge events.
//!
//! The edge handlers only know which line toggled, not the level of the
//! other one. The new phase code is inferred from the previous code by
//! flipping the bit of the line that fired, then the last two codes are
//! looked up in a transition table:
//!
//! ```text
//! history (low nibble):  A[n-1] B[n-1] A[n] B[n]
//!
//! edge on A   0010  A 0->1, B low   +1     0111  A 0->1, B high  -1
//!             1101  A 1->0, B high  +1     1000  A 1->0, B low   -1
//! edge on B   1011  B 0->1, A high  +1     1110  B 1->0, A high  -1
//!             0100  B 1->0, A low   +1     0001  B 0->1, A low   -1
//! ```
//!
//! The table assumes every edge is observed. A missed edge leaves the
//! inferred code with one bit inverted, and from then on a forward turn
//! lands on the reverse entries: counts keep the wrong sign until another
//! edge is missed. On the RP2040 an edge is lost when it arrives on a line
//! whose handler has woken but not yet re-armed its wait, because arming
//! clears the latched edge.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

/// Encoder line that produced an edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    A,
    B,
}

impl Phase {
    /// Bit of this line inside a 2-bit phase code.
    const fn mask(self) -> u8 {
        match self {
            Phase::A => 0b10,
            Phase::B => 0b01,
        }
    }
}

/// Outcome of one edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    Increment,
    Decrement,
    /// Bounce, or a transition that is not a single quadrature step.
    None,
}

impl Step {
    pub fn delta(self) -> i8 {
        match self {
            Step::Increment => 1,
            Step::Decrement => -1,
            Step::None => 0,
        }
    }
}

/// Classify the low nibble of the history after an edge on `phase`.
pub fn classify(phase: Phase, history: u8) -> Step {
    match (phase, history & 0b1111) {
        (Phase::A, 0b0010 | 0b1101) => Step::Increment,
        (Phase::A, 0b0111 | 0b1000) => Step::Decrement,
        (Phase::B, 0b1011 | 0b0100) => Step::Increment,
        (Phase::B, 0b1110 | 0b0001) => Step::Decrement,
        _ => Step::None,
    }
}

/// Rolling history of inferred phase codes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Quadrature {
    history: u8,
}

impl Quadrature {
    pub const fn new() -> Self {
        Self { history: 0 }
    }

    /// Record an edge on `phase` and classify the resulting transition.
    pub fn on_edge(&mut self, phase: Phase) -> Step {
        let prev = self.history & 0b11;
        self.history = (self.history << 2) | (prev ^ phase.mask());
        classify(phase, self.history)
    }

    pub fn history(&self) -> u8 {
        self.history
    }
}

/// Scroll axis an encoder drives.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScrollAxis {
    Vertical,
    Horizontal,
}

/// Scroll counts collected since the last emitted report. Wrapping.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scroll {
    pub vertical: i8,
    pub horizontal: i8,
}

impl Scroll {
    pub const ZERO: Self = Self {
        vertical: 0,
        horizontal: 0,
    };

    pub fn apply(&mut self, axis: ScrollAxis, step: Step) {
        let counter = match axis {
            ScrollAxis::Vertical => &mut self.vertical,
            ScrollAxis::Horizontal => &mut self.horizontal,
        };
        *counter = counter.wrapping_add(step.delta());
    }
}

struct EncoderState {
    quadrature: Quadrature,
    scroll: Scroll,
    axis: ScrollAxis,
}

/// Decoder state shared between the edge handlers and the report loop.
///
/// Both edge handlers and the drain run inside one critical section each,
/// so the A and B handlers never interleave on the history and a drain
/// never splits an update. Meant to live in a `static`.
pub struct SharedEncoder {
    state: Mutex<CriticalSectionRawMutex, RefCell<EncoderState>>,
}

impl SharedEncoder {
    pub const fn new(axis: ScrollAxis) -> Self {
        Self {
            state: Mutex::new(RefCell::new(EncoderState {
                quadrature: Quadrature::new(),
                scroll: Scroll::ZERO,
                axis,
            })),
        }
    }

    /// Edge handler. Call once per rising or falling edge on `phase`.
    pub fn on_edge(&self, phase: Phase) -> Step {
        self.state.lock(|state| {
            let mut state = state.borrow_mut();
            let step = state.quadrature.on_edge(phase);
            let axis = state.axis;
            state.scroll.apply(axis, step);
            step
        })
    }

    /// Take the collected scroll counts, leaving zero behind.
    pub fn drain(&self) -> Scroll {
        self.state
            .lock(|state| core::mem::take(&mut state.borrow_mut().scroll))
    }

    /// Collected scroll counts, without resetting them.
    pub fn pending(&self) -> Scroll {
        self.state.lock(|state| state.borrow().scroll)
    }
}
