//! Report aggregation: the body of the firmware's polling loop.
//!
//! Every call to [`Aggregator::poll`] drains the sensor's motion registers
//! and samples the buttons. At most once per interval it composes reports
//! and offers them to a [`ReportSink`]. A channel that is not ready loses
//! that tick; the counters keep growing and go out with the next report
//! that is accepted.

use crate::buttons::{ButtonLevels, ButtonMask};
use crate::hid::{KeyboardReport, MouseReport};
use crate::motion::{AxisMapping, MotionAccumulator, MotionSensor};
use crate::quadrature::SharedEncoder;

/// Outgoing side of the HID channel.
pub trait ReportSink {
    /// Host has suspended the bus.
    fn is_suspended(&self) -> bool;

    /// Ask the host to resume the bus.
    fn request_wakeup(&mut self);

    fn keyboard_ready(&self) -> bool;

    fn send_keyboard(&mut self, report: KeyboardReport);

    fn mouse_ready(&self) -> bool;

    fn send_mouse(&mut self, report: MouseReport);
}

/// What one call to [`Aggregator::poll`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Tick {
    /// Less than one interval since the last emission tick.
    Waiting,
    /// The bus is suspended and the trigger is held; wakeup was requested.
    Wakeup,
    /// Emission tick. Flags tell which reports the sink accepted.
    Sent { keyboard: bool, mouse: bool },
}

/// Polling-loop state: motion counters, button mask and cadence.
pub struct Aggregator {
    interval_ms: u32,
    last_ms: u32,
    mapping: AxisMapping,
    keycode: u8,
    motion: MotionAccumulator,
    buttons: ButtonMask,
    has_keyboard_key: bool,
}

impl Aggregator {
    /// `start_ms` is the clock reading the first interval counts from.
    pub fn new(interval_ms: u32, mapping: AxisMapping, keycode: u8, start_ms: u32) -> Self {
        Self {
            interval_ms,
            last_ms: start_ms,
            mapping,
            keycode,
            motion: MotionAccumulator::new(),
            buttons: ButtonMask::NONE,
            has_keyboard_key: false,
        }
    }

    /// Run one loop iteration at clock reading `now_ms`.
    pub fn poll<M, S>(
        &mut self,
        sensor: &mut M,
        levels: ButtonLevels,
        now_ms: u32,
        encoder: &SharedEncoder,
        sink: &mut S,
    ) -> Tick
    where
        M: MotionSensor,
        S: ReportSink,
    {
        let dy = sensor.delta_y();
        let dx = sensor.delta_x();
        self.motion.accumulate(&self.mapping, dx, dy);

        self.buttons = levels.mask();

        if now_ms.wrapping_sub(self.last_ms) < self.interval_ms {
            return Tick::Waiting;
        }
        // Advance by the interval, not to `now`, so a late tick does not
        // shift the following ones.
        self.last_ms = self.last_ms.wrapping_add(self.interval_ms);

        let trigger = levels.trigger_pressed();
        if sink.is_suspended() && trigger {
            sink.request_wakeup();
            return Tick::Wakeup;
        }

        let keyboard = sink.keyboard_ready() && self.emit_keyboard(trigger, sink);
        let mouse = sink.mouse_ready();
        if mouse {
            self.emit_mouse(encoder, sink);
        }

        Tick::Sent { keyboard, mouse }
    }

    /// Send the held key, or one empty report after it is released.
    fn emit_keyboard<S: ReportSink>(&mut self, trigger: bool, sink: &mut S) -> bool {
        if trigger {
            sink.send_keyboard(KeyboardReport::key(self.keycode));
            self.has_keyboard_key = true;
            true
        } else if self.has_keyboard_key {
            sink.send_keyboard(KeyboardReport::empty());
            self.has_keyboard_key = false;
            true
        } else {
            false
        }
    }

    fn emit_mouse<S: ReportSink>(&mut self, encoder: &SharedEncoder, sink: &mut S) {
        let scroll = encoder.drain();
        let (x, y) = self.motion.take();
        sink.send_mouse(MouseReport {
            buttons: self.buttons.bits(),
            x,
            y,
            wheel: scroll.vertical,
            pan: scroll.horizontal,
        });
        self.buttons = ButtonMask::NONE;
    }

    /// Motion collected since the last emitted mouse report.
    pub fn pending_motion(&self) -> (i8, i8) {
        (self.motion.x(), self.motion.y())
    }

    pub fn buttons(&self) -> ButtonMask {
        self.buttons
    }

    /// Clock reading the current interval started at.
    pub fn last_tick_ms(&self) -> u32 {
        self.last_ms
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;

    use super::*;
    use crate::motion::twos_complement;
    use crate::quadrature::{Phase, ScrollAxis};

    const RIGHT_ARROW: u8 = 0x4F;

    #[derive(Default)]
    struct ScriptedSensor {
        x: VecDeque<i8>,
        y: VecDeque<i8>,
    }

    impl ScriptedSensor {
        fn with_x(values: &[i8]) -> Self {
            Self {
                x: values.iter().copied().collect(),
                y: VecDeque::new(),
            }
        }
    }

    impl MotionSensor for ScriptedSensor {
        fn delta_x(&mut self) -> i8 {
            self.x.pop_front().unwrap_or(0)
        }

        fn delta_y(&mut self) -> i8 {
            self.y.pop_front().unwrap_or(0)
        }
    }

    struct RecordingSink {
        suspended: bool,
        keyboard_ready: bool,
        mouse_ready: bool,
        wakeups: usize,
        keyboard: Vec<KeyboardReport>,
        mouse: Vec<MouseReport>,
    }

    impl RecordingSink {
        fn ready() -> Self {
            Self {
                suspended: false,
                keyboard_ready: true,
                mouse_ready: true,
                wakeups: 0,
                keyboard: Vec::new(),
                mouse: Vec::new(),
            }
        }
    }

    impl ReportSink for RecordingSink {
        fn is_suspended(&self) -> bool {
            self.suspended
        }

        fn request_wakeup(&mut self) {
            self.wakeups += 1;
        }

        fn keyboard_ready(&self) -> bool {
            self.keyboard_ready
        }

        fn send_keyboard(&mut self, report: KeyboardReport) {
            self.keyboard.push(report);
        }

        fn mouse_ready(&self) -> bool {
            self.mouse_ready
        }

        fn send_mouse(&mut self, report: MouseReport) {
            self.mouse.push(report);
        }
    }

    fn aggregator() -> Aggregator {
        Aggregator::new(10, AxisMapping::MOUNTED, RIGHT_ARROW, 0)
    }

    fn idle() -> ButtonLevels {
        ButtonLevels::default()
    }

    fn trigger() -> ButtonLevels {
        ButtonLevels {
            trigger_low: true,
            ..ButtonLevels::default()
        }
    }

    #[test]
    fn waits_for_a_full_interval() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();

        assert_eq!(agg.poll(&mut sensor, idle(), 9, &encoder, &mut sink), Tick::Waiting);
        assert!(sink.mouse.is_empty());
        assert_eq!(
            agg.poll(&mut sensor, idle(), 10, &encoder, &mut sink),
            Tick::Sent {
                keyboard: false,
                mouse: true
            }
        );
        assert_eq!(sink.mouse.len(), 1);
    }

    #[test]
    fn cadence_advances_by_interval_not_to_now() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();

        agg.poll(&mut sensor, idle(), 10, &encoder, &mut sink);
        // Late by five: still only one interval is consumed.
        agg.poll(&mut sensor, idle(), 25, &encoder, &mut sink);
        assert_eq!(agg.last_tick_ms(), 20);
        assert_eq!(agg.poll(&mut sensor, idle(), 29, &encoder, &mut sink), Tick::Waiting);
        assert_ne!(agg.poll(&mut sensor, idle(), 30, &encoder, &mut sink), Tick::Waiting);
        assert_eq!(sink.mouse.len(), 3);
    }

    #[test]
    fn at_most_one_report_per_poll_when_far_behind() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();

        agg.poll(&mut sensor, idle(), 100, &encoder, &mut sink);
        assert_eq!(sink.mouse.len(), 1);
        assert_eq!(agg.last_tick_ms(), 10);
    }

    #[test]
    fn cadence_survives_clock_wrap() {
        let start = u32::MAX - 4;
        let mut agg = Aggregator::new(10, AxisMapping::MOUNTED, RIGHT_ARROW, start);
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();

        assert_eq!(agg.poll(&mut sensor, idle(), 4, &encoder, &mut sink), Tick::Waiting);
        assert_ne!(agg.poll(&mut sensor, idle(), 5, &encoder, &mut sink), Tick::Waiting);
        assert_eq!(agg.last_tick_ms(), 5);
    }

    #[test]
    fn two_reads_in_one_interval_sum_to_minus_three() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::with_x(&[twos_complement(0x05), twos_complement(0xFE)]);
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();

        agg.poll(&mut sensor, idle(), 3, &encoder, &mut sink);
        agg.poll(&mut sensor, idle(), 6, &encoder, &mut sink);
        assert_eq!(agg.pending_motion(), (-3, 0));

        agg.poll(&mut sensor, idle(), 10, &encoder, &mut sink);
        assert_eq!(sink.mouse[0].x, -3);
    }

    #[test]
    fn delta_y_is_not_inverted() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor {
            x: VecDeque::new(),
            y: VecDeque::from([4, -1]),
        };
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();

        agg.poll(&mut sensor, idle(), 5, &encoder, &mut sink);
        agg.poll(&mut sensor, idle(), 10, &encoder, &mut sink);
        assert_eq!(sink.mouse[0].y, 3);
    }

    #[test]
    fn button_mask_resets_only_after_emission() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();
        let left = ButtonLevels {
            left_low: true,
            right_low: false,
            trigger_low: false,
        };

        agg.poll(&mut sensor, left, 5, &encoder, &mut sink);
        assert_eq!(agg.buttons(), ButtonMask::LEFT);

        agg.poll(&mut sensor, left, 10, &encoder, &mut sink);
        assert_eq!(sink.mouse[0].buttons, ButtonMask::LEFT.bits());
        assert_eq!(agg.buttons(), ButtonMask::NONE);
    }

    #[test]
    fn button_mask_is_the_latest_level_snapshot() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();
        let both = ButtonLevels {
            left_low: true,
            right_low: true,
            trigger_low: true,
        };
        let right_only = ButtonLevels {
            left_low: false,
            right_low: true,
            trigger_low: false,
        };

        agg.poll(&mut sensor, both, 3, &encoder, &mut sink);
        assert_eq!(agg.buttons(), both.mask());
        assert!(!agg.buttons().contains(ButtonMask::MIDDLE));

        agg.poll(&mut sensor, right_only, 10, &encoder, &mut sink);
        assert_eq!(sink.mouse[0].buttons, right_only.mask().bits());
    }

    #[test]
    fn button_mask_survives_unready_ticks() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();
        sink.mouse_ready = false;
        let right = ButtonLevels {
            left_low: false,
            right_low: true,
            trigger_low: false,
        };

        agg.poll(&mut sensor, right, 10, &encoder, &mut sink);
        assert_eq!(agg.buttons(), ButtonMask::RIGHT);
    }

    #[test]
    fn unready_mouse_channel_accumulates_across_ticks() {
        let mut agg = aggregator();
        // Two reads of +3 per tick, three ticks long.
        let mut sensor = ScriptedSensor::with_x(&[3; 6]);
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();
        sink.mouse_ready = false;

        for now in [5, 10, 15, 20, 25, 30] {
            let tick = agg.poll(&mut sensor, idle(), now, &encoder, &mut sink);
            if now % 10 == 0 {
                assert_eq!(
                    tick,
                    Tick::Sent {
                        keyboard: false,
                        mouse: false
                    }
                );
            }
        }
        assert!(sink.mouse.is_empty());
        assert_eq!(agg.last_tick_ms(), 30);

        sink.mouse_ready = true;
        agg.poll(&mut sensor, idle(), 40, &encoder, &mut sink);
        assert_eq!(sink.mouse.len(), 1);
        assert_eq!(sink.mouse[0].x, -18);
        assert_eq!(agg.pending_motion(), (0, 0));
    }

    #[test]
    fn scroll_is_drained_only_on_emission() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();
        sink.mouse_ready = false;

        encoder.on_edge(Phase::A);
        encoder.on_edge(Phase::B);
        agg.poll(&mut sensor, idle(), 10, &encoder, &mut sink);
        assert_eq!(encoder.pending().vertical, 2);

        sink.mouse_ready = true;
        agg.poll(&mut sensor, idle(), 20, &encoder, &mut sink);
        assert_eq!(sink.mouse[0].wheel, 2);
        assert_eq!(sink.mouse[0].pan, 0);
        assert_eq!(encoder.pending().vertical, 0);
    }

    #[test]
    fn keyboard_sends_key_while_held_then_one_empty_report() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();

        agg.poll(&mut sensor, trigger(), 10, &encoder, &mut sink);
        agg.poll(&mut sensor, trigger(), 20, &encoder, &mut sink);
        let released = agg.poll(&mut sensor, idle(), 30, &encoder, &mut sink);
        let idle_tick = agg.poll(&mut sensor, idle(), 40, &encoder, &mut sink);

        assert_eq!(
            sink.keyboard,
            [
                KeyboardReport::key(RIGHT_ARROW),
                KeyboardReport::key(RIGHT_ARROW),
                KeyboardReport::empty(),
            ]
        );
        assert_eq!(
            released,
            Tick::Sent {
                keyboard: true,
                mouse: true
            }
        );
        assert_eq!(
            idle_tick,
            Tick::Sent {
                keyboard: false,
                mouse: true
            }
        );
    }

    #[test]
    fn release_during_unready_keyboard_sends_nothing() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();

        agg.poll(&mut sensor, trigger(), 10, &encoder, &mut sink);
        sink.keyboard_ready = false;
        agg.poll(&mut sensor, idle(), 20, &encoder, &mut sink);
        sink.keyboard_ready = true;
        agg.poll(&mut sensor, idle(), 30, &encoder, &mut sink);

        // The release is observed once the channel is ready again.
        assert_eq!(
            sink.keyboard,
            [KeyboardReport::key(RIGHT_ARROW), KeyboardReport::empty()]
        );
    }

    #[test]
    fn suspended_with_trigger_requests_wakeup_instead_of_reports() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::with_x(&[7]);
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();
        sink.suspended = true;

        assert_eq!(agg.poll(&mut sensor, trigger(), 10, &encoder, &mut sink), Tick::Wakeup);
        assert_eq!(sink.wakeups, 1);
        assert!(sink.keyboard.is_empty());
        assert!(sink.mouse.is_empty());
        assert_eq!(agg.pending_motion(), (-7, 0));
        assert_eq!(agg.last_tick_ms(), 10);
    }

    #[test]
    fn suspended_without_trigger_does_not_wake() {
        let mut agg = aggregator();
        let mut sensor = ScriptedSensor::default();
        let encoder = SharedEncoder::new(ScrollAxis::Vertical);
        let mut sink = RecordingSink::ready();
        sink.suspended = true;
        sink.keyboard_ready = false;
        sink.mouse_ready = false;

        assert_eq!(
            agg.poll(&mut sensor, idle(), 10, &encoder, &mut sink),
            Tick::Sent {
                keyboard: false,
                mouse: false
            }
        );
        assert_eq!(sink.wakeups, 0);
    }
}
