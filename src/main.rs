//! adns-mouse firmware for the Raspberry Pi Pico (RP2040).
//!
//! Task layout:
//! - edge executor (SWI_IRQ_1, preempts thread mode): one task per
//!   encoder line, feeding the shared quadrature decoder
//! - thread executor: the polling loop in `main`, the USB device task,
//!   one HID writer task per interface and the status LED

#![no_std]
#![no_main]

mod usb;

use adns_mouse::aggregator::{Aggregator, Tick};
use adns_mouse::buttons::ButtonLevels;
use adns_mouse::config;
use adns_mouse::quadrature::{Phase, ScrollAxis, SharedEncoder};
use adns_mouse::sensor::Adns5050;
use adns_mouse::status::{self, LedMode};
use defmt::{debug, info, warn};
use embassy_executor::{InterruptExecutor, Spawner};
use embassy_futures::yield_now;
use embassy_rp::gpio::{Flex, Input, Level, Output, Pull};
use embassy_rp::interrupt;
use embassy_rp::interrupt::{InterruptExt, Priority};
use embassy_time::{Delay, Instant, Timer};
use usb::hid_device::{self, ReportWriter, UsbDriver, UsbReportSink};
use {defmt_rtt as _, panic_probe as _};

/// Re-check interval of the status LED while it is held on (ms).
const LED_SOLID_RECHECK_MS: u64 = 100;

static ENCODER: SharedEncoder = SharedEncoder::new(ScrollAxis::Vertical);
static EDGE_EXECUTOR: InterruptExecutor = InterruptExecutor::new();

#[interrupt]
unsafe fn SWI_IRQ_1() {
    EDGE_EXECUTOR.on_interrupt()
}

/// Edges arriving between the wake-up and the next `wait_for_any_edge`
/// are not seen by the decoder.
#[embassy_executor::task(pool_size = 2)]
async fn encoder_task(mut line: Input<'static>, phase: Phase) -> ! {
    loop {
        line.wait_for_any_edge().await;
        ENCODER.on_edge(phase);
    }
}

#[embassy_executor::task]
async fn usb_task(device: embassy_usb::UsbDevice<'static, UsbDriver>) -> ! {
    hid_device::run_usb_device(device).await
}

#[embassy_executor::task]
async fn keyboard_task(writer: ReportWriter) -> ! {
    hid_device::keyboard_writer_task(writer).await
}

#[embassy_executor::task]
async fn mouse_task(writer: ReportWriter) -> ! {
    hid_device::mouse_writer_task(writer).await
}

#[embassy_executor::task]
async fn status_led_task(mut led: Output<'static>) -> ! {
    loop {
        match status::led_mode(hid_device::bus_state(), hid_device::keyboard_leds()) {
            LedMode::Solid => {
                led.set_high();
                Timer::after_millis(LED_SOLID_RECHECK_MS).await;
            }
            LedMode::Blink { half_period_ms } => {
                led.toggle();
                Timer::after_millis(u64::from(half_period_ms)).await;
            }
        }
    }
}

/// Milliseconds since boot, truncated; the polling loop compares with
/// wrapping arithmetic.
fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("adns-mouse starting");
    let p = embassy_rp::init(Default::default());

    // Encoder edges first, so no detent is lost during sensor start-up.
    interrupt::SWI_IRQ_1.set_priority(Priority::P2);
    let edge_spawner = EDGE_EXECUTOR.start(interrupt::SWI_IRQ_1);
    edge_spawner.must_spawn(encoder_task(Input::new(p.PIN_18, Pull::Up), Phase::A));
    edge_spawner.must_spawn(encoder_task(Input::new(p.PIN_10, Pull::Up), Phase::B));

    let left = Input::new(p.PIN_20, Pull::Up);
    let right = Input::new(p.PIN_11, Pull::Up);
    let trigger = Input::new(p.PIN_15, Pull::Up);

    // Sensor module power enable; held for the lifetime of the firmware.
    let _sensor_power = Output::new(p.PIN_12, Level::High);
    Timer::after_millis(config::SENSOR_POWER_SETTLE_MS).await;

    let mut sensor = Adns5050::new(
        Flex::new(p.PIN_16),
        Output::new(p.PIN_14, Level::High),
        Output::new(p.PIN_9, Level::High),
        Delay,
        config::SENSOR_TIMING,
    );
    sensor.power_up();
    match sensor.verify() {
        Ok(id) => info!(
            "ADNS-5050 found: product {=u8:#04x} revision {=u8:#04x}",
            id,
            sensor.revision_id()
        ),
        Err(e) => warn!("Sensor probe failed: {:?}", e),
    }
    sensor.set_resolution(config::SENSOR_RESOLUTION);
    info!("Sensor resolution: {:?}", config::SENSOR_RESOLUTION);

    let usb = hid_device::init(p.USB);
    spawner.must_spawn(usb_task(usb.device));
    spawner.must_spawn(keyboard_task(usb.keyboard_writer));
    spawner.must_spawn(mouse_task(usb.mouse_writer));
    spawner.must_spawn(status_led_task(Output::new(p.PIN_25, Level::Low)));

    let mut aggregator = Aggregator::new(
        config::REPORT_INTERVAL_MS,
        config::SENSOR_AXES,
        config::TRIGGER_KEYCODE,
        now_ms(),
    );
    let mut sink = UsbReportSink;

    info!("Polling loop running");
    loop {
        let levels = ButtonLevels {
            left_low: left.is_low(),
            right_low: right.is_low(),
            trigger_low: trigger.is_low(),
        };
        if let Tick::Wakeup = aggregator.poll(&mut sensor, levels, now_ms(), &ENCODER, &mut sink) {
            debug!("Trigger held while suspended, waking host");
        }
        // Let the USB tasks run between iterations.
        yield_now().await;
    }
}
