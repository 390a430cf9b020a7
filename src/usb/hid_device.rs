//! USB HID composite device - keyboard + mouse.
//!
//! Initialises the Embassy USB stack on the RP2040 USB peripheral, exposes
//! two HID endpoints and tracks the bus state the polling loop needs.

use core::sync::atomic::{AtomicU8, Ordering};

use adns_mouse::aggregator::ReportSink;
use adns_mouse::bus::{BusFlags, InFlight};
use adns_mouse::config;
use adns_mouse::hid::keyboard::KEYBOARD_REPORT_SIZE;
use adns_mouse::hid::mouse::MOUSE_REPORT_SIZE;
use adns_mouse::hid::{KeyboardLeds, KeyboardReport, MouseReport};
use adns_mouse::status::BusState;
use adns_mouse::Error;
use defmt::{debug, info, warn};
use embassy_futures::select::{select, Either};
use embassy_rp::usb::{Driver, InterruptHandler};
use embassy_rp::{bind_interrupts, peripherals};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_usb::class::hid::{Config as HidConfig, HidWriter, ReportId, RequestHandler, State};
use embassy_usb::control::OutResponse;
use embassy_usb::{Builder, Config, Handler, UsbDevice};
use static_cell::StaticCell;
use usbd_hid::descriptor::{
    KeyboardReport as KeyboardDescriptor, MouseReport as MouseDescriptor, SerializedDescriptor,
};

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => InterruptHandler<peripherals::USB>;
});

pub type UsbDriver = Driver<'static, peripherals::USB>;

/// Largest report either interface sends.
const HID_REPORT_MAX: usize = 8;

pub type ReportWriter = HidWriter<'static, UsbDriver, HID_REPORT_MAX>;

static KB_STATE: StaticCell<State> = StaticCell::new();
static MOUSE_STATE: StaticCell<State> = StaticCell::new();
static USB_CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_MSOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static USB_CTRL_BUF: StaticCell<[u8; 128]> = StaticCell::new();
static USB_BUS_HANDLER: StaticCell<UsbBusHandler> = StaticCell::new();
static KB_LED_HANDLER: StaticCell<KeyboardLedHandler> = StaticCell::new();

static USB_BUS: BusFlags = BusFlags::new();
static KEYBOARD_LEDS: AtomicU8 = AtomicU8::new(0);
static REMOTE_WAKEUP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

// One slot each. The in-flight flags stay set from hand-over until the
// endpoint write returns, so the slot is never occupied while a transfer
// is still running.
static KEYBOARD_IN_FLIGHT: InFlight = InFlight::new();
static MOUSE_IN_FLIGHT: InFlight = InFlight::new();
static KEYBOARD_REPORTS: Channel<CriticalSectionRawMutex, KeyboardReport, 1> = Channel::new();
static MOUSE_REPORTS: Channel<CriticalSectionRawMutex, MouseReport, 1> = Channel::new();

struct UsbBusHandler;

impl Handler for UsbBusHandler {
    fn reset(&mut self) {
        // No `suspended(false)` follows a reset, even when it ends a suspend.
        USB_BUS.reset();
        debug!("USB bus reset");
    }

    fn configured(&mut self, configured: bool) {
        USB_BUS.set_configured(configured);
        info!("USB configured={}", configured);
    }

    fn suspended(&mut self, suspended: bool) {
        USB_BUS.set_suspended(suspended);
        info!("USB suspended={}", suspended);
    }

    fn remote_wakeup_enabled(&mut self, enabled: bool) {
        debug!("USB remote wakeup enabled={}", enabled);
    }
}

struct KeyboardLedHandler;

impl RequestHandler for KeyboardLedHandler {
    fn set_report(&mut self, id: ReportId, data: &[u8]) -> OutResponse {
        if let ReportId::Out(_) = id {
            if let Some(leds) = KeyboardLeds::from_output_report(data) {
                KEYBOARD_LEDS.store(leds.0, Ordering::Relaxed);
                info!(
                    "Keyboard LEDs: num={} caps={} scroll={}",
                    leds.num_lock(),
                    leds.caps_lock(),
                    leds.scroll_lock()
                );
            }
        }
        OutResponse::Accepted
    }
}

/// Current bus state, from the device handler callbacks.
pub fn bus_state() -> BusState {
    USB_BUS.state()
}

/// LED state from the last keyboard output report.
pub fn keyboard_leds() -> KeyboardLeds {
    KeyboardLeds(KEYBOARD_LEDS.load(Ordering::Relaxed))
}

/// Polling-loop side of the HID channel.
pub struct UsbReportSink;

impl ReportSink for UsbReportSink {
    fn is_suspended(&self) -> bool {
        USB_BUS.is_suspended()
    }

    fn request_wakeup(&mut self) {
        REMOTE_WAKEUP.signal(());
    }

    fn keyboard_ready(&self) -> bool {
        USB_BUS.accepts(&KEYBOARD_IN_FLIGHT)
    }

    fn send_keyboard(&mut self, report: KeyboardReport) {
        KEYBOARD_IN_FLIGHT.claim();
        if KEYBOARD_REPORTS.try_send(report).is_err() {
            KEYBOARD_IN_FLIGHT.release();
            warn!("Keyboard report dropped");
        }
    }

    fn mouse_ready(&self) -> bool {
        USB_BUS.accepts(&MOUSE_IN_FLIGHT)
    }

    fn send_mouse(&mut self, report: MouseReport) {
        MOUSE_IN_FLIGHT.claim();
        if MOUSE_REPORTS.try_send(report).is_err() {
            MOUSE_IN_FLIGHT.release();
            warn!("Mouse report dropped");
        }
    }
}

/// Build result containing the USB device runner and the two HID writers.
pub struct UsbHidDevice {
    pub device: UsbDevice<'static, UsbDriver>,
    pub keyboard_writer: ReportWriter,
    pub mouse_writer: ReportWriter,
}

/// Initialise the USB stack and create the composite HID device.
///
/// Must be called exactly once.  All static buffers are consumed here.
pub fn init(usb: peripherals::USB) -> UsbHidDevice {
    let driver = Driver::new(usb, Irqs);

    let mut usb_config = Config::new(config::USB_VID, config::USB_PID);
    usb_config.manufacturer = Some(config::USB_MANUFACTURER);
    usb_config.product = Some(config::USB_PRODUCT);
    usb_config.serial_number = Some(config::USB_SERIAL_NUMBER);
    usb_config.max_power = 100; // mA
    usb_config.max_packet_size_0 = 64;
    usb_config.supports_remote_wakeup = true;

    // Composite device with interface association descriptors.
    usb_config.device_class = 0xEF;
    usb_config.device_sub_class = 0x02;
    usb_config.device_protocol = 0x01;
    usb_config.composite_with_iads = true;

    let config_desc = USB_CONFIG_DESC.init([0u8; 256]);
    let bos_desc = USB_BOS_DESC.init([0u8; 256]);
    let msos_desc = USB_MSOS_DESC.init([0u8; 256]);
    let ctrl_buf = USB_CTRL_BUF.init([0u8; 128]);

    let mut builder = Builder::new(
        driver,
        usb_config,
        config_desc,
        bos_desc,
        msos_desc,
        ctrl_buf,
    );

    builder.handler(USB_BUS_HANDLER.init(UsbBusHandler));

    let kb_state = KB_STATE.init(State::new());
    let kb_config = HidConfig {
        report_descriptor: KeyboardDescriptor::desc(),
        request_handler: Some(KB_LED_HANDLER.init(KeyboardLedHandler)),
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let keyboard_writer = HidWriter::new(&mut builder, kb_state, kb_config);

    let mouse_state = MOUSE_STATE.init(State::new());
    let mouse_config = HidConfig {
        report_descriptor: MouseDescriptor::desc(),
        request_handler: None,
        poll_ms: config::USB_HID_POLL_MS,
        max_packet_size: 8,
    };
    let mouse_writer = HidWriter::new(&mut builder, mouse_state, mouse_config);

    let device = builder.build();

    info!("USB HID composite device initialised (keyboard + mouse)");

    UsbHidDevice {
        device,
        keyboard_writer,
        mouse_writer,
    }
}

/// Run the USB device stack - must be spawned as a dedicated Embassy task.
///
/// While the bus is suspended, either waits for the host to resume it or
/// performs a remote wakeup when the polling loop asks for one.
pub async fn run_usb_device(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    info!("USB device task started");
    loop {
        device.run_until_suspend().await;
        // `wait_resume` is cancel-safe, so losing the race to the wakeup
        // signal leaves the bus consistent.
        match select(device.wait_resume(), REMOTE_WAKEUP.wait()).await {
            Either::First(()) => REMOTE_WAKEUP.reset(),
            Either::Second(()) => {
                info!("Requesting remote wakeup");
                if let Err(e) = device
                    .remote_wakeup()
                    .await
                    .map_err(|_| Error::RemoteWakeup)
                {
                    warn!("Remote wakeup failed: {:?}", e);
                }
            }
        }
    }
}

async fn write_report(
    writer: &mut ReportWriter,
    bytes: &[u8],
) -> Result<(), Error> {
    if bytes.is_empty() {
        return Err(Error::BufferOverflow);
    }
    writer.write(bytes).await.map_err(|_| Error::Usb)
}

/// Keyboard report forwarding task.
pub async fn keyboard_writer_task(mut writer: ReportWriter) -> ! {
    info!("Keyboard writer task started");
    let mut buf = [0u8; KEYBOARD_REPORT_SIZE];
    loop {
        let report = KEYBOARD_REPORTS.receive().await;
        let n = report.serialize(&mut buf);
        let written = write_report(&mut writer, &buf[..n]).await;
        KEYBOARD_IN_FLIGHT.release();
        if let Err(e) = written {
            warn!("USB keyboard write failed: {:?}", e);
        }
    }
}

/// Mouse report forwarding task.
pub async fn mouse_writer_task(mut writer: ReportWriter) -> ! {
    info!("Mouse writer task started");
    let mut buf = [0u8; MOUSE_REPORT_SIZE];
    loop {
        let report = MOUSE_REPORTS.receive().await;
        let n = report.serialize(&mut buf);
        let written = write_report(&mut writer, &buf[..n]).await;
        MOUSE_IN_FLIGHT.release();
        if let Err(e) = written {
            warn!("USB mouse write failed: {:?}", e);
        }
    }
}
