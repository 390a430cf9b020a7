//! ADNS-5050 optical motion sensor over a bit-banged 3-wire serial bus.
//!
//! The sensor has no hardware SPI: SDIO is a single bidirectional data
//! line, SCLK is driven by the host and nCS frames each transaction.
//!
//! ```text
//! read:   nCS ▔▔╲____________________________________________________╱▔▔
//!         SDIO    <A7 A6 .. A0 out>   |turnaround|  <D7 D6 .. D0 in>
//! write:  nCS ▔▔╲____________________________________________________╱▔▔
//!         SDIO    <1 A6 .. A0 out>    <D7 D6 .. D0 out>
//! ```
//!
//! The sensor samples SDIO on the rising edge of SCLK and drives it after
//! the falling edge during a read. No acknowledgement or checksum exists,
//! so none of the operations can fail: a violated timing budget shows up
//! as wrong data, never as an error.

pub mod registers;

#[cfg(feature = "embedded")]
mod flex_rp;


pub use registers::{Access, Register, Resolution};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::error::Error;
use crate::motion::{twos_complement, MotionSensor};

/// MSB of the address byte selects a write transaction.
const WRITE_BIT: u8 = 0x80;

// Bit-bang timing (RP2040 @ 125 MHz)
const T_ADDRESS_HOLD_US: u32 = 2;
const T_READ_SETTLE_US: u32 = 1;
const T_WRITE_SETTLE_US: u32 = 1;
const T_TRANSACTION_END_US: u32 = 20;
const T_SYNC_PULSE_US: u32 = 1;

/// Wait after a chip reset before the sensor reports valid motion (ms).
pub const POWER_UP_DELAY_MS: u32 = 55;

/// Pin that can be switched between input and output.
pub trait FlexPin: InputPin + OutputPin {
    fn set_as_input(&mut self);

    fn set_as_output(&mut self);
}

/// Microsecond delays of one transaction.
///
/// The defaults are derived for a 125 MHz host; another core clock needs
/// its own values, the protocol has no tolerance to fall back on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    /// Data valid before the rising SCLK edge while sending a read address.
    pub address_hold_us: u32,
    /// Before and after each falling SCLK edge while receiving data.
    pub read_settle_us: u32,
    /// Before the falling and after the rising SCLK edge of a written bit.
    pub write_settle_us: u32,
    /// Last SCLK edge to nCS de-assert.
    pub transaction_end_us: u32,
    /// nCS low time of a serial-port resync.
    pub sync_pulse_us: u32,
}

impl Timing {
    pub const ADNS5050: Self = Self {
        address_hold_us: T_ADDRESS_HOLD_US,
        read_settle_us: T_READ_SETTLE_US,
        write_settle_us: T_WRITE_SETTLE_US,
        transaction_end_us: T_TRANSACTION_END_US,
        sync_pulse_us: T_SYNC_PULSE_US,
    };
}

impl Default for Timing {
    fn default() -> Self {
        Self::ADNS5050
    }
}

/// ADNS-5050 driver bound to its three GPIO lines.
pub struct Adns5050<SDIO, SCLK, NCS, D> {
    sdio: SDIO,
    sclk: SCLK,
    ncs: NCS,
    delay: D,
    timing: Timing,
}

impl<SDIO, SCLK, NCS, D> Adns5050<SDIO, SCLK, NCS, D>
where
    SDIO: FlexPin,
    SCLK: OutputPin,
    NCS: OutputPin,
    D: DelayNs,
{
    /// Take ownership of the bus lines and park them: chip deselected,
    /// clock idle high, data driven by the host.
    pub fn new(mut sdio: SDIO, mut sclk: SCLK, mut ncs: NCS, delay: D, timing: Timing) -> Self {
        let _ = ncs.set_high();
        let _ = sclk.set_high();
        sdio.set_as_output();
        Self {
            sdio,
            sclk,
            ncs,
            delay,
            timing,
        }
    }

    /// Resynchronise the sensor's serial port without transferring data.
    pub fn sync(&mut self) {
        let _ = self.ncs.set_low();
        self.delay.delay_us(self.timing.sync_pulse_us);
        let _ = self.ncs.set_high();
    }

    /// Sync, reset the chip and wait until it tracks again.
    pub fn power_up(&mut self) {
        self.sync();
        self.write(Register::Reset, registers::RESET_COMMAND);
        self.delay.delay_ms(POWER_UP_DELAY_MS);
    }

    /// Read a register and interpret it as a two's-complement delta.
    pub fn read(&mut self, reg: Register) -> i8 {
        twos_complement(self.read_raw(reg))
    }

    /// Read the unconverted contents of a register.
    pub fn read_raw(&mut self, reg: Register) -> u8 {
        let _ = self.ncs.set_low();

        let _ = self.sclk.set_low();
        self.sdio.set_as_output();
        self.send_address(reg.addr() & !WRITE_BIT);

        // Turnaround: the sensor drives SDIO from here on.
        self.sdio.set_as_input();
        let value = self.receive_byte();

        self.end_transaction();
        value
    }

    /// Write a register. The sensor does not acknowledge writes.
    pub fn write(&mut self, reg: Register, data: u8) {
        let _ = self.ncs.set_low();

        let _ = self.sclk.set_low();
        self.sdio.set_as_output();
        self.send_frame(reg.addr() | WRITE_BIT);
        self.send_frame(data);

        self.end_transaction();
    }

    pub fn product_id(&mut self) -> u8 {
        self.read_raw(Register::ProductId)
    }

    pub fn revision_id(&mut self) -> u8 {
        self.read_raw(Register::RevisionId)
    }

    /// Number of valid features the sensor sees on the surface.
    pub fn surface_quality(&mut self) -> u8 {
        self.read_raw(Register::Squal)
    }

    /// Check that an ADNS-5050 answers on the bus. Returns the product ID.
    ///
    /// Both ID registers must match; the error carries the first byte that
    /// did not.
    pub fn verify(&mut self) -> Result<u8, Error> {
        match self.product_id() {
            registers::PRODUCT_ID => {}
            other => return Err(Error::UnexpectedProductId(other)),
        }
        match self.read_raw(Register::ProductId2) {
            registers::PRODUCT_ID2 => Ok(registers::PRODUCT_ID),
            other => Err(Error::UnexpectedProductId(other)),
        }
    }

    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.write(Register::MouseControl, resolution as u8);
    }

    /// Release the bus lines and the delay provider.
    pub fn into_inner(self) -> (SDIO, SCLK, NCS, D) {
        (self.sdio, self.sclk, self.ncs, self.delay)
    }

    fn put_data(&mut self, high: bool) {
        let _ = if high {
            self.sdio.set_high()
        } else {
            self.sdio.set_low()
        };
    }

    fn send_address(&mut self, addr: u8) {
        for bit in (0..8).rev() {
            let _ = self.sclk.set_low();
            self.put_data((addr >> bit) & 1 == 1);
            self.delay.delay_us(self.timing.address_hold_us);
            let _ = self.sclk.set_high();
        }
    }

    fn send_frame(&mut self, byte: u8) {
        for bit in (0..8).rev() {
            self.delay.delay_us(self.timing.write_settle_us);
            let _ = self.sclk.set_low();
            self.put_data((byte >> bit) & 1 == 1);
            let _ = self.sclk.set_high();
            self.delay.delay_us(self.timing.write_settle_us);
        }
    }

    fn receive_byte(&mut self) -> u8 {
        let mut byte = 0u8;
        for _ in 0..8 {
            self.delay.delay_us(self.timing.read_settle_us);
            let _ = self.sclk.set_low();
            self.delay.delay_us(self.timing.read_settle_us);
            byte <<= 1;
            if self.sdio.is_high().unwrap_or(false) {
                byte |= 1;
            }
            let _ = self.sclk.set_high();
        }
        byte
    }

    fn end_transaction(&mut self) {
        self.delay.delay_us(self.timing.transaction_end_us);
        let _ = self.ncs.set_high();
    }
}

impl<SDIO, SCLK, NCS, D> MotionSensor for Adns5050<SDIO, SCLK, NCS, D>
where
    SDIO: FlexPin,
    SCLK: OutputPin,
    NCS: OutputPin,
    D: DelayNs,
{
    fn delta_x(&mut self) -> i8 {
        self.read(Register::DeltaX)
    }

    fn delta_y(&mut self) -> i8 {
        self.read(Register::DeltaY)
    }
}
