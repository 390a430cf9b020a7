//! ADNS-5050 register definitions (public registers from the datasheet).

/// Expected contents of [`Register::ProductId`].
pub const PRODUCT_ID: u8 = 0x12;

/// Expected contents of [`Register::ProductId2`].
pub const PRODUCT_ID2: u8 = 0x26;

/// Value that triggers a full chip reset when written to [`Register::Reset`].
pub const RESET_COMMAND: u8 = 0x5A;

/// How a register may be accessed. The transport does not enforce this.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Access {
    Read,
    Write,
    ReadWrite,
}

/// ADNS-5050 register addresses
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Register {
    // Identification
    ProductId = 0x00,  // Product_ID, reads 0x12
    RevisionId = 0x01, // Revision_ID

    // Motion
    DeltaX = 0x03, // Delta_X, signed 8-bit
    DeltaY = 0x04, // Delta_Y, signed 8-bit

    // Surface metrics
    Squal = 0x05,        // SQUAL
    ShutterUpper = 0x06, // Shutter_Upper
    ShutterLower = 0x07, // Shutter_Lower
    MaximumPixel = 0x08, // Maximum_Pixel
    PixelSum = 0x09,     // Pixel_Sum
    MinimumPixel = 0x0A, // Minimum_Pixel
    PixelData = 0x0B,    // Pixel_Grab

    // Configuration
    MouseControl = 0x0D, // Mouse_Control, resolution select

    // Control
    Reset = 0x3A,      // Chip_Reset, write-only
    ProductId2 = 0x3E, // Product_ID2, reads 0x26
}

impl Register {
    /// Return the raw register address as u8
    #[inline]
    pub fn addr(self) -> u8 {
        self as u8
    }

    /// Documented access mode of this register.
    pub fn access(self) -> Access {
        match self {
            Register::Reset => Access::Write,
            Register::MouseControl => Access::ReadWrite,
            _ => Access::Read,
        }
    }
}

/// Sensor resolution, selected through [`Register::MouseControl`].
#[repr(u8)]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Resolution {
    Cpi500 = 0x00,
    Cpi1000 = 0x01,
}
