//! Input pipeline of an RP2040 USB mouse built around the ADNS-5050.
//!
//! Everything in here is hardware-agnostic and builds for the host, so
//! `cargo test` runs without a board:
//!
//! - [`sensor`]: bit-banged 3-wire register transport
//! - [`motion`]: two's-complement decoding and motion accumulation
//! - [`quadrature`]: scroll-wheel decoding from edge events
//! - [`aggregator`]: the polling loop that turns all of it into reports
//! - [`hid`]: report layouts handed to the USB side
//! - [`bus`]: USB bus and per-interface transfer flags
//!
//! The firmware in `main.rs` (feature `embedded`) wires these to GPIO,
//! the Embassy executor and `embassy-usb`.

#![cfg_attr(not(test), no_std)]

pub mod aggregator;
pub mod buttons;
pub mod bus;
pub mod config;
pub mod error;
pub mod hid;
pub mod motion;
pub mod quadrature;
pub mod sensor;
pub mod status;

pub use error::Error;
