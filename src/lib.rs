//! Driver for a bank of sixteen TCS3472 RGBC color sensors, bit-banged in
//! lock-step over a dual-channel USB-to-MPSSE bridge.
//!
//! # Description
//!
//! The bridge exposes two independent eight-pin GPIO channels (A and B).
//! Wired one (SDA, SCL) pair per bus, the thirty-two GPIO lines carry
//! sixteen I²C buses, and every bit period is emitted identically on all
//! sixteen at once: a single transaction reads or writes sixteen sensors in
//! the time of one.
//!
//! # Layers
//!
//! - [`engine::stager`] (L1) encodes a GPIO direction/value step into the
//!   bridge's command-byte language.
//! - [`engine::transport`] (L2) flushes staged commands over USB bulk
//!   endpoints and harvests the read-back.
//! - [`engine::bitbang`] (L3) composes staged steps into I²C phases and
//!   decodes the interleaved read-back into per-bus bytes.
//! - [`sensor::tcs3472`] (L4) layers the TCS3472 register protocol on top.
//! - [`device`] ties the layers together into an owned, per-device handle
//!   and provides enumeration/ordering of attached bridges.
//!
//! # Usage
//!
//! ```no_run
//! use color_ctrl::device::DeviceManager;
//!
//! # fn run() -> Result<(), color_ctrl::error::ColorControllerError> {
//! let manager = DeviceManager::new()?;
//! let serials = manager.scan_devices()?;
//! let mut arrays = manager.open_ordered(&serials)?;
//! let outcome = arrays[0].identify()?;
//! assert!(outcome.is_clean(), "every bus should report a known TCS3472 id");
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate enum_primitive;

pub mod consts;
pub mod device;
pub mod engine;
pub mod error;
pub mod sensor;
pub mod testing;
