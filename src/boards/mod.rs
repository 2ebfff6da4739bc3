//! Board-specific presets
//!
//! A board preset pins down where the MDIO/MDC lines live: the physical
//! base of the GPIO block, the window length to map, and the
//! [`GpioLayout`](crate::hal::gpio::GpioLayout) of that block.
//!
//! # Supported Boards
//!
//! - TS-7680 family (i.MX28 GPIO bank 0, 88E6020 or 88E6070 switch)

pub mod ts7680;

pub use ts7680::Ts7680;
