//! Hardware Abstraction Layer
//!
//! The management bus is two GPIO lines driven in software. This module
//! splits that into a line layer and a frame layer:
//!
//! # Modules
//!
//! - [`gpio`]: register window and MDIO/MDC line driver
//! - [`mdio`]: Clause 22 frame codec and the [`MdioBus`] trait
//!
//! # Delay Integration
//!
//! MDC pacing uses `embedded_hal::delay::DelayNs` directly. Pass any delay
//! implementation from your HAL.

pub mod gpio;
pub mod mdio;

// Re-export commonly used types
pub use gpio::{BusDriver, BusLine, GpioLayout, Level, MmioWindow, RegisterWindow};
pub use mdio::{BitBangMdio, MdioBus, MdioTiming};
