//! Marvell 88E60xx Switch Control
//!
//! A `no_std`, `no_alloc` driver for Marvell 88E60xx Ethernet switches
//! reached over a software (bit-banged) MDIO bus on two GPIO lines.
//!
//! The crate can identify the switch, bring it up as a plain switch or
//! with one of the per-chip VLAN layouts, maintain the VLAN Table Unit
//! (VTU), force speed/duplex on the internal PHYs, and render the switch
//! state as `key=value` lines.
//!
//! # Architecture
//!
//! The driver is organized into three layers:
//!
//! 1. **Line Layer** ([`hal::gpio`]): MDIO/MDC direction, level and sampling
//!    through a [`RegisterWindow`]
//! 2. **Frame Layer** ([`hal::mdio`]): IEEE 802.3 Clause 22 frames clocked
//!    in software by [`BitBangMdio`], behind the [`MdioBus`] trait
//! 3. **Switch Layer** ([`switch`]): register model, chip identification,
//!    VTU management, layouts and reports
//!
//! Each layer only talks to the one below it, so the switch layer runs
//! unchanged on a hardware MDIO controller or a simulated bus.
//!
//! # Supported Chips
//!
//! - 88E6020: two external ports, CPU on port 5
//! - 88E6070: four external ports, CPU on port 0
//!
//! 88E6071, 88E6220 and 88E6251 are recognized and refused.
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for public types and bring-up logging
//! - `critical-section`: Enable the ISR-safe [`sync::SharedSwitch`] wrapper
//!
//! # Example
//!
//! ```ignore
//! use mv88e60xx_switchctl::boards::Ts7680;
//! use mv88e60xx_switchctl::hal::{BitBangMdio, BusDriver};
//! use mv88e60xx_switchctl::switch::{Layout, Switch, SwitchConfig, apply_mode};
//!
//! // Map Ts7680::WINDOW_LEN bytes at Ts7680::GPIO_PHYS_BASE first
//! let window = unsafe { Ts7680::window(mapped_base) }?;
//! let bus = BusDriver::new(window, Ts7680::gpio_layout())?;
//! let mdio = BitBangMdio::new(bus, delay);
//!
//! let mut switch = Switch::new(mdio, SwitchConfig::default());
//! let profile = switch.detect()?;
//! apply_mode(&mut switch, profile, Layout::Vlan)?;
//! ```

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod boards;
pub mod constants;
pub mod error;
pub mod hal;
pub mod switch;

#[cfg(feature = "critical-section")]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub(crate) mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{
    ConfigError, ConfigResult, Error, IoError, IoResult, Result, SwitchError, SwitchResult,
};
pub use hal::gpio::{BusDriver, GpioLayout, MmioWindow, RegisterWindow};
pub use hal::mdio::{BitBangMdio, MdioBus, MdioTiming};
pub use switch::{ChipModel, Layout, Switch, SwitchConfig, SwitchProfile};

#[cfg(feature = "critical-section")]
pub use sync::SharedSwitch;
