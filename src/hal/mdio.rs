//! MDIO (Management Data Input/Output) HAL
//!
//! This module implements the IEEE 802.3 Clause 22 management frame in
//! software on top of the GPIO [`BusDriver`]. There is no MDIO controller
//! involved: every bit is clocked by toggling MDC.
//!
//! # Frame Layout
//!
//! ```text
//! write: PRE(32x1) ST(01) OP(01) PHY(5) REG(5) TA(10)      DATA(16)   64 clocks
//! read:  PRE(32x1) ST(01) OP(10) PHY(5) REG(5) TA(1 clock) DATA(16)   63 clocks
//! ```
//!
//! Fields are sent MSB first. The host changes MDIO while MDC is low. On
//! reads MDIO is released after the register address and each data bit is
//! sampled right after MDC rises. Every transaction, including a failed
//! one, ends with both lines released to input.

use embedded_hal::delay::DelayNs;

use crate::constants::{
    ADDR_BITS, DATA_BITS, DEFAULT_MDC_HALF_PERIOD_NS, FIELD_2_BITS, MAX_PHY_ADDR, MAX_REG_ADDR,
    PREAMBLE_BITS, READ_TURNAROUND_CLOCKS, START_OF_FRAME, WRITE_TURNAROUND,
};
use crate::error::{ConfigError, IoError, IoResult, Result};
use crate::hal::gpio::{BusDriver, BusLine, Level, RegisterWindow};

// =============================================================================
// MDIO Bus Trait
// =============================================================================

/// Trait for MDIO bus operations
///
/// This trait can be implemented by different backends, allowing the
/// switch driver to work with the bit-banged bus, a hardware controller,
/// or a simulated device in tests.
pub trait MdioBus {
    /// Read a register
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16>;

    /// Write a register
    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()>;

    /// Read-modify-write a register
    fn modify<F>(&mut self, phy_addr: u8, reg_addr: u8, f: F) -> Result<()>
    where
        F: FnOnce(u16) -> u16,
    {
        let value = self.read(phy_addr, reg_addr)?;
        self.write(phy_addr, reg_addr, f(value))
    }
}

impl<M: MdioBus + ?Sized> MdioBus for &mut M {
    #[inline(always)]
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16> {
        (**self).read(phy_addr, reg_addr)
    }

    #[inline(always)]
    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()> {
        (**self).write(phy_addr, reg_addr, value)
    }
}

/// Check a PHY/register address pair against the 5-bit field widths
pub fn validate_addresses(phy_addr: u8, reg_addr: u8) -> Result<()> {
    if phy_addr > MAX_PHY_ADDR {
        return Err(ConfigError::InvalidPhyAddress.into());
    }
    if reg_addr > MAX_REG_ADDR {
        return Err(ConfigError::InvalidRegAddress.into());
    }
    Ok(())
}

// =============================================================================
// Frame Types
// =============================================================================

/// Clause 22 opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Opcode {
    /// Write frame (`01`)
    Write = 0b01,
    /// Read frame (`10`)
    Read = 0b10,
}

impl Opcode {
    /// Two-bit field value
    #[inline(always)]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }
}

/// MDC pacing
///
/// The bus is clocked entirely by the host, so any half-period works; a
/// non-zero value only slows the bus down for long or noisy wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MdioTiming {
    /// Delay after each MDC transition, in nanoseconds
    pub half_period_ns: u32,
}

impl Default for MdioTiming {
    fn default() -> Self {
        Self::new()
    }
}

impl MdioTiming {
    /// Unpaced timing
    #[must_use]
    pub const fn new() -> Self {
        Self {
            half_period_ns: DEFAULT_MDC_HALF_PERIOD_NS,
        }
    }

    /// Set the MDC half-period
    #[must_use]
    pub const fn with_half_period_ns(mut self, ns: u32) -> Self {
        self.half_period_ns = ns;
        self
    }

    /// Timing for a target MDC frequency (clamped to at least 1 Hz)
    #[must_use]
    pub const fn from_frequency_hz(hz: u32) -> Self {
        let hz = if hz == 0 { 1 } else { hz };
        Self {
            half_period_ns: 500_000_000 / hz,
        }
    }
}

// =============================================================================
// Bit-banged Codec
// =============================================================================

/// Software Clause 22 master
///
/// Owns the GPIO [`BusDriver`] for its whole lifetime and is the only
/// thing that toggles the lines.
#[derive(Debug)]
pub struct BitBangMdio<W: RegisterWindow, D: DelayNs> {
    bus: BusDriver<W>,
    delay: D,
    timing: MdioTiming,
}

impl<W: RegisterWindow, D: DelayNs> BitBangMdio<W, D> {
    /// Create a codec with unpaced timing
    pub fn new(bus: BusDriver<W>, delay: D) -> Self {
        Self::with_timing(bus, delay, MdioTiming::new())
    }

    /// Create a codec with explicit timing
    pub fn with_timing(bus: BusDriver<W>, delay: D, timing: MdioTiming) -> Self {
        Self { bus, delay, timing }
    }

    /// Timing in use
    #[must_use]
    pub const fn timing(&self) -> MdioTiming {
        self.timing
    }

    /// Borrow the line driver
    #[must_use]
    pub fn bus(&self) -> &BusDriver<W> {
        &self.bus
    }

    /// Give back the line driver and delay provider
    pub fn into_parts(self) -> (BusDriver<W>, D) {
        (self.bus, self.delay)
    }

    #[inline]
    fn pace(&mut self) {
        if self.timing.half_period_ns != 0 {
            self.delay.delay_ns(self.timing.half_period_ns);
        }
    }

    /// One full MDC period: rise, then fall
    fn clock(&mut self) -> IoResult<()> {
        self.bus.drive_high(BusLine::Mdc)?;
        self.pace();
        self.bus.drive_low(BusLine::Mdc)?;
        self.pace();
        Ok(())
    }

    /// Clock out the low `bits` bits of `value`, MSB first
    fn shift_out(&mut self, value: u16, bits: u32) -> IoResult<()> {
        for i in (0..bits).rev() {
            let level = Level::from((value >> i) & 1 != 0);
            self.bus.drive(BusLine::Mdio, level)?;
            self.clock()?;
        }
        Ok(())
    }

    /// Preamble through register address, common to both frame kinds
    fn send_header(&mut self, op: Opcode, phy_addr: u8, reg_addr: u8) -> IoResult<()> {
        self.bus.set_output(BusLine::Mdio)?;
        self.bus.set_output(BusLine::Mdc)?;
        self.bus.drive_low(BusLine::Mdc)?;
        self.bus.drive_high(BusLine::Mdio)?;

        for _ in 0..PREAMBLE_BITS {
            self.clock()?;
        }

        self.shift_out(START_OF_FRAME, FIELD_2_BITS)?;
        self.shift_out(op.bits(), FIELD_2_BITS)?;
        self.shift_out(u16::from(phy_addr), ADDR_BITS)?;
        self.shift_out(u16::from(reg_addr), ADDR_BITS)
    }

    fn write_frame(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> IoResult<()> {
        self.send_header(Opcode::Write, phy_addr, reg_addr)?;
        self.shift_out(WRITE_TURNAROUND, FIELD_2_BITS)?;
        self.shift_out(value, DATA_BITS)
    }

    fn read_frame(&mut self, phy_addr: u8, reg_addr: u8) -> IoResult<u16> {
        self.send_header(Opcode::Read, phy_addr, reg_addr)?;
        self.bus.set_input(BusLine::Mdio)?;

        for _ in 0..READ_TURNAROUND_CLOCKS {
            self.clock()?;
        }

        let mut value = 0u16;
        for _ in 0..DATA_BITS {
            self.bus.drive_high(BusLine::Mdc)?;
            self.pace();
            let bit = self.bus.sample(BusLine::Mdio)?;
            value = (value << 1) | u16::from(bit.is_high());
            self.bus.drive_low(BusLine::Mdc)?;
            self.pace();
        }
        Ok(value)
    }

    /// Release both lines and fold any line error into the frame result
    fn finish<T>(&mut self, frame: IoResult<T>) -> Result<T> {
        let released = self.bus.release();
        match (frame, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Err(_e), _) | (Ok(_), Err(_e)) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("MDIO frame aborted: {}", _e);
                Err(IoError::BusTimeout.into())
            }
        }
    }
}

impl<W: RegisterWindow, D: DelayNs> MdioBus for BitBangMdio<W, D> {
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16> {
        validate_addresses(phy_addr, reg_addr)?;
        let frame = self.read_frame(phy_addr, reg_addr);
        self.finish(frame)
    }

    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()> {
        validate_addresses(phy_addr, reg_addr)?;
        let frame = self.write_frame(phy_addr, reg_addr, value);
        self.finish(frame)
    }
}

// =============================================================================
// PHY Register Definitions (IEEE 802.3 standard registers)
// =============================================================================

/// Standard PHY register addresses (IEEE 802.3 Clause 22)
pub mod phy_reg {
    /// Basic Mode Control Register
    pub const BMCR: u8 = 0;
    /// MMD Access Control Register
    pub const MMD_CTRL: u8 = 13;
    /// MMD Access Data Register
    pub const MMD_DATA: u8 = 14;
}

/// BMCR (Basic Mode Control Register) bits
pub mod bmcr {
    /// Soft reset
    pub const RESET: u16 = 1 << 15;
    /// Speed select (100 Mbps if set)
    pub const SPEED_100: u16 = 1 << 13;
    /// Auto-negotiation enable
    pub const AN_ENABLE: u16 = 1 << 12;
    /// Restart auto-negotiation
    pub const AN_RESTART: u16 = 1 << 9;
    /// Duplex mode (full duplex if set)
    pub const DUPLEX_FULL: u16 = 1 << 8;
}

// =============================================================================
// Unit Tests
// =============================================================================
