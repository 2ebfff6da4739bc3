//! GPIO Bus Driver
//!
//! Two GPIO lines carry the management bus: MDC (clock, always driven by
//! the host) and MDIO (data, bidirectional). The GPIO block exposes
//! separate set/clear words for line direction and output level plus one
//! input-sample word, each holding one bit per line.
//!
//! # Register Words
//!
//! | Word            | Effect                                   |
//! |-----------------|------------------------------------------|
//! | direction-set   | Lines with a 1 bit become outputs        |
//! | direction-clear | Lines with a 1 bit become inputs         |
//! | output-set      | Lines with a 1 bit are driven high       |
//! | output-clear    | Lines with a 1 bit are driven low        |
//! | input           | Current level of every line              |
//!
//! Set/clear words leave lines whose bit is 0 untouched, so every line
//! operation is a single 32-bit access with no read-modify-write.
//!
//! # Register Window
//!
//! The driver never touches memory directly. It owns a [`RegisterWindow`]:
//! [`MmioWindow`] on hardware, a simulated register file in tests.

use crate::error::{ConfigError, ConfigResult, IoError, IoResult};

// =============================================================================
// Line Types
// =============================================================================

/// Management bus line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusLine {
    /// Bidirectional data line
    Mdio,
    /// Clock line
    Mdc,
}

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Line released (high impedance, pulled up)
    #[default]
    Input,
    /// Line driven by the host
    Output,
}

/// Logic level on a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    /// Logic 0
    Low,
    /// Logic 1
    High,
}

impl Level {
    /// Returns `true` for [`Level::High`]
    #[inline(always)]
    #[must_use]
    pub const fn is_high(self) -> bool {
        matches!(self, Level::High)
    }
}

impl From<bool> for Level {
    fn from(bit: bool) -> Self {
        if bit { Level::High } else { Level::Low }
    }
}

// =============================================================================
// GPIO Layout
// =============================================================================

/// Pin-mux write applied once when the bus driver is created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMux {
    /// Byte offset of the mux register inside the window
    pub offset: usize,
    /// Value written to it
    pub value: u32,
}

/// Register offsets and line masks of a GPIO block
///
/// Offsets are byte offsets from the start of the register window and
/// must be 4-byte aligned. Board presets live in [`crate::boards`].
///
/// # Example
///
/// ```ignore
/// let layout = GpioLayout::new()
///     .with_direction_regs(0xB44, 0xB48)
///     .with_output_regs(0x744, 0x748)
///     .with_input_reg(0x940)
///     .with_line_masks(0x2, 0x1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioLayout {
    /// Direction-set word (make output)
    pub dir_set: usize,
    /// Direction-clear word (make input)
    pub dir_clear: usize,
    /// Output-set word (drive high)
    pub out_set: usize,
    /// Output-clear word (drive low)
    pub out_clear: usize,
    /// Input-sample word
    pub input: usize,
    /// Bit of the MDIO line in every word
    pub mdio_mask: u32,
    /// Bit of the MDC line in every word
    pub mdc_mask: u32,
    /// Optional mux setup written at init
    pub pinmux: Option<PinMux>,
}

impl Default for GpioLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl GpioLayout {
    /// Layout with consecutive words at 0x00..0x10, MDC on bit 0 and MDIO on bit 1
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dir_set: 0x00,
            dir_clear: 0x04,
            out_set: 0x08,
            out_clear: 0x0C,
            input: 0x10,
            mdio_mask: 1 << 1,
            mdc_mask: 1 << 0,
            pinmux: None,
        }
    }

    /// Set the direction-set and direction-clear offsets
    #[must_use]
    pub const fn with_direction_regs(mut self, set: usize, clear: usize) -> Self {
        self.dir_set = set;
        self.dir_clear = clear;
        self
    }

    /// Set the output-set and output-clear offsets
    #[must_use]
    pub const fn with_output_regs(mut self, set: usize, clear: usize) -> Self {
        self.out_set = set;
        self.out_clear = clear;
        self
    }

    /// Set the input-sample offset
    #[must_use]
    pub const fn with_input_reg(mut self, offset: usize) -> Self {
        self.input = offset;
        self
    }

    /// Set the MDIO and MDC bit masks
    #[must_use]
    pub const fn with_line_masks(mut self, mdio: u32, mdc: u32) -> Self {
        self.mdio_mask = mdio;
        self.mdc_mask = mdc;
        self
    }

    /// Write `value` at `offset` when the driver is created
    #[must_use]
    pub const fn with_pinmux(mut self, offset: usize, value: u32) -> Self {
        self.pinmux = Some(PinMux { offset, value });
        self
    }

    /// Bit mask of `line`
    #[inline(always)]
    #[must_use]
    pub const fn mask(&self, line: BusLine) -> u32 {
        match line {
            BusLine::Mdio => self.mdio_mask,
            BusLine::Mdc => self.mdc_mask,
        }
    }

    /// Check masks and offsets
    ///
    /// Each line mask must be a single bit, the two must differ, and all
    /// offsets must be word aligned.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.mdio_mask.count_ones() != 1
            || self.mdc_mask.count_ones() != 1
            || self.mdio_mask == self.mdc_mask
        {
            return Err(ConfigError::InvalidConfig);
        }

        let mut offsets = [
            self.dir_set,
            self.dir_clear,
            self.out_set,
            self.out_clear,
            self.input,
            0,
        ];
        if let Some(mux) = self.pinmux {
            offsets[5] = mux.offset;
        }
        if offsets.iter().any(|off| off % 4 != 0) {
            return Err(ConfigError::InvalidConfig);
        }
        Ok(())
    }
}

// =============================================================================
// Register Window
// =============================================================================

/// Access to a block of 32-bit registers by byte offset
///
/// Implemented by [`MmioWindow`] for real hardware. Tests substitute a
/// simulated block.
pub trait RegisterWindow {
    /// Read the word at `offset`
    fn read(&mut self, offset: usize) -> IoResult<u32>;

    /// Write `value` to the word at `offset`
    fn write(&mut self, offset: usize, value: u32) -> IoResult<()>;
}

impl<T: RegisterWindow + ?Sized> RegisterWindow for &mut T {
    #[inline(always)]
    fn read(&mut self, offset: usize) -> IoResult<u32> {
        (**self).read(offset)
    }

    #[inline(always)]
    fn write(&mut self, offset: usize, value: u32) -> IoResult<()> {
        (**self).write(offset, value)
    }
}

/// Memory-mapped register window
///
/// All accesses are volatile. Offsets past the end of the window are
/// rejected with [`IoError::LineFault`].
#[derive(Debug)]
pub struct MmioWindow {
    base: core::ptr::NonNull<u32>,
    len: usize,
}

impl MmioWindow {
    /// Wrap an already mapped register block
    ///
    /// Fails with [`IoError::MappingFailed`] if `base` is null, not word
    /// aligned, or `len` is zero.
    ///
    /// # Safety
    ///
    /// `base..base + len` must be a valid device register block that stays
    /// mapped for the lifetime of the window, and nothing else may access
    /// the MDIO/MDC bits of that block while the window exists.
    pub unsafe fn new(base: *mut u32, len: usize) -> IoResult<Self> {
        if len == 0 || (base as usize) % 4 != 0 {
            return Err(IoError::MappingFailed);
        }
        let base = core::ptr::NonNull::new(base).ok_or(IoError::MappingFailed)?;
        Ok(Self { base, len })
    }

    /// Window length in bytes
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if the window covers no registers
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn word(&self, offset: usize) -> IoResult<*mut u32> {
        if offset % 4 != 0 || offset.saturating_add(4) > self.len {
            return Err(IoError::LineFault);
        }
        // SAFETY: offset is in bounds of the block given to `new`
        Ok(unsafe { self.base.as_ptr().add(offset / 4) })
    }
}

impl RegisterWindow for MmioWindow {
    fn read(&mut self, offset: usize) -> IoResult<u32> {
        let ptr = self.word(offset)?;
        // SAFETY: pointer is aligned and inside the mapped block
        Ok(unsafe { core::ptr::read_volatile(ptr) })
    }

    fn write(&mut self, offset: usize, value: u32) -> IoResult<()> {
        let ptr = self.word(offset)?;
        // SAFETY: pointer is aligned and inside the mapped block
        unsafe { core::ptr::write_volatile(ptr, value) };
        Ok(())
    }
}

// SAFETY: the window is the sole owner of the MDIO/MDC bits of its block
unsafe impl Send for MmioWindow {}

// =============================================================================
// Bus Driver
// =============================================================================

/// Line-level driver for the MDIO and MDC GPIOs
///
/// Knows nothing about frames. Each operation performs exactly one
/// register access.
#[derive(Debug)]
pub struct BusDriver<W: RegisterWindow> {
    window: W,
    layout: GpioLayout,
}

impl<W: RegisterWindow> BusDriver<W> {
    /// Create the driver
    ///
    /// Validates the layout, applies the pin-mux write if any, and leaves
    /// both lines as inputs.
    pub fn new(window: W, layout: GpioLayout) -> crate::Result<Self> {
        layout.validate()?;

        let mut driver = Self { window, layout };
        if let Some(mux) = layout.pinmux {
            driver.window.write(mux.offset, mux.value)?;
        }
        driver.release()?;

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "MDIO bus driver ready (mdio mask {:#x}, mdc mask {:#x})",
            layout.mdio_mask,
            layout.mdc_mask
        );

        Ok(driver)
    }

    /// Wrap a window without validation or init writes
    #[cfg(test)]
    pub(crate) fn from_parts_unchecked(window: W, layout: GpioLayout) -> Self {
        Self { window, layout }
    }

    /// Layout in use
    #[must_use]
    pub const fn layout(&self) -> &GpioLayout {
        &self.layout
    }

    /// Borrow the register window
    #[must_use]
    pub fn window(&self) -> &W {
        &self.window
    }

    /// Drive `line` high
    #[inline]
    pub fn drive_high(&mut self, line: BusLine) -> IoResult<()> {
        self.window.write(self.layout.out_set, self.layout.mask(line))
    }

    /// Drive `line` low
    #[inline]
    pub fn drive_low(&mut self, line: BusLine) -> IoResult<()> {
        self.window.write(self.layout.out_clear, self.layout.mask(line))
    }

    /// Drive `line` to `level`
    #[inline]
    pub fn drive(&mut self, line: BusLine, level: Level) -> IoResult<()> {
        match level {
            Level::High => self.drive_high(line),
            Level::Low => self.drive_low(line),
        }
    }

    /// Make `line` an output
    #[inline]
    pub fn set_output(&mut self, line: BusLine) -> IoResult<()> {
        self.window.write(self.layout.dir_set, self.layout.mask(line))
    }

    /// Release `line` to input
    #[inline]
    pub fn set_input(&mut self, line: BusLine) -> IoResult<()> {
        self.window.write(self.layout.dir_clear, self.layout.mask(line))
    }

    /// Sample the current level of `line`
    #[inline]
    pub fn sample(&mut self, line: BusLine) -> IoResult<Level> {
        let word = self.window.read(self.layout.input)?;
        Ok(Level::from(word & self.layout.mask(line) != 0))
    }

    /// Release both lines to input
    ///
    /// Both releases are attempted even if the first fails; the first
    /// error is returned.
    pub fn release(&mut self) -> IoResult<()> {
        let mdio = self.set_input(BusLine::Mdio);
        let mdc = self.set_input(BusLine::Mdc);
        mdio.and(mdc)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
