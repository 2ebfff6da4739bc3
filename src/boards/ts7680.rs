//! TS-7680 board configuration (i.MX28 + 88E60xx switch).
//!
//! MDC and MDIO are bank 0 pins 0 and 1 of the i.MX28 pin controller,
//! muxed to GPIO at start-up. The whole register set fits in one page
//! starting at the pin controller base.

use crate::error::IoResult;
use crate::hal::gpio::{GpioLayout, MmioWindow};

/// TS-7680 board constants and helpers.
pub struct Ts7680;

impl Ts7680 {
    // =========================================================================
    // Register Window
    // =========================================================================

    /// Physical base address of the i.MX28 pin controller.
    pub const GPIO_PHYS_BASE: usize = 0x8001_8000;

    /// Bytes to map from [`Self::GPIO_PHYS_BASE`].
    pub const WINDOW_LEN: usize = 0x1000;

    // =========================================================================
    // Register Offsets
    // =========================================================================

    /// Mux control word selecting GPIO function for bank 0 pins 0-1.
    pub const PINMUX_OFFSET: usize = 0x184;

    /// GPIO function for both lines.
    pub const PINMUX_GPIO: u32 = 0xF;

    /// Output-set word of bank 0.
    pub const DOUT_SET: usize = 0x744;

    /// Output-clear word of bank 0.
    pub const DOUT_CLR: usize = 0x748;

    /// Input-sample word of bank 0.
    pub const DIN: usize = 0x940;

    /// Output-enable set word of bank 0.
    pub const DOE_SET: usize = 0xB44;

    /// Output-enable clear word of bank 0.
    pub const DOE_CLR: usize = 0xB48;

    // =========================================================================
    // Line Masks
    // =========================================================================

    /// MDC on bank 0 pin 0.
    pub const MDC_MASK: u32 = 1 << 0;

    /// MDIO on bank 0 pin 1.
    pub const MDIO_MASK: u32 = 1 << 1;

    // =========================================================================
    // Helper Methods
    // =========================================================================

    /// GPIO layout of the management bus lines, including the pin-mux write.
    #[must_use]
    pub const fn gpio_layout() -> GpioLayout {
        GpioLayout::new()
            .with_direction_regs(Self::DOE_SET, Self::DOE_CLR)
            .with_output_regs(Self::DOUT_SET, Self::DOUT_CLR)
            .with_input_reg(Self::DIN)
            .with_line_masks(Self::MDIO_MASK, Self::MDC_MASK)
            .with_pinmux(Self::PINMUX_OFFSET, Self::PINMUX_GPIO)
    }

    /// Wrap the pin controller page mapped at `base`.
    ///
    /// # Safety
    ///
    /// `base` must point to a mapping of [`Self::WINDOW_LEN`] bytes of the
    /// pin controller at [`Self::GPIO_PHYS_BASE`] that outlives the window,
    /// and no one else may drive bank 0 pins 0-1 meanwhile.
    pub unsafe fn window(base: *mut u32) -> IoResult<MmioWindow> {
        // SAFETY: forwarded from the caller
        unsafe { MmioWindow::new(base, Self::WINDOW_LEN) }
    }
}
