//! Switch register model
//!
//! [`Switch`] wraps an [`MdioBus`] and knows the 88E60xx register layout:
//! per-port registers, bounded busy polling, and the Global 2 SMI
//! indirection used to reach the internal PHYs.
//!
//! VTU operations live in [`crate::switch::vtu`], chip identification in
//! [`crate::switch::chip`]; both extend `Switch` with further methods.

use crate::constants::{DEFAULT_POLL_SPINS, DEFAULT_PORT_PRIORITY, SWITCH_PORTS};
use crate::error::{ConfigError, IoError, Result};
use crate::hal::mdio::{MdioBus, bmcr, phy_reg};
use crate::switch::registers::{
    self, GLOBAL2, pcs_control, port_control, port_reg, smi_command, smi_reg,
};

// =============================================================================
// Configuration
// =============================================================================

/// Switch driver configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchConfig {
    /// Reads spent waiting for a busy bit before giving up
    pub poll_spins: u32,
    /// Value written to port register 0x08 after a VTU insertion
    pub port_priority: u16,
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SwitchConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub const fn new() -> Self {
        Self {
            poll_spins: DEFAULT_POLL_SPINS,
            port_priority: DEFAULT_PORT_PRIORITY,
        }
    }

    /// Set the busy-poll bound
    #[must_use]
    pub const fn with_poll_spins(mut self, spins: u32) -> Self {
        self.poll_spins = spins;
        self
    }

    /// Set the port priority value
    #[must_use]
    pub const fn with_port_priority(mut self, value: u16) -> Self {
        self.port_priority = value;
        self
    }
}

// =============================================================================
// Link Types
// =============================================================================

/// Link speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Speed {
    /// 10 Mbps
    Mbps10,
    /// 100 Mbps
    #[default]
    Mbps100,
}

/// Duplex mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Duplex {
    /// Half duplex
    Half,
    /// Full duplex
    #[default]
    Full,
}

/// Resolved speed and duplex of a port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkMode {
    /// Link speed
    pub speed: Speed,
    /// Duplex mode
    pub duplex: Duplex,
}

impl LinkMode {
    /// Create a link mode
    pub const fn new(speed: Speed, duplex: Duplex) -> Self {
        Self { speed, duplex }
    }

    /// Decode the port status speed/duplex code
    ///
    /// Only the four 10/100 codes are defined; anything else is `None`.
    #[must_use]
    pub const fn from_status_code(code: u8) -> Option<Self> {
        match code {
            0x8 => Some(Self::new(Speed::Mbps10, Duplex::Half)),
            0x9 => Some(Self::new(Speed::Mbps100, Duplex::Half)),
            0xA => Some(Self::new(Speed::Mbps10, Duplex::Full)),
            0xB => Some(Self::new(Speed::Mbps100, Duplex::Full)),
            _ => None,
        }
    }

    /// Short name, e.g. `100FD`
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match (self.speed, self.duplex) {
            (Speed::Mbps10, Duplex::Half) => "10HD",
            (Speed::Mbps100, Duplex::Half) => "100HD",
            (Speed::Mbps10, Duplex::Full) => "10FD",
            (Speed::Mbps100, Duplex::Full) => "100FD",
        }
    }
}

impl core::fmt::Display for LinkMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of a port status register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortStatus {
    /// Link is up
    pub link_up: bool,
    /// Speed/duplex, if the code is a known one
    pub mode: Option<LinkMode>,
}

impl PortStatus {
    /// Decode a raw status word
    #[must_use]
    pub const fn from_word(word: u16) -> Self {
        Self {
            link_up: registers::status_link_up(word),
            mode: LinkMode::from_status_code(registers::status_mode(word)),
        }
    }
}

/// Internal PHY control request
///
/// Auto-negotiation is always cleared first; then speed and duplex are
/// applied if given. `auto_negotiate` restores auto-negotiation with
/// 100 Mbps full duplex advertised in the control register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhyMode {
    /// Forced speed
    pub speed: Option<Speed>,
    /// Forced duplex
    pub duplex: Option<Duplex>,
    /// Re-enable auto-negotiation
    pub auto_negotiate: bool,
}

impl PhyMode {
    /// Forced speed and duplex
    #[must_use]
    pub const fn forced(speed: Speed, duplex: Duplex) -> Self {
        Self {
            speed: Some(speed),
            duplex: Some(duplex),
            auto_negotiate: false,
        }
    }

    /// Auto-negotiation
    #[must_use]
    pub const fn auto() -> Self {
        Self {
            speed: None,
            duplex: None,
            auto_negotiate: true,
        }
    }

    /// Set only the speed
    #[must_use]
    pub const fn with_speed(mut self, speed: Speed) -> Self {
        self.speed = Some(speed);
        self
    }

    /// Set only the duplex
    #[must_use]
    pub const fn with_duplex(mut self, duplex: Duplex) -> Self {
        self.duplex = Some(duplex);
        self
    }

    /// Apply the request to a BMCR value
    #[must_use]
    pub const fn apply(&self, mut value: u16) -> u16 {
        value &= !bmcr::AN_ENABLE;

        match self.speed {
            Some(Speed::Mbps10) => value &= !bmcr::SPEED_100,
            Some(Speed::Mbps100) => value |= bmcr::SPEED_100,
            None => {}
        }
        match self.duplex {
            Some(Duplex::Half) => value &= !bmcr::DUPLEX_FULL,
            Some(Duplex::Full) => value |= bmcr::DUPLEX_FULL,
            None => {}
        }
        if self.auto_negotiate {
            value |= bmcr::DUPLEX_FULL | bmcr::AN_ENABLE | bmcr::SPEED_100;
        }
        value
    }
}

// =============================================================================
// Switch
// =============================================================================

/// Highest internal PHY index reachable through SMI
const MAX_INTERNAL_PHY: u8 = 0x0F;

/// BMCR value that powers up an internal PHY: reset, 100 Mbps, full
/// duplex, auto-negotiation enabled and restarted
const PHY_ENABLE: u16 =
    bmcr::RESET | bmcr::SPEED_100 | bmcr::AN_ENABLE | bmcr::AN_RESTART | bmcr::DUPLEX_FULL;

/// Indirect writes of erratum 3.1 (register, value)
const ERRATUM_3_1: [(u8, u16); 4] = [
    (phy_reg::MMD_CTRL, 0x0003),
    (phy_reg::MMD_DATA, 0x0000),
    (phy_reg::MMD_CTRL, 0x4003),
    (phy_reg::MMD_DATA, 0x0000),
];

/// Marvell 88E60xx switch on an MDIO bus
#[derive(Debug)]
pub struct Switch<M: MdioBus> {
    mdio: M,
    config: SwitchConfig,
}

impl<M: MdioBus> Switch<M> {
    /// Create a switch handle
    pub fn new(mdio: M, config: SwitchConfig) -> Self {
        Self { mdio, config }
    }

    /// Configuration in use
    #[must_use]
    pub const fn config(&self) -> &SwitchConfig {
        &self.config
    }

    /// Borrow the bus
    #[must_use]
    pub fn mdio(&self) -> &M {
        &self.mdio
    }

    /// Borrow the bus mutably
    pub fn mdio_mut(&mut self) -> &mut M {
        &mut self.mdio
    }

    /// Give back the bus
    pub fn into_inner(self) -> M {
        self.mdio
    }

    // -------------------------------------------------------------------------
    // Raw access
    // -------------------------------------------------------------------------

    /// Read register `reg` at bus address `addr`
    #[inline]
    pub fn read(&mut self, addr: u8, reg: u8) -> Result<u16> {
        self.mdio.read(addr, reg)
    }

    /// Write register `reg` at bus address `addr`
    #[inline]
    pub fn write(&mut self, addr: u8, reg: u8, value: u16) -> Result<()> {
        self.mdio.write(addr, reg, value)
    }

    /// Read a port register
    pub fn read_port(&mut self, port: u8, reg: u8) -> Result<u16> {
        self.mdio.read(checked_port_addr(port)?, reg)
    }

    /// Write a port register
    pub fn write_port(&mut self, port: u8, reg: u8, value: u16) -> Result<()> {
        self.mdio.write(checked_port_addr(port)?, reg, value)
    }

    /// Read-modify-write a port register
    pub fn modify_port<F>(&mut self, port: u8, reg: u8, f: F) -> Result<()>
    where
        F: FnOnce(u16) -> u16,
    {
        self.mdio.modify(checked_port_addr(port)?, reg, f)
    }

    // -------------------------------------------------------------------------
    // Busy polling
    // -------------------------------------------------------------------------

    /// Read `addr`/`reg` until bit 15 clears
    ///
    /// Returns the first word with the busy bit clear. At least one read is
    /// made; after `max_spins` busy reads the poll fails with
    /// [`IoError::BusTimeout`].
    pub fn poll_until_ready(&mut self, addr: u8, reg: u8, max_spins: u32) -> Result<u16> {
        for _ in 0..max_spins.max(1) {
            let word = self.mdio.read(addr, reg)?;
            if !registers::is_busy(word) {
                return Ok(word);
            }
        }

        #[cfg(feature = "defmt")]
        defmt::warn!("busy poll timeout at {=u8:#x} reg {=u8:#x}", addr, reg);

        Err(IoError::BusTimeout.into())
    }

    /// [`poll_until_ready`](Self::poll_until_ready) with the configured bound
    #[inline]
    pub fn wait_ready(&mut self, addr: u8, reg: u8) -> Result<u16> {
        self.poll_until_ready(addr, reg, self.config.poll_spins)
    }

    // -------------------------------------------------------------------------
    // Global 2 SMI indirection
    // -------------------------------------------------------------------------

    fn smi_wait(&mut self) -> Result<u16> {
        self.wait_ready(GLOBAL2, smi_reg::COMMAND)
    }

    /// Wait for the SMI unit, then start a write of `value` to `dev`/`reg`
    pub fn smi_write(&mut self, dev: u8, reg: u8, value: u16) -> Result<()> {
        self.smi_wait()?;
        self.smi_start_write(dev, reg, value)
    }

    /// Read `dev`/`reg` through the SMI unit
    pub fn smi_read(&mut self, dev: u8, reg: u8) -> Result<u16> {
        self.smi_wait()?;
        let command = registers::smi_command_word(smi_command::OP_READ, dev, reg);
        self.write(GLOBAL2, smi_reg::COMMAND, command)?;
        self.smi_wait()?;
        self.read(GLOBAL2, smi_reg::DATA)
    }

    fn smi_start_write(&mut self, dev: u8, reg: u8, value: u16) -> Result<()> {
        let command = registers::smi_command_word(smi_command::OP_WRITE, dev, reg);
        self.write(GLOBAL2, smi_reg::DATA, value)?;
        self.write(GLOBAL2, smi_reg::COMMAND, command)
    }

    // -------------------------------------------------------------------------
    // Internal PHYs
    // -------------------------------------------------------------------------

    /// Apply erratum 3.1 to internal PHY `phy`
    ///
    /// Four indirect MMD writes, each preceded by an SMI busy poll.
    pub fn apply_erratum(&mut self, phy: u8) -> Result<()> {
        let dev = checked_internal_phy(phy)?;

        #[cfg(feature = "defmt")]
        defmt::debug!("erratum 3.1 on internal PHY {}", phy);

        for (reg, value) in ERRATUM_3_1 {
            self.smi_write(dev, reg, value)?;
        }
        Ok(())
    }

    /// Reset and power up internal PHY `phy` with auto-negotiation
    pub fn enable_phy(&mut self, phy: u8) -> Result<()> {
        let dev = checked_internal_phy(phy)?;
        self.smi_write(dev, phy_reg::BMCR, PHY_ENABLE)
    }

    /// Force speed/duplex (or restore auto-negotiation) on internal PHY `phy`
    ///
    /// Reads the PHY control register, applies `mode`, writes it back and
    /// then issues a soft reset with the same settings.
    pub fn force_phy_mode(&mut self, phy: u8, mode: PhyMode) -> Result<()> {
        let dev = checked_internal_phy(phy)?;

        let control = mode.apply(self.smi_read(dev, phy_reg::BMCR)?);

        self.smi_start_write(dev, phy_reg::BMCR, control)?;
        self.smi_wait()?;
        self.smi_start_write(dev, phy_reg::BMCR, control | bmcr::RESET)?;
        self.smi_wait()?;

        #[cfg(feature = "defmt")]
        defmt::info!("internal PHY {} control set to {=u16:#x}", phy, control);

        Ok(())
    }

    // -------------------------------------------------------------------------
    // Ports
    // -------------------------------------------------------------------------

    /// Put `port` in forwarding with unknown unicast/multicast flooding
    pub fn enable_flood(&mut self, port: u8) -> Result<()> {
        self.modify_port(port, port_reg::CONTROL, |v| v | port_control::FLOOD)
    }

    /// Put `port` in forwarding with all frame classes flooded
    pub fn enable_broadcast_flood(&mut self, port: u8) -> Result<()> {
        self.write_port(port, port_reg::CONTROL, port_control::BROADCAST_FLOOD)
    }

    /// Force link up on `port`
    pub fn force_link(&mut self, port: u8) -> Result<()> {
        self.modify_port(port, port_reg::PCS_CONTROL, |v| {
            v | pcs_control::FORCE_LINK_UP
        })
    }

    /// Configure `port` as the CPU uplink
    ///
    /// Clears port control 1, lets it forward to every other port,
    /// sets default VLAN 1 and writes the configured priority.
    pub fn configure_cpu_port(&mut self, port: u8) -> Result<()> {
        self.write_port(port, port_reg::CONTROL1, 0x0000)?;
        self.write_port(port, port_reg::VLAN_MAP, registers::all_ports_except(port))?;
        self.write_port(port, port_reg::DEFAULT_VLAN, registers::default_vlan_word(1, false))?;
        self.write_port(port, port_reg::CONTROL2, self.config.port_priority)
    }

    /// Read link state and speed/duplex of `port`
    pub fn port_status(&mut self, port: u8) -> Result<PortStatus> {
        let word = self.read_port(port, port_reg::STATUS)?;
        Ok(PortStatus::from_word(word))
    }

    /// Read the default VLAN register of `port` as (VID, force flag)
    pub fn port_default_vlan(&mut self, port: u8) -> Result<(u16, bool)> {
        let word = self.read_port(port, port_reg::DEFAULT_VLAN)?;
        Ok((
            word & registers::default_vlan::VID_MASK,
            registers::default_vlan_forced(word),
        ))
    }
}

fn checked_port_addr(port: u8) -> Result<u8> {
    if usize::from(port) < SWITCH_PORTS {
        Ok(registers::port_addr(port))
    } else {
        Err(ConfigError::InvalidPort.into())
    }
}

fn checked_internal_phy(phy: u8) -> Result<u8> {
    if phy <= MAX_INTERNAL_PHY {
        Ok(registers::internal_phy_addr(phy))
    } else {
        Err(ConfigError::InvalidPhyAddress.into())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
