//! Chip identification
//!
//! The switch model is read once from the identification register of
//! port 0 (bus address 0x18, register 0x03). The low nibble is the
//! silicon revision and is masked off.

use crate::error::{Result, SwitchError, SwitchResult};
use crate::hal::mdio::MdioBus;
use crate::switch::device::Switch;
use crate::switch::profile::{self, SwitchProfile};
use crate::switch::registers::{SWITCH_ID_MASK, port_reg};

/// Switch model resolved from the identification register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChipModel {
    /// 88E6020, two external ports
    Mv88E6020,
    /// 88E6070, four external ports
    Mv88E6070,
    /// 88E6071 (recognized, not supported)
    Mv88E6071,
    /// 88E6220 (recognized, not supported)
    Mv88E6220,
    /// 88E6251 (recognized, not supported)
    Mv88E6251,
    /// Any other signature (masked value kept)
    Unknown(u16),
}

impl ChipModel {
    /// Resolve a raw identification word
    #[must_use]
    pub const fn from_id(raw: u16) -> Self {
        match raw & SWITCH_ID_MASK {
            0x0200 => ChipModel::Mv88E6020,
            0x0700 => ChipModel::Mv88E6070,
            0x0710 => ChipModel::Mv88E6071,
            0x2200 => ChipModel::Mv88E6220,
            0x2500 => ChipModel::Mv88E6251,
            other => ChipModel::Unknown(other),
        }
    }

    /// Model name as printed in reports
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            ChipModel::Mv88E6020 => "88E6020",
            ChipModel::Mv88E6070 => "88E6070",
            ChipModel::Mv88E6071 => "88E6071",
            ChipModel::Mv88E6220 => "88E6220",
            ChipModel::Mv88E6251 => "88E6251",
            ChipModel::Unknown(_) => "unknown",
        }
    }

    /// Returns `true` if this crate can configure the model
    #[must_use]
    pub const fn is_supported(&self) -> bool {
        matches!(self, ChipModel::Mv88E6020 | ChipModel::Mv88E6070)
    }

    /// Topology profile of a supported model
    pub fn profile(&self) -> SwitchResult<&'static SwitchProfile> {
        match self {
            ChipModel::Mv88E6020 => Ok(&profile::MV88E6020),
            ChipModel::Mv88E6070 => Ok(&profile::MV88E6070),
            _ => Err(SwitchError::UnsupportedChip),
        }
    }
}

impl core::fmt::Display for ChipModel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

/// Read the identification register and resolve the model
///
/// Only reads; never writes to the switch.
pub fn identify<M: MdioBus>(switch: &mut Switch<M>) -> Result<ChipModel> {
    let raw = switch.read_port(0, port_reg::SWITCH_ID)?;
    let model = ChipModel::from_id(raw);

    #[cfg(feature = "defmt")]
    defmt::info!("switch id {=u16:#x}: {}", raw, model);

    Ok(model)
}

impl<M: MdioBus> Switch<M> {
    /// Identify the chip and return its profile
    ///
    /// Unsupported or unknown chips yield [`SwitchError::UnsupportedChip`]
    /// without any register write.
    pub fn detect(&mut self) -> Result<&'static SwitchProfile> {
        let model = identify(self)?;
        Ok(model.profile()?)
    }
}
