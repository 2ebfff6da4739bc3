//! Per-chip topology profiles and VLAN layouts
//!
//! A [`SwitchProfile`] describes one supported chip: which ports face the
//! outside, which one is the CPU uplink, how many internal PHYs need the
//! bring-up sequence, and the VLAN table of each [`Layout`]. Layouts are
//! plain static data; [`apply_layout`] is the only code that turns them
//! into VTU insertions.
//!
//! # Layouts
//!
//! | Layout   | 88E6020                     | 88E6070                           |
//! |----------|-----------------------------|-----------------------------------|
//! | `Switch` | no VLANs                    | no VLANs                          |
//! | `Vlan`   | VLAN 1 = {P0, P5}, 2 = {P1, P5} | VLAN n = {P0, Pn}, n = 1..4   |
//! | `Wlan`   | same as `Vlan`              | VLAN 1 = {P0, P1}, 2 = {P0, P2-P4} |
//!
//! The CPU port is always tagged, external ports always untagged.

use crate::constants::SWITCH_PORTS;
use crate::error::{ConfigError, Result, SwitchError, SwitchResult};
use crate::hal::mdio::MdioBus;
use crate::switch::chip::ChipModel;
use crate::switch::device::{PhyMode, Switch};
use crate::switch::vtu::{PortLock, TagCode, VtuEntry};

// =============================================================================
// Layout Types
// =============================================================================

/// Operating mode of the switch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Layout {
    /// Plain switch, every port floods to every other port
    #[default]
    Switch,
    /// Each external port in its own VLAN, trunked to the CPU
    Vlan,
    /// First external port alone, remaining ports share one VLAN
    Wlan,
}

impl Layout {
    /// Lower-case mode name
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Layout::Switch => "switch",
            Layout::Vlan => "vlan",
            Layout::Wlan => "wlan",
        }
    }

    /// Returns `true` if the layout programs the VTU
    #[must_use]
    pub const fn uses_vlans(&self) -> bool {
        !matches!(self, Layout::Switch)
    }
}

impl core::str::FromStr for Layout {
    type Err = ConfigError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        match s {
            "switch" => Ok(Layout::Switch),
            "vlan" => Ok(Layout::Vlan),
            "wlan" => Ok(Layout::Wlan),
            _ => Err(ConfigError::InvalidConfig),
        }
    }
}

impl core::fmt::Display for Layout {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One VLAN of a layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VlanSpec {
    /// VLAN ID
    pub vid: u16,
    /// Member ports and their egress tagging
    pub members: &'static [(u8, TagCode)],
}

/// VLAN table of one layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LayoutTable {
    /// Layout this table implements
    pub layout: Layout,
    /// VLANs in insertion order
    pub vlans: &'static [VlanSpec],
}

// =============================================================================
// Switch Profile
// =============================================================================

/// Static description of a supported switch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SwitchProfile {
    /// Chip this profile describes
    pub model: ChipModel,
    /// Port index of the CPU uplink
    pub cpu_port: u8,
    /// Port indices of the external ports, labelled a, b, c...
    pub external_ports: &'static [u8],
    /// Name of each port index in reports
    pub port_aliases: [&'static str; SWITCH_PORTS],
    /// Internal PHYs 0..n receive the erratum and enable sequence
    pub internal_phys: u8,
    /// Ports put into flooding by the bring-up
    pub flood_ports: &'static [u8],
    /// VLAN layouts flood broadcasts instead of unknown traffic only
    pub broadcast_flood_with_vlans: bool,
    /// Force link up on the CPU port in every mode
    pub force_cpu_link: bool,
    /// Program the CPU port registers before inserting VLANs
    pub setup_cpu_port: bool,
    /// VLAN tables for the layouts the chip supports
    pub layouts: &'static [LayoutTable],
}

impl SwitchProfile {
    /// VLAN table of `layout`
    ///
    /// [`Layout::Switch`] always resolves to an empty table.
    pub fn vlans(&self, layout: Layout) -> SwitchResult<&'static [VlanSpec]> {
        if !layout.uses_vlans() {
            return Ok(&[]);
        }
        self.layouts
            .iter()
            .find(|table| table.layout == layout)
            .map(|table| table.vlans)
            .ok_or(SwitchError::UnsupportedLayout)
    }

    /// Report name of port index `port`
    #[must_use]
    pub fn alias(&self, port: usize) -> &'static str {
        self.port_aliases.get(port).copied().unwrap_or("unused")
    }

    /// Report label (`a`, `b`, ...) of external port number `n`
    #[must_use]
    pub const fn external_label(n: usize) -> char {
        (b'a' + (n % 26) as u8) as char
    }
}

const TWO_PORT_VLANS: &[VlanSpec] = &[
    VlanSpec {
        vid: 1,
        members: &[(0, TagCode::Untagged), (5, TagCode::Tagged)],
    },
    VlanSpec {
        vid: 2,
        members: &[(1, TagCode::Untagged), (5, TagCode::Tagged)],
    },
];

/// 88E6020: two PHY ports (P0, P1) and the CPU on RMII port 5
pub static MV88E6020: SwitchProfile = SwitchProfile {
    model: ChipModel::Mv88E6020,
    cpu_port: 5,
    external_ports: &[0, 1],
    port_aliases: ["a", "b", "unused", "unused", "unused", "cpu", "unused"],
    internal_phys: 2,
    flood_ports: &[0, 1, 5],
    broadcast_flood_with_vlans: true,
    force_cpu_link: true,
    setup_cpu_port: true,
    layouts: &[
        LayoutTable {
            layout: Layout::Vlan,
            vlans: TWO_PORT_VLANS,
        },
        LayoutTable {
            layout: Layout::Wlan,
            vlans: TWO_PORT_VLANS,
        },
    ],
};

/// 88E6070: four PHY ports (P1-P4) and the CPU on port 0
pub static MV88E6070: SwitchProfile = SwitchProfile {
    model: ChipModel::Mv88E6070,
    cpu_port: 0,
    external_ports: &[1, 2, 3, 4],
    port_aliases: ["cpu", "a", "b", "c", "d", "unused", "unused"],
    internal_phys: 5,
    flood_ports: &[0, 1, 2, 3, 4],
    broadcast_flood_with_vlans: false,
    force_cpu_link: false,
    setup_cpu_port: false,
    layouts: &[
        LayoutTable {
            layout: Layout::Vlan,
            vlans: &[
                VlanSpec {
                    vid: 1,
                    members: &[(0, TagCode::Tagged), (1, TagCode::Untagged)],
                },
                VlanSpec {
                    vid: 2,
                    members: &[(0, TagCode::Tagged), (2, TagCode::Untagged)],
                },
                VlanSpec {
                    vid: 3,
                    members: &[(0, TagCode::Tagged), (3, TagCode::Untagged)],
                },
                VlanSpec {
                    vid: 4,
                    members: &[(0, TagCode::Tagged), (4, TagCode::Untagged)],
                },
            ],
        },
        LayoutTable {
            layout: Layout::Wlan,
            vlans: &[
                VlanSpec {
                    vid: 1,
                    members: &[(0, TagCode::Tagged), (1, TagCode::Untagged)],
                },
                VlanSpec {
                    vid: 2,
                    members: &[
                        (0, TagCode::Tagged),
                        (2, TagCode::Untagged),
                        (3, TagCode::Untagged),
                        (4, TagCode::Untagged),
                    ],
                },
            ],
        },
    ],
};

// =============================================================================
// Layout Application
// =============================================================================

/// Insert `vlans` in order
///
/// The CPU port starts locked. Every other port is configured by the
/// first VLAN that names it and locked from then on, so its default VID
/// is that VLAN's ID.
pub fn apply_layout<M: MdioBus>(
    switch: &mut Switch<M>,
    cpu_port: u8,
    vlans: &[VlanSpec],
) -> Result<()> {
    let mut locked: u16 = 1 << cpu_port;

    for spec in vlans {
        let mut entry = VtuEntry::new(spec.vid)?;
        for &(port, tag) in spec.members {
            let lock = if locked & (1 << port) != 0 {
                PortLock::Locked
            } else {
                PortLock::Configuring
            };
            entry.set_port(port, tag, lock)?;
        }

        switch.vtu_add_entry(&entry)?;
        locked |= entry.configuring_mask();
    }
    Ok(())
}

/// Bring the switch up in `layout`
///
/// Runs the erratum and enable sequence on the internal PHYs, sets port
/// flooding, forces the CPU link where the board needs it, and inserts
/// the layout's VLANs. An unsupported layout is rejected before any
/// register is written.
pub fn apply_mode<M: MdioBus>(
    switch: &mut Switch<M>,
    profile: &SwitchProfile,
    layout: Layout,
) -> Result<()> {
    let vlans = profile.vlans(layout)?;

    #[cfg(feature = "defmt")]
    defmt::info!("{} bring-up in {} mode", profile.model, layout);

    for phy in 0..profile.internal_phys {
        switch.apply_erratum(phy)?;
    }
    for phy in 0..profile.internal_phys {
        switch.enable_phy(phy)?;
    }

    for &port in profile.flood_ports {
        if layout.uses_vlans() && profile.broadcast_flood_with_vlans {
            switch.enable_broadcast_flood(port)?;
        } else {
            switch.enable_flood(port)?;
        }
    }

    if profile.force_cpu_link {
        switch.force_link(profile.cpu_port)?;
    }

    if !vlans.is_empty() {
        if profile.setup_cpu_port {
            switch.configure_cpu_port(profile.cpu_port)?;
        }
        apply_layout(switch, profile.cpu_port, vlans)?;
    }
    Ok(())
}

/// Force speed/duplex on the internal PHY behind external port `port`
///
/// `port` counts internal PHYs from 0 and must be below the profile's
/// internal PHY count.
pub fn force_port_mode<M: MdioBus>(
    switch: &mut Switch<M>,
    profile: &SwitchProfile,
    port: u8,
    mode: PhyMode,
) -> Result<()> {
    if port >= profile.internal_phys {
        return Err(ConfigError::InvalidPort.into());
    }
    switch.force_phy_mode(port, mode)
}

// =============================================================================
// Unit Tests
// =============================================================================
