//! 88E60xx register map
//!
//! The switch answers on several MDIO addresses at once: one per port
//! (0x18 + port), Global 1 (0x1F) and Global 2 (0x17). Internal PHYs are
//! not on the bus directly; they are reached through the Global 2 SMI
//! command/data pair at PHY addresses 0x10 + n.
//!
//! Packed fields are built and decoded by the pure functions at the end
//! of this module so callers never shift bits by hand.

use crate::constants::{SWITCH_PORTS, VTU_SENTINEL};

// =============================================================================
// Bus Addresses
// =============================================================================

/// MDIO address of port 0
pub const PORT_BASE: u8 = 0x18;

/// Global 1 block (VTU, ATU, switch control)
pub const GLOBAL1: u8 = 0x1F;

/// Global 2 block (SMI indirection)
pub const GLOBAL2: u8 = 0x17;

/// SMI device address of internal PHY 0
pub const INTERNAL_PHY_BASE: u8 = 0x10;

/// MDIO address of `port` (0..=6)
#[inline(always)]
#[must_use]
pub const fn port_addr(port: u8) -> u8 {
    PORT_BASE + port
}

/// Port index of a port address, if it is one
#[must_use]
pub const fn port_index(addr: u8) -> Option<u8> {
    if addr >= PORT_BASE && addr < PORT_BASE + SWITCH_PORTS as u8 {
        Some(addr - PORT_BASE)
    } else {
        None
    }
}

/// SMI device address of internal PHY `n`
#[inline(always)]
#[must_use]
pub const fn internal_phy_addr(n: u8) -> u8 {
    INTERNAL_PHY_BASE + n
}

/// Busy bit shared by the VTU operation and SMI command registers
pub const BUSY: u16 = 1 << 15;

/// Returns `true` if the busy bit is set
#[inline(always)]
#[must_use]
pub const fn is_busy(word: u16) -> bool {
    word & BUSY != 0
}

// =============================================================================
// Port Registers
// =============================================================================

/// Per-port register offsets
pub mod port_reg {
    /// Port status
    pub const STATUS: u8 = 0x00;
    /// PCS control (forced link)
    pub const PCS_CONTROL: u8 = 0x01;
    /// Switch identifier (valid at port 0 only)
    pub const SWITCH_ID: u8 = 0x03;
    /// Port control (state, flooding)
    pub const CONTROL: u8 = 0x04;
    /// Port control 1
    pub const CONTROL1: u8 = 0x05;
    /// Port-based VLAN map (forwarding mask)
    pub const VLAN_MAP: u8 = 0x06;
    /// Default VLAN ID and priority
    pub const DEFAULT_VLAN: u8 = 0x07;
    /// Port control 2 / priority
    pub const CONTROL2: u8 = 0x08;
}

/// Port status register bits
pub mod port_status {
    /// Link is up
    pub const LINK: u16 = 1 << 12;
    /// Speed/duplex field shift
    pub const MODE_SHIFT: u16 = 8;
    /// Speed/duplex field mask (after shift)
    pub const MODE_MASK: u16 = 0xF;
}

/// PCS control value bits
pub mod pcs_control {
    /// Link value + forced link
    pub const FORCE_LINK_UP: u16 = 0x0030;
}

/// Port control values
pub mod port_control {
    /// Forwarding state with unknown unicast and multicast flooding
    pub const FLOOD: u16 = 0x000F;
    /// Forwarding with every frame class flooded
    pub const BROADCAST_FLOOD: u16 = 0x007F;
}

/// Default VLAN register bits
pub mod default_vlan {
    /// Force the default VID on all ingress frames
    pub const FORCE: u16 = 1 << 12;
    /// VID field mask
    pub const VID_MASK: u16 = 0x0FFF;
}

/// Identification register mask (drops the revision nibble)
pub const SWITCH_ID_MASK: u16 = 0xFFF0;

// =============================================================================
// Global 1 Registers (VTU)
// =============================================================================

/// Global 1 VTU register offsets
pub mod vtu_reg {
    /// VTU operation
    pub const OPERATION: u8 = 0x05;
    /// VTU VID
    pub const VID: u8 = 0x06;
    /// Member tags for ports 0-3
    pub const DATA_0_3: u8 = 0x07;
    /// Member tags for ports 4-6
    pub const DATA_4_6: u8 = 0x08;
}

/// VTU operation register fields
pub mod vtu_operation {
    /// Opcode field shift
    pub const OP_SHIFT: u16 = 12;
    /// Opcode field mask (after shift)
    pub const OP_MASK: u16 = 0x7;
    /// Member violation flag
    pub const MEMBER_VIOLATION: u16 = 1 << 6;
    /// Miss violation flag
    pub const MISS_VIOLATION: u16 = 1 << 5;
    /// Source port of the violation
    pub const SPID_MASK: u16 = 0x000F;
}

/// VTU VID register fields
pub mod vtu_vid {
    /// Entry valid bit
    pub const VALID: u16 = 1 << 12;
    /// VID field mask
    pub const VID_MASK: u16 = 0x0FFF;
}

/// Bits per port in the VTU data registers
pub const TAG_FIELD_BITS: u16 = 4;

/// Tag code mask within a port's field
pub const TAG_CODE_MASK: u16 = 0x3;

/// Ports per VTU data register
pub const PORTS_PER_DATA_REG: usize = 4;

// =============================================================================
// Global 2 Registers (SMI)
// =============================================================================

/// Global 2 SMI register offsets
pub mod smi_reg {
    /// SMI PHY command
    pub const COMMAND: u8 = 0x18;
    /// SMI PHY data
    pub const DATA: u8 = 0x19;
}

/// SMI command register fields
pub mod smi_command {
    /// Clause 22 frame mode
    pub const CLAUSE_22: u16 = 1 << 12;
    /// Write operation
    pub const OP_WRITE: u16 = 0x1 << 10;
    /// Read operation
    pub const OP_READ: u16 = 0x2 << 10;
    /// Device address shift
    pub const DEV_SHIFT: u16 = 5;
    /// Device address mask (after shift)
    pub const DEV_MASK: u16 = 0x1F;
    /// Register address mask
    pub const REG_MASK: u16 = 0x1F;
}

// =============================================================================
// Field Accessors
// =============================================================================

/// Operation register word that starts VTU opcode `op`
#[inline(always)]
#[must_use]
pub const fn vtu_op_word(op: u8) -> u16 {
    BUSY | ((op as u16 & vtu_operation::OP_MASK) << vtu_operation::OP_SHIFT)
}

/// Opcode field of an operation register word
#[inline(always)]
#[must_use]
pub const fn vtu_op_code(word: u16) -> u8 {
    ((word >> vtu_operation::OP_SHIFT) & vtu_operation::OP_MASK) as u8
}

/// VID register word for loading `vid`
#[inline(always)]
#[must_use]
pub const fn vtu_vid_word(vid: u16, valid: bool) -> u16 {
    let word = vid & vtu_vid::VID_MASK;
    if valid { word | vtu_vid::VALID } else { word }
}

/// VID field of a VID register word
#[inline(always)]
#[must_use]
pub const fn vtu_vid(word: u16) -> u16 {
    word & vtu_vid::VID_MASK
}

/// Returns `true` if a VID register word is the end-of-table sentinel
#[inline(always)]
#[must_use]
pub const fn is_vtu_sentinel(word: u16) -> bool {
    vtu_vid(word) == VTU_SENTINEL
}

/// Data register and bit shift holding `port`'s tag code
#[inline(always)]
#[must_use]
pub const fn tag_location(port: usize) -> (u8, u16) {
    let reg = if port < PORTS_PER_DATA_REG {
        vtu_reg::DATA_0_3
    } else {
        vtu_reg::DATA_4_6
    };
    let shift = (port % PORTS_PER_DATA_REG) as u16 * TAG_FIELD_BITS;
    (reg, shift)
}

/// Two-bit tag code of `port` from the two VTU data words
#[inline]
#[must_use]
pub const fn tag_bits(data_0_3: u16, data_4_6: u16, port: usize) -> u16 {
    let (reg, shift) = tag_location(port);
    let word = if reg == vtu_reg::DATA_0_3 { data_0_3 } else { data_4_6 };
    (word >> shift) & TAG_CODE_MASK
}

/// Pack per-port two-bit tag codes into the two VTU data words
#[must_use]
pub fn pack_tag_bits(codes: &[u16; SWITCH_PORTS]) -> (u16, u16) {
    let mut data = [0u16; 2];
    for (port, &code) in codes.iter().enumerate() {
        let (reg, shift) = tag_location(port);
        let slot = usize::from(reg != vtu_reg::DATA_0_3);
        data[slot] |= (code & TAG_CODE_MASK) << shift;
    }
    (data[0], data[1])
}

/// Default VLAN register word
#[inline(always)]
#[must_use]
pub const fn default_vlan_word(vid: u16, force: bool) -> u16 {
    let word = vid & default_vlan::VID_MASK;
    if force { word | default_vlan::FORCE } else { word }
}

/// Returns `true` if the force-default-VID bit is set
#[inline(always)]
#[must_use]
pub const fn default_vlan_forced(word: u16) -> bool {
    word & default_vlan::FORCE != 0
}

/// Returns `true` if the port status word reports link up
#[inline(always)]
#[must_use]
pub const fn status_link_up(word: u16) -> bool {
    word & port_status::LINK != 0
}

/// Speed/duplex code of a port status word
#[inline(always)]
#[must_use]
pub const fn status_mode(word: u16) -> u8 {
    ((word >> port_status::MODE_SHIFT) & port_status::MODE_MASK) as u8
}

/// SMI command word for a Clause 22 access to `dev`/`reg`
///
/// `op` is [`smi_command::OP_READ`] or [`smi_command::OP_WRITE`].
#[inline(always)]
#[must_use]
pub const fn smi_command_word(op: u16, dev: u8, reg: u8) -> u16 {
    BUSY
        | smi_command::CLAUSE_22
        | op
        | ((dev as u16 & smi_command::DEV_MASK) << smi_command::DEV_SHIFT)
        | (reg as u16 & smi_command::REG_MASK)
}

/// Forwarding mask of every port except `port`
#[inline(always)]
#[must_use]
pub const fn all_ports_except(port: u8) -> u16 {
    crate::constants::ALL_PORTS_MASK & !(1 << port)
}

// =============================================================================
// Unit Tests
// =============================================================================
