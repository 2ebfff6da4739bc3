//! Bus framing and switch driver constants
//!
//! Frame sizes follow IEEE 802.3 Clause 22. Switch values are those used
//! by the Marvell 88E60xx family.

// =============================================================================
// MDIO Frame (IEEE 802.3 Clause 22)
// =============================================================================

/// Number of preamble bits (all ones) clocked before every frame
pub const PREAMBLE_BITS: u32 = 32;

/// Start-of-frame pattern `01`
pub const START_OF_FRAME: u16 = 0b01;

/// Width of the start, opcode and write turnaround fields
pub const FIELD_2_BITS: u32 = 2;

/// Width of the PHY and register address fields
pub const ADDR_BITS: u32 = 5;

/// Width of the data field
pub const DATA_BITS: u32 = 16;

/// Write turnaround pattern `10`
pub const WRITE_TURNAROUND: u16 = 0b10;

/// MDC clocks spent on the read turnaround
pub const READ_TURNAROUND_CLOCKS: u32 = 1;

/// MDC rising edges in a write frame
pub const WRITE_FRAME_EDGES: u32 =
    PREAMBLE_BITS + 2 * FIELD_2_BITS + 2 * ADDR_BITS + FIELD_2_BITS + DATA_BITS;

/// MDC rising edges in a read frame
pub const READ_FRAME_EDGES: u32 =
    PREAMBLE_BITS + 2 * FIELD_2_BITS + 2 * ADDR_BITS + READ_TURNAROUND_CLOCKS + DATA_BITS;

/// Maximum PHY address (5 bits)
pub const MAX_PHY_ADDR: u8 = 31;

/// Maximum register address (5 bits)
pub const MAX_REG_ADDR: u8 = 31;

/// Default MDC half-period in nanoseconds (unpaced)
pub const DEFAULT_MDC_HALF_PERIOD_NS: u32 = 0;

// =============================================================================
// Switch
// =============================================================================

/// Number of ports addressable on the switch (0x18..=0x1E)
pub const SWITCH_PORTS: usize = 7;

/// Bitmask covering every switch port
pub const ALL_PORTS_MASK: u16 = (1 << SWITCH_PORTS) - 1;

/// Default number of reads spent waiting for a busy bit to clear
pub const DEFAULT_POLL_SPINS: u32 = 10_000;

/// Port priority/QoS value written after a VTU insertion
pub const DEFAULT_PORT_PRIORITY: u16 = 0x0480;

/// Lowest usable VLAN ID
pub const MIN_VLAN_ID: u16 = 1;

/// Highest usable VLAN ID
pub const MAX_VLAN_ID: u16 = 4094;

/// VID value that starts a VTU walk and marks its end
pub const VTU_SENTINEL: u16 = 0x0FFF;

/// Upper bound on VTU entries visited by a single walk
pub const MAX_VTU_ENTRIES: usize = MAX_VLAN_ID as usize;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_edge_counts() {
        assert_eq!(WRITE_FRAME_EDGES, 64);
        assert_eq!(READ_FRAME_EDGES, 63);
    }

    #[test]
    fn all_ports_mask_covers_seven_ports() {
        assert_eq!(ALL_PORTS_MASK, 0x7F);
    }
}
