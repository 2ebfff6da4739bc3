//! Marvell 88E60xx switch driver
//!
//! Everything above the MDIO frame: register addressing, chip
//! identification, the VLAN Table Unit, per-chip layouts and the status
//! report.
//!
//! # Modules
//!
//! - [`registers`]: bus addresses, register offsets and bit fields
//! - [`device`]: [`Switch`] handle, busy polling, SMI indirection, ports
//! - [`chip`]: identification and model lookup
//! - [`vtu`]: VTU entries, table walk and insertion
//! - [`profile`]: per-chip topology and VLAN layouts
//! - [`info`]: `key=value` status report

pub mod chip;
pub mod device;
pub mod info;
pub mod profile;
pub mod registers;
pub mod vtu;

pub use chip::{ChipModel, identify};
pub use device::{Duplex, LinkMode, PhyMode, PortStatus, Speed, Switch, SwitchConfig};
pub use profile::{Layout, SwitchProfile, apply_layout, apply_mode, force_port_mode};
pub use vtu::{PortLock, TagCode, VtuEntry, VtuIter, VtuRecord, VtuViolation};
