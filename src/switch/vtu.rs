//! VLAN Table Unit
//!
//! The VTU is driven through four Global 1 registers: an operation
//! register with a busy bit, a VID register, and two data registers that
//! hold a two-bit tag code per port. An operation is started by writing
//! the opcode with the busy bit set and finishes when the chip clears it.
//!
//! Walking the table uses GET_NEXT: starting from VID 0xFFF the chip
//! returns entries in ascending VID order and reports 0xFFF again once the
//! table is exhausted.
//!
//! # Forwarding Masks
//!
//! [`Switch::vtu_add_entry`] loads an entry and then rebuilds the
//! port-based VLAN map of each member port from the whole table: a port
//! may forward to every port it shares at least one VLAN with.

use crate::constants::{MAX_VLAN_ID, MAX_VTU_ENTRIES, MIN_VLAN_ID, SWITCH_PORTS, VTU_SENTINEL};
use crate::error::{ConfigError, ConfigResult, Result, SwitchError};
use crate::hal::mdio::MdioBus;
use crate::switch::device::Switch;
use crate::switch::registers::{self, GLOBAL1, port_reg, vtu_operation, vtu_reg};

// =============================================================================
// Entry Types
// =============================================================================

/// Egress tagging of a port in a VLAN
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TagCode {
    /// Frames leave as they arrived
    Unmodified = 0,
    /// Tag stripped on egress
    Untagged = 1,
    /// Tag added on egress
    Tagged = 2,
    /// Port is not in the VLAN
    #[default]
    NotMember = 3,
}

impl TagCode {
    /// Decode a two-bit field
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        match bits & registers::TAG_CODE_MASK {
            0 => TagCode::Unmodified,
            1 => TagCode::Untagged,
            2 => TagCode::Tagged,
            _ => TagCode::NotMember,
        }
    }

    /// Two-bit field value
    #[inline(always)]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self as u16
    }

    /// Returns `true` unless the code is [`TagCode::NotMember`]
    #[inline(always)]
    #[must_use]
    pub const fn is_member(self) -> bool {
        !matches!(self, TagCode::NotMember)
    }

    /// Egress name as printed in reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TagCode::Unmodified => "unmodified",
            TagCode::Untagged => "untagged",
            TagCode::Tagged => "tagged",
            TagCode::NotMember => "not member",
        }
    }
}

/// Whether a port's default VLAN may still be rewritten
///
/// A port is `Configuring` while the entry that claims it is inserted and
/// `Locked` afterwards, so later insertions leave its default VID alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortLock {
    /// Not touched by any insertion
    #[default]
    Unconfigured,
    /// Default VID is written by the current insertion
    Configuring,
    /// Default VID is owned by an earlier insertion or is fixed
    Locked,
}

/// VTU entry to insert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VtuEntry {
    vid: u16,
    tags: [TagCode; SWITCH_PORTS],
    locks: [PortLock; SWITCH_PORTS],
    force_default: u16,
}

impl VtuEntry {
    /// Empty entry for `vid` (1..=4094)
    pub fn new(vid: u16) -> ConfigResult<Self> {
        if !(MIN_VLAN_ID..=MAX_VLAN_ID).contains(&vid) {
            return Err(ConfigError::InvalidVlanId);
        }
        Ok(Self {
            vid,
            tags: [TagCode::NotMember; SWITCH_PORTS],
            locks: [PortLock::Unconfigured; SWITCH_PORTS],
            force_default: 0,
        })
    }

    /// Set `port`'s tag code and lock state
    pub fn set_port(&mut self, port: u8, tag: TagCode, lock: PortLock) -> ConfigResult<()> {
        let idx = port_slot(port)?;
        self.tags[idx] = tag;
        self.locks[idx] = lock;
        Ok(())
    }

    /// Set the force flag written with `port`'s default VID
    pub fn set_force_default(&mut self, port: u8, force: bool) -> ConfigResult<()> {
        let bit = 1 << port_slot(port)?;
        if force {
            self.force_default |= bit;
        } else {
            self.force_default &= !bit;
        }
        Ok(())
    }

    /// VLAN ID
    #[must_use]
    pub const fn vid(&self) -> u16 {
        self.vid
    }

    /// Per-port tag codes
    #[must_use]
    pub const fn tags(&self) -> &[TagCode; SWITCH_PORTS] {
        &self.tags
    }

    /// Tag code of port index `port`
    #[must_use]
    pub fn tag(&self, port: usize) -> TagCode {
        self.tags.get(port).copied().unwrap_or(TagCode::NotMember)
    }

    /// Lock state of port index `port`
    #[must_use]
    pub fn lock(&self, port: usize) -> PortLock {
        self.locks.get(port).copied().unwrap_or_default()
    }

    /// Returns `true` if `port`'s default VID is written with the force flag
    #[must_use]
    pub const fn forces_default(&self, port: usize) -> bool {
        port < SWITCH_PORTS && self.force_default & (1 << port) != 0
    }

    /// Bitmask of member ports
    #[must_use]
    pub fn member_mask(&self) -> u16 {
        mask_of(&self.tags)
    }

    /// Bitmask of member ports whose default VID this insertion writes
    #[must_use]
    pub fn configuring_mask(&self) -> u16 {
        self.tags
            .iter()
            .zip(self.locks.iter())
            .enumerate()
            .filter(|(_, (tag, lock))| tag.is_member() && **lock == PortLock::Configuring)
            .fold(0, |mask, (port, _)| mask | (1 << port))
    }

    /// Contents of the two VTU data registers
    #[must_use]
    pub fn data_words(&self) -> (u16, u16) {
        registers::pack_tag_bits(&self.tags.map(TagCode::bits))
    }
}

fn port_slot(port: u8) -> ConfigResult<usize> {
    let idx = usize::from(port);
    if idx < SWITCH_PORTS {
        Ok(idx)
    } else {
        Err(ConfigError::InvalidPort)
    }
}

fn mask_of(tags: &[TagCode; SWITCH_PORTS]) -> u16 {
    tags.iter()
        .enumerate()
        .filter(|(_, tag)| tag.is_member())
        .fold(0, |mask, (port, _)| mask | (1 << port))
}

/// Entry as read back from the VTU
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VtuRecord {
    /// VLAN ID
    pub vid: u16,
    /// Per-port tag codes
    pub tags: [TagCode; SWITCH_PORTS],
}

impl VtuRecord {
    /// Decode a record from the VID and data register words
    #[must_use]
    pub fn from_words(vid_word: u16, data_0_3: u16, data_4_6: u16) -> Self {
        let mut tags = [TagCode::NotMember; SWITCH_PORTS];
        for (port, tag) in tags.iter_mut().enumerate() {
            *tag = TagCode::from_bits(registers::tag_bits(data_0_3, data_4_6, port));
        }
        Self {
            vid: registers::vtu_vid(vid_word),
            tags,
        }
    }

    /// Bitmask of member ports
    #[must_use]
    pub fn member_mask(&self) -> u16 {
        mask_of(&self.tags)
    }

    /// Iterator over (port, tag) of member ports
    pub fn members(&self) -> impl Iterator<Item = (u8, TagCode)> + '_ {
        self.tags
            .iter()
            .enumerate()
            .filter(|(_, tag)| tag.is_member())
            .map(|(port, tag)| (port as u8, *tag))
    }
}

/// VTU operation codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum VtuOp {
    /// Remove every entry
    FlushAll = 1,
    /// Load or purge the entry in the VID register
    Load = 3,
    /// Find the next valid entry after the VID register
    GetNext = 4,
    /// Read and clear the last violation
    GetClearViolation = 7,
}

impl VtuOp {
    /// Operation register word that starts this operation
    #[inline(always)]
    #[must_use]
    pub const fn word(self) -> u16 {
        registers::vtu_op_word(self as u8)
    }
}

/// VTU violation reported by GET_CLEAR_VIOLATION
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VtuViolation {
    /// Frame arrived on a port that is not a member of its VLAN
    pub member: bool,
    /// Frame's VID is not in the table
    pub miss: bool,
    /// Ingress port of the offending frame
    pub source_port: u8,
    /// Offending VID
    pub vid: u16,
}

impl VtuViolation {
    /// Decode the operation and VID words, `None` if no flag is set
    #[must_use]
    pub const fn from_words(op_word: u16, vid_word: u16) -> Option<Self> {
        let member = op_word & vtu_operation::MEMBER_VIOLATION != 0;
        let miss = op_word & vtu_operation::MISS_VIOLATION != 0;
        if !member && !miss {
            return None;
        }
        Some(Self {
            member,
            miss,
            source_port: (op_word & vtu_operation::SPID_MASK) as u8,
            vid: registers::vtu_vid(vid_word),
        })
    }
}

// =============================================================================
// Table Walk
// =============================================================================

/// GET_NEXT walk state shared by [`VtuIter`] and entry insertion
#[derive(Debug, Default)]
struct VtuWalk {
    last: Option<u16>,
    visited: usize,
    done: bool,
}

impl VtuWalk {
    fn step<M: MdioBus>(&mut self, switch: &mut Switch<M>) -> Option<Result<VtuRecord>> {
        if self.done {
            return None;
        }

        let next = if self.visited > MAX_VTU_ENTRIES {
            Err(SwitchError::VtuInconsistent.into())
        } else {
            switch.vtu_get_next()
        };

        match next {
            Ok(None) => {
                self.done = true;
                None
            }
            Ok(Some(record)) if self.last.is_some_and(|last| record.vid <= last) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("VTU walk went backwards at VID {}", record.vid);

                self.done = true;
                Some(Err(SwitchError::VtuInconsistent.into()))
            }
            Ok(Some(record)) => {
                self.last = Some(record.vid);
                self.visited += 1;
                Some(Ok(record))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator over the VTU in ascending VID order
///
/// Created by [`Switch::vtu_iter`]. Yields an error and stops if a bus
/// access fails or the chip returns a VID that is not strictly greater
/// than the previous one.
#[derive(Debug)]
pub struct VtuIter<'a, M: MdioBus> {
    switch: &'a mut Switch<M>,
    walk: VtuWalk,
}

impl<M: MdioBus> VtuIter<'_, M> {
    /// Switch handle for non-VTU accesses between steps
    pub(crate) fn switch_mut(&mut self) -> &mut Switch<M> {
        self.switch
    }
}

impl<M: MdioBus> Iterator for VtuIter<'_, M> {
    type Item = Result<VtuRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        self.walk.step(self.switch)
    }
}

// =============================================================================
// VTU Operations
// =============================================================================

impl<M: MdioBus> Switch<M> {
    fn vtu_wait(&mut self) -> Result<u16> {
        self.wait_ready(GLOBAL1, vtu_reg::OPERATION)
    }

    /// Start `op` and wait for it to finish; returns the final operation word
    pub fn vtu_command(&mut self, op: VtuOp) -> Result<u16> {
        self.write(GLOBAL1, vtu_reg::OPERATION, op.word())?;
        self.vtu_wait()
    }

    /// Remove every VTU entry
    pub fn vtu_flush(&mut self) -> Result<()> {
        self.vtu_wait()?;
        self.vtu_command(VtuOp::FlushAll)?;

        #[cfg(feature = "defmt")]
        defmt::info!("VTU flushed");

        Ok(())
    }

    /// Load `entry` into the VTU without touching any port register
    pub fn vtu_load(&mut self, entry: &VtuEntry) -> Result<()> {
        self.vtu_wait()?;

        let (data_0_3, data_4_6) = entry.data_words();
        self.write(GLOBAL1, vtu_reg::VID, registers::vtu_vid_word(entry.vid(), true))?;
        self.write(GLOBAL1, vtu_reg::DATA_0_3, data_0_3)?;
        self.write(GLOBAL1, vtu_reg::DATA_4_6, data_4_6)?;
        self.vtu_command(VtuOp::Load)?;
        Ok(())
    }

    /// Issue one GET_NEXT from the current VID register
    ///
    /// Returns `None` once the chip reports the 0xFFF sentinel.
    pub fn vtu_get_next(&mut self) -> Result<Option<VtuRecord>> {
        self.vtu_command(VtuOp::GetNext)?;

        let vid_word = self.read(GLOBAL1, vtu_reg::VID)?;
        if registers::is_vtu_sentinel(vid_word) {
            return Ok(None);
        }
        let data_0_3 = self.read(GLOBAL1, vtu_reg::DATA_0_3)?;
        let data_4_6 = self.read(GLOBAL1, vtu_reg::DATA_4_6)?;
        Ok(Some(VtuRecord::from_words(vid_word, data_0_3, data_4_6)))
    }

    fn vtu_rewind(&mut self) -> Result<()> {
        self.vtu_wait()?;
        self.write(GLOBAL1, vtu_reg::VID, VTU_SENTINEL)
    }

    /// Walk the whole VTU from the start
    pub fn vtu_iter(&mut self) -> Result<VtuIter<'_, M>> {
        self.vtu_rewind()?;
        Ok(VtuIter {
            switch: self,
            walk: VtuWalk::default(),
        })
    }

    /// Insert `entry` and rebuild the forwarding masks of its ports
    ///
    /// 1. Load the entry.
    /// 2. Walk the whole table; every member port of every entry gains
    ///    all other members of that entry in its forwarding mask. Ports
    ///    the entry marks [`PortLock::Configuring`] get their default VID
    ///    written once.
    /// 3. Write the rebuilt mask and the configured priority to each
    ///    member port of the new entry.
    ///
    /// A failed access aborts the insertion; earlier writes stay.
    pub fn vtu_add_entry(&mut self, entry: &VtuEntry) -> Result<()> {
        self.vtu_load(entry)?;
        self.vtu_rewind()?;

        let configuring = entry.configuring_mask();
        let mut written = 0u16;
        let mut masks = [0u16; SWITCH_PORTS];
        let mut walk = VtuWalk::default();

        while let Some(record) = walk.step(self) {
            let members = record?.member_mask();
            for (port, mask) in masks.iter_mut().enumerate() {
                if members & (1 << port) != 0 {
                    *mask |= members & !(1 << port);
                }
            }

            let pending = members & configuring & !written;
            self.write_default_vids(entry, pending)?;
            written |= pending;
        }
        // Ports the walk never reported still get their default VID
        self.write_default_vids(entry, configuring & !written)?;

        let priority = self.config().port_priority;
        for (port, mask) in masks.iter().enumerate() {
            if !entry.tag(port).is_member() {
                continue;
            }
            self.write_port(port as u8, port_reg::VLAN_MAP, *mask)?;
            self.write_port(port as u8, port_reg::CONTROL2, priority)?;
        }

        #[cfg(feature = "defmt")]
        defmt::debug!("VTU entry {} added, members {=u16:#x}", entry.vid(), entry.member_mask());

        Ok(())
    }

    fn write_default_vids(&mut self, entry: &VtuEntry, ports: u16) -> Result<()> {
        for port in 0..SWITCH_PORTS {
            if ports & (1 << port) == 0 {
                continue;
            }
            let word = registers::default_vlan_word(entry.vid(), entry.forces_default(port));
            self.write_port(port as u8, port_reg::DEFAULT_VLAN, word)?;
        }
        Ok(())
    }

    /// Read and clear the last VTU violation
    pub fn vtu_clear_violation(&mut self) -> Result<Option<VtuViolation>> {
        self.vtu_wait()?;
        let op_word = self.vtu_command(VtuOp::GetClearViolation)?;
        let vid_word = self.read(GLOBAL1, vtu_reg::VID)?;
        Ok(VtuViolation::from_words(op_word, vid_word))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
