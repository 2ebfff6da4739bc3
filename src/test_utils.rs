//! Testing utilities and mock implementations
//!
//! Host-side stand-ins for the hardware: a register-map MDIO bus, a GPIO
//! block with a Clause 22 slave listening on the lines, and a switch
//! model that executes VTU and SMI commands.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::vec::Vec;

use crate::constants::VTU_SENTINEL;
use crate::error::{IoError, IoResult, Result};
use crate::hal::gpio::{BusLine, Direction, GpioLayout, Level, RegisterWindow};
use crate::hal::mdio::MdioBus;
use crate::switch::registers::{
    self, BUSY, GLOBAL1, GLOBAL2, smi_command, smi_reg, vtu_operation, vtu_reg, vtu_vid,
};

// =============================================================================
// Mock MDIO Bus
// =============================================================================

/// Mock MDIO bus backed by a plain register map
///
/// Reads of unset registers return 0. Every successful write is logged.
///
/// # Example
///
/// ```ignore
/// let mdio = MockMdioBus::new();
/// mdio.set_register(0x18, 0x03, 0x0701);
///
/// let mut switch = Switch::new(mdio, SwitchConfig::default());
/// assert_eq!(identify(&mut switch).unwrap(), ChipModel::Mv88E6070);
/// ```
#[derive(Debug, Default)]
pub struct MockMdioBus {
    /// Register values: (phy_addr, reg_addr) -> value
    registers: RefCell<HashMap<(u8, u8), u16>>,
    /// Record of writes: (phy_addr, reg_addr, value)
    write_log: RefCell<Vec<(u8, u8, u16)>>,
    /// Error returned by every access once set
    failure: RefCell<Option<IoError>>,
}

impl MockMdioBus {
    /// Create a new mock MDIO bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a register value
    pub fn set_register(&self, phy_addr: u8, reg_addr: u8, value: u16) {
        self.registers
            .borrow_mut()
            .insert((phy_addr, reg_addr), value);
    }

    /// Get the current value of a register (for test verification)
    pub fn get_register(&self, phy_addr: u8, reg_addr: u8) -> Option<u16> {
        self.registers.borrow().get(&(phy_addr, reg_addr)).copied()
    }

    /// Get all writes that have been made
    pub fn get_writes(&self) -> Vec<(u8, u8, u16)> {
        self.write_log.borrow().clone()
    }

    /// Make every following access fail with `error`
    pub fn fail_with(&self, error: IoError) {
        *self.failure.borrow_mut() = Some(error);
    }

    fn check(&self) -> Result<()> {
        match *self.failure.borrow() {
            Some(error) => Err(error.into()),
            None => Ok(()),
        }
    }
}

impl MdioBus for MockMdioBus {
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16> {
        self.check()?;
        Ok(self.get_register(phy_addr, reg_addr).unwrap_or(0))
    }

    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()> {
        self.check()?;
        self.write_log
            .borrow_mut()
            .push((phy_addr, reg_addr, value));
        self.set_register(phy_addr, reg_addr, value);
        Ok(())
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting.
#[derive(Debug, Default)]
pub struct MockDelay {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
}

impl MockDelay {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }
}

impl embedded_hal::delay::DelayNs for MockDelay {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += u64::from(ns);
    }
}

// =============================================================================
// Simulated GPIO Block
// =============================================================================

/// Clause 22 slave state, advanced on every MDC rising edge
#[derive(Debug, Clone, Copy)]
enum SlaveState {
    /// Counting preamble ones
    Idle { ones: u32 },
    /// Collecting ST, OP, PHYAD and REGAD (14 bits)
    Header { bits: u16, count: u32 },
    /// Skipping the two write turnaround bits
    WriteTurnaround { phy: u8, reg: u8, left: u32 },
    /// Collecting write data
    WriteData { phy: u8, reg: u8, bits: u16, count: u32 },
    /// Read header done, next edge is the turnaround
    ReadTurnaround { value: u16 },
    /// Driving read data, `next` is the bit put on the line at the next edge
    ReadData { value: u16, next: u32 },
    /// Last data bit is on the line until the next edge
    ReadDone,
}

const HEADER_BITS: u32 = 14;

/// GPIO register block with a Clause 22 slave attached to its lines
///
/// Decodes set/clear/input words at the offsets of [`Self::LAYOUT`].
/// MDIO is pulled up when nobody drives it; MDC reads low when released.
#[derive(Debug)]
pub struct SimulatedGpio {
    directions: [Direction; 2],
    outputs: [Level; 2],
    last_writes: HashMap<usize, u32>,
    accesses: u64,
    failing: Option<(u64, u64)>,
    rising_edges: u64,
    frames: usize,
    slave: SlaveState,
    slave_drive: Option<Level>,
    slave_registers: HashMap<(u8, u8), u16>,
}

impl Default for SimulatedGpio {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedGpio {
    /// Register layout decoded by the simulator
    pub const LAYOUT: GpioLayout = GpioLayout::new();

    pub fn new() -> Self {
        Self {
            directions: [Direction::Input; 2],
            outputs: [Level::Low; 2],
            last_writes: HashMap::new(),
            accesses: 0,
            failing: None,
            rising_edges: 0,
            frames: 0,
            slave: SlaveState::Idle { ones: 0 },
            slave_drive: None,
            slave_registers: HashMap::new(),
        }
    }

    fn slot(line: BusLine) -> usize {
        match line {
            BusLine::Mdio => 0,
            BusLine::Mdc => 1,
        }
    }

    /// Current direction of `line`
    pub fn direction(&self, line: BusLine) -> Direction {
        self.directions[Self::slot(line)]
    }

    /// Level last written to the output latch of `line`
    pub fn output_level(&self, line: BusLine) -> Level {
        self.outputs[Self::slot(line)]
    }

    /// Last value written at `offset`
    pub fn last_write(&self, offset: usize) -> Option<u32> {
        self.last_writes.get(&offset).copied()
    }

    /// Register accesses so far, failed ones included
    pub fn accesses(&self) -> u64 {
        self.accesses
    }

    /// Fail every access from index `n` on
    pub fn fail_after(&mut self, n: u64) {
        self.failing = Some((n, u64::MAX));
    }

    /// Fail `count` accesses starting at index `start`
    pub fn fail_window(&mut self, start: u64, count: u64) {
        self.failing = Some((start, start.saturating_add(count)));
    }

    /// MDC low-to-high transitions seen so far
    pub fn mdc_rising_edges(&self) -> u64 {
        self.rising_edges
    }

    /// Complete frames decoded by the slave
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Slave register contents
    pub fn slave_register(&self, phy: u8, reg: u8) -> Option<u16> {
        self.slave_registers.get(&(phy, reg)).copied()
    }

    pub fn set_slave_register(&mut self, phy: u8, reg: u8, value: u16) {
        self.slave_registers.insert((phy, reg), value);
    }

    fn line_level(&self, line: BusLine) -> Level {
        let slot = Self::slot(line);
        match (self.directions[slot], line) {
            (Direction::Output, _) => self.outputs[slot],
            (Direction::Input, BusLine::Mdio) => self.slave_drive.unwrap_or(Level::High),
            (Direction::Input, BusLine::Mdc) => Level::Low,
        }
    }

    fn start_access(&mut self) -> IoResult<()> {
        let index = self.accesses;
        self.accesses += 1;
        match self.failing {
            Some((start, end)) if (start..end).contains(&index) => Err(IoError::LineFault),
            _ => Ok(()),
        }
    }

    fn apply(&mut self, offset: usize, value: u32) {
        let layout = Self::LAYOUT;
        for line in [BusLine::Mdio, BusLine::Mdc] {
            if value & layout.mask(line) == 0 {
                continue;
            }
            let slot = Self::slot(line);
            if offset == layout.dir_set {
                self.directions[slot] = Direction::Output;
            } else if offset == layout.dir_clear {
                self.directions[slot] = Direction::Input;
            } else if offset == layout.out_set {
                self.outputs[slot] = Level::High;
            } else if offset == layout.out_clear {
                self.outputs[slot] = Level::Low;
            }
        }
    }

    fn clock_slave(&mut self) {
        let bit = u16::from(self.line_level(BusLine::Mdio).is_high());

        self.slave = match self.slave {
            SlaveState::Idle { ones } => Self::idle(ones, bit),
            SlaveState::Header { bits, count } => {
                let bits = (bits << 1) | bit;
                let count = count + 1;
                if count < HEADER_BITS {
                    SlaveState::Header { bits, count }
                } else {
                    self.decode_header(bits)
                }
            }
            SlaveState::WriteTurnaround { phy, reg, left } => {
                if left > 1 {
                    SlaveState::WriteTurnaround { phy, reg, left: left - 1 }
                } else {
                    SlaveState::WriteData { phy, reg, bits: 0, count: 0 }
                }
            }
            SlaveState::WriteData { phy, reg, bits, count } => {
                let bits = (bits << 1) | bit;
                if count + 1 < 16 {
                    SlaveState::WriteData { phy, reg, bits, count: count + 1 }
                } else {
                    self.slave_registers.insert((phy, reg), bits);
                    self.frames += 1;
                    SlaveState::Idle { ones: 0 }
                }
            }
            SlaveState::ReadTurnaround { value } => {
                self.slave_drive = Some(Level::Low);
                SlaveState::ReadData { value, next: 15 }
            }
            SlaveState::ReadData { value, next } => {
                self.slave_drive = Some(Level::from((value >> next) & 1 != 0));
                if next == 0 {
                    self.frames += 1;
                    SlaveState::ReadDone
                } else {
                    SlaveState::ReadData { value, next: next - 1 }
                }
            }
            SlaveState::ReadDone => {
                self.slave_drive = None;
                Self::idle(0, bit)
            }
        };
    }

    fn idle(ones: u32, bit: u16) -> SlaveState {
        match bit {
            1 => SlaveState::Idle { ones: ones + 1 },
            _ if ones >= 32 => SlaveState::Header { bits: 0, count: 1 },
            _ => SlaveState::Idle { ones: 0 },
        }
    }

    fn decode_header(&self, bits: u16) -> SlaveState {
        let start = (bits >> 12) & 0b11;
        let op = (bits >> 10) & 0b11;
        let phy = ((bits >> 5) & 0x1F) as u8;
        let reg = (bits & 0x1F) as u8;

        match (start, op) {
            (0b01, 0b01) => SlaveState::WriteTurnaround { phy, reg, left: 2 },
            (0b01, 0b10) => SlaveState::ReadTurnaround {
                value: self.slave_register(phy, reg).unwrap_or(0),
            },
            _ => SlaveState::Idle { ones: 0 },
        }
    }
}

impl RegisterWindow for SimulatedGpio {
    fn read(&mut self, offset: usize) -> IoResult<u32> {
        self.start_access()?;
        if offset != Self::LAYOUT.input {
            return Ok(self.last_write(offset).unwrap_or(0));
        }

        let mut word = 0;
        for line in [BusLine::Mdio, BusLine::Mdc] {
            if self.line_level(line).is_high() {
                word |= Self::LAYOUT.mask(line);
            }
        }
        Ok(word)
    }

    fn write(&mut self, offset: usize, value: u32) -> IoResult<()> {
        self.start_access()?;
        self.last_writes.insert(offset, value);

        let mdc_before = self.line_level(BusLine::Mdc);
        self.apply(offset, value);
        if !mdc_before.is_high() && self.line_level(BusLine::Mdc).is_high() {
            self.rising_edges += 1;
            self.clock_slave();
        }
        Ok(())
    }
}

// =============================================================================
// Simulated Switch
// =============================================================================

/// Pending VTU violation returned by the next GET_CLEAR_VIOLATION
#[derive(Debug, Clone, Copy)]
struct Violation {
    flags: u16,
    vid: u16,
}

/// 88E60xx register model
///
/// Behaves like [`MockMdioBus`] for plain registers and additionally
/// executes the commands written with the busy bit to the VTU operation
/// register (Global 1, 0x05) and the SMI command register (Global 2,
/// 0x18). Commands complete immediately unless busy is stuck.
#[derive(Debug, Default)]
pub struct SimulatedSwitch {
    registers: HashMap<(u8, u8), u16>,
    write_log: Vec<(u8, u8, u16)>,
    reads: HashMap<(u8, u8), usize>,
    phy_registers: HashMap<(u8, u8), u16>,
    vtu: BTreeMap<u16, (u16, u16)>,
    vtu_ops: Vec<u8>,
    busy_reads: usize,
    stuck_busy: bool,
    replay_first_entry: bool,
    writes_allowed: Option<usize>,
    violation: Option<Violation>,
}

impl SimulatedSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_register(&mut self, addr: u8, reg: u8, value: u16) {
        self.registers.insert((addr, reg), value);
    }

    /// Register value, 0 if never set
    pub fn register(&self, addr: u8, reg: u8) -> u16 {
        self.registers.get(&(addr, reg)).copied().unwrap_or(0)
    }

    pub fn get_writes(&self) -> Vec<(u8, u8, u16)> {
        self.write_log.clone()
    }

    /// (register, value) of every write to bus address `addr`
    pub fn writes_to(&self, addr: u8) -> Vec<(u8, u16)> {
        self.write_log
            .iter()
            .filter(|w| w.0 == addr)
            .map(|w| (w.1, w.2))
            .collect()
    }

    /// Writes to the seven port addresses
    pub fn port_writes(&self) -> Vec<(u8, u8, u16)> {
        self.write_log
            .iter()
            .copied()
            .filter(|w| registers::port_index(w.0).is_some())
            .collect()
    }

    pub fn reads_of(&self, addr: u8, reg: u8) -> usize {
        self.reads.get(&(addr, reg)).copied().unwrap_or(0)
    }

    /// Next `n` reads of a command register report busy
    pub fn set_busy_reads(&mut self, n: usize) {
        self.busy_reads = n;
    }

    /// Commands never complete; command words are stored as written
    pub fn set_stuck_busy(&mut self, stuck: bool) {
        self.stuck_busy = stuck;
    }

    /// The first `n` writes succeed, later ones fail
    pub fn fail_writes_after(&mut self, n: usize) {
        self.writes_allowed = Some(n);
    }

    pub fn phy_register(&self, dev: u8, reg: u8) -> Option<u16> {
        self.phy_registers.get(&(dev, reg)).copied()
    }

    pub fn set_phy_register(&mut self, dev: u8, reg: u8, value: u16) {
        self.phy_registers.insert((dev, reg), value);
    }

    /// Put an entry straight into the VTU
    pub fn insert_vtu(&mut self, vid: u16, data_0_3: u16, data_4_6: u16) {
        self.vtu.insert(vid, (data_0_3, data_4_6));
    }

    pub fn vtu_entry(&self, vid: u16) -> Option<(u16, u16)> {
        self.vtu.get(&vid).copied()
    }

    pub fn vtu_len(&self) -> usize {
        self.vtu.len()
    }

    /// Number of VTU commands issued with opcode `op`
    pub fn vtu_ops_issued(&self, op: u8) -> usize {
        self.vtu_ops.iter().filter(|&&o| o == op).count()
    }

    /// GET_NEXT always answers with the lowest entry
    pub fn set_replay_first_entry(&mut self, replay: bool) {
        self.replay_first_entry = replay;
    }

    /// Latch a violation for the next GET_CLEAR_VIOLATION
    pub fn inject_violation(&mut self, member: bool, miss: bool, spid: u8, vid: u16) {
        let mut flags = u16::from(spid) & vtu_operation::SPID_MASK;
        if member {
            flags |= vtu_operation::MEMBER_VIOLATION;
        }
        if miss {
            flags |= vtu_operation::MISS_VIOLATION;
        }
        self.violation = Some(Violation { flags, vid });
    }

    fn is_command_reg(addr: u8, reg: u8) -> bool {
        (addr, reg) == (GLOBAL1, vtu_reg::OPERATION) || (addr, reg) == (GLOBAL2, smi_reg::COMMAND)
    }

    fn run_vtu(&mut self, word: u16) {
        let op = registers::vtu_op_code(word);
        self.vtu_ops.push(op);
        let mut result = word & !BUSY;

        match op {
            1 => self.vtu.clear(),
            3 => {
                let vid_word = self.register(GLOBAL1, vtu_reg::VID);
                let vid = vtu_vid(vid_word);
                if vid_word & registers::vtu_vid::VALID != 0 {
                    let data = (
                        self.register(GLOBAL1, vtu_reg::DATA_0_3),
                        self.register(GLOBAL1, vtu_reg::DATA_4_6),
                    );
                    self.vtu.insert(vid, data);
                } else {
                    self.vtu.remove(&vid);
                }
            }
            4 => {
                let from = vtu_vid(self.register(GLOBAL1, vtu_reg::VID));
                let next = if self.replay_first_entry || from == VTU_SENTINEL {
                    self.vtu.iter().next()
                } else {
                    self.vtu.range(from + 1..).next()
                };
                match next.map(|(&vid, &data)| (vid, data)) {
                    Some((vid, (d0, d1))) => {
                        self.set_register(GLOBAL1, vtu_reg::VID, vid | registers::vtu_vid::VALID);
                        self.set_register(GLOBAL1, vtu_reg::DATA_0_3, d0);
                        self.set_register(GLOBAL1, vtu_reg::DATA_4_6, d1);
                    }
                    None => {
                        self.set_register(GLOBAL1, vtu_reg::VID, VTU_SENTINEL);
                    }
                }
            }
            7 => {
                if let Some(v) = self.violation.take() {
                    result |= v.flags;
                    self.set_register(GLOBAL1, vtu_reg::VID, v.vid);
                }
            }
            _ => {}
        }
        self.set_register(GLOBAL1, vtu_reg::OPERATION, result);
    }

    fn run_smi(&mut self, word: u16) {
        let dev = ((word >> smi_command::DEV_SHIFT) & smi_command::DEV_MASK) as u8;
        let reg = (word & smi_command::REG_MASK) as u8;

        if word & smi_command::OP_READ == smi_command::OP_READ {
            let value = self.phy_register(dev, reg).unwrap_or(0);
            self.set_register(GLOBAL2, smi_reg::DATA, value);
        } else if word & smi_command::OP_WRITE != 0 {
            let value = self.register(GLOBAL2, smi_reg::DATA);
            self.phy_registers.insert((dev, reg), value);
        }
        self.set_register(GLOBAL2, smi_reg::COMMAND, word & !BUSY);
    }
}

impl MdioBus for SimulatedSwitch {
    fn read(&mut self, phy_addr: u8, reg_addr: u8) -> Result<u16> {
        *self.reads.entry((phy_addr, reg_addr)).or_insert(0) += 1;

        let value = self.register(phy_addr, reg_addr);
        if Self::is_command_reg(phy_addr, reg_addr) && self.busy_reads > 0 {
            self.busy_reads -= 1;
            return Ok(value | BUSY);
        }
        Ok(value)
    }

    fn write(&mut self, phy_addr: u8, reg_addr: u8, value: u16) -> Result<()> {
        if let Some(left) = self.writes_allowed.as_mut() {
            if *left == 0 {
                return Err(IoError::BusTimeout.into());
            }
            *left -= 1;
        }
        self.write_log.push((phy_addr, reg_addr, value));

        let is_command = Self::is_command_reg(phy_addr, reg_addr);
        if !is_command || !registers::is_busy(value) || self.stuck_busy {
            self.set_register(phy_addr, reg_addr, value);
        } else if phy_addr == GLOBAL1 {
            self.run_vtu(value);
        } else {
            self.run_smi(value);
        }
        Ok(())
    }
}

// =============================================================================
// Test Assertions
// =============================================================================

/// Assert that a register was written with a specific value
#[macro_export]
macro_rules! assert_reg_written {
    ($mdio:expr, $addr:expr, $reg:expr, $value:expr) => {
        let writes = $mdio.get_writes();
        assert!(
            writes
                .iter()
                .any(|w| w.0 == $addr && w.1 == $reg && w.2 == $value),
            "Expected write to {:#04x} reg {:#04x} with value 0x{:04X}, but got: {:?}",
            $addr,
            $reg,
            $value,
            writes
        );
    };
}
