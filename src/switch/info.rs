//! Switch status report
//!
//! Read-only helpers that render the switch state as `key=value` lines,
//! one per line, for shell consumption:
//!
//! ```text
//! switch_model=88E6020
//! switch_ports="a b"
//! switchporta_link=1
//! switchporta_speed=100FD
//! vtu1_vid=1
//! vtu1_port0=1
//! vtu1_port0_forcevid=N
//! vtu1_port0_egress=untagged
//! vtu1_port0_alias=a
//! vtu_total=1
//! ```
//!
//! Every type here implements [`Display`](core::fmt::Display) and ends
//! each line with `\n`.

use core::fmt;

use crate::constants::SWITCH_PORTS;
use crate::error::Result;
use crate::hal::mdio::MdioBus;
use crate::switch::chip::ChipModel;
use crate::switch::device::{PortStatus, Switch};
use crate::switch::profile::SwitchProfile;
use crate::switch::vtu::{VtuIter, VtuRecord};

/// `switch_model=` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelLine(pub ChipModel);

impl fmt::Display for ModelLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "switch_model={}", self.0.name())
    }
}

/// `switch_ports=` line listing the external port labels
#[derive(Debug, Clone, Copy)]
pub struct PortList<'a>(pub &'a SwitchProfile);

impl fmt::Display for PortList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("switch_ports=\"")?;
        for n in 0..self.0.external_ports.len() {
            if n != 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", SwitchProfile::external_label(n))?;
        }
        f.write_str("\"\n")
    }
}

/// Link and speed lines of one external port
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortReport {
    /// External port label
    pub label: char,
    /// Port status
    pub status: PortStatus,
}

impl fmt::Display for PortReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "switchport{}_link={}", self.label, u8::from(self.status.link_up))?;
        write!(f, "switchport{}_speed=", self.label)?;
        if let Some(mode) = self.status.mode {
            write!(f, "{mode}")?;
        }
        f.write_str("\n")
    }
}

/// Lines describing one VTU entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VtuReport {
    /// 1-based position in the walk
    pub index: usize,
    /// Entry read from the VTU
    pub record: VtuRecord,
    /// Force-default-VID bit of each port's default VLAN register
    pub forced: [bool; SWITCH_PORTS],
    /// Port aliases
    pub aliases: [&'static str; SWITCH_PORTS],
}

impl fmt::Display for VtuReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = self.index;
        writeln!(f, "vtu{n}_vid={}", self.record.vid)?;
        for (port, tag) in self.record.members() {
            let p = usize::from(port);
            writeln!(f, "vtu{n}_port{p}=1")?;
            writeln!(
                f,
                "vtu{n}_port{p}_forcevid={}",
                if self.forced[p] { 'Y' } else { 'N' }
            )?;
            writeln!(f, "vtu{n}_port{p}_egress={}", tag.as_str())?;
            writeln!(f, "vtu{n}_port{p}_alias={}", self.aliases[p])?;
        }
        Ok(())
    }
}

/// `vtu_total=` line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VtuTotal(pub usize);

impl fmt::Display for VtuTotal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "vtu_total={}", self.0)
    }
}

/// Read the status of every external port of `profile`
pub fn port_reports<'a, M: MdioBus>(
    switch: &'a mut Switch<M>,
    profile: &'a SwitchProfile,
) -> impl Iterator<Item = Result<PortReport>> + 'a {
    profile
        .external_ports
        .iter()
        .enumerate()
        .map(move |(n, &port)| {
            Ok(PortReport {
                label: SwitchProfile::external_label(n),
                status: switch.port_status(port)?,
            })
        })
}

/// Walk the VTU and attach per-port force flags and aliases
pub fn vtu_reports<'a, M: MdioBus>(
    switch: &'a mut Switch<M>,
    profile: &'a SwitchProfile,
) -> Result<VtuReports<'a, M>> {
    Ok(VtuReports {
        iter: switch.vtu_iter()?,
        aliases: profile.port_aliases,
        count: 0,
    })
}

/// Iterator returned by [`vtu_reports`]
///
/// After it is exhausted, [`total`](Self::total) gives the `vtu_total`.
#[derive(Debug)]
pub struct VtuReports<'a, M: MdioBus> {
    iter: VtuIter<'a, M>,
    aliases: [&'static str; SWITCH_PORTS],
    count: usize,
}

impl<M: MdioBus> VtuReports<'_, M> {
    /// Entries yielded so far
    #[must_use]
    pub const fn total(&self) -> usize {
        self.count
    }

    fn read_forced(&mut self) -> Result<[bool; SWITCH_PORTS]> {
        let switch = self.iter.switch_mut();
        let mut forced = [false; SWITCH_PORTS];
        for (port, flag) in forced.iter_mut().enumerate() {
            *flag = switch.port_default_vlan(port as u8)?.1;
        }
        Ok(forced)
    }
}

impl<M: MdioBus> Iterator for VtuReports<'_, M> {
    type Item = Result<VtuReport>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = match self.iter.next()? {
            Ok(record) => record,
            Err(e) => return Some(Err(e)),
        };
        self.count += 1;

        Some(self.read_forced().map(|forced| VtuReport {
            index: self.count,
            record,
            forced,
            aliases: self.aliases,
        }))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;
    use std::string::String;
    use std::vec::Vec;

    use super::*;
    use crate::switch::device::SwitchConfig;
    use crate::switch::profile::{self, Layout, MV88E6020, MV88E6070};
    use crate::test_utils::SimulatedSwitch;

    #[test]
    fn model_line() {
        assert_eq!(format!("{}", ModelLine(ChipModel::Mv88E6070)), "switch_model=88E6070\n");
        assert_eq!(format!("{}", ModelLine(ChipModel::Unknown(0x1230))), "switch_model=unknown\n");
    }

    #[test]
    fn port_list() {
        assert_eq!(format!("{}", PortList(&MV88E6020)), "switch_ports=\"a b\"\n");
        assert_eq!(format!("{}", PortList(&MV88E6070)), "switch_ports=\"a b c d\"\n");
    }

    #[test]
    fn port_report_lines() {
        let report = PortReport {
            label: 'b',
            status: PortStatus::from_word(0x1900),
        };
        assert_eq!(format!("{report}"), "switchportb_link=1\nswitchportb_speed=100HD\n");

        let report = PortReport {
            label: 'a',
            status: PortStatus::from_word(0x0000),
        };
        assert_eq!(format!("{report}"), "switchporta_link=0\nswitchporta_speed=\n");
    }

    #[test]
    fn port_reports_use_external_ports() {
        let mut sw = Switch::new(SimulatedSwitch::new(), SwitchConfig::default());
        sw.mdio_mut().set_register(0x19, 0x00, 0x1B00);
        sw.mdio_mut().set_register(0x1C, 0x00, 0x0800);

        let lines: String = port_reports(&mut sw, &MV88E6070)
            .map(|r| format!("{}", r.unwrap()))
            .collect();
        assert!(lines.starts_with("switchporta_link=1\nswitchporta_speed=100FD\n"));
        assert!(lines.ends_with("switchportd_link=0\nswitchportd_speed=10HD\n"));
    }

    #[test]
    fn vtu_report_after_two_port_layout() {
        let mut sw = Switch::new(SimulatedSwitch::new(), SwitchConfig::default());
        profile::apply_mode(&mut sw, &MV88E6020, Layout::Vlan).unwrap();

        let mut reports = vtu_reports(&mut sw, &MV88E6020).unwrap();
        let text: Vec<String> = reports.by_ref().map(|r| format!("{}", r.unwrap())).collect();
        assert_eq!(reports.total(), 2);

        assert_eq!(
            text[0],
            "vtu1_vid=1\n\
             vtu1_port0=1\n\
             vtu1_port0_forcevid=N\n\
             vtu1_port0_egress=untagged\n\
             vtu1_port0_alias=a\n\
             vtu1_port5=1\n\
             vtu1_port5_forcevid=N\n\
             vtu1_port5_egress=tagged\n\
             vtu1_port5_alias=cpu\n"
        );
        assert!(text[1].starts_with("vtu2_vid=2\nvtu2_port1=1\n"));
        assert_eq!(format!("{}", VtuTotal(reports.total())), "vtu_total=2\n");
    }

    #[test]
    fn vtu_report_shows_force_flag() {
        let mut sw = Switch::new(SimulatedSwitch::new(), SwitchConfig::default());
        sw.mdio_mut().insert_vtu(3, 0x3312, 0x0333);
        sw.mdio_mut().set_register(0x19, 0x07, 0x1003);

        let report = vtu_reports(&mut sw, &MV88E6070).unwrap().next().unwrap().unwrap();
        assert!(report.forced[1]);
        assert!(!report.forced[0]);

        let text = format!("{report}");
        assert!(text.contains("vtu1_port0_egress=tagged\n"));
        assert!(text.contains("vtu1_port1_forcevid=Y\n"));
        assert!(text.contains("vtu1_port1_alias=a\n"));
    }
}
