//! ISR-Safe Shared Switch
//!
//! The bit-banged bus has exactly one owner: the GPIO lines must not be
//! toggled from two places at once. [`SharedSwitch`] holds the switch
//! handle (and with it the bus) in a `static` and hands out exclusive
//! access inside `critical_section::with()`.
//!
//! # Example
//!
//! ```ignore
//! use mv88e60xx_switchctl::sync::SharedSwitch;
//!
//! static SWITCH: SharedSwitch<MyMdio> = SharedSwitch::new();
//!
//! fn init(mdio: MyMdio) {
//!     SWITCH.install(Switch::new(mdio, SwitchConfig::default()));
//! }
//!
//! fn link_of_port_a() -> Option<bool> {
//!     SWITCH
//!         .with(|sw| sw.port_status(1).map(|s| s.link_up).ok())
//!         .flatten()
//! }
//! ```
//!
//! # Implementation Note
//!
//! The critical section implementation is provided by the platform crate.
//! Interrupts stay disabled for the whole closure, and a full VTU walk
//! clocks thousands of MDIO bits, so keep long operations out of
//! interrupt-sensitive paths.

use core::cell::RefCell;

use critical_section::Mutex;

use crate::hal::mdio::MdioBus;
use crate::switch::device::Switch;

/// Switch handle shared through a critical section
///
/// Starts empty; [`install`](Self::install) puts a handle in.
pub struct SharedSwitch<M: MdioBus> {
    inner: Mutex<RefCell<Option<Switch<M>>>>,
}

impl<M: MdioBus> SharedSwitch<M> {
    /// Create an empty slot (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(None)),
        }
    }

    /// Store `switch`, returning the handle it replaces
    pub fn install(&self, switch: Switch<M>) -> Option<Switch<M>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).replace(switch))
    }

    /// Remove and return the handle
    pub fn take(&self) -> Option<Switch<M>> {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).take())
    }

    /// Returns `true` if a handle is installed
    pub fn is_installed(&self) -> bool {
        critical_section::with(|cs| self.inner.borrow_ref(cs).is_some())
    }

    /// Run `f` with exclusive access to the switch
    ///
    /// Returns `None` if no handle is installed.
    ///
    /// # Panics
    ///
    /// Panics if called re-entrantly from inside another `with`.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Switch<M>) -> R,
    {
        critical_section::with(|cs| self.inner.borrow_ref_mut(cs).as_mut().map(f))
    }

    /// Like [`with`](Self::with), but returns `None` instead of panicking
    /// when the switch is already borrowed
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut Switch<M>) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .and_then(|mut slot| slot.as_mut().map(f))
        })
    }
}

impl<M: MdioBus> Default for SharedSwitch<M> {
    fn default() -> Self {
        Self::new()
    }
}
