//! Error types for the MDIO bus and switch driver
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Invalid addresses, ports or VLAN identifiers
//! - [`IoError`]: Bus transaction failures and poll timeouts
//! - [`SwitchError`]: Chip identification and layout selection failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most driver methods.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and argument errors
///
/// These errors are raised before any bus activity takes place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Invalid PHY address (must be 0-31)
    InvalidPhyAddress,
    /// Invalid register address (must be 0-31)
    InvalidRegAddress,
    /// Port index outside the chip's port range
    InvalidPort,
    /// VLAN ID outside 1-4094
    InvalidVlanId,
    /// Invalid configuration parameter
    InvalidConfig,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::InvalidPhyAddress => "invalid PHY address",
            ConfigError::InvalidRegAddress => "invalid register address",
            ConfigError::InvalidPort => "invalid port",
            ConfigError::InvalidVlanId => "invalid VLAN id",
            ConfigError::InvalidConfig => "invalid configuration",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Bus transaction errors
///
/// These errors occur while clocking MDIO frames or polling switch
/// busy bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// A busy bit did not clear within the configured spin bound, or a
    /// frame could not be clocked to completion
    BusTimeout,
    /// The register window rejected a line access
    LineFault,
    /// The GPIO register window could not be established
    MappingFailed,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::BusTimeout => "bus timeout",
            IoError::LineFault => "GPIO line fault",
            IoError::MappingFailed => "register window mapping failed",
        }
    }
}

// =============================================================================
// Switch Errors
// =============================================================================

/// Switch identification and configuration errors
///
/// `UnsupportedChip` and `UnsupportedLayout` are non-fatal for a tool run:
/// the caller reports them and leaves the chip untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SwitchError {
    /// Identification register does not match a supported model
    UnsupportedChip,
    /// Requested VLAN layout is not implemented for the detected chip
    UnsupportedLayout,
    /// VTU iteration returned a VID out of ascending order
    VtuInconsistent,
}

impl core::fmt::Display for SwitchError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SwitchError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SwitchError::UnsupportedChip => "unsupported switch",
            SwitchError::UnsupportedLayout => "unsupported layout for this switch",
            SwitchError::VtuInconsistent => "VTU iteration out of order",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Switch(SwitchError::UnsupportedChip)) => { /* report, skip */ }
///     Err(Error::Io(IoError::BusTimeout)) => { /* fatal for this run */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// I/O error
    Io(IoError),
    /// Switch error
    Switch(SwitchError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
            Error::Switch(e) => write!(f, "switch: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

impl From<SwitchError> for Error {
    fn from(e: SwitchError) -> Self {
        Error::Switch(e)
    }
}

/// Result type alias for driver operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for bus operations
pub type IoResult<T> = core::result::Result<T, IoError>;

/// Result type alias for switch-level operations
pub type SwitchResult<T> = core::result::Result<T, SwitchError>;

// =============================================================================
// Unit Tests
// =============================================================================
