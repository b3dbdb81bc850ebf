//! Unified error types for the TSBoard firmware.
//!
//! [`Error`] is what the host-facing command surface returns.  Frame and
//! transport errors stay inside the weather ingest and the hardware adapter.
//! All types are `Copy` so they can be passed through the control cycle
//! without allocation.
//!
//! None of these ever escape as a panic or abort the control loop: motion
//! conflicts and bad switch writes are returned to the caller, malformed
//! weather frames are dropped, and transport failures are logged.  The
//! configuration store error lives with its port in [`crate::app::ports`].

use core::fmt;

use crate::app::ports::ConfigError;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Failure of a host command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A remote command was refused; device state is unchanged.
    Command(CommandError),
    /// The configuration store could not be read or written.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(e) => write!(f, "command: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

// ---------------------------------------------------------------------------
// Command errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Open requested while closing, or close while opening.
    MotionConflict,
    /// Write addressed to one of the read-only input mirrors (0–7).
    ReadOnlySwitch(u32),
    /// Switch index outside 0–19.
    InvalidSwitch(u32),
    /// Value is non-finite or outside the slot's min/max.
    InvalidValue,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MotionConflict => write!(f, "conflicting shutter motion in progress"),
            Self::ReadOnlySwitch(id) => write!(f, "switch {id} is read-only"),
            Self::InvalidSwitch(id) => write!(f, "switch {id} does not exist"),
            Self::InvalidValue => write!(f, "value out of range"),
        }
    }
}

impl From<CommandError> for Error {
    fn from(e: CommandError) -> Self {
        Self::Command(e)
    }
}

// ---------------------------------------------------------------------------
// Weather frame errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameError {
    /// More bytes than the receive buffer holds arrived before `#`.
    Overflow,
    /// `#` arrived but the buffer did not start with `%`.
    MissingSync,
    /// Frame does not start with `%WS,`.
    BadHeader,
    /// Frame carried this many fields instead of eight.
    FieldCount(usize),
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overflow => write!(f, "receive buffer overflow"),
            Self::MissingSync => write!(f, "terminator without sync byte"),
            Self::BadHeader => write!(f, "unknown frame header"),
            Self::FieldCount(n) => write!(f, "expected 8 fields, got {n}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// A shift-register control or data line could not be driven or read.
    Gpio,
    /// A PWM channel rejected its duty update.
    Pwm,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gpio => write!(f, "GPIO access failed"),
            Self::Pwm => write!(f, "PWM duty update failed"),
        }
    }
}

// ---------------------------------------------------------------------------
// Hazards
// ---------------------------------------------------------------------------

/// Hazard sources are accumulated in a bitfield by the safety monitor so
/// that several simultaneous conditions can be tracked and individually
/// cleared.  Humidity and light have bits reserved but are never folded into
/// the safety verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Hazard {
    /// Rain alarm input asserted.
    Rain = 0b0000_0001,
    /// Mains power-loss alarm input asserted.
    PowerLoss = 0b0000_0010,
    /// Sky temperature above limit (cloud cover).
    SkyTemperature = 0b0000_0100,
    /// Wind speed above limit.
    Wind = 0b0000_1000,
    Humidity = 0b0001_0000,
    Light = 0b0010_0000,
}

impl Hazard {
    /// Return the bitmask for this hazard.
    pub const fn mask(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for Hazard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rain => write!(f, "rain"),
            Self::PowerLoss => write!(f, "power loss"),
            Self::SkyTemperature => write!(f, "sky temperature"),
            Self::Wind => write!(f, "wind"),
            Self::Humidity => write!(f, "humidity"),
            Self::Light => write!(f, "ambient light"),
        }
    }
}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hazard_masks_are_disjoint() {
        let all = [
            Hazard::Rain,
            Hazard::PowerLoss,
            Hazard::SkyTemperature,
            Hazard::Wind,
            Hazard::Humidity,
            Hazard::Light,
        ];
        let mut seen = 0u8;
        for h in all {
            assert_eq!(seen & h.mask(), 0, "{h} overlaps");
            seen |= h.mask();
        }
    }

    #[test]
    fn command_error_converts() {
        let e: Error = CommandError::ReadOnlySwitch(3).into();
        assert_eq!(e, Error::Command(CommandError::ReadOnlySwitch(3)));
    }

    #[test]
    fn config_error_converts() {
        let e: Error = ConfigError::IoError.into();
        assert_eq!(e, Error::Config(ConfigError::IoError));
        assert_eq!(e.to_string(), format!("config: {}", ConfigError::IoError));
    }
}
