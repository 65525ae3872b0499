//! # Error Types
//!
//! Custom error types for the eye mechanism using `thiserror`.
//!
//! [`ConfigError`] is fatal and only raised while loading configuration.
//! [`HardwareError`] is raised per tick and recovered locally by the
//! control loop.

use thiserror::Error;

/// Configuration errors, raised once at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// TOML parsing or type errors
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// `min_pulse` is not strictly below `max_pulse`
    #[error("channel {channel}: min_pulse {min} must be less than max_pulse {max}")]
    InvertedBounds { channel: u8, min: u16, max: u16 },

    /// A safe bound lies outside the absolute floor/ceiling
    #[error("channel {channel}: {name} {value} is outside absolute limits [{floor}, {ceiling}]")]
    OutsideAbsoluteLimits {
        channel: u8,
        name: &'static str,
        value: u16,
        floor: u16,
        ceiling: u16,
    },

    /// A reference point lies outside the channel's safe range
    #[error("channel {channel}: {name} {value} is outside safe range [{min}, {max}]")]
    ReferenceOutOfRange {
        channel: u8,
        name: &'static str,
        value: u16,
        min: u16,
        max: u16,
    },

    /// A reference point required by the channel kind is missing
    #[error("channel {channel}: {kind} channel requires {name}")]
    MissingReference {
        channel: u8,
        kind: &'static str,
        name: &'static str,
    },

    /// Channel identifier appears more than once
    #[error("channel {0} is configured more than once")]
    DuplicateChannel(u8),

    /// Channel identifier beyond the shield's outputs
    #[error("channel {channel} is out of bounds (must be 0-{max})")]
    ChannelOutOfBounds { channel: u8, max: u8 },

    /// A role points at a channel that is missing or of the wrong kind
    #[error("role {role}: {reason}")]
    Role { role: &'static str, reason: String },

    /// Scalar setting out of its valid range
    #[error("{0}")]
    Invalid(String),
}

/// Hardware errors, raised per tick on failed reads or writes.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HardwareError {
    /// Servo command could not be written
    #[error("failed to write pulse to channel {channel}: {reason}")]
    Write { channel: u8, reason: String },

    /// Joystick state could not be read
    #[error("failed to read joystick: {0}")]
    Read(String),
}

/// Main error type for the eye mechanism
#[derive(Debug, Error)]
pub enum EyesError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Hardware errors
    #[error("Hardware error: {0}")]
    Hardware(#[from] HardwareError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the eye mechanism
pub type Result<T> = std::result::Result<T, EyesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_messages_name_the_channel() {
        let err = ConfigError::InvertedBounds {
            channel: 0,
            min: 470,
            max: 220,
        };
        assert_eq!(
            err.to_string(),
            "channel 0: min_pulse 470 must be less than max_pulse 220"
        );
    }

    #[test]
    fn test_hardware_error_wraps_into_eyes_error() {
        let err: EyesError = HardwareError::Read("nack".to_string()).into();
        assert!(matches!(err, EyesError::Hardware(HardwareError::Read(_))));
        assert_eq!(err.to_string(), "Hardware error: failed to read joystick: nack");
    }
}
