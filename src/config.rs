//! # Configuration Module
//!
//! Handles loading and validating the calibration table and timing constants
//! from TOML files.
//!
//! Every key has a default taken from the reference calibration of the
//! mechanism, so an empty file is a valid configuration. Validation runs once
//! at load time; a configuration that would let a servo leave its safe range
//! is rejected before anything moves.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{ConfigError, Result};
use crate::limits::Registry;

/// Number of outputs on the servo shield.
pub const SHIELD_CHANNELS: u8 = 16;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub hardware: HardwareConfig,

    #[serde(default)]
    pub roles: RoleConfig,

    #[serde(default = "default_channels")]
    pub channels: Vec<ChannelConfig>,

    #[serde(default)]
    pub nunchuck: NunchuckConfig,

    #[serde(default)]
    pub motion: MotionConfig,

    #[serde(default)]
    pub idle: IdleConfig,

    #[serde(default)]
    pub startup: StartupConfig,

    #[serde(default)]
    pub safety: SafetyConfig,
}

/// Servo shield configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct HardwareConfig {
    #[serde(default = "default_servo_shield_address")]
    pub servo_shield_address: u8,

    #[serde(default = "default_update_interval_ms")]
    pub update_interval_ms: u64,
}

/// Which channel serves which function on the mechanism
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct RoleConfig {
    #[serde(default = "default_horizontal")]
    pub horizontal: u8,

    #[serde(default = "default_vertical")]
    pub vertical: u8,

    #[serde(default = "default_left_upper_lid")]
    pub left_upper_lid: u8,

    #[serde(default = "default_left_lower_lid")]
    pub left_lower_lid: u8,

    #[serde(default = "default_right_upper_lid")]
    pub right_upper_lid: u8,

    #[serde(default = "default_right_lower_lid")]
    pub right_lower_lid: u8,
}

/// Kind of motion a channel performs
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    /// Eye movement with a center reference
    Movement,
    /// Eyelid with open/half/closed references
    Eyelid,
}

impl ChannelKind {
    /// Lowercase name as used in configuration files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ChannelKind::Movement => "movement",
            ChannelKind::Eyelid => "eyelid",
        }
    }
}

/// Calibration entry for one servo channel
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChannelConfig {
    pub channel: u8,

    pub kind: ChannelKind,

    pub min_pulse: u16,

    pub max_pulse: u16,

    #[serde(default)]
    pub center_pulse: Option<u16>,

    #[serde(default)]
    pub open_pulse: Option<u16>,

    #[serde(default)]
    pub closed_pulse: Option<u16>,

    #[serde(default)]
    pub half_pulse: Option<u16>,

    #[serde(default)]
    pub inverted: bool,
}

/// Nunchuck joystick calibration (raw units)
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct NunchuckConfig {
    #[serde(default = "default_joy_min")]
    pub joy_x_min: i32,

    #[serde(default = "default_joy_max")]
    pub joy_x_max: i32,

    #[serde(default = "default_joy_min")]
    pub joy_y_min: i32,

    #[serde(default = "default_joy_max")]
    pub joy_y_max: i32,

    #[serde(default = "default_joy_center")]
    pub center: i32,
}

/// Motion smoothing configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct MotionConfig {
    #[serde(default = "default_eye_smoothing")]
    pub eye_smoothing: f32,

    #[serde(default = "default_eyelid_smoothing")]
    pub eyelid_smoothing: f32,

    #[serde(default = "default_deadzone")]
    pub deadzone: i32,

    #[serde(default = "default_blink_duration_ms")]
    pub blink_duration_ms: u64,
}

/// Idle animation configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IdleConfig {
    #[serde(default = "default_idle_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_idle_blink_min_ms")]
    pub blink_min_ms: u64,

    #[serde(default = "default_idle_blink_max_ms")]
    pub blink_max_ms: u64,

    #[serde(default = "default_idle_sequence_min_ms")]
    pub look_min_ms: u64,

    #[serde(default = "default_idle_sequence_max_ms")]
    pub look_max_ms: u64,

    #[serde(default = "default_idle_sequence_min_ms")]
    pub sequence_min_ms: u64,

    #[serde(default = "default_idle_sequence_max_ms")]
    pub sequence_max_ms: u64,

    #[serde(default = "default_idle_movement_range")]
    pub movement_range: f32,
}

/// Startup animation configuration
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct StartupConfig {
    #[serde(default = "default_startup_enabled")]
    pub enabled: bool,

    #[serde(default = "default_eyes_closed_hold_ms")]
    pub eyes_closed_hold_ms: u64,

    #[serde(default = "default_eyes_open_ms")]
    pub eyes_open_ms: u64,

    #[serde(default = "default_look_around_ms")]
    pub look_around_ms: u64,

    #[serde(default = "default_return_to_center_ms")]
    pub return_to_center_ms: u64,
}

/// Absolute safety constraints
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct SafetyConfig {
    #[serde(default = "default_absolute_min_pulse")]
    pub absolute_min_pulse: u16,

    #[serde(default = "default_absolute_max_pulse")]
    pub absolute_max_pulse: u16,

    #[serde(default = "default_max_delta_per_update")]
    pub max_delta_per_update: u16,

    #[serde(default = "default_min_update_interval_ms")]
    pub min_update_interval_ms: u64,
}

// Default value functions
fn default_servo_shield_address() -> u8 { 0x44 }
fn default_update_interval_ms() -> u64 { 20 }

fn default_horizontal() -> u8 { 0 }
fn default_vertical() -> u8 { 1 }
fn default_left_upper_lid() -> u8 { 2 }
fn default_left_lower_lid() -> u8 { 3 }
fn default_right_upper_lid() -> u8 { 4 }
fn default_right_lower_lid() -> u8 { 5 }

fn default_channels() -> Vec<ChannelConfig> {
    vec![
        ChannelConfig::movement(0, 220, 345, 470, true),
        ChannelConfig::movement(1, 260, 342, 440, false),
        ChannelConfig::eyelid(2, 300, 410, 335, false),
        ChannelConfig::eyelid(3, 280, 400, 340, true),
        ChannelConfig::eyelid(4, 255, 380, 340, true),
        ChannelConfig::eyelid(5, 280, 395, 325, false),
    ]
}

fn default_joy_min() -> i32 { 26 }
fn default_joy_max() -> i32 { 226 }
fn default_joy_center() -> i32 { 126 }

fn default_eye_smoothing() -> f32 { 8.0 }
fn default_eyelid_smoothing() -> f32 { 5.0 }
fn default_deadzone() -> i32 { 10 }
fn default_blink_duration_ms() -> u64 { 150 }

fn default_idle_timeout_ms() -> u64 { 15_000 }
fn default_idle_blink_min_ms() -> u64 { 2_000 }
fn default_idle_blink_max_ms() -> u64 { 6_000 }
fn default_idle_sequence_min_ms() -> u64 { 2_000 }
fn default_idle_sequence_max_ms() -> u64 { 4_000 }
fn default_idle_movement_range() -> f32 { 0.7 }

fn default_startup_enabled() -> bool { true }
fn default_eyes_closed_hold_ms() -> u64 { 1_000 }
fn default_eyes_open_ms() -> u64 { 800 }
fn default_look_around_ms() -> u64 { 2_000 }
fn default_return_to_center_ms() -> u64 { 500 }

fn default_absolute_min_pulse() -> u16 { 100 }
fn default_absolute_max_pulse() -> u16 { 650 }
fn default_max_delta_per_update() -> u16 { 50 }
fn default_min_update_interval_ms() -> u64 { 20 }

impl Default for HardwareConfig {
    fn default() -> Self {
        Self {
            servo_shield_address: default_servo_shield_address(),
            update_interval_ms: default_update_interval_ms(),
        }
    }
}

impl Default for RoleConfig {
    fn default() -> Self {
        Self {
            horizontal: default_horizontal(),
            vertical: default_vertical(),
            left_upper_lid: default_left_upper_lid(),
            left_lower_lid: default_left_lower_lid(),
            right_upper_lid: default_right_upper_lid(),
            right_lower_lid: default_right_lower_lid(),
        }
    }
}

impl Default for NunchuckConfig {
    fn default() -> Self {
        Self {
            joy_x_min: default_joy_min(),
            joy_x_max: default_joy_max(),
            joy_y_min: default_joy_min(),
            joy_y_max: default_joy_max(),
            center: default_joy_center(),
        }
    }
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            eye_smoothing: default_eye_smoothing(),
            eyelid_smoothing: default_eyelid_smoothing(),
            deadzone: default_deadzone(),
            blink_duration_ms: default_blink_duration_ms(),
        }
    }
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_idle_timeout_ms(),
            blink_min_ms: default_idle_blink_min_ms(),
            blink_max_ms: default_idle_blink_max_ms(),
            look_min_ms: default_idle_sequence_min_ms(),
            look_max_ms: default_idle_sequence_max_ms(),
            sequence_min_ms: default_idle_sequence_min_ms(),
            sequence_max_ms: default_idle_sequence_max_ms(),
            movement_range: default_idle_movement_range(),
        }
    }
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            enabled: default_startup_enabled(),
            eyes_closed_hold_ms: default_eyes_closed_hold_ms(),
            eyes_open_ms: default_eyes_open_ms(),
            look_around_ms: default_look_around_ms(),
            return_to_center_ms: default_return_to_center_ms(),
        }
    }
}

impl Default for SafetyConfig {
    fn default() -> Self {
        Self {
            absolute_min_pulse: default_absolute_min_pulse(),
            absolute_max_pulse: default_absolute_max_pulse(),
            max_delta_per_update: default_max_delta_per_update(),
            min_update_interval_ms: default_min_update_interval_ms(),
        }
    }
}

impl Default for Config {
    /// The reference calibration of the mechanism.
    fn default() -> Self {
        Self {
            hardware: HardwareConfig::default(),
            roles: RoleConfig::default(),
            channels: default_channels(),
            nunchuck: NunchuckConfig::default(),
            motion: MotionConfig::default(),
            idle: IdleConfig::default(),
            startup: StartupConfig::default(),
            safety: SafetyConfig::default(),
        }
    }
}

impl ChannelConfig {
    /// Creates an eye movement channel entry.
    #[must_use]
    pub fn movement(
        channel: u8,
        min_pulse: u16,
        center_pulse: u16,
        max_pulse: u16,
        inverted: bool,
    ) -> Self {
        Self {
            channel,
            kind: ChannelKind::Movement,
            min_pulse,
            max_pulse,
            center_pulse: Some(center_pulse),
            open_pulse: None,
            closed_pulse: None,
            half_pulse: None,
            inverted,
        }
    }

    /// Creates an eyelid channel entry whose safe range spans open..closed.
    #[must_use]
    pub fn eyelid(
        channel: u8,
        open_pulse: u16,
        closed_pulse: u16,
        half_pulse: u16,
        inverted: bool,
    ) -> Self {
        Self {
            channel,
            kind: ChannelKind::Eyelid,
            min_pulse: open_pulse.min(closed_pulse),
            max_pulse: open_pulse.max(closed_pulse),
            center_pulse: None,
            open_pulse: Some(open_pulse),
            closed_pulse: Some(closed_pulse),
            half_pulse: Some(half_pulse),
            inverted,
        }
    }
}

impl RoleConfig {
    /// Eye movement roles with their channels.
    #[must_use]
    pub fn movement(&self) -> [(&'static str, u8); 2] {
        [("horizontal", self.horizontal), ("vertical", self.vertical)]
    }

    /// Eyelid roles with their channels.
    #[must_use]
    pub fn eyelids(&self) -> [(&'static str, u8); 4] {
        [
            ("left_upper_lid", self.left_upper_lid),
            ("left_lower_lid", self.left_lower_lid),
            ("right_upper_lid", self.right_upper_lid),
            ("right_lower_lid", self.right_lower_lid),
        ]
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use animatronic_eyes::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&contents)?)
    }

    /// Parse and validate configuration from a TOML string.
    ///
    /// # Examples
    ///
    /// ```
    /// use animatronic_eyes::config::Config;
    ///
    /// let config = Config::from_toml_str("[motion]\ndeadzone = 12\n").unwrap();
    /// assert_eq!(config.motion.deadzone, 12);
    /// assert_eq!(config.channels.len(), 6);
    /// ```
    pub fn from_toml_str(contents: &str) -> std::result::Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds the channel registry from the validated calibration table.
    ///
    /// # Errors
    ///
    /// Returns the first channel invariant violation found.
    pub fn registry(&self) -> std::result::Result<Registry, ConfigError> {
        Registry::load(&self.channels, &self.safety)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        // Validate safety envelope
        if self.safety.absolute_min_pulse >= self.safety.absolute_max_pulse {
            return Err(ConfigError::Invalid(
                "absolute_min_pulse must be less than absolute_max_pulse".to_string(),
            ));
        }

        if self.safety.max_delta_per_update == 0 {
            return Err(ConfigError::Invalid(
                "max_delta_per_update must be greater than 0".to_string(),
            ));
        }

        if self.safety.min_update_interval_ms == 0 || self.safety.min_update_interval_ms > 1000 {
            return Err(ConfigError::Invalid(
                "min_update_interval_ms must be between 1 and 1000".to_string(),
            ));
        }

        // The control tick may not outpace the servo update limit
        if self.hardware.update_interval_ms < self.safety.min_update_interval_ms
            || self.hardware.update_interval_ms > 1000
        {
            return Err(ConfigError::Invalid(format!(
                "update_interval_ms must be between min_update_interval_ms ({}) and 1000",
                self.safety.min_update_interval_ms
            )));
        }

        // PCA9685 address pins select 0x40-0x7F
        if !(0x40..=0x7F).contains(&self.hardware.servo_shield_address) {
            return Err(ConfigError::Invalid(format!(
                "servo_shield_address 0x{:02x} must be between 0x40 and 0x7f",
                self.hardware.servo_shield_address
            )));
        }

        // Validate channel table
        let registry = self.registry()?;
        self.validate_roles(&registry)?;

        // Validate joystick calibration
        for (name, min, max) in [
            ("x", self.nunchuck.joy_x_min, self.nunchuck.joy_x_max),
            ("y", self.nunchuck.joy_y_min, self.nunchuck.joy_y_max),
        ] {
            if !(min < self.nunchuck.center && self.nunchuck.center < max) {
                return Err(ConfigError::Invalid(format!(
                    "joystick {} range must satisfy min < center < max ({} < {} < {})",
                    name, min, self.nunchuck.center, max
                )));
            }

            let half_span = (self.nunchuck.center - min).min(max - self.nunchuck.center);
            if self.motion.deadzone < 0 || self.motion.deadzone >= half_span {
                return Err(ConfigError::Invalid(format!(
                    "deadzone must be between 0 and {} for joystick {} range",
                    half_span - 1,
                    name
                )));
            }
        }

        // Validate smoothing
        for (name, value) in [
            ("eye_smoothing", self.motion.eye_smoothing),
            ("eyelid_smoothing", self.motion.eyelid_smoothing),
        ] {
            if !(1.0..=100.0).contains(&value) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be between 1.0 and 100.0",
                    name
                )));
            }
        }

        if self.motion.blink_duration_ms == 0 || self.motion.blink_duration_ms > 10_000 {
            return Err(ConfigError::Invalid(
                "blink_duration_ms must be between 1 and 10000".to_string(),
            ));
        }

        // Validate idle timing windows
        if self.idle.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "idle timeout_ms must be greater than 0".to_string(),
            ));
        }

        for (name, min, max) in [
            ("blink", self.idle.blink_min_ms, self.idle.blink_max_ms),
            ("look", self.idle.look_min_ms, self.idle.look_max_ms),
            ("sequence", self.idle.sequence_min_ms, self.idle.sequence_max_ms),
        ] {
            if min == 0 || min > max {
                return Err(ConfigError::Invalid(format!(
                    "idle {} window must satisfy 0 < min <= max ({} / {})",
                    name, min, max
                )));
            }
        }

        if !(self.idle.movement_range > 0.0 && self.idle.movement_range <= 1.0) {
            return Err(ConfigError::Invalid(
                "idle movement_range must be in (0.0, 1.0]".to_string(),
            ));
        }

        Ok(())
    }

    /// Checks that every role names a distinct configured channel of the right kind.
    fn validate_roles(&self, registry: &Registry) -> std::result::Result<(), ConfigError> {
        let movement = self.roles.movement().map(|role| (role, ChannelKind::Movement));
        let eyelids = self.roles.eyelids().map(|role| (role, ChannelKind::Eyelid));

        let mut seen = HashSet::new();
        for ((role, channel), expected) in movement.into_iter().chain(eyelids) {
            if !seen.insert(channel) {
                return Err(ConfigError::Role {
                    role,
                    reason: format!("channel {} is already assigned to another role", channel),
                });
            }

            match registry.get(channel) {
                None => {
                    return Err(ConfigError::Role {
                        role,
                        reason: format!("channel {} is not configured", channel),
                    });
                }
                Some(limits) if limits.kind() != expected => {
                    return Err(ConfigError::Role {
                        role,
                        reason: format!(
                            "channel {} is a {} channel, expected {}",
                            channel,
                            limits.kind().name(),
                            expected.name()
                        ),
                    });
                }
                Some(_) => {}
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_valid_config() -> Config {
        Config::default()
    }

    #[test]
    fn test_default_config() {
        assert!(create_valid_config().validate().is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let toml_content = r#"
[hardware]
servo_shield_address = 0x41

[motion]
eye_smoothing = 10.0

[[channels]]
channel = 0
kind = "movement"
min_pulse = 220
max_pulse = 470
center_pulse = 345
inverted = true

[[channels]]
channel = 1
kind = "movement"
min_pulse = 260
max_pulse = 440
center_pulse = 342

[[channels]]
channel = 2
kind = "eyelid"
min_pulse = 300
max_pulse = 410
open_pulse = 300
closed_pulse = 410
half_pulse = 335

[[channels]]
channel = 3
kind = "eyelid"
min_pulse = 280
max_pulse = 400
open_pulse = 280
closed_pulse = 400
half_pulse = 340
inverted = true

[[channels]]
channel = 4
kind = "eyelid"
min_pulse = 255
max_pulse = 380
open_pulse = 255
closed_pulse = 380
half_pulse = 340
inverted = true

[[channels]]
channel = 5
kind = "eyelid"
min_pulse = 280
max_pulse = 395
open_pulse = 280
closed_pulse = 395
half_pulse = 325
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let config = Config::load(temp_file.path()).unwrap();
        assert_eq!(config.hardware.servo_shield_address, 0x41);
        assert_eq!(config.motion.eye_smoothing, 10.0);
        assert_eq!(config.channels, default_channels());
    }

    #[test]
    fn test_empty_file_is_reference_calibration() {
        let config = Config::from_toml_str("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/animatronic-eyes.toml");
        assert!(matches!(result, Err(crate::error::EyesError::Io(_))));
    }

    #[test]
    fn test_parse_error() {
        let result = Config::from_toml_str("[safety]\nabsolute_min_pulse = \"low\"\n");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_unknown_channel_kind() {
        let toml_content = r#"
[[channels]]
channel = 0
kind = "jaw"
min_pulse = 200
max_pulse = 400
"#;
        assert!(matches!(Config::from_toml_str(toml_content), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let mut config = create_valid_config();
        config.channels[0].min_pulse = 470;
        config.channels[0].max_pulse = 220;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedBounds { channel: 0, min: 470, max: 220 })
        ));
    }

    #[test]
    fn test_center_outside_range_rejected() {
        let mut config = create_valid_config();
        config.channels[0].center_pulse = Some(700);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ReferenceOutOfRange { channel: 0, value: 700, .. })
        ));
    }

    #[test]
    fn test_absolute_min_not_below_max() {
        let mut config = create_valid_config();
        config.safety.absolute_min_pulse = 650;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_delta_zero() {
        let mut config = create_valid_config();
        config.safety.max_delta_per_update = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_min_update_interval_zero() {
        let mut config = create_valid_config();
        config.safety.min_update_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_update_interval_faster_than_servo_limit() {
        let mut config = create_valid_config();
        config.hardware.update_interval_ms = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_servo_shield_address_out_of_range() {
        let mut config = create_valid_config();
        config.hardware.servo_shield_address = 0x20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_shield_addresses() {
        for &address in &[0x40, 0x41, 0x42, 0x44, 0x48, 0x50, 0x60] {
            let mut config = create_valid_config();
            config.hardware.servo_shield_address = address;
            assert!(config.validate().is_ok(), "Address 0x{:02x} should be valid", address);
        }
    }

    #[test]
    fn test_role_missing_channel() {
        let mut config = create_valid_config();
        config.roles.vertical = 9;
        assert!(matches!(config.validate(), Err(ConfigError::Role { role: "vertical", .. })));
    }

    #[test]
    fn test_role_wrong_kind() {
        let mut config = create_valid_config();
        config.roles.horizontal = 2;
        config.roles.left_upper_lid = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Role { role: "horizontal", .. })));
    }

    #[test]
    fn test_role_assigned_twice() {
        let mut config = create_valid_config();
        config.roles.right_lower_lid = 4;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Role { role: "right_lower_lid", .. })
        ));
    }

    #[test]
    fn test_joystick_center_outside_range() {
        let mut config = create_valid_config();
        config.nunchuck.center = 230;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_negative() {
        let mut config = create_valid_config();
        config.motion.deadzone = -1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadzone_swallows_stick() {
        let mut config = create_valid_config();
        config.motion.deadzone = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_smoothing_below_one() {
        let mut config = create_valid_config();
        config.motion.eyelid_smoothing = 0.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_blink_duration_zero() {
        let mut config = create_valid_config();
        config.motion.blink_duration_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_idle_timeout_zero() {
        let mut config = create_valid_config();
        config.idle.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_idle_blink_window_reversed() {
        let mut config = create_valid_config();
        config.idle.blink_min_ms = 7_000;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_idle_sequence_window_zero() {
        let mut config = create_valid_config();
        config.idle.sequence_min_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_idle_movement_range_bounds() {
        let mut config = create_valid_config();
        config.idle.movement_range = 0.0;
        assert!(config.validate().is_err());

        config.idle.movement_range = 1.2;
        assert!(config.validate().is_err());

        config.idle.movement_range = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_eyelid_helper_spans_references() {
        let lid = ChannelConfig::eyelid(3, 400, 280, 340, false);
        assert_eq!(lid.min_pulse, 280);
        assert_eq!(lid.max_pulse, 400);
        assert_eq!(lid.kind, ChannelKind::Eyelid);
    }

    #[test]
    fn test_default_functions() {
        assert_eq!(default_servo_shield_address(), 0x44);
        assert_eq!(default_update_interval_ms(), 20);
        assert_eq!(default_joy_min(), 26);
        assert_eq!(default_joy_max(), 226);
        assert_eq!(default_joy_center(), 126);
        assert_eq!(default_eye_smoothing(), 8.0);
        assert_eq!(default_eyelid_smoothing(), 5.0);
        assert_eq!(default_deadzone(), 10);
        assert_eq!(default_blink_duration_ms(), 150);
        assert_eq!(default_idle_timeout_ms(), 15_000);
        assert_eq!(default_idle_blink_min_ms(), 2_000);
        assert_eq!(default_idle_blink_max_ms(), 6_000);
        assert_eq!(default_idle_sequence_min_ms(), 2_000);
        assert_eq!(default_idle_sequence_max_ms(), 4_000);
        assert_eq!(default_idle_movement_range(), 0.7);
        assert_eq!(default_eyes_closed_hold_ms(), 1_000);
        assert_eq!(default_eyes_open_ms(), 800);
        assert_eq!(default_look_around_ms(), 2_000);
        assert_eq!(default_return_to_center_ms(), 500);
        assert_eq!(default_absolute_min_pulse(), 100);
        assert_eq!(default_absolute_max_pulse(), 650);
        assert_eq!(default_max_delta_per_update(), 50);
        assert_eq!(default_min_update_interval_ms(), 20);
    }
}
