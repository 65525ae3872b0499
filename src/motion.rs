//! # Motion Controller Module
//!
//! Converts joystick input and animation targets into clamped, smoothed,
//! rate-limited pulses, one axis per servo channel.
//!
//! ## Pipeline
//!
//! Each update runs, in order:
//!
//! 1. Deadzone: raw input within the deadzone is treated as exactly center
//! 2. Logical mapping through the [`Registry`], honoring inversion
//! 3. Exponential smoothing: `current += (target - current) / smoothing`
//! 4. Step cap: `|step| <= max_delta_per_update`, direction preserved
//! 5. Clamp to the channel's safe range
//! 6. Rate limit: updates before `min_update_interval_ms` has elapsed return
//!    the previous output unchanged
//!
//! Joystick input enters at step 1 ([`MotionController::tick`]), animation
//! targets at step 2 ([`MotionController::drive_logical`]) or step 3
//! ([`MotionController::drive_pulse`]). Nothing here returns an error:
//! runtime values are clamped, never rejected.
//!
//! ## Usage
//!
//! ```
//! use animatronic_eyes::config::Config;
//! use animatronic_eyes::motion::MotionController;
//!
//! let config = Config::default();
//! let mut motion = MotionController::new(config.registry().unwrap(), &config);
//! let stick = animatronic_eyes::controller::JoystickCalibration::default().x;
//!
//! // Full left on the inverted horizontal channel heads toward 470
//! let first = motion.tick(0, &stick, 26, 0).unwrap();
//! assert!(first > 345 && first <= 470);
//! ```

use std::collections::BTreeMap;

use crate::config::{ChannelKind, Config};
use crate::controller::StickAxis;
use crate::limits::Registry;

/// Tuning for the smoothing and rate-limiting stages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSettings {
    /// Smoothing divisor for eye movement channels.
    pub eye_smoothing: f32,
    /// Smoothing divisor for eyelid channels.
    pub eyelid_smoothing: f32,
    /// Largest pulse change allowed in one update.
    pub max_delta_per_update: u16,
    /// Minimum time between two updates of the same channel.
    pub min_update_interval_ms: u64,
}

impl MotionSettings {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            eye_smoothing: config.motion.eye_smoothing,
            eyelid_smoothing: config.motion.eyelid_smoothing,
            max_delta_per_update: config.safety.max_delta_per_update,
            min_update_interval_ms: config.safety.min_update_interval_ms,
        }
    }

    /// Smoothing divisor for a channel kind, never below 1.
    #[must_use]
    pub fn smoothing_for(&self, kind: ChannelKind) -> f32 {
        let smoothing = match kind {
            ChannelKind::Movement => self.eye_smoothing,
            ChannelKind::Eyelid => self.eyelid_smoothing,
        };
        smoothing.max(1.0)
    }
}

/// Runtime state of one servo axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisState {
    /// Fractional position carried between updates so small steps accumulate.
    position: f32,
    current_pulse: u16,
    target_pulse: u16,
    last_update_ms: Option<u64>,
}

impl AxisState {
    fn at_rest(pulse: u16) -> Self {
        Self {
            position: pulse as f32,
            current_pulse: pulse,
            target_pulse: pulse,
            last_update_ms: None,
        }
    }

    /// Last commanded pulse.
    #[must_use]
    pub fn current_pulse(&self) -> u16 {
        self.current_pulse
    }

    /// Target of the most recent update.
    #[must_use]
    pub fn target_pulse(&self) -> u16 {
        self.target_pulse
    }

    /// Timestamp of the most recent update, if any.
    #[must_use]
    pub fn last_update_ms(&self) -> Option<u64> {
        self.last_update_ms
    }
}

/// Owns the axis state of every configured channel.
///
/// Single owner, single writer: each axis is touched at most once per control
/// tick, so no locking is involved.
#[derive(Debug, Clone)]
pub struct MotionController {
    registry: Registry,
    settings: MotionSettings,
    axes: BTreeMap<u8, AxisState>,
}

impl MotionController {
    /// Creates a controller with every axis resting at center or open.
    #[must_use]
    pub fn new(registry: Registry, config: &Config) -> Self {
        Self::with_settings(registry, MotionSettings::from_config(config))
    }

    #[must_use]
    pub fn with_settings(registry: Registry, settings: MotionSettings) -> Self {
        let axes = registry
            .iter()
            .map(|limits| (limits.channel(), AxisState::at_rest(limits.rest_pulse())))
            .collect();

        Self {
            registry,
            settings,
            axes,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[must_use]
    pub fn settings(&self) -> &MotionSettings {
        &self.settings
    }

    /// State of a channel's axis, if configured.
    #[must_use]
    pub fn axis(&self, channel: u8) -> Option<&AxisState> {
        self.axes.get(&channel)
    }

    /// Last commanded pulse of a channel, if configured.
    #[must_use]
    pub fn current_pulse(&self, channel: u8) -> Option<u16> {
        self.axes.get(&channel).map(AxisState::current_pulse)
    }

    /// Drives a channel from a raw joystick value.
    ///
    /// # Arguments
    ///
    /// * `channel` - Servo channel
    /// * `stick` - Calibration of the stick axis feeding this channel
    /// * `raw` - Raw stick value
    /// * `now_ms` - Monotonic timestamp in milliseconds
    ///
    /// # Returns
    ///
    /// The commanded pulse, or `None` if the channel is not configured.
    pub fn tick(&mut self, channel: u8, stick: &StickAxis, raw: i32, now_ms: u64) -> Option<u16> {
        let logical = stick.to_logical(raw);
        self.drive_logical(channel, logical, now_ms)
    }

    /// Drives a channel toward a logical position (0.0 to 1.0).
    pub fn drive_logical(&mut self, channel: u8, logical: f32, now_ms: u64) -> Option<u16> {
        let target = self.registry.map_logical(channel, logical)?;
        self.drive_pulse(channel, target, now_ms)
    }

    /// Drives a channel toward a target pulse.
    ///
    /// The target is clamped to the channel's safe range before smoothing.
    pub fn drive_pulse(&mut self, channel: u8, target: u16, now_ms: u64) -> Option<u16> {
        let limits = *self.registry.get(channel)?;
        let settings = self.settings;
        let axis = self.axes.get_mut(&channel)?;

        // Rate limit: reuse the previous output unchanged
        if let Some(last) = axis.last_update_ms {
            if now_ms.saturating_sub(last) < settings.min_update_interval_ms {
                return Some(axis.current_pulse);
            }
        }

        let target = limits.clamp(target);
        let max_delta = f32::from(settings.max_delta_per_update);

        // Exponential smoothing, step capped in both directions
        let error = f32::from(target) - axis.position;
        let step = (error / settings.smoothing_for(limits.kind())).clamp(-max_delta, max_delta);
        let mut position = axis.position + step;
        if (f32::from(target) - position).abs() < 0.5 {
            position = f32::from(target);
        }
        let position = position.clamp(f32::from(limits.min_pulse()), f32::from(limits.max_pulse()));

        // Rounding must not push the output past the step cap
        let previous = axis.current_pulse;
        let pulse = limits.clamp((position.round() as u16).clamp(
            previous.saturating_sub(settings.max_delta_per_update),
            previous.saturating_add(settings.max_delta_per_update),
        ));

        axis.position = position;
        axis.current_pulse = pulse;
        axis.target_pulse = target;
        axis.last_update_ms = Some(now_ms);

        Some(pulse)
    }

    /// Rewinds an axis to a pulse the hardware actually holds.
    ///
    /// Used after a failed servo write so the next step is measured from the
    /// physical position. Does not count as an update for rate limiting.
    pub fn hold(&mut self, channel: u8, pulse: u16) {
        let Some(limits) = self.registry.get(channel) else {
            return;
        };
        let pulse = limits.clamp(pulse);

        if let Some(axis) = self.axes.get_mut(&channel) {
            axis.position = f32::from(pulse);
            axis.current_pulse = pulse;
        }
    }
}
