//! # Calibration Module
//!
//! Applies the deadzone and maps raw Nunchuck stick values to logical
//! positions.
//!
//! ## Deadzone
//!
//! A deadzone eliminates small stick movements near center to prevent jitter
//! when the stick is released. Raw values with `|raw - center| < deadzone`
//! are treated as exactly center. Values outside are passed through
//! unchanged, so there is no partial response inside the band.
//!
//! ## Logical Mapping
//!
//! The stick range is asymmetric, so each half is mapped separately:
//!
//! - `min` → 0.0
//! - `center` → 0.5
//! - `max` → 1.0
//!
//! ## Usage
//!
//! ```
//! use animatronic_eyes::controller::calibration::StickAxis;
//!
//! let axis = StickAxis::new(26, 126, 226, 10);
//!
//! // Within deadzone
//! assert_eq!(axis.apply_deadzone(131), 126);
//! assert_eq!(axis.to_logical(131), 0.5);
//!
//! // Full deflection
//! assert_eq!(axis.to_logical(26), 0.0);
//! assert_eq!(axis.to_logical(226), 1.0);
//! ```

use crate::config::{MotionConfig, NunchuckConfig};

/// Calibration of a single stick axis, in raw Nunchuck units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StickAxis {
    min: i32,
    center: i32,
    max: i32,
    deadzone: i32,
}

impl StickAxis {
    /// Creates an axis calibration.
    ///
    /// Expects `min < center < max`; configuration validation enforces this.
    #[must_use]
    pub fn new(min: i32, center: i32, max: i32, deadzone: i32) -> Self {
        Self {
            min,
            center,
            max,
            deadzone: deadzone.max(0),
        }
    }

    #[must_use]
    pub fn min(&self) -> i32 {
        self.min
    }

    #[must_use]
    pub fn center(&self) -> i32 {
        self.center
    }

    #[must_use]
    pub fn max(&self) -> i32 {
        self.max
    }

    #[must_use]
    pub fn deadzone(&self) -> i32 {
        self.deadzone
    }

    /// Checks if a raw value lies strictly inside the deadzone.
    #[inline]
    #[must_use]
    pub fn in_deadzone(&self, raw: i32) -> bool {
        raw.abs_diff(self.center) < self.deadzone.unsigned_abs()
    }

    /// Snaps raw values inside the deadzone to exactly center.
    #[inline]
    #[must_use]
    pub fn apply_deadzone(&self, raw: i32) -> i32 {
        if self.in_deadzone(raw) {
            self.center
        } else {
            raw
        }
    }

    /// Converts a raw value to a logical position (0.0 to 1.0).
    ///
    /// Applies the deadzone first; values beyond the calibrated range are
    /// clamped.
    #[must_use]
    pub fn to_logical(&self, raw: i32) -> f32 {
        let raw = self.apply_deadzone(raw).clamp(self.min, self.max);

        if raw <= self.center {
            let span = (self.center - self.min).max(1) as f32;
            0.5 * (raw - self.min) as f32 / span
        } else {
            let span = (self.max - self.center).max(1) as f32;
            0.5 + 0.5 * (raw - self.center) as f32 / span
        }
    }
}

/// Calibration for both Nunchuck stick axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoystickCalibration {
    /// X axis (horizontal gaze).
    pub x: StickAxis,
    /// Y axis (vertical gaze).
    pub y: StickAxis,
}

impl Default for JoystickCalibration {
    fn default() -> Self {
        Self::from_config(&NunchuckConfig::default(), &MotionConfig::default())
    }
}

impl JoystickCalibration {
    /// Creates joystick calibration from config values.
    ///
    /// # Examples
    ///
    /// ```
    /// use animatronic_eyes::config::{MotionConfig, NunchuckConfig};
    /// use animatronic_eyes::controller::JoystickCalibration;
    ///
    /// let cal =
    ///     JoystickCalibration::from_config(&NunchuckConfig::default(), &MotionConfig::default());
    /// assert_eq!(cal.x.center(), 126);
    /// assert_eq!(cal.y.deadzone(), 10);
    /// ```
    #[must_use]
    pub fn from_config(nunchuck: &NunchuckConfig, motion: &MotionConfig) -> Self {
        Self {
            x: StickAxis::new(
                nunchuck.joy_x_min,
                nunchuck.center,
                nunchuck.joy_x_max,
                motion.deadzone,
            ),
            y: StickAxis::new(
                nunchuck.joy_y_min,
                nunchuck.center,
                nunchuck.joy_y_max,
                motion.deadzone,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis() -> StickAxis {
        StickAxis::new(26, 126, 226, 10)
    }

    // ==================== Deadzone Tests ====================

    #[test]
    fn test_deadzone_within_zone() {
        let axis = axis();
        assert_eq!(axis.apply_deadzone(126), 126);
        assert_eq!(axis.apply_deadzone(135), 126);
        assert_eq!(axis.apply_deadzone(117), 126);
    }

    #[test]
    fn test_deadzone_edge_passes_through() {
        let axis = axis();
        assert_eq!(axis.apply_deadzone(136), 136);
        assert_eq!(axis.apply_deadzone(116), 116);
    }

    #[test]
    fn test_no_partial_response_inside_deadzone() {
        let axis = axis();
        for raw in 117..=135 {
            assert_eq!(axis.to_logical(raw), 0.5, "raw = {}", raw);
        }
    }

    #[test]
    fn test_extreme_raw_values() {
        let axis = axis();
        assert!(!axis.in_deadzone(i32::MIN));
        assert!(!axis.in_deadzone(i32::MAX));
        assert_eq!(axis.to_logical(i32::MIN), 0.0);
        assert_eq!(axis.to_logical(i32::MAX), 1.0);
    }

    #[test]
    fn test_negative_deadzone_is_disabled() {
        let axis = StickAxis::new(26, 126, 226, -5);
        assert_eq!(axis.deadzone(), 0);
        assert_eq!(axis.apply_deadzone(127), 127);
    }

    // ==================== Logical Mapping Tests ====================

    #[test]
    fn test_to_logical_endpoints() {
        let axis = axis();
        assert_eq!(axis.to_logical(26), 0.0);
        assert_eq!(axis.to_logical(126), 0.5);
        assert_eq!(axis.to_logical(226), 1.0);
    }

    #[test]
    fn test_to_logical_clamps() {
        let axis = axis();
        assert_eq!(axis.to_logical(0), 0.0);
        assert_eq!(axis.to_logical(255), 1.0);
        assert_eq!(axis.to_logical(-40), 0.0);
    }

    #[test]
    fn test_to_logical_asymmetric_range() {
        let axis = StickAxis::new(30, 130, 230, 0);
        assert!((axis.to_logical(80) - 0.25).abs() < 0.001);
        assert!((axis.to_logical(180) - 0.75).abs() < 0.001);

        // Short upper half still reaches 1.0 at its own max
        let axis = StickAxis::new(26, 126, 176, 0);
        assert!((axis.to_logical(151) - 0.75).abs() < 0.001);
        assert_eq!(axis.to_logical(176), 1.0);
    }

    #[test]
    fn test_to_logical_is_monotonic() {
        let axis = axis();
        let mut previous = axis.to_logical(0);
        for raw in 1..=255 {
            let value = axis.to_logical(raw);
            assert!(value >= previous, "raw = {}", raw);
            previous = value;
        }
    }

    // ==================== JoystickCalibration Tests ====================

    #[test]
    fn test_from_config() {
        let nunchuck = NunchuckConfig {
            joy_x_min: 20,
            joy_x_max: 230,
            joy_y_min: 30,
            joy_y_max: 220,
            center: 125,
        };
        let motion = MotionConfig {
            deadzone: 12,
            ..MotionConfig::default()
        };
        let cal = JoystickCalibration::from_config(&nunchuck, &motion);

        assert_eq!(cal.x.min(), 20);
        assert_eq!(cal.x.max(), 230);
        assert_eq!(cal.y.min(), 30);
        assert_eq!(cal.y.max(), 220);
        assert_eq!(cal.y.center(), 125);
        assert_eq!(cal.x.deadzone(), 12);
    }

    #[test]
    fn test_default_matches_reference_nunchuck() {
        let cal = JoystickCalibration::default();
        assert_eq!(cal.x, StickAxis::new(26, 126, 226, 10));
        assert_eq!(cal.y, StickAxis::new(26, 126, 226, 10));
    }
}
