//! # Nunchuck Input Module
//!
//! Snapshot of the Wii Nunchuck state as read once per control tick.
//!
//! ## Inputs
//!
//! | Input | Range | Function |
//! |-------|-------|----------|
//! | Stick X | 26-226 | Horizontal gaze |
//! | Stick Y | 26-226 | Vertical gaze |
//! | Z button | pressed/released | Blink |
//! | C button | pressed/released | Squint (half-closed lids) |
//!
//! The raw range is not the full 0-255; every Nunchuck is slightly
//! asymmetric, see [`super::calibration`].

use bitflags::bitflags;

use super::calibration::JoystickCalibration;

/// Nominal raw stick center of a Nunchuck.
pub const NUNCHUCK_CENTER: i32 = 126;

bitflags! {
    /// Buttons held on the Nunchuck.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        /// C button (small, top)
        const C = 0b0000_0001;
        /// Z button (large, trigger)
        const Z = 0b0000_0010;
    }
}

/// Joystick position and buttons read from the Nunchuck.
///
/// # Examples
///
/// ```
/// use animatronic_eyes::controller::JoystickReading;
///
/// let reading = JoystickReading::default();
/// assert_eq!(reading.x, 126); // Centered
/// assert!(reading.buttons.is_empty());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoystickReading {
    /// Stick X axis. Low = full left, high = full right.
    pub x: i32,
    /// Stick Y axis. Low = full down, high = full up.
    pub y: i32,
    /// Buttons currently held.
    pub buttons: Buttons,
}

impl Default for JoystickReading {
    /// Stick centered and buttons released.
    fn default() -> Self {
        Self {
            x: NUNCHUCK_CENTER,
            y: NUNCHUCK_CENTER,
            buttons: Buttons::empty(),
        }
    }
}

impl JoystickReading {
    #[must_use]
    pub fn new(x: i32, y: i32, buttons: Buttons) -> Self {
        Self { x, y, buttons }
    }

    /// Checks if the stick has left the deadzone on either axis.
    #[must_use]
    pub fn stick_moved(&self, calibration: &JoystickCalibration) -> bool {
        !calibration.x.in_deadzone(self.x) || !calibration.y.in_deadzone(self.y)
    }

    /// Checks if any button is currently pressed.
    #[must_use]
    pub fn any_button_pressed(&self) -> bool {
        !self.buttons.is_empty()
    }

    /// Fresh user input: stick outside the deadzone or any button held.
    ///
    /// # Examples
    ///
    /// ```
    /// use animatronic_eyes::controller::{JoystickCalibration, JoystickReading};
    ///
    /// let calibration = JoystickCalibration::default();
    /// let mut reading = JoystickReading::default();
    /// assert!(!reading.is_active(&calibration));
    ///
    /// reading.x = 180;
    /// assert!(reading.is_active(&calibration));
    /// ```
    #[must_use]
    pub fn is_active(&self, calibration: &JoystickCalibration) -> bool {
        self.stick_moved(calibration) || self.any_button_pressed()
    }
}
