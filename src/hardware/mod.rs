//! # Hardware Module
//!
//! Narrow abstraction over the servo shield and the Nunchuck.
//!
//! The I2C transport to the servo driver chip and the Nunchuck read protocol
//! live behind these traits. Both calls are expected to be synchronous and
//! bounded; a failure is reported as [`HardwareError`] and the control loop
//! recovers by keeping the last pulse the hardware accepted.

pub mod sim;

use crate::controller::JoystickReading;
use crate::error::HardwareError;

pub use sim::{CenteredJoystick, LoggingServoDriver};

/// Trait for commanding servo pulses.
#[cfg_attr(test, mockall::automock)]
pub trait ServoDriver {
    /// Command a pulse width (driver units) on a channel.
    fn set_pulse(&mut self, channel: u8, pulse: u16) -> Result<(), HardwareError>;
}

/// Trait for sampling the joystick.
#[cfg_attr(test, mockall::automock)]
pub trait JoystickSource {
    /// Read the current stick position and buttons.
    fn read_joystick(&mut self) -> Result<JoystickReading, HardwareError>;
}

impl<T: ServoDriver + ?Sized> ServoDriver for Box<T> {
    fn set_pulse(&mut self, channel: u8, pulse: u16) -> Result<(), HardwareError> {
        (**self).set_pulse(channel, pulse)
    }
}

impl<T: JoystickSource + ?Sized> JoystickSource for Box<T> {
    fn read_joystick(&mut self) -> Result<JoystickReading, HardwareError> {
        (**self).read_joystick()
    }
}
