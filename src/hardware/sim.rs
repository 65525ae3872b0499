//! Simulated backends for running the control loop without hardware.

use tracing::debug;

use super::{JoystickSource, ServoDriver};
use crate::config::SHIELD_CHANNELS;
use crate::controller::JoystickReading;
use crate::error::HardwareError;

/// Servo driver that records and logs every command instead of writing I2C.
#[derive(Debug)]
pub struct LoggingServoDriver {
    address: u8,
    pulses: [Option<u16>; SHIELD_CHANNELS as usize],
    writes: u64,
}

impl LoggingServoDriver {
    /// Creates a driver for the shield at `address`.
    #[must_use]
    pub fn new(address: u8) -> Self {
        Self {
            address,
            pulses: [None; SHIELD_CHANNELS as usize],
            writes: 0,
        }
    }

    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Last pulse commanded on a channel.
    #[must_use]
    pub fn pulse(&self, channel: u8) -> Option<u16> {
        self.pulses.get(channel as usize).copied().flatten()
    }

    /// Number of accepted writes.
    #[must_use]
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl ServoDriver for LoggingServoDriver {
    fn set_pulse(&mut self, channel: u8, pulse: u16) -> Result<(), HardwareError> {
        let slot = self
            .pulses
            .get_mut(channel as usize)
            .ok_or_else(|| HardwareError::Write {
                channel,
                reason: format!("shield 0x{:02x} has no channel {}", self.address, channel),
            })?;

        *slot = Some(pulse);
        self.writes += 1;
        debug!("[shield 0x{:02x}] channel {} -> {}", self.address, channel, pulse);
        Ok(())
    }
}

/// Joystick that is never touched: always centered, no buttons.
#[derive(Debug, Default, Clone, Copy)]
pub struct CenteredJoystick {
    reading: JoystickReading,
}

impl CenteredJoystick {
    #[must_use]
    pub fn new(reading: JoystickReading) -> Self {
        Self { reading }
    }
}

impl JoystickSource for CenteredJoystick {
    fn read_joystick(&mut self) -> Result<JoystickReading, HardwareError> {
        Ok(self.reading)
    }
}
