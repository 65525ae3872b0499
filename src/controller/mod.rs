//! # Controller Module
//!
//! Wii Nunchuck input handling.
//!
//! This module handles:
//! - The joystick snapshot and button bitset read each tick
//! - Per-axis calibration of the asymmetric Nunchuck stick range
//! - Applying the deadzone and mapping to logical positions
//! - Detecting user activity for the idle scheduler

pub mod calibration;
pub mod nunchuck;

pub use calibration::{JoystickCalibration, StickAxis};
pub use nunchuck::{Buttons, JoystickReading};
