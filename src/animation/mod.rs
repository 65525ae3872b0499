//! # Animation Module
//!
//! Autonomous motion synthesized when nobody is holding the Nunchuck.
//!
//! This module handles:
//! - Blinks (close, then reopen over a fixed duration)
//! - The idle scheduler: timeout, random looks and random blinks
//! - The startup sequence played once at power-on
//!
//! Animations never command pulses directly. They produce a [`Pose`] of
//! logical targets that the eye mechanism feeds through the motion
//! controller, so every autonomous motion is clamped and rate limited like
//! user input.

pub mod blink;
pub mod idle;
pub mod startup;

pub use blink::Blink;
pub use idle::{IdleScheduler, IdleSettings, IdleState};
pub use startup::{StartupPhase, StartupSequence};

/// Logical gaze center.
pub const CENTER: f32 = 0.5;

/// Logical eyelid positions.
pub const LIDS_OPEN: f32 = 0.0;
pub const LIDS_CLOSED: f32 = 1.0;

/// Logical targets for the whole mechanism, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Horizontal gaze, 0.5 = center.
    pub horizontal: f32,
    /// Vertical gaze, 0.5 = center.
    pub vertical: f32,
    /// Eyelids, 0.0 = open, 1.0 = closed.
    pub eyelids: f32,
}

impl Default for Pose {
    /// Looking straight ahead with eyes open.
    fn default() -> Self {
        Self {
            horizontal: CENTER,
            vertical: CENTER,
            eyelids: LIDS_OPEN,
        }
    }
}

impl Pose {
    #[must_use]
    pub fn new(horizontal: f32, vertical: f32, eyelids: f32) -> Self {
        Self {
            horizontal,
            vertical,
            eyelids,
        }
    }

    /// Same gaze with different eyelids.
    #[must_use]
    pub fn with_eyelids(self, eyelids: f32) -> Self {
        Self { eyelids, ..self }
    }
}
